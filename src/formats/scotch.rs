//! Scotch graph decoder.
//!
//! Layout: a version line (skipped), a `vertices edges` header, then a
//! flags line carrying the start index and a three-bit attribute flag
//! (vertex labels, edge weights, vertex weights). Only the `000` flag
//! combination is implemented; anything else is fatal. Each vertex row
//! starts with its edge count, which is skipped rather than emitted;
//! edge targets are rebased by the declared start index. The canonical
//! document is undirected, so the declared edge count is emitted as-is.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field, header_field};
use crate::handler::DataHandler;
use std::io::Read;

/// Decoder for the Scotch graph format.
#[derive(Debug, Default, Clone)]
pub struct ScotchDecoder;

impl ScotchDecoder {
    /// Decode a Scotch graph, emitting canonical events to `handler`.
    pub fn decode<R: Read, H: DataHandler>(
        &self,
        reader: R,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let contents = buffer(reader)?;
        let mut lines = contents.lines();

        // Graph file version number.
        lines
            .next()
            .ok_or_else(|| MeshConvertError::MalformedHeader("empty file".into()))?;

        let header = lines
            .next()
            .ok_or_else(|| MeshConvertError::MalformedHeader("missing count line".into()))?;
        let mut parts = header.split_whitespace();
        let num_vertices: usize = header_field(
            parts
                .next()
                .ok_or_else(|| MeshConvertError::MalformedHeader("missing vertex count".into()))?,
            "vertex count",
        )?;
        let num_edges: usize = header_field(
            parts
                .next()
                .ok_or_else(|| MeshConvertError::MalformedHeader("missing edge count".into()))?,
            "edge count",
        )?;

        let flags_line = lines
            .next()
            .ok_or_else(|| MeshConvertError::MalformedHeader("missing flags line".into()))?;
        let mut flag_parts = flags_line.split_whitespace();
        let start_index: usize = header_field(
            flag_parts
                .next()
                .ok_or_else(|| MeshConvertError::MalformedHeader("missing start index".into()))?,
            "start index",
        )?;
        let numeric_flag = flag_parts
            .next()
            .ok_or_else(|| MeshConvertError::MalformedHeader("missing numeric flag".into()))?;
        if numeric_flag != "000" {
            return Err(MeshConvertError::UnsupportedRecordKind(format!(
                "scotch vertex labels, edge and vertex weights are not implemented (flags `{numeric_flag}`)"
            )));
        }

        let rows: Vec<&str> = lines.take(num_vertices).collect();
        if rows.len() != num_vertices {
            return Err(MeshConvertError::UnexpectedEof(format!(
                "expected {num_vertices} vertex rows, found {}",
                rows.len()
            )));
        }

        handler.set_graph_type(false)?;
        handler.begin_graph_vertices(num_vertices)?;
        for (index, row) in rows.iter().enumerate() {
            // First field is the row's own edge count, not an edge.
            let degree = row.split_whitespace().count().saturating_sub(1);
            handler.add_graph_vertex(index, degree, 1)?;
        }
        handler.end_graph_vertices()?;

        handler.begin_graph_edges(num_edges)?;
        let mut emitted = 0usize;
        for (index, row) in rows.iter().enumerate() {
            for token in row.split_whitespace().skip(1) {
                let raw: usize = field(token, "edge target")?;
                let target = raw.checked_sub(start_index).ok_or_else(|| {
                    MeshConvertError::MalformedRecord(format!(
                        "edge target {raw} below the declared start index {start_index}"
                    ))
                })?;
                handler.add_graph_edge(index, target, 1)?;
                emitted += 1;
            }
        }
        if emitted != num_edges {
            return Err(MeshConvertError::CountMismatch {
                entity: "graph edges",
                declared: num_edges,
                found: emitted,
            });
        }
        handler.end_graph_edges()
    }
}
