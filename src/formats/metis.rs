//! Metis graph decoder.
//!
//! The header line declares the vertex and edge counts; each following row
//! is one vertex's adjacency list, numbered from 1, rebased to 0 on
//! emission. The vertex block is swept twice: once to derive per-vertex
//! edge counts from the row field counts, once to emit the edges. Metis
//! declares each undirected edge once but the canonical document is
//! directed, so every edge is counted from both endpoints and the edge
//! collection holds `2 * m` records.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field, header_field, to_zero_based};
use crate::handler::DataHandler;
use std::io::Read;

/// Decoder for the Metis graph format.
#[derive(Debug, Default, Clone)]
pub struct MetisDecoder;

impl MetisDecoder {
    /// Decode a Metis graph, emitting canonical events to `handler`.
    pub fn decode<R: Read, H: DataHandler>(
        &self,
        reader: R,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let contents = buffer(reader)?;
        let mut lines = contents.lines();

        let header = lines
            .next()
            .ok_or_else(|| MeshConvertError::MalformedHeader("empty file".into()))?;
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

        let rows: Vec<&str> = lines.take(num_vertices).collect();
        if rows.len() != num_vertices {
            return Err(MeshConvertError::UnexpectedEof(format!(
                "expected {num_vertices} adjacency rows, found {}",
                rows.len()
            )));
        }

        handler.set_graph_type(true)?;
        handler.begin_graph_vertices(num_vertices)?;
        for (index, row) in rows.iter().enumerate() {
            let degree = row.split_whitespace().count();
            handler.add_graph_vertex(index, degree, 1)?;
        }
        handler.end_graph_vertices()?;

        // Second sweep over the same rows emits each edge from both ends.
        handler.begin_graph_edges(2 * num_edges)?;
        let mut emitted = 0usize;
        for (index, row) in rows.iter().enumerate() {
            for token in row.split_whitespace() {
                let target = to_zero_based(field(token, "edge target")?, "edge target")?;
                handler.add_graph_edge(index, target, 1)?;
                emitted += 1;
            }
        }
        if emitted != 2 * num_edges {
            return Err(MeshConvertError::CountMismatch {
                entity: "graph edges",
                declared: 2 * num_edges,
                found: emitted,
            });
        }
        handler.end_graph_edges()
    }
}
