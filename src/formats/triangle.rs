//! Triangle `.node`/`.ele` pair decoder.
//!
//! Single pass per file. Blank lines and `#` comments are skipped by the
//! line-fetch helper; running out of lines mid-file is fatal. Triangle
//! sources may be 0- or 1-based; the decoder detects which by probing for
//! identifier 0 and applies a uniform offset.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field, header_field};
use crate::handler::DataHandler;
use crate::model::CellKind;
use std::collections::BTreeMap;
use std::io::Read;

/// Decoder for the Triangle `.node` + `.ele` file pair.
#[derive(Debug, Default, Clone)]
pub struct TriangleDecoder;

/// Next non-blank, non-comment line, or a fatal premature-EOF error.
fn next_content_line<'a>(
    lines: &mut std::str::Lines<'a>,
    what: &str,
) -> Result<&'a str, MeshConvertError> {
    loop {
        let line = lines
            .next()
            .ok_or_else(|| {
                MeshConvertError::UnexpectedEof(format!("hit end of {what} file prematurely"))
            })?
            .trim();
        if !line.is_empty() && !line.starts_with('#') {
            return Ok(line);
        }
    }
}

impl TriangleDecoder {
    /// Decode a Triangle mesh from its `.node` and `.ele` sources.
    pub fn decode<N: Read, E: Read, H: DataHandler>(
        &self,
        node_reader: N,
        ele_reader: E,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let node_contents = buffer(node_reader)?;
        let ele_contents = buffer(ele_reader)?;

        let nodes = Self::read_nodes(&node_contents)?;
        let tris = Self::read_triangles(&ele_contents)?;

        // 1-based sources lack identifier 0; shift everything down by one.
        let node_off: i64 = if nodes.contains_key(&0) { 0 } else { -1 };
        let tri_off: i64 = if tris.contains_key(&0) { 0 } else { -1 };

        handler.set_mesh_type(CellKind::Triangle, 2)?;
        handler.begin_vertices(nodes.len())?;
        for (&id, &(x, y)) in &nodes {
            let index = Self::offset(id, node_off, "node")?;
            handler.add_vertex(index, [x, y, 0.0])?;
        }
        handler.end_vertices()?;

        handler.begin_cells(tris.len())?;
        for (&id, corners) in &tris {
            let index = Self::offset(id, tri_off, "triangle")?;
            let mut cell = [0usize; 3];
            for (slot, &corner) in cell.iter_mut().zip(corners) {
                *slot = Self::offset(corner, node_off, "triangle vertex")?;
            }
            handler.add_cell(index, &cell)?;
        }
        handler.end_cells()
    }

    fn offset(id: i64, off: i64, what: &str) -> Result<usize, MeshConvertError> {
        usize::try_from(id + off).map_err(|_| {
            MeshConvertError::MalformedRecord(format!("negative {what} identifier {id}"))
        })
    }

    fn read_nodes(contents: &str) -> Result<BTreeMap<i64, (f64, f64)>, MeshConvertError> {
        let mut lines = contents.lines();
        let header = next_content_line(&mut lines, ".node")?;
        let mut parts = header.split_whitespace();
        let num_nodes: usize = header_field(
            parts.next().ok_or_else(|| {
                MeshConvertError::MalformedHeader("empty .node header".into())
            })?,
            "node count",
        )?;
        // Remaining header fields (dimension, attributes, boundary markers)
        // are not used.

        let mut nodes = BTreeMap::new();
        while nodes.len() < num_nodes {
            let line = next_content_line(&mut lines, ".node")?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(MeshConvertError::MalformedRecord(format!(
                    "node record too short: `{line}`"
                )));
            }
            let id: i64 = field(fields[0], "node id")?;
            let x: f64 = field(fields[1], "x coordinate")?;
            let y: f64 = field(fields[2], "y coordinate")?;
            if nodes.insert(id, (x, y)).is_some() {
                return Err(MeshConvertError::MalformedRecord(format!(
                    "duplicate node identifier {id}"
                )));
            }
        }
        Ok(nodes)
    }

    fn read_triangles(contents: &str) -> Result<BTreeMap<i64, [i64; 3]>, MeshConvertError> {
        let mut lines = contents.lines();
        let header = next_content_line(&mut lines, ".ele")?;
        let mut parts = header.split_whitespace();
        let num_tris: usize = header_field(
            parts.next().ok_or_else(|| {
                MeshConvertError::MalformedHeader("empty .ele header".into())
            })?,
            "triangle count",
        )?;

        let mut tris = BTreeMap::new();
        while tris.len() < num_tris {
            let line = next_content_line(&mut lines, ".ele")?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(MeshConvertError::MalformedRecord(format!(
                    "triangle record too short: `{line}`"
                )));
            }
            let id: i64 = field(fields[0], "triangle id")?;
            let corners = [
                field(fields[1], "triangle vertex")?,
                field(fields[2], "triangle vertex")?,
                field(fields[3], "triangle vertex")?,
            ];
            if tris.insert(id, corners).is_some() {
                return Err(MeshConvertError::MalformedRecord(format!(
                    "duplicate triangle identifier {id}"
                )));
            }
        }
        Ok(tris)
    }
}
