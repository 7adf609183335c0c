//! StarCD `.vrt`/`.cel` pair decoder.
//!
//! Vertex records use fixed byte columns, not whitespace-delimited fields.
//! Vertex numbering may have gaps, so ids are renumbered through a dense
//! map. Cell records are degenerate hexahedra: a valid tetrahedron has node
//! fields 2,3 and 4,5,6,7 pairwise equal and maps back to the tet
//! `(n0, n1, n2, n4)`. Rows with a zero fourth node are surface triangles
//! and are silently excluded; non-zero rows violating the degeneracy are
//! reported and skipped. Both files are fully buffered because the cell
//! records need a counting sweep before the emission sweep.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field};
use crate::handler::DataHandler;
use crate::model::CellKind;
use crate::remap::DenseIdMap;
use std::collections::BTreeMap;
use std::io::Read;

/// Decoder for the StarCD vertex/cell file pair.
#[derive(Debug, Default, Clone)]
pub struct StarCdDecoder;

struct CellRow {
    id: u64,
    nodes: [u64; 8],
}

impl CellRow {
    /// Nodes 2,3 and 4,5,6,7 must be pairwise equal for the row to encode
    /// a tetrahedron.
    fn is_tetrahedron(&self) -> bool {
        let n = &self.nodes;
        n[2] == n[3] && n[4] == n[5] && n[5] == n[6] && n[6] == n[7]
    }

    /// A zero fourth node marks a surface triangle.
    fn is_surface(&self) -> bool {
        self.nodes[4] == 0
    }

    fn tet_nodes(&self) -> [u64; 4] {
        [self.nodes[0], self.nodes[1], self.nodes[2], self.nodes[4]]
    }
}

impl StarCdDecoder {
    /// Decode a StarCD mesh from its `.vrt` and `.cel` sources.
    pub fn decode<V: Read, C: Read, H: DataHandler>(
        &self,
        vrt_reader: V,
        cel_reader: C,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let vrt_contents = buffer(vrt_reader)?;
        let cel_contents = buffer(cel_reader)?;

        let vertices = Self::read_vertices(&vrt_contents)?;
        let vertex_map = DenseIdMap::from_ids(vertices.keys().copied());

        let rows = Self::read_cells(&cel_contents)?;

        // Counting sweep: decide which rows survive before any emission.
        let mut num_cells = 0usize;
        for row in &rows {
            if row.is_surface() {
                continue;
            }
            if row.is_tetrahedron() {
                num_cells += 1;
            } else {
                handler.warn(&format!(
                    "cell {} is not a tetrahedron and was skipped",
                    row.id
                ));
            }
        }

        handler.set_mesh_type(CellKind::Tetrahedron, 3)?;
        handler.begin_vertices(vertex_map.len())?;
        for (id, index) in vertex_map.iter() {
            handler.add_vertex(index, vertices[&id])?;
        }
        handler.end_vertices()?;

        // Emission sweep over the same rows.
        handler.begin_cells(num_cells)?;
        let mut emitted = 0usize;
        for row in &rows {
            if row.is_surface() || !row.is_tetrahedron() {
                continue;
            }
            let mut cell = [0usize; 4];
            for (slot, node) in cell.iter_mut().zip(row.tet_nodes()) {
                *slot = vertex_map.index_of(node).ok_or_else(|| {
                    MeshConvertError::UndefinedReference(format!(
                        "cell {} references non-existent vertex {node}",
                        row.id
                    ))
                })?;
            }
            handler.add_cell(emitted, &cell)?;
            emitted += 1;
        }
        handler.end_cells()
    }

    /// Fixed-column vertex records: id in bytes 0..15, then three
    /// 16-byte coordinate columns.
    fn read_vertices(contents: &str) -> Result<BTreeMap<u64, [f64; 3]>, MeshConvertError> {
        let mut vertices = BTreeMap::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if line.len() < 63 {
                return Err(MeshConvertError::MalformedRecord(format!(
                    "vertex record shorter than the fixed 63-byte layout: `{line}`"
                )));
            }
            let column = |range: std::ops::Range<usize>| {
                // Multibyte content can land a column edge off a char
                // boundary; that is a malformed record, not a panic.
                line.get(range).ok_or_else(|| {
                    MeshConvertError::MalformedRecord(format!(
                        "vertex record does not follow the fixed column layout: `{line}`"
                    ))
                })
            };
            let id: u64 = field(column(0..15)?, "vertex id")?;
            let x: f64 = field(column(15..31)?, "x coordinate")?;
            let y: f64 = field(column(31..47)?, "y coordinate")?;
            let z: f64 = field(column(47..63)?, "z coordinate")?;
            if vertices.insert(id, [x, y, z]).is_some() {
                return Err(MeshConvertError::MalformedRecord(format!(
                    "duplicate vertex identifier {id}"
                )));
            }
        }
        Ok(vertices)
    }

    /// Cell rows: id, eight node fields, and two trailing fields that are
    /// read and discarded.
    fn read_cells(contents: &str) -> Result<Vec<CellRow>, MeshConvertError> {
        let mut rows = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 11 {
                return Err(MeshConvertError::MalformedRecord(format!(
                    "cell record has {} fields, expected 11: `{line}`",
                    fields.len()
                )));
            }
            let id: u64 = field(fields[0], "cell id")?;
            let mut nodes = [0u64; 8];
            for (slot, tok) in nodes.iter_mut().zip(&fields[1..9]) {
                *slot = field(tok, "cell node id")?;
            }
            rows.push(CellRow { id, nodes });
        }
        Ok(rows)
    }
}
