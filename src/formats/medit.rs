//! Medit `.mesh` decoder.
//!
//! The emission pass drives an explicit state machine:
//! await `Dimension`, read the dimension, await `Vertices`, read the vertex
//! count, read the vertices, await the cell section keyword (`Triangles`
//! for 2-D, `Tetrahedra` for 3-D), read the cell count, read the cells,
//! done. A discovery pass resolves the dimension first so the cell kind is
//! known before any event is emitted.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field, header_field, to_zero_based};
use crate::handler::DataHandler;
use crate::model::CellKind;
use std::io::Read;

/// Decoder for the Medit text mesh format.
#[derive(Debug, Default, Clone)]
pub struct MeditDecoder;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    AwaitDimension,
    ReadDimension,
    AwaitVertices,
    ReadVertexCount,
    ReadVertices,
    AwaitCells,
    ReadCellCount,
    ReadCells,
    Done,
}

fn is_section(line: &str, keyword: &str) -> bool {
    // Some writers indent section keywords by a single space.
    line == keyword || (line.len() == keyword.len() + 1 && line.trim_start() == keyword)
}

impl MeditDecoder {
    /// Decode a Medit mesh, emitting canonical events to `handler`.
    pub fn decode<R: Read, H: DataHandler>(
        &self,
        reader: R,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let contents = buffer(reader)?;
        let kind = Self::discover(&contents)?;
        Self::emit(&contents, kind, handler)
    }

    /// Discovery pass: scan for the `Dimension` section to resolve the
    /// cell kind before the state machine runs.
    fn discover(contents: &str) -> Result<CellKind, MeshConvertError> {
        let mut lines = contents.lines();
        while let Some(line) = lines.next() {
            if is_section(line, "Dimension") {
                let dim_line = lines.next().ok_or_else(|| {
                    MeshConvertError::UnexpectedEof("missing value after `Dimension`".into())
                })?;
                let dim: u8 = header_field(dim_line, "dimension")?;
                return match dim {
                    2 => Ok(CellKind::Triangle),
                    3 => Ok(CellKind::Tetrahedron),
                    other => Err(MeshConvertError::MalformedHeader(format!(
                        "unsupported dimension {other}, expected 2 or 3"
                    ))),
                };
            }
        }
        Err(MeshConvertError::MalformedHeader(
            "unable to find cell type: no `Dimension` section".into(),
        ))
    }

    /// Emission pass: drive the section state machine over the same input.
    fn emit<H: DataHandler>(
        contents: &str,
        kind: CellKind,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let dim = kind.dimension();
        let cell_keyword = match kind {
            CellKind::Triangle => "Triangles",
            CellKind::Tetrahedron => "Tetrahedra",
        };

        handler.set_mesh_type(kind, dim)?;

        let mut state = State::AwaitDimension;
        let mut num_vertices = 0usize;
        let mut vertices_read = 0usize;
        let mut num_cells = 0usize;
        let mut cells_read = 0usize;

        for line in contents.lines() {
            if line.starts_with('#') {
                continue;
            }
            match state {
                State::AwaitDimension => {
                    if is_section(line, "Dimension") {
                        state = State::ReadDimension;
                    }
                }
                State::ReadDimension => {
                    // Value already validated by the discovery pass.
                    state = State::AwaitVertices;
                }
                State::AwaitVertices => {
                    if is_section(line, "Vertices") {
                        state = State::ReadVertexCount;
                    }
                }
                State::ReadVertexCount => {
                    num_vertices = header_field(line, "vertex count")?;
                    handler.begin_vertices(num_vertices)?;
                    state = if num_vertices == 0 {
                        handler.end_vertices()?;
                        State::AwaitCells
                    } else {
                        State::ReadVertices
                    };
                }
                State::ReadVertices => {
                    let coords = Self::vertex_record(line, dim)?;
                    handler.add_vertex(vertices_read, coords)?;
                    vertices_read += 1;
                    if vertices_read == num_vertices {
                        handler.end_vertices()?;
                        state = State::AwaitCells;
                    }
                }
                State::AwaitCells => {
                    if is_section(line, cell_keyword) {
                        state = State::ReadCellCount;
                    }
                }
                State::ReadCellCount => {
                    num_cells = header_field(line, "cell count")?;
                    handler.begin_cells(num_cells)?;
                    state = if num_cells == 0 {
                        handler.end_cells()?;
                        State::Done
                    } else {
                        State::ReadCells
                    };
                }
                State::ReadCells => {
                    let vertices = Self::cell_record(line, kind)?;
                    handler.add_cell(cells_read, &vertices)?;
                    cells_read += 1;
                    if cells_read == num_cells {
                        handler.end_cells()?;
                        state = State::Done;
                    }
                }
                State::Done => break,
            }
        }

        if state != State::Done {
            return Err(MeshConvertError::UnexpectedEof(format!(
                "missing data, unable to convert: stopped while expecting `{cell_keyword}` data"
            )));
        }
        Ok(())
    }

    /// One vertex record: `dim` coordinates plus a trailing reference field
    /// that is read and discarded.
    fn vertex_record(line: &str, dim: u8) -> Result<[f64; 3], MeshConvertError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let expected = dim as usize + 1;
        if fields.len() != expected {
            return Err(MeshConvertError::MalformedRecord(format!(
                "vertex record has {} fields, expected {expected}: `{line}`",
                fields.len()
            )));
        }
        let x = field(fields[0], "x coordinate")?;
        let y = field(fields[1], "y coordinate")?;
        let z = if dim == 3 {
            field(fields[2], "z coordinate")?
        } else {
            0.0
        };
        Ok([x, y, z])
    }

    /// One cell record: 1-based vertex indices plus a trailing reference
    /// field that is read and discarded.
    fn cell_record(line: &str, kind: CellKind) -> Result<Vec<usize>, MeshConvertError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let expected = kind.arity() + 1;
        if fields.len() != expected {
            return Err(MeshConvertError::MalformedRecord(format!(
                "cell record has {} fields, expected {expected}: `{line}`",
                fields.len()
            )));
        }
        fields[..kind.arity()]
            .iter()
            .map(|tok| to_zero_based(field::<usize>(tok, "cell vertex")?, "cell vertex"))
            .collect()
    }
}
