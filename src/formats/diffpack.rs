//! Diffpack tetrahedral grid decoder.
//!
//! The header block (everything before the first `#` line) is scanned for
//! the "Number of elements" and "Number of nodes" declarations. Vertex
//! records carry a parenthesized coordinate group and a bracketed boundary
//! indicator suffix; only the first indicator is kept, as the
//! `boundary_indicator` mesh function over vertices. Cell records must all
//! be of the single recognized element type `ElmT4n3D`; the per-cell
//! material id becomes a `material` mesh function over cells.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field, to_zero_based};
use crate::handler::DataHandler;
use crate::model::CellKind;
use std::io::Read;

/// Decoder for the Diffpack grid format.
#[derive(Debug, Default, Clone)]
pub struct DiffpackDecoder;

impl DiffpackDecoder {
    /// Decode a Diffpack grid, emitting canonical events to `handler`.
    pub fn decode<R: Read, H: DataHandler>(
        &self,
        reader: R,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let contents = buffer(reader)?;
        let mut lines = contents.lines();

        let (num_cells, num_vertices) = Self::read_header(&mut lines)?;

        handler.set_mesh_type(CellKind::Tetrahedron, 3)?;
        handler.begin_vertices(num_vertices)?;
        let mut indicators = Vec::with_capacity(num_vertices);
        for index in 0..num_vertices {
            let line = lines.next().ok_or_else(|| {
                MeshConvertError::UnexpectedEof(format!(
                    "input ended after {index} of {num_vertices} vertex records"
                ))
            })?;
            let (coords, indicator) = Self::vertex_record(line)?;
            handler.add_vertex(index, coords)?;
            indicators.push(indicator);
        }
        handler.end_vertices()?;

        handler.begin_mesh_function("boundary_indicator", 0, num_vertices)?;
        for (index, &value) in indicators.iter().enumerate() {
            handler.add_entity(index, value)?;
        }
        handler.end_mesh_function()?;

        // The element block is introduced by its own comment block.
        loop {
            let line = lines.next().ok_or_else(|| {
                MeshConvertError::UnexpectedEof("input ended before the element block".into())
            })?;
            if line.starts_with('#') {
                break;
            }
        }

        handler.begin_cells(num_cells)?;
        let mut materials = Vec::with_capacity(num_cells);
        for index in 0..num_cells {
            let line = lines.next().ok_or_else(|| {
                MeshConvertError::UnexpectedEof(format!(
                    "input ended after {index} of {num_cells} element records"
                ))
            })?;
            let (cell, material) = Self::cell_record(line)?;
            handler.add_cell(index, &cell)?;
            materials.push(material);
        }
        handler.end_cells()?;

        handler.begin_mesh_function("material", 3, num_cells)?;
        for (index, &value) in materials.iter().enumerate() {
            handler.add_entity(index, value)?;
        }
        handler.end_mesh_function()
    }

    /// Scan header lines (up to the first `#` line) for the element and
    /// node counts.
    fn read_header(lines: &mut std::str::Lines<'_>) -> Result<(usize, usize), MeshConvertError> {
        let mut num_cells = None;
        let mut num_vertices = None;
        loop {
            let line = lines
                .next()
                .ok_or_else(|| MeshConvertError::MalformedHeader("empty file".into()))?;
            if line.starts_with('#') {
                break;
            }
            if line.contains("Number of elements") {
                num_cells = Some(Self::trailing_count(line, "element count")?);
            }
            if line.contains("Number of nodes") {
                num_vertices = Some(Self::trailing_count(line, "node count")?);
            }
        }
        match (num_cells, num_vertices) {
            (Some(cells), Some(vertices)) => Ok((cells, vertices)),
            (None, _) => Err(MeshConvertError::MalformedHeader(
                "header does not declare the number of elements".into(),
            )),
            (_, None) => Err(MeshConvertError::MalformedHeader(
                "header does not declare the number of nodes".into(),
            )),
        }
    }

    /// Last integer token on a declaration line.
    fn trailing_count(line: &str, what: &str) -> Result<usize, MeshConvertError> {
        line.split_whitespace()
            .filter_map(|tok| tok.parse::<usize>().ok())
            .last()
            .ok_or_else(|| {
                MeshConvertError::MalformedHeader(format!("no {what} on line `{line}`"))
            })
    }

    /// Coordinates from the parenthesized group; boundary indicator from
    /// the tokens following the closing bracket, defaulting to 0.
    fn vertex_record(line: &str) -> Result<([f64; 3], i64), MeshConvertError> {
        let open = line.find('(').ok_or_else(|| {
            MeshConvertError::MalformedRecord(format!("vertex record without `(`: `{line}`"))
        })?;
        let close = line[open..].find(')').map(|i| open + i).ok_or_else(|| {
            MeshConvertError::MalformedRecord(format!("vertex record without `)`: `{line}`"))
        })?;
        let coords: Vec<&str> = line[open + 1..close]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|tok| !tok.is_empty())
            .collect();
        if coords.len() != 3 {
            return Err(MeshConvertError::MalformedRecord(format!(
                "expected 3 coordinates, found {}: `{line}`",
                coords.len()
            )));
        }
        let x = field(coords[0], "x coordinate")?;
        let y = field(coords[1], "y coordinate")?;
        let z = field(coords[2], "z coordinate")?;

        let bracket = line.rfind(']').ok_or_else(|| {
            MeshConvertError::MalformedRecord(format!("vertex record without `]`: `{line}`"))
        })?;
        let indicator = match line[bracket + 1..].split_whitespace().next() {
            Some(tok) => field(tok, "boundary indicator")?,
            None => 0,
        };
        Ok(([x, y, z], indicator))
    }

    /// One element record: id, element type, material id, then 1-based
    /// vertex indices.
    fn cell_record(line: &str) -> Result<([usize; 4], i64), MeshConvertError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 {
            return Err(MeshConvertError::MalformedRecord(format!(
                "element record too short: `{line}`"
            )));
        }
        if fields[1] != "ElmT4n3D" {
            return Err(MeshConvertError::UnsupportedRecordKind(format!(
                "only tetrahedral elements (ElmT4n3D) are implemented, found `{}`",
                fields[1]
            )));
        }
        let material: i64 = field(fields[2], "material id")?;
        let mut cell = [0usize; 4];
        for (slot, tok) in cell.iter_mut().zip(&fields[3..7]) {
            *slot = to_zero_based(field::<usize>(tok, "element vertex")?, "element vertex")?;
        }
        Ok((cell, material))
    }
}
