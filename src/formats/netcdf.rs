//! NetCDF text-dump decoder (ExodusII via `ncdump`).
//!
//! Consumes the textual form produced by the NetCDF dump utility. The
//! discovery scan pattern-matches declaration lines for `num_dim`,
//! `num_nodes` and `num_elem` until the `connect1 =` marker, then the
//! connectivity block (1-based indices) and the `coord =` block are read.
//! Within the coordinate block a new axis starts on rows matching the
//! leading-whitespace pattern of the dump tool; each axis is consumed as
//! one flat token stream in FIFO order.
//!
//! Source order is connectivity before coordinates, so both blocks are
//! staged and the canonical events (vertices, then cells) are emitted at
//! the end.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field, to_zero_based};
use crate::handler::DataHandler;
use crate::model::CellKind;
use std::io::Read;

/// Decoder for `ncdump`-style NetCDF text.
#[derive(Debug, Default, Clone)]
pub struct NetCdfDecoder;

impl NetCdfDecoder {
    /// Decode NetCDF dump text, emitting canonical events to `handler`.
    pub fn decode<R: Read, H: DataHandler>(
        &self,
        reader: R,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let contents = buffer(reader)?;
        let mut lines = contents.lines();

        let mut dim: Option<usize> = None;
        let mut num_vertices: Option<usize> = None;
        let mut num_cells: Option<usize> = None;
        loop {
            let line = lines.next().ok_or_else(|| {
                MeshConvertError::UnexpectedEof("no connectivity block found".into())
            })?;
            if line.contains("num_dim") && line.contains('=') {
                dim = Some(Self::declaration_value(line, "num_dim")?);
            }
            if line.contains("num_nodes") && line.contains('=') {
                num_vertices = Some(Self::declaration_value(line, "num_nodes")?);
            }
            if line.contains("num_elem") && line.contains('=') {
                num_cells = Some(Self::declaration_value(line, "num_elem")?);
            }
            if line.contains("connect1 =") {
                break;
            }
        }

        let kind = match dim {
            Some(2) => CellKind::Triangle,
            Some(3) => CellKind::Tetrahedron,
            Some(other) => {
                return Err(MeshConvertError::MalformedHeader(format!(
                    "unable to find cell type for dimension {other}"
                )));
            }
            None => {
                return Err(MeshConvertError::MalformedHeader(
                    "no num_dim declaration found".into(),
                ));
            }
        };
        let num_vertices = num_vertices.ok_or_else(|| {
            MeshConvertError::MalformedHeader("no num_nodes declaration found".into())
        })?;
        let num_cells = num_cells.ok_or_else(|| {
            MeshConvertError::MalformedHeader("no num_elem declaration found".into())
        })?;

        // Connectivity: one cell per row, 1-based indices.
        let mut cells = Vec::with_capacity(num_cells);
        while cells.len() < num_cells {
            let line = lines.next().ok_or_else(|| {
                MeshConvertError::UnexpectedEof(format!(
                    "input ended after {} of {num_cells} connectivity rows",
                    cells.len()
                ))
            })?;
            let fields: Vec<&str> = line
                .split([',', ';'])
                .map(str::trim)
                .filter(|tok| !tok.is_empty())
                .collect();
            if fields.len() < kind.arity() {
                return Err(MeshConvertError::MalformedRecord(format!(
                    "connectivity row has {} fields, expected {}: `{line}`",
                    fields.len(),
                    kind.arity()
                )));
            }
            let cell = fields[..kind.arity()]
                .iter()
                .map(|tok| to_zero_based(field::<usize>(tok, "connectivity index")?, "node"))
                .collect::<Result<Vec<_>, _>>()?;
            cells.push(cell);
        }

        loop {
            let line = lines.next().ok_or_else(|| {
                MeshConvertError::UnexpectedEof("missing coordinate block".into())
            })?;
            if line.contains("coord =") {
                break;
            }
        }

        // Coordinate block: per-axis token streams, one axis per leading
        // `  token,` row.
        let mut axes: Vec<Vec<f64>> = Vec::new();
        for line in lines.by_ref() {
            if Self::starts_axis(line) {
                axes.push(Vec::new());
            }
            let axis = axes.last_mut().ok_or_else(|| {
                MeshConvertError::MalformedRecord(format!(
                    "coordinate data before the first axis marker: `{line}`"
                ))
            })?;
            for token in line.split_whitespace() {
                let token = token.trim_matches([',', ';']);
                if !token.is_empty() {
                    axis.push(field(token, "coordinate")?);
                }
            }
            if line.contains(';') {
                break;
            }
        }

        let geo_dim = kind.dimension() as usize;
        if axes.len() < geo_dim {
            return Err(MeshConvertError::UnexpectedEof(format!(
                "found {} coordinate axes, expected {geo_dim}",
                axes.len()
            )));
        }
        for (axis, values) in axes.iter().take(geo_dim).enumerate() {
            if values.len() < num_vertices {
                return Err(MeshConvertError::CountMismatch {
                    entity: "coordinate values",
                    declared: num_vertices,
                    found: values.len(),
                });
            }
            log::debug!("axis {axis} carries {} coordinate values", values.len());
        }

        handler.set_mesh_type(kind, kind.dimension())?;
        handler.begin_vertices(num_vertices)?;
        for index in 0..num_vertices {
            let x = axes[0][index];
            let y = axes[1][index];
            let z = if geo_dim == 3 { axes[2][index] } else { 0.0 };
            handler.add_vertex(index, [x, y, z])?;
        }
        handler.end_vertices()?;

        handler.begin_cells(num_cells)?;
        for (index, cell) in cells.iter().enumerate() {
            handler.add_cell(index, cell)?;
        }
        handler.end_cells()
    }

    /// Integer value of a `name = N ;` declaration line.
    fn declaration_value(line: &str, what: &str) -> Result<usize, MeshConvertError> {
        let (_, rhs) = line.split_once('=').ok_or_else(|| {
            MeshConvertError::MalformedHeader(format!("malformed {what} declaration: `{line}`"))
        })?;
        let token = rhs.trim().trim_end_matches(';').trim();
        token.parse::<usize>().map_err(|_| {
            MeshConvertError::MalformedHeader(format!("malformed {what} declaration: `{line}`"))
        })
    }

    /// A new coordinate axis starts on rows indented by exactly the dump
    /// tool's two-space margin, with the first token comma-terminated.
    fn starts_axis(line: &str) -> bool {
        let bytes = line.as_bytes();
        if bytes.len() < 3
            || !bytes[0].is_ascii_whitespace()
            || !bytes[1].is_ascii_whitespace()
            || bytes[2].is_ascii_whitespace()
        {
            return false;
        }
        line.split_whitespace()
            .next()
            .is_some_and(|tok| tok.ends_with(','))
    }
}
