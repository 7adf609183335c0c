//! Gmsh `.msh` (ASCII v2) decoder.
//!
//! Gmsh element lists may mix dimensions, and the vertex set actually in
//! use is not stated up front. The discovery pass therefore scans
//! `$Elements` once to pick the winning (highest) dimension, count the
//! surviving elements, collect the vertex ids they reference, and stash the
//! leading per-element tag. The emission pass then drives the
//! `$MeshFormat`/`$Nodes`/`$Elements` state machine, renumbering vertices
//! through a dense id map in ascending external-id order.
//!
//! Only element type codes 2 (triangle) and 4 (tetrahedron) survive; lower
//! dimension elements are dropped from the cell collection. The collected
//! tags become a `physical_region` mesh function over cells unless every
//! tag is zero, which means no physical regions were defined.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field, header_field};
use crate::handler::DataHandler;
use crate::model::CellKind;
use crate::remap::DenseIdMap;
use std::io::Read;

/// Decoder for Gmsh ASCII v2 meshes.
#[derive(Debug, Default, Clone)]
pub struct GmshDecoder;

struct Discovery {
    kind: CellKind,
    /// Elements of the winning dimension, in traversal order.
    cell_count: usize,
    /// Declared total element count (all dimensions).
    declared_elements: usize,
    /// Vertex ids referenced by surviving elements, densely renumbered.
    vertex_map: DenseIdMap,
    /// Leading tag per surviving element; 0 when the element had no tags.
    tags: Vec<i64>,
}

struct ElementRecord {
    elem_type: u32,
    tag: i64,
    nodes: Vec<u64>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    AwaitFormat,
    ReadFormat,
    AwaitEndFormat,
    AwaitNodes,
    ReadNodeCount,
    ReadNodes,
    AwaitEndNodes,
    AwaitElements,
    ReadElementCount,
    ReadElements,
    Done,
}

impl GmshDecoder {
    /// Decode a Gmsh mesh, emitting canonical events to `handler`.
    pub fn decode<R: Read, H: DataHandler>(
        &self,
        reader: R,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let contents = buffer(reader)?;
        let discovery = Self::discover(&contents)?;
        Self::emit(&contents, &discovery, handler)
    }

    fn element_record(line: &str) -> Result<ElementRecord, MeshConvertError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(MeshConvertError::MalformedRecord(format!(
                "element record too short: `{line}`"
            )));
        }
        let elem_type: u32 = field(fields[1], "element type")?;
        let num_tags: usize = field(fields[2], "element tag count")?;
        let node_start = 3 + num_tags;
        if fields.len() < node_start {
            return Err(MeshConvertError::MalformedRecord(format!(
                "element record declares {num_tags} tags but is too short: `{line}`"
            )));
        }
        let tag = if num_tags > 0 {
            field(fields[3], "element tag")?
        } else {
            0
        };
        let nodes = fields[node_start..]
            .iter()
            .map(|tok| field::<u64>(tok, "element node id"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ElementRecord {
            elem_type,
            tag,
            nodes,
        })
    }

    /// Discovery pass over `$Elements`.
    fn discover(contents: &str) -> Result<Discovery, MeshConvertError> {
        let mut lines = contents.lines();
        while let Some(line) = lines.next() {
            if !line.trim_end().starts_with("$Elements") {
                continue;
            }
            let count_line = lines.next().ok_or_else(|| {
                MeshConvertError::UnexpectedEof("missing element count after $Elements".into())
            })?;
            let declared_elements: usize = header_field(count_line, "element count")?;
            if declared_elements == 0 {
                return Err(MeshConvertError::MalformedHeader(
                    "no cells found in gmsh file".into(),
                ));
            }

            let mut triangles: Vec<(i64, Vec<u64>)> = Vec::new();
            let mut tets: Vec<(i64, Vec<u64>)> = Vec::new();
            let mut records = 0usize;
            loop {
                let line = lines.next().ok_or_else(|| {
                    MeshConvertError::UnexpectedEof("missing $EndElements".into())
                })?;
                if line.trim_end().starts_with("$EndElements") {
                    break;
                }
                records += 1;
                let record = Self::element_record(line)?;
                match record.elem_type {
                    2 => triangles.push((record.tag, record.nodes)),
                    4 => tets.push((record.tag, record.nodes)),
                    _ => {}
                }
            }
            if records != declared_elements {
                return Err(MeshConvertError::CountMismatch {
                    entity: "elements",
                    declared: declared_elements,
                    found: records,
                });
            }

            // Highest dimension wins; lower-dimension elements are dropped.
            let (kind, surviving) = if !tets.is_empty() {
                (CellKind::Tetrahedron, tets)
            } else if !triangles.is_empty() {
                (CellKind::Triangle, triangles)
            } else {
                return Err(MeshConvertError::MalformedHeader(
                    "unable to find cell type: no triangle or tetrahedron elements".into(),
                ));
            };

            let vertex_map =
                DenseIdMap::from_ids(surviving.iter().flat_map(|(_, nodes)| nodes.iter().copied()));
            let tags = surviving.iter().map(|(tag, _)| *tag).collect();
            return Ok(Discovery {
                kind,
                cell_count: surviving.len(),
                declared_elements,
                vertex_map,
                tags,
            });
        }
        Err(MeshConvertError::MalformedHeader(
            "no $Elements section found; did you use version 2.0 of the gmsh file format?".into(),
        ))
    }

    /// Emission pass: replay the input through the section state machine.
    fn emit<H: DataHandler>(
        contents: &str,
        discovery: &Discovery,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let kind = discovery.kind;
        let dim = kind.dimension();
        handler.set_mesh_type(kind, dim)?;

        let num_vertices = discovery.vertex_map.len();
        let mut coords: Vec<Option<[f64; 3]>> = vec![None; num_vertices];
        let mut declared_nodes = 0usize;
        let mut nodes_read = 0usize;
        let mut declared_elements = 0usize;
        let mut elements_read = 0usize;
        let mut cells_read = 0usize;
        let mut state = State::AwaitFormat;

        for line in contents.lines() {
            if line.starts_with('#') {
                continue;
            }
            let trimmed = line.trim_end();
            match state {
                State::AwaitFormat => {
                    if trimmed == "$MeshFormat" {
                        state = State::ReadFormat;
                    }
                }
                State::ReadFormat => {
                    let mut parts = line.split_whitespace();
                    let (Some(_version), Some(_file_type), Some(_data_size)) =
                        (parts.next(), parts.next(), parts.next())
                    else {
                        return Err(MeshConvertError::MalformedHeader(format!(
                            "malformed $MeshFormat line: `{line}`"
                        )));
                    };
                    state = State::AwaitEndFormat;
                }
                State::AwaitEndFormat => {
                    if trimmed == "$EndMeshFormat" {
                        state = State::AwaitNodes;
                    }
                }
                State::AwaitNodes => {
                    if trimmed == "$Nodes" {
                        state = State::ReadNodeCount;
                    }
                }
                State::ReadNodeCount => {
                    declared_nodes = header_field(line, "node count")?;
                    state = if declared_nodes == 0 {
                        State::AwaitEndNodes
                    } else {
                        State::ReadNodes
                    };
                }
                State::ReadNodes => {
                    let fields: Vec<&str> = line.split_whitespace().collect();
                    if fields.len() != 4 {
                        return Err(MeshConvertError::MalformedRecord(format!(
                            "node record has {} fields, expected 4: `{line}`",
                            fields.len()
                        )));
                    }
                    let id: u64 = field(fields[0], "node id")?;
                    // Nodes unused by any surviving element are dropped.
                    if let Some(index) = discovery.vertex_map.index_of(id) {
                        let x = field(fields[1], "x coordinate")?;
                        let y = field(fields[2], "y coordinate")?;
                        let z = field(fields[3], "z coordinate")?;
                        coords[index] = Some([x, y, z]);
                    }
                    nodes_read += 1;
                    if nodes_read == declared_nodes {
                        state = State::AwaitEndNodes;
                    }
                }
                State::AwaitEndNodes => {
                    if trimmed == "$EndNodes" {
                        Self::emit_vertices(&coords, handler)?;
                        state = State::AwaitElements;
                    }
                }
                State::AwaitElements => {
                    if trimmed == "$Elements" {
                        state = State::ReadElementCount;
                    }
                }
                State::ReadElementCount => {
                    declared_elements = header_field(line, "element count")?;
                    handler.begin_cells(discovery.cell_count)?;
                    state = State::ReadElements;
                }
                State::ReadElements => {
                    if trimmed.starts_with("$EndElements") {
                        if elements_read != declared_elements {
                            return Err(MeshConvertError::CountMismatch {
                                entity: "elements",
                                declared: declared_elements,
                                found: elements_read,
                            });
                        }
                        handler.end_cells()?;
                        state = State::Done;
                        continue;
                    }
                    elements_read += 1;
                    let record = Self::element_record(line)?;
                    let survives = matches!(
                        (record.elem_type, kind),
                        (2, CellKind::Triangle) | (4, CellKind::Tetrahedron)
                    );
                    if survives {
                        let mut cell = Vec::with_capacity(kind.arity());
                        for node in &record.nodes {
                            let index =
                                discovery.vertex_map.index_of(*node).ok_or_else(|| {
                                    MeshConvertError::UndefinedReference(format!(
                                        "vertex {node} of cell {cells_read} not previously defined"
                                    ))
                                })?;
                            cell.push(index);
                        }
                        handler.add_cell(cells_read, &cell)?;
                        cells_read += 1;
                    }
                }
                State::Done => break,
            }
        }

        if state != State::Done {
            return Err(MeshConvertError::UnexpectedEof(
                "missing data, unable to convert; did you use version 2.0 of the gmsh file format?"
                    .into(),
            ));
        }

        // Physical regions: all-zero tags mean none were defined.
        if discovery.tags.iter().any(|&tag| tag != 0) {
            handler.begin_mesh_function("physical_region", dim, discovery.cell_count)?;
            for (index, &tag) in discovery.tags.iter().enumerate() {
                handler.add_entity(index, tag)?;
            }
            handler.end_mesh_function()?;
        }

        debug_assert_eq!(discovery.declared_elements, declared_elements);
        Ok(())
    }

    fn emit_vertices<H: DataHandler>(
        coords: &[Option<[f64; 3]>],
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        handler.begin_vertices(coords.len())?;
        for (index, slot) in coords.iter().enumerate() {
            let xyz = slot.ok_or_else(|| {
                MeshConvertError::UndefinedReference(format!(
                    "vertex with dense index {index} referenced by an element but never declared"
                ))
            })?;
            handler.add_vertex(index, xyz)?;
        }
        handler.end_vertices()
    }
}
