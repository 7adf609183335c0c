//! Abaqus `.inp` decoder.
//!
//! A section-oriented parser keyed on `*`-led lines (matching is
//! case-insensitive). The whole file is staged into dictionaries of nodes,
//! elements, element-set membership, and material-to-element-set
//! associations before anything is emitted, because identifiers are
//! externally numbered and may appear out of order. Emission renumbers
//! node and element ids through dense maps in ascending id order.
//!
//! Only the `c3d4`/`dc3d4` element types are supported; other types are
//! skipped with a warning. A solid section must reference a declared
//! material and populated element sets, otherwise the conversion fails.

use crate::convert_error::MeshConvertError;
use crate::formats::{buffer, field};
use crate::handler::DataHandler;
use crate::model::CellKind;
use crate::remap::DenseIdMap;
use hashbrown::HashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// Decoder for the Abaqus input deck format.
#[derive(Debug, Default, Clone)]
pub struct AbaqusDecoder;

enum Section {
    None,
    Node,
    Element {
        supported: bool,
        elset: Option<String>,
    },
    Other,
}

#[derive(Default)]
struct Staging {
    nodes: HashMap<u64, [f64; 3]>,
    elements: HashMap<u64, [u64; 4]>,
    elset_members: BTreeMap<String, BTreeSet<u64>>,
    /// Element sets named by each solid section, keyed by material name.
    material_elsets: BTreeMap<String, Vec<String>>,
    /// Declared materials in declaration order.
    materials: Vec<String>,
}

impl AbaqusDecoder {
    /// Decode an Abaqus input deck, emitting canonical events to `handler`.
    pub fn decode<R: Read, H: DataHandler>(
        &self,
        reader: R,
        handler: &mut H,
    ) -> Result<(), MeshConvertError> {
        let contents = buffer(reader)?;
        let staging = Self::scan(&contents, handler)?;
        Self::emit(&staging, handler)
    }

    fn scan<H: DataHandler>(
        contents: &str,
        handler: &mut H,
    ) -> Result<Staging, MeshConvertError> {
        let mut staging = Staging::default();
        let mut section = Section::None;

        for (lineno, raw) in contents.lines().enumerate() {
            let line = raw.trim().to_lowercase();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('*') {
                if rest.starts_with('*') {
                    // ** introduces a comment line.
                    continue;
                }
                let (name, params_str) = match rest.split_once(',') {
                    Some((name, params)) => (name.trim(), params),
                    None => (rest.trim(), ""),
                };
                let params = Self::read_params(params_str, lineno, handler);
                section = match name {
                    "node" => Section::Node,
                    "element" => {
                        let elem_type = params.get("type").ok_or_else(|| {
                            MeshConvertError::MalformedHeader(format!(
                                "element section on line {lineno} doesn't declare TYPE"
                            ))
                        })?;
                        let supported = matches!(elem_type.as_str(), "c3d4" | "dc3d4");
                        if !supported {
                            handler.warn(&format!(
                                "unsupported element type `{elem_type}` on line {lineno}"
                            ));
                        }
                        Section::Element {
                            supported,
                            elset: params.get("elset").cloned(),
                        }
                    }
                    "solid section" => {
                        for pname in ["material", "elset"] {
                            if !params.contains_key(pname) {
                                return Err(MeshConvertError::MalformedHeader(format!(
                                    "solid section on line {lineno} doesn't declare {}",
                                    pname.to_uppercase()
                                )));
                            }
                        }
                        staging
                            .material_elsets
                            .entry(params["material"].clone())
                            .or_default()
                            .push(params["elset"].clone());
                        Section::Other
                    }
                    "material" => {
                        let name = params.get("name").ok_or_else(|| {
                            MeshConvertError::MalformedHeader(format!(
                                "material section on line {lineno} doesn't declare NAME"
                            ))
                        })?;
                        staging.materials.push(name.clone());
                        Section::Other
                    }
                    _ => Section::Other,
                };
                continue;
            }

            match &section {
                Section::Node => {
                    if let Some((id, coords)) = Self::node_record(&line, lineno, handler) {
                        staging.nodes.insert(id, coords);
                    }
                }
                Section::Element { supported, elset } => {
                    if !*supported {
                        continue;
                    }
                    let (id, nodes) = Self::element_record(&line, lineno)?;
                    staging.elements.insert(id, nodes);
                    if let Some(elset) = elset {
                        staging
                            .elset_members
                            .entry(elset.clone())
                            .or_default()
                            .insert(id);
                    }
                }
                Section::None | Section::Other => {}
            }
        }
        Ok(staging)
    }

    /// Parse `key=value` parameters from a section heading. Invalid
    /// parameter syntax is a warning, not fatal.
    fn read_params<H: DataHandler>(
        params_str: &str,
        lineno: usize,
        handler: &mut H,
    ) -> HashMap<String, String> {
        let mut params = HashMap::new();
        for spec in params_str.split(',') {
            let spec = spec.trim();
            if spec.is_empty() {
                continue;
            }
            match spec.split_once('=') {
                Some((key, value)) => {
                    params.insert(key.trim().to_string(), value.trim().to_string());
                }
                None => {
                    handler.warn(&format!(
                        "invalid parameter syntax on line {lineno}: {spec}"
                    ));
                }
            }
        }
        params
    }

    /// Parse one node record. Malformed records are skipped with a warning.
    fn node_record<H: DataHandler>(
        line: &str,
        lineno: usize,
        handler: &mut H,
    ) -> Option<(u64, [f64; 3])> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            handler.warn(&format!("node on line {lineno} is on unsupported format"));
            return None;
        }
        let Ok(id) = fields[0].parse::<u64>() else {
            handler.warn(&format!("node on line {lineno} is on unsupported format"));
            return None;
        };
        let mut coords = [0.0; 3];
        for (slot, tok) in coords.iter_mut().zip(&fields[1..]) {
            match tok.parse::<f64>() {
                Ok(value) => *slot = value,
                Err(_) => {
                    handler.warn(&format!(
                        "node on line {lineno} contains non-numeric coordinates"
                    ));
                    return None;
                }
            }
        }
        Some((id, coords))
    }

    /// Parse one tetrahedral element record. Malformed records are fatal:
    /// the cell collection cannot proceed with a hole in it.
    fn element_record(line: &str, lineno: usize) -> Result<(u64, [u64; 4]), MeshConvertError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(MeshConvertError::MalformedRecord(format!(
                "element on line {lineno} badly specified (expected 4 nodes)"
            )));
        }
        let id: u64 = field(fields[0], "element id")?;
        let mut nodes = [0u64; 4];
        for (slot, tok) in nodes.iter_mut().zip(&fields[1..]) {
            *slot = field(tok, "element node id")?;
        }
        Ok((id, nodes))
    }

    fn emit<H: DataHandler>(staging: &Staging, handler: &mut H) -> Result<(), MeshConvertError> {
        // Vertices and cells must be consecutively numbered, which isn't
        // necessarily the case in the source; renumber through dense maps.
        let node_map = DenseIdMap::from_ids(staging.nodes.keys().copied());
        let elem_map = DenseIdMap::from_ids(staging.elements.keys().copied());

        handler.set_mesh_type(CellKind::Tetrahedron, 3)?;
        handler.begin_vertices(node_map.len())?;
        for (id, index) in node_map.iter() {
            handler.add_vertex(index, staging.nodes[&id])?;
        }
        handler.end_vertices()?;

        handler.begin_cells(elem_map.len())?;
        for (id, index) in elem_map.iter() {
            let mut cell = [0usize; 4];
            for (slot, node) in cell.iter_mut().zip(&staging.elements[&id]) {
                *slot = node_map.index_of(*node).ok_or_else(|| {
                    MeshConvertError::UndefinedReference(format!(
                        "element {id} references non-existent node {node}"
                    ))
                })?;
            }
            handler.add_cell(index, &cell)?;
        }
        handler.end_cells()?;

        if staging.material_elsets.is_empty() {
            return Ok(());
        }

        // Resolve every solid-section reference before assigning values.
        for (material, elsets) in &staging.material_elsets {
            if !staging.materials.contains(material) {
                return Err(MeshConvertError::UndefinedReference(format!(
                    "unknown material {material} referred to for element sets {}",
                    elsets.join(", ")
                )));
            }
            for elset in elsets {
                if !staging.elset_members.contains_key(elset) {
                    return Err(MeshConvertError::UndefinedReference(format!(
                        "material `{material}` is assigned to undefined element set `{elset}`"
                    )));
                }
            }
        }

        // Cells outside every solid section keep the default value 0.
        let mut values = vec![0i64; elem_map.len()];
        for (mat_index, material) in staging.materials.iter().enumerate() {
            let Some(elsets) = staging.material_elsets.get(material) else {
                continue;
            };
            for elset in elsets {
                for id in &staging.elset_members[elset] {
                    if let Some(index) = elem_map.index_of(*id) {
                        values[index] = mat_index as i64;
                    }
                }
            }
        }

        handler.begin_mesh_function("material", 3, elem_map.len())?;
        for (index, &value) in values.iter().enumerate() {
            handler.add_entity(index, value)?;
        }
        handler.end_mesh_function()
    }
}
