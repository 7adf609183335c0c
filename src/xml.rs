//! XML writer sink.
//!
//! A pure event consumer that serializes the canonical representation as
//! DOLFIN-style XML: mesh documents carry `celltype` and `dim`, vertices
//! `index`/`x`/`y`/`z`, cells `index`/`v0..v3`, graph documents `type`, and
//! each mesh function goes to a sibling `<stem>_<name>.xml` document of
//! `entity` records. The decoders know nothing about this serialization;
//! it sits entirely behind the [`DataHandler`] contract.

use crate::convert_error::MeshConvertError;
use crate::handler::{DataHandler, Stage};
use crate::model::CellKind;
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Doc {
    None,
    Mesh,
    Graph,
}

/// Sink that writes canonical events as DOLFIN XML.
pub struct XmlWriter {
    stage: Stage,
    path: PathBuf,
    out: BufWriter<File>,
    doc: Doc,
    kind: Option<CellKind>,
    function: Option<BufWriter<File>>,
}

const PREAMBLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\n\
                        <dolfin xmlns:dolfin=\"http://fenicsproject.org\">\n";

impl XmlWriter {
    /// Create a writer targeting `path`. Mesh functions are written to
    /// sibling files derived from the same stem.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, MeshConvertError> {
        let path = path.as_ref().to_path_buf();
        let out = BufWriter::new(File::create(&path)?);
        Ok(Self {
            stage: Stage::Initial,
            path,
            out,
            doc: Doc::None,
            kind: None,
            function: None,
        })
    }

    fn enter(&mut self, from: Stage, to: Stage) -> Result<(), MeshConvertError> {
        self.stage.expect(from)?;
        self.stage = to;
        Ok(())
    }

    fn function_path(&self, name: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("mesh");
        self.path.with_file_name(format!("{stem}_{name}.xml"))
    }
}

impl DataHandler for XmlWriter {
    fn set_mesh_type(&mut self, kind: CellKind, dim: u8) -> Result<(), MeshConvertError> {
        self.enter(Stage::Initial, Stage::Ready)?;
        self.doc = Doc::Mesh;
        self.kind = Some(kind);
        write!(
            self.out,
            "{PREAMBLE}  <mesh celltype=\"{}\" dim=\"{dim}\">\n",
            kind.name()
        )?;
        Ok(())
    }

    fn set_graph_type(&mut self, directed: bool) -> Result<(), MeshConvertError> {
        self.enter(Stage::Initial, Stage::Ready)?;
        self.doc = Doc::Graph;
        let label = if directed { "directed" } else { "undirected" };
        write!(self.out, "{PREAMBLE}  <graph type=\"{label}\">\n")?;
        Ok(())
    }

    fn begin_vertices(&mut self, count: usize) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::Vertices)?;
        writeln!(self.out, "    <vertices size=\"{count}\">")?;
        Ok(())
    }

    fn add_vertex(&mut self, index: usize, coords: [f64; 3]) -> Result<(), MeshConvertError> {
        self.stage.expect(Stage::Vertices)?;
        writeln!(
            self.out,
            "      <vertex index=\"{index}\" x=\"{}\" y=\"{}\" z=\"{}\"/>",
            coords[0], coords[1], coords[2]
        )?;
        Ok(())
    }

    fn end_vertices(&mut self) -> Result<(), MeshConvertError> {
        self.enter(Stage::Vertices, Stage::Ready)?;
        writeln!(self.out, "    </vertices>")?;
        Ok(())
    }

    fn begin_cells(&mut self, count: usize) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::Cells)?;
        writeln!(self.out, "    <cells size=\"{count}\">")?;
        Ok(())
    }

    fn add_cell(&mut self, index: usize, vertices: &[usize]) -> Result<(), MeshConvertError> {
        self.stage.expect(Stage::Cells)?;
        let kind = self.kind.ok_or(MeshConvertError::InvalidHandlerState {
            expected: "cells (mesh document)",
            actual: "no mesh declared",
        })?;
        let corners = vertices
            .iter()
            .enumerate()
            .map(|(slot, v)| format!("v{slot}=\"{v}\""))
            .join(" ");
        writeln!(
            self.out,
            "      <{} index=\"{index}\" {corners}/>",
            kind.name()
        )?;
        Ok(())
    }

    fn end_cells(&mut self) -> Result<(), MeshConvertError> {
        self.enter(Stage::Cells, Stage::Ready)?;
        writeln!(self.out, "    </cells>")?;
        Ok(())
    }

    fn begin_mesh_function(
        &mut self,
        name: &str,
        dim: u8,
        size: usize,
    ) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::MeshFunction)?;
        let mut out = BufWriter::new(File::create(self.function_path(name))?);
        write!(
            out,
            "{PREAMBLE}  <meshfunction type=\"uint\" dim=\"{dim}\" size=\"{size}\">\n"
        )?;
        self.function = Some(out);
        Ok(())
    }

    fn add_entity(&mut self, index: usize, value: i64) -> Result<(), MeshConvertError> {
        self.stage.expect(Stage::MeshFunction)?;
        let out = self
            .function
            .as_mut()
            .ok_or(MeshConvertError::InvalidHandlerState {
                expected: "mesh-function",
                actual: "no open mesh function",
            })?;
        writeln!(out, "    <entity index=\"{index}\" value=\"{value}\"/>")?;
        Ok(())
    }

    fn end_mesh_function(&mut self) -> Result<(), MeshConvertError> {
        self.enter(Stage::MeshFunction, Stage::Ready)?;
        let mut out = self
            .function
            .take()
            .ok_or(MeshConvertError::InvalidHandlerState {
                expected: "mesh-function",
                actual: "no open mesh function",
            })?;
        write!(out, "  </meshfunction>\n</dolfin>\n")?;
        out.flush()?;
        Ok(())
    }

    fn begin_graph_vertices(&mut self, count: usize) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::GraphVertices)?;
        writeln!(self.out, "    <vertices size=\"{count}\">")?;
        Ok(())
    }

    fn add_graph_vertex(
        &mut self,
        index: usize,
        num_edges: usize,
        weight: i64,
    ) -> Result<(), MeshConvertError> {
        self.stage.expect(Stage::GraphVertices)?;
        writeln!(
            self.out,
            "      <vertex index=\"{index}\" num_edges=\"{num_edges}\" weight=\"{weight}\"/>"
        )?;
        Ok(())
    }

    fn end_graph_vertices(&mut self) -> Result<(), MeshConvertError> {
        self.enter(Stage::GraphVertices, Stage::Ready)?;
        writeln!(self.out, "    </vertices>")?;
        Ok(())
    }

    fn begin_graph_edges(&mut self, count: usize) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::GraphEdges)?;
        writeln!(self.out, "    <edges size=\"{count}\">")?;
        Ok(())
    }

    fn add_graph_edge(
        &mut self,
        v1: usize,
        v2: usize,
        weight: i64,
    ) -> Result<(), MeshConvertError> {
        self.stage.expect(Stage::GraphEdges)?;
        writeln!(
            self.out,
            "      <edge v1=\"{v1}\" v2=\"{v2}\" weight=\"{weight}\"/>"
        )?;
        Ok(())
    }

    fn end_graph_edges(&mut self) -> Result<(), MeshConvertError> {
        self.enter(Stage::GraphEdges, Stage::Ready)?;
        writeln!(self.out, "    </edges>")?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), MeshConvertError> {
        if self.stage == Stage::Closed {
            return Err(MeshConvertError::InvalidHandlerState {
                expected: "any open stage",
                actual: "closed",
            });
        }
        self.stage = Stage::Closed;
        match self.doc {
            Doc::Mesh => write!(self.out, "  </mesh>\n</dolfin>\n")?,
            Doc::Graph => write!(self.out, "  </graph>\n</dolfin>\n")?,
            Doc::None => {}
        }
        self.out.flush()?;
        if let Some(mut function) = self.function.take() {
            function.flush()?;
        }
        Ok(())
    }
}
