//! Canonical event sink contract.
//!
//! Every decoder emits the same lifecycle-ordered stream of construction
//! events to a caller-supplied [`DataHandler`]. The sink outlives the
//! conversion and owns finalization of whatever it builds; all decoder
//! staging state is scoped to a single conversion call.
//!
//! Operations are guarded by an explicit [`Stage`] machine instead of
//! assertions: calling an operation in the wrong stage returns
//! [`MeshConvertError::InvalidHandlerState`], which is a decoder bug and is
//! distinguishable from any data error in the source file.

use crate::convert_error::MeshConvertError;
use crate::model::CellKind;

/// Lifecycle stage of an event sink.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// No document type declared yet.
    Initial,
    /// Document type declared; between sections.
    Ready,
    /// Inside a mesh vertex block.
    Vertices,
    /// Inside a mesh cell block.
    Cells,
    /// Inside a mesh-function block.
    MeshFunction,
    /// Inside a graph vertex block.
    GraphVertices,
    /// Inside a graph edge block.
    GraphEdges,
    /// `close()` has been called; no further operations are valid.
    Closed,
}

impl Stage {
    /// Human-readable stage name used in contract-violation errors.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::Ready => "ready",
            Stage::Vertices => "vertices",
            Stage::Cells => "cells",
            Stage::MeshFunction => "mesh-function",
            Stage::GraphVertices => "graph-vertices",
            Stage::GraphEdges => "graph-edges",
            Stage::Closed => "closed",
        }
    }

    /// Check that the sink is in `want`, or report a contract violation.
    pub fn expect(self, want: Stage) -> Result<(), MeshConvertError> {
        if self == want {
            Ok(())
        } else {
            Err(MeshConvertError::InvalidHandlerState {
                expected: want.name(),
                actual: self.name(),
            })
        }
    }
}

/// Consumer of canonical construction events.
///
/// Stage transitions per operation:
/// - `set_mesh_type` / `set_graph_type`: Initial → Ready
/// - `begin_vertices` … `end_vertices`: Ready → Vertices → Ready
/// - `begin_cells` … `end_cells`: Ready → Cells → Ready
/// - `begin_mesh_function` … `end_mesh_function`: Ready → MeshFunction → Ready
/// - `begin_graph_vertices` … `end_graph_vertices`: Ready → GraphVertices → Ready
/// - `begin_graph_edges` … `end_graph_edges`: Ready → GraphEdges → Ready
/// - `warn` / `error`: any stage
/// - `close`: any stage, at most once per conversion
pub trait DataHandler {
    /// Declare a mesh document of the given cell kind and dimension.
    fn set_mesh_type(&mut self, kind: CellKind, dim: u8) -> Result<(), MeshConvertError>;

    /// Declare a graph document, directed or undirected.
    fn set_graph_type(&mut self, directed: bool) -> Result<(), MeshConvertError>;

    /// Open the vertex block; exactly `count` vertices must follow.
    fn begin_vertices(&mut self, count: usize) -> Result<(), MeshConvertError>;

    /// Add one vertex. Indices are dense, zero-based, strictly increasing.
    fn add_vertex(&mut self, index: usize, coords: [f64; 3]) -> Result<(), MeshConvertError>;

    /// Close the vertex block; the observed count must match the declared one.
    fn end_vertices(&mut self) -> Result<(), MeshConvertError>;

    /// Open the cell block; exactly `count` cells must follow.
    fn begin_cells(&mut self, count: usize) -> Result<(), MeshConvertError>;

    /// Add one cell. Arity must match the declared cell kind and every
    /// vertex index must reference an emitted vertex.
    fn add_cell(&mut self, index: usize, vertices: &[usize]) -> Result<(), MeshConvertError>;

    /// Close the cell block.
    fn end_cells(&mut self) -> Result<(), MeshConvertError>;

    /// Open a named mesh function over all entities of dimension `dim`
    /// (0 for vertices, the cell dimension for cells).
    fn begin_mesh_function(
        &mut self,
        name: &str,
        dim: u8,
        size: usize,
    ) -> Result<(), MeshConvertError>;

    /// Record the scalar value attached to entity `index`.
    fn add_entity(&mut self, index: usize, value: i64) -> Result<(), MeshConvertError>;

    /// Close the mesh function; indices `0..size` must each appear once.
    fn end_mesh_function(&mut self) -> Result<(), MeshConvertError>;

    /// Open the graph vertex block.
    fn begin_graph_vertices(&mut self, count: usize) -> Result<(), MeshConvertError>;

    /// Add one graph vertex with its outgoing edge count and weight.
    fn add_graph_vertex(
        &mut self,
        index: usize,
        num_edges: usize,
        weight: i64,
    ) -> Result<(), MeshConvertError>;

    /// Close the graph vertex block.
    fn end_graph_vertices(&mut self) -> Result<(), MeshConvertError>;

    /// Open the graph edge block.
    fn begin_graph_edges(&mut self, count: usize) -> Result<(), MeshConvertError>;

    /// Add one edge record. Undirected sources emit one record per declared
    /// endpoint, so both directions appear separately.
    fn add_graph_edge(&mut self, v1: usize, v2: usize, weight: i64)
    -> Result<(), MeshConvertError>;

    /// Close the graph edge block.
    fn end_graph_edges(&mut self) -> Result<(), MeshConvertError>;

    /// Report a non-fatal condition. Does not change the sink stage.
    fn warn(&mut self, message: &str) {
        log::warn!("{message}");
    }

    /// Record an unrecoverable parse failure. The conversion does not
    /// continue after this call; the dispatcher invokes it once on the
    /// fatal path before closing the sink.
    fn error(&mut self, message: &str) {
        log::error!("{message}");
    }

    /// Release resources. Called at most once per conversion, including on
    /// the error path.
    fn close(&mut self) -> Result<(), MeshConvertError>;
}
