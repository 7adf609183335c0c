//! Canonical mesh/graph model and the in-memory builder sink.
//!
//! [`MeshBuilder`] is the reference [`DataHandler`] implementation: it
//! accumulates events into [`Canonical`] values and enforces every model
//! invariant (count agreement, dense indices, dangling-reference checks,
//! full mesh-function coverage) as the events arrive.

use crate::convert_error::MeshConvertError;
use crate::handler::{DataHandler, Stage};
use serde::{Deserialize, Serialize};

/// Cell kinds supported by the canonical representation.
///
/// A mesh holds exactly one kind; mixed-dimension input collapses to the
/// highest dimension present before events are emitted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellKind {
    /// 2D simplex, three vertices per cell.
    Triangle,
    /// 3D simplex, four vertices per cell.
    Tetrahedron,
}

impl CellKind {
    /// Topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellKind::Triangle => 2,
            CellKind::Tetrahedron => 3,
        }
    }

    /// Number of vertices per cell.
    pub fn arity(self) -> usize {
        match self {
            CellKind::Triangle => 3,
            CellKind::Tetrahedron => 4,
        }
    }

    /// Canonical lowercase name used by serializers.
    pub fn name(self) -> &'static str {
        match self {
            CellKind::Triangle => "triangle",
            CellKind::Tetrahedron => "tetrahedron",
        }
    }
}

/// A named integer attribute over all vertices (`dim == 0`) or all cells
/// (`dim == ` cell dimension) of a mesh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshFunction {
    /// Function name (e.g. `physical_region`, `material`).
    pub name: String,
    /// Entity dimension the function is attached to.
    pub dim: u8,
    /// One value per entity, indexed like the owning collection.
    pub values: Vec<i64>,
}

/// Canonical mesh: one cell kind, dense zero-based vertex indices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// The single cell kind of this mesh.
    pub kind: CellKind,
    /// Geometric dimension, 2 or 3. z is fixed at 0 for 2-D meshes.
    pub dim: u8,
    /// Coordinates, indexed `0..N` contiguously.
    pub vertices: Vec<[f64; 3]>,
    /// Fixed-arity vertex index tuples.
    pub cells: Vec<Vec<usize>>,
    /// Mesh functions finalized during the conversion.
    pub functions: Vec<MeshFunction>,
}

/// Canonical graph vertex record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphVertex {
    /// Number of edges leaving this vertex.
    pub num_edges: usize,
    /// Vertex weight; sources without weights use 1.
    pub weight: i64,
}

/// Canonical graph edge record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source endpoint.
    pub v1: usize,
    /// Destination endpoint.
    pub v2: usize,
    /// Edge weight; sources without weights use 1.
    pub weight: i64,
}

/// Canonical graph. Undirected sources still materialize one edge record
/// per declared endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    /// Whether the canonical document is labelled directed.
    pub directed: bool,
    /// Vertex records, indexed `0..N` contiguously.
    pub vertices: Vec<GraphVertex>,
    /// Edge records in emission order.
    pub edges: Vec<GraphEdge>,
}

/// Top-level canonical entity produced by a conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Canonical {
    /// A simplicial mesh.
    Mesh(Mesh),
    /// A vertex/edge graph.
    Graph(Graph),
}

#[derive(Debug)]
struct FunctionStaging {
    name: String,
    dim: u8,
    values: Vec<Option<i64>>,
}

/// In-memory sink that builds a [`Canonical`] value from events.
#[derive(Debug)]
pub struct MeshBuilder {
    stage: Stage,
    mesh: Option<Mesh>,
    graph: Option<Graph>,
    declared: usize,
    seen: usize,
    function: Option<FunctionStaging>,
    warnings: Vec<String>,
    failure: Option<String>,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshBuilder {
    /// Create a builder in the initial stage.
    pub fn new() -> Self {
        Self {
            stage: Stage::Initial,
            mesh: None,
            graph: None,
            declared: 0,
            seen: 0,
            function: None,
            warnings: Vec::new(),
            failure: None,
        }
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, from: Stage, to: Stage) -> Result<(), MeshConvertError> {
        self.stage.expect(from)?;
        self.stage = to;
        Ok(())
    }

    fn mesh_mut(&mut self) -> Result<&mut Mesh, MeshConvertError> {
        self.mesh
            .as_mut()
            .ok_or(MeshConvertError::InvalidHandlerState {
                expected: "ready (mesh document)",
                actual: "no mesh declared",
            })
    }

    fn graph_mut(&mut self) -> Result<&mut Graph, MeshConvertError> {
        self.graph
            .as_mut()
            .ok_or(MeshConvertError::InvalidHandlerState {
                expected: "ready (graph document)",
                actual: "no graph declared",
            })
    }

    fn check_count(&self, entity: &'static str) -> Result<(), MeshConvertError> {
        if self.seen == self.declared {
            Ok(())
        } else {
            Err(MeshConvertError::CountMismatch {
                entity,
                declared: self.declared,
                found: self.seen,
            })
        }
    }

    /// Warnings reported during the conversion, in order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The fatal diagnostic recorded via [`DataHandler::error`], if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Consume the builder, yielding the canonical entity it accumulated.
    ///
    /// Returns `None` if the conversion failed before a document type was
    /// declared or after a fatal diagnostic was recorded.
    pub fn finish(self) -> Option<Canonical> {
        if self.failure.is_some() {
            return None;
        }
        match (self.mesh, self.graph) {
            (Some(mesh), _) => Some(Canonical::Mesh(mesh)),
            (None, Some(graph)) => Some(Canonical::Graph(graph)),
            (None, None) => None,
        }
    }
}

impl DataHandler for MeshBuilder {
    fn set_mesh_type(&mut self, kind: CellKind, dim: u8) -> Result<(), MeshConvertError> {
        self.enter(Stage::Initial, Stage::Ready)?;
        debug_assert_eq!(dim, kind.dimension());
        self.mesh = Some(Mesh {
            kind,
            dim,
            vertices: Vec::new(),
            cells: Vec::new(),
            functions: Vec::new(),
        });
        Ok(())
    }

    fn set_graph_type(&mut self, directed: bool) -> Result<(), MeshConvertError> {
        self.enter(Stage::Initial, Stage::Ready)?;
        self.graph = Some(Graph {
            directed,
            vertices: Vec::new(),
            edges: Vec::new(),
        });
        Ok(())
    }

    fn begin_vertices(&mut self, count: usize) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::Vertices)?;
        self.declared = count;
        self.seen = 0;
        self.mesh_mut()?.vertices.reserve(count);
        Ok(())
    }

    fn add_vertex(&mut self, index: usize, coords: [f64; 3]) -> Result<(), MeshConvertError> {
        self.stage().expect(Stage::Vertices)?;
        if index != self.seen {
            return Err(MeshConvertError::MalformedRecord(format!(
                "vertex index {index} out of order, expected {}",
                self.seen
            )));
        }
        if self.seen >= self.declared {
            return Err(MeshConvertError::CountMismatch {
                entity: "vertices",
                declared: self.declared,
                found: self.seen + 1,
            });
        }
        self.mesh_mut()?.vertices.push(coords);
        self.seen += 1;
        Ok(())
    }

    fn end_vertices(&mut self) -> Result<(), MeshConvertError> {
        self.check_count("vertices")?;
        self.enter(Stage::Vertices, Stage::Ready)
    }

    fn begin_cells(&mut self, count: usize) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::Cells)?;
        self.declared = count;
        self.seen = 0;
        self.mesh_mut()?.cells.reserve(count);
        Ok(())
    }

    fn add_cell(&mut self, index: usize, vertices: &[usize]) -> Result<(), MeshConvertError> {
        self.stage().expect(Stage::Cells)?;
        if index != self.seen {
            return Err(MeshConvertError::MalformedRecord(format!(
                "cell index {index} out of order, expected {}",
                self.seen
            )));
        }
        if self.seen >= self.declared {
            return Err(MeshConvertError::CountMismatch {
                entity: "cells",
                declared: self.declared,
                found: self.seen + 1,
            });
        }
        let mesh = self.mesh_mut()?;
        if vertices.len() != mesh.kind.arity() {
            return Err(MeshConvertError::MalformedRecord(format!(
                "cell {index} has {} vertices, {} expects {}",
                vertices.len(),
                mesh.kind.name(),
                mesh.kind.arity()
            )));
        }
        let num_vertices = mesh.vertices.len();
        for &v in vertices {
            if v >= num_vertices {
                return Err(MeshConvertError::UndefinedReference(format!(
                    "cell {index} references vertex {v}, mesh has {num_vertices} vertices"
                )));
            }
        }
        mesh.cells.push(vertices.to_vec());
        self.seen += 1;
        Ok(())
    }

    fn end_cells(&mut self) -> Result<(), MeshConvertError> {
        self.check_count("cells")?;
        self.enter(Stage::Cells, Stage::Ready)
    }

    fn begin_mesh_function(
        &mut self,
        name: &str,
        dim: u8,
        size: usize,
    ) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::MeshFunction)?;
        let mesh = self.mesh_mut()?;
        let owner = if dim == 0 {
            mesh.vertices.len()
        } else if dim == mesh.kind.dimension() {
            mesh.cells.len()
        } else {
            return Err(MeshConvertError::MalformedRecord(format!(
                "mesh function `{name}` has entity dimension {dim}, mesh supports 0 or {}",
                mesh.kind.dimension()
            )));
        };
        if size != owner {
            return Err(MeshConvertError::CountMismatch {
                entity: "mesh function entities",
                declared: size,
                found: owner,
            });
        }
        self.function = Some(FunctionStaging {
            name: name.to_string(),
            dim,
            values: vec![None; size],
        });
        Ok(())
    }

    fn add_entity(&mut self, index: usize, value: i64) -> Result<(), MeshConvertError> {
        self.stage().expect(Stage::MeshFunction)?;
        let staging = self
            .function
            .as_mut()
            .ok_or(MeshConvertError::InvalidHandlerState {
                expected: "mesh-function",
                actual: "no open mesh function",
            })?;
        let size = staging.values.len();
        let slot =
            staging
                .values
                .get_mut(index)
                .ok_or_else(|| MeshConvertError::UndefinedReference(format!(
                    "mesh function entity {index} out of range 0..{size}"
                )))?;
        if slot.replace(value).is_some() {
            return Err(MeshConvertError::MalformedRecord(format!(
                "duplicate mesh function value for entity {index}"
            )));
        }
        Ok(())
    }

    fn end_mesh_function(&mut self) -> Result<(), MeshConvertError> {
        self.stage().expect(Stage::MeshFunction)?;
        let staging = self
            .function
            .take()
            .ok_or(MeshConvertError::InvalidHandlerState {
                expected: "mesh-function",
                actual: "no open mesh function",
            })?;
        let size = staging.values.len();
        let filled = staging.values.iter().filter(|v| v.is_some()).count();
        if filled != size {
            return Err(MeshConvertError::CountMismatch {
                entity: "mesh function values",
                declared: size,
                found: filled,
            });
        }
        let function = MeshFunction {
            name: staging.name,
            dim: staging.dim,
            values: staging.values.into_iter().flatten().collect(),
        };
        self.mesh_mut()?.functions.push(function);
        self.enter(Stage::MeshFunction, Stage::Ready)
    }

    fn begin_graph_vertices(&mut self, count: usize) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::GraphVertices)?;
        self.declared = count;
        self.seen = 0;
        self.graph_mut()?.vertices.reserve(count);
        Ok(())
    }

    fn add_graph_vertex(
        &mut self,
        index: usize,
        num_edges: usize,
        weight: i64,
    ) -> Result<(), MeshConvertError> {
        self.stage().expect(Stage::GraphVertices)?;
        if index != self.seen {
            return Err(MeshConvertError::MalformedRecord(format!(
                "graph vertex index {index} out of order, expected {}",
                self.seen
            )));
        }
        self.graph_mut()?.vertices.push(GraphVertex { num_edges, weight });
        self.seen += 1;
        Ok(())
    }

    fn end_graph_vertices(&mut self) -> Result<(), MeshConvertError> {
        self.check_count("graph vertices")?;
        self.enter(Stage::GraphVertices, Stage::Ready)
    }

    fn begin_graph_edges(&mut self, count: usize) -> Result<(), MeshConvertError> {
        self.enter(Stage::Ready, Stage::GraphEdges)?;
        self.declared = count;
        self.seen = 0;
        self.graph_mut()?.edges.reserve(count);
        Ok(())
    }

    fn add_graph_edge(
        &mut self,
        v1: usize,
        v2: usize,
        weight: i64,
    ) -> Result<(), MeshConvertError> {
        self.stage().expect(Stage::GraphEdges)?;
        let graph = self.graph_mut()?;
        let num_vertices = graph.vertices.len();
        if v1 >= num_vertices || v2 >= num_vertices {
            return Err(MeshConvertError::UndefinedReference(format!(
                "edge ({v1}, {v2}) references a vertex outside 0..{num_vertices}"
            )));
        }
        graph.edges.push(GraphEdge { v1, v2, weight });
        self.seen += 1;
        Ok(())
    }

    fn end_graph_edges(&mut self) -> Result<(), MeshConvertError> {
        self.check_count("graph edges")?;
        self.enter(Stage::GraphEdges, Stage::Ready)
    }

    fn warn(&mut self, message: &str) {
        log::warn!("{message}");
        self.warnings.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        log::error!("{message}");
        self.failure = Some(message.to_string());
    }

    fn close(&mut self) -> Result<(), MeshConvertError> {
        if self.stage() == Stage::Closed {
            return Err(MeshConvertError::InvalidHandlerState {
                expected: "any open stage",
                actual: "closed",
            });
        }
        self.stage = Stage::Closed;
        Ok(())
    }
}
