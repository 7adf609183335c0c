//! # mesh-convert
//!
//! mesh-convert decodes scientific mesh and graph files produced by
//! third-party tools (Medit, Gmsh, Triangle, Metis, Scotch, Diffpack,
//! Abaqus, NetCDF/ExodusII dump text, StarCD) into a single canonical
//! mesh/graph representation, delivered as a uniform stream of
//! construction events to a caller-supplied sink.
//!
//! ## Architecture
//! - [`handler::DataHandler`] is the event-sink contract every decoder
//!   emits to; stage transitions are checked at runtime and violations are
//!   reported as structured errors rather than assertions.
//! - [`formats`] holds the per-format finite-state scanners. Formats whose
//!   structure is not declared up front (Gmsh, Medit, NetCDF, StarCD) run a
//!   discovery pass over the buffered input before the emission pass.
//! - [`remap::DenseIdMap`] renumbers sparse external identifiers into the
//!   dense zero-based range, in ascending external-id order.
//! - [`convert::convert`] resolves the format from a hint or the file
//!   suffix and drives the matching decoder.
//! - [`model::MeshBuilder`] and [`xml::XmlWriter`] are the two provided
//!   sinks: an invariant-checking in-memory builder and a DOLFIN XML
//!   serializer.
//!
//! ## Determinism
//!
//! Renumbering of externally-numbered identifiers always uses ascending
//! external-id order, so repeated conversions of the same input produce
//! identical output.
//!
//! ## Usage
//! ```no_run
//! use mesh_convert::prelude::*;
//!
//! let mut builder = MeshBuilder::new();
//! convert("model.msh", &mut builder, None)?;
//! let canonical = builder.finish();
//! # Ok::<(), mesh_convert::convert_error::MeshConvertError>(())
//! ```

pub mod convert;
pub mod convert_error;
pub mod formats;
pub mod handler;
pub mod model;
pub mod remap;
pub mod xml;

pub use convert::{Format, convert};
pub use convert_error::MeshConvertError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::convert::{Format, convert};
    pub use crate::convert_error::MeshConvertError;
    pub use crate::formats::abaqus::AbaqusDecoder;
    pub use crate::formats::diffpack::DiffpackDecoder;
    pub use crate::formats::gmsh::GmshDecoder;
    pub use crate::formats::medit::MeditDecoder;
    pub use crate::formats::metis::MetisDecoder;
    pub use crate::formats::netcdf::NetCdfDecoder;
    pub use crate::formats::scotch::ScotchDecoder;
    pub use crate::formats::starcd::StarCdDecoder;
    pub use crate::formats::triangle::TriangleDecoder;
    pub use crate::handler::{DataHandler, Stage};
    pub use crate::model::{Canonical, CellKind, Graph, Mesh, MeshBuilder, MeshFunction};
    pub use crate::remap::DenseIdMap;
    pub use crate::xml::XmlWriter;
}
