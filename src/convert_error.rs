//! MeshConvertError: unified error type for mesh-convert public APIs
//!
//! Every decoder and sink operation reports failure through this type so the
//! outermost caller alone decides how a fatal condition terminates. Library
//! code never exits the process.

use thiserror::Error;

/// Unified error type for mesh-convert operations.
#[derive(Debug, Error)]
pub enum MeshConvertError {
    /// Underlying I/O failure while reading source files or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A required header token or field was absent or unparsable.
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// Declared record count does not match the number of records consumed.
    #[error("{entity} count mismatch: declared {declared}, found {found}")]
    CountMismatch {
        /// Kind of record being counted (vertices, cells, edges, ...).
        entity: &'static str,
        /// Count announced by the source header.
        declared: usize,
        /// Count actually observed in the record stream.
        found: usize,
    },
    /// Input exhausted before the scanner reached its terminal state.
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    /// A record type the decoder does not implement and cannot skip.
    #[error("unsupported record kind: {0}")]
    UnsupportedRecordKind(String),
    /// An index or name was referenced before being declared.
    #[error("undefined reference: {0}")]
    UndefinedReference(String),
    /// An individual record's fields failed to parse.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    /// The input path's suffix is not in the dispatch table.
    #[error("unknown file suffix `{0}`")]
    UnknownSuffix(String),
    /// The resolved format has no decoder.
    #[error("cannot convert from format `{0}`")]
    UnknownFormat(String),
    /// A sink operation was invoked while the sink was in the wrong state.
    ///
    /// This is a contract violation by the decoder, distinguishable from any
    /// data error in the source file.
    #[error("handler contract violation: expected stage {expected}, was {actual}")]
    InvalidHandlerState {
        /// Stage the operation is valid in.
        expected: &'static str,
        /// Stage the sink was actually in.
        actual: &'static str,
    },
    /// An external pass-through tool (the ExodusII dump utility) failed.
    #[error("external tool failed: {0}")]
    ExternalTool(String),
}
