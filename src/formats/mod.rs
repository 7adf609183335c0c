//! Per-format decoders.
//!
//! Each decoder is a finite-state scanner over line-oriented (or, for
//! StarCD, fixed-column) text that emits canonical construction events to a
//! [`DataHandler`](crate::handler::DataHandler). Formats with ambiguous or
//! forward-declared structure run a discovery pass over the buffered input
//! before the emission pass; buffering the whole source up front makes every
//! input replayable, including piped ones.

pub mod abaqus;
pub mod diffpack;
pub mod gmsh;
pub mod medit;
pub mod metis;
pub mod netcdf;
pub mod scotch;
pub mod starcd;
pub mod triangle;

use crate::convert_error::MeshConvertError;
use std::io::Read;
use std::str::FromStr;

/// Buffer the whole input; two-pass decoders re-scan the returned string.
pub(crate) fn buffer<R: Read>(mut reader: R) -> Result<String, MeshConvertError> {
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse one record field, reporting `what` on failure.
pub(crate) fn field<T: FromStr>(token: &str, what: &str) -> Result<T, MeshConvertError> {
    token
        .trim()
        .parse::<T>()
        .map_err(|_| MeshConvertError::MalformedRecord(format!("invalid {what}: `{token}`")))
}

/// Parse one header field, reporting `what` on failure.
pub(crate) fn header_field<T: FromStr>(token: &str, what: &str) -> Result<T, MeshConvertError> {
    token
        .trim()
        .parse::<T>()
        .map_err(|_| MeshConvertError::MalformedHeader(format!("invalid {what}: `{token}`")))
}

/// Convert a 1-based source index to 0-based.
pub(crate) fn to_zero_based(index: usize, what: &str) -> Result<usize, MeshConvertError> {
    index.checked_sub(1).ok_or_else(|| {
        MeshConvertError::MalformedRecord(format!("{what} index 0 in 1-based numbering"))
    })
}
