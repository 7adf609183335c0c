//! Format dispatch.
//!
//! Resolves a [`Format`] from an explicit hint or from the input path's
//! suffix, pairs up multi-file sources, and invokes the matching decoder.
//! Whatever happens, the sink is closed exactly once; on the fatal path the
//! diagnostic is also delivered through [`DataHandler::error`] before the
//! error propagates to the caller.

use crate::convert_error::MeshConvertError;
use crate::formats::abaqus::AbaqusDecoder;
use crate::formats::diffpack::DiffpackDecoder;
use crate::formats::gmsh::GmshDecoder;
use crate::formats::medit::MeditDecoder;
use crate::formats::metis::MetisDecoder;
use crate::formats::netcdf::NetCdfDecoder;
use crate::formats::scotch::ScotchDecoder;
use crate::formats::starcd::StarCdDecoder;
use crate::formats::triangle::TriangleDecoder;
use crate::handler::DataHandler;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Source formats the dispatcher can resolve.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Format {
    /// Canonical XML itself; recognized but has no decoder.
    Xml,
    /// Medit `.mesh`.
    Medit,
    /// Gmsh ASCII v2 `.msh`/`.gmsh`.
    Gmsh,
    /// Triangle `.node`/`.ele` pair (hint-only, no suffix mapping).
    Triangle,
    /// Metis graph `.gra`.
    Metis,
    /// Scotch graph `.grf`.
    Scotch,
    /// Diffpack grid `.grid`.
    Diffpack,
    /// Abaqus input deck `.inp`.
    Abaqus,
    /// NetCDF dump text `.ncdf`.
    NetCdf,
    /// ExodusII binary `.exo`/`.e`, decoded through the dump tool.
    ExodusII,
    /// StarCD `.vrt`/`.cel` pair.
    StarCd,
}

impl Format {
    /// Resolve a format from a file suffix.
    pub fn from_suffix(suffix: &str) -> Result<Format, MeshConvertError> {
        match suffix {
            "xml" => Ok(Format::Xml),
            "mesh" => Ok(Format::Medit),
            "gmsh" | "msh" => Ok(Format::Gmsh),
            "gra" => Ok(Format::Metis),
            "grf" => Ok(Format::Scotch),
            "grid" => Ok(Format::Diffpack),
            "inp" => Ok(Format::Abaqus),
            "ncdf" => Ok(Format::NetCdf),
            "exo" | "e" => Ok(Format::ExodusII),
            "vrt" | "cel" => Ok(Format::StarCd),
            other => Err(MeshConvertError::UnknownSuffix(other.to_string())),
        }
    }

    /// Canonical lowercase format name.
    pub fn name(self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Medit => "medit",
            Format::Gmsh => "gmsh",
            Format::Triangle => "triangle",
            Format::Metis => "metis",
            Format::Scotch => "scotch",
            Format::Diffpack => "diffpack",
            Format::Abaqus => "abaqus",
            Format::NetCdf => "netcdf",
            Format::ExodusII => "exodusii",
            Format::StarCd => "starcd",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Convert `path` into canonical events on `handler`.
///
/// Without a `format` hint the format is derived from the path's suffix.
/// The handler is closed exactly once, on both the success and error
/// paths; a failed conversion additionally reports its diagnostic through
/// [`DataHandler::error`] before returning it.
pub fn convert<H: DataHandler>(
    path: impl AsRef<Path>,
    handler: &mut H,
    format: Option<Format>,
) -> Result<(), MeshConvertError> {
    let path = path.as_ref();
    let result = run(path, handler, format);
    if let Err(err) = &result {
        handler.error(&err.to_string());
    }
    let closed = handler.close();
    result.and(closed)
}

fn run<H: DataHandler>(
    path: &Path,
    handler: &mut H,
    format: Option<Format>,
) -> Result<(), MeshConvertError> {
    let format = match format {
        Some(format) => format,
        None => {
            let suffix = path
                .extension()
                .and_then(|ext| ext.to_str())
                .ok_or_else(|| MeshConvertError::UnknownSuffix(path.display().to_string()))?;
            Format::from_suffix(suffix)?
        }
    };
    log::debug!("converting {} as {format}", path.display());

    match format {
        Format::Medit => MeditDecoder.decode(File::open(path)?, handler),
        Format::Gmsh => GmshDecoder.decode(File::open(path)?, handler),
        Format::Triangle => {
            let (node, ele) = sibling_pair(path, "node", "ele")?;
            TriangleDecoder.decode(File::open(node)?, File::open(ele)?, handler)
        }
        Format::Metis => MetisDecoder.decode(File::open(path)?, handler),
        Format::Scotch => ScotchDecoder.decode(File::open(path)?, handler),
        Format::Diffpack => DiffpackDecoder.decode(File::open(path)?, handler),
        Format::Abaqus => AbaqusDecoder.decode(File::open(path)?, handler),
        Format::NetCdf => NetCdfDecoder.decode(File::open(path)?, handler),
        Format::ExodusII => {
            // The dump tool materializes the NetCDF text form; its output
            // is consumed exactly like a hand-authored .ncdf file.
            let text = ncdump(path)?;
            NetCdfDecoder.decode(text.as_bytes(), handler)
        }
        Format::StarCd => {
            let (vrt, cel) = sibling_pair(path, "vrt", "cel")?;
            StarCdDecoder.decode(File::open(vrt)?, File::open(cel)?, handler)
        }
        Format::Xml => Err(MeshConvertError::UnknownFormat(format.name().to_string())),
    }
}

/// Derive the two sibling paths of a paired format from either member (or
/// from a bare stem). Both files must exist.
fn sibling_pair(
    path: &Path,
    first: &str,
    second: &str,
) -> Result<(PathBuf, PathBuf), MeshConvertError> {
    let stem = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext == first || ext == second => path.with_extension(""),
        _ => path.to_path_buf(),
    };
    let a = stem.with_extension(first);
    let b = stem.with_extension(second);
    for member in [&a, &b] {
        if !member.is_file() {
            return Err(MeshConvertError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "conversion requires both .{first} and .{second} files; missing {}",
                    member.display()
                ),
            )));
        }
    }
    Ok((a, b))
}

fn ncdump(path: &Path) -> Result<String, MeshConvertError> {
    let output = Command::new("ncdump")
        .arg(path)
        .output()
        .map_err(|err| MeshConvertError::ExternalTool(format!("failed to run ncdump: {err}")))?;
    if !output.status.success() {
        return Err(MeshConvertError::ExternalTool(format!(
            "ncdump exited with {}",
            output.status
        )));
    }
    String::from_utf8(output.stdout)
        .map_err(|_| MeshConvertError::ExternalTool("ncdump produced non-UTF-8 output".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_table_matches_dispatch_contract() {
        assert_eq!(Format::from_suffix("xml").unwrap(), Format::Xml);
        assert_eq!(Format::from_suffix("mesh").unwrap(), Format::Medit);
        assert_eq!(Format::from_suffix("gmsh").unwrap(), Format::Gmsh);
        assert_eq!(Format::from_suffix("msh").unwrap(), Format::Gmsh);
        assert_eq!(Format::from_suffix("gra").unwrap(), Format::Metis);
        assert_eq!(Format::from_suffix("grf").unwrap(), Format::Scotch);
        assert_eq!(Format::from_suffix("grid").unwrap(), Format::Diffpack);
        assert_eq!(Format::from_suffix("inp").unwrap(), Format::Abaqus);
        assert_eq!(Format::from_suffix("ncdf").unwrap(), Format::NetCdf);
        assert_eq!(Format::from_suffix("exo").unwrap(), Format::ExodusII);
        assert_eq!(Format::from_suffix("e").unwrap(), Format::ExodusII);
        assert_eq!(Format::from_suffix("vrt").unwrap(), Format::StarCd);
        assert_eq!(Format::from_suffix("cel").unwrap(), Format::StarCd);
    }

    #[test]
    fn unknown_suffix_is_fatal() {
        let err = Format::from_suffix("stl").unwrap_err();
        assert!(matches!(err, MeshConvertError::UnknownSuffix(_)));
    }
}
