use mesh_convert::convert_error::MeshConvertError;
use mesh_convert::handler::DataHandler;
use mesh_convert::model::{Canonical, CellKind, MeshBuilder};
use mesh_convert::{Format, convert};
use std::fs;
use std::path::Path;

const MEDIT_MESH: &str = r#"MeshVersionFormatted 1
Dimension
2
Vertices
3
0.0 0.0 0
1.0 0.0 0
0.0 1.0 0
Triangles
1
1 2 3 0
"#;

const NODE_FILE: &str = "3 2 0 0\n1 0.0 0.0\n2 1.0 0.0\n3 0.0 1.0\n";
const ELE_FILE: &str = "1 3 0\n1 1 2 3\n";

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("fixture written");
    path
}

#[test]
fn format_is_resolved_from_the_suffix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), "box.mesh", MEDIT_MESH);
    let mut builder = MeshBuilder::new();
    convert(&path, &mut builder, None).expect("conversion succeeds");
    match builder.finish() {
        Some(Canonical::Mesh(mesh)) => {
            assert_eq!(mesh.kind, CellKind::Triangle);
            assert_eq!(mesh.cells.len(), 1);
        }
        other => panic!("expected mesh, got {other:?}"),
    }
}

#[test]
fn explicit_hint_overrides_the_suffix() {
    let dir = tempfile::tempdir().expect("tempdir");
    // The suffix is meaningless; the hint must pick the decoder without
    // consulting the suffix table.
    let path = write(dir.path(), "box.dat", MEDIT_MESH);
    let mut builder = MeshBuilder::new();
    convert(&path, &mut builder, Some(Format::Medit)).expect("hinted conversion succeeds");
    assert!(builder.finish().is_some());
}

#[test]
fn unknown_suffix_fails_and_still_closes_the_sink() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), "box.stl", "solid box\n");
    let mut builder = MeshBuilder::new();
    let err = convert(&path, &mut builder, None).expect_err("stl is not recognized");
    assert!(
        matches!(err, MeshConvertError::UnknownSuffix(_)),
        "unexpected error: {err:?}"
    );
    // The fatal diagnostic was delivered and no output survives.
    assert!(builder.failure().is_some());
    // The dispatcher already closed the sink.
    assert!(matches!(
        builder.close(),
        Err(MeshConvertError::InvalidHandlerState { .. })
    ));
    assert!(builder.finish().is_none());
}

#[test]
fn triangle_pair_is_derived_from_either_member() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "box.node", NODE_FILE);
    let ele = write(dir.path(), "box.ele", ELE_FILE);
    let mut builder = MeshBuilder::new();
    convert(&ele, &mut builder, Some(Format::Triangle)).expect("pair resolved from .ele");
    match builder.finish() {
        Some(Canonical::Mesh(mesh)) => assert_eq!(mesh.vertices.len(), 3),
        other => panic!("expected mesh, got {other:?}"),
    }
}

#[test]
fn missing_pair_member_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let node = write(dir.path(), "box.node", NODE_FILE);
    let mut builder = MeshBuilder::new();
    let err = convert(&node, &mut builder, Some(Format::Triangle)).expect_err(".ele is missing");
    assert!(matches!(err, MeshConvertError::Io(_)), "unexpected error: {err:?}");
    assert!(builder.failure().is_some());
}

#[test]
fn starcd_pair_is_resolved_from_the_vrt_suffix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vrt: String = [
        format!("{:>15}{:>16}{:>16}{:>16}\n", 1, 0.0, 0.0, 0.0),
        format!("{:>15}{:>16}{:>16}{:>16}\n", 2, 1.0, 0.0, 0.0),
        format!("{:>15}{:>16}{:>16}{:>16}\n", 3, 0.0, 1.0, 0.0),
        format!("{:>15}{:>16}{:>16}{:>16}\n", 4, 0.0, 0.0, 1.0),
    ]
    .concat();
    let path = write(dir.path(), "box.vrt", &vrt);
    write(dir.path(), "box.cel", "1 1 2 3 3 4 4 4 4 1 1\n");
    let mut builder = MeshBuilder::new();
    convert(&path, &mut builder, None).expect("pair resolved from .vrt");
    match builder.finish() {
        Some(Canonical::Mesh(mesh)) => assert_eq!(mesh.cells.len(), 1),
        other => panic!("expected mesh, got {other:?}"),
    }
}

#[test]
fn xml_input_has_no_decoder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), "box.xml", "<dolfin/>\n");
    let mut builder = MeshBuilder::new();
    let err = convert(&path, &mut builder, None).expect_err("xml cannot be an input");
    assert!(
        matches!(err, MeshConvertError::UnknownFormat(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn decoder_error_is_recorded_on_the_sink() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), "box.mesh", "MeshVersionFormatted 1\n");
    let mut builder = MeshBuilder::new();
    let err = convert(&path, &mut builder, None).expect_err("no Dimension section");
    assert_eq!(builder.failure(), Some(err.to_string().as_str()));
}
