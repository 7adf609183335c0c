use mesh_convert::convert_error::MeshConvertError;
use mesh_convert::model::{Canonical, CellKind, MeshBuilder};
use mesh_convert::prelude::MeditDecoder;

const TRIANGLE_MESH: &str = r#"MeshVersionFormatted 1
# produced by a mesh generator
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

const TET_MESH: &str = r#"MeshVersionFormatted 1
Dimension
3
Vertices
4
0.0 0.0 0.0 0
1.0 0.0 0.0 0
0.0 1.0 0.0 0
0.0 0.0 1.0 0
Tetrahedra
1
1 2 3 4 0
"#;

fn decode(contents: &str) -> Result<MeshBuilder, MeshConvertError> {
    let mut builder = MeshBuilder::new();
    MeditDecoder.decode(contents.as_bytes(), &mut builder)?;
    Ok(builder)
}

#[test]
fn two_dimensional_mesh_yields_triangles() {
    let builder = decode(TRIANGLE_MESH).expect("valid 2-D mesh");
    match builder.finish() {
        Some(Canonical::Mesh(mesh)) => {
            assert_eq!(mesh.kind, CellKind::Triangle);
            assert_eq!(mesh.dim, 2);
            assert_eq!(mesh.vertices.len(), 3);
            assert_eq!(mesh.vertices[1], [1.0, 0.0, 0.0]);
            assert_eq!(mesh.cells, vec![vec![0, 1, 2]]);
            assert!(mesh.functions.is_empty());
        }
        other => panic!("expected mesh, got {other:?}"),
    }
}

#[test]
fn three_dimensional_mesh_yields_tetrahedra() {
    let builder = decode(TET_MESH).expect("valid 3-D mesh");
    match builder.finish() {
        Some(Canonical::Mesh(mesh)) => {
            assert_eq!(mesh.kind, CellKind::Tetrahedron);
            assert_eq!(mesh.dim, 3);
            assert_eq!(mesh.vertices.len(), 4);
            assert_eq!(mesh.cells, vec![vec![0, 1, 2, 3]]);
        }
        other => panic!("expected mesh, got {other:?}"),
    }
}

#[test]
fn cell_indices_are_rebased_from_one() {
    let builder = decode(TRIANGLE_MESH).expect("valid mesh");
    let Some(Canonical::Mesh(mesh)) = builder.finish() else {
        panic!("expected mesh");
    };
    assert!(mesh.cells[0].iter().all(|&v| v < mesh.vertices.len()));
}

#[test]
fn missing_dimension_section_is_a_header_error() {
    let contents = "MeshVersionFormatted 1\nVertices\n0\n";
    let err = decode(contents).expect_err("no Dimension section");
    assert!(
        matches!(err, MeshConvertError::MalformedHeader(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn truncated_cell_section_is_premature_eof() {
    let contents = r#"MeshVersionFormatted 1
Dimension
2
Vertices
3
0.0 0.0 0
1.0 0.0 0
0.0 1.0 0
Triangles
2
1 2 3 0
"#;
    let err = decode(contents).expect_err("one of two cells present");
    assert!(
        matches!(err, MeshConvertError::UnexpectedEof(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn wrong_record_width_is_malformed() {
    let contents = r#"MeshVersionFormatted 1
Dimension
2
Vertices
1
0.0 0.0 0.0 0
Triangles
0
"#;
    let err = decode(contents).expect_err("vertex record has a 3-D width");
    assert!(
        matches!(err, MeshConvertError::MalformedRecord(_)),
        "unexpected error: {err:?}"
    );
}
