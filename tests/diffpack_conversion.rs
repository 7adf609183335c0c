use mesh_convert::convert_error::MeshConvertError;
use mesh_convert::model::{Canonical, CellKind, Mesh, MeshBuilder};
use mesh_convert::prelude::DiffpackDecoder;

const TET_GRID: &str = r#"

Finite element mesh (GridFE):

  Number of space dim. =  3
  Number of elements   =  2
  Number of nodes      =  5

# id  coordinates  [indicators]
1 ( 0.0, 0.0, 0.0) [1] 2
2 ( 1.0, 0.0, 0.0) [0]
3 ( 0.0, 1.0, 0.0) [1] 5
4 ( 0.0, 0.0, 1.0) [1] 3
5 ( 1.0, 1.0, 1.0) [0]
# id  type  material  nodes
1 ElmT4n3D 7 1 2 3 4
2 ElmT4n3D 9 2 3 4 5
"#;

fn decode(contents: &str) -> Result<MeshBuilder, MeshConvertError> {
    let mut builder = MeshBuilder::new();
    DiffpackDecoder.decode(contents.as_bytes(), &mut builder)?;
    Ok(builder)
}

fn finish_mesh(builder: MeshBuilder) -> Mesh {
    match builder.finish() {
        Some(Canonical::Mesh(mesh)) => mesh,
        other => panic!("expected mesh, got {other:?}"),
    }
}

#[test]
fn grid_produces_tetrahedra_and_both_functions() {
    let mesh = finish_mesh(decode(TET_GRID).expect("valid grid"));
    assert_eq!(mesh.kind, CellKind::Tetrahedron);
    assert_eq!(mesh.vertices.len(), 5);
    assert_eq!(mesh.cells, vec![vec![0, 1, 2, 3], vec![1, 2, 3, 4]]);
    assert_eq!(mesh.functions.len(), 2);
}

#[test]
fn first_boundary_indicator_is_kept_per_vertex() {
    let mesh = finish_mesh(decode(TET_GRID).expect("valid grid"));
    let boundary = &mesh.functions[0];
    assert_eq!(boundary.name, "boundary_indicator");
    assert_eq!(boundary.dim, 0);
    // Vertices without indicators default to 0.
    assert_eq!(boundary.values, vec![2, 0, 5, 3, 0]);
}

#[test]
fn material_ids_become_a_cell_function() {
    let mesh = finish_mesh(decode(TET_GRID).expect("valid grid"));
    let material = &mesh.functions[1];
    assert_eq!(material.name, "material");
    assert_eq!(material.dim, 3);
    assert_eq!(material.values, vec![7, 9]);
}

#[test]
fn non_tetrahedral_element_type_is_not_implemented() {
    let contents = r#"
  Number of elements   =  1
  Number of nodes      =  4
#
1 ( 0.0, 0.0, 0.0) [0]
2 ( 1.0, 0.0, 0.0) [0]
3 ( 0.0, 1.0, 0.0) [0]
4 ( 0.0, 0.0, 1.0) [0]
#
1 ElmB8n3D 7 1 2 3 4
"#;
    let err = decode(contents).expect_err("hexahedral element");
    match err {
        MeshConvertError::UnsupportedRecordKind(message) => {
            assert!(message.contains("ElmB8n3D"), "message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn header_without_node_count_is_malformed() {
    let contents = "  Number of elements   =  1\n#\n";
    let err = decode(contents).expect_err("node count missing");
    assert!(
        matches!(err, MeshConvertError::MalformedHeader(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn truncated_vertex_block_is_premature_eof() {
    let contents = r#"
  Number of elements   =  1
  Number of nodes      =  4
#
1 ( 0.0, 0.0, 0.0) [0]
2 ( 1.0, 0.0, 0.0) [0]
"#;
    let err = decode(contents).expect_err("two of four vertices present");
    assert!(
        matches!(err, MeshConvertError::UnexpectedEof(_)),
        "unexpected error: {err:?}"
    );
}
