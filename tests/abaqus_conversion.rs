use mesh_convert::convert_error::MeshConvertError;
use mesh_convert::model::{Canonical, CellKind, Mesh, MeshBuilder};
use mesh_convert::prelude::AbaqusDecoder;

const SOLID_DECK: &str = r#"*HEADING
single tetrahedron
** a comment line
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0, 0.0
4, 0.0, 0.0, 1.0
*ELEMENT, TYPE=C3D4, ELSET=EB1
1, 1, 2, 3, 4
*MATERIAL, NAME=STEEL
*SOLID SECTION, ELSET=EB1, MATERIAL=STEEL
"#;

const SPARSE_IDS_DECK: &str = r#"*NODE
40, 0.0, 0.0, 1.0
10, 0.0, 0.0, 0.0
20, 1.0, 0.0, 0.0
30, 0.0, 1.0, 0.0
*ELEMENT, TYPE=C3D4
7, 10, 20, 30, 40
"#;

fn decode(contents: &str) -> Result<MeshBuilder, MeshConvertError> {
    let mut builder = MeshBuilder::new();
    AbaqusDecoder.decode(contents.as_bytes(), &mut builder)?;
    Ok(builder)
}

fn finish_mesh(builder: MeshBuilder) -> Mesh {
    match builder.finish() {
        Some(Canonical::Mesh(mesh)) => mesh,
        other => panic!("expected mesh, got {other:?}"),
    }
}

#[test]
fn solid_deck_yields_mesh_with_material_function() {
    let mesh = finish_mesh(decode(SOLID_DECK).expect("valid deck"));
    assert_eq!(mesh.kind, CellKind::Tetrahedron);
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.cells, vec![vec![0, 1, 2, 3]]);
    assert_eq!(mesh.functions.len(), 1);
    let material = &mesh.functions[0];
    assert_eq!(material.name, "material");
    assert_eq!(material.dim, 3);
    // Value is the material's declaration index.
    assert_eq!(material.values, vec![0]);
}

#[test]
fn sparse_identifiers_are_renumbered_in_ascending_order() {
    let mesh = finish_mesh(decode(SPARSE_IDS_DECK).expect("valid deck"));
    assert_eq!(mesh.vertices[0], [0.0, 0.0, 0.0]);
    assert_eq!(mesh.vertices[3], [0.0, 0.0, 1.0]);
    assert_eq!(mesh.cells, vec![vec![0, 1, 2, 3]]);
    // No solid section: no material function.
    assert!(mesh.functions.is_empty());
}

#[test]
fn unsupported_element_type_is_skipped_with_a_warning() {
    let contents = r#"*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0, 0.0
4, 0.0, 0.0, 1.0
*ELEMENT, TYPE=CPS3
1, 1, 2, 3
*ELEMENT, TYPE=C3D4
2, 1, 2, 3, 4
"#;
    let builder = decode(contents).expect("deck converts despite skipped section");
    assert_eq!(builder.warnings().len(), 1);
    assert!(builder.warnings()[0].contains("cps3"));
    let mesh = finish_mesh(builder);
    assert_eq!(mesh.cells.len(), 1);
}

#[test]
fn solid_section_with_undefined_elset_is_fatal() {
    let contents = r#"*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0, 0.0
4, 0.0, 0.0, 1.0
*ELEMENT, TYPE=C3D4
1, 1, 2, 3, 4
*MATERIAL, NAME=STEEL
*SOLID SECTION, ELSET=EB9, MATERIAL=STEEL
"#;
    let err = decode(contents).expect_err("EB9 was never populated");
    match err {
        MeshConvertError::UndefinedReference(message) => {
            assert!(message.contains("eb9"), "message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn solid_section_with_undeclared_material_is_fatal() {
    let contents = r#"*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0, 0.0
4, 0.0, 0.0, 1.0
*ELEMENT, TYPE=C3D4, ELSET=EB1
1, 1, 2, 3, 4
*SOLID SECTION, ELSET=EB1, MATERIAL=GOLD
"#;
    let err = decode(contents).expect_err("GOLD was never declared");
    assert!(
        matches!(err, MeshConvertError::UndefinedReference(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn element_referencing_missing_node_is_fatal() {
    let contents = r#"*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0, 0.0
*ELEMENT, TYPE=C3D4
1, 1, 2, 3, 4
"#;
    let err = decode(contents).expect_err("node 4 missing");
    assert!(
        matches!(err, MeshConvertError::UndefinedReference(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn element_section_without_type_is_malformed() {
    let contents = "*ELEMENT, ELSET=EB1\n1, 1, 2, 3, 4\n";
    let err = decode(contents).expect_err("TYPE parameter missing");
    assert!(
        matches!(err, MeshConvertError::MalformedHeader(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn malformed_node_record_is_skipped_with_a_warning() {
    let contents = r#"*NODE
1, 0.0, 0.0
2, 0.0, 0.0, 0.0
"#;
    let builder = decode(contents).expect("node skipped, deck still converts");
    assert_eq!(builder.warnings().len(), 1);
    let mesh = finish_mesh(builder);
    assert_eq!(mesh.vertices.len(), 1);
}
