use mesh_convert::convert_error::MeshConvertError;
use mesh_convert::model::{Canonical, CellKind, Mesh, MeshBuilder};
use mesh_convert::prelude::StarCdDecoder;

fn vrt_line(id: u64, x: f64, y: f64, z: f64) -> String {
    format!("{id:>15}{x:>16}{y:>16}{z:>16}\n")
}

fn vrt_file(ids: &[u64]) -> String {
    let coords = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.0, 0.0, 1.0),
    ];
    ids.iter()
        .zip(coords)
        .map(|(&id, (x, y, z))| vrt_line(id, x, y, z))
        .collect()
}

fn decode(vrt: &str, cel: &str) -> Result<MeshBuilder, MeshConvertError> {
    let mut builder = MeshBuilder::new();
    StarCdDecoder.decode(vrt.as_bytes(), cel.as_bytes(), &mut builder)?;
    Ok(builder)
}

fn finish_mesh(builder: MeshBuilder) -> Mesh {
    match builder.finish() {
        Some(Canonical::Mesh(mesh)) => mesh,
        other => panic!("expected mesh, got {other:?}"),
    }
}

#[test]
fn degenerate_hexahedron_maps_to_a_tetrahedron() {
    let vrt = vrt_file(&[1, 2, 3, 4]);
    let cel = "1 1 2 3 3 4 4 4 4 1 1\n";
    let mesh = finish_mesh(decode(&vrt, cel).expect("valid pair"));
    assert_eq!(mesh.kind, CellKind::Tetrahedron);
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.cells, vec![vec![0, 1, 2, 3]]);
}

#[test]
fn surface_rows_are_silently_excluded() {
    let vrt = vrt_file(&[1, 2, 3, 4]);
    let cel = "1 1 2 3 3 4 4 4 4 1 1\n2 1 2 3 3 0 0 0 0 1 1\n";
    let builder = decode(&vrt, cel).expect("valid pair");
    assert!(builder.warnings().is_empty());
    let mesh = finish_mesh(builder);
    assert_eq!(mesh.cells.len(), 1);
}

#[test]
fn non_degenerate_volume_rows_are_skipped_with_a_warning() {
    let vrt = vrt_file(&[1, 2, 3, 4]);
    let cel = "1 1 2 3 3 4 4 4 4 1 1\n2 1 2 3 4 4 4 4 4 1 1\n";
    let builder = decode(&vrt, cel).expect("valid pair");
    assert_eq!(builder.warnings().len(), 1);
    assert!(builder.warnings()[0].contains("cell 2"));
    let mesh = finish_mesh(builder);
    assert_eq!(mesh.cells.len(), 1);
}

#[test]
fn gapped_vertex_numbering_is_renumbered_densely() {
    let vrt = vrt_file(&[1, 2, 3, 5]);
    let cel = "1 1 2 3 3 5 5 5 5 1 1\n";
    let mesh = finish_mesh(decode(&vrt, cel).expect("valid pair"));
    assert_eq!(mesh.vertices.len(), 4);
    // Id 5 lands on dense index 3.
    assert_eq!(mesh.cells, vec![vec![0, 1, 2, 3]]);
}

#[test]
fn short_vertex_record_is_malformed() {
    let vrt = "1 0.0 0.0 0.0\n";
    let cel = "";
    let err = decode(vrt, cel).expect_err("record shorter than the fixed layout");
    assert!(
        matches!(err, MeshConvertError::MalformedRecord(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn multibyte_text_across_a_column_edge_is_malformed() {
    // The accented character straddles the byte-15 column boundary.
    let vrt = format!("{}é{}\n", " ".repeat(14), "1".repeat(60));
    let err = decode(&vrt, "").expect_err("not a fixed-column record");
    assert!(
        matches!(err, MeshConvertError::MalformedRecord(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn cell_row_with_wrong_field_count_is_malformed() {
    let vrt = vrt_file(&[1, 2, 3, 4]);
    let cel = "1 1 2 3 3 4 4 4 4\n";
    let err = decode(&vrt, cel).expect_err("nine fields, expected eleven");
    assert!(
        matches!(err, MeshConvertError::MalformedRecord(_)),
        "unexpected error: {err:?}"
    );
}

#[test]
fn cell_referencing_unknown_vertex_is_fatal() {
    let vrt = vrt_file(&[1, 2, 3, 4]);
    let cel = "1 1 2 9 9 4 4 4 4 1 1\n";
    let err = decode(&vrt, cel).expect_err("vertex 9 does not exist");
    assert!(
        matches!(err, MeshConvertError::UndefinedReference(_)),
        "unexpected error: {err:?}"
    );
}
