mod common;

use boundaryline_lib::Catalog;

#[test]
fn loads_fixture_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("boundaries.db");
    common::write_fixture_db(&db_path);

    let catalog = Catalog::load(&db_path).unwrap();
    assert_eq!(catalog.sets().len(), 2);
    assert_eq!(catalog.boundaries().len(), 3);
}

#[test]
fn sets_are_ordered_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("boundaries.db");
    common::write_fixture_db(&db_path);

    let catalog = Catalog::load(&db_path).unwrap();
    let names: Vec<_> = catalog.sets().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Community Areas", "Wards"]);
}

#[test]
fn boundaries_are_ordered_by_kind_then_display_name() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("boundaries.db");
    common::write_fixture_db(&db_path);

    let catalog = Catalog::load(&db_path).unwrap();
    let display: Vec<_> = catalog
        .boundaries()
        .iter()
        .map(|b| b.display_name.as_str())
        .collect();
    assert_eq!(
        display,
        vec!["Austin Community Area", "Ward 1", "Ward 2"]
    );
}

#[test]
fn metadata_fields_preserve_order() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("boundaries.db");
    common::write_fixture_db(&db_path);

    let catalog = Catalog::load(&db_path).unwrap();
    let wards = catalog.set_by_slug("wards").unwrap();
    assert_eq!(wards.metadata_fields, vec!["WARD", "ALDERMAN"]);
    assert!(wards.kind_first);
    assert_eq!(wards.last_updated.to_string(), "2010-12-12");
}

#[test]
fn boundary_fields_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("boundaries.db");
    common::write_fixture_db(&db_path);

    let catalog = Catalog::load(&db_path).unwrap();
    let ward1 = catalog.boundary_by_slug("ward-1").unwrap();
    assert_eq!(ward1.kind, "Ward");
    assert_eq!(ward1.external_id, "0100");
    assert_eq!(ward1.metadata["ALDERMAN"], "Example");
    assert_eq!(ward1.shape.0.len(), 1);
    let centroid = ward1.centroid.unwrap();
    assert_eq!(centroid.x(), -87.65);

    let austin = catalog.boundary_by_slug("austin-community-area").unwrap();
    assert!(austin.centroid.is_none());
    assert_eq!(catalog.set_of(austin).unwrap().slug, "community-areas");
}

#[test]
fn missing_tables_are_unsupported_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("empty.db");
    rusqlite::Connection::open(&db_path)
        .unwrap()
        .execute_batch("CREATE TABLE unrelated (id INTEGER);")
        .unwrap();

    let err = Catalog::load(&db_path).unwrap_err();
    assert!(matches!(
        err,
        boundaryline_lib::Error::UnsupportedSchema
    ));
}
