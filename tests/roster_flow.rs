// Load -> search/sort -> add -> export, against real files

use pretty_assertions::assert_eq;
use std::path::PathBuf;
use student_roster::{
    parse_catalog, FileSource, QuickXmlReader, RosterError, RosterSession, SortDirection,
    SortDirective, SortKey, StudentForm,
};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("students.xml")
}

fn ids(session: &RosterSession) -> Vec<String> {
    session.visible().iter().map(|s| s.identifier.clone()).collect()
}

fn loaded() -> RosterSession {
    let mut session = RosterSession::new();
    session
        .load(&FileSource::new(fixture()), &QuickXmlReader::new())
        .unwrap();
    session
}

#[test]
fn loads_sample_document() {
    let session = loaded();
    assert_eq!(session.store().len(), 4);
    assert_eq!(session.status(), "Loaded 4 students from XML.");

    let first = &session.store().all()[0];
    assert_eq!(first.identifier, "2024-0001");
    assert_eq!(first.name, "Ana Reyes");
    assert_eq!(first.tuition_fee, 25000.0);
}

#[test]
fn missing_file_reports_and_leaves_store_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RosterSession::new();

    let result = session.load(&FileSource::new(dir.path().join("students.xml")), &QuickXmlReader::new());

    assert!(matches!(result, Err(RosterError::Io { .. })));
    assert!(session.store().is_empty());
    assert!(session.status().starts_with("Failed to load XML: "));
}

#[test]
fn malformed_file_reports_generic_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.xml");
    std::fs::write(&path, "<catalog><student id=\"S1\"><name>Ana</student>").unwrap();

    let mut session = RosterSession::new();
    let result = session.load(&FileSource::new(&path), &QuickXmlReader::new());

    assert!(matches!(result, Err(RosterError::Parse { .. })));
    assert_eq!(session.status(), "Failed to load XML: Invalid XML format.");
}

#[test]
fn search_covers_name_and_section() {
    let mut session = loaded();

    session.set_query("bscs");
    assert_eq!(ids(&session), vec!["2024-0003", "2024-0004"]);

    session.set_query("SANTOS");
    assert_eq!(ids(&session), vec!["2024-0002"]);

    session.set_query("");
    assert_eq!(session.visible().len(), 4);
}

#[test]
fn header_clicks_toggle_and_stay_stable() {
    let mut session = loaded();

    session.click_sort(SortKey::TuitionFee);
    assert_eq!(ids(&session), vec!["2024-0001", "2024-0002", "2024-0003", "2024-0004"]);

    session.click_sort(SortKey::TuitionFee);
    assert_eq!(session.directive(), SortDirective::new(SortKey::TuitionFee, SortDirection::Desc));
    assert_eq!(ids(&session), vec!["2024-0003", "2024-0004", "2024-0001", "2024-0002"]);

    session.click_sort(SortKey::InitialPayout);
    assert_eq!(session.directive().direction, SortDirection::Asc);
    assert_eq!(ids(&session), vec!["2024-0004", "2024-0001", "2024-0002", "2024-0003"]);
}

#[test]
fn duplicate_add_is_rejected_once_added() {
    let mut session = loaded();
    let form = StudentForm {
        identifier: "2024-0005".to_string(),
        name: "Elena Tan".to_string(),
        section: "BSIT 2A".to_string(),
        tuition_fee: "25000".to_string(),
        initial_payout: "0".to_string(),
    };

    session.add(&form).unwrap();
    let err = session.add(&form).unwrap_err();

    assert!(matches!(err, RosterError::DuplicateIdentifier(ref id) if id == "2024-0005"));
    assert_eq!(session.store().len(), 5);
    assert_eq!(
        session.store().all().iter().filter(|s| s.identifier == "2024-0005").count(),
        1
    );
}

#[test]
fn export_round_trips_through_a_file() {
    let mut session = loaded();
    session
        .add(&StudentForm {
            identifier: "X&1".to_string(),
            name: "O'Neil <Jr>".to_string(),
            section: "\"Q\"".to_string(),
            tuition_fee: "1234.567".to_string(),
            initial_payout: "oops".to_string(),
        })
        .unwrap();

    let export = session.export();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(export.filename);
    std::fs::write(&path, &export.document).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let back = parse_catalog(&QuickXmlReader::new(), &text).unwrap();

    assert_eq!(back.len(), 5);
    let last = &back[4];
    assert_eq!(last.identifier, "X&1");
    assert_eq!(last.name, "O'Neil <Jr>");
    assert_eq!(last.section, "\"Q\"");
    assert_eq!(last.tuition_fee, 1234.57);
    assert_eq!(last.initial_payout, 0.0);
}
