mod common;

use common::{commits, count_rows, report};
use covstore::model::{ReportQuery, ReportType};

#[test]
fn reupload_same_commit_reuses_association() {
    let (mut store, _dir, _) = common::setup_store();

    let upload = report("R", "abc", &[]).with_reference("master");
    for _ in 0..3 {
        store.upload(&upload).unwrap();
    }

    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM reference"), 1);
    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM reference_report"), 1);
}

#[test]
fn new_commit_extends_reference_history() {
    let (mut store, _dir, _) = common::setup_store();

    store.upload(&report("G2", "c1", &[ReportType::Go]).with_reference("master")).unwrap();
    store.upload(&report("G2", "c4", &[ReportType::Go]).with_reference("master")).unwrap();

    let latest = store.find(&ReportQuery::group("G2").reference("master")).unwrap();
    assert_eq!(latest.commit, "c4");

    assert_eq!(
        count_rows(
            &store,
            "SELECT COUNT(*) FROM reference WHERE group_id = 'G2' AND name = 'master'"
        ),
        1
    );
    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM reference_report"), 2);

    let history = store.finds(&ReportQuery::group("G2").reference("master")).unwrap();
    assert_eq!(commits(&history), vec!["c1", "c4"]);
}

#[test]
fn reattaching_old_commit_does_not_move_latest() {
    let (mut store, _dir, _) = common::setup_store();

    store.upload(&report("G", "c1", &[]).with_reference("main")).unwrap();
    store.upload(&report("G", "c2", &[]).with_reference("main")).unwrap();
    // A late retry of the first upload.
    store.upload(&report("G", "c1", &[ReportType::Go]).with_reference("main")).unwrap();

    let latest = store.find(&ReportQuery::group("G").reference("main")).unwrap();
    assert_eq!(latest.commit, "c2");
    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM reference_report"), 2);
}

#[test]
fn references_are_scoped_to_group() {
    let (mut store, _dir, _) = common::setup_store();

    store.upload(&report("A", "a1", &[]).with_reference("master")).unwrap();
    store.upload(&report("B", "b1", &[]).with_reference("master")).unwrap();

    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM reference"), 2);
    let a = store.find(&ReportQuery::group("A").reference("master")).unwrap();
    assert_eq!(a.commit, "a1");
    let b = store.find(&ReportQuery::group("B").reference("master")).unwrap();
    assert_eq!(b.commit, "b1");
}

#[test]
fn upload_without_reference_creates_none() {
    let (mut store, _dir, _) = common::setup_store();

    store.upload(&report("G", "c1", &[ReportType::Go])).unwrap();

    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM reference"), 0);
    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM reference_report"), 0);
}
