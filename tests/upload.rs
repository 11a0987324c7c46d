mod common;

use common::{count_rows, coverage, kinds, report};
use covstore::model::{Report, ReportQuery, ReportType};

#[test]
fn upload_different_types_are_appended() {
    let (mut store, _dir, _) = common::setup_store();

    store.upload(&report("G1", "c1", &[ReportType::Perl])).unwrap();
    store.upload(&report("G1", "c1", &[ReportType::Go])).unwrap();

    let found = store.find(&ReportQuery::group("G1").commit("c1")).unwrap();
    assert_eq!(kinds(&found), vec![ReportType::Go, ReportType::Perl]);
    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM report"), 1);
}

#[test]
fn upload_same_type_replaces_payload() {
    let (mut store, _dir, _) = common::setup_store();

    let first = Report::new("G", "commit")
        .with_coverage(coverage(ReportType::Go, 0.4, &[("test.go", 0.4)]));
    let second = Report::new("G", "commit")
        .with_coverage(coverage(ReportType::Go, 0.5, &[("test.go", 0.5), ("other.go", 1.0)]));
    store.upload(&first).unwrap();
    store.upload(&second).unwrap();

    let found = store.find(&ReportQuery::group("G").commit("commit")).unwrap();
    assert_eq!(found.coverages, second.coverages);
    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM coverage_report"), 1);
    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM file"), 2);
}

#[test]
fn upload_sequence_matches_merge_rule() {
    let (mut store, _dir, _) = common::setup_store();
    use ReportType::{Go, Perl};

    // (upload, expected kinds after it)
    let steps: Vec<(Report, Vec<ReportType>)> = vec![
        (report("S1", "commit1", &[Perl]), vec![Perl]),
        (report("S1", "commit1", &[Go]), vec![Go, Perl]),
        (report("S1", "commit1", &[Perl]), vec![Go, Perl]),
        (report("S2", "commit1", &[Perl, Go]), vec![Go, Perl]),
        (report("S3", "commit1", &[Perl, Perl]), vec![Perl]),
    ];

    for (upload, expected) in steps {
        store.upload(&upload).unwrap();
        let found = store
            .finds(&ReportQuery::group(&upload.group_id).commit(&upload.commit))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(kinds(&found[0]), expected, "after uploading {:?}", upload);
    }
}

#[test]
fn duplicate_types_in_one_upload_keep_last() {
    let (mut store, _dir, _) = common::setup_store();

    let upload = Report::new("G", "c")
        .with_coverage(coverage(ReportType::Perl, 0.1, &[]))
        .with_coverage(coverage(ReportType::Perl, 0.9, &[]));
    store.upload(&upload).unwrap();

    let found = store.find(&ReportQuery::group("G").commit("c")).unwrap();
    assert_eq!(found.coverages.len(), 1);
    assert_eq!(found.coverages[0].statement_coverage, 0.9);
}

#[test]
fn created_at_is_not_advanced_by_reupload() {
    let (mut store, _dir, _) = common::setup_store();

    store.upload(&report("G", "c", &[ReportType::Perl])).unwrap();
    let before = store.find(&ReportQuery::group("G").commit("c")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.upload(&report("G", "c", &[ReportType::Go])).unwrap();
    let after = store.find(&ReportQuery::group("G").commit("c")).unwrap();

    assert!(!before.created_at.is_empty());
    assert_eq!(before.created_at, after.created_at);
}

#[test]
fn upload_keeps_file_listing() {
    let (mut store, _dir, _) = common::setup_store();

    let mut upload = Report::new("files", "c");
    upload.files = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    store.upload(&upload).unwrap();

    let found = store.find(&ReportQuery::group("files").commit("c")).unwrap();
    assert_eq!(found.files, upload.files);

    // A later upload without a listing leaves the stored one alone.
    store.upload(&report("files", "c", &[ReportType::Go])).unwrap();
    let found = store.find(&ReportQuery::group("files").commit("c")).unwrap();
    assert_eq!(found.files, upload.files);
}

#[test]
fn upload_requires_group_and_commit() {
    let (mut store, _dir, _) = common::setup_store();

    let err = store.upload(&report("", "c1", &[ReportType::Go])).unwrap_err();
    assert!(err.is_validation(), "got: {err}");
    let err = store.upload(&report("G", "", &[ReportType::Go])).unwrap_err();
    assert!(err.is_validation(), "got: {err}");

    assert_eq!(count_rows(&store, "SELECT COUNT(*) FROM report"), 0);
}
