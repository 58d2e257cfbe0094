use super::common::{path_of, write_file};
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use treedupe::actions::{ActionExecutor, ActionMode, ActionReport};
use treedupe::cli::OutputFormat;
use treedupe::duplicates::{
    select_all, DuplicateFinder, FinderConfig, RetentionPolicy, ScanOutcome, Selection,
};
use treedupe::output::{render, Report};
use treedupe::scanner::{HashAlgorithm, WalkerConfig};

/// Scan a three-copy group plus an empty dir, then change `b` before deleting.
fn run_with_one_failure(dir: &TempDir) -> (ScanOutcome, Vec<Selection>, ActionReport) {
    write_file(&dir.path().join("a"), b"same", 100);
    write_file(&dir.path().join("b"), b"same", 200);
    write_file(&dir.path().join("c"), b"same", 300);
    fs::create_dir(dir.path().join("hollow")).unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(WalkerConfig {
        detect_empty_dirs: true,
        ..Default::default()
    }));
    let mut outcome = finder.find_duplicates(dir.path()).unwrap();
    let selections = select_all(std::mem::take(&mut outcome.groups), RetentionPolicy::KeepOldest);

    write_file(&dir.path().join("b"), b"changed since scan", 400);

    let actions =
        ActionExecutor::new(ActionMode::Destructive).execute(&selections, &outcome.empty_dirs);
    (outcome, selections, actions)
}

fn render_to_string(report: &Report<'_>, format: OutputFormat) -> String {
    yansi::disable();
    let mut buf = Vec::new();
    render(report, format, &mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn test_report_separates_deleted_from_failed() {
    let dir = TempDir::new().unwrap();
    let (outcome, selections, actions) = run_with_one_failure(&dir);
    let report = Report {
        root: dir.path(),
        retention: RetentionPolicy::KeepOldest,
        algorithm: HashAlgorithm::Blake3,
        selections: &selections,
        empty_dirs: &outcome.empty_dirs,
        empty_dirs_checked: true,
        summary: &outcome.summary,
        actions: &actions,
    };

    assert!(dir.path().join("b").exists());
    assert!(!dir.path().join("c").exists());

    let text = render_to_string(&report, OutputFormat::Text);
    let b = path_of(dir.path(), "b");
    let c = path_of(dir.path(), "c");
    assert!(text.contains(&format!("failed  {b}")), "{text}");
    assert!(text.contains(&format!("deleted {c}")), "{text}");
    assert!(text.contains("Removed directories"), "{text}");

    let json: serde_json::Value =
        serde_json::from_str(&render_to_string(&report, OutputFormat::Json)).unwrap();
    let members = json["groups"][0]["delete"].as_array().unwrap();
    let status_of = |path: &str| {
        members
            .iter()
            .find(|m| m["path"] == path)
            .map(|m| m["status"].as_str().unwrap().to_string())
    };
    assert_eq!(status_of(&b).as_deref(), Some("failed"));
    assert_eq!(status_of(&c).as_deref(), Some("deleted"));
    assert_eq!(json["deleted"], json!([c]));
    assert_eq!(json["removed_dirs"], json!([path_of(dir.path(), "hollow")]));
    assert_eq!(json["errors"]["delete"][0]["path"], b.as_str());
}

#[test]
fn test_removed_dirs_listed_apart_from_found() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("gone")).unwrap();
    fs::create_dir(dir.path().join("refilled")).unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(WalkerConfig {
        detect_empty_dirs: true,
        ..Default::default()
    }));
    let outcome = finder.find_duplicates(dir.path()).unwrap();
    fs::write(dir.path().join("refilled/new"), b"x").unwrap();
    let actions = ActionExecutor::new(ActionMode::Destructive).execute(&[], &outcome.empty_dirs);

    let report = Report {
        root: dir.path(),
        retention: RetentionPolicy::KeepNewest,
        algorithm: HashAlgorithm::Blake3,
        selections: &[],
        empty_dirs: &outcome.empty_dirs,
        empty_dirs_checked: true,
        summary: &outcome.summary,
        actions: &actions,
    };
    let json: serde_json::Value =
        serde_json::from_str(&render_to_string(&report, OutputFormat::Json)).unwrap();

    assert_eq!(json["empty_dirs"].as_array().unwrap().len(), 2);
    assert_eq!(json["removed_dirs"], json!([path_of(dir.path(), "gone")]));
    assert_eq!(json["errors"]["delete"].as_array().unwrap().len(), 1);
}
