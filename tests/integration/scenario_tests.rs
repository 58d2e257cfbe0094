use super::common::{canonical, path_of, photo_tree, run_json, run_text};
use serde_json::json;
use treedupe::error::ExitCode;

#[test]
fn test_dry_run_reports_group_and_empty_dir() {
    let dir = photo_tree();
    let root = canonical(dir.path());

    let (code, report) = run_json(dir.path(), &["-f", "jpg,png", "-o", "-e"]);

    assert_eq!(code, ExitCode::Success);
    assert_eq!(report["mode"], "dry_run");
    let groups = report["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0]["keep"]["path"],
        path_of(&root, "a.jpg")
    );
    assert_eq!(
        groups[0]["delete"][0]["path"],
        path_of(&root, "b.jpg")
    );
    assert_eq!(groups[0]["delete"].as_array().unwrap().len(), 1);
    assert_eq!(
        report["empty_dirs"],
        serde_json::json!([path_of(&root, "empty")])
    );
    assert!(!report.to_string().contains("c.png"));

    // Nothing touched
    assert!(root.join("a.jpg").exists());
    assert!(root.join("b.jpg").exists());
    assert!(root.join("empty").exists());
}

#[test]
fn test_remove_deletes_duplicate_and_empty_dir() {
    let dir = photo_tree();
    let root = canonical(dir.path());

    let (code, report) = run_json(dir.path(), &["-f", "jpg,png", "-o", "-e", "-r"]);

    assert_eq!(code, ExitCode::Success);
    assert_eq!(report["mode"], "destructive");
    assert_eq!(report["summary"]["files_deleted"], 1);
    assert_eq!(report["summary"]["bytes_freed"], 1);
    assert_eq!(report["summary"]["empty_dirs_removed"], 1);
    assert_eq!(report["deleted"], json!([path_of(&root, "b.jpg")]));
    assert_eq!(report["removed_dirs"], json!([path_of(&root, "empty")]));
    assert_eq!(report["groups"][0]["delete"][0]["status"], "deleted");

    assert!(root.join("a.jpg").exists());
    assert!(!root.join("b.jpg").exists());
    assert!(root.join("c.png").exists());
    assert!(!root.join("empty").exists());
}

#[test]
fn test_keep_newest_is_default() {
    let dir = photo_tree();
    let root = canonical(dir.path());

    let (_, report) = run_json(dir.path(), &["-f", "jpg"]);

    assert_eq!(report["retention"], "newest");
    assert_eq!(
        report["groups"][0]["keep"]["path"],
        path_of(&root, "b.jpg")
    );
    // Empty-dir detection is off without -e
    assert_eq!(report["empty_dirs"].as_array().unwrap().len(), 0);
}

#[test]
fn test_text_report_lists_plan() {
    let dir = photo_tree();
    let root = canonical(dir.path());

    let (_, text) = run_text(dir.path(), &["-f", "jpg,png", "-o", "-e"]);

    let keep = format!("keep   {}", root.join("a.jpg").display());
    let delete = format!("delete {}", root.join("b.jpg").display());
    assert!(text.contains(&keep), "{text}");
    assert!(text.contains(&delete), "{text}");
    assert!(text.contains(&root.join("empty").display().to_string()));
    assert!(text.contains("dry run"));
    assert!(!text.contains("c.png"));
}

#[test]
fn test_dry_run_is_idempotent() {
    let dir = photo_tree();

    let (_, first) = run_text(dir.path(), &["-e"]);
    let (_, second) = run_text(dir.path(), &["-e"]);

    assert_eq!(first, second);
}

#[test]
fn test_second_remove_finds_nothing() {
    let dir = photo_tree();

    run_json(dir.path(), &["-e", "-r"]);
    let (_, report) = run_json(dir.path(), &["-e", "-r"]);

    assert_eq!(report["groups"].as_array().unwrap().len(), 0);
    assert_eq!(report["empty_dirs"].as_array().unwrap().len(), 0);
    assert_eq!(report["summary"]["files_deleted"], 0);
}
