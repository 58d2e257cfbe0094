use super::common::{run_json, write_file};
use std::fs;
use tempfile::TempDir;
use treedupe::actions::{ActionExecutor, ActionMode, DeleteError};
use treedupe::duplicates::{select_all, DuplicateFinder, RetentionPolicy};

#[test]
fn test_exactly_one_copy_per_group_survives() {
    let dir = TempDir::new().unwrap();
    for (i, name) in ["one", "two", "three", "four"].iter().enumerate() {
        write_file(&dir.path().join(name), b"alpha", 100 + i as i64);
        write_file(&dir.path().join("sub").join(name), b"beta!", 200 + i as i64);
    }
    write_file(&dir.path().join("unique"), b"gamma", 50);

    let (_, report) = run_json(dir.path(), &["-r"]);

    assert_eq!(report["summary"]["duplicate_groups"], 2);
    assert_eq!(report["summary"]["files_deleted"], 6);
    let top: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().unwrap().is_file())
        .collect();
    let sub = fs::read_dir(dir.path().join("sub")).unwrap().count();
    // one alpha survivor + unique at top level, one beta survivor in sub
    assert_eq!(top.len(), 2);
    assert_eq!(sub, 1);
    assert!(dir.path().join("four").exists());
    assert!(dir.path().join("sub/four").exists());
}

#[test]
fn test_equal_mtimes_keep_smallest_path() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("b"), b"same", 100);
    write_file(&dir.path().join("a"), b"same", 100);
    write_file(&dir.path().join("c"), b"same", 100);

    run_json(dir.path(), &["-r", "-o"]);

    assert!(dir.path().join("a").exists());
    assert!(!dir.path().join("b").exists());
    assert!(!dir.path().join("c").exists());
}

#[test]
fn test_modified_duplicate_is_not_deleted() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a"), b"same", 100);
    write_file(&dir.path().join("b"), b"same", 200);

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let selections = select_all(outcome.groups, RetentionPolicy::KeepOldest);

    // Changed between scan and delete
    write_file(&dir.path().join("b"), b"different!", 300);

    let report = ActionExecutor::new(ActionMode::Destructive).execute(&selections, &[]);

    assert!(report.deleted.is_empty());
    assert!(matches!(report.failures[0], DeleteError::Modified(_)));
    assert!(dir.path().join("b").exists());
}

#[test]
fn test_missing_keep_skips_group() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a"), b"same", 100);
    write_file(&dir.path().join("b"), b"same", 200);

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let selections = select_all(outcome.groups, RetentionPolicy::KeepOldest);

    fs::remove_file(dir.path().join("a")).unwrap();

    let report = ActionExecutor::new(ActionMode::Destructive).execute(&selections, &[]);

    assert!(report.deleted.is_empty());
    assert!(matches!(
        report.failures[0],
        DeleteError::KeptCopyUnavailable(_)
    ));
    assert!(dir.path().join("b").exists());
}

#[cfg(unix)]
#[test]
fn test_symlink_and_target_count_as_one_file() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("target"), b"same", 100);
    std::os::unix::fs::symlink(dir.path().join("target"), dir.path().join("link")).unwrap();

    let (_, report) = run_json(dir.path(), &["-r"]);

    assert_eq!(report["groups"].as_array().unwrap().len(), 0);
    assert!(dir.path().join("target").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_reported_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a"), b"same", 100);
    write_file(&dir.path().join("b"), b"same", 200);
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    write_file(&locked.join("c"), b"same", 300);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to check there
    let readable = fs::read_dir(&locked).is_ok();
    let (_, report) = run_json(dir.path(), &["-e"]);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if readable {
        return;
    }
    assert_eq!(report["groups"].as_array().unwrap().len(), 1);
    assert_eq!(report["errors"]["access"].as_array().unwrap().len(), 1);
    let empty = report["empty_dirs"].as_array().unwrap();
    assert!(empty.is_empty());
}
