use super::common::{canonical, path_of, run_json, write_file};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_nested_empty_dirs_reported_deepest_first() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
    fs::create_dir_all(dir.path().join("a/d")).unwrap();
    write_file(&dir.path().join("keep/file"), b"data", 100);

    let (_, report) = run_json(dir.path(), &["-e"]);

    let root = canonical(dir.path());
    let empty: Vec<&str> = report["empty_dirs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(empty.len(), 4);
    assert_eq!(empty.last().copied(), Some(path_of(&root, "a").as_str()));
    assert!(empty.contains(&path_of(&root, "a/b/c").as_str()));
    assert!(!empty.contains(&path_of(&root, "keep").as_str()));
}

#[test]
fn test_remove_clears_whole_empty_chain() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("a/b/c")).unwrap();

    let (_, report) = run_json(dir.path(), &["-e", "-r"]);

    assert_eq!(report["summary"]["empty_dirs_removed"], 3);
    assert!(!dir.path().join("a").exists());
    assert!(dir.path().exists());
}

#[test]
fn test_dir_emptied_by_duplicate_removal_is_kept() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("orig"), b"same", 100);
    write_file(&dir.path().join("copies/dup"), b"same", 200);

    let (_, report) = run_json(dir.path(), &["-o", "-e", "-r"]);

    // Only directories empty at scan time are removed
    assert_eq!(report["summary"]["files_deleted"], 1);
    assert_eq!(report["summary"]["empty_dirs_found"], 0);
    assert!(dir.path().join("copies").is_dir());
}

#[test]
fn test_filtered_files_keep_directory_occupied() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("docs/readme.txt"), b"text", 100);

    let (_, report) = run_json(dir.path(), &["-f", "jpg", "-e", "-r"]);

    assert_eq!(report["empty_dirs"].as_array().unwrap().len(), 0);
    assert!(dir.path().join("docs/readme.txt").exists());
}

#[test]
fn test_empty_dirs_not_removed_without_flag() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("empty")).unwrap();

    let (_, report) = run_json(dir.path(), &["-r"]);

    assert_eq!(report["summary"]["empty_dirs_removed"], 0);
    assert!(dir.path().join("empty").is_dir());
}
