use super::common::{canonical, deleted_paths, path_of, run_json, write_file};
use tempfile::TempDir;

#[test]
fn test_extension_match_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a.JPG"), b"same", 100);
    write_file(&dir.path().join("b.jpg"), b"same", 200);
    write_file(&dir.path().join("c.txt"), b"same", 300);

    let (_, report) = run_json(dir.path(), &["-f", "jpg", "-o"]);

    let root = canonical(dir.path());
    let group = &report["groups"][0];
    assert_eq!(report["groups"].as_array().unwrap().len(), 1);
    assert_eq!(group["keep"]["path"], path_of(&root, "a.JPG"));
    assert_eq!(deleted_paths(&report), vec![path_of(&root, "b.jpg")]);
    assert_eq!(report["summary"]["total_files"], 2);
}

#[test]
fn test_no_allow_list_considers_every_file() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("notes"), b"same", 100);
    write_file(&dir.path().join("notes.bak"), b"same", 200);

    let (_, report) = run_json(dir.path(), &[]);

    assert_eq!(report["groups"].as_array().unwrap().len(), 1);
}

#[test]
fn test_blacklisted_subtree_never_deleted() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join(".git/objects/ab/blob"), b"same", 100);
    write_file(&dir.path().join("src/blob"), b"same", 200);
    write_file(&dir.path().join("src/copy"), b"same", 300);

    let (_, report) = run_json(dir.path(), &["-b", ".git", "-r"]);

    let root = canonical(dir.path());
    assert_eq!(deleted_paths(&report), vec![path_of(&root, "src/blob")]);
    assert!(root.join(".git/objects/ab/blob").exists());
    assert!(root.join("src/copy").exists());
}

#[test]
fn test_multi_segment_blacklist_token() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join(".git/objects/x"), b"same", 100);
    write_file(&dir.path().join(".git/config"), b"same", 200);

    let (_, report) = run_json(dir.path(), &["-b", ".git/objects"]);

    // Only .git/config is eligible, so there is no pair
    assert_eq!(report["summary"]["total_files"], 1);
    assert_eq!(report["groups"].as_array().unwrap().len(), 0);
}

#[test]
fn test_segment_mode_does_not_match_partial_names() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("digital/a"), b"same", 100);
    write_file(&dir.path().join("digital/b"), b"same", 200);

    let (_, segment) = run_json(dir.path(), &["-b", "git"]);
    let (_, substring) = run_json(dir.path(), &["-b", "git", "--blacklist-mode", "substring"]);

    assert_eq!(segment["groups"].as_array().unwrap().len(), 1);
    assert_eq!(substring["groups"].as_array().unwrap().len(), 0);
}

#[test]
fn test_size_bounds() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("small1"), b"ab", 100);
    write_file(&dir.path().join("small2"), b"ab", 200);
    write_file(&dir.path().join("big1"), &[7u8; 4096], 100);
    write_file(&dir.path().join("big2"), &[7u8; 4096], 200);

    let (_, report) = run_json(dir.path(), &["--min-size", "1KiB"]);

    let groups = report["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["size"], 4096);
}

#[test]
fn test_zero_byte_files_group_together() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a"), b"", 100);
    write_file(&dir.path().join("b"), b"", 200);

    let (_, report) = run_json(dir.path(), &[]);

    assert_eq!(report["groups"].as_array().unwrap().len(), 1);
    assert_eq!(report["groups"][0]["size"], 0);
}
