use clap::Parser;
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use treedupe::cli::Cli;
use treedupe::error::ExitCode;

/// Write `content` to `path`, creating parents, with mtime `secs` after the epoch.
pub fn write_file(path: &Path, content: &[u8], secs: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

/// The three-file photo tree: two copies of "X", one "Y" and an empty dir.
pub fn photo_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a.jpg"), b"X", 1_000_000);
    write_file(&dir.path().join("b.jpg"), b"X", 2_000_000);
    write_file(&dir.path().join("c.png"), b"Y", 1_500_000);
    fs::create_dir(dir.path().join("empty")).unwrap();
    dir
}

/// Canonical form of a temp path, matching what reports contain.
pub fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap()
}

/// `root/name` as the string reports use.
pub fn path_of(root: &Path, name: &str) -> String {
    root.join(name).to_string_lossy().into_owned()
}

/// An empty config file so the user's own config never leaks into a test.
pub struct Isolated {
    _dir: TempDir,
    config: PathBuf,
}

impl Isolated {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "").unwrap();
        Self { _dir: dir, config }
    }

    pub fn cli(&self, root: &Path, args: &[&str]) -> Cli {
        let mut argv = vec![
            "treedupe".to_string(),
            "-q".to_string(),
            "--config".to_string(),
            self.config.to_string_lossy().into_owned(),
            "-d".to_string(),
            root.to_string_lossy().into_owned(),
        ];
        argv.extend(args.iter().map(|a| (*a).to_string()));
        Cli::try_parse_from(argv).unwrap()
    }
}

/// Run with text output, returning the exit code and the rendered report.
pub fn run_text(root: &Path, args: &[&str]) -> (ExitCode, String) {
    yansi::disable();
    let isolated = Isolated::new();
    let cli = isolated.cli(root, args);
    let mut buf = Vec::new();
    let code = treedupe::run_with_writer(&cli, &mut buf).unwrap();
    (code, String::from_utf8(buf).unwrap())
}

/// Run with JSON output and parse the document.
pub fn run_json(root: &Path, args: &[&str]) -> (ExitCode, serde_json::Value) {
    let isolated = Isolated::new();
    let mut argv = vec!["--output", "json"];
    argv.extend_from_slice(args);
    let cli = isolated.cli(root, &argv);
    let mut buf = Vec::new();
    let code = treedupe::run_with_writer(&cli, &mut buf).unwrap();
    (code, serde_json::from_slice(&buf).unwrap())
}

/// Paths listed under `delete` across every group.
pub fn deleted_paths(report: &serde_json::Value) -> Vec<String> {
    report["groups"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|g| g["delete"].as_array().unwrap().iter())
        .map(|f| f["path"].as_str().unwrap().to_string())
        .collect()
}
