use super::common::{canonical, path_of, write_file, Isolated};
use clap::Parser;
use std::fs;
use tempfile::TempDir;
use treedupe::cli::Cli;
use treedupe::error::ExitCode;

fn exit_code_for(cli: &Cli) -> ExitCode {
    let mut sink = Vec::new();
    match treedupe::run_with_writer(cli, &mut sink) {
        Ok(code) => code,
        Err(err) => ExitCode::for_error(&err),
    }
}

#[test]
fn test_missing_root_is_config_error() {
    let dir = TempDir::new().unwrap();
    let isolated = Isolated::new();
    let cli = isolated.cli(&dir.path().join("nope"), &[]);

    assert_eq!(exit_code_for(&cli), ExitCode::ConfigError);
}

#[test]
fn test_file_as_root_is_config_error() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("file"), b"x", 100);
    let isolated = Isolated::new();
    let cli = isolated.cli(&dir.path().join("file"), &[]);

    assert_eq!(exit_code_for(&cli), ExitCode::ConfigError);
}

#[test]
fn test_zero_io_threads_is_config_error() {
    let dir = TempDir::new().unwrap();
    let isolated = Isolated::new();
    let cli = isolated.cli(dir.path(), &["--io-threads", "0"]);

    assert_eq!(exit_code_for(&cli), ExitCode::ConfigError);
}

#[test]
fn test_inverted_size_range_is_config_error() {
    let dir = TempDir::new().unwrap();
    let isolated = Isolated::new();
    let cli = isolated.cli(dir.path(), &["--min-size", "2KB", "--max-size", "1KB"]);

    assert_eq!(exit_code_for(&cli), ExitCode::ConfigError);
}

#[test]
fn test_missing_explicit_config_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let cli = Cli::try_parse_from([
        "treedupe",
        "-q",
        "--config",
        dir.path().join("missing.toml").to_str().unwrap(),
        "-d",
        dir.path().to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(exit_code_for(&cli), ExitCode::ConfigError);
}

#[test]
fn test_config_file_settings_apply_and_cli_overrides() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("tree/a.jpg"), b"X", 100);
    write_file(&dir.path().join("tree/b.jpg"), b"X", 200);
    write_file(&dir.path().join("tree/c.txt"), b"X", 300);
    let config = dir.path().join("config.toml");
    fs::write(&config, "file_extensions = [\"jpg\"]\nkeep = \"oldest\"\n").unwrap();

    let run = |extra: &[&str]| {
        let mut argv = vec![
            "treedupe".to_string(),
            "-q".to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--config".to_string(),
            config.to_string_lossy().into_owned(),
            "-d".to_string(),
            dir.path().join("tree").to_string_lossy().into_owned(),
        ];
        argv.extend(extra.iter().map(|s| (*s).to_string()));
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut buf = Vec::new();
        treedupe::run_with_writer(&cli, &mut buf).unwrap();
        serde_json::from_slice::<serde_json::Value>(&buf).unwrap()
    };

    let root = canonical(&dir.path().join("tree"));

    let from_file = run(&[]);
    assert_eq!(from_file["retention"], "oldest");
    assert_eq!(from_file["summary"]["total_files"], 2);
    assert_eq!(from_file["groups"][0]["keep"]["path"], path_of(&root, "a.jpg"));

    let overridden = run(&["--newest"]);
    assert_eq!(overridden["retention"], "newest");
    assert_eq!(overridden["groups"][0]["keep"]["path"], path_of(&root, "b.jpg"));
}
