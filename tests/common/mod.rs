use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// A `chatmate` command whose database, cache and config live in `dir`
///
/// Environment overrides that could leak in from the developer's shell are
/// cleared.
#[allow(dead_code)]
pub fn chatmate(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("chatmate").expect("binary");
    cmd.env("CHATMATE_DB", dir.path().join("chat.db"))
        .env("CHATMATE_CACHE_DIR", dir.path().join("cache"))
        .env("NO_COLOR", "1")
        .env_remove("CHATMATE_STORAGE")
        .env_remove("CHATMATE_REMOTE_URL")
        .env_remove("CHATMATE_MODEL")
        .env_remove("CHATMATE_TEMPERATURE")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.path().join("config.yaml"));
    cmd
}
