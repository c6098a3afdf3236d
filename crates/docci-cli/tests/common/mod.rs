#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]
//! Shared helpers for docci CLI integration tests.

use std::path::PathBuf;
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

/// A `docci` command with test-safe environment pinning.
pub fn docci() -> Command {
    let mut cmd = Command::cargo_bin("docci").expect("docci binary builds");
    cmd.env("DOCCI_SKIP_UPDATE_CHECK", "1")
        .env("NO_COLOR", "1")
        .env_remove("DOCCI_RETRY_DELAY")
        .env_remove("DOCCI_LOG_LEVEL")
        .timeout(Duration::from_secs(120));
    cmd
}

/// Write a markdown document into `dir` and return its path.
pub fn write_doc(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write test document");
    path
}
