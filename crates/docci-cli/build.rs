//! Build script for docci-cli.
//!
//! Stamps build metadata (commit, build time, builder) into the binary so
//! `docci version` can report where an installation came from. Every
//! lookup degrades to "unknown" so builds from tarballs still succeed.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let commit = command_output("git", &["rev-parse", "--short", "HEAD"])
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=DOCCI_BUILD_COMMIT={commit}");

    let built_at = command_output("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"])
        .unwrap_or_else(unix_timestamp);
    println!("cargo:rustc-env=DOCCI_BUILD_TIME={built_at}");

    let built_by = std::env::var("DOCCI_BUILT_BY").unwrap_or_else(|_| "cargo".to_string());
    println!("cargo:rustc-env=DOCCI_BUILD_BY={built_by}");
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn unix_timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
