//! The `version` command: build metadata as JSON.
//!
//! The commit and build-time values are stamped by `build.rs`; builds
//! outside a git checkout report "unknown" rather than failing.

use anyhow::Result;
use serde_json::json;

/// Execute `docci version`.
pub fn execute() -> Result<()> {
    let info = json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("DOCCI_BUILD_COMMIT"),
        "built_at": env!("DOCCI_BUILD_TIME"),
        "built_by": env!("DOCCI_BUILD_BY"),
        "source": env!("CARGO_PKG_REPOSITORY"),
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
