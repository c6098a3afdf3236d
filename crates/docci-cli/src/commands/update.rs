//! Best-effort release-update check.
//!
//! Queries the project's latest GitHub release with a short timeout and
//! compares it against the built version. Failures never affect the run;
//! they are logged at debug level and swallowed. Set
//! `DOCCI_SKIP_UPDATE_CHECK=1` to disable entirely (CI, tests, air-gapped
//! machines).

use std::time::Duration;

use anyhow::Result;
use semver::Version;
use serde::Deserialize;
use tracing::debug;

/// Environment variable disabling the update check.
pub const SKIP_ENV_VAR: &str = "DOCCI_SKIP_UPDATE_CHECK";

const RELEASES_URL: &str = "https://api.github.com/repos/docci-sh/docci/releases/latest";
const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
    html_url: String,
}

/// Check whether a newer release exists, returning a printable notice.
///
/// Returns `None` when up to date, when disabled, and on any failure.
pub async fn check_for_newer_release() -> Option<String> {
    if std::env::var_os(SKIP_ENV_VAR).is_some() {
        return None;
    }
    match fetch_latest().await {
        Ok(notice) => notice,
        Err(err) => {
            debug!("release check failed: {err}");
            None
        },
    }
}

async fn fetch_latest() -> Result<Option<String>> {
    let client = reqwest::Client::builder()
        .timeout(CHECK_TIMEOUT)
        .user_agent(concat!("docci/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let release: LatestRelease = client
        .get(RELEASES_URL)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let latest = Version::parse(release.tag_name.trim_start_matches('v'))?;
    let current = Version::parse(env!("CARGO_PKG_VERSION"))?;

    if latest > current {
        Ok(Some(format!(
            "A newer docci release is available: v{latest} (running v{current}). See {}",
            release.html_url
        )))
    } else {
        Ok(None)
    }
}
