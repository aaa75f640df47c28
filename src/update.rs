use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use semver::Version;
use serde::Deserialize;

const RELEASES_URL: &str = "https://api.github.com/repos/demetriuszhomir/XRayFeed/releases";

pub const SKIP_UPDATE_ENV: &str = "XRAYFEED_SKIP_UPDATE_CHECK";

#[derive(Debug, Clone)]
pub struct UpdateInfo {
    pub version: Version,
    pub release_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub html_url: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

impl Release {
    fn version(&self) -> Option<Version> {
        let tag = self.tag_name.trim();
        let normalized = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);
        Version::parse(normalized).ok()
    }
}

pub fn check_for_update(current: &Version) -> Result<Option<UpdateInfo>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(8))
        .user_agent(format!(
            "xrayfeed/{version} (update-check)",
            version = crate::VERSION
        ))
        .build()
        .context("build update HTTP client")?;

    let releases = fetch_releases(&client)?;
    Ok(newer_release(current, &releases))
}

fn fetch_releases(client: &Client) -> Result<Vec<Release>> {
    let response = client
        .get(RELEASES_URL)
        .header("Accept", "application/vnd.github+json")
        .send()
        .context("request release list")?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(Vec::new());
    }

    if response.status() == StatusCode::FORBIDDEN {
        bail!("rate limited by GitHub while checking for updates");
    }

    if !response.status().is_success() {
        bail!("update check failed with status {}", response.status());
    }

    response
        .json()
        .context("decode release list from GitHub")
}

// Pick the release worth announcing. A prerelease build is offered any newer
// non-draft release; a stable build only newer stable ones. `releases` is in
// GitHub's newest-first order.
pub fn newer_release(current: &Version, releases: &[Release]) -> Option<UpdateInfo> {
    let on_prerelease = !current.pre.is_empty()
        || releases
            .iter()
            .any(|release| release.prerelease && release.version().as_ref() == Some(current));

    let target = releases
        .iter()
        .filter(|release| !release.draft)
        .find(|release| on_prerelease || !release.prerelease)?;

    let version = target.version()?;
    (&version > current).then(|| UpdateInfo {
        version,
        release_url: target.html_url.clone(),
    })
}
