use std::sync::LazyLock;

use regex::Regex;

static ASSET_VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"asset_version=(\d+)").expect("Failed to compile asset version regex"));

const PLATFORM_URL: &str = "https://platform.finitestate.io";

/// Pull the asset version out of a storage key such as
/// `test_results/org=<uuid>/asset_version=2722350854/<uuid>`.
///
/// The digits are returned as text; they are only ever interpolated into URLs.
pub fn extract_version(text: &str) -> Option<String> {
    ASSET_VERSION_PATTERN
        .captures(text)
        .map(|caps| caps[1].to_string())
}

pub fn asset_version_url(asset_id: &str, asset_version: &str) -> String {
    format!("{PLATFORM_URL}/artifacts/{asset_id}/versions/{asset_version}")
}
