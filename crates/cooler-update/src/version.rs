//! Installed version vs. release tag comparison

use cooler_core::types::VersionMatch;
use semver::Version;

/// Decide whether the installed version already satisfies the latest tag
pub fn versions_match(policy: VersionMatch, installed: &str, latest_tag: &str) -> bool {
    match policy {
        VersionMatch::Exact => installed == latest_tag,
        VersionMatch::Normalized => {
            let installed = normalize(installed);
            let latest = normalize(latest_tag);

            match (Version::parse(installed), Version::parse(latest)) {
                // Build metadata is not part of version identity
                (Ok(a), Ok(b)) => {
                    (a.major, a.minor, a.patch, &a.pre) == (b.major, b.minor, b.patch, &b.pre)
                }
                _ => strip_build(installed) == strip_build(latest),
            }
        }
    }
}

/// Trim whitespace and a leading `v`/`V`
fn normalize(version: &str) -> &str {
    let trimmed = version.trim();
    trimmed
        .strip_prefix(['v', 'V'])
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(trimmed)
}

fn strip_build(version: &str) -> &str {
    version.split('+').next().unwrap_or(version)
}
