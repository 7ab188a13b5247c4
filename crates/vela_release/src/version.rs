//! Release version selector: resolves a `major|minor|patch|X.Y.Z` token
//! against the manifest versions already in the store.

use std::fmt;

use tracing::info;
use vela_core::prelude::CONFIG_PREFIX;

use crate::error::ReleaseError;

/// A manifest version. Ordering is numeric on the 3-tuple, first differing
/// component wins: `10.0.0 > 9.0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ConfigVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse an exact `X.Y.Z` string.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }

    /// Extract the version from a manifest key like `config/1.2.3.json`.
    pub fn from_config_key(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(CONFIG_PREFIX)?;
        let mut parts = rest.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A user-supplied release version request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionToken {
    Major,
    Minor,
    Patch,
    Explicit(ConfigVersion),
}

impl VersionToken {
    pub fn parse(token: &str) -> Result<Self, ReleaseError> {
        match token {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            _ => ConfigVersion::parse(token)
                .map(Self::Explicit)
                .ok_or_else(|| ReleaseError::BadVersionToken {
                    token: token.to_string(),
                }),
        }
    }
}

/// The highest manifest version among `keys`, or `0.0.0` when none parse.
pub fn most_recent_version<'a>(keys: impl IntoIterator<Item = &'a str>) -> ConfigVersion {
    let latest = keys
        .into_iter()
        .filter_map(ConfigVersion::from_config_key)
        .max()
        .unwrap_or_default();
    info!("Found most recent config version: {latest}");
    latest
}

/// Resolve `token` into the version the next manifest publishes under.
///
/// Explicit `X.Y.Z` tokens are used verbatim and never consult `keys`.
pub fn next_version<'a>(
    keys: impl IntoIterator<Item = &'a str>,
    token: VersionToken,
) -> ConfigVersion {
    match token {
        VersionToken::Explicit(version) => version,
        VersionToken::Major => {
            let last = most_recent_version(keys);
            ConfigVersion::new(last.major + 1, 0, 0)
        }
        VersionToken::Minor => {
            let last = most_recent_version(keys);
            ConfigVersion::new(last.major, last.minor + 1, 0)
        }
        VersionToken::Patch => {
            let last = most_recent_version(keys);
            ConfigVersion::new(last.major, last.minor, last.patch + 1)
        }
    }
}
