use crate::error::{CorrelateError, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A version string that passed semantic-version validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParsedVersion(Version);

impl ParsedVersion {
    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ParsedVersion {
    type Error = CorrelateError;

    fn try_from(value: String) -> Result<Self> {
        VersionComparator::parse(&value)
    }
}

impl From<ParsedVersion> for String {
    fn from(version: ParsedVersion) -> Self {
        version.to_string()
    }
}

pub struct VersionComparator;

impl VersionComparator {
    /// Parses `text` as a full `major.minor.patch` version, optionally with
    /// prerelease and build parts. A single leading `v` is accepted; partial
    /// versions such as `5.3` are rejected.
    pub fn parse(text: &str) -> Result<ParsedVersion> {
        let trimmed = text.trim();
        let clean = trimmed.strip_prefix('v').unwrap_or(trimmed);

        Version::parse(clean)
            .map(ParsedVersion)
            .map_err(|e| CorrelateError::InvalidVersion {
                input: text.to_string(),
                source: e,
            })
    }

    /// Semantic-version precedence. Build metadata does not participate.
    pub fn compare(a: &ParsedVersion, b: &ParsedVersion) -> Ordering {
        let (a, b) = (&a.0, &b.0);
        a.major
            .cmp(&b.major)
            .then_with(|| a.minor.cmp(&b.minor))
            .then_with(|| a.patch.cmp(&b.patch))
            .then_with(|| a.pre.cmp(&b.pre))
    }

    pub fn less_than(a: &ParsedVersion, b: &ParsedVersion) -> bool {
        Self::compare(a, b) == Ordering::Less
    }
}
