use serde::{Deserialize, Serialize};

/// A plugin slug and the raw version text found on one scanner output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedPlugin {
    pub slug: String,
    pub raw_version: String,
}

impl DetectedPlugin {
    pub fn new(slug: impl Into<String>, raw_version: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            raw_version: raw_version.into(),
        }
    }
}
