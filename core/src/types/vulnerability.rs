use serde::{Deserialize, Deserializer, Serialize};

/// A single vulnerability entry as published by the vulnerability directory.
///
/// Field names on the wire follow the directory's JSON so that records can be
/// passed through to callers unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    #[serde(rename = "uuid")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operator", default)]
    pub version_range: VersionRange,
    #[serde(rename = "source", default, deserialize_with = "null_as_default")]
    pub sources: Vec<Source>,
    #[serde(default, deserialize_with = "lenient_impact")]
    pub impact: Impact,
}

impl VulnerabilityRecord {
    /// First source id that looks like a CVE identifier.
    pub fn first_cve(&self) -> Option<&str> {
        self.sources
            .iter()
            .map(|s| s.id.as_str())
            .find(|id| id.starts_with("CVE-"))
    }

    /// The upper affected bound, if the directory supplied a non-empty one.
    pub fn max_version(&self) -> Option<&str> {
        self.version_range
            .max_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default)]
    pub max_version: Option<String>,
    #[serde(default)]
    pub max_operator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss: Option<Cvss>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cwe: Vec<Cwe>,
}

impl Impact {
    pub fn is_empty(&self) -> bool {
        self.cvss.is_none() && self.cwe.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cvss {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub vector: Option<String>,
    #[serde(default, deserialize_with = "numeric_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cwe {
    pub cwe: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// The directory encodes an empty impact map as `[]`.
fn lenient_impact<'de, D>(deserializer: D) -> Result<Impact, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ImpactRepr {
        Map(Impact),
        List(Vec<serde_json::Value>),
    }

    match Option::<ImpactRepr>::deserialize(deserializer)? {
        Some(ImpactRepr::Map(impact)) => Ok(impact),
        Some(ImpactRepr::List(_)) | None => Ok(Impact::default()),
    }
}

fn numeric_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Number(f64),
        Text(String),
    }

    match Option::<Score>::deserialize(deserializer)? {
        Some(Score::Number(n)) => Ok(Some(n)),
        Some(Score::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
