use serde::{Deserialize, Serialize};

use super::vulnerability::VulnerabilityRecord;
use crate::error::EnrichmentError;

/// Whether an automated detection template exists for a vulnerability.
///
/// `available` is `None` when the lookup could not decide; `error` then says why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateAvailability {
    #[serde(rename = "cvemapTemplate")]
    pub available: Option<bool>,
    #[serde(rename = "cvemapError", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TemplateAvailability {
    pub fn known(available: bool) -> Self {
        Self {
            available: Some(available),
            error: None,
        }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            available: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.available.is_none()
    }
}

impl From<Result<bool, EnrichmentError>> for TemplateAvailability {
    fn from(result: Result<bool, EnrichmentError>) -> Self {
        match result {
            Ok(available) => Self::known(available),
            Err(e) => Self::unknown(e.to_string()),
        }
    }
}

/// A vulnerability that applies to the detected version.
///
/// `template` is `None` when no CVE was available to check; on the wire the
/// `cvemap*` keys are then absent rather than null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AnalyzedRepr")]
pub struct AnalyzedVulnerability {
    #[serde(flatten)]
    pub vulnerability: VulnerabilityRecord,
    #[serde(flatten)]
    pub template: Option<TemplateAvailability>,
}

#[derive(Deserialize)]
struct AnalyzedRepr {
    #[serde(flatten)]
    vulnerability: VulnerabilityRecord,
    #[serde(rename = "cvemapTemplate", default, deserialize_with = "present")]
    available: Option<Option<bool>>,
    #[serde(rename = "cvemapError", default)]
    error: Option<String>,
}

// Distinguishes a null `cvemapTemplate` from a missing one.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Some)
}

impl From<AnalyzedRepr> for AnalyzedVulnerability {
    fn from(repr: AnalyzedRepr) -> Self {
        let template = match (repr.available, repr.error) {
            (None, None) => None,
            (available, error) => Some(TemplateAvailability {
                available: available.flatten(),
                error,
            }),
        };
        Self {
            vulnerability: repr.vulnerability,
            template,
        }
    }
}

/// Outcome of running one scanner output line through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAnalysisResult {
    pub plugin_slug: String,
    pub detected_version: String,
    pub api_queried: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_error: Option<String>,
    pub vulnerabilities_found: usize,
    pub applicable_vulnerabilities: Vec<AnalyzedVulnerability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,
}

impl LineAnalysisResult {
    pub fn invalid_version(plugin_slug: String, detected_version: String) -> Self {
        let processing_error = Some(format!("Invalid detected version: {}", detected_version));
        Self {
            plugin_slug,
            detected_version,
            api_queried: false,
            api_error: None,
            vulnerabilities_found: 0,
            applicable_vulnerabilities: Vec::new(),
            processing_error,
        }
    }

    pub fn api_failure(plugin_slug: String, detected_version: String, error: String) -> Self {
        Self {
            plugin_slug,
            detected_version,
            api_queried: true,
            api_error: Some(error),
            vulnerabilities_found: 0,
            applicable_vulnerabilities: Vec::new(),
            processing_error: None,
        }
    }

    pub fn templates_available(&self) -> usize {
        self.applicable_vulnerabilities
            .iter()
            .filter(|v| matches!(v.template, Some(TemplateAvailability { available: Some(true), .. })))
            .count()
    }
}
