use crate::types::LineAnalysisResult;
use serde::{Deserialize, Serialize};

/// What a scan hands back to its caller: the scanner's exit code, the
/// per-plugin analysis, and everything the scanner printed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub code: i32,
    pub analysis_results: Vec<LineAnalysisResult>,
    pub raw_output: String,
    pub error_output: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub plugins_detected: usize,
    pub api_errors: usize,
    pub processing_errors: usize,
    pub vulnerabilities_found: usize,
    pub applicable_vulnerabilities: usize,
    pub templates_available: usize,
}

impl AnalysisReport {
    pub fn new(code: i32, analysis_results: Vec<LineAnalysisResult>) -> Self {
        Self {
            code,
            analysis_results,
            ..Default::default()
        }
    }

    /// Report for a scanner that could not be started at all.
    pub fn failed_to_start(message: impl Into<String>) -> Self {
        Self {
            code: -1,
            error_output: message.into(),
            ..Default::default()
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();

        for result in &self.analysis_results {
            summary.plugins_detected += 1;
            if result.api_error.is_some() {
                summary.api_errors += 1;
            }
            if result.processing_error.is_some() {
                summary.processing_errors += 1;
            }
            summary.vulnerabilities_found += result.vulnerabilities_found;
            summary.applicable_vulnerabilities += result.applicable_vulnerabilities.len();
            summary.templates_available += result.templates_available();
        }

        summary
    }

    pub fn has_applicable_vulnerabilities(&self) -> bool {
        self.analysis_results
            .iter()
            .any(|r| !r.applicable_vulnerabilities.is_empty())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
