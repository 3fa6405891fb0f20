use crate::config::Config;
use crate::error::Result;
use crate::plugin::{LineExtractor, Plugin, TemplateAvailabilityClient, VulnerabilityDirectory};
use crate::types::{AnalyzedVulnerability, LineAnalysisResult, TemplateAvailability, VulnerabilityRecord};
use crate::version::{ParsedVersion, VersionComparator};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

const DEFAULT_CONCURRENCY: usize = 16;

/// Correlates scanner detections with known vulnerabilities.
///
/// Each output line is analyzed independently. Failures stay with the line or
/// the vulnerability entry that produced them, so one bad line never affects
/// its siblings.
pub struct CorrelationEngine {
    extractor: Box<dyn LineExtractor>,
    directory: Box<dyn VulnerabilityDirectory>,
    templates: Box<dyn TemplateAvailabilityClient>,
    max_concurrency: usize,
}

impl CorrelationEngine {
    pub fn new(
        extractor: Box<dyn LineExtractor>,
        directory: Box<dyn VulnerabilityDirectory>,
        templates: Box<dyn TemplateAvailabilityClient>,
    ) -> Self {
        Self {
            extractor,
            directory,
            templates,
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn from_plugin(plugin: &dyn Plugin, config: &Config) -> Result<Self> {
        let engine = Self::new(
            plugin.create_extractor(),
            plugin.create_directory(config)?,
            plugin.create_template_client(config),
        );
        Ok(engine.with_max_concurrency(config.max_concurrency))
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Analyzes every line of `raw_output`, returning results in input order.
    /// Blank and unrecognized lines contribute nothing.
    pub async fn analyze(&self, raw_output: &str) -> Vec<LineAnalysisResult> {
        let results: Vec<LineAnalysisResult> = stream::iter(raw_output.split('\n'))
            .map(|line| self.analyze_line(line))
            .buffered(self.max_concurrency)
            .filter_map(|result| async move { result })
            .collect()
            .await;

        info!(plugins = results.len(), "analysis complete");
        results
    }

    pub async fn analyze_line(&self, line: &str) -> Option<LineAnalysisResult> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let Some(detected) = self.extractor.extract(trimmed) else {
            warn!(line = trimmed, "could not parse plugin/version from line");
            return None;
        };
        let slug = detected.slug;
        let version_text = detected.raw_version;

        let version = match VersionComparator::parse(&version_text) {
            Ok(v) => v,
            Err(e) => {
                warn!(slug = %slug, version = %version_text, error = %e, "invalid detected version");
                return Some(LineAnalysisResult::invalid_version(slug, version_text));
            }
        };

        debug!(slug = %slug, version = %version, "querying vulnerability directory");
        let records = match self.directory.lookup(&slug).await {
            Ok(records) => records,
            Err(e) => {
                warn!(slug = %slug, error = %e, "vulnerability lookup failed");
                return Some(LineAnalysisResult::api_failure(slug, version_text, e.to_string()));
            }
        };

        let vulnerabilities_found = records.len();
        let applicable_vulnerabilities = self.applicable(&slug, &version, records).await;

        info!(
            slug = %slug,
            version = %version_text,
            found = vulnerabilities_found,
            applicable = applicable_vulnerabilities.len(),
            "plugin analyzed"
        );

        Some(LineAnalysisResult {
            plugin_slug: slug,
            detected_version: version_text,
            api_queried: true,
            api_error: None,
            vulnerabilities_found,
            applicable_vulnerabilities,
            processing_error: None,
        })
    }

    async fn applicable(
        &self,
        slug: &str,
        detected: &ParsedVersion,
        records: Vec<VulnerabilityRecord>,
    ) -> Vec<AnalyzedVulnerability> {
        let affected = records.into_iter().filter(|record| {
            let Some(max_text) = record.max_version() else {
                warn!(slug, uuid = %record.id, "skipping vulnerability: missing max_version");
                return false;
            };
            match VersionComparator::parse(max_text) {
                Ok(max) => VersionComparator::less_than(detected, &max),
                Err(e) => {
                    warn!(slug, uuid = %record.id, max_version = max_text, error = %e, "skipping vulnerability: unparsable max_version");
                    false
                }
            }
        });

        join_all(affected.map(|record| self.enrich(record))).await
    }

    // Only the first CVE reference is looked up.
    async fn enrich(&self, record: VulnerabilityRecord) -> AnalyzedVulnerability {
        let template = match record.first_cve() {
            Some(cve) => {
                let availability = TemplateAvailability::from(self.templates.check(cve).await);
                if let Some(reason) = &availability.error {
                    debug!(cve, reason = %reason, "template availability unknown");
                }
                Some(availability)
            }
            None => None,
        };

        AnalyzedVulnerability {
            vulnerability: record,
            template,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnrichmentError;
    use crate::testing::{vuln, FakeDirectory, FakeTemplates, WordsExtractor};
    use std::sync::atomic::Ordering;

    fn engine(directory: FakeDirectory, templates: FakeTemplates) -> CorrelationEngine {
        CorrelationEngine::new(Box::new(WordsExtractor), Box::new(directory), Box::new(templates))
    }

    #[tokio::test]
    async fn test_blank_and_unparsable_lines_produce_nothing() {
        let directory = FakeDirectory::default();
        let lookups = directory.lookups.clone();
        let engine = engine(directory, FakeTemplates::default());

        let results = engine.analyze("\n   \n\t\nnot a detection line at all\n").await;

        assert!(results.is_empty());
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_detected_version_is_reported_without_lookup() {
        let directory = FakeDirectory::default();
        let lookups = directory.lookups.clone();
        let engine = engine(directory, FakeTemplates::default());

        let results = engine.analyze("akismet 5.3").await;

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.plugin_slug, "akismet");
        assert_eq!(result.detected_version, "5.3");
        assert!(!result.api_queried);
        assert_eq!(result.processing_error.as_deref(), Some("Invalid detected version: 5.3"));
        assert!(result.applicable_vulnerabilities.is_empty());
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_directory_error_is_contained_to_its_line() {
        let directory = FakeDirectory::default()
            .failing("missing", 1)
            .with("acme", vec![vuln("a", Some("2.0.0"), &[])]);
        let engine = engine(directory, FakeTemplates::default());

        let results = engine.analyze("missing 1.0.0\nacme 1.0.0\n").await;

        assert_eq!(results.len(), 2);
        let failed = &results[0];
        assert!(failed.api_queried);
        assert_eq!(failed.api_error.as_deref(), Some("API Error (1): Plugin not found"));
        assert_eq!(failed.vulnerabilities_found, 0);
        assert!(failed.applicable_vulnerabilities.is_empty());

        let ok = &results[1];
        assert!(ok.api_error.is_none());
        assert_eq!(ok.applicable_vulnerabilities.len(), 1);
    }

    #[tokio::test]
    async fn test_applicability_is_strict_less_than() {
        let records = vec![vuln("a", Some("2.0.0"), &[])];
        let directory = FakeDirectory::default()
            .with("below", records.clone())
            .with("equal", records);
        let engine = engine(directory, FakeTemplates::default());

        let results = engine.analyze("below 1.9.9\nequal 2.0.0").await;

        assert_eq!(results[0].applicable_vulnerabilities.len(), 1);
        assert_eq!(results[1].applicable_vulnerabilities.len(), 0);
        assert_eq!(results[1].vulnerabilities_found, 1);
    }

    #[tokio::test]
    async fn test_unusable_bounds_are_skipped_and_never_enriched() {
        let directory = FakeDirectory::default().with(
            "acme",
            vec![
                vuln("no-bound", None, &["CVE-2024-0001"]),
                vuln("bad-bound", Some("3.1"), &["CVE-2024-0002"]),
                vuln("good", Some("3.1.0"), &["CVE-2024-0003"]),
            ],
        );
        let templates = FakeTemplates::default().answer("CVE-2024-0003", Ok(true));
        let calls = templates.calls.clone();
        let engine = engine(directory, templates);

        let results = engine.analyze("acme 3.0.0").await;

        let result = &results[0];
        assert_eq!(result.vulnerabilities_found, 3);
        assert_eq!(result.applicable_vulnerabilities.len(), 1);
        let analyzed = &result.applicable_vulnerabilities[0];
        assert_eq!(analyzed.vulnerability.id, "good");
        assert_eq!(analyzed.template, Some(TemplateAvailability::known(true)));
        assert_eq!(*calls.lock().unwrap(), vec!["CVE-2024-0003".to_string()]);
    }

    #[tokio::test]
    async fn test_only_first_cve_is_checked() {
        let directory = FakeDirectory::default().with(
            "acme",
            vec![
                vuln("multi", Some("9.0.0"), &["WPVDB-1", "CVE-2024-1111", "CVE-2024-2222"]),
                vuln("no-cve", Some("9.0.0"), &["WPVDB-2"]),
            ],
        );
        let templates = FakeTemplates::default()
            .answer("CVE-2024-1111", Ok(false))
            .answer("CVE-2024-2222", Ok(true));
        let calls = templates.calls.clone();
        let engine = engine(directory, templates);

        let results = engine.analyze("acme 1.0.0").await;

        let applicable = &results[0].applicable_vulnerabilities;
        assert_eq!(applicable.len(), 2);
        assert_eq!(applicable[0].template, Some(TemplateAvailability::known(false)));
        assert_eq!(applicable[1].template, None);
        assert_eq!(*calls.lock().unwrap(), vec!["CVE-2024-1111".to_string()]);
    }

    #[tokio::test]
    async fn test_enrichment_failure_becomes_unknown() {
        let directory = FakeDirectory::default().with(
            "acme",
            vec![
                vuln("empty", Some("2.0.0"), &["CVE-2024-0001"]),
                vuln("slow", Some("2.0.0"), &["CVE-2024-0002"]),
            ],
        );
        let templates = FakeTemplates::default()
            .answer("CVE-2024-0001", Err(EnrichmentError::EmptyOutput))
            .answer("CVE-2024-0002", Err(EnrichmentError::Timeout));
        let engine = engine(directory, templates);

        let results = engine.analyze("acme 1.0.0").await;

        let applicable = &results[0].applicable_vulnerabilities;
        assert_eq!(applicable.len(), 2);

        let empty = applicable[0].template.as_ref().unwrap();
        assert!(empty.is_unknown());
        assert!(empty.error.as_ref().unwrap().contains("empty"));

        let slow = applicable[1].template.as_ref().unwrap();
        assert!(slow.is_unknown());
        assert!(slow.error.as_ref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_single_detection_with_blank_line() {
        let directory = FakeDirectory::default().with(
            "acme",
            vec![
                vuln("a", Some("1.5.0"), &[]),
                vuln("b", Some("2.0.0"), &[]),
                vuln("c", Some("1.0.0"), &[]),
            ],
        );
        let engine = engine(directory, FakeTemplates::default());

        let results = engine.analyze("acme 1.2.0\n\n").await;

        assert_eq!(results.len(), 1);
        let ids: Vec<_> = results[0]
            .applicable_vulnerabilities
            .iter()
            .map(|v| v.vulnerability.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential_and_keeps_input_order() {
        let make_directory = || {
            FakeDirectory::default()
                .with("first", vec![vuln("f", Some("2.0.0"), &["CVE-2024-0001"])])
                .with("second", vec![vuln("s", Some("1.0.0"), &[])])
                .failing("third", 1)
                .with("fourth", vec![vuln("x", Some("5.0.0"), &[]), vuln("y", None, &[])])
                .delayed("first", 40)
                .delayed("second", 20)
        };
        let input = "first 1.0.0\nsecond 1.0.0\nnoise\nthird 1.0.0\nfourth 4.9.9\nfifth 1.0";

        let sequential = engine(make_directory(), FakeTemplates::default())
            .with_max_concurrency(1)
            .analyze(input)
            .await;
        let concurrent = engine(make_directory(), FakeTemplates::default())
            .with_max_concurrency(8)
            .analyze(input)
            .await;

        assert_eq!(sequential, concurrent);
        let slugs: Vec<_> = concurrent.iter().map(|r| r.plugin_slug.as_str()).collect();
        assert_eq!(slugs, vec!["first", "second", "third", "fourth", "fifth"]);
    }

    #[tokio::test]
    async fn test_crlf_lines_are_trimmed() {
        let directory = FakeDirectory::default().with("acme", vec![vuln("a", Some("2.0.0"), &[])]);
        let engine = engine(directory, FakeTemplates::default());

        let results = engine.analyze("acme 1.0.0\r\n\r\n").await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].detected_version, "1.0.0");
    }
}
