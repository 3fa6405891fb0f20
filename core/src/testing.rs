//! Deterministic stand-ins for the pipeline's external collaborators.

use crate::error::{CorrelateError, EnrichmentError, Result};
use crate::plugin::{LineExtractor, TemplateAvailabilityClient, VulnerabilityDirectory};
use crate::types::{DetectedPlugin, Impact, Source, VersionRange, VulnerabilityRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Accepts lines of the form `<slug> <version>`.
pub(crate) struct WordsExtractor;

impl LineExtractor for WordsExtractor {
    fn extract(&self, line: &str) -> Option<DetectedPlugin> {
        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some(slug), Some(version), None) => Some(DetectedPlugin::new(slug, version)),
            _ => None,
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub(crate) entries: HashMap<String, std::result::Result<Vec<VulnerabilityRecord>, i64>>,
    pub(crate) delays: HashMap<String, u64>,
    pub(crate) lookups: Arc<AtomicUsize>,
}

impl FakeDirectory {
    pub(crate) fn with(mut self, slug: &str, records: Vec<VulnerabilityRecord>) -> Self {
        self.entries.insert(slug.to_string(), Ok(records));
        self
    }

    pub(crate) fn failing(mut self, slug: &str, code: i64) -> Self {
        self.entries.insert(slug.to_string(), Err(code));
        self
    }

    pub(crate) fn delayed(mut self, slug: &str, millis: u64) -> Self {
        self.delays.insert(slug.to_string(), millis);
        self
    }
}

#[async_trait]
impl VulnerabilityDirectory for FakeDirectory {
    async fn lookup(&self, slug: &str) -> Result<Vec<VulnerabilityRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(millis) = self.delays.get(slug) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }
        match self.entries.get(slug) {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(code)) => Err(CorrelateError::DirectoryApi {
                code: *code,
                message: "Plugin not found".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeTemplates {
    pub(crate) answers: HashMap<String, std::result::Result<bool, EnrichmentError>>,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
}

impl FakeTemplates {
    pub(crate) fn answer(mut self, id: &str, answer: std::result::Result<bool, EnrichmentError>) -> Self {
        self.answers.insert(id.to_string(), answer);
        self
    }
}

#[async_trait]
impl TemplateAvailabilityClient for FakeTemplates {
    async fn check(&self, vulnerability_id: &str) -> std::result::Result<bool, EnrichmentError> {
        self.calls.lock().unwrap().push(vulnerability_id.to_string());
        self.answers
            .get(vulnerability_id)
            .cloned()
            .unwrap_or(Ok(false))
    }
}

pub(crate) fn vuln(id: &str, max_version: Option<&str>, source_ids: &[&str]) -> VulnerabilityRecord {
    VulnerabilityRecord {
        id: id.to_string(),
        name: format!("vulnerability {}", id),
        description: None,
        version_range: VersionRange {
            min_version: None,
            max_version: max_version.map(str::to_string),
            max_operator: Some("lt".to_string()),
        },
        sources: source_ids
            .iter()
            .map(|s| Source {
                id: s.to_string(),
                name: "source".to_string(),
                link: format!("https://example.test/{}", s),
                description: None,
                date: None,
            })
            .collect(),
        impact: Impact::default(),
    }
}
