use crate::config::Config;
use crate::error::{EnrichmentError, Result};
use crate::types::{DetectedPlugin, VulnerabilityRecord};
use async_trait::async_trait;

/// Recognizes technology detections in scanner output lines.
pub trait LineExtractor: Send + Sync {
    fn extract(&self, line: &str) -> Option<DetectedPlugin>;
}

/// Source of known vulnerabilities for a plugin slug.
#[async_trait]
pub trait VulnerabilityDirectory: Send + Sync {
    async fn lookup(&self, slug: &str) -> Result<Vec<VulnerabilityRecord>>;
}

/// Answers whether an automated detection template exists for a vulnerability id.
#[async_trait]
pub trait TemplateAvailabilityClient: Send + Sync {
    async fn check(&self, vulnerability_id: &str) -> std::result::Result<bool, EnrichmentError>;
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Scanner template categories that produce the lines this plugin understands.
    fn template_categories(&self) -> Vec<String> {
        Vec::new()
    }

    fn create_extractor(&self) -> Box<dyn LineExtractor>;
    fn create_directory(&self, config: &Config) -> Result<Box<dyn VulnerabilityDirectory>>;
    fn create_template_client(&self, config: &Config) -> Box<dyn TemplateAvailabilityClient>;
}
