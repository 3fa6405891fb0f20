use wpcorrelate_core::config::Config;
use wpcorrelate_core::plugin::{LineExtractor, TemplateAvailabilityClient, VulnerabilityDirectory};
use wpcorrelate_core::Result;

use crate::cvemap::CvemapClient;
use crate::extractor::NucleiLineExtractor;
use crate::wpvulnerability::WpVulnerabilityClient;

pub const TEMPLATE_CATEGORIES: [&str; 2] = [
    "http/vulnerabilities/wordpress/",
    "http/technologies/wordpress/",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct WordPressPlugin;

impl WordPressPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl wpcorrelate_core::Plugin for WordPressPlugin {
    fn name(&self) -> &'static str {
        "wordpress"
    }

    fn template_categories(&self) -> Vec<String> {
        TEMPLATE_CATEGORIES.iter().map(|c| c.to_string()).collect()
    }

    fn create_extractor(&self) -> Box<dyn LineExtractor> {
        Box::new(NucleiLineExtractor::new())
    }

    fn create_directory(&self, config: &Config) -> Result<Box<dyn VulnerabilityDirectory>> {
        Ok(Box::new(WpVulnerabilityClient::new(config.directory.clone())?))
    }

    fn create_template_client(&self, config: &Config) -> Box<dyn TemplateAvailabilityClient> {
        Box::new(CvemapClient::new(&config.enrichment))
    }
}
