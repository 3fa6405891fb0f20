use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wpcorrelate_core::config::DirectoryConfig;
use wpcorrelate_core::plugin::VulnerabilityDirectory;
use wpcorrelate_core::types::VulnerabilityRecord;
use wpcorrelate_core::{CorrelateError, HttpClient, Result};

/// Client for the wpvulnerability.net plugin directory.
#[derive(Debug, Clone)]
pub struct WpVulnerabilityClient {
    client: HttpClient,
    config: DirectoryConfig,
}

#[derive(Debug, Deserialize)]
struct WpVulnResponse {
    error: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<PluginData>,
}

#[derive(Debug, Deserialize)]
struct PluginData {
    #[serde(default)]
    vulnerability: Option<Vec<VulnerabilityRecord>>,
}

impl WpVulnerabilityClient {
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        let client = HttpClient::new()?
            .with_timeout(config.timeout())
            .with_retries(config.retries);
        Ok(Self { client, config })
    }

    pub fn url_for(&self, slug: &str) -> String {
        self.config.url_for(slug)
    }
}

#[async_trait]
impl VulnerabilityDirectory for WpVulnerabilityClient {
    async fn lookup(&self, slug: &str) -> Result<Vec<VulnerabilityRecord>> {
        let url = self.url_for(slug);
        debug!(url = %url, "querying wpvulnerability");

        let body = self.client.get_text(&url).await?;
        decode_response(&url, &body)
    }
}

/// Turns a directory response body into its vulnerability list.
///
/// A non-zero `error` field is an application error even when the transport
/// succeeded. Missing `data` means the plugin has no known vulnerabilities.
pub fn decode_response(url: &str, body: &str) -> Result<Vec<VulnerabilityRecord>> {
    let response: WpVulnResponse =
        serde_json::from_str(body).map_err(|e| CorrelateError::MalformedResponse {
            url: url.to_string(),
            source: e,
        })?;

    if response.error != 0 {
        return Err(CorrelateError::DirectoryApi {
            code: response.error,
            message: response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Unknown API error".to_string()),
        });
    }

    Ok(response
        .data
        .and_then(|d| d.vulnerability)
        .unwrap_or_default())
}
