use crate::error::{CorrelateError, Result};
use std::time::Duration;
use tracing::debug;

const DEFAULT_RETRIES: u32 = 0;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("wpcorrelate/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retries: u32,
    timeout: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CorrelateError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GETs `url` and returns the raw body of a successful response.
    ///
    /// Every attempt is bounded by the client timeout. Transport errors and
    /// 5xx statuses are retried with exponential backoff until the retry
    /// budget runs out; any other status fails at once.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            debug!(url, attempt, "GET");
            let outcome = self.client.get(url).timeout(self.timeout).send().await;

            let (error, retryable) = match outcome {
                Ok(response) if response.status().is_success() => {
                    return response.text().await.map_err(|e| CorrelateError::Http {
                        url: url.to_string(),
                        source: e,
                    });
                }
                Ok(response) => (
                    CorrelateError::ApiStatus {
                        url: url.to_string(),
                        status: response.status().as_u16(),
                    },
                    response.status().is_server_error(),
                ),
                Err(e) => (
                    CorrelateError::Http {
                        url: url.to_string(),
                        source: e,
                    },
                    true,
                ),
            };

            if !retryable || attempt >= self.retries {
                return Err(error);
            }

            let delay = Duration::from_secs(2u64.saturating_pow(attempt));
            debug!(url, error = %error, delay_secs = delay.as_secs(), "retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
