use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use wpcorrelate_core::config::EnrichmentConfig;
use wpcorrelate_core::plugin::TemplateAvailabilityClient;
use wpcorrelate_core::EnrichmentError;

const MISSING_KEY_PHRASE: &str = "api key cannot be empty";

/// Asks `cvemap` whether a nuclei template exists for a CVE.
#[derive(Debug, Clone)]
pub struct CvemapClient {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl CvemapClient {
    pub fn new(config: &EnrichmentConfig) -> Self {
        Self {
            program: config.program.clone(),
            leading_args: Vec::new(),
            timeout: config.timeout(),
        }
    }

    /// Runs `program` with `leading_args` placed before the cvemap flags.
    pub fn with_command(mut self, program: impl Into<String>, leading_args: Vec<String>) -> Self {
        self.program = program.into();
        self.leading_args = leading_args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TemplateAvailabilityClient for CvemapClient {
    async fn check(&self, vulnerability_id: &str) -> Result<bool, EnrichmentError> {
        debug!(program = %self.program, id = vulnerability_id, "running cvemap");

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(["-id", vulnerability_id, "-json"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| EnrichmentError::Timeout)?
            .map_err(|e| EnrichmentError::Execution(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains(MISSING_KEY_PHRASE) {
                return Err(EnrichmentError::MissingCredential);
            }
            return Err(EnrichmentError::Execution(format!(
                "{}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(id = vulnerability_id, output = %stdout.trim(), "cvemap output");
        parse_template_flag(&stdout)
    }
}

/// Reads `is_template` from cvemap's JSON output, which is either an object
/// or an array whose first element is the object.
pub fn parse_template_flag(output: &str) -> Result<bool, EnrichmentError> {
    let output = output.trim();
    if output.is_empty() {
        return Err(EnrichmentError::EmptyOutput);
    }

    let value: Value =
        serde_json::from_str(output).map_err(|e| EnrichmentError::Parse(e.to_string()))?;

    let entry = match &value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(&value),
        _ => None,
    };

    entry
        .and_then(|e| e.get("is_template"))
        .and_then(Value::as_bool)
        .ok_or(EnrichmentError::MissingFlag)
}
