use crate::error::{CorrelateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV_VAR: &str = "WPCORRELATE_CONFIG";

const DEFAULT_ENDPOINT: &str = "https://www.wpvulnerability.net/plugin/%s";
const DEFAULT_CONCURRENCY: usize = 16;
pub const MAX_RETRIES: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub directory: DirectoryConfig,
    pub enrichment: EnrichmentConfig,
    pub scanner: ScannerConfig,
    /// Upper bound on lines analyzed at the same time.
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// URL template; `%s` is replaced by the plugin slug.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub program: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub program: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: DirectoryConfig::default(),
            enrichment: EnrichmentConfig::default(),
            scanner: ScannerConfig::default(),
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 15,
            retries: 0,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            program: "cvemap".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            program: "nuclei".to_string(),
        }
    }
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn url_for(&self, slug: &str) -> String {
        self.endpoint.replace("%s", slug)
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Reads and validates a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CorrelateError::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content, path)?;
        config.validate(path)?;
        Ok(config)
    }

    /// Loads the file named by `WPCORRELATE_CONFIG`, or the defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(&PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            let (line, column) = e
                .location()
                .map(|l| (l.line(), l.column()))
                .unwrap_or((0, 0));
            CorrelateError::YamlSyntax {
                file: path.to_path_buf(),
                line,
                column,
                message: e.to_string(),
            }
        })
    }

    pub fn validate(&self, source: &Path) -> Result<()> {
        let mut errors = Vec::new();

        if !self.directory.endpoint.contains("%s") {
            errors.push(format!(
                "directory.endpoint must contain a '%s' placeholder (got '{}')",
                self.directory.endpoint
            ));
        }
        if self.directory.timeout_secs == 0 {
            errors.push("directory.timeout_secs must be greater than 0".to_string());
        }
        if self.directory.retries > MAX_RETRIES {
            errors.push(format!(
                "directory.retries must be at most {} (got {})",
                MAX_RETRIES, self.directory.retries
            ));
        }
        if self.enrichment.timeout_secs == 0 {
            errors.push("enrichment.timeout_secs must be greater than 0".to_string());
        }
        if self.enrichment.program.trim().is_empty() {
            errors.push("enrichment.program must not be empty".to_string());
        }
        if self.scanner.program.trim().is_empty() {
            errors.push("scanner.program must not be empty".to_string());
        }
        if self.max_concurrency == 0 {
            errors.push("max_concurrency must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CorrelateError::Validation {
                file: source.to_path_buf(),
                errors,
            })
        }
    }
}
