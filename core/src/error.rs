use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrelateError {
    #[error("Invalid version '{input}': {source}")]
    InvalidVersion {
        input: String,
        #[source]
        source: semver::Error,
    },

    #[error("Request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API returned non-OK status ({status})")]
    ApiStatus { url: String, status: u16 },

    #[error("API Error ({code}): {message}")]
    DirectoryApi { code: i64, message: String },

    #[error("Malformed response from '{url}': {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid YAML syntax in '{}' at line {line}, column {column}: {message}", .file.display())]
    YamlSyntax {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Validation error in config file '{}':\n{}", .file.display(), .errors.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation { file: PathBuf, errors: Vec<String> },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Scanner error: {message}")]
    Scanner { message: String },
}

pub type Result<T> = std::result::Result<T, CorrelateError>;

/// Reasons a template-availability lookup could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentError {
    #[error("cvemap produced empty output")]
    EmptyOutput,

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("is_template key missing or invalid in cvemap output")]
    MissingFlag,

    #[error("cvemap command timed out")]
    Timeout,

    #[error("cvemap failed: API key is missing or empty.")]
    MissingCredential,

    #[error("cvemap command execution failed: {0}")]
    Execution(String),
}
