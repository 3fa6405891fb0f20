//! wpcorrelate core library
//!
//! Types, traits and the correlation engine that turn scanner detections into
//! applicable vulnerability findings.

pub mod types;
pub mod plugin;
pub mod error;
pub mod http;
pub mod config;
pub mod version;
pub mod engine;
pub mod report;
pub mod scanner;

#[cfg(test)]
mod testing;

pub use types::*;
pub use error::{CorrelateError, EnrichmentError, Result};
pub use plugin::{LineExtractor, Plugin, TemplateAvailabilityClient, VulnerabilityDirectory};
pub use engine::CorrelationEngine;
pub use report::{AnalysisReport, ReportSummary};
pub use scanner::{ScanEvent, ScanOptions, ScanRunner};
pub use http::HttpClient;
pub use config::Config;
pub use version::{ParsedVersion, VersionComparator};
