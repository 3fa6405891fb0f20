pub mod analysis;
pub mod detection;
pub mod vulnerability;

pub use analysis::{AnalyzedVulnerability, LineAnalysisResult, TemplateAvailability};
pub use detection::DetectedPlugin;
pub use vulnerability::{Cvss, Cwe, Impact, Source, VersionRange, VulnerabilityRecord};
