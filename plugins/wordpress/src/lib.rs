pub mod cvemap;
pub mod extractor;
pub mod plugin;
pub mod wpvulnerability;

pub use cvemap::CvemapClient;
pub use extractor::NucleiLineExtractor;
pub use plugin::WordPressPlugin;
pub use wpvulnerability::WpVulnerabilityClient;
