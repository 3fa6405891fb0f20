use regex::Regex;
use std::sync::LazyLock;
use wpcorrelate_core::plugin::LineExtractor;
use wpcorrelate_core::types::DetectedPlugin;

// `[wordpress-<slug>:<qualifier>] ... ["<version>"]`; the prefix and the
// qualifier depend on which template produced the line.
static DETECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[(?:wordpress-)?([a-zA-Z0-9_-]+)(?::[^\]]+)?\].*?\["([0-9.]+)"\]"#)
        .expect("detection pattern is valid")
});

/// Pulls plugin detections out of plain-text nuclei output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NucleiLineExtractor;

impl NucleiLineExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LineExtractor for NucleiLineExtractor {
    fn extract(&self, line: &str) -> Option<DetectedPlugin> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let captures = DETECTION.captures(line)?;
        Some(DetectedPlugin::new(&captures[1], &captures[2]))
    }
}
