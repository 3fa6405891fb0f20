use anyhow::{Context, Result};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;
use wpcorrelate_core::types::VulnerabilityRecord;
use wpcorrelate_core::{
    AnalysisReport, Config, CorrelationEngine, Plugin, ScanEvent, ScanOptions, ScanRunner,
};
use wpcorrelate_plugin_wordpress::WordPressPlugin;

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    debug!(?config, "configuration loaded");
    Ok(config)
}

pub async fn analyze_output(raw_output: String, config: &Config) -> Result<AnalysisReport> {
    let engine = CorrelationEngine::from_plugin(&WordPressPlugin::new(), config)?;
    let results = engine.analyze(&raw_output).await;

    Ok(AnalysisReport {
        raw_output,
        ..AnalysisReport::new(0, results)
    })
}

/// Runs the scanner, echoing its output to stderr while it runs.
pub async fn run_scan(options: &ScanOptions, config: &Config) -> Result<AnalysisReport> {
    let plugin = WordPressPlugin::new();
    let engine = CorrelationEngine::from_plugin(&plugin, config)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ScanEvent::Stdout(line) | ScanEvent::Stderr(line) => eprintln!("{}", line),
            }
        }
    });

    let runner = ScanRunner::for_plugin(&plugin, config).with_events(tx);
    let report = runner.run(options, &engine).await?;
    // The runner owned the only sender, so the printer ends once it drains.
    drop(runner);
    printer.await.context("scanner output printer panicked")?;

    Ok(report)
}

pub async fn lookup(slug: &str, config: &Config) -> Result<Vec<VulnerabilityRecord>> {
    let directory = WordPressPlugin::new().create_directory(config)?;
    Ok(directory.lookup(slug).await?)
}
