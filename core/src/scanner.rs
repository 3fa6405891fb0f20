use crate::config::Config;
use crate::engine::CorrelationEngine;
use crate::error::{CorrelateError, Result};
use crate::plugin::Plugin;
use crate::report::AnalysisReport;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub target: Option<String>,
    pub target_list: Option<PathBuf>,
    pub severity: Vec<String>,
    pub verbose: bool,
    /// Extra scanner arguments, split on whitespace.
    pub additional_args: Option<String>,
}

/// Live output from a running scanner, one line per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Stdout(String),
    Stderr(String),
}

/// Runs the scanner, then analyzes the output file it wrote.
pub struct ScanRunner {
    program: String,
    templates: Vec<String>,
    events: Option<UnboundedSender<ScanEvent>>,
}

impl ScanRunner {
    pub fn new(program: impl Into<String>, templates: Vec<String>) -> Self {
        Self {
            program: program.into(),
            templates,
            events: None,
        }
    }

    pub fn for_plugin(plugin: &dyn Plugin, config: &Config) -> Self {
        Self::new(config.scanner.program.clone(), plugin.template_categories())
    }

    pub fn with_events(mut self, events: UnboundedSender<ScanEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build_args(&self, options: &ScanOptions, output: &Path) -> Result<Vec<String>> {
        let mut args = Vec::new();

        if let Some(target) = &options.target {
            args.push("-target".to_string());
            args.push(target.clone());
        } else if let Some(list) = &options.target_list {
            args.push("-list".to_string());
            args.push(list.display().to_string());
        } else {
            return Err(CorrelateError::Scanner {
                message: "either a target or a target list is required".to_string(),
            });
        }

        if !self.templates.is_empty() {
            args.push("-t".to_string());
            args.push(self.templates.join(","));
        }
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.push("-nc".to_string());

        if !options.severity.is_empty() {
            args.push("-severity".to_string());
            args.push(options.severity.join(","));
        }
        if options.verbose {
            args.push("-v".to_string());
        }
        if let Some(extra) = &options.additional_args {
            args.extend(extra.split_whitespace().map(str::to_string));
        }

        Ok(args)
    }

    /// Runs one scan to completion.
    ///
    /// Scanner output is decoded lossily so stray bytes never end a scan early.
    /// A scanner that cannot be started yields a report with code -1. Whatever
    /// the exit code, the output file is analyzed and then removed.
    pub async fn run(&self, options: &ScanOptions, engine: &CorrelationEngine) -> Result<AnalysisReport> {
        let output_path = tempfile::Builder::new()
            .prefix("nuclei-wp-scan-")
            .suffix(".txt")
            .tempfile()?
            .into_temp_path();
        let args = self.build_args(options, &output_path)?;

        info!(program = %self.program, output = %output_path.display(), "starting scanner");
        debug!(?args, "scanner arguments");

        let mut child = match Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %self.program, error = %e, "failed to start scanner");
                return Ok(AnalysisReport::failed_to_start(format!(
                    "Failed to start Nuclei process: {}",
                    e
                )));
            }
        };

        let (raw_output, mut error_output) = tokio::join!(
            drain(child.stdout.take(), self.events.as_ref(), ScanEvent::Stdout),
            drain(child.stderr.take(), self.events.as_ref(), ScanEvent::Stderr),
        );

        let code = match child.wait().await {
            Ok(status) => status.code().unwrap_or(-1),
            Err(e) => {
                error_output.push_str(&format!("\nFailed to wait for Nuclei process: {}", e));
                -1
            }
        };
        info!(code, "scanner exited, analyzing output");

        let analysis_results = match tokio::fs::read(&output_path).await {
            Ok(content) => engine.analyze(&String::from_utf8_lossy(&content)).await,
            Err(e) => {
                warn!(path = %output_path.display(), error = %e, "could not read scanner output");
                error_output.push_str(&format!("\nError reading temp file: {}", e));
                Vec::new()
            }
        };

        if let Err(e) = output_path.close() {
            warn!(error = %e, "failed to delete temporary output file");
        }

        Ok(AnalysisReport {
            code,
            analysis_results,
            raw_output,
            error_output,
        })
    }
}

async fn drain<R>(
    reader: Option<R>,
    events: Option<&UnboundedSender<ScanEvent>>,
    wrap: fn(String) -> ScanEvent,
) -> String
where
    R: AsyncRead + Unpin,
{
    let mut collected = String::new();
    let Some(reader) = reader else {
        return collected;
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\n', '\r']);
                collected.push_str(line);
                collected.push('\n');
                if let Some(tx) = events {
                    let _ = tx.send(wrap(line.to_string()));
                }
            }
            Err(e) => {
                warn!(error = %e, "error reading scanner output");
                break;
            }
        }
    }

    collected
}
