use clap::Parser;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use wpcorrelate_core::{Config, ScanOptions};

#[derive(Parser)]
pub struct Analyze {
    #[arg(short, long, help = "File with captured nuclei output, or - for stdin")]
    input: Option<PathBuf>,
    #[arg(short, long, help = "Output in JSON format")]
    json: bool,
}

impl Analyze {
    pub async fn run(&self, config: &Config) -> anyhow::Result<()> {
        let bytes = match &self.input {
            Some(path) if path.as_os_str() != "-" => {
                if !path.exists() {
                    anyhow::bail!("Input file does not exist: {}", path.display());
                }
                tokio::fs::read(path).await?
            }
            _ => {
                let mut buffer = Vec::new();
                tokio::io::stdin().read_to_end(&mut buffer).await?;
                buffer
            }
        };
        let raw_output = String::from_utf8_lossy(&bytes).into_owned();

        let report = super::scan::analyze_output(raw_output, config).await?;
        super::display::emit(&report, self.json)
    }
}

#[derive(Parser)]
pub struct Scan {
    #[arg(short, long, conflicts_with = "list", required_unless_present = "list", help = "Single target URL")]
    target: Option<String>,
    #[arg(short, long, help = "File with one target per line")]
    list: Option<PathBuf>,
    #[arg(short, long, value_delimiter = ',', help = "Severities to include, comma separated")]
    severity: Vec<String>,
    #[arg(long, help = "Run nuclei in verbose mode")]
    scanner_verbose: bool,
    #[arg(long, allow_hyphen_values = true, help = "Extra arguments passed to nuclei")]
    args: Option<String>,
    #[arg(short, long, help = "Output in JSON format")]
    json: bool,
}

impl Scan {
    pub async fn run(&self, config: &Config) -> anyhow::Result<()> {
        if let Some(list) = &self.list {
            if !list.exists() {
                anyhow::bail!("Target list does not exist: {}", list.display());
            }
        }

        let options = ScanOptions {
            target: self.target.clone(),
            target_list: self.list.clone(),
            severity: self.severity.clone(),
            verbose: self.scanner_verbose,
            additional_args: self.args.clone(),
        };

        let report = super::scan::run_scan(&options, config).await?;
        super::display::emit(&report, self.json)
    }
}

#[derive(Parser)]
pub struct Lookup {
    #[arg(help = "Plugin slug, e.g. contact-form-7")]
    slug: String,
}

impl Lookup {
    pub async fn run(&self, config: &Config) -> anyhow::Result<()> {
        let records = super::scan::lookup(&self.slug, config).await?;
        println!("{}", serde_json::to_string_pretty(&records)?);
        Ok(())
    }
}
