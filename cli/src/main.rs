mod commands;
mod scan;
mod display;

use clap::Parser;
use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "wpcorrelate")]
#[command(about = "Correlate nuclei WordPress detections with known vulnerabilities", long_about = None)]
struct Cli {
    #[arg(long, global = true, help = "Path to a YAML config file")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    #[command(about = "Analyze captured nuclei output")]
    Analyze(commands::Analyze),

    #[command(about = "Run nuclei against a target and analyze the results")]
    Scan(commands::Scan),

    #[command(about = "Look up known vulnerabilities for a plugin slug")]
    Lookup(commands::Lookup),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = scan::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(cmd) => {
            cmd.run(&config).await?;
        }
        Commands::Scan(cmd) => {
            cmd.run(&config).await?;
        }
        Commands::Lookup(cmd) => {
            cmd.run(&config).await?;
        }
    }

    Ok(())
}
