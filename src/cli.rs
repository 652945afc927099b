use crate::config::loader::EngineConfig;
use crate::config::validator::validate_config;
use crate::core::engine::Engine;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Resolve signature paths under this directory instead of /
    #[arg(long, global = true)]
    fs_root: Option<PathBuf>,
    /// Read kernel tables from this directory instead of /proc
    #[arg(long, global = true)]
    proc_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a single verdict; exit status 1 when compromised
    Check {
        /// Also print each probe's verdict
        #[arg(long)]
        verbose: bool,
    },
    /// Print every finding as a category|detail record
    Evidence {
        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(root) = &cli.fs_root {
        config.fs_root = root.clone();
    }
    if let Some(root) = &cli.proc_root {
        config.proc_root = root.clone();
    }

    // Errors abort here; warnings were already logged by the validator
    validate_config(&config).context("validating configuration")?;
    Ok(config)
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let engine = Engine::new(config);

    match cli.command {
        Commands::Check { verbose } => {
            let verdicts = engine.verdicts();
            if verbose {
                for verdict in &verdicts {
                    println!("{:<20} {}", verdict.id, if verdict.positive { "positive" } else { "-" });
                }
            }
            if verdicts.iter().any(|v| v.positive) {
                println!("compromised");
                std::process::exit(1);
            }
            println!("clean");
        }
        Commands::Evidence { json } => {
            let report = engine.collect_evidence();
            if json {
                let rendered = serde_json::to_string_pretty(&report).context("serializing report")?;
                println!("{}", rendered);
            } else {
                for record in &report.records {
                    println!("{}", record);
                }
                if report.saturated {
                    eprintln!("evidence store full at {} records; later findings dropped", report.capacity);
                }
            }
        }
    }

    Ok(())
}
