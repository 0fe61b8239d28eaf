//! AutoMix
//!
//! Usage:
//!   automix [serve]             - Run the HTTP server
//!   automix mix --genre <g>     - Run one mix job and print the result
//!   automix inspect             - Print the model's input/output signature

mod config;
mod logging;
mod server;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mix_job::{JobStatus, MixJobCoordinator};
use mix_ml::InferenceEngine;

use crate::config::MixConfig;
use crate::logging::init_tracing;
use crate::server::run_server;

#[derive(Parser)]
#[command(name = "automix", about = "AI mixing parameter service", version)]
struct Cli {
    /// Config file (default: $AUTOMIX_CONFIG or ./automix.config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:3001
    #[arg(long, global = true)]
    listen: Option<String>,

    /// Sample directory
    #[arg(long, global = true)]
    samples: Option<PathBuf>,

    /// ONNX model path
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Job time limit in seconds, 0 for none
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,
    /// Run one mix job and print the snapshot as JSON
    Mix {
        /// Genre label, e.g. "Pop"
        #[arg(short, long)]
        genre: String,
    },
    /// Print the model's input/output signature
    Inspect,
}

impl Cli {
    fn config(&self) -> Result<MixConfig> {
        let mut cfg = match &self.config {
            Some(path) => MixConfig::load_from_path(path),
            None => MixConfig::load(),
        }?;

        if let Some(listen) = &self.listen {
            cfg.listen_addr = listen.clone();
        }
        let mut job = cfg.job.clone();
        if let Some(samples) = &self.samples {
            job = job.with_samples_dir(samples);
        }
        if let Some(model) = &self.model {
            job = job.with_model_path(model);
        }
        if let Some(secs) = self.timeout_secs {
            job = job.with_timeout_secs((secs > 0).then_some(secs));
        }
        cfg.job = job;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = cli.config()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cfg).await,
        Commands::Mix { genre } => mix_once(cfg, &genre).await,
        Commands::Inspect => inspect(&cfg),
    }
}

async fn serve(cfg: MixConfig) -> Result<()> {
    let addr = cfg.socket_addr()?;
    tracing::info!(
        listen_addr = %addr,
        samples_dir = %cfg.job.samples_dir.display(),
        model_path = %cfg.job.model_path.display(),
        job_timeout_secs = ?cfg.job.job_timeout_secs,
        "AutoMix boot"
    );

    let coordinator = MixJobCoordinator::from_config(&cfg.job);
    tracing::info!(backend = coordinator.backend_name(), "Mix backend ready");

    run_server(addr, coordinator).await
}

async fn mix_once(cfg: MixConfig, genre: &str) -> Result<()> {
    let coordinator = MixJobCoordinator::from_config(&cfg.job);
    let snapshot = coordinator.trigger(genre)?.wait().await?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if snapshot.status == JobStatus::Failed {
        bail!(
            "Mix job failed: {}",
            snapshot.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    Ok(())
}

fn inspect(cfg: &MixConfig) -> Result<()> {
    let engine = InferenceEngine::new(&cfg.job.model_path);
    let signature = engine
        .describe()
        .with_context(|| format!("Failed to load {}", cfg.job.model_path.display()))?;

    println!("{}", serde_json::to_string_pretty(&signature)?);
    Ok(())
}
