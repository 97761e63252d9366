//! deeptrust-ui - command-line client for the DeepTrust AI image detector
//!
//! `deeptrust-ui analyze --file photo.jpg` or `deeptrust-ui analyze --url https://...`
//! submits one image, shows the status labels while the service works and prints
//! the forensic report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use deeptrust_common::config::ConfigResolver;
use deeptrust_common::{AnalysisResult, Severity};
use tokio::signal;
use tracing::info;

use deeptrust_ui::config::ClientConfig;
use deeptrust_ui::{ticker, HttpBoundary, Orchestrator, OrchestratorError, Phase, Submission};

/// Command-line arguments for deeptrust-ui
#[derive(Parser, Debug)]
#[command(name = "deeptrust-ui")]
#[command(about = "Check whether an image is AI-generated")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "DEEPTRUST_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the deeptrust-ai service
    #[arg(long, env = "DEEPTRUST_SERVER_URL")]
    server_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one image
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Local image file to upload
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    file: Option<PathBuf>,

    /// Remote image URL
    #[arg(long)]
    url: Option<String>,

    /// Print the raw result JSON instead of a report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolver = ConfigResolver::new("deeptrust-ui");
    let mut config: ClientConfig = resolver
        .load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(server_url) = cli.server_url {
        config.server_url = server_url;
    }

    deeptrust_common::logging::init_tracing(&config.logging)
        .context("Failed to initialize logging")?;
    info!("deeptrust-ui v{} using {}", env!("CARGO_PKG_VERSION"), config.server_url);

    match cli.command {
        Command::Analyze(args) => analyze(&config, args).await,
    }
}

async fn analyze(config: &ClientConfig, args: AnalyzeArgs) -> Result<()> {
    let submission = match (&args.file, &args.url) {
        (Some(path), _) => Submission::from_file(path).await?,
        (None, Some(url)) => Submission::from_url(url)?,
        (None, None) => anyhow::bail!("Provide --file or --url"),
    };

    let boundary = HttpBoundary::new(config)?;
    let orchestrator = Arc::new(Orchestrator::from_config(config, Arc::new(boundary)));

    let progress = tokio::spawn(show_progress(orchestrator.watch()));

    let pending = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.submit(submission).await }
    });

    let cancel_on_ctrl_c = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling...");
                orchestrator.reset().await;
            }
        })
    };

    let outcome = pending.await.context("Analysis task failed")?;
    cancel_on_ctrl_c.abort();
    progress.abort();

    match outcome {
        Ok(result) if args.json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Ok(result) => {
            print_report(&result);
            Ok(())
        }
        Err(OrchestratorError::Superseded) => anyhow::bail!("Analysis cancelled"),
        Err(err) => anyhow::bail!("Analysis Failed: {err}"),
    }
}

/// Print each status label once while the session is loading
async fn show_progress(mut rx: tokio::sync::watch::Receiver<deeptrust_ui::ClientSession>) {
    let mut shown: Option<usize> = None;
    loop {
        let (phase, step) = {
            let session = rx.borrow_and_update();
            (session.phase, session.scan_step_index)
        };
        if phase == Phase::Loading && shown != Some(step) {
            eprintln!("{}", ticker::label(step));
            shown = Some(step);
        }
        if phase.is_terminal() || rx.changed().await.is_err() {
            break;
        }
    }
}

fn print_report(result: &AnalysisResult) {
    println!("Verdict:    {}", result.verdict);
    println!("Confidence: {}%", result.confidence);
    println!();
    println!("{}", result.summary);

    if !result.issues.is_empty() {
        println!();
        println!("Issues detected:");
        for severity in Severity::ALL {
            for issue in result.issues_with(severity) {
                println!("  [{}] {}: {}", issue.severity, issue.name, issue.description);
            }
        }
    }

    if !result.clear.is_empty() {
        println!();
        println!("Passed checks:");
        for check in &result.clear {
            println!("  - {check}");
        }
    }

    if let Some(metadata) = &result.metadata {
        println!();
        println!("Metadata:");
        println!("  EXIF present:         {}", if metadata.exif_present { "yes" } else { "no" });
        let fields = [
            ("Software fingerprint", &metadata.software_fingerprint),
            ("Compression", &metadata.compression_analysis),
            ("Provenance", &metadata.provenance_signals),
            ("Tampering", &metadata.tampering_indicators),
            ("Metadata verdict", &metadata.metadata_verdict),
        ];
        for (label, value) in fields {
            if !value.is_empty() {
                println!("  {:<21} {}", format!("{label}:"), value);
            }
        }
    }
}
