mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use mailtrace_core::{AppConfig, Credentials};
use mailtrace_engine::ResolutionEngine;
use mailtrace_sources::{build_adapters, HttpTransport, TokioCommandRunner, PRIORITY};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mailtrace-cli")]
#[command(about = "Resolve an email address into public identity profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve one address and print the merged profiles as JSON.
    Resolve {
        email: String,
        /// Give up on unfinished sources after this many seconds.
        #[arg(long, conflicts_with = "report")]
        deadline_secs: Option<u64>,
        /// Also print how each source ended.
        #[arg(long)]
        report: bool,
        /// Single-line JSON.
        #[arg(long)]
        compact: bool,
    },
    /// List sources in priority order and whether each is enabled.
    Adapters,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = mailtrace_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let engine = build_engine(&config)?;

    match cli.command {
        Commands::Resolve {
            email,
            deadline_secs,
            report,
            compact,
        } => {
            if report {
                let report = engine.resolve_report(&email).await;
                output::print_json(&output::report_json(&report), compact)?;
                return Ok(());
            }

            let deadline = deadline_secs
                .map(Duration::from_secs)
                .or_else(|| config.resolve_deadline());
            match deadline {
                None => {
                    let result = engine.resolve(&email).await;
                    output::print_json(&output::result_json(&result)?, compact)?;
                }
                Some(deadline) => match engine.resolve_with_deadline(&email, deadline).await {
                    Ok(result) => output::print_json(&output::result_json(&result)?, compact)?,
                    Err(err) => {
                        let message = err.to_string();
                        let partial = err.into_partial();
                        output::print_json(&output::result_json(&partial)?, compact)?;
                        anyhow::bail!("{message}");
                    }
                },
            }
        }
        Commands::Adapters => {
            let enabled = engine.adapter_names();
            for name in PRIORITY {
                let state = if enabled.contains(&name) { "enabled" } else { "disabled" };
                println!("{name}\t{state}");
            }
        }
    }

    Ok(())
}

fn build_engine(config: &AppConfig) -> anyhow::Result<ResolutionEngine> {
    let credentials = Credentials::load(config.providers_path.as_deref())?;
    let transport = Arc::new(HttpTransport::new(
        config.request_timeout_secs,
        &config.user_agent,
    )?);
    let adapters = build_adapters(config, &credentials, transport, Arc::new(TokioCommandRunner));
    Ok(ResolutionEngine::from_config(config, adapters))
}
