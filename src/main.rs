#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::items_after_statements,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tarpit::agent::DecoyAgent;
use tarpit::config::Config;
use tarpit::gateway::{self, AppState};
use tarpit::intel::PatternSet;
use tarpit::providers::create_generator;
use tarpit::report::{HttpReportSink, ReportDispatcher};
use tarpit::sessions::create_session_store;

/// `tarpit` - a conversational decoy that wastes scammers' time.
#[derive(Parser, Debug)]
#[command(name = "tarpit")]
#[command(version)]
#[command(about = "Conversational decoy agent for fraud intelligence.", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the decoy gateway
    #[command(long_about = "\
Start the decoy gateway.

Serves the inbound message endpoint and the health probe. Bind \
address defaults to the values in your config file \
(gateway.host / gateway.port).

Examples:
  tarpit serve                  # use config defaults
  tarpit serve -p 8080          # listen on port 8080
  tarpit serve --host 127.0.0.1 # bind to loopback only")]
    Serve {
        /// Port to listen on; defaults to config gateway.port
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to; defaults to config gateway.host
        #[arg(long)]
        host: Option<String>,
    },

    /// Show resolved configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
        std::env::set_var("TARPIT_CONFIG_DIR", config_dir);
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load_or_init().await?;
    config.apply_env_overrides();

    match cli.command {
        Commands::Serve { port, host } => {
            if config.api_key.trim().is_empty() {
                bail!(
                    "api_key is not set; edit {} or set HONEYPOT_API_KEY",
                    config.config_path.display()
                );
            }

            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());

            let patterns = PatternSet::compile()?;
            let store =
                create_session_store(config.session.timeout_secs, config.session.max_sessions);
            let generator = create_generator(&config.llm);
            if config.llm.api_key.is_none() {
                tracing::warn!(
                    "llm.api_key is not set; every persona reply will use the canned fallback"
                );
            }
            let sink = Arc::new(HttpReportSink::new(&config.report.callback_url));
            let reports = ReportDispatcher::spawn(sink, config.report.queue_capacity);

            let agent = DecoyAgent::new(
                store,
                generator,
                reports,
                patterns,
                config.llm.model.clone(),
                config.llm.temperature,
                config.report.message_threshold,
            );

            info!("starting tarpit gateway on {host}:{port}");
            gateway::run_gateway(
                &host,
                port,
                AppState {
                    agent: Arc::new(agent),
                    api_key: config.api_key.clone(),
                },
            )
            .await
        }

        Commands::Status => {
            println!("tarpit status");
            println!();
            println!("Version:     {}", env!("CARGO_PKG_VERSION"));
            println!("Config:      {}", config.config_path.display());
            println!();
            println!("Gateway:     {}:{}", config.gateway.host, config.gateway.port);
            println!("Auth key:    {}", presence(!config.api_key.trim().is_empty()));
            println!();
            println!("LLM backend: {}", config.llm.base_url);
            println!("  Model:       {}", config.llm.model);
            println!("  Key:         {}", presence(config.llm.api_key.is_some()));
            println!();
            println!("Sessions:    timeout {}s, cap {}", config.session.timeout_secs, config.session.max_sessions);
            println!(
                "Reporting:   threshold {} messages -> {}",
                config.report.message_threshold, config.report.callback_url
            );
            Ok(())
        }
    }
}

fn presence(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "(not set)"
    }
}
