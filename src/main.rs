// MISOUL - mental-health support chat backend
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

use misoul::config::{load_config, load_config_from, Config};
use misoul::crisis::CrisisDetector;
use misoul::dialogue::{ChatService, ServiceSettings, TurnRequest};
use misoul::emotion::EmotionalLevel;
use misoul::errors::ChatError;
use misoul::metrics::ChatMetrics;
use misoul::providers::GeminiProvider;
use misoul::retrieval::KnowledgeBase;
use misoul::server::ChatServer;

#[derive(Parser, Debug)]
#[command(name = "misoul")]
#[command(about = "Mental-health support chat backend", version)]
struct Args {
    /// Config file (default: ~/.misoul/config.toml, or $MISOUL_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Bind address (overrides config, e.g. 127.0.0.1:5000)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Send a single message and print the reply
    Chat {
        /// User id for the session
        #[arg(long, default_value = "cli_user")]
        user: String,
        /// Emotional level, 1-5
        #[arg(long, default_value_t = 1)]
        level: i64,
        /// Message text
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    init_tracing(config.log_file.as_deref())?;

    match args.command {
        Command::Serve { bind } => run_server(config, bind).await,
        Command::Chat {
            user,
            level,
            message,
        } => run_chat(config, user, level, message).await,
    }
}

/// Set up tracing: `RUST_LOG` filter (default info), stderr or an append-only log file
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .init();
            eprintln!("Logs: {}", path.display());
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Bridge log crate → tracing (for dependencies using log crate)
    tracing_log::LogTracer::init().ok();
    Ok(())
}

/// Wire the chat service from config
fn build_service(config: &Config) -> Result<ChatService> {
    let generator = GeminiProvider::new(
        config.google_api_key.clone(),
        &config.model,
        config.generation.clone(),
    )?;

    let knowledge = match &config.knowledge_path {
        Some(path) => KnowledgeBase::load_from_file(path).unwrap_or_else(|e| {
            tracing::warn!("Knowledge base unavailable, continuing without documents: {:#}", e);
            KnowledgeBase::default()
        }),
        None => KnowledgeBase::seeded(),
    };

    let detector = match &config.crisis_keywords_path {
        Some(path) => CrisisDetector::load_from_file(path)?,
        None => CrisisDetector::default(),
    };

    tracing::info!(
        model = generator.model(),
        documents = knowledge.len(),
        top_k = config.top_k,
        "Chat service ready"
    );

    Ok(ChatService::new(
        Arc::new(generator),
        Arc::new(knowledge),
        detector,
        ChatMetrics::new()?,
        ServiceSettings {
            top_k: config.top_k,
            generation_timeout: config.generation.timeout(),
        },
    ))
}

async fn run_server(config: Config, bind: Option<String>) -> Result<()> {
    let service = Arc::new(build_service(&config)?);

    let mut server_config = config.server.clone();
    if let Some(bind) = bind {
        server_config.bind_address = bind;
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        signal.cancel();
    });

    ChatServer::new(service, server_config).serve(shutdown).await
}

async fn run_chat(config: Config, user: String, level: i64, message: String) -> Result<()> {
    let service = build_service(&config)?;
    let level = EmotionalLevel::new(level)?;

    match service.handle_turn(TurnRequest::new(user, message, level)).await {
        Ok(outcome) => {
            for message in &outcome.messages {
                println!("{}\n", message);
            }
            if outcome.awaiting_confirmation {
                println!("(waiting for confirmation)");
            }
            Ok(())
        }
        Err(ChatError::Generation { source, messages }) => {
            for message in &messages {
                println!("{}\n", message);
            }
            Err(source).context("Turn failed")
        }
        Err(e) => Err(e.into()),
    }
}
