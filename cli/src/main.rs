//! CLI entrypoint for HTML5 Sentinel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use sentinel_application::{ConsumeReviewUseCase, RelayReviewUseCase, ReviewSession};
use sentinel_domain::{CodeFile, Framing, Language, PromptTemplate};
use sentinel_infrastructure::{ConfigLoader, FileConfig, GeminiGateway, HttpReviewTransport};
use sentinel_presentation::{Cli, Command, ConsoleRenderer, truncation_hint};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    match cli.command {
        Command::Serve { bind } => run_serve(config, bind).await,
        Command::Review {
            files,
            language,
            endpoint,
            framing,
            auto_continue,
            quiet,
        } => {
            let options = ReviewOptions {
                language,
                endpoint: endpoint.unwrap_or_else(|| config.client.endpoint.clone()),
                framing: framing.unwrap_or(config.client.framing),
                auto_continue: auto_continue.unwrap_or(config.client.auto_continue),
                show_progress: !quiet,
            };
            run_review(&files, options).await
        }
        Command::Prompt { files, language } => {
            let files = read_files(&files).await?;
            print!("{}", PromptTemplate::build_prompt(&files, language));
            Ok(())
        }
        Command::ShowConfig => {
            ConfigLoader::print_config_sources(cli.config.as_deref());
            let mut shown = config;
            if shown.gemini.api_key.is_some() {
                shown.gemini.api_key = Some("********".to_string());
            }
            println!();
            println!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        }
    }
}

async fn run_serve(mut config: FileConfig, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    config.validate()?;

    // === Dependency Injection ===
    let gateway = GeminiGateway::new(config.gemini.to_gemini_config())?;
    if gateway.config().api_key.is_none() {
        warn!(
            "{} is not set; review requests will fail with a configuration error",
            config.gemini.api_key_env
        );
    }
    let relay = RelayReviewUseCase::new(Arc::new(gateway), config.limits.to_relay_limits());

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    eprintln!(
        "HTML5 Sentinel relay listening on http://{}{}",
        listener.local_addr()?,
        config.server.path
    );

    sentinel_presentation::serve(listener, relay, &config.server.path).await?;
    Ok(())
}

struct ReviewOptions {
    language: Language,
    endpoint: String,
    framing: Framing,
    auto_continue: u32,
    show_progress: bool,
}

async fn run_review(paths: &[PathBuf], options: ReviewOptions) -> Result<()> {
    let files = read_files(paths).await?;
    info!(
        files = files.len(),
        endpoint = %options.endpoint,
        framing = %options.framing,
        "Starting review"
    );

    let transport = HttpReviewTransport::new(options.endpoint, options.framing)?;
    let session = ReviewSession::new(ConsumeReviewUseCase::new(Arc::new(transport)));
    let renderer = ConsoleRenderer::stdout(options.show_progress);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    renderer.start("Analyzing...");
    let mut outcome = session
        .start_review(files, options.language, &renderer, &cancel)
        .await?;

    let mut remaining = options.auto_continue;
    while outcome.truncated && remaining > 0 && !cancel.is_cancelled() {
        remaining -= 1;
        eprintln!("\n{}", truncation_hint(true));
        renderer.start("Continuing...");
        outcome = session.continue_review(&renderer, &cancel).await?;
    }

    if outcome.truncated && !cancel.is_cancelled() {
        eprintln!("\n{}", truncation_hint(false));
    }
    if renderer.has_failed() {
        std::process::exit(1);
    }
    Ok(())
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<CodeFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(CodeFile::new(path.to_string_lossy(), content));
    }
    Ok(files)
}
