use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use edbot_channels::{CliChannel, markdown_to_terminal};
use edbot_core::context::ABOUT;
use edbot_core::{Agent, ChatError, Config, Resources};
use edbot_gateway::GatewayServer;
use edbot_llm::openai::OpenAiProvider;
use tokio::sync::watch;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const CLI_LOG_FILE: &str = "edbot.log";

/// Edstellar training consultant chatbot.
#[derive(Debug, Parser)]
#[command(name = "edbot", version, about)]
struct Args {
    /// Path to the TOML config file [env: EDBOT_CONFIG]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chat in the terminal instead of serving the web interface
    #[arg(long)]
    cli: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_subscriber(args.cli);

    let config_path = resolve_config_path(args.config, std::env::var_os("EDBOT_CONFIG"));
    let config = load_config(&config_path)?;
    tracing::info!(
        config = %config_path.display(),
        variant = %config.bot.variant,
        model = %config.llm.model,
        "starting {}",
        config.bot.name
    );

    let provider = build_provider(&config)?;
    let resources = Arc::new(Resources::new(provider, &config));
    resources
        .warm_up()
        .await
        .context("failed to prepare the knowledge base")?;

    if args.cli {
        run_cli(resources).await
    } else {
        serve(&config, resources).await
    }
}

fn init_subscriber(cli_mode: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // keep the interactive terminal free of log lines
    if cli_mode && let Ok(file) = std::fs::File::create(CLI_LOG_FILE) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_config_path(flag: Option<PathBuf>, env: Option<std::ffi::OsString>) -> PathBuf {
    flag.or_else(|| env.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    let mut config = Config::load(path)?;
    config.resolve_secrets();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_provider(config: &Config) -> Result<OpenAiProvider, ChatError> {
    let api_key = config.api_key().ok_or(ChatError::MissingCredential)?;
    Ok(OpenAiProvider::new(
        api_key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.temperature,
        config.llm.embedding_model.clone(),
    ))
}

async fn run_cli(resources: Arc<Resources<OpenAiProvider>>) -> anyhow::Result<()> {
    println!("{}\n", markdown_to_terminal(ABOUT));
    println!("Type /reset to start over, exit to quit.\n");

    let mut agent = Agent::new(resources, CliChannel::new());
    agent.run().await
}

async fn serve(config: &Config, resources: Arc<Resources<OpenAiProvider>>) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.gateway.bind,
        config.gateway.port,
        resources,
        shutdown_rx,
    )
    .with_auth(config.gateway.auth_token.clone())
    .with_rate_limit(config.gateway.rate_limit)
    .with_max_body_size(config.gateway.max_body_size)
    .serve()
    .await?;

    Ok(())
}
