mod cli;
mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chorus_ai::{ChannelSink, OpenAiCompatFactory, Orchestrator, ProviderResolver};
use chorus_common::ChorusError;
use chorus_config::ChorusConfig;
use tracing_subscriber::EnvFilter;

use cli::{Command, ProviderCommand};

/// Everything a command needs.
pub(crate) struct App {
    pub config: ChorusConfig,
    pub config_path: Option<PathBuf>,
    pub orchestrator: Orchestrator,
    pub sink: Arc<ChannelSink>,
}

fn load_config(path: Option<&PathBuf>) -> (ChorusConfig, Option<ChorusError>) {
    let loaded = match path {
        Some(path) => chorus_config::load_config_from(path),
        None => chorus_config::load_config(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (ChorusConfig::default(), Some(e.into())),
    }
}

/// `--log-level debug` becomes `chorus=debug`; full directives pass through.
fn log_directive(flag: Option<&str>, config: &ChorusConfig) -> String {
    match flag {
        Some(level) if level.contains('=') => level.to_string(),
        Some(level) => format!("chorus={level}"),
        None => config.logging.level.directive().to_string(),
    }
}

fn init_logging(directive: &str) {
    let fallback = "chorus=info";
    let directive = directive.parse().unwrap_or_else(|_| {
        eprintln!("invalid log level '{directive}', using {fallback}");
        fallback.parse().expect("static directive parses")
    });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
}

fn build_app(config: ChorusConfig, config_path: Option<PathBuf>) -> App {
    let capacity = config.defaults.event_capacity as usize;
    let sink = Arc::new(ChannelSink::new(capacity));
    let resolver = ProviderResolver::new(Arc::new(config.clone()));
    let orchestrator = Orchestrator::new(
        config.defaults.clone(),
        resolver,
        Arc::new(OpenAiCompatFactory),
        sink.clone(),
    );
    App {
        config,
        config_path,
        orchestrator,
        sink,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let (config, load_error) = load_config(args.config.as_ref());
    init_logging(&log_directive(args.log_level.as_deref(), &config));

    tracing::info!("chorus v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    if let Some(e) = load_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    } else if let Err(e) = chorus_config::validation::validate(&config) {
        tracing::warn!("Config has invalid values, keeping them as parsed: {e}");
    }

    let app = build_app(config, args.config);
    let result = match args.command {
        Command::Chat { prompt, session } => commands::chat(&app, prompt, session).await,
        Command::Repl { session } => commands::repl(&app, session).await,
        Command::Provider { action } => match action {
            ProviderCommand::List => commands::provider_list(&app),
            ProviderCommand::Set { id, api_key, model } => {
                commands::provider_set(app, &id, api_key, model)
            }
        },
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
