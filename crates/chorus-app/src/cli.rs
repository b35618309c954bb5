use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// chorus: concurrent, cancellable, streaming LLM conversations.
#[derive(Parser, Debug)]
#[command(name = "chorus", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one prompt and stream the reply.
    Chat {
        prompt: String,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Interactive conversation. Ctrl-C cancels the reply in progress.
    Repl {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Inspect or change provider settings.
    Provider {
        #[command(subcommand)]
        action: ProviderCommand,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct SessionArgs {
    /// Provider id (defaults to `defaults.provider` from the config).
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model name.
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt.
    #[arg(short, long)]
    pub system: Option<String>,

    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Completion token limit. `0` means unlimited.
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum ProviderCommand {
    /// List configured providers and whether a credential is available.
    List,
    /// Store a credential and/or model for a provider.
    Set {
        id: String,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}

pub fn parse() -> Args {
    Args::parse()
}
