//! Subcommand handlers.

use std::io::Write;
use std::process::ExitCode;

use chorus_ai::provider::{credential_env_var, PLACEHOLDER_CREDENTIAL};
use chorus_ai::{RunRequest, SessionOptions, StreamEvent};
use chorus_common::{ChorusError, SessionId};
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::SessionArgs;
use crate::App;

/// How a streamed reply ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Done,
    Failed,
    Cancelled,
}

fn session_options(args: SessionArgs) -> SessionOptions {
    SessionOptions {
        provider_id: args.provider,
        model_id: args.model,
        system_prompt: args.system,
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        ..Default::default()
    }
}

/// Write one event. Tokens go to `out`; thinking and errors go to `err`.
pub(crate) fn render_event(
    event: &StreamEvent,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<Option<Outcome>> {
    match event {
        StreamEvent::Token { text, .. } => {
            write!(out, "{text}")?;
            out.flush()?;
            Ok(None)
        }
        StreamEvent::Thinking { text, .. } => {
            write!(err, "{text}")?;
            Ok(None)
        }
        StreamEvent::Done { .. } => {
            writeln!(out)?;
            Ok(Some(Outcome::Done))
        }
        StreamEvent::Error { message, .. } => {
            writeln!(err, "\nerror: {message}")?;
            Ok(Some(Outcome::Failed))
        }
    }
}

/// Stream one reply to the terminal until it ends or Ctrl-C is pressed.
async fn stream_reply(app: &App, session_id: &SessionId, prompt: String) -> Result<Outcome, ChorusError> {
    let cancel = CancellationToken::new();
    let mut events = app
        .orchestrator
        .stream(session_id, RunRequest::new(prompt), Some(cancel.clone()));

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    return Ok(Outcome::Cancelled);
                };
                if let Some(outcome) = render_event(&event, &mut stdout, &mut stderr)? {
                    return Ok(outcome);
                }
            }
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                cancel.cancel();
                eprintln!("\n[cancelled]");
            }
        }
    }
}

pub(crate) async fn chat(app: &App, prompt: String, args: SessionArgs) -> Result<ExitCode, ChorusError> {
    let session = app.orchestrator.create_session(session_options(args));
    let outcome = stream_reply(app, &session.id, prompt).await?;
    app.orchestrator.destroy_session(&session.id);
    Ok(match outcome {
        Outcome::Done => ExitCode::SUCCESS,
        Outcome::Failed => ExitCode::FAILURE,
        Outcome::Cancelled => ExitCode::from(130),
    })
}

pub(crate) async fn repl(app: &App, args: SessionArgs) -> Result<ExitCode, ChorusError> {
    let mut lifecycle = app.sink.subscribe_lifecycle();
    tokio::spawn(async move {
        while let Ok(event) = lifecycle.recv().await {
            debug!(event = event.name(), "lifecycle");
        }
    });

    let options = session_options(args);
    let mut session = app.orchestrator.create_session(options.clone());
    info!(session_id = %session.id, provider = %session.provider_id, "repl session ready");
    eprintln!("chorus repl. /reset clears history, /status shows counters, /exit quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/exit" | "/quit" => break,
            "/reset" => {
                app.orchestrator.destroy_session(&session.id);
                session = app.orchestrator.create_session(options.clone());
                eprintln!("[history cleared]");
            }
            "/status" => {
                let status = app.orchestrator.status();
                let history = app
                    .orchestrator
                    .session(&session.id)
                    .map(|s| s.history_length)
                    .unwrap_or(0);
                eprintln!(
                    "sessions: {}, active runs: {}, history messages: {history}",
                    status.total_sessions, status.active_runs
                );
            }
            prompt => {
                stream_reply(app, &session.id, prompt.to_string()).await?;
            }
        }
    }

    app.orchestrator.shutdown();
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn provider_list(app: &App) -> Result<ExitCode, ChorusError> {
    let default = &app.config.defaults.provider;
    let mut ids: Vec<&String> = app.config.providers.keys().collect();
    if !ids.contains(&default) {
        ids.insert(0, default);
    }

    for id in ids {
        let entry = app.config.providers.get(id.as_str());
        let model = entry
            .map(|e| e.model.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or("(default)");
        let credential = credential_source(
            entry.map(|e| e.api_key.as_str()),
            std::env::var(credential_env_var(id)).ok().as_deref(),
        );
        let marker = if id == default { "*" } else { " " };
        println!("{marker} {id:<12} model: {model:<24} key: {credential}");
    }
    Ok(ExitCode::SUCCESS)
}

fn credential_source(stored: Option<&str>, env: Option<&str>) -> &'static str {
    let usable = |v: &str| !v.trim().is_empty() && v.trim() != PLACEHOLDER_CREDENTIAL;
    if stored.is_some_and(usable) {
        "config"
    } else if env.is_some_and(usable) {
        "env"
    } else {
        "missing"
    }
}

pub(crate) fn provider_set(
    mut app: App,
    id: &str,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<ExitCode, ChorusError> {
    if api_key.is_none() && model.is_none() {
        return Err(ChorusError::Other(
            "nothing to set: pass --api-key and/or --model".into(),
        ));
    }
    app.config.set_provider(id, api_key, model);
    chorus_config::validation::validate(&app.config)?;
    match &app.config_path {
        Some(path) => chorus_config::save_config_to_path(&app.config, path)?,
        None => chorus_config::save_config(&app.config)?,
    }
    info!(provider = id, "provider settings saved");
    println!("saved settings for provider '{id}'");
    Ok(ExitCode::SUCCESS)
}
