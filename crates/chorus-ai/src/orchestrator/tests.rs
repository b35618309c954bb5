use std::sync::Arc;
use std::time::Duration;

use chorus_common::{Event, RunId, SessionId, WindowId};
use chorus_config::{MemorySettings, SessionDefaults};
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::event::{ErrorKind, StreamEvent};
use crate::graph::SingleNodeGraph;
use crate::model::ModelChunk;
use crate::provider::{MapEnv, ProviderResolver};
use crate::session::{HistoryMessage, SessionOptions};
use crate::testing::{ScriptedFactory, ScriptedModel, Step};
use crate::Role;

struct Harness {
    orchestrator: Orchestrator,
    sink: Arc<ChannelSink>,
    factory: Arc<ScriptedFactory>,
}

fn harness_with(model: ScriptedModel, settings: MemorySettings) -> Harness {
    let resolver =
        ProviderResolver::new(Arc::new(settings)).with_environment(Arc::new(MapEnv::new()));
    let factory = ScriptedFactory::new(model);
    let sink = Arc::new(ChannelSink::new(64));
    let orchestrator = Orchestrator::new(
        SessionDefaults::default(),
        resolver,
        factory.clone(),
        sink.clone(),
    );
    Harness {
        orchestrator,
        sink,
        factory,
    }
}

fn harness(model: ScriptedModel) -> Harness {
    harness_with(
        model,
        MemorySettings::new().with_provider("openai", Some("sk-test"), None),
    )
}

fn slow_chunks(texts: &[&str]) -> ScriptedModel {
    let mut steps = Vec::new();
    for text in texts {
        steps.push(Step::Chunk(ModelChunk::text(*text)));
        steps.push(Step::Sleep(Duration::from_millis(20)));
    }
    ScriptedModel::new(steps)
}

fn hanging() -> ScriptedModel {
    ScriptedModel::new(vec![Step::Hang])
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

async fn recv_window(rx: &mut broadcast::Receiver<WindowMessage>) -> WindowMessage {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("window message in time")
        .expect("window channel open")
}

async fn recv_lifecycle(rx: &mut broadcast::Receiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("lifecycle event in time")
        .expect("lifecycle channel open")
}

fn assert_grammar(events: &[StreamEvent]) {
    let terminal = events.iter().position(StreamEvent::is_terminal);
    if let Some(index) = terminal {
        assert_eq!(index, events.len() - 1, "terminal event must be last");
    }
    let run_ids: std::collections::HashSet<_> = events.iter().map(StreamEvent::run_id).collect();
    assert!(run_ids.len() <= 1);
}

#[tokio::test]
async fn hello_exchange_streams_and_records_history() {
    let h = harness(ScriptedModel::chunks(&["Hel", "lo"]));
    let session = h.orchestrator.create_session(SessionOptions::default());

    let events: Vec<_> = h
        .orchestrator
        .stream(&session.id, RunRequest::new("Hi"), None)
        .collect()
        .await;
    assert_grammar(&events);

    let run_id = events[0].run_id().clone();
    assert!(!run_id.is_unassigned());
    assert_eq!(
        events,
        vec![
            StreamEvent::Token {
                run_id: run_id.clone(),
                text: "Hel".into()
            },
            StreamEvent::Token {
                run_id: run_id.clone(),
                text: "lo".into()
            },
            StreamEvent::Done {
                run_id,
                full_content: "Hello".into(),
                token_count: 2
            },
        ]
    );

    let snapshot = h.orchestrator.session(&session.id).unwrap();
    assert_eq!(
        snapshot.history,
        vec![HistoryMessage::user("Hi"), HistoryMessage::assistant("Hello")]
    );
    assert_eq!(snapshot.history_length, session.history_length + 2);
    assert!(!snapshot.is_active);
    assert!(h.orchestrator.list_active_runs().is_empty());
}

#[tokio::test]
async fn history_feeds_the_next_prompt() {
    let h = harness(ScriptedModel::chunks(&["ok"]));
    let session = h.orchestrator.create_session(SessionOptions::default());
    for prompt in ["one", "two"] {
        h.orchestrator
            .stream(&session.id, RunRequest::new(prompt), None)
            .collect::<Vec<_>>()
            .await;
    }

    let prompts = h.factory.model().prompts();
    let second: Vec<_> = prompts[1].iter().map(|m| (m.role, m.content.as_str())).collect();
    assert_eq!(
        second,
        vec![
            (Role::System, "You are a helpful assistant."),
            (Role::Human, "one"),
            (Role::Assistant, "ok"),
            (Role::Human, "two"),
        ]
    );
}

#[tokio::test]
async fn explicit_messages_bypass_session_history() {
    let h = harness(ScriptedModel::chunks(&["fine"]));
    let session = h.orchestrator.create_session(SessionOptions::default());
    let request = RunRequest {
        messages: Some(vec![
            HistoryMessage::user("earlier"),
            HistoryMessage::assistant("reply"),
        ]),
        ..RunRequest::new("now")
    };

    let events: Vec<_> = h
        .orchestrator
        .stream(&session.id, request, None)
        .collect()
        .await;
    assert!(matches!(events.last(), Some(StreamEvent::Done { .. })));

    assert_eq!(h.orchestrator.session(&session.id).unwrap().history_length, 0);
    let prompt = &h.factory.model().prompts()[0];
    assert_eq!(prompt.len(), 4);
    assert_eq!(prompt[1].content, "earlier");
}

#[tokio::test]
async fn cancel_after_first_token_is_silent() {
    let h = harness(slow_chunks(&["a", "b", "c"]));
    let session = h.orchestrator.create_session(SessionOptions::default());
    let mut stream = h
        .orchestrator
        .stream(&session.id, RunRequest::new("go"), None);

    let first = stream.next().await.unwrap();
    let run_id = first.run_id().clone();
    assert!(matches!(first, StreamEvent::Token { .. }));
    assert!(h.orchestrator.cancel(&run_id));
    assert!(!h.orchestrator.cancel(&run_id));

    let rest: Vec<_> = stream.collect().await;
    assert!(rest.iter().all(|e| !e.is_terminal()));
    assert!(h
        .orchestrator
        .list_active_runs()
        .iter()
        .all(|run| run.run_id != run_id));
    assert_eq!(h.orchestrator.session(&session.id).unwrap().history_length, 0);
}

#[tokio::test]
async fn cancel_after_completion_reports_no_active_run() {
    let h = harness(ScriptedModel::chunks(&["x"]));
    let session = h.orchestrator.create_session(SessionOptions::default());
    let events: Vec<_> = h
        .orchestrator
        .stream(&session.id, RunRequest::new("go"), None)
        .collect()
        .await;
    let run_id = events[0].run_id().clone();
    assert!(!h.orchestrator.cancel(&run_id));
    assert!(!h.orchestrator.cancel(&run_id));
}

#[tokio::test]
async fn missing_credential_fails_before_any_model_call() {
    let h = harness_with(ScriptedModel::chunks(&["x"]), MemorySettings::new());
    let session = h.orchestrator.create_session(SessionOptions::default());

    let events: Vec<_> = h
        .orchestrator
        .stream(&session.id, RunRequest::new("Hi"), None)
        .collect()
        .await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Error { kind, message, .. } => {
            assert_eq!(*kind, ErrorKind::NoCredential);
            assert!(message.contains("'openai'"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.factory.build_count(), 0);
    assert!(h.orchestrator.list_active_runs().is_empty());
}

#[tokio::test]
async fn destroying_a_session_cancels_its_runs() {
    let h = harness(hanging());
    let session = h.orchestrator.create_session(SessionOptions::default());
    let other = h.orchestrator.create_session(SessionOptions::default());

    h.orchestrator
        .start(&session.id, RunRequest::new("a"), StartOptions::default())
        .unwrap();
    h.orchestrator
        .start(&session.id, RunRequest::new("b"), StartOptions::default())
        .unwrap();
    let survivor = h
        .orchestrator
        .start(&other.id, RunRequest::new("c"), StartOptions::default())
        .unwrap();

    let before = h.orchestrator.status();
    assert_eq!(before.active_runs, 3);
    assert_eq!(before.active_sessions, 2);

    assert!(h.orchestrator.destroy_session(&session.id));
    let orchestrator = h.orchestrator.clone();
    wait_until(|| orchestrator.status().active_runs == before.active_runs - 2).await;

    let runs = h.orchestrator.list_active_runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, survivor);
    assert_eq!(h.orchestrator.status().total_sessions, 1);

    assert!(!h.orchestrator.destroy_session(&session.id));
    assert!(h.orchestrator.cancel(&survivor));
}

#[tokio::test]
async fn unknown_session_allocates_no_run() {
    let h = harness(ScriptedModel::chunks(&["x"]));
    let missing = SessionId::from("nope");

    let events: Vec<_> = h
        .orchestrator
        .stream(&missing, RunRequest::new("Hi"), None)
        .collect()
        .await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Error { run_id, kind, .. } => {
            assert!(run_id.is_unassigned());
            assert_eq!(*kind, ErrorKind::SessionNotFound);
        }
        other => panic!("unexpected {other:?}"),
    }

    let err = h
        .orchestrator
        .start(&missing, RunRequest::new("Hi"), StartOptions::default())
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::SessionNotFound(ref id) if id == &missing));
    assert_eq!(h.orchestrator.status().active_runs, 0);
    assert_eq!(h.factory.build_count(), 0);
}

#[test]
fn start_outside_runtime_is_an_error() {
    let h = harness(ScriptedModel::chunks(&["x"]));
    let session = h.orchestrator.create_session(SessionOptions::default());
    let err = h
        .orchestrator
        .start(&session.id, RunRequest::new("Hi"), StartOptions::default())
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NoRuntime));
    assert_eq!(h.orchestrator.status().active_runs, 0);
}

#[tokio::test]
async fn push_mode_targets_one_window() {
    let h = harness(ScriptedModel::chunks(&["Hel", "lo"]));
    let mut rx = h.sink.subscribe_windows();
    let session = h.orchestrator.create_session(SessionOptions::default());

    let run_id = h
        .orchestrator
        .start(
            &session.id,
            RunRequest::new("Hi"),
            StartOptions {
                target_window: Some(WindowId(7)),
                ..Default::default()
            },
        )
        .unwrap();

    let mut kinds = Vec::new();
    loop {
        let message = recv_window(&mut rx).await;
        assert_eq!(message.target, Target::Window(WindowId(7)));
        assert_eq!(message.channel, STREAM_CHANNEL);
        assert_eq!(message.payload["runId"], run_id.as_str());
        let kind = message.payload["type"].as_str().unwrap().to_string();
        let done = kind == "done";
        kinds.push(kind);
        if done {
            assert_eq!(message.payload["fullContent"], "Hello");
            break;
        }
    }
    assert_eq!(kinds, ["token", "token", "done"]);

    let orchestrator = h.orchestrator.clone();
    wait_until(|| orchestrator.status().active_runs == 0).await;
    assert_eq!(h.orchestrator.session(&session.id).unwrap().history_length, 2);
}

#[tokio::test]
async fn push_mode_without_target_broadcasts() {
    let h = harness(ScriptedModel::chunks(&["x"]));
    let mut rx = h.sink.subscribe_windows();
    let session = h.orchestrator.create_session(SessionOptions::default());
    h.orchestrator
        .start(&session.id, RunRequest::new("Hi"), StartOptions::default())
        .unwrap();

    let message = recv_window(&mut rx).await;
    assert_eq!(message.target, Target::All);
}

#[tokio::test]
async fn push_mode_credential_failure_is_delivered() {
    let h = harness_with(ScriptedModel::chunks(&["x"]), MemorySettings::new());
    let mut rx = h.sink.subscribe_windows();
    let session = h.orchestrator.create_session(SessionOptions::default());
    h.orchestrator
        .start(&session.id, RunRequest::new("Hi"), StartOptions::default())
        .unwrap();

    let message = recv_window(&mut rx).await;
    assert_eq!(message.payload["type"], "error");
    assert_eq!(message.payload["kind"], "no_credential");
    let orchestrator = h.orchestrator.clone();
    wait_until(|| orchestrator.status().active_runs == 0).await;
}

#[tokio::test]
async fn lifecycle_events_follow_the_run() {
    let h = harness(ScriptedModel::chunks(&["Hel", "lo"]));
    let mut rx = h.sink.subscribe_lifecycle();
    let session = h.orchestrator.create_session(SessionOptions::default());
    h.orchestrator
        .stream(&session.id, RunRequest::new("Hi"), None)
        .collect::<Vec<_>>()
        .await;
    h.orchestrator.destroy_session(&session.id);

    assert!(matches!(
        recv_lifecycle(&mut rx).await,
        Event::SessionCreated { ref session_id } if session_id == &session.id
    ));
    let started = recv_lifecycle(&mut rx).await;
    assert_eq!(started.name(), "run.started");
    assert!(matches!(
        recv_lifecycle(&mut rx).await,
        Event::RunCompleted { token_count: 2, .. }
    ));
    assert!(matches!(
        recv_lifecycle(&mut rx).await,
        Event::SessionDestroyed { cancelled_runs: 0, .. }
    ));
}

#[tokio::test]
async fn abandoned_stream_releases_the_run() {
    let h = harness(slow_chunks(&["a", "b"]));
    let mut lifecycle = h.sink.subscribe_lifecycle();
    let session = h.orchestrator.create_session(SessionOptions::default());

    let mut stream = h
        .orchestrator
        .stream(&session.id, RunRequest::new("go"), None);
    let first = stream.next().await.unwrap();
    assert_eq!(h.orchestrator.status().active_runs, 1);
    assert!(h.orchestrator.session(&session.id).unwrap().is_active);
    drop(stream);

    assert_eq!(h.orchestrator.status().active_runs, 0);
    assert!(!h.orchestrator.session(&session.id).unwrap().is_active);
    assert!(!h.orchestrator.cancel(first.run_id()));

    recv_lifecycle(&mut lifecycle).await;
    recv_lifecycle(&mut lifecycle).await;
    assert!(matches!(
        recv_lifecycle(&mut lifecycle).await,
        Event::RunCancelled { .. }
    ));
}

#[tokio::test]
async fn external_cancel_is_one_way() {
    let h = harness(slow_chunks(&["a", "b", "c"]));
    let session = h.orchestrator.create_session(SessionOptions::default());

    let external = CancellationToken::new();
    let mut stream = h
        .orchestrator
        .stream(&session.id, RunRequest::new("go"), Some(external.clone()));
    let first = stream.next().await.unwrap();
    external.cancel();
    assert!(stream.next().await.is_none());
    drop(stream);
    assert!(!h.orchestrator.cancel(first.run_id()));

    let external = CancellationToken::new();
    let mut stream = h
        .orchestrator
        .stream(&session.id, RunRequest::new("go"), Some(external.clone()));
    let first = stream.next().await.unwrap();
    assert!(h.orchestrator.cancel(first.run_id()));
    assert!(stream.next().await.is_none());
    assert!(!external.is_cancelled());
}

#[tokio::test]
async fn request_overrides_session_configuration() {
    let h = harness_with(
        ScriptedModel::chunks(&["x"]),
        MemorySettings::new()
            .with_provider("openai", Some("sk-a"), None)
            .with_provider("groq", Some("gsk-b"), Some("llama-3")),
    );
    let session = h.orchestrator.create_session(SessionOptions {
        model_id: Some("gpt-4o".into()),
        temperature: Some(0.1),
        max_tokens: Some(256),
        ..Default::default()
    });

    h.orchestrator
        .stream(&session.id, RunRequest::new("one"), None)
        .collect::<Vec<_>>()
        .await;
    let request = RunRequest {
        provider_id: Some("groq".into()),
        temperature: Some(1.5),
        max_tokens: Some(64),
        ..RunRequest::new("two")
    };
    h.orchestrator
        .stream(&session.id, request, None)
        .collect::<Vec<_>>()
        .await;

    let requests = h.factory.requests();
    assert_eq!(requests[0].provider_id, "openai");
    assert_eq!(requests[0].model_name, "gpt-4o");
    assert_eq!(requests[0].temperature, Some(0.1));
    assert_eq!(requests[0].max_tokens, Some(256));

    assert_eq!(requests[1].provider_id, "groq");
    assert_eq!(requests[1].credential, "gsk-b");
    // The session's model id still wins over the provider's stored model.
    assert_eq!(requests[1].model_name, "gpt-4o");
    assert_eq!(requests[1].temperature, Some(1.5));
    assert_eq!(requests[1].max_tokens, Some(64));
}

#[tokio::test]
async fn graph_sessions_stream_through_the_graph() {
    let h = harness(ScriptedModel::chunks(&["Hel", "lo"]));
    let session = h.orchestrator.create_session(SessionOptions {
        graph: Some(SingleNodeGraph::factory("agent")),
        ..Default::default()
    });
    let events: Vec<_> = h
        .orchestrator
        .stream(&session.id, RunRequest::new("Hi"), None)
        .collect()
        .await;
    assert!(matches!(
        events.last(),
        Some(StreamEvent::Done { full_content, token_count: 2, .. }) if full_content == "Hello"
    ));
    assert_eq!(h.orchestrator.session(&session.id).unwrap().history_length, 2);
}

#[tokio::test]
async fn concurrent_runs_on_one_session_keep_history_paired() {
    let h = harness(slow_chunks(&["a", "b"]));
    let session = h.orchestrator.create_session(SessionOptions::default());

    let first = h
        .orchestrator
        .stream(&session.id, RunRequest::new("one"), None)
        .collect::<Vec<_>>();
    let second = h
        .orchestrator
        .stream(&session.id, RunRequest::new("two"), None)
        .collect::<Vec<_>>();
    assert_eq!(h.orchestrator.status().active_runs, 2);
    assert_eq!(h.orchestrator.status().active_sessions, 1);
    let (a, b) = tokio::join!(first, second);
    assert_ne!(a[0].run_id(), b[0].run_id());

    let history = h.orchestrator.session(&session.id).unwrap().history;
    assert_eq!(history.len(), 4);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, crate::session::HistoryRole::User);
        assert_eq!(pair[1], HistoryMessage::assistant("ab"));
    }
}

#[tokio::test]
async fn cancel_session_reports_whether_runs_existed() {
    let h = harness(hanging());
    let session = h.orchestrator.create_session(SessionOptions::default());
    assert!(!h.orchestrator.cancel_session(&session.id));
    assert!(!h.orchestrator.cancel_session(&SessionId::from("missing")));

    h.orchestrator
        .start(&session.id, RunRequest::new("a"), StartOptions::default())
        .unwrap();
    assert!(h.orchestrator.cancel_session(&session.id));
    let orchestrator = h.orchestrator.clone();
    wait_until(|| orchestrator.status().active_runs == 0).await;
    assert!(!h.orchestrator.session(&session.id).unwrap().is_active);
}

#[tokio::test]
async fn shutdown_cancels_everything() {
    let h = harness(hanging());
    let a = h.orchestrator.create_session(SessionOptions::default());
    let b = h.orchestrator.create_session(SessionOptions::default());
    for id in [&a.id, &b.id] {
        h.orchestrator
            .start(id, RunRequest::new("x"), StartOptions::default())
            .unwrap();
    }
    assert_eq!(h.orchestrator.shutdown(), 2);
    let orchestrator = h.orchestrator.clone();
    wait_until(|| orchestrator.status().active_runs == 0).await;
    assert_eq!(h.orchestrator.shutdown(), 0);
}

#[tokio::test]
async fn list_sessions_and_run_info() {
    let h = harness(hanging());
    let session = h.orchestrator.create_session(SessionOptions::default());
    h.orchestrator.create_session(SessionOptions::default());
    assert_eq!(h.orchestrator.list_sessions().len(), 2);

    let run_id = h
        .orchestrator
        .start(&session.id, RunRequest::new("x"), StartOptions::default())
        .unwrap();
    let runs = h.orchestrator.list_active_runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, run_id);
    assert_eq!(runs[0].session_id, session.id);

    let json = serde_json::to_value(h.orchestrator.status()).unwrap();
    assert_eq!(json["activeRuns"], 1);
    h.orchestrator.shutdown();
}

#[test]
fn run_ids_differ_per_run() {
    assert_ne!(RunId::new(), RunId::new());
}

/// Runs whose session is gone must already be cancelled.
fn assert_orphans_cancelled(orchestrator: &Orchestrator, session_id: &SessionId) {
    for info in orchestrator.list_active_runs() {
        if &info.session_id == session_id {
            assert!(
                !orchestrator.cancel(&info.run_id),
                "run {} outlived its destroyed session",
                info.run_id
            );
        }
    }
}

#[test]
fn destroy_racing_pull_registration_cancels_every_run() {
    let h = harness(hanging());
    for _ in 0..2_000 {
        let session_id = h.orchestrator.create_session(SessionOptions::default()).id;
        let barrier = std::sync::Barrier::new(2);
        let (stream, destroyed) = std::thread::scope(|scope| {
            let starter = scope.spawn(|| {
                barrier.wait();
                h.orchestrator
                    .stream(&session_id, RunRequest::new("hi"), None)
            });
            let destroyer = scope.spawn(|| {
                barrier.wait();
                h.orchestrator.destroy_session(&session_id)
            });
            (starter.join().unwrap(), destroyer.join().unwrap())
        });
        assert!(destroyed);
        assert!(h.orchestrator.session(&session_id).is_none());
        assert_orphans_cancelled(&h.orchestrator, &session_id);
        drop(stream);
    }
    assert_eq!(h.orchestrator.status().active_runs, 0);
    assert_eq!(h.orchestrator.status().total_sessions, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn destroy_racing_push_start_cancels_every_run() {
    let h = harness(hanging());
    let runtime = tokio::runtime::Handle::current();
    for _ in 0..300 {
        let session_id = h.orchestrator.create_session(SessionOptions::default()).id;
        let barrier = std::sync::Barrier::new(2);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                let _entered = runtime.enter();
                barrier.wait();
                let _ = h
                    .orchestrator
                    .start(&session_id, RunRequest::new("hi"), StartOptions::default());
            });
            scope.spawn(|| {
                barrier.wait();
                h.orchestrator.destroy_session(&session_id);
            });
        });
        assert_orphans_cancelled(&h.orchestrator, &session_id);
    }
    let orchestrator = h.orchestrator.clone();
    wait_until(|| orchestrator.status().active_runs == 0).await;
}

#[tokio::test]
async fn push_mode_external_cancel_sends_no_terminal_message() {
    let h = harness(hanging());
    let mut windows = h.sink.subscribe_windows();
    let mut lifecycle = h.sink.subscribe_lifecycle();
    let session = h.orchestrator.create_session(SessionOptions::default());
    assert!(matches!(
        recv_lifecycle(&mut lifecycle).await,
        Event::SessionCreated { .. }
    ));

    let external = CancellationToken::new();
    let run_id = h
        .orchestrator
        .start(
            &session.id,
            RunRequest::new("hi"),
            StartOptions {
                target_window: Some(WindowId(7)),
                external_cancel: Some(external.clone()),
            },
        )
        .unwrap();
    let factory = h.factory.clone();
    wait_until(|| factory.build_count() == 1).await;

    external.cancel();
    let orchestrator = h.orchestrator.clone();
    wait_until(|| orchestrator.list_active_runs().is_empty()).await;

    assert!(!h.orchestrator.cancel(&run_id));
    assert_eq!(h.orchestrator.session(&session.id).unwrap().active_runs, 0);
    assert!(matches!(
        recv_lifecycle(&mut lifecycle).await,
        Event::RunStarted { .. }
    ));
    assert!(matches!(
        recv_lifecycle(&mut lifecycle).await,
        Event::RunCancelled { run_id: ref cancelled, .. } if cancelled == &run_id
    ));
    let quiet = tokio::time::timeout(Duration::from_millis(100), windows.recv()).await;
    assert!(quiet.is_err(), "window received a message after cancel");
}
