use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt as _, stream};
use gpui_plate_kit::{
    BubbleMenuResolver, CachedTurn, CompletionBackend, CompletionError, CompletionStream,
    ConversationController, ConversationError, ConversationStatus, ConversationUpdate,
    DismissOutcome, HistoryTurn, IdentityTranslator, KitConfig, MemoryDocument, PresetItem,
    ShortcutPreset, SurfaceCoordinator, TimeoutBackend, builtin, default_presets,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

fn scripted(
    items: &'static [Result<&'static str, &'static str>],
) -> impl CompletionBackend + 'static {
    move |_history: Vec<HistoryTurn>, _cancel: CancellationToken| -> CompletionStream {
        stream::iter(items.iter().map(|item| match item {
            Ok(chunk) => Ok(chunk.to_string()),
            Err(message) => Err(CompletionError::Backend(message.to_string())),
        }))
        .boxed()
    }
}

/// Records every history it is asked to complete and answers "first",
/// then "second" for every later call.
#[derive(Clone, Default)]
struct Recording {
    calls: Arc<Mutex<Vec<Vec<HistoryTurn>>>>,
}

impl CompletionBackend for Recording {
    fn complete(&self, history: Vec<HistoryTurn>, _cancel: CancellationToken) -> CompletionStream {
        let mut calls = self.calls.lock();
        calls.push(history);
        let reply = if calls.len() == 1 { "first" } else { "second" };
        stream::iter([Ok(reply.to_string())]).boxed()
    }
}

type Item = Result<String, CompletionError>;

/// A backend fed by hand from the test through a channel.
struct Channel {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Item>>>,
}

impl CompletionBackend for Channel {
    fn complete(&self, _history: Vec<HistoryTurn>, _cancel: CancellationToken) -> CompletionStream {
        match self.rx.lock().take() {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => stream::empty().boxed(),
        }
    }
}

fn channel() -> (mpsc::UnboundedSender<Item>, Channel) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        tx,
        Channel {
            rx: Mutex::new(Some(rx)),
        },
    )
}

fn selected(text: &str, needle: &str) -> MemoryDocument {
    let mut doc = MemoryDocument::new(text);
    assert!(doc.select_text(needle));
    doc
}

fn chunk(text: &str) -> ConversationUpdate {
    ConversationUpdate::Chunk {
        text: text.to_string(),
    }
}

#[tokio::test]
async fn submit_streams_into_the_result_and_replace_applies_it() {
    let surfaces = SurfaceCoordinator::new();
    let mut controller = ConversationController::with_backend(
        scripted(&[Ok("Bonjour"), Ok(" le"), Ok(" monde")]),
        surfaces.clone(),
    );
    let mut doc = selected("hello world", "hello world");

    controller.open().unwrap();
    assert!(surfaces.assistant_open());

    controller.set_prompt("Translate into French").unwrap();
    controller.submit(&doc).unwrap();
    assert_eq!(controller.status(), ConversationStatus::Generating);
    assert_eq!(controller.prompt(), "");
    assert_eq!(
        controller.cached_turn(),
        Some(&CachedTurn {
            context: "hello world".to_string(),
            prompt: "Translate into French".to_string(),
        })
    );

    let updates = controller.run_until_settled().await;
    assert_eq!(
        updates,
        vec![
            chunk("Bonjour"),
            chunk(" le"),
            chunk(" monde"),
            ConversationUpdate::Completed
        ]
    );
    assert_eq!(controller.status(), ConversationStatus::Completed);
    assert_eq!(controller.result(), "Bonjour le monde");

    controller.replace(&mut doc).unwrap();
    assert_eq!(doc.text(), "Bonjour le monde");
    assert!(!controller.is_open());
    assert!(!surfaces.assistant_open());
    assert_eq!(controller.status(), ConversationStatus::Init);
    assert_eq!(controller.result(), "");
}

#[tokio::test]
async fn insert_places_the_result_after_the_selection() {
    let mut controller = ConversationController::with_backend(
        scripted(&[Ok(" there")]),
        SurfaceCoordinator::new(),
    );
    let mut doc = selected("hello world", "hello");

    controller.open().unwrap();
    controller.set_prompt("Continue").unwrap();
    controller.submit(&doc).unwrap();
    controller.run_until_settled().await;

    controller.insert(&mut doc).unwrap();
    assert_eq!(doc.text(), "hello there world");
}

#[tokio::test]
async fn regenerate_replays_the_cached_turn() {
    let backend = Recording::default();
    let mut controller =
        ConversationController::with_backend(backend.clone(), SurfaceCoordinator::new());
    let mut doc = selected("hello world", "world");

    controller.open().unwrap();
    controller.set_prompt("Summarize").unwrap();
    controller.submit(&doc).unwrap();
    controller.run_until_settled().await;
    assert_eq!(controller.result(), "first");

    // The selection moving afterwards does not change what is replayed.
    doc.select_text("hello");
    controller.regenerate().unwrap();
    assert_eq!(controller.status(), ConversationStatus::Generating);
    assert_eq!(controller.result(), "");
    controller.run_until_settled().await;
    assert_eq!(controller.result(), "second");

    let calls = backend.calls.lock();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(
        calls[0],
        vec![HistoryTurn {
            prompt: "Summarize".to_string(),
            content: "world".to_string(),
        }]
    );
}

#[tokio::test]
async fn shortcut_sends_the_preset_prompt_verbatim() {
    let backend = Recording::default();
    let mut controller =
        ConversationController::with_backend(backend.clone(), SurfaceCoordinator::new());
    let doc = selected("teh quick fox", "teh quick fox");

    let PresetItem::Preset(preset) = default_presets()[0].items[1].clone() else {
        panic!("expected a preset");
    };
    assert_eq!(preset.label, "Fix spelling & grammar");

    controller.open().unwrap();
    controller.set_prompt("ignored draft").unwrap();
    controller.shortcut(&preset, &doc).unwrap();
    controller.run_until_settled().await;

    let calls = backend.calls.lock();
    assert_eq!(calls[0][0].prompt, preset.prompt);
    assert_eq!(calls[0][0].content, "teh quick fox");
    assert_eq!(controller.prompt(), "");
}

#[tokio::test]
async fn cancel_discards_partial_output_and_late_chunks() {
    let (tx, backend) = channel();
    let mut controller = ConversationController::with_backend(backend, SurfaceCoordinator::new());
    let doc = selected("hello world", "world");

    controller.open().unwrap();
    controller.set_prompt("Explain").unwrap();
    controller.submit(&doc).unwrap();

    tx.send(Ok("partial".to_string())).unwrap();
    assert_eq!(controller.next_update().await, Some(chunk("partial")));
    assert_eq!(controller.result(), "partial");

    tx.send(Ok(" late".to_string())).unwrap();
    tokio::task::yield_now().await;

    assert!(controller.cancel());
    assert_eq!(controller.status(), ConversationStatus::Init);
    assert_eq!(controller.result(), "");
    assert_eq!(controller.cached_turn(), None);

    let _ = tx.send(Ok(" later".to_string()));
    tokio::task::yield_now().await;
    assert!(controller.pump().is_empty());
    assert_eq!(controller.next_update().await, None);
    assert_eq!(controller.result(), "");

    assert!(controller.is_open());
    assert!(!controller.cancel());
}

#[tokio::test]
async fn backend_failure_returns_to_init_and_keeps_the_surface() {
    let surfaces = SurfaceCoordinator::new();
    let mut controller = ConversationController::with_backend(
        scripted(&[Ok("part"), Err("overloaded")]),
        surfaces.clone(),
    );
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    controller.submit(&doc).unwrap();

    let updates = controller.run_until_settled().await;
    assert_eq!(
        updates,
        vec![
            chunk("part"),
            ConversationUpdate::Failed {
                message: "completion backend failed: overloaded".to_string()
            }
        ]
    );
    assert_eq!(controller.status(), ConversationStatus::Init);
    assert_eq!(controller.result(), "");
    assert!(controller.is_open());
    assert!(surfaces.assistant_open());
}

#[tokio::test]
async fn panicking_stream_is_reported_as_a_failure() {
    let backend = |_history: Vec<HistoryTurn>, _cancel: CancellationToken| -> CompletionStream {
        stream::iter([()])
            .map(|()| -> Result<String, CompletionError> { panic!("stream exploded") })
            .boxed()
    };
    let mut controller = ConversationController::with_backend(backend, SurfaceCoordinator::new());
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    controller.submit(&doc).unwrap();

    assert_eq!(
        controller.run_until_settled().await,
        vec![ConversationUpdate::Failed {
            message: "completion stream panicked".to_string()
        }]
    );
    assert_eq!(controller.status(), ConversationStatus::Init);
}

#[tokio::test]
async fn backend_panicking_before_streaming_is_reported_as_a_failure() {
    let backend = |_history: Vec<HistoryTurn>, _cancel: CancellationToken| -> CompletionStream {
        panic!("backend exploded")
    };
    let surfaces = SurfaceCoordinator::new();
    let mut controller = ConversationController::with_backend(backend, surfaces.clone());
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    assert_eq!(controller.submit(&doc), Ok(()));

    assert_eq!(
        controller.run_until_settled().await,
        vec![ConversationUpdate::Failed {
            message: "completion stream panicked".to_string()
        }]
    );
    assert_eq!(controller.status(), ConversationStatus::Init);
    assert!(surfaces.assistant_open());
}

#[tokio::test]
async fn backend_cancelling_its_own_token_ends_the_generation() {
    let backend = |_history: Vec<HistoryTurn>, cancel: CancellationToken| -> CompletionStream {
        cancel.cancel();
        stream::pending().boxed()
    };
    let mut controller = ConversationController::with_backend(backend, SurfaceCoordinator::new());
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    controller.submit(&doc).unwrap();

    let updates = tokio::time::timeout(Duration::from_secs(5), controller.run_until_settled())
        .await
        .expect("generation never settled");
    assert_eq!(
        updates,
        vec![ConversationUpdate::Failed {
            message: "completion backend gave up".to_string()
        }]
    );
    assert_eq!(controller.status(), ConversationStatus::Init);
    assert_eq!(controller.result(), "");
}

#[tokio::test]
async fn only_one_generation_runs_at_a_time() {
    let (_tx, backend) = channel();
    let mut controller = ConversationController::with_backend(backend, SurfaceCoordinator::new());
    let doc = selected("hello world", "world");

    controller.open().unwrap();
    controller.set_prompt("Explain").unwrap();
    controller.submit(&doc).unwrap();

    assert_eq!(controller.submit(&doc), Err(ConversationError::Busy));
    assert_eq!(
        controller.set_prompt("another"),
        Err(ConversationError::Busy)
    );
    assert_eq!(controller.regenerate(), Err(ConversationError::Busy));
    assert_eq!(
        controller.shortcut(&ShortcutPreset::new("Explain", "Explain it"), &doc),
        Err(ConversationError::Busy)
    );
}

#[tokio::test]
async fn submit_validates_state_prompt_and_selection() {
    let mut controller = ConversationController::with_backend(
        scripted(&[Ok("done")]),
        SurfaceCoordinator::new(),
    );
    let mut doc = MemoryDocument::new("hello");

    assert_eq!(controller.submit(&doc), Err(ConversationError::NotOpen));

    controller.open().unwrap();
    controller.set_prompt("   ").unwrap();
    doc.select_all();
    assert_eq!(controller.submit(&doc), Err(ConversationError::EmptyPrompt));

    controller.set_prompt("Improve").unwrap();
    doc.select(2..2);
    assert_eq!(controller.submit(&doc), Err(ConversationError::EmptySelection));
    assert_eq!(controller.status(), ConversationStatus::Init);
    assert_eq!(controller.prompt(), "Improve");

    assert_eq!(
        controller.regenerate(),
        Err(ConversationError::InvalidTransition {
            from: ConversationStatus::Init,
            event: "regenerate",
        })
    );
    assert_eq!(
        controller.replace(&mut doc),
        Err(ConversationError::InvalidTransition {
            from: ConversationStatus::Init,
            event: "replace",
        })
    );

    doc.select_all();
    controller.submit(&doc).unwrap();
    controller.run_until_settled().await;
    controller.set_prompt("Again").unwrap();
    assert_eq!(
        controller.submit(&doc),
        Err(ConversationError::InvalidTransition {
            from: ConversationStatus::Completed,
            event: "submit",
        })
    );
}

#[tokio::test]
async fn dismissal_protects_in_progress_work() {
    let (_tx, backend) = channel();
    let surfaces = SurfaceCoordinator::new();
    let mut controller = ConversationController::with_backend(backend, surfaces.clone());
    let doc = selected("hello world", "world");

    controller.open().unwrap();
    controller.set_prompt("draft").unwrap();
    assert_eq!(controller.click_outside(), DismissOutcome::Refused);
    assert!(controller.is_open());

    controller.submit(&doc).unwrap();
    assert_eq!(controller.click_outside(), DismissOutcome::Refused);
    assert_eq!(controller.status(), ConversationStatus::Generating);

    assert_eq!(controller.escape(), DismissOutcome::Cancelled);
    assert_eq!(controller.status(), ConversationStatus::Init);
    assert!(controller.is_open());

    assert_eq!(controller.click_outside(), DismissOutcome::Closed);
    assert!(!controller.is_open());
    assert!(!surfaces.assistant_open());
}

#[tokio::test]
async fn whitespace_prompt_still_counts_as_a_draft() {
    let mut controller = ConversationController::with_backend(
        scripted(&[Ok("done")]),
        SurfaceCoordinator::new(),
    );

    controller.open().unwrap();
    controller.set_prompt("   ").unwrap();
    assert_eq!(controller.click_outside(), DismissOutcome::Refused);
    assert!(controller.is_open());

    controller.set_prompt("").unwrap();
    assert_eq!(controller.click_outside(), DismissOutcome::Closed);
}

#[tokio::test]
async fn completed_conversation_closes_on_outside_click_and_escape() {
    let mut controller = ConversationController::with_backend(
        scripted(&[Ok("done")]),
        SurfaceCoordinator::new(),
    );
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    controller.submit(&doc).unwrap();
    controller.run_until_settled().await;
    assert_eq!(controller.click_outside(), DismissOutcome::Closed);
    assert_eq!(controller.result(), "");

    controller.open().unwrap();
    assert_eq!(controller.escape(), DismissOutcome::Closed);
    assert!(!controller.is_open());
}

#[tokio::test]
async fn assistant_and_bubble_menu_never_show_together() {
    let surfaces = SurfaceCoordinator::new();
    let registry = builtin::richtext();
    let resolver = BubbleMenuResolver::new(builtin::bubble_menu_map(), surfaces.clone());
    let doc = selected("hello world", "world");

    let mut first =
        ConversationController::with_backend(scripted(&[Ok("x")]), surfaces.clone());
    let mut second =
        ConversationController::with_backend(scripted(&[Ok("y")]), surfaces.clone());

    assert!(
        resolver
            .resolve(&registry, &IdentityTranslator, &doc)
            .is_some()
    );

    first.open().unwrap();
    assert!(
        resolver
            .resolve(&registry, &IdentityTranslator, &doc)
            .is_none()
    );
    assert_eq!(
        second.open(),
        Err(ConversationError::SurfaceBusy(first.id()))
    );

    first.close();
    assert!(
        resolver
            .resolve(&registry, &IdentityTranslator, &doc)
            .is_some()
    );
    second.open().unwrap();
    assert!(!first.is_open());
}

#[tokio::test]
async fn dropping_an_open_controller_releases_the_surface() {
    let (_tx, backend) = channel();
    let surfaces = SurfaceCoordinator::new();
    let mut controller = ConversationController::with_backend(backend, surfaces.clone());
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    controller.submit(&doc).unwrap();
    drop(controller);

    assert!(!surfaces.assistant_open());
}

#[tokio::test(start_paused = true)]
async fn stalled_backend_times_out() {
    let (_tx, backend) = channel();
    let mut controller = ConversationController::with_backend(
        TimeoutBackend::new(backend, Duration::from_secs(5)),
        SurfaceCoordinator::new(),
    );
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    controller.submit(&doc).unwrap();

    assert_eq!(
        controller.run_until_settled().await,
        vec![ConversationUpdate::Failed {
            message: "completion timed out after 5s".to_string()
        }]
    );
    assert_eq!(controller.status(), ConversationStatus::Init);
}

#[tokio::test(start_paused = true)]
async fn timeout_comes_from_config() {
    let config = KitConfig::from_json_str(r#"{ "assistant": { "completion_timeout_ms": 250 } }"#)
        .unwrap();
    let (tx, backend) = channel();
    let mut controller = ConversationController::with_backend(
        TimeoutBackend::from_config(backend, &config.assistant),
        SurfaceCoordinator::new(),
    );
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    controller.submit(&doc).unwrap();

    tx.send(Ok("quick".to_string())).unwrap();
    assert_eq!(controller.next_update().await, Some(chunk("quick")));
    assert_eq!(
        controller.next_update().await,
        Some(ConversationUpdate::Failed {
            message: "completion timed out after 250ms".to_string()
        })
    );
}

#[test]
fn submit_without_a_runtime_leaves_state_untouched() {
    let mut controller = ConversationController::with_backend(
        scripted(&[Ok("never")]),
        SurfaceCoordinator::new(),
    );
    let doc = selected("hello", "hello");

    controller.open().unwrap();
    controller.set_prompt("Improve").unwrap();
    assert_eq!(controller.submit(&doc), Err(ConversationError::NoRuntime));
    assert_eq!(controller.status(), ConversationStatus::Init);
    assert_eq!(controller.prompt(), "Improve");
    assert_eq!(controller.cached_turn(), None);
}
