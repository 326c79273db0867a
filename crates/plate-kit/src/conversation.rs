use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::stream;
use futures::{FutureExt as _, StreamExt as _};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::backend::{CompletionBackend, CompletionStream, HistoryTurn};
use crate::error::{CompletionError, ConversationError};
use crate::host::DocumentHost;
use crate::presets::ShortcutPreset;
use crate::surface::{ConversationId, SurfaceCoordinator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Init,
    Generating,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTurn {
    pub context: String,
    pub prompt: String,
}

impl CachedTurn {
    pub fn history(&self) -> Vec<HistoryTurn> {
        vec![HistoryTurn {
            prompt: self.prompt.clone(),
            content: self.context.clone(),
        }]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub status: ConversationStatus,
    pub prompt: String,
    pub cached_turn: Option<CachedTurn>,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationUpdate {
    Chunk { text: String },
    Completed,
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    Closed,
    Cancelled,
    Refused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptMode {
    Replace,
    Insert,
}

impl AcceptMode {
    fn event(self) -> &'static str {
        match self {
            AcceptMode::Replace => "replace",
            AcceptMode::Insert => "insert",
        }
    }
}

#[derive(Debug)]
enum StreamEvent {
    Chunk(String),
    Finished,
    Failed(CompletionError),
}

#[derive(Debug)]
struct Tagged {
    generation: u64,
    event: StreamEvent,
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct ConversationController {
    id: ConversationId,
    conversation: Conversation,
    backend: Arc<dyn CompletionBackend>,
    surfaces: SurfaceCoordinator,
    open: bool,
    in_flight: Option<InFlight>,
    generation: u64,
    events_tx: mpsc::UnboundedSender<Tagged>,
    events_rx: mpsc::UnboundedReceiver<Tagged>,
}

impl ConversationController {
    pub fn new(backend: Arc<dyn CompletionBackend>, surfaces: SurfaceCoordinator) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            id: ConversationId::next(),
            conversation: Conversation::default(),
            backend,
            surfaces,
            open: false,
            in_flight: None,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn with_backend(
        backend: impl CompletionBackend + 'static,
        surfaces: SurfaceCoordinator,
    ) -> Self {
        Self::new(Arc::new(backend), surfaces)
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn status(&self) -> ConversationStatus {
        self.conversation.status
    }

    pub fn prompt(&self) -> &str {
        &self.conversation.prompt
    }

    pub fn result(&self) -> &str {
        &self.conversation.result
    }

    pub fn cached_turn(&self) -> Option<&CachedTurn> {
        self.conversation.cached_turn.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) -> Result<(), ConversationError> {
        if self.open {
            return Ok(());
        }
        self.surfaces.open_assistant(self.id)?;
        self.open = true;
        self.conversation = Conversation::default();
        debug!(conversation = %self.id, "assistant opened");
        Ok(())
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> Result<(), ConversationError> {
        if self.conversation.status == ConversationStatus::Generating {
            return Err(ConversationError::Busy);
        }
        self.conversation.prompt = prompt.into();
        Ok(())
    }

    pub fn submit(&mut self, doc: &dyn DocumentHost) -> Result<(), ConversationError> {
        let prompt = self.conversation.prompt.clone();
        self.begin_turn(doc, prompt, "submit")
    }

    pub fn shortcut(
        &mut self,
        preset: &ShortcutPreset,
        doc: &dyn DocumentHost,
    ) -> Result<(), ConversationError> {
        self.begin_turn(doc, preset.prompt.clone(), "shortcut")
    }

    pub fn regenerate(&mut self) -> Result<(), ConversationError> {
        self.ensure_open()?;
        match self.conversation.status {
            ConversationStatus::Completed => {}
            ConversationStatus::Generating => return Err(ConversationError::Busy),
            from @ ConversationStatus::Init => {
                return Err(ConversationError::InvalidTransition {
                    from,
                    event: "regenerate",
                });
            }
        }
        let Some(turn) = self.conversation.cached_turn.clone() else {
            return Err(ConversationError::NothingToRegenerate);
        };
        self.start_generation(&turn)?;
        self.conversation.result.clear();
        self.conversation.status = ConversationStatus::Generating;
        debug!(conversation = %self.id, generation = self.generation, "regenerating");
        Ok(())
    }

    pub fn cancel(&mut self) -> bool {
        if self.conversation.status != ConversationStatus::Generating {
            return false;
        }
        self.abort_in_flight();
        self.discard_turn();
        info!(conversation = %self.id, "generation cancelled");
        true
    }

    pub fn accept(
        &mut self,
        mode: AcceptMode,
        doc: &mut dyn DocumentHost,
    ) -> Result<(), ConversationError> {
        self.ensure_open()?;
        if self.conversation.status != ConversationStatus::Completed {
            return Err(ConversationError::InvalidTransition {
                from: self.conversation.status,
                event: mode.event(),
            });
        }
        match mode {
            AcceptMode::Replace => doc.replace_selection(&self.conversation.result)?,
            AcceptMode::Insert => doc.insert_after_selection(&self.conversation.result)?,
        }
        info!(conversation = %self.id, mode = mode.event(), "result accepted");
        self.close();
        Ok(())
    }

    pub fn replace(&mut self, doc: &mut dyn DocumentHost) -> Result<(), ConversationError> {
        self.accept(AcceptMode::Replace, doc)
    }

    pub fn insert(&mut self, doc: &mut dyn DocumentHost) -> Result<(), ConversationError> {
        self.accept(AcceptMode::Insert, doc)
    }

    pub fn close(&mut self) {
        self.abort_in_flight();
        self.conversation = Conversation::default();
        if self.open {
            self.open = false;
            self.surfaces.release_assistant(self.id);
            debug!(conversation = %self.id, "assistant closed");
        }
    }

    pub fn click_outside(&mut self) -> DismissOutcome {
        let protecting = match self.conversation.status {
            ConversationStatus::Generating => true,
            ConversationStatus::Init => !self.conversation.prompt.is_empty(),
            ConversationStatus::Completed => false,
        };
        if protecting {
            debug!(conversation = %self.id, status = ?self.conversation.status, "refusing outside dismissal");
            return DismissOutcome::Refused;
        }
        self.close();
        DismissOutcome::Closed
    }

    pub fn escape(&mut self) -> DismissOutcome {
        if self.cancel() {
            return DismissOutcome::Cancelled;
        }
        self.close();
        DismissOutcome::Closed
    }

    pub fn pump(&mut self) -> Vec<ConversationUpdate> {
        let mut updates = Vec::new();
        while let Ok(tagged) = self.events_rx.try_recv() {
            if let Some(update) = self.apply(tagged) {
                updates.push(update);
            }
        }
        updates
    }

    pub async fn next_update(&mut self) -> Option<ConversationUpdate> {
        while self.in_flight.is_some() {
            let tagged = self.events_rx.recv().await?;
            if let Some(update) = self.apply(tagged) {
                return Some(update);
            }
        }
        None
    }

    pub async fn run_until_settled(&mut self) -> Vec<ConversationUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = self.next_update().await {
            updates.push(update);
        }
        updates
    }

    fn ensure_open(&self) -> Result<(), ConversationError> {
        if self.open {
            Ok(())
        } else {
            Err(ConversationError::NotOpen)
        }
    }

    fn begin_turn(
        &mut self,
        doc: &dyn DocumentHost,
        prompt: String,
        event: &'static str,
    ) -> Result<(), ConversationError> {
        self.ensure_open()?;
        match self.conversation.status {
            ConversationStatus::Init => {}
            ConversationStatus::Generating => return Err(ConversationError::Busy),
            from @ ConversationStatus::Completed => {
                return Err(ConversationError::InvalidTransition { from, event });
            }
        }
        if prompt.trim().is_empty() {
            return Err(ConversationError::EmptyPrompt);
        }
        let selection = doc.selection();
        if !selection.has_text() {
            return Err(ConversationError::EmptySelection);
        }

        let turn = CachedTurn {
            context: selection.text,
            prompt,
        };
        self.start_generation(&turn)?;
        self.conversation.prompt.clear();
        self.conversation.result.clear();
        self.conversation.cached_turn = Some(turn);
        self.conversation.status = ConversationStatus::Generating;
        debug!(conversation = %self.id, generation = self.generation, event, "generation started");
        Ok(())
    }

    fn start_generation(&mut self, turn: &CachedTurn) -> Result<(), ConversationError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ConversationError::NoRuntime)?;
        self.abort_in_flight();

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        let backend_cancel = cancel.child_token();
        let backend = self.backend.clone();
        let history = turn.history();
        let token = backend_cancel.clone();
        let stream =
            panic::catch_unwind(AssertUnwindSafe(move || backend.complete(history, token)))
                .unwrap_or_else(|_| {
                    warn!(conversation = %self.id, generation, "completion backend panicked");
                    stream::once(async { Err(CompletionError::Panicked) }).boxed()
                });
        let task = runtime.spawn(forward_stream(
            generation,
            stream,
            cancel.clone(),
            backend_cancel,
            self.events_tx.clone(),
        ));
        self.in_flight = Some(InFlight {
            generation,
            cancel,
            task,
        });
        Ok(())
    }

    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
            in_flight.task.abort();
        }
    }

    fn discard_turn(&mut self) {
        self.conversation.status = ConversationStatus::Init;
        self.conversation.result.clear();
        self.conversation.cached_turn = None;
    }

    fn apply(&mut self, tagged: Tagged) -> Option<ConversationUpdate> {
        let current = self.in_flight.as_ref().map(|in_flight| in_flight.generation);
        if current != Some(tagged.generation)
            || self.conversation.status != ConversationStatus::Generating
        {
            trace!(conversation = %self.id, generation = tagged.generation, "dropping stale stream event");
            return None;
        }

        match tagged.event {
            StreamEvent::Chunk(text) => {
                self.conversation.result.push_str(&text);
                Some(ConversationUpdate::Chunk { text })
            }
            StreamEvent::Finished => {
                self.in_flight = None;
                self.conversation.status = ConversationStatus::Completed;
                debug!(conversation = %self.id, len = self.conversation.result.len(), "generation completed");
                Some(ConversationUpdate::Completed)
            }
            StreamEvent::Failed(err) => {
                warn!(conversation = %self.id, error = %err, "generation failed");
                self.abort_in_flight();
                self.discard_turn();
                Some(ConversationUpdate::Failed {
                    message: err.to_string(),
                })
            }
        }
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        self.abort_in_flight();
        if self.open {
            self.surfaces.release_assistant(self.id);
        }
    }
}

/// `cancel` is the controller's token; `backend_cancel` is its child held by
/// the backend. The backend firing its own token ends the generation as a
/// failure.
async fn forward_stream(
    generation: u64,
    mut stream: CompletionStream,
    cancel: CancellationToken,
    backend_cancel: CancellationToken,
    events: mpsc::UnboundedSender<Tagged>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = backend_cancel.cancelled() => Some(Err(CompletionError::Abandoned)),
            next = AssertUnwindSafe(stream.next()).catch_unwind() => {
                next.unwrap_or(Some(Err(CompletionError::Panicked)))
            }
        };
        let (event, done) = match next {
            Some(Ok(chunk)) => (StreamEvent::Chunk(chunk), false),
            Some(Err(err)) => (StreamEvent::Failed(err), true),
            None => (StreamEvent::Finished, true),
        };
        if events.send(Tagged { generation, event }).is_err() || done {
            return;
        }
    }
}
