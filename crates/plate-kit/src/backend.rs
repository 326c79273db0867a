use std::time::Duration;

use futures::StreamExt as _;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::AssistantConfig;
use crate::error::CompletionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub prompt: String,
    pub content: String,
}

pub type CompletionStream = BoxStream<'static, Result<String, CompletionError>>;

/// Implementations should stop producing once `cancel` fires; the
/// controller stops reading at that point regardless. A backend that fires
/// `cancel` itself ends the generation with [`CompletionError::Abandoned`].
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, history: Vec<HistoryTurn>, cancel: CancellationToken) -> CompletionStream;
}

impl<F> CompletionBackend for F
where
    F: Fn(Vec<HistoryTurn>, CancellationToken) -> CompletionStream + Send + Sync,
{
    fn complete(&self, history: Vec<HistoryTurn>, cancel: CancellationToken) -> CompletionStream {
        self(history, cancel)
    }
}

pub struct TimeoutBackend<B> {
    inner: B,
    timeout: Duration,
}

impl<B> TimeoutBackend<B> {
    pub fn new(inner: B, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn from_config(inner: B, config: &AssistantConfig) -> Self {
        Self::new(inner, config.completion_timeout())
    }
}

impl<B: CompletionBackend> CompletionBackend for TimeoutBackend<B> {
    fn complete(&self, history: Vec<HistoryTurn>, cancel: CancellationToken) -> CompletionStream {
        let mut inner = self.inner.complete(history, cancel);
        let timeout = self.timeout;
        let deadline = tokio::time::Instant::now() + timeout;
        Box::pin(async_stream::stream! {
            loop {
                match tokio::time::timeout_at(deadline, inner.next()).await {
                    Ok(Some(item)) => yield item,
                    Ok(None) => break,
                    Err(_) => {
                        yield Err(CompletionError::TimedOut(timeout));
                        break;
                    }
                }
            }
        })
    }
}
