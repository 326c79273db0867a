use std::time::Duration;

use futures::{StreamExt as _, stream};
use gpui_plate_kit::{CompletionBackend, CompletionStream, HistoryTurn};
use tokio_util::sync::CancellationToken;

pub struct EchoBackend {
    delay: Duration,
}

impl EchoBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl CompletionBackend for EchoBackend {
    fn complete(&self, history: Vec<HistoryTurn>, cancel: CancellationToken) -> CompletionStream {
        let text = history
            .last()
            .map(|turn| turn.content.clone())
            .unwrap_or_default();
        let words: Vec<String> = text.split_inclusive(' ').map(str::to_string).collect();
        let delay = self.delay;

        stream::iter(words)
            .then(move |word| async move {
                tokio::time::sleep(delay).await;
                Ok(word)
            })
            .take_until(async move { cancel.cancelled().await })
            .boxed()
    }
}
