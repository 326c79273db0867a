use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::ConversationError;

static NEXT_CONVERSATION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConversationId(u64);

impl ConversationId {
    pub fn next() -> Self {
        Self(NEXT_CONVERSATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "surface", rename_all = "snake_case")]
pub enum ActiveSurface {
    #[default]
    BubbleMenu,
    Assistant { conversation: ConversationId },
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceCoordinator {
    active: Arc<Mutex<ActiveSurface>>,
}

impl SurfaceCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> ActiveSurface {
        *self.active.lock()
    }

    pub fn assistant_open(&self) -> bool {
        matches!(self.active(), ActiveSurface::Assistant { .. })
    }

    pub fn bubble_menu_allowed(&self) -> bool {
        !self.assistant_open()
    }

    pub fn open_assistant(&self, conversation: ConversationId) -> Result<(), ConversationError> {
        let mut active = self.active.lock();
        match *active {
            ActiveSurface::Assistant { conversation: holder } if holder != conversation => {
                Err(ConversationError::SurfaceBusy(holder))
            }
            _ => {
                *active = ActiveSurface::Assistant { conversation };
                Ok(())
            }
        }
    }

    pub fn release_assistant(&self, conversation: ConversationId) -> bool {
        let mut active = self.active.lock();
        match *active {
            ActiveSurface::Assistant { conversation: holder } if holder == conversation => {
                *active = ActiveSurface::BubbleMenu;
                true
            }
            _ => false,
        }
    }
}
