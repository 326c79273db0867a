use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bubble_menu::BubbleMenuMap;

const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub completion_timeout_ms: u64,
}

impl AssistantConfig {
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    fn with_defaults(mut self) -> Self {
        if self.completion_timeout_ms == 0 {
            self.completion_timeout_ms = DEFAULT_COMPLETION_TIMEOUT_MS;
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Zero shows every match.
    pub max_commands_per_group: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    pub assistant: AssistantConfig,
    pub palette: PaletteConfig,
    pub bubble_menu: BubbleMenuMap,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            palette: PaletteConfig::default(),
            bubble_menu: crate::builtin::bubble_menu_map(),
        }
        .with_defaults()
    }
}

impl KitConfig {
    pub fn with_defaults(mut self) -> Self {
        self.assistant = self.assistant.with_defaults();
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(s).map(Self::with_defaults)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
