use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ActionError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub range: Range<usize>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_kind: Option<String>,
}

impl SelectionSnapshot {
    pub fn collapsed(offset: usize) -> Self {
        Self {
            range: offset..offset,
            ..Self::default()
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.start >= self.range.end
    }

    pub fn has_text(&self) -> bool {
        !self.is_collapsed() && !self.text.trim().is_empty()
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| m == mark)
    }

    pub fn is_node(&self, kind: &str) -> bool {
        self.node_kind.as_deref() == Some(kind)
    }

    pub fn is_link(&self) -> bool {
        self.link.is_some() || self.has_mark("link")
    }
}

pub trait DocumentHost {
    fn selection(&self) -> SelectionSnapshot;

    fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), ActionError>;

    fn can_run(&self, _id: &str) -> bool {
        true
    }

    fn replace_selection(&mut self, text: &str) -> Result<(), ActionError>;

    fn insert_after_selection(&mut self, text: &str) -> Result<(), ActionError>;

    fn delete_range(&mut self, range: Range<usize>) -> Result<(), ActionError>;
}

pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapTranslator {
    entries: HashMap<String, String>,
}

impl MapTranslator {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl Translator for MapTranslator {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
