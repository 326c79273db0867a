use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::extension::{ButtonDescriptor, MenuEntry, MenuItem, tidy_dividers};
use crate::host::{DocumentHost, SelectionSnapshot, Translator};
use crate::icon::IconName;
use crate::registry::ExtensionRegistry;
use crate::surface::SurfaceCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Link,
    Video,
    Text,
}

impl NodeType {
    pub const PRIORITY: [NodeType; 3] = [NodeType::Link, NodeType::Video, NodeType::Text];

    pub fn matches(self, selection: &SelectionSnapshot) -> bool {
        match self {
            NodeType::Link => selection.is_link(),
            NodeType::Video => selection.is_node("video"),
            NodeType::Text => selection.has_text(),
        }
    }
}

pub fn classify(selection: &SelectionSnapshot) -> Option<NodeType> {
    NodeType::PRIORITY
        .into_iter()
        .find(|node_type| node_type.matches(selection))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinEntry {
    RemoveSelection,
}

impl BuiltinEntry {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinEntry::RemoveSelection => "remove_selection",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "remove_selection" => Some(BuiltinEntry::RemoveSelection),
            _ => None,
        }
    }

    pub fn button(self, translator: &dyn Translator) -> ButtonDescriptor {
        match self {
            BuiltinEntry::RemoveSelection => ButtonDescriptor::new(
                "remove_selection",
                IconName::Trash2,
                translator.translate("editor.remove"),
                |doc| {
                    let range = doc.selection().range;
                    doc.delete_range(range)
                },
            )
            .disabled_when(|doc| doc.selection().is_collapsed()),
        }
    }
}

/// Serialized as a plain string: `"divider"`, a built-in entry name, or
/// otherwise an extension name resolved through the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BubbleSymbol {
    Divider,
    Builtin(BuiltinEntry),
    Extension(String),
}

impl From<&str> for BubbleSymbol {
    fn from(value: &str) -> Self {
        if value == "divider" {
            return BubbleSymbol::Divider;
        }
        match BuiltinEntry::from_name(value) {
            Some(entry) => BubbleSymbol::Builtin(entry),
            None => BubbleSymbol::Extension(value.to_string()),
        }
    }
}

impl From<String> for BubbleSymbol {
    fn from(value: String) -> Self {
        BubbleSymbol::from(value.as_str())
    }
}

impl From<BubbleSymbol> for String {
    fn from(value: BubbleSymbol) -> Self {
        value.to_string()
    }
}

impl From<BuiltinEntry> for BubbleSymbol {
    fn from(value: BuiltinEntry) -> Self {
        BubbleSymbol::Builtin(value)
    }
}

impl fmt::Display for BubbleSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BubbleSymbol::Divider => f.write_str("divider"),
            BubbleSymbol::Builtin(entry) => f.write_str(entry.name()),
            BubbleSymbol::Extension(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BubbleMenuMap {
    entries: BTreeMap<NodeType, Vec<BubbleSymbol>>,
}

impl BubbleMenuMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, node_type: NodeType, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BubbleSymbol>,
    {
        self.entries
            .insert(node_type, symbols.into_iter().map(Into::into).collect());
        self
    }

    pub fn symbols(&self, node_type: NodeType) -> &[BubbleSymbol] {
        self.entries
            .get(&node_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn with_contributions(&self, registry: &ExtensionRegistry) -> Self {
        let mut merged = self.clone();
        for extension in registry.sorted() {
            for (node_type, symbols) in &extension.bubble_menu {
                merged
                    .entries
                    .entry(*node_type)
                    .or_default()
                    .extend(symbols.iter().cloned());
            }
        }
        merged
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct BubbleMenu {
    pub node_type: NodeType,
    pub entries: Vec<MenuEntry>,
}

pub struct BubbleMenuResolver {
    map: BubbleMenuMap,
    surfaces: SurfaceCoordinator,
}

impl BubbleMenuResolver {
    pub fn new(map: BubbleMenuMap, surfaces: SurfaceCoordinator) -> Self {
        Self { map, surfaces }
    }

    pub fn map(&self) -> &BubbleMenuMap {
        &self.map
    }

    pub fn resolve(
        &self,
        registry: &ExtensionRegistry,
        translator: &dyn Translator,
        doc: &dyn DocumentHost,
    ) -> Option<BubbleMenu> {
        if !self.surfaces.bubble_menu_allowed() {
            return None;
        }
        let node_type = classify(&doc.selection())?;
        let map = self.map.with_contributions(registry);

        let mut entries: Vec<MenuEntry> = Vec::new();
        for symbol in map.symbols(node_type) {
            match symbol {
                BubbleSymbol::Divider => entries.push(MenuEntry::Divider),
                BubbleSymbol::Builtin(entry) => entries.push(MenuEntry::Item(MenuItem {
                    extension: entry.name().to_string(),
                    button: entry.button(translator),
                    spacer: false,
                })),
                BubbleSymbol::Extension(name) => {
                    let Some(extension) = registry.get(name) else {
                        trace!(symbol = %name, "bubble symbol has no extension");
                        continue;
                    };
                    let Some(factory) = extension.bubble_factory() else {
                        continue;
                    };
                    match extension.build_buttons(factory, doc, translator) {
                        Ok(buttons) => {
                            entries.extend(buttons.into_iter().map(|button| {
                                MenuEntry::Item(MenuItem {
                                    extension: extension.name.clone(),
                                    button,
                                    spacer: false,
                                })
                            }));
                        }
                        Err(err) => {
                            warn!(extension = %extension.name, error = %err, "skipping bubble menu contribution");
                        }
                    }
                }
            }
        }

        let entries = tidy_dividers(entries);
        if entries.is_empty() {
            return None;
        }
        Some(BubbleMenu { node_type, entries })
    }
}
