use tracing::warn;

use crate::error::{ActionError, ContributionError};
use crate::extension::{ButtonDescriptor, EntryView, MenuEntry, tidy_dividers};
use crate::host::{DocumentHost, Translator};
use crate::registry::ExtensionRegistry;

#[derive(Debug, Clone, Default)]
pub struct Toolbar {
    entries: Vec<MenuEntry>,
    skipped: Vec<ContributionError>,
}

impl Toolbar {
    pub fn compose(
        registry: &ExtensionRegistry,
        translator: &dyn Translator,
        doc: &dyn DocumentHost,
    ) -> Self {
        let mut entries: Vec<MenuEntry> = Vec::new();
        let mut skipped: Vec<ContributionError> = Vec::new();

        for extension in registry.sorted() {
            let Some(factory) = extension.toolbar_factory() else {
                continue;
            };
            match extension.build_buttons(factory, doc, translator) {
                Ok(buttons) => entries.extend(extension.expand_entries(buttons)),
                Err(err) => {
                    warn!(extension = %extension.name, error = %err, "skipping toolbar contribution");
                    skipped.push(err);
                }
            }
        }

        Self {
            entries: tidy_dividers(entries),
            skipped,
        }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<MenuEntry> {
        self.entries
    }

    pub fn skipped(&self) -> &[ContributionError] {
        &self.skipped
    }

    pub fn render(&self, doc: &dyn DocumentHost) -> Vec<EntryView> {
        self.entries.iter().map(|entry| entry.view(doc)).collect()
    }

    pub fn find(&self, id: &str) -> Option<&ButtonDescriptor> {
        self.entries
            .iter()
            .filter_map(MenuEntry::button)
            .find(|button| button.id == id)
    }

    pub fn trigger(&self, id: &str, doc: &mut dyn DocumentHost) -> Result<bool, ActionError> {
        match self.find(id) {
            Some(button) => button.run(doc),
            None => Ok(false),
        }
    }

    pub fn handle_shortcut(
        &self,
        keys: &[&str],
        doc: &mut dyn DocumentHost,
    ) -> Option<Result<bool, ActionError>> {
        let wanted = normalize_chord(keys.iter().copied());
        if wanted.is_empty() {
            return None;
        }
        let button = self
            .entries
            .iter()
            .filter_map(MenuEntry::button)
            .find(|button| normalize_chord(button.shortcut_keys.iter().map(String::as_str)) == wanted)?;
        Some(button.run(doc))
    }
}

pub fn compose_toolbar(
    registry: &ExtensionRegistry,
    translator: &dyn Translator,
    doc: &dyn DocumentHost,
) -> Vec<MenuEntry> {
    Toolbar::compose(registry, translator, doc).into_entries()
}

fn normalize_chord<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut keys: Vec<String> = keys.map(|k| k.trim().to_lowercase()).collect();
    keys.sort();
    keys
}
