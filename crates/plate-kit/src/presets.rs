use serde::{Deserialize, Serialize};

use crate::palette::Cursor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutPreset {
    pub label: String,
    pub prompt: String,
}

impl ShortcutPreset {
    pub fn new(label: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetItem {
    Category {
        label: String,
        children: Vec<PresetItem>,
    },
    Preset(ShortcutPreset),
}

impl PresetItem {
    pub fn label(&self) -> &str {
        match self {
            PresetItem::Category { label, .. } => label,
            PresetItem::Preset(preset) => &preset.label,
        }
    }

    fn category(label: &str, children: Vec<PresetItem>) -> Self {
        PresetItem::Category {
            label: label.to_string(),
            children,
        }
    }

    fn preset(label: &str, prompt: &str) -> Self {
        PresetItem::Preset(ShortcutPreset::new(label, prompt))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetGroup {
    pub title: String,
    pub items: Vec<PresetItem>,
}

impl PresetGroup {
    pub fn new(title: impl Into<String>, items: Vec<PresetItem>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }
}

pub fn default_presets() -> Vec<PresetGroup> {
    let tones = [
        ("Professional", "professional"),
        ("Casual", "casual"),
        ("Straightforward", "straightforward"),
        ("Confident", "confident"),
        ("Friendly", "friendly"),
    ]
    .into_iter()
    .map(|(label, tone)| {
        PresetItem::Preset(ShortcutPreset::new(
            label,
            format!("Rewrite the text in a {tone} tone. Keep the original language and meaning."),
        ))
    })
    .collect();

    let styles = [
        ("Business", "business"),
        ("Legal", "legal"),
        ("Journalism", "journalistic"),
        ("Poetics", "poetic"),
        ("Academic", "academic"),
    ]
    .into_iter()
    .map(|(label, style)| {
        PresetItem::Preset(ShortcutPreset::new(
            label,
            format!("Rewrite the text in a {style} writing style. Keep the original language."),
        ))
    })
    .collect();

    let languages = [
        "English",
        "Chinese",
        "Japanese",
        "Korean",
        "Spanish",
        "French",
        "German",
        "Russian",
    ]
    .into_iter()
    .map(|language| {
        PresetItem::Preset(ShortcutPreset::new(
            language,
            format!("Translate the text into {language}. Only output the translation."),
        ))
    })
    .collect();

    vec![
        PresetGroup::new(
            "Edit or review selection",
            vec![
                PresetItem::preset(
                    "Improve writing",
                    "Improve the writing of the text. Keep the original language.",
                ),
                PresetItem::preset(
                    "Fix spelling & grammar",
                    "Fix the spelling and grammar mistakes in the text. Keep the original language.",
                ),
                PresetItem::preset(
                    "Make shorter",
                    "Make the text shorter while keeping its meaning. Keep the original language.",
                ),
                PresetItem::preset(
                    "Make longer",
                    "Make the text longer with more detail. Keep the original language.",
                ),
                PresetItem::preset(
                    "Simplify language",
                    "Rewrite the text with simpler words and sentences. Keep the original language.",
                ),
                PresetItem::category("Change tone", tones),
                PresetItem::category("Change style", styles),
            ],
        ),
        PresetGroup::new(
            "Use AI to do more",
            vec![
                PresetItem::preset(
                    "Summarize",
                    "Summarize the text in a few sentences. Keep the original language.",
                ),
                PresetItem::preset(
                    "Continue writing",
                    "Continue writing after the text in the same voice. Keep the original language.",
                ),
                PresetItem::preset(
                    "Explain",
                    "Explain what the text means in plain words. Keep the original language.",
                ),
                PresetItem::category("Translate", languages),
            ],
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetSelection {
    Picked(ShortcutPreset),
    Opened { label: String },
}

#[derive(Debug, Clone)]
struct Level {
    label: Option<String>,
    groups: Vec<PresetGroup>,
}

#[derive(Debug, Clone)]
pub struct PresetPalette {
    levels: Vec<Level>,
    visible: Vec<PresetGroup>,
    query: String,
    cursor: Cursor,
}

impl PresetPalette {
    pub fn new(groups: Vec<PresetGroup>) -> Self {
        Self {
            visible: groups.clone(),
            levels: vec![Level {
                label: None,
                groups,
            }],
            query: String::new(),
            cursor: Cursor::default(),
        }
    }

    pub fn visible(&self) -> &[PresetGroup] {
        &self.visible
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn current_category(&self) -> Option<&str> {
        self.levels.last().and_then(|level| level.label.as_deref())
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.refilter();
    }

    pub fn move_down(&mut self) {
        self.cursor = self.cursor.down(&self.lens());
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.up(&self.lens());
    }

    pub fn hover(&mut self, cursor: Cursor) -> bool {
        if !cursor.is_valid(&self.lens()) {
            return false;
        }
        self.cursor = cursor;
        true
    }

    pub fn selected(&self) -> Option<&PresetItem> {
        self.visible
            .get(self.cursor.group)
            .and_then(|group| group.items.get(self.cursor.command))
    }

    pub fn enter(&mut self) -> Option<PresetSelection> {
        match self.selected()?.clone() {
            PresetItem::Preset(preset) => Some(PresetSelection::Picked(preset)),
            PresetItem::Category { label, children } => {
                self.levels.push(Level {
                    label: Some(label.clone()),
                    groups: vec![PresetGroup::new(label.clone(), children)],
                });
                self.query.clear();
                self.refilter();
                Some(PresetSelection::Opened { label })
            }
        }
    }

    pub fn back(&mut self) -> bool {
        if self.levels.len() <= 1 {
            return false;
        }
        self.levels.pop();
        self.query.clear();
        self.refilter();
        true
    }

    fn refilter(&mut self) {
        let query = self.query.trim().to_lowercase();
        let groups = self
            .levels
            .last()
            .map(|level| level.groups.as_slice())
            .unwrap_or(&[]);
        self.visible = groups
            .iter()
            .filter_map(|group| {
                let items: Vec<PresetItem> = group
                    .items
                    .iter()
                    .filter(|item| query.is_empty() || item.label().to_lowercase().starts_with(&query))
                    .cloned()
                    .collect();
                (!items.is_empty()).then(|| PresetGroup::new(group.title.clone(), items))
            })
            .collect();
        self.cursor = Cursor::default();
    }

    fn lens(&self) -> Vec<usize> {
        self.visible.iter().map(|g| g.items.len()).collect()
    }
}

impl Default for PresetPalette {
    fn default() -> Self {
        Self::new(default_presets())
    }
}
