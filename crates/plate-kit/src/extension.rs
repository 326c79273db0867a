use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::bubble_menu::{BubbleSymbol, NodeType};
use crate::error::{ActionError, ContributionError};
use crate::host::{DocumentHost, Translator};
use crate::icon::IconName;
use crate::palette::CommandGroup;

pub const DEFAULT_SORT_KEY: i32 = -1;

pub type ActionFn = Arc<dyn Fn(&mut dyn DocumentHost) -> Result<(), ActionError> + Send + Sync>;
pub type PredicateFn = Arc<dyn Fn(&dyn DocumentHost) -> bool + Send + Sync>;
pub type ButtonFactory =
    Arc<dyn Fn(&ButtonContext<'_>) -> Result<ButtonSet, ContributionError> + Send + Sync>;

/// `action` stays bound for the lifetime of the composed menu, so it must be
/// safe to call any number of times.
#[derive(Clone)]
pub struct ButtonDescriptor {
    pub id: String,
    pub icon: IconName,
    pub title: String,
    pub tooltip: String,
    pub shortcut_keys: Vec<String>,
    pub action: ActionFn,
    pub is_active: PredicateFn,
    pub disabled: PredicateFn,
}

impl ButtonDescriptor {
    pub fn new(
        id: impl Into<String>,
        icon: IconName,
        title: impl Into<String>,
        action: impl Fn(&mut dyn DocumentHost) -> Result<(), ActionError> + Send + Sync + 'static,
    ) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            icon,
            tooltip: title.clone(),
            title,
            shortcut_keys: Vec::new(),
            action: Arc::new(action),
            is_active: Arc::new(|_| false),
            disabled: Arc::new(|_| false),
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn shortcut_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shortcut_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn active_when(
        mut self,
        predicate: impl Fn(&dyn DocumentHost) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_active = Arc::new(predicate);
        self
    }

    pub fn disabled_when(
        mut self,
        predicate: impl Fn(&dyn DocumentHost) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.disabled = Arc::new(predicate);
        self
    }

    pub fn is_active(&self, doc: &dyn DocumentHost) -> bool {
        (self.is_active)(doc)
    }

    pub fn is_disabled(&self, doc: &dyn DocumentHost) -> bool {
        (self.disabled)(doc)
    }

    pub fn run(&self, doc: &mut dyn DocumentHost) -> Result<bool, ActionError> {
        if self.is_disabled(doc) {
            return Ok(false);
        }
        (self.action)(doc)?;
        Ok(true)
    }
}

impl fmt::Debug for ButtonDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonDescriptor")
            .field("id", &self.id)
            .field("icon", &self.icon)
            .field("title", &self.title)
            .field("shortcut_keys", &self.shortcut_keys)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum ButtonSet {
    Single(ButtonDescriptor),
    Many(Vec<ButtonDescriptor>),
}

impl ButtonSet {
    pub fn into_vec(self) -> Vec<ButtonDescriptor> {
        match self {
            ButtonSet::Single(button) => vec![button],
            ButtonSet::Many(buttons) => buttons,
        }
    }
}

impl From<ButtonDescriptor> for ButtonSet {
    fn from(value: ButtonDescriptor) -> Self {
        ButtonSet::Single(value)
    }
}

impl From<Vec<ButtonDescriptor>> for ButtonSet {
    fn from(value: Vec<ButtonDescriptor>) -> Self {
        ButtonSet::Many(value)
    }
}

pub struct ButtonContext<'a> {
    pub document: &'a dyn DocumentHost,
    pub extension: &'a Extension,
    pub translator: &'a dyn Translator,
}

impl ButtonContext<'_> {
    pub fn t(&self, key: &str) -> String {
        self.translator.translate(key)
    }

    pub fn fail(&self, message: impl Into<String>) -> ContributionError {
        ContributionError::failed(self.extension.name.clone(), message)
    }
}

#[derive(Clone)]
pub struct Extension {
    pub name: String,
    pub sort_key: i32,
    pub has_divider: bool,
    pub has_spacer: bool,
    pub toolbar: bool,
    pub button: Option<ButtonFactory>,
    pub bubble_button: Option<ButtonFactory>,
    pub bubble_menu: Vec<(NodeType, Vec<BubbleSymbol>)>,
    pub slash_commands: Vec<CommandGroup>,
    pub options: Map<String, Value>,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort_key: DEFAULT_SORT_KEY,
            has_divider: false,
            has_spacer: false,
            toolbar: true,
            button: None,
            bubble_button: None,
            bubble_menu: Vec::new(),
            slash_commands: Vec::new(),
            options: Map::new(),
        }
    }

    pub fn sort_key(mut self, sort_key: i32) -> Self {
        self.sort_key = sort_key;
        self
    }

    pub fn divider(mut self, has_divider: bool) -> Self {
        self.has_divider = has_divider;
        self
    }

    pub fn spacer(mut self, has_spacer: bool) -> Self {
        self.has_spacer = has_spacer;
        self
    }

    pub fn toolbar(mut self, toolbar: bool) -> Self {
        self.toolbar = toolbar;
        self
    }

    pub fn button(
        mut self,
        factory: impl Fn(&ButtonContext<'_>) -> Result<ButtonSet, ContributionError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.button = Some(Arc::new(factory));
        self
    }

    pub fn bubble_button(
        mut self,
        factory: impl Fn(&ButtonContext<'_>) -> Result<ButtonSet, ContributionError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.bubble_button = Some(Arc::new(factory));
        self
    }

    pub fn bubble_menu<I, S>(mut self, node_type: NodeType, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BubbleSymbol>,
    {
        self.bubble_menu
            .push((node_type, symbols.into_iter().map(Into::into).collect()));
        self
    }

    pub fn slash_commands(mut self, groups: impl IntoIterator<Item = CommandGroup>) -> Self {
        self.slash_commands.extend(groups);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn get_option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub(crate) fn toolbar_factory(&self) -> Option<&ButtonFactory> {
        if !self.toolbar {
            return None;
        }
        self.button.as_ref()
    }

    pub(crate) fn bubble_factory(&self) -> Option<&ButtonFactory> {
        self.bubble_button.as_ref().or(self.button.as_ref())
    }

    pub(crate) fn build_buttons(
        &self,
        factory: &ButtonFactory,
        document: &dyn DocumentHost,
        translator: &dyn Translator,
    ) -> Result<Vec<ButtonDescriptor>, ContributionError> {
        let ctx = ButtonContext {
            document,
            extension: self,
            translator,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| factory(&ctx))) {
            Ok(result) => result.map(ButtonSet::into_vec),
            Err(_) => Err(ContributionError::Panicked {
                extension: self.name.clone(),
            }),
        }
    }

    pub(crate) fn expand_entries(&self, buttons: Vec<ButtonDescriptor>) -> Vec<MenuEntry> {
        let last = buttons.len().saturating_sub(1);
        let mut entries = Vec::with_capacity(buttons.len() + 1);
        for (ix, button) in buttons.into_iter().enumerate() {
            entries.push(MenuEntry::Item(MenuItem {
                extension: self.name.clone(),
                button,
                spacer: self.has_spacer && ix == 0,
            }));
            if self.has_divider && ix == last {
                entries.push(MenuEntry::Divider);
            }
        }
        entries
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("sort_key", &self.sort_key)
            .field("has_divider", &self.has_divider)
            .field("has_spacer", &self.has_spacer)
            .field("toolbar", &self.toolbar)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub extension: String,
    pub button: ButtonDescriptor,
    pub spacer: bool,
}

#[derive(Debug, Clone)]
pub enum MenuEntry {
    Item(MenuItem),
    Divider,
}

impl MenuEntry {
    pub fn is_divider(&self) -> bool {
        matches!(self, MenuEntry::Divider)
    }

    pub fn button(&self) -> Option<&ButtonDescriptor> {
        match self {
            MenuEntry::Item(item) => Some(&item.button),
            MenuEntry::Divider => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.button().map(|b| b.id.as_str())
    }

    pub fn view(&self, doc: &dyn DocumentHost) -> EntryView {
        match self {
            MenuEntry::Divider => EntryView::Divider,
            MenuEntry::Item(item) => EntryView::Item {
                id: item.button.id.clone(),
                icon: item.button.icon,
                title: item.button.title.clone(),
                tooltip: item.button.tooltip.clone(),
                shortcut_keys: item.button.shortcut_keys.clone(),
                active: item.button.is_active(doc),
                disabled: item.button.is_disabled(doc),
                spacer: item.spacer,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryView {
    Item {
        id: String,
        icon: IconName,
        title: String,
        tooltip: String,
        shortcut_keys: Vec<String>,
        active: bool,
        disabled: bool,
        spacer: bool,
    },
    Divider,
}

pub fn tidy_dividers(entries: impl IntoIterator<Item = MenuEntry>) -> Vec<MenuEntry> {
    let mut out: Vec<MenuEntry> = Vec::new();
    for entry in entries {
        if entry.is_divider() && out.last().is_none_or(MenuEntry::is_divider) {
            continue;
        }
        out.push(entry);
    }
    while out.last().is_some_and(MenuEntry::is_divider) {
        out.pop();
    }
    out
}
