use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::error::ActionError;
use crate::host::DocumentHost;
use crate::icon::IconName;

pub type CommandAction =
    Arc<dyn Fn(&mut dyn DocumentHost, Option<Range<usize>>) -> Result<(), ActionError> + Send + Sync>;
pub type HiddenFn = Arc<dyn Fn(&dyn DocumentHost) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub label: String,
    pub aliases: Vec<String>,
    pub icon: IconName,
    pub shortcut: Option<String>,
    pub hidden: Option<HiddenFn>,
    pub action: CommandAction,
}

impl Command {
    /// `action` receives the span that opened the palette, if any. The
    /// dispatcher has already removed that span when the action runs, so
    /// `range.start` is where the command's own content belongs.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        icon: IconName,
        action: impl Fn(&mut dyn DocumentHost, Option<Range<usize>>) -> Result<(), ActionError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            aliases: Vec::new(),
            icon,
            shortcut: None,
            hidden: None,
            action: Arc::new(action),
        }
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    pub fn hidden_when(
        mut self,
        predicate: impl Fn(&dyn DocumentHost) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.hidden = Some(Arc::new(predicate));
        self
    }

    pub fn is_hidden(&self, doc: &dyn DocumentHost) -> bool {
        self.hidden.as_ref().is_some_and(|hidden| hidden(doc))
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        std::iter::once(&self.label)
            .chain(std::iter::once(&self.name))
            .chain(self.aliases.iter())
            .any(|candidate| candidate.to_lowercase().starts_with(&query))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("aliases", &self.aliases)
            .field("icon", &self.icon)
            .field("shortcut", &self.shortcut)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct CommandGroup {
    pub name: String,
    pub title: String,
    pub commands: Vec<Command>,
}

impl CommandGroup {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        commands: impl IntoIterator<Item = Command>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            commands: commands.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub group: usize,
    pub command: usize,
}

impl Cursor {
    pub fn new(group: usize, command: usize) -> Self {
        Self { group, command }
    }

    pub fn is_valid(self, lens: &[usize]) -> bool {
        lens.get(self.group).is_some_and(|&len| self.command < len)
    }

    pub fn down(self, lens: &[usize]) -> Self {
        if lens.is_empty() || self.group >= lens.len() {
            return Self::default();
        }
        let command = self.command + 1;
        if command < lens[self.group] {
            return Self::new(self.group, command);
        }
        let group = self.group + 1;
        if group < lens.len() {
            Self::new(group, 0)
        } else {
            Self::default()
        }
    }

    pub fn up(self, lens: &[usize]) -> Self {
        if lens.is_empty() || self.group >= lens.len() {
            return Self::default();
        }
        if self.command > 0 {
            return Self::new(self.group, self.command - 1);
        }
        let group = match self.group.checked_sub(1) {
            Some(group) => group,
            None => lens.len() - 1,
        };
        Self::new(group, lens[group].saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Ran { name: String },
    Hidden { name: String },
    Empty,
}

pub struct CommandPalette {
    groups: Vec<CommandGroup>,
    visible: Vec<CommandGroup>,
    query: String,
    cursor: Cursor,
    trigger: Option<Range<usize>>,
    max_per_group: usize,
}

impl CommandPalette {
    pub fn new(
        groups: Vec<CommandGroup>,
        trigger: Option<Range<usize>>,
        doc: &dyn DocumentHost,
    ) -> Self {
        let mut palette = Self {
            groups,
            visible: Vec::new(),
            query: String::new(),
            cursor: Cursor::default(),
            trigger,
            max_per_group: 0,
        };
        palette.set_query("", doc);
        palette
    }

    pub fn max_per_group(mut self, max: usize) -> Self {
        self.max_per_group = max;
        self.visible = self.cap(self.visible.clone());
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn trigger(&self) -> Option<Range<usize>> {
        self.trigger.clone()
    }

    pub fn visible(&self) -> &[CommandGroup] {
        &self.visible
    }

    pub fn set_query(&mut self, query: impl Into<String>, doc: &dyn DocumentHost) {
        self.query = query.into();
        let filtered = self
            .groups
            .iter()
            .filter_map(|group| {
                let commands: Vec<Command> = group
                    .commands
                    .iter()
                    .filter(|command| command.matches(&self.query) && !command.is_hidden(doc))
                    .cloned()
                    .collect();
                (!commands.is_empty()).then(|| CommandGroup {
                    name: group.name.clone(),
                    title: group.title.clone(),
                    commands,
                })
            })
            .collect();
        self.visible = self.cap(filtered);
        self.cursor = Cursor::default();
    }

    pub fn set_items(&mut self, groups: Vec<CommandGroup>) {
        self.visible = self.cap(groups);
        self.cursor = Cursor::default();
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

    pub fn selected(&self) -> Option<&Command> {
        self.visible
            .get(self.cursor.group)
            .and_then(|group| group.commands.get(self.cursor.command))
    }

    pub fn enter(&mut self, doc: &mut dyn DocumentHost) -> Result<Dispatch, ActionError> {
        let Some(command) = self.selected().cloned() else {
            return Ok(Dispatch::Empty);
        };
        if command.is_hidden(doc) {
            debug!(command = %command.name, "refusing to dispatch hidden command");
            return Ok(Dispatch::Hidden { name: command.name });
        }
        if let Some(range) = self.trigger.clone() {
            doc.delete_range(range)?;
        }
        let trigger = self.trigger.take();
        (command.action)(doc, trigger)?;
        debug!(command = %command.name, "dispatched palette command");
        Ok(Dispatch::Ran { name: command.name })
    }

    pub fn click(
        &mut self,
        cursor: Cursor,
        doc: &mut dyn DocumentHost,
    ) -> Result<Dispatch, ActionError> {
        if !self.hover(cursor) {
            return Ok(Dispatch::Empty);
        }
        self.enter(doc)
    }

    fn lens(&self) -> Vec<usize> {
        self.visible.iter().map(|g| g.commands.len()).collect()
    }

    fn cap(&self, mut groups: Vec<CommandGroup>) -> Vec<CommandGroup> {
        if self.max_per_group > 0 {
            for group in &mut groups {
                group.commands.truncate(self.max_per_group);
            }
        }
        groups
    }
}
