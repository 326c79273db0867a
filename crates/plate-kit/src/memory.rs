use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

use serde::Serialize;
use serde_json::Value;

use crate::error::ActionError;
use crate::host::{DocumentHost, SelectionSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Snapshot {
    text: String,
    selection: Range<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryDocument {
    text: String,
    selection: Range<usize>,
    marks: BTreeSet<String>,
    link: Option<String>,
    node_kind: Option<String>,
    commands: Vec<(String, Option<Value>)>,
    #[serde(skip)]
    disabled: HashSet<String>,
    #[serde(skip)]
    rejected: HashSet<String>,
    #[serde(skip)]
    undo_stack: Vec<Snapshot>,
    #[serde(skip)]
    redo_stack: Vec<Snapshot>,
}

impl MemoryDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let end = text.len();
        Self {
            text,
            selection: end..end,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn commands(&self) -> &[(String, Option<Value>)] {
        &self.commands
    }

    pub fn command_ids(&self) -> Vec<&str> {
        self.commands.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn select(&mut self, range: Range<usize>) {
        self.selection = self.clamp(range);
    }

    pub fn select_text(&mut self, needle: &str) -> bool {
        match self.text.find(needle) {
            Some(start) => {
                self.selection = start..start + needle.len();
                true
            }
            None => false,
        }
    }

    pub fn select_all(&mut self) {
        self.selection = 0..self.text.len();
    }

    pub fn set_mark(&mut self, mark: &str, on: bool) {
        if on {
            self.marks.insert(mark.to_string());
        } else {
            self.marks.remove(mark);
        }
    }

    pub fn set_link(&mut self, href: Option<&str>) {
        self.link = href.map(str::to_string);
    }

    pub fn set_node_kind(&mut self, kind: Option<&str>) {
        self.node_kind = kind.map(str::to_string);
    }

    pub fn disable(&mut self, id: &str) {
        self.disabled.insert(id.to_string());
    }

    pub fn enable(&mut self, id: &str) {
        self.disabled.remove(id);
    }

    pub fn reject(&mut self, id: &str) {
        self.rejected.insert(id.to_string());
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn check(&self, id: &str) -> Result<(), ActionError> {
        if self.rejected.contains(id) {
            return Err(ActionError::new(format!("Transaction rejected: {id}")));
        }
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            selection: self.selection.clone(),
        }
    }

    fn record(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.text = snapshot.text;
        self.selection = snapshot.selection;
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let start = clamp_to_char_boundary(&self.text, range.start);
        let end = clamp_to_char_boundary(&self.text, range.end).max(start);
        start..end
    }

    fn toggle_mark(&mut self, mark: &str) {
        let on = !self.marks.contains(mark);
        self.set_mark(mark, on);
    }
}

impl DocumentHost for MemoryDocument {
    fn selection(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            range: self.selection.clone(),
            text: self.text[self.selection.clone()].to_string(),
            marks: self.marks.iter().cloned().collect(),
            link: self.link.clone(),
            node_kind: self.node_kind.clone(),
        }
    }

    fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), ActionError> {
        self.check(id)?;
        if !self.can_run(id) {
            return Err(ActionError::new(format!("Command unavailable: {id}")));
        }
        match id {
            "history.undo" => {
                if let Some(snapshot) = self.undo_stack.pop() {
                    let current = self.snapshot();
                    self.redo_stack.push(current);
                    self.restore(snapshot);
                }
            }
            "history.redo" => {
                if let Some(snapshot) = self.redo_stack.pop() {
                    let current = self.snapshot();
                    self.undo_stack.push(current);
                    self.restore(snapshot);
                }
            }
            "link.unset" => {
                self.link = None;
                self.marks.remove("link");
            }
            _ => {
                if let Some(mark) = id.strip_prefix("marks.toggle_") {
                    self.toggle_mark(mark);
                }
            }
        }
        self.commands.push((id.to_string(), args));
        Ok(())
    }

    fn can_run(&self, id: &str) -> bool {
        if self.disabled.contains(id) {
            return false;
        }
        match id {
            "history.undo" => self.can_undo(),
            "history.redo" => self.can_redo(),
            _ => true,
        }
    }

    fn replace_selection(&mut self, text: &str) -> Result<(), ActionError> {
        self.check("replace_selection")?;
        self.record();
        let range = self.selection.clone();
        self.text.replace_range(range.clone(), text);
        self.selection = range.start..range.start + text.len();
        Ok(())
    }

    fn insert_after_selection(&mut self, text: &str) -> Result<(), ActionError> {
        self.check("insert_after_selection")?;
        self.record();
        let at = self.selection.end;
        self.text.insert_str(at, text);
        self.selection = at..at + text.len();
        Ok(())
    }

    fn delete_range(&mut self, range: Range<usize>) -> Result<(), ActionError> {
        self.check("delete_range")?;
        let range = self.clamp(range);
        if range.is_empty() {
            return Ok(());
        }
        self.record();
        self.text.replace_range(range.clone(), "");
        let removed = range.end - range.start;
        let shift = |offset: usize| {
            if offset <= range.start {
                offset
            } else if offset >= range.end {
                offset - removed
            } else {
                range.start
            }
        };
        self.selection = shift(self.selection.start)..shift(self.selection.end);
        Ok(())
    }
}

fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
