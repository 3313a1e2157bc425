use std::fmt;

use crate::context::{NavigationParameter, TargetId};

/// One remembered navigation: where it went and what it carried.
#[derive(Clone)]
pub struct JournalEntry {
    pub target: TargetId,
    pub parameter: Option<NavigationParameter>,
}

impl JournalEntry {
    pub fn new(target: impl Into<TargetId>, parameter: Option<NavigationParameter>) -> Self {
        Self {
            target: target.into(),
            parameter,
        }
    }
}

impl fmt::Debug for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JournalEntry")
            .field("target", &self.target)
            .field("has_parameter", &self.parameter.is_some())
            .finish()
    }
}

/// How a committed navigation moves the journal cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JournalMove {
    Push,
    Replace,
    Back,
    Forward,
}

/// Back/forward history kept by stack-mode regions.
#[derive(Debug, Clone, Default)]
pub struct NavigationJournal {
    back: Vec<JournalEntry>,
    current: Option<JournalEntry>,
    forward: Vec<JournalEntry>,
}

impl NavigationJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&JournalEntry> {
        self.current.as_ref()
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Oldest first.
    pub fn back_entries(&self) -> &[JournalEntry] {
        &self.back
    }

    /// Nearest last.
    pub fn forward_entries(&self) -> &[JournalEntry] {
        &self.forward
    }

    pub(crate) fn peek_back(&self) -> Option<&JournalEntry> {
        self.back.last()
    }

    pub(crate) fn peek_forward(&self) -> Option<&JournalEntry> {
        self.forward.last()
    }

    pub(crate) fn record(&mut self, entry: JournalEntry, movement: JournalMove) {
        match movement {
            JournalMove::Push => {
                if let Some(current) = self.current.take() {
                    self.back.push(current);
                }
                self.forward.clear();
            }
            JournalMove::Replace => {}
            JournalMove::Back => {
                self.back.pop();
                if let Some(current) = self.current.take() {
                    self.forward.push(current);
                }
            }
            JournalMove::Forward => {
                self.forward.pop();
                if let Some(current) = self.current.take() {
                    self.back.push(current);
                }
            }
        }
        self.current = Some(entry);
    }

    pub fn clear(&mut self) {
        self.back.clear();
        self.current = None;
        self.forward.clear();
    }
}
