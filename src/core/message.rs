//! Purpose: In-memory containers for ordinary messages and the single alert.
//! Exports: `Message`, `MessageSequence`, `AlertSlot`.
//! Role: Leaf data model composed by `CastStore`.
//! Invariants: `MessageSequence` is FIFO; appends go to the tail, deletes come off the head.
//! Invariants: `AlertSlot` holds zero or one alert; setting replaces, clearing saturates at 1.
use std::collections::VecDeque;

use serde::Serialize;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Message {
    pub text: String,
    pub is_alert: bool,
    /// Only meaningful when `is_alert` is set.
    pub exit_on_alert: bool,
}

impl Message {
    pub fn ordinary(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_alert: false,
            exit_on_alert: false,
        }
    }

    pub fn alert(text: impl Into<String>, exit_on_alert: bool) -> Self {
        Self {
            text: text.into(),
            is_alert: true,
            exit_on_alert,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageSequence {
    entries: VecDeque<Message>,
}

impl MessageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty text is accepted and stored as-is.
    pub fn append(&mut self, text: impl Into<String>) {
        self.entries.push_back(Message::ordinary(text));
    }

    /// Removes up to `n` messages from the head and returns how many were removed.
    pub fn delete_oldest(&mut self, n: usize) -> usize {
        let count = n.min(self.entries.len());
        self.entries.drain(..count);
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|msg| msg.text.as_str()).collect()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlertSlot {
    current: Option<Message>,
}

impl AlertSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, text: impl Into<String>, exit_on_alert: bool) {
        self.current = Some(Message::alert(text, exit_on_alert));
    }

    /// The requested count is ignored; at most one alert can ever be removed.
    pub fn clear(&mut self, _n: usize) -> usize {
        match self.current.take() {
            Some(_) => 1,
            None => 0,
        }
    }

    pub fn get(&self) -> Option<&Message> {
        self.current.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }
}
