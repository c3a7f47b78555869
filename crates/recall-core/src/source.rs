//! Document-source boundary.
//!
//! The engine never performs I/O itself. Callers resolve notes through a
//! [`NoteSource`] (or read them however they like, possibly concurrently) and
//! hand the per-note results to the assembler. A failed read is a
//! [`RecallError::UnreadableDocument`] and is skipped, never fatal.

use serde::{Deserialize, Serialize};

use crate::error::{RecallError, Result};
use crate::similarity::Document;
use crate::tokenizer::word_count;

/// A resolved document with display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Last modification time, seconds since the Unix epoch.
    #[serde(default)]
    pub modified: u64,
}

impl Note {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            modified: 0,
        }
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.body)
    }
}

impl From<&Note> for Document {
    fn from(note: &Note) -> Self {
        Document::new(note.id.clone(), format!("{}\n{}", note.title, note.body))
    }
}

/// Outcome of reading one note.
pub type NoteRead = Result<Note>;

/// Resolves notes by id.
pub trait NoteSource {
    fn read_note(&self, id: &str) -> NoteRead;

    /// Every id the source can resolve, in a stable order.
    fn list_ids(&self) -> Vec<String>;

    /// Read each id independently; failures stay in their slot.
    fn read_many(&self, ids: &[String]) -> Vec<NoteRead> {
        ids.iter().map(|id| self.read_note(id)).collect()
    }
}

/// In-memory note source, insertion ordered.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    notes: Vec<Note>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a note by id.
    pub fn insert(&mut self, note: Note) {
        match self.notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl FromIterator<Note> for MemorySource {
    fn from_iter<I: IntoIterator<Item = Note>>(iter: I) -> Self {
        let mut source = MemorySource::new();
        for note in iter {
            source.insert(note);
        }
        source
    }
}

impl NoteSource for MemorySource {
    fn read_note(&self, id: &str) -> NoteRead {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| RecallError::unreadable(id, "no such note"))
    }

    fn list_ids(&self) -> Vec<String> {
        self.notes.iter().map(|n| n.id.clone()).collect()
    }
}
