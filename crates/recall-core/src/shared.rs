use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::similarity::{Document, SimilarItem};
use crate::vectorizer::{Embedding, Vectorizer};

/// A [`Vectorizer`] behind a single lock, cloneable across threads.
///
/// Embedding mutates both caches lazily, so every operation takes the lock.
#[derive(Debug, Clone, Default)]
pub struct SharedVectorizer {
    inner: Arc<Mutex<Vectorizer>>,
}

impl From<Vectorizer> for SharedVectorizer {
    fn from(vectorizer: Vectorizer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vectorizer)),
        }
    }
}

impl SharedVectorizer {
    pub fn new(dimension: usize) -> Self {
        Vectorizer::new(dimension).into()
    }

    fn lock(&self) -> MutexGuard<'_, Vectorizer> {
        // A panic mid-embed leaves at worst an extra cached entry.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn embed(&self, text: &str) -> Embedding {
        self.lock().embed(text)
    }

    pub fn update_idf<S: AsRef<str>>(&self, documents: &[S]) {
        self.lock().update_idf(documents)
    }

    pub fn find_similar(&self, query: &str, items: &[Document], top_k: usize) -> Result<Vec<SimilarItem>> {
        self.lock().find_similar(query, items, top_k)
    }

    pub fn serialize(&self) -> Result<String> {
        self.lock().serialize()
    }

    pub fn deserialize(&self, payload: &str) -> Result<()> {
        self.lock().deserialize(payload)
    }

    pub fn dimension(&self) -> usize {
        self.lock().dimension()
    }

    /// Run `f` with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut Vectorizer) -> R) -> R {
        f(&mut self.lock())
    }
}
