use std::collections::{HashMap, HashSet};

use crate::constants::DEFAULT_IDF;
use crate::tokenizer::tokenize;

/// Word → inverse-document-frequency table.
///
/// Unseen words receive [`DEFAULT_IDF`] on first lookup and keep it until a
/// corpus update overwrites the entry. Entries are never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    weights: HashMap<String, f64>,
    corpus_size: usize,
}

impl IdfTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// IDF for `word`, memoizing the default for unseen words.
    pub fn weight(&mut self, word: &str) -> f64 {
        if let Some(w) = self.weights.get(word) {
            return *w;
        }
        self.weights.insert(word.to_string(), DEFAULT_IDF);
        DEFAULT_IDF
    }

    /// IDF for `word` without memoizing.
    pub fn peek(&self, word: &str) -> Option<f64> {
        self.weights.get(word).copied()
    }

    /// Recompute IDF from a reference corpus: `ln(total / df(word))` for every
    /// token appearing in at least one document. Entries for words absent
    /// from the corpus are left as they were.
    pub fn update<S: AsRef<str>>(&mut self, documents: &[S]) {
        if documents.is_empty() {
            return;
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: HashSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for token in unique {
                *document_frequency.entry(token).or_default() += 1;
            }
        }

        let total = documents.len() as f64;
        for (word, df) in &document_frequency {
            self.weights
                .insert(word.clone(), (total / *df as f64).ln());
        }
        self.corpus_size = documents.len();

        tracing::debug!(
            documents = documents.len(),
            words = document_frequency.len(),
            "updated IDF table"
        );
    }

    /// Number of documents in the most recent corpus update.
    pub fn corpus_size(&self) -> usize {
        self.corpus_size
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(w, v)| (w.as_str(), *v))
    }

    pub(crate) fn from_parts(weights: HashMap<String, f64>, corpus_size: usize) -> Self {
        Self {
            weights,
            corpus_size,
        }
    }
}
