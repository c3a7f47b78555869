use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::error::{RecallError, Result};
use crate::vectorizer::{Embedding, Vectorizer};

/// A rankable item. The engine reads it and never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    /// Precomputed embedding; computed on demand when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// One ranked result from [`find_similar`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarItem {
    pub id: String,
    pub score: f64,
    /// Position of the item in the input slice.
    pub index: usize,
}

/// Cosine similarity in `[-1, 1]`.
///
/// Fails with [`RecallError::DimensionMismatch`] when lengths differ; returns
/// `0.0` when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(RecallError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < EPSILON {
        return Ok(0.0);
    }
    Ok((dot / denom).clamp(-1.0, 1.0))
}

/// Rank items by cosine similarity to a query embedding.
///
/// Sorted by score descending; ties keep input order. At most `top_k` results.
pub fn rank_by_vector(
    vectorizer: &mut Vectorizer,
    query_vec: &[f64],
    items: &[Document],
    top_k: usize,
) -> Result<Vec<SimilarItem>> {
    let mut ranked = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let score = match &item.embedding {
            Some(embedding) => cosine_similarity(query_vec, embedding)?,
            None => cosine_similarity(query_vec, &vectorizer.embed(&item.text))?,
        };
        ranked.push(SimilarItem {
            id: item.id.clone(),
            score,
            index,
        });
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_k);
    Ok(ranked)
}

/// Embed `query` once and rank `items` against it, returning the best `top_k`.
pub fn find_similar(
    vectorizer: &mut Vectorizer,
    query: &str,
    items: &[Document],
    top_k: usize,
) -> Result<Vec<SimilarItem>> {
    let query_vec = vectorizer.embed(query);
    rank_by_vector(vectorizer, &query_vec, items, top_k)
}
