use std::collections::HashMap;

use crate::constants::{DEFAULT_DIMENSION, EPSILON};
use crate::error::Result;
use crate::idf::IdfTable;
use crate::priors::semantic_priors;
use crate::similarity::{Document, SimilarItem, find_similar};
use crate::tokenizer::tokenize;

/// Fixed-length text vector. Unit norm, or exactly zero for text with no
/// scoring tokens.
pub type Embedding = Vec<f64>;

/// Scale `v` to unit length in place and return its original norm.
/// Vectors with (near-)zero norm are set to exactly zero.
pub fn l2_normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm < EPSILON {
        v.iter_mut().for_each(|x| *x = 0.0);
    } else {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}

/// 32-bit rolling hash (`h * 31 + c`, wrapping) over the token's characters.
pub fn rolling_hash(word: &str) -> i32 {
    word.chars().fold(0i32, |h, c| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32)
    })
}

/// Sine-based pseudo-random value in `[0, 1)` for a hash/dimension pair.
fn sine_noise(hash: i32, dim: usize) -> f64 {
    let x = (hash as f64 * 12.9898 + (dim as f64 + 1.0) * 78.233).sin() * 43758.5453;
    x - x.floor()
}

/// Deterministic unit vector for a word with no prior.
fn hashed_word_vector(word: &str, dimension: usize) -> Embedding {
    let hash = rolling_hash(word);
    let mut v: Embedding = (0..dimension)
        .map(|i| sine_noise(hash, i) * 2.0 - 1.0)
        .collect();
    l2_normalize(&mut v);
    v
}

/// Lazily-populated token → word-vector cache, seeded with semantic priors.
#[derive(Debug, Clone, PartialEq)]
pub struct WordVectorCache {
    dimension: usize,
    vectors: HashMap<String, Embedding>,
}

impl WordVectorCache {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: semantic_priors(dimension).into_iter().collect(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Vector for `word`, deriving and caching a hashed vector on first use.
    pub fn vector(&mut self, word: &str) -> &Embedding {
        let dimension = self.dimension;
        self.vectors
            .entry(word.to_string())
            .or_insert_with(|| hashed_word_vector(word, dimension))
    }

    pub fn get(&self, word: &str) -> Option<&Embedding> {
        self.vectors.get(word)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Embedding)> {
        self.vectors.iter().map(|(w, v)| (w.as_str(), v))
    }

    pub(crate) fn from_parts(dimension: usize, vectors: HashMap<String, Embedding>) -> Self {
        Self { dimension, vectors }
    }
}

/// Hash-based pseudo-embedding generator with TF-IDF pooling.
///
/// Owns both lazily mutated caches: word vectors and IDF weights. Methods that
/// may populate either take `&mut self`; wrap in
/// [`SharedVectorizer`](crate::shared::SharedVectorizer) to share across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Vectorizer {
    pub(crate) words: WordVectorCache,
    pub(crate) idf: IdfTable,
}

impl Default for Vectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Vectorizer {
    pub fn new(dimension: usize) -> Self {
        Self {
            words: WordVectorCache::new(dimension),
            idf: IdfTable::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.words.dimension()
    }

    /// Embed text as the TF-IDF weighted mean of its word vectors, normalized.
    ///
    /// Text without scoring tokens yields the zero vector. When every token
    /// carries zero IDF (it appears in every corpus document) the plain mean
    /// of the word vectors is used instead.
    pub fn embed(&mut self, text: &str) -> Embedding {
        let dimension = self.dimension();
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; dimension];
        }

        let mut term_counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *term_counts.entry(token.as_str()).or_default() += 1;
        }
        let token_total = tokens.len() as f64;

        let mut weights: Vec<f64> = tokens
            .iter()
            .map(|token| term_counts[token.as_str()] as f64 / token_total * self.idf.weight(token))
            .collect();
        if weights.iter().sum::<f64>() < EPSILON {
            weights.iter_mut().for_each(|w| *w = 1.0);
        }

        let mut pooled = vec![0.0; dimension];
        let mut weight_sum = 0.0;
        for (token, weight) in tokens.iter().zip(&weights) {
            let vector = self.words.vector(token);
            for (acc, x) in pooled.iter_mut().zip(vector) {
                *acc += weight * x;
            }
            weight_sum += weight;
        }

        pooled.iter_mut().for_each(|x| *x /= weight_sum);
        l2_normalize(&mut pooled);
        pooled
    }

    /// Word vector for a single (already lowercase) token.
    pub fn word_vector(&mut self, word: &str) -> Embedding {
        self.words.vector(word).clone()
    }

    /// Recompute IDF weights from a reference corpus.
    pub fn update_idf<S: AsRef<str>>(&mut self, documents: &[S]) {
        self.idf.update(documents);
    }

    /// Rank `items` against `query`. See [`find_similar`].
    pub fn find_similar(
        &mut self,
        query: &str,
        items: &[Document],
        top_k: usize,
    ) -> Result<Vec<SimilarItem>> {
        find_similar(self, query, items, top_k)
    }

    pub fn idf(&self) -> &IdfTable {
        &self.idf
    }

    pub fn idf_mut(&mut self) -> &mut IdfTable {
        &mut self.idf
    }

    pub fn word_cache(&self) -> &WordVectorCache {
        &self.words
    }
}
