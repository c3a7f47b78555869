//! JSON snapshot of a [`Vectorizer`]'s caches.
//!
//! The wire format uses camelCase field names and sorted maps, so equal
//! caches serialize to identical strings. Floats round-trip exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RecallError, Result};
use crate::idf::IdfTable;
use crate::vectorizer::{Embedding, Vectorizer, WordVectorCache};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug)]
pub struct WireSnapshot {
    pub version: u32,
    pub dimension: usize,
    #[serde(rename = "wordVectors")]
    pub word_vectors: BTreeMap<String, Embedding>,
    pub idf: BTreeMap<String, f64>,
    #[serde(rename = "corpusSize", default)]
    pub corpus_size: usize,
}

impl WireSnapshot {
    pub fn from_vectorizer(vectorizer: &Vectorizer) -> Self {
        WireSnapshot {
            version: SNAPSHOT_VERSION,
            dimension: vectorizer.dimension(),
            word_vectors: vectorizer
                .word_cache()
                .iter()
                .map(|(w, v)| (w.to_string(), v.clone()))
                .collect(),
            idf: vectorizer
                .idf()
                .iter()
                .map(|(w, v)| (w.to_string(), v))
                .collect(),
            corpus_size: vectorizer.idf().corpus_size(),
        }
    }

    /// Validate and convert into a fresh vectorizer.
    pub fn into_vectorizer(self) -> Result<Vectorizer> {
        if self.version != SNAPSHOT_VERSION {
            return Err(RecallError::corrupt(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if self.dimension == 0 {
            return Err(RecallError::corrupt("dimension must be positive"));
        }
        for (word, vector) in &self.word_vectors {
            if vector.len() != self.dimension {
                return Err(RecallError::corrupt(format!(
                    "word '{word}' has {} components, expected {}",
                    vector.len(),
                    self.dimension
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(RecallError::corrupt(format!(
                    "word '{word}' has a non-finite component"
                )));
            }
        }
        if let Some((word, _)) = self.idf.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RecallError::corrupt(format!("IDF for '{word}' is not finite")));
        }

        Ok(Vectorizer {
            words: WordVectorCache::from_parts(self.dimension, self.word_vectors.into_iter().collect()),
            idf: IdfTable::from_parts(self.idf.into_iter().collect(), self.corpus_size),
        })
    }
}

/// Serialize the vectorizer's word-vector cache and IDF table.
pub fn export_snapshot(vectorizer: &Vectorizer) -> Result<String> {
    Ok(serde_json::to_string(&WireSnapshot::from_vectorizer(vectorizer))?)
}

/// Parse and validate a snapshot into a new vectorizer.
pub fn import_snapshot(payload: &str) -> Result<Vectorizer> {
    let wire: WireSnapshot =
        serde_json::from_str(payload).map_err(|e| RecallError::corrupt(e.to_string()))?;
    wire.into_vectorizer()
}

impl Vectorizer {
    /// Opaque snapshot of both caches. See [`export_snapshot`].
    pub fn serialize(&self) -> Result<String> {
        export_snapshot(self)
    }

    /// Replace both caches from a snapshot. On error, `self` is unchanged.
    pub fn deserialize(&mut self, payload: &str) -> Result<()> {
        let restored = import_snapshot(payload)?;
        tracing::debug!(
            words = restored.word_cache().len(),
            idf = restored.idf().len(),
            "restored vectorizer snapshot"
        );
        *self = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::{Document, find_similar};

    fn trained() -> Vectorizer {
        let mut v = Vectorizer::default();
        v.update_idf(&["the cat sat", "the dog ran", "cats and dogs"]);
        v.embed("a zebra crossing near the meeting room");
        v
    }

    #[test]
    fn test_roundtrip_exact() {
        let v = trained();
        let json = v.serialize().unwrap();
        let restored = import_snapshot(&json).unwrap();
        assert_eq!(v, restored);
    }

    #[test]
    fn test_serialization_is_canonical() {
        let v = trained();
        let restored = import_snapshot(&v.serialize().unwrap()).unwrap();
        assert_eq!(v.serialize().unwrap(), restored.serialize().unwrap());
    }

    #[test]
    fn test_roundtrip_preserves_rankings() {
        let mut v = trained();
        let items = vec![
            Document::new("a", "a cat sat on a mat"),
            Document::new("b", "dogs are loyal"),
            Document::new("c", "zebra crossing"),
        ];
        let payload = v.serialize().unwrap();
        let mut restored = Vectorizer::new(8);
        restored.deserialize(&payload).unwrap();

        for probe in ["cat", "zebra", "loyal dogs"] {
            let before = find_similar(&mut v, probe, &items, 3).unwrap();
            let after = find_similar(&mut restored, probe, &items, 3).unwrap();
            assert_eq!(before, after, "ranking changed for '{probe}'");
        }
    }

    #[test]
    fn test_corrupt_payload_leaves_state() {
        let mut v = trained();
        let before = v.clone();
        assert!(matches!(
            v.deserialize("{not json"),
            Err(RecallError::SerializationCorrupt(_))
        ));
        assert_eq!(v, before);
    }

    #[test]
    fn test_wrong_length_vector_rejected() {
        let mut v = trained();
        let before = v.clone();
        let payload = r#"{"version":1,"dimension":4,"wordVectors":{"cat":[1.0,0.0]},"idf":{}}"#;
        assert!(v.deserialize(payload).is_err());
        assert_eq!(v, before);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let payload = r#"{"version":99,"dimension":2,"wordVectors":{},"idf":{}}"#;
        assert!(import_snapshot(payload).is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let payload = r#"{"version":1,"dimension":0,"wordVectors":{},"idf":{}}"#;
        assert!(import_snapshot(payload).is_err());
    }

    #[test]
    fn test_corpus_size_defaults() {
        let payload = r#"{"version":1,"dimension":2,"wordVectors":{"cat":[0.6,0.8]},"idf":{"cat":1.5}}"#;
        let v = import_snapshot(payload).unwrap();
        assert_eq!(v.idf().corpus_size(), 0);
        assert_eq!(v.idf().peek("cat"), Some(1.5));
        assert_eq!(v.dimension(), 2);
    }
}
