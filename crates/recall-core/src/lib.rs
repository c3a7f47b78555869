//! Local semantic retrieval and context assembly.
//!
//! Produces fixed-length text vectors without a trained model (hashed word
//! vectors, semantic-group priors, TF-IDF pooling), ranks documents by cosine
//! similarity, and assembles a single character-bounded context blob from
//! pinned notes, keyword-relevant excerpts and vault statistics.
//!
//! Zero I/O: documents arrive through the [`NoteSource`] boundary or as
//! already-resolved reads.

pub mod assistant;
pub mod compose;
pub mod constants;
pub mod error;
pub mod idf;
pub mod priors;
pub mod serde_compat;
pub mod shared;
pub mod similarity;
pub mod source;
pub mod tokenizer;
pub mod vectorizer;

pub use assistant::{Assistant, AssistantKind, LocalAssistant, assistant_for};
pub use compose::{
    ContextAssembler, ContextBudget, ContextMetrics, ContextResult, build_context,
    extract_relevant_excerpt, smart_truncate,
};
pub use constants::{DEFAULT_DIMENSION, DEFAULT_IDF};
pub use error::{RecallError, Result};
pub use idf::IdfTable;
pub use serde_compat::{SNAPSHOT_VERSION, export_snapshot, import_snapshot};
pub use shared::SharedVectorizer;
pub use similarity::{Document, SimilarItem, cosine_similarity, find_similar};
pub use source::{MemorySource, Note, NoteRead, NoteSource};
pub use tokenizer::tokenize;
pub use vectorizer::{Embedding, Vectorizer, WordVectorCache};
