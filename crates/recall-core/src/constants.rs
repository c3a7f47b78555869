/// Default embedding dimensionality.
pub const DEFAULT_DIMENSION: usize = 128;

/// Scoring tokens must be at least this many characters long.
pub const MIN_TOKEN_LEN: usize = 3;

/// Scoring tokens must be at most this many characters long.
pub const MAX_TOKEN_LEN: usize = 19;

/// IDF assigned to words never seen in a reference corpus: ln(100).
pub const DEFAULT_IDF: f64 = 4.605_170_185_988_092;

/// Seed for the semantic-group prior generator. Fixed so that priors, and
/// therefore serialized word-vector snapshots, agree across runs.
pub const PRIOR_SEED: u64 = 0x5EED_0F_C0DE;

/// Per-component jitter applied to a group base vector for each seed word.
pub const PRIOR_JITTER: f64 = 0.02;

/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-12;
