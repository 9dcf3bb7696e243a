//! Error types for the medcorpus core library.

use std::path::PathBuf;

use crate::models::HopClass;

/// Top-level error enum for corpus generation.
///
/// `Connectivity`, `ShardWrite` and `Config` are fatal for a run. `Query` is
/// recoverable: the generation loop logs it and moves on to the next
/// (seed, hop class) pair unless configured to abort.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Graph store unreachable: {0}")]
    Connectivity(String),

    #[error("{hop} query failed for seed {seed_id}: {message}")]
    Query {
        hop: HopClass,
        seed_id: String,
        message: String,
    },

    #[error("Failed to write shard {}: {message}", path.display())]
    ShardWrite { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CorpusError {
    /// True for errors that must terminate the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CorpusError::Query { .. })
    }
}

pub type CorpusResult<T> = Result<T, CorpusError>;
