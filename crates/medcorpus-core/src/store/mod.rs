//! Graph store boundary and its SQLite implementation.

pub mod database;
pub mod schema;

use crate::errors::CorpusResult;
use crate::models::{HopClass, PathRecord, SeedEntity};

/// Read-only view of the populated medical graph used by a generation run.
///
/// Implementations must tolerate concurrent calls from worker threads.
pub trait GraphSource: Sync {
    /// Every `Disease` node with its display name.
    fn list_seed_entities(&self) -> CorpusResult<Vec<SeedEntity>>;

    /// Path records for one seed and hop class, at most `limit` of them.
    fn run_hop_query(
        &self,
        hop: HopClass,
        seed_id: &str,
        limit: usize,
    ) -> CorpusResult<Vec<PathRecord>>;
}
