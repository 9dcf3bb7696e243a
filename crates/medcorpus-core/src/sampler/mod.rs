//! Quota-bounded sampling of the graph and sharded output.

pub mod pipeline;
pub mod quota;
pub mod seeds;
pub mod shard;

pub use pipeline::{generate, RunSummary, StopReason};
pub use quota::{QuotaReservation, QuotaTracker};
pub use seeds::EntityIndex;
pub use shard::{list_shards, read_shard, ShardInfo, ShardWriter};
