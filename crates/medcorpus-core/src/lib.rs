//! medcorpus core library.
//!
//! Samples multi-hop paths (disease → drug, symptom, group, chapter) from a
//! medical knowledge graph held in SQLite, renders them into labeled
//! Vietnamese sentences through per-hop template banks, and writes the
//! result as shuffled, fixed-size CSV shards. Sampling is bounded by
//! per-hop-class quotas derived from a total sentence target.

pub mod config;
pub mod errors;
pub mod models;
pub mod query;
pub mod sampler;
pub mod store;
pub mod synth;

pub use config::GeneratorConfig;
pub use errors::{CorpusError, CorpusResult};
pub use models::{HopClass, HopTable, PathRecord, SeedEntity, SynthesizedSentence};
pub use sampler::{generate, RunSummary};
pub use store::{database::GraphStore, GraphSource};
