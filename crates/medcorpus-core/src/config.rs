//! Generation run configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `MEDCORPUS_*` environment variables. Callers (the CLI) may override
//! individual fields afterwards and must call [`GeneratorConfig::validate`]
//! before starting a run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CorpusError, CorpusResult};
use crate::models::{HopClass, HopTable};
use crate::query::guards::MAX_PATHS_PER_SEED;

pub const DEFAULT_SENTENCES_PER_FILE: usize = 3000;
pub const DEFAULT_TOTAL_TARGET: u64 = 90_000;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_WORKERS: usize = 4;

const FRACTION_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// SQLite file holding the populated medical graph.
    pub graph_db_path: PathBuf,
    pub output_dir: PathBuf,
    /// Shards are named `<prefix>_partNNN.csv`.
    pub output_prefix: String,
    pub sentences_per_file: usize,
    pub total_target: u64,
    pub quota_fractions: HopTable<f64>,
    pub max_paths_per_seed: HopTable<usize>,
    pub workers: usize,
    /// Per hop query deadline. Zero disables it.
    pub query_timeout_ms: u64,
    /// Fixes seed order and shard shuffles when set.
    pub rng_seed: Option<u64>,
    pub write_bom: bool,
    pub flush_retries: u32,
    pub abort_on_query_error: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            graph_db_path: PathBuf::from("data/medgraph.sqlite"),
            output_dir: PathBuf::from("data/raw_sentences"),
            output_prefix: "raw_sentences".to_string(),
            sentences_per_file: DEFAULT_SENTENCES_PER_FILE,
            total_target: DEFAULT_TOTAL_TARGET,
            quota_fractions: HopTable::new(0.35, 0.50, 0.15),
            max_paths_per_seed: HopTable::new(5, 8, 3),
            workers: DEFAULT_WORKERS,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            rng_seed: None,
            write_bom: true,
            flush_retries: 0,
            abort_on_query_error: false,
        }
    }
}

impl GeneratorConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> CorpusResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> CorpusResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `MEDCORPUS_*` overrides. `lookup` is injected so tests do not
    /// have to mutate the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> CorpusResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MEDCORPUS_GRAPH_DB") {
            self.graph_db_path = PathBuf::from(v.trim());
        }
        if let Some(v) = lookup("MEDCORPUS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v.trim());
        }
        if let Some(v) = lookup("MEDCORPUS_OUTPUT_PREFIX") {
            self.output_prefix = v.trim().to_string();
        }
        if let Some(v) = lookup("MEDCORPUS_SENTENCES_PER_FILE") {
            self.sentences_per_file = parse_env("MEDCORPUS_SENTENCES_PER_FILE", &v)?;
        }
        if let Some(v) = lookup("MEDCORPUS_TOTAL_TARGET") {
            self.total_target = parse_env("MEDCORPUS_TOTAL_TARGET", &v)?;
        }
        if let Some(v) = lookup("MEDCORPUS_WORKERS") {
            self.workers = parse_env("MEDCORPUS_WORKERS", &v)?;
        }
        if let Some(v) = lookup("MEDCORPUS_QUERY_TIMEOUT_MS") {
            self.query_timeout_ms = parse_env("MEDCORPUS_QUERY_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("MEDCORPUS_RNG_SEED") {
            self.rng_seed = Some(parse_env("MEDCORPUS_RNG_SEED", &v)?);
        }
        if let Some(v) = lookup("MEDCORPUS_WRITE_BOM") {
            self.write_bom = env_flag(&v);
        }
        if let Some(v) = lookup("MEDCORPUS_FLUSH_RETRIES") {
            self.flush_retries = parse_env("MEDCORPUS_FLUSH_RETRIES", &v)?;
        }
        if let Some(v) = lookup("MEDCORPUS_ABORT_ON_QUERY_ERROR") {
            self.abort_on_query_error = env_flag(&v);
        }
        Ok(())
    }

    pub fn validate(&self) -> CorpusResult<()> {
        if self.output_prefix.trim().is_empty() {
            return Err(CorpusError::Config("output_prefix must not be empty".into()));
        }
        if self.sentences_per_file == 0 {
            return Err(CorpusError::Config("sentences_per_file must be positive".into()));
        }
        if self.workers == 0 {
            return Err(CorpusError::Config("workers must be positive".into()));
        }
        let mut fraction_sum = 0.0;
        for (hop, fraction) in self.quota_fractions.iter() {
            if !(0.0..=1.0).contains(fraction) {
                return Err(CorpusError::Config(format!(
                    "quota fraction for {hop} must be within [0, 1], got {fraction}"
                )));
            }
            fraction_sum += fraction;
        }
        if fraction_sum > 1.0 + FRACTION_SUM_TOLERANCE {
            return Err(CorpusError::Config(format!(
                "quota fractions sum to {fraction_sum}, expected at most 1"
            )));
        }
        for (hop, limit) in self.max_paths_per_seed.iter() {
            if *limit == 0 {
                return Err(CorpusError::Config(format!(
                    "max_paths_per_seed for {hop} must be positive"
                )));
            }
            if *limit > MAX_PATHS_PER_SEED {
                tracing::warn!(
                    "max_paths_per_seed for {hop} is {limit}; queries are capped at {MAX_PATHS_PER_SEED}"
                );
            }
        }
        Ok(())
    }

    /// Per-class sentence targets: `floor(total_target * fraction)`.
    pub fn quota_targets(&self) -> HopTable<u64> {
        self.quota_fractions
            .map(|_, fraction| (self.total_target as f64 * fraction).floor() as u64)
    }

    pub fn paths_limit(&self, hop: HopClass) -> usize {
        self.max_paths_per_seed[hop]
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> CorpusResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| CorpusError::Config(format!("{key}: cannot parse {value:?}")))
}

fn env_flag(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    matches!(v.as_str(), "1" | "true" | "yes" | "on")
}
