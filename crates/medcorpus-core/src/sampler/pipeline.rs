//! Generation loop: seeds → hop queries → sentences → shards.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::errors::{CorpusError, CorpusResult};
use crate::models::{HopClass, HopTable, SeedEntity, SynthesizedSentence};
use crate::query::guards::clamp_limit;
use crate::sampler::quota::QuotaTracker;
use crate::sampler::seeds::EntityIndex;
use crate::sampler::shard::{ShardInfo, ShardWriter};
use crate::store::GraphSource;
use crate::synth::{expand, max_sentences_per_record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    QuotaSatisfied,
    SeedsExhausted,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sentences: HopTable<u64>,
    pub targets: HopTable<u64>,
    pub total_sentences: u64,
    pub shards_written: usize,
    pub shards: Vec<ShardInfo>,
    pub seeds_visited: usize,
    pub seeds_total: usize,
    pub failed_queries: usize,
    pub stop_reason: StopReason,
    pub elapsed_ms: u64,
}

/// Shared state for one run.
struct RunState<'a, G: GraphSource + ?Sized> {
    source: &'a G,
    config: &'a GeneratorConfig,
    quota: QuotaTracker,
    writer: Mutex<ShardWriter>,
    seeds_visited: AtomicUsize,
    failed_queries: AtomicUsize,
}

impl<G: GraphSource + ?Sized> RunState<'_, G> {
    /// Run every still-open hop class for one seed, 1-hop first. A hop
    /// query only starts once its worst-case yield fits under the target.
    fn process_seed(&self, seed: &SeedEntity) -> CorpusResult<()> {
        if self.quota.all_satisfied() {
            return Ok(());
        }
        self.seeds_visited.fetch_add(1, Ordering::Relaxed);
        debug!("Processing seed {} ({})", seed.id, seed.name);

        for hop in HopClass::ALL {
            // Held until this hop's sentences are counted, and released
            // before the next hop reserves.
            let limit = clamp_limit(self.config.paths_limit(hop));
            let worst_case = (limit * max_sentences_per_record(hop)) as u64;
            let Some(reservation) = self.quota.reserve(hop, worst_case) else {
                continue;
            };
            let records = match self.source.run_hop_query(hop, &seed.id, limit) {
                Ok(records) => records,
                Err(e @ CorpusError::Query { .. }) if !self.config.abort_on_query_error => {
                    warn!("Skipping query: {e}");
                    self.failed_queries.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let sentences: Vec<SynthesizedSentence> = records
                .iter()
                .flat_map(|record| expand(record, hop))
                .map(|text| SynthesizedSentence::new(text, hop, &seed.id))
                .collect();
            if sentences.is_empty() {
                continue;
            }
            let produced = sentences.len() as u64;

            {
                let mut writer = self.writer.lock();
                for sentence in sentences {
                    writer.append(sentence)?;
                }
            }

            let count = reservation.commit(produced);
            let target = self.quota.target(hop);
            if count - produced < target && count >= target {
                info!("Quota for {hop} reached ({count}/{target})");
            }
        }
        Ok(())
    }

    fn run_sequential(&self, seeds: &[SeedEntity]) -> CorpusResult<()> {
        for seed in seeds {
            if self.quota.all_satisfied() {
                break;
            }
            self.process_seed(seed)?;
        }
        Ok(())
    }

    fn run_parallel(&self, seeds: &[SeedEntity]) -> CorpusResult<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build();
        match pool {
            Ok(pool) => pool.install(|| {
                seeds
                    .par_iter()
                    .try_for_each(|seed| self.process_seed(seed))
            }),
            Err(e) => {
                warn!("Worker pool unavailable ({e}); falling back to sequential");
                self.run_sequential(seeds)
            }
        }
    }
}

fn run_rng(config: &GeneratorConfig) -> StdRng {
    match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generate the corpus described by `config` from `source`.
///
/// Seeds are visited once each in shuffled order until every hop class has
/// reached its target or the seeds run out. Failed hop queries are skipped
/// unless `abort_on_query_error` is set; connectivity and shard write
/// failures end the run.
pub fn generate<G>(source: &G, config: &GeneratorConfig) -> CorpusResult<RunSummary>
where
    G: GraphSource + ?Sized,
{
    config.validate()?;
    let started = Instant::now();
    let mut rng = run_rng(config);

    let index = EntityIndex::load(source, &mut rng)?;
    let targets = config.quota_targets();
    info!(
        "Starting generation: {} seeds, targets 1-hop={} 2-hop={} 3-hop={}, {} worker(s)",
        index.len(),
        targets.one_hop,
        targets.two_hop,
        targets.three_hop,
        config.workers
    );

    let writer = ShardWriter::new(
        &config.output_dir,
        &config.output_prefix,
        config.sentences_per_file,
        StdRng::seed_from_u64(rng.gen()),
    )?
    .with_bom(config.write_bom)
    .with_retries(config.flush_retries);

    let state = RunState {
        source,
        config,
        quota: QuotaTracker::new(targets),
        writer: Mutex::new(writer),
        seeds_visited: AtomicUsize::new(0),
        failed_queries: AtomicUsize::new(0),
    };

    if config.workers <= 1 {
        state.run_sequential(index.seeds())?;
    } else {
        state.run_parallel(index.seeds())?;
    }

    let RunState {
        quota,
        writer,
        seeds_visited,
        failed_queries,
        ..
    } = state;
    let shards = writer.into_inner().finish()?;

    let stop_reason = if quota.all_satisfied() {
        StopReason::QuotaSatisfied
    } else {
        StopReason::SeedsExhausted
    };
    if stop_reason == StopReason::SeedsExhausted {
        warn!("Seeds exhausted before every quota was met");
    }

    let summary = RunSummary {
        sentences: quota.snapshot(),
        targets,
        total_sentences: quota.total(),
        shards_written: shards.len(),
        shards,
        seeds_visited: seeds_visited.into_inner(),
        seeds_total: index.len(),
        failed_queries: failed_queries.into_inner(),
        stop_reason,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "Generation finished: {} sentences (1-hop={} 2-hop={} 3-hop={}) in {} shard(s), {}/{} seeds, {} failed queries",
        summary.total_sentences,
        summary.sentences.one_hop,
        summary.sentences.two_hop,
        summary.sentences.three_hop,
        summary.shards_written,
        summary.seeds_visited,
        summary.seeds_total,
        summary.failed_queries
    );
    Ok(summary)
}
