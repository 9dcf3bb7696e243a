//! Seed entity index: every disease, visited once in random order.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::errors::{CorpusError, CorpusResult};
use crate::models::SeedEntity;
use crate::store::GraphSource;

#[derive(Debug, Clone)]
pub struct EntityIndex {
    seeds: Vec<SeedEntity>,
}

impl EntityIndex {
    /// Load all seeds from `source` and shuffle them with `rng`.
    ///
    /// Any failure here means the graph is unusable and is reported as
    /// [`CorpusError::Connectivity`].
    pub fn load<G, R>(source: &G, rng: &mut R) -> CorpusResult<Self>
    where
        G: GraphSource + ?Sized,
        R: Rng + ?Sized,
    {
        let mut seeds = source.list_seed_entities().map_err(|e| match e {
            CorpusError::Connectivity(_) => e,
            other => CorpusError::Connectivity(other.to_string()),
        })?;
        seeds.shuffle(rng);
        info!("Loaded {} seed entities", seeds.len());
        Ok(Self { seeds })
    }

    pub fn from_seeds(seeds: Vec<SeedEntity>) -> Self {
        Self { seeds }
    }

    pub fn seeds(&self) -> &[SeedEntity] {
        &self.seeds
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HopClass, PathRecord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct FixedSeeds(Vec<&'static str>);

    impl GraphSource for FixedSeeds {
        fn list_seed_entities(&self) -> CorpusResult<Vec<SeedEntity>> {
            Ok(self
                .0
                .iter()
                .map(|id| SeedEntity {
                    id: id.to_string(),
                    name: format!("{id}-name"),
                })
                .collect())
        }

        fn run_hop_query(&self, _: HopClass, _: &str, _: usize) -> CorpusResult<Vec<PathRecord>> {
            Ok(Vec::new())
        }
    }

    struct Unreachable;

    impl GraphSource for Unreachable {
        fn list_seed_entities(&self) -> CorpusResult<Vec<SeedEntity>> {
            Err(CorpusError::Io(std::io::Error::other("connection refused")))
        }

        fn run_hop_query(&self, _: HopClass, _: &str, _: usize) -> CorpusResult<Vec<PathRecord>> {
            unreachable!()
        }
    }

    #[test]
    fn shuffle_is_a_permutation_and_reproducible() {
        let ids: Vec<&'static str> = vec!["A", "B", "C", "D", "E", "F", "G", "H"];
        let source = FixedSeeds(ids.clone());

        let a = EntityIndex::load(&source, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = EntityIndex::load(&source, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.seeds(), b.seeds());

        let mut got: Vec<&str> = a.seeds().iter().map(|s| s.id.as_str()).collect();
        got.sort_unstable();
        assert_eq!(got, ids);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn load_failure_is_connectivity_error() {
        let err = EntityIndex::load(&Unreachable, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, CorpusError::Connectivity(_)));
        assert!(err.is_fatal());
    }
}
