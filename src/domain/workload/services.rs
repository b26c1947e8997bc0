use super::entities::{AnimationProfile, Bounds, Entity, Position, Workload};
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::logging::LogComponent;
use crate::log_debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Seeded point sampler. Same `(count, seed)` always yields the same workload.
#[derive(Debug, Clone, Default)]
pub struct WorkloadGenerator {
    bounds: Bounds,
}

impl WorkloadGenerator {
    pub fn new(bounds: Bounds) -> BenchResult<Self> {
        if !bounds.is_valid() {
            return Err(BenchError::InvalidConfig(format!("degenerate bounds {:?}", bounds)));
        }
        Ok(Self { bounds })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn generate(&self, count: usize, seed: u64) -> BenchResult<Workload> {
        if count == 0 {
            return Err(BenchError::InvalidConfig("workload size must be positive".into()));
        }
        let count = u32::try_from(count)
            .map_err(|_| BenchError::InvalidConfig(format!("workload size {} too large", count)))?;

        let mut rng = StdRng::seed_from_u64(seed);
        let b = self.bounds;
        let entities = (0..count)
            .map(|id| Entity {
                id,
                base: Position::new(rng.gen_range(b.min_x..b.max_x), rng.gen_range(b.min_y..b.max_y)),
                profile: AnimationProfile::for_index(id),
            })
            .collect();

        log_debug!(
            LogComponent::Workload("Generator"),
            "generated {} entities with seed {}",
            count,
            seed
        );
        Ok(Workload::from_entities(seed, entities))
    }
}

/// One shared workload per size, all generated from the same seed.
///
/// Handing out `Rc`s keeps configuration switches from re-allocating the
/// point data while a measurement is in progress.
#[derive(Debug)]
pub struct WorkloadCache {
    generator: WorkloadGenerator,
    seed: u64,
    entries: BTreeMap<usize, Rc<Workload>>,
}

impl WorkloadCache {
    pub fn new(generator: WorkloadGenerator, seed: u64) -> Self {
        Self { generator, seed, entries: BTreeMap::new() }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn get_or_generate(&mut self, size: usize) -> BenchResult<Rc<Workload>> {
        if let Some(existing) = self.entries.get(&size) {
            return Ok(Rc::clone(existing));
        }
        let workload = Rc::new(self.generator.generate(size, self.seed)?);
        self.entries.insert(size, Rc::clone(&workload));
        Ok(workload)
    }

    /// Generates every size up front.
    pub fn warm(&mut self, sizes: &[usize]) -> BenchResult<()> {
        for &size in sizes {
            self.get_or_generate(size)?;
        }
        Ok(())
    }

    pub fn get(&self, size: usize) -> Option<Rc<Workload>> {
        self.entries.get(&size).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
