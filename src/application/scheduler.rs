//! Test ordering: the matrix is replicated per iteration and each copy is
//! shuffled on its own.

use crate::domain::measurement::Configuration;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduledTest {
    pub iteration: usize,
    pub configuration: Configuration,
}

/// Owns the order RNG; consecutive schedules continue the same stream.
#[derive(Debug, Clone)]
pub struct TestScheduler {
    rng: StdRng,
}

impl TestScheduler {
    pub fn new(shuffle_seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(shuffle_seed) }
    }

    /// Iterations ascending; configurations within each iteration in a
    /// fresh Fisher–Yates permutation.
    pub fn schedule(&mut self, matrix: &[Configuration], iterations: usize) -> Vec<ScheduledTest> {
        let mut tests = Vec::with_capacity(matrix.len() * iterations);
        for iteration in 0..iterations {
            let mut order = matrix.to_vec();
            order.shuffle(&mut self.rng);
            tests.extend(order.into_iter().map(|configuration| ScheduledTest { iteration, configuration }));
        }
        tests
    }
}
