pub mod collect_samples;
pub mod run_benchmark;

pub use collect_samples::*;
pub use run_benchmark::*;
