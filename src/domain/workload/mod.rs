//! Synthetic point workloads: entities, deterministic generation and the per-size cache.

pub mod entities;
pub mod services;

pub use entities::*;
pub use services::*;
