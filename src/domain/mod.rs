pub mod backend;
pub mod clock;
pub mod errors;
pub mod events;
pub mod logging;
pub mod measurement;
pub mod state;
pub mod workload;
