pub mod config;
pub mod scheduler;
pub mod use_cases;
