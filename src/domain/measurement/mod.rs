//! Frame-interval samples, their statistical reduction and the results store.

pub mod results;
pub mod statistics;
pub mod value_objects;

pub use results::*;
pub use statistics::*;
pub use value_objects::*;
