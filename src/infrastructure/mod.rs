//! Browser bindings and in-process stand-ins for the domain traits.

pub mod browser_clock;
pub mod headless;
pub mod js_backend;
pub mod services;
