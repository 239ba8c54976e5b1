// The binary in main.rs drives these modules; integration tests and
// benchmarks use them directly.

pub mod app;
pub mod cards;
pub mod config;
pub mod engine;
pub mod event;
pub mod session;
pub mod store;
pub mod ui;
