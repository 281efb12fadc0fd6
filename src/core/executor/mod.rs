// src/core/executor/mod.rs

// Process execution: one command at a time (`runner`) and whole batches
// fanned out across tasks (`dispatcher`).
pub mod dispatcher;
pub mod runner;

pub use dispatcher::Dispatcher;
pub use runner::{CommandExecutor, ProcessRunner};
