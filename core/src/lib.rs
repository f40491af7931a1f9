//! Deadlock avoidance: the Banker's safety check and the request
//! evaluator built on top of it, plus the stream plumbing around them.

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod input;
pub mod report;
pub mod safety;
pub mod scenario;
pub mod state;
pub mod types;
