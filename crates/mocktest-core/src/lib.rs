//! mocktest-core: Timed exam session engine, scoring, and reports.
//!
//! This crate defines the question model, the per-attempt session state
//! machine with its countdown, the scoring engine that reduces an attempt
//! into a [`report::Report`], and the collaborator traits the engine talks
//! to at its edges.

pub mod error;
pub mod model;
pub mod navigation;
pub mod parser;
pub mod registry;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod traits;
