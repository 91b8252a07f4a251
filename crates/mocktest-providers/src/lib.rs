//! mocktest-providers: where questions come from and where reports go.
//!
//! Implements `QuestionSetProvider` and `ReportSink` for a REST exam portal
//! and for the local filesystem, plus in-memory mocks for tests.

pub mod config;
pub mod file;
pub mod http;
pub mod mock;

pub use config::{create_provider, create_sink, load_config, BackendConfig, MocktestConfig};
