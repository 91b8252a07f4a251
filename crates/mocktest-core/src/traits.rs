//! Collaborator traits at the engine's two edges.
//!
//! A [`QuestionSetProvider`] supplies questions before a session exists; a
//! [`ReportSink`] receives the finished report. Implementations live in the
//! `mocktest-providers` crate. Neither side is retried by the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, SubmitError};
use crate::model::Question;
use crate::report::Report;

/// Source of the ordered questions for an exam.
#[async_trait]
pub trait QuestionSetProvider: Send + Sync {
    /// Human-readable provider name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch the questions for `exam_id`, in display order.
    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>, LoadError>;
}

/// Destination for finished reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Human-readable sink name (e.g. "json-file").
    fn name(&self) -> &str;

    /// Hand off a report.
    async fn submit_report(
        &self,
        exam_id: &str,
        report: &Report,
    ) -> Result<Acknowledgement, SubmitError>;
}

/// Receipt returned by a sink after accepting a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// Sink-specific reference to the stored report (id, URL or path).
    pub reference: String,
}

impl Acknowledgement {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}
