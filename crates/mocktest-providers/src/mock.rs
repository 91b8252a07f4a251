//! Mock collaborators for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use mocktest_core::error::{LoadError, SubmitError};
use mocktest_core::model::{LocalizedText, OptionLabel, Question, QuestionOption};
use mocktest_core::report::Report;
use mocktest_core::traits::{Acknowledgement, QuestionSetProvider, ReportSink};

/// Build `n` four-option questions worth one mark each.
///
/// The correct option cycles A, B, C, D so tests can answer by index.
pub fn sample_questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question {
            id: format!("q{}", i + 1),
            index: i as u32 + 1,
            text: LocalizedText::new(format!("Sample question {}", i + 1))
                .with("hi", format!("Namoona prashn {}", i + 1)),
            options: OptionLabel::ALL
                .iter()
                .map(|&label| QuestionOption {
                    label,
                    text: LocalizedText::new(format!("Option {label}")),
                })
                .collect(),
            correct_option: OptionLabel::ALL[i % OptionLabel::ALL.len()],
            marks: 1.0,
            explanation: None,
            topic: None,
        })
        .collect()
}

enum Serve {
    Questions(Vec<Question>),
    NotFound,
    Unreachable,
}

/// A question set provider that serves a fixed list without network access.
pub struct MockQuestionProvider {
    serve: Serve,
    call_count: AtomicU32,
    last_exam_id: Mutex<Option<String>>,
}

impl MockQuestionProvider {
    pub fn new(questions: Vec<Question>) -> Self {
        Self::with_serve(Serve::Questions(questions))
    }

    /// A provider that answers every fetch with `LoadError::NotFound`.
    pub fn not_found() -> Self {
        Self::with_serve(Serve::NotFound)
    }

    /// A provider that answers every fetch with `LoadError::Network`.
    pub fn unreachable() -> Self {
        Self::with_serve(Serve::Unreachable)
    }

    fn with_serve(serve: Serve) -> Self {
        Self {
            serve,
            call_count: AtomicU32::new(0),
            last_exam_id: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_exam_id(&self) -> Option<String> {
        self.last_exam_id.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionSetProvider for MockQuestionProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>, LoadError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_exam_id.lock().unwrap() = Some(exam_id.to_string());

        match &self.serve {
            Serve::Questions(questions) => Ok(questions.clone()),
            Serve::NotFound => Err(LoadError::NotFound(exam_id.to_string())),
            Serve::Unreachable => Err(LoadError::Network("mock backend unreachable".into())),
        }
    }
}

/// A report sink that keeps every accepted report in memory.
///
/// Can be told to fail its first `n` deliveries to exercise retry paths.
pub struct MockReportSink {
    failures_left: AtomicU32,
    call_count: AtomicU32,
    reports: Mutex<Vec<Report>>,
}

impl MockReportSink {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    pub fn failing_first(n: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(n),
            call_count: AtomicU32::new(0),
            reports: Mutex::new(Vec::new()),
        }
    }

    /// Number of delivery attempts, successful or not.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Reports accepted so far.
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

impl Default for MockReportSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSink for MockReportSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit_report(
        &self,
        exam_id: &str,
        report: &Report,
    ) -> Result<Acknowledgement, SubmitError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        let failing = self
            .failures_left
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SubmitError::Network("mock sink unavailable".into()));
        }

        let mut reports = self.reports.lock().unwrap();
        reports.push(report.clone());
        Ok(Acknowledgement::new(format!(
            "mock://{exam_id}/{}",
            reports.len()
        )))
    }
}
