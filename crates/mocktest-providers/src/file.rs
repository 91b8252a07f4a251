//! Local filesystem backend: TOML question sets in, JSON reports out.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use mocktest_core::error::{LoadError, SubmitError};
use mocktest_core::model::{Question, QuestionSet};
use mocktest_core::parser::{load_question_directory, parse_question_set};
use mocktest_core::report::Report;
use mocktest_core::traits::{Acknowledgement, QuestionSetProvider, ReportSink};

/// Serves question sets from a TOML file or a directory of them.
///
/// A set is matched by its `[question_set] id`. A single file is served
/// only under its own id.
pub struct FileQuestionProvider {
    root: PathBuf,
}

impl FileQuestionProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the whole set for `exam_id`, including its title and duration.
    pub fn load_set(&self, exam_id: &str) -> Result<QuestionSet, LoadError> {
        if !self.root.exists() {
            return Err(LoadError::NotFound(format!(
                "{} (no such path: {})",
                exam_id,
                self.root.display()
            )));
        }

        let sets = if self.root.is_dir() {
            load_question_directory(&self.root).map_err(|e| LoadError::Parse(format!("{e:#}")))?
        } else {
            vec![parse_question_set(&self.root).map_err(|e| LoadError::Parse(format!("{e:#}")))?]
        };

        if let Some(set) = sets.into_iter().find(|set| set.id == exam_id) {
            return Ok(set);
        }

        // Directory loading skips unparsable files. A file named after the
        // exam is surfaced as the parse failure it is.
        if let Some(path) = find_file_by_stem(&self.root, exam_id) {
            if let Err(e) = parse_question_set(&path) {
                return Err(LoadError::Parse(format!("{e:#}")));
            }
        }
        Err(LoadError::NotFound(exam_id.to_string()))
    }
}

/// Find `{stem}.toml` anywhere under `dir`.
fn find_file_by_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for path in entries.filter_map(|entry| entry.ok().map(|e| e.path())) {
        if path.is_dir() {
            if let Some(found) = find_file_by_stem(&path, stem) {
                return Some(found);
            }
        } else if path.extension().is_some_and(|ext| ext == "toml")
            && path.file_stem().is_some_and(|s| s == stem)
        {
            return Some(path);
        }
    }
    None
}

#[async_trait]
impl QuestionSetProvider for FileQuestionProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>, LoadError> {
        let set = self.load_set(exam_id)?;
        tracing::debug!(
            path = %self.root.display(),
            title = %set.title,
            "question set loaded from disk"
        );
        Ok(set.questions)
    }
}

/// Writes each report as `report-{exam}-{attempt}.json` under a directory.
pub struct JsonReportSink {
    output_dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Where the report for this attempt is written.
    pub fn report_path(&self, exam_id: &str, report: &Report) -> PathBuf {
        let exam = exam_id.replace(['/', '\\'], "_");
        self.output_dir.join(format!(
            "report-{}-{}.json",
            exam, report.metadata.attempt_id
        ))
    }
}

#[async_trait]
impl ReportSink for JsonReportSink {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn submit_report(
        &self,
        exam_id: &str,
        report: &Report,
    ) -> Result<Acknowledgement, SubmitError> {
        let path = self.report_path(exam_id, report);
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| SubmitError::Io(format!("failed to serialize report: {e}")))?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                SubmitError::Io(format!(
                    "failed to create {}: {e}",
                    self.output_dir.display()
                ))
            })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| SubmitError::Io(format!("failed to write {}: {e}", path.display())))?;

        Ok(Acknowledgement::new(path.display().to_string()))
    }
}
