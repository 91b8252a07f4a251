//! Scored attempt report with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::OptionLabel;

/// How the attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    /// The student asked to submit.
    Manual,
    /// The countdown reached zero.
    Forced,
}

/// Identifying data for the attempt a report belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub attempt_id: Uuid,
    pub exam_id: String,
    pub submission: SubmissionKind,
    pub started_at: Option<DateTime<Utc>>,
    /// Configured length of the attempt.
    pub duration_secs: u32,
}

/// Per-question result classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Wrong,
    Skipped,
}

/// One row of the per-question breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub position: usize,
    pub question_id: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub submitted: Option<OptionLabel>,
    pub correct_option: OptionLabel,
    pub outcome: Outcome,
    pub marks_awarded: f64,
    pub max_marks: f64,
    pub marked_for_review: bool,
}

/// Aggregates for questions sharing a topic tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: String,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub marks_obtained: f64,
    pub max_marks: f64,
    /// `correct / total * 100`, one decimal.
    pub percentage: f64,
}

/// The immutable scored summary of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub marked_for_review: usize,
    pub time_taken_secs: u32,
    /// `correct / total * 100`, one decimal.
    pub percentage: f64,
    /// `correct / answered * 100`, one decimal; 0 when nothing was answered.
    pub accuracy: f64,
    pub max_marks: f64,
    pub marks_obtained: f64,
    pub breakdown: Vec<QuestionResult>,
    /// Only present for question sets that carry topic tags.
    #[serde(default)]
    pub topics: Vec<TopicSummary>,
}

impl Report {
    pub fn is_forced(&self) -> bool {
        self.metadata.submission == SubmissionKind::Forced
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: Report =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## Result: {}\n\n", self.metadata.exam_id));
        if self.is_forced() {
            md.push_str("_Submitted automatically when time ran out._\n\n");
        }
        md.push_str(&format!(
            "**Score:** {:.1}% ({}/{} correct) | **Accuracy:** {:.1}% | **Marks:** {}/{}\n\n",
            self.percentage,
            self.correct,
            self.total,
            self.accuracy,
            format_marks(self.marks_obtained),
            format_marks(self.max_marks)
        ));
        md.push_str(&format!(
            "Answered {} | Wrong {} | Skipped {} | Marked for review {} | Time {}\n\n",
            self.answered,
            self.wrong,
            self.skipped,
            self.marked_for_review,
            format_duration(self.time_taken_secs)
        ));

        if !self.topics.is_empty() {
            md.push_str("### Topics\n\n");
            md.push_str("| Topic | Correct | Total | Score |\n");
            md.push_str("|-------|---------|-------|-------|\n");
            for t in &self.topics {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% |\n",
                    t.topic, t.correct, t.total, t.percentage
                ));
            }
            md.push('\n');
        }

        md.push_str("### Questions\n\n");
        md.push_str("| # | Answer | Correct | Result | Marks |\n");
        md.push_str("|---|--------|---------|--------|-------|\n");
        for q in &self.breakdown {
            let submitted = q
                .submitted
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string());
            let outcome = match q.outcome {
                Outcome::Correct => "correct",
                Outcome::Wrong => "wrong",
                Outcome::Skipped => "skipped",
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                q.position + 1,
                submitted,
                q.correct_option,
                outcome,
                format_marks(q.marks_awarded)
            ));
        }

        md
    }
}

/// Render marks without a trailing `.0` for whole numbers.
pub fn format_marks(marks: f64) -> String {
    if marks.fract() == 0.0 {
        format!("{marks:.0}")
    } else {
        format!("{marks:.2}")
    }
}

/// Render seconds as `mm:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(secs: u32) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
