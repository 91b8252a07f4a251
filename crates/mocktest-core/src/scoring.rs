//! Scoring engine: reduces an attempt into a [`Report`].
//!
//! [`score`] is a pure function of its inputs. Calling it twice with the
//! same input yields equal reports; it reads no clock and allocates no ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Question;
use crate::registry::{AnswerRegistry, ReviewRegistry};
use crate::report::{Outcome, QuestionResult, Report, ReportMetadata, TopicSummary};

/// Marking scheme applied to every question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Fraction of a question's marks deducted for a wrong answer.
    /// `0.0` disables negative marking.
    #[serde(default)]
    pub wrong_answer_penalty: f64,
}

impl ScoringPolicy {
    /// Full marks for correct answers, nothing deducted for wrong ones.
    pub const NO_NEGATIVE_MARKING: ScoringPolicy = ScoringPolicy {
        wrong_answer_penalty: 0.0,
    };

    pub fn with_penalty(wrong_answer_penalty: f64) -> Self {
        Self {
            wrong_answer_penalty,
        }
    }

    fn marks_for(&self, question: &Question, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Correct => question.marks,
            Outcome::Wrong if self.wrong_answer_penalty > 0.0 => {
                -(question.marks * self.wrong_answer_penalty)
            }
            Outcome::Wrong | Outcome::Skipped => 0.0,
        }
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::NO_NEGATIVE_MARKING
    }
}

/// Everything the scoring engine looks at.
#[derive(Debug, Clone)]
pub struct ScoringInput<'a> {
    pub metadata: ReportMetadata,
    pub questions: &'a [Question],
    pub answers: &'a AnswerRegistry,
    pub reviews: &'a ReviewRegistry,
    pub elapsed_secs: u32,
}

/// Score an attempt.
pub fn score(input: &ScoringInput<'_>, policy: &ScoringPolicy) -> Report {
    let total = input.questions.len();
    let mut breakdown = Vec::with_capacity(total);

    for (position, question) in input.questions.iter().enumerate() {
        let submitted = input.answers.get(position);
        let outcome = match submitted {
            None => Outcome::Skipped,
            Some(label) if label == question.correct_option => Outcome::Correct,
            Some(_) => Outcome::Wrong,
        };
        breakdown.push(QuestionResult {
            position,
            question_id: question.id.clone(),
            topic: question.topic.clone(),
            submitted,
            correct_option: question.correct_option,
            outcome,
            marks_awarded: policy.marks_for(question, outcome),
            max_marks: question.marks,
            marked_for_review: input.reviews.is_flagged(position),
        });
    }

    let answered = breakdown
        .iter()
        .filter(|r| r.outcome != Outcome::Skipped)
        .count();
    let correct = breakdown
        .iter()
        .filter(|r| r.outcome == Outcome::Correct)
        .count();
    let marked_for_review = breakdown.iter().filter(|r| r.marked_for_review).count();

    Report {
        metadata: input.metadata.clone(),
        total,
        answered,
        correct,
        wrong: answered - correct,
        skipped: total - answered,
        marked_for_review,
        time_taken_secs: input.elapsed_secs,
        percentage: ratio_percent(correct, total),
        accuracy: ratio_percent(correct, answered),
        max_marks: round_to(breakdown.iter().map(|r| r.max_marks).sum(), 2),
        marks_obtained: round_to(breakdown.iter().map(|r| r.marks_awarded).sum(), 2),
        topics: summarize_topics(&breakdown),
        breakdown,
    }
}

/// Group breakdown rows by topic tag. Untagged questions are left out.
fn summarize_topics(breakdown: &[QuestionResult]) -> Vec<TopicSummary> {
    let mut by_topic: BTreeMap<&str, Vec<&QuestionResult>> = BTreeMap::new();
    for row in breakdown {
        if let Some(topic) = row.topic.as_deref() {
            by_topic.entry(topic).or_default().push(row);
        }
    }

    by_topic
        .into_iter()
        .map(|(topic, rows)| {
            let total = rows.len();
            let correct = rows
                .iter()
                .filter(|r| r.outcome == Outcome::Correct)
                .count();
            TopicSummary {
                topic: topic.to_string(),
                total,
                answered: rows
                    .iter()
                    .filter(|r| r.outcome != Outcome::Skipped)
                    .count(),
                correct,
                marks_obtained: round_to(rows.iter().map(|r| r.marks_awarded).sum(), 2),
                max_marks: round_to(rows.iter().map(|r| r.max_marks).sum(), 2),
                percentage: ratio_percent(correct, total),
            }
        })
        .collect()
}

/// `part / whole * 100` rounded to one decimal, 0 for an empty whole.
fn ratio_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 1)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
