//! The per-attempt session controller.
//!
//! An [`ExamSession`] owns the countdown, the navigator and both registries
//! for one exam attempt, and moves through
//! `NotStarted → InProgress → Submitting → Submitted`. Submission, whether
//! requested by the student or forced by the clock, scores the attempt at
//! most once; later submit requests hand back the same report.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{OptionLabel, Question};
use crate::navigation::{Navigator, Step};
use crate::registry::{AnswerRegistry, ReviewRegistry};
use crate::report::{Report, ReportMetadata, SubmissionKind};
use crate::scoring::{score, ScoringInput, ScoringPolicy};
use crate::timer::{Countdown, TickOutcome};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Submitting,
    Submitted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::NotStarted => write!(f, "not_started"),
            SessionStatus::InProgress => write!(f, "in_progress"),
            SessionStatus::Submitting => write!(f, "submitting"),
            SessionStatus::Submitted => write!(f, "submitted"),
        }
    }
}

/// What a clock tick did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Time is still running; seconds left.
    Remaining(u32),
    /// Time ran out and the attempt was force-submitted.
    Expired(Arc<Report>),
    /// The session is not in progress or its clock is stopped.
    Inactive,
}

/// Question palette state for one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteStatus {
    NotVisited,
    NotAnswered,
    Answered,
    MarkedForReview,
    AnsweredAndMarked,
}

/// Palette counts, as shown in the legend next to the question grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteSummary {
    pub not_visited: usize,
    pub not_answered: usize,
    pub answered: usize,
    pub marked_for_review: usize,
    pub answered_and_marked: usize,
}

/// One student's timed attempt at one exam.
#[derive(Debug)]
pub struct ExamSession {
    attempt_id: Uuid,
    exam_id: String,
    policy: ScoringPolicy,
    questions: Arc<[Question]>,
    countdown: Countdown,
    navigator: Navigator,
    answers: AnswerRegistry,
    reviews: ReviewRegistry,
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
    report: Option<Arc<Report>>,
}

impl ExamSession {
    /// A not-yet-started session for `exam_id` with the default scoring policy.
    pub fn new(exam_id: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            exam_id: exam_id.into(),
            policy: ScoringPolicy::default(),
            questions: Arc::from(Vec::<Question>::new()),
            countdown: Countdown::new(0),
            navigator: Navigator::default(),
            answers: AnswerRegistry::new(),
            reviews: ReviewRegistry::new(),
            status: SessionStatus::NotStarted,
            started_at: None,
            report: None,
        }
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create and start a session in one step.
    ///
    /// On error no session exists.
    pub fn begin(
        exam_id: impl Into<String>,
        questions: impl Into<Arc<[Question]>>,
        duration_secs: u32,
        policy: ScoringPolicy,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(exam_id).with_policy(policy);
        session.start(questions, duration_secs)?;
        Ok(session)
    }

    /// Load the question set, reset position to the first question and start
    /// the countdown.
    pub fn start(
        &mut self,
        questions: impl Into<Arc<[Question]>>,
        duration_secs: u32,
    ) -> Result<(), SessionError> {
        self.expect_status(SessionStatus::NotStarted)?;

        let questions = questions.into();
        if questions.is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "question set is empty".into(),
            ));
        }
        if duration_secs == 0 {
            return Err(SessionError::InvalidConfiguration(
                "duration must be positive".into(),
            ));
        }

        self.navigator = Navigator::new(questions.len());
        self.questions = questions;
        self.countdown = Countdown::new(duration_secs);
        self.countdown.start();
        self.started_at = Some(Utc::now());
        self.status = SessionStatus::InProgress;

        tracing::info!(
            exam = %self.exam_id,
            attempt = %self.attempt_id,
            questions = self.questions.len(),
            duration_secs,
            "session started"
        );
        Ok(())
    }

    /// Record `option` as the answer for `position`, replacing any earlier one.
    pub fn select_answer(
        &mut self,
        position: usize,
        option: OptionLabel,
    ) -> Result<(), SessionError> {
        self.expect_status(SessionStatus::InProgress)?;
        let question = self.question_at(position)?;
        if !question.has_option(option) {
            return Err(SessionError::InvalidOption { position, option });
        }
        self.answers.upsert(position, option);
        tracing::debug!(position, %option, "answer selected");
        Ok(())
    }

    /// Remove the answer for `position`, returning what was selected.
    pub fn clear_answer(&mut self, position: usize) -> Result<Option<OptionLabel>, SessionError> {
        self.expect_status(SessionStatus::InProgress)?;
        self.navigator.check(position)?;
        Ok(self.answers.remove(position))
    }

    /// Flip the review flag for `position` and return its new value.
    pub fn toggle_review(&mut self, position: usize) -> Result<bool, SessionError> {
        self.expect_status(SessionStatus::InProgress)?;
        self.navigator.check(position)?;
        let flagged = self.reviews.toggle(position);
        tracing::debug!(position, flagged, "review flag toggled");
        Ok(flagged)
    }

    /// Move to `target`. Out-of-range targets are rejected, not clamped.
    pub fn navigate(&mut self, target: usize) -> Result<usize, SessionError> {
        self.expect_status(SessionStatus::InProgress)?;
        self.navigator.jump_to(target)
    }

    pub fn previous(&mut self) -> Result<Step, SessionError> {
        self.expect_status(SessionStatus::InProgress)?;
        Ok(self.navigator.previous())
    }

    pub fn next(&mut self) -> Result<Step, SessionError> {
        self.expect_status(SessionStatus::InProgress)?;
        Ok(self.navigator.next())
    }

    /// Submit the attempt.
    ///
    /// The first call scores the attempt; any later call, including one that
    /// races a forced submission, returns the report already produced.
    pub fn request_submit(&mut self) -> Result<Arc<Report>, SessionError> {
        match self.status {
            SessionStatus::InProgress => Ok(self.submit(SubmissionKind::Manual)),
            SessionStatus::Submitting | SessionStatus::Submitted => {
                self.report.clone().ok_or(SessionError::InvalidState {
                    status: self.status,
                    expected: SessionStatus::InProgress,
                })
            }
            SessionStatus::NotStarted => Err(SessionError::InvalidState {
                status: self.status,
                expected: SessionStatus::InProgress,
            }),
        }
    }

    /// Feed one clock tick. Expiry force-submits the attempt exactly once.
    pub fn tick(&mut self) -> Tick {
        if self.status != SessionStatus::InProgress {
            return Tick::Inactive;
        }
        match self.countdown.tick() {
            TickOutcome::Ticked(remaining) => {
                tracing::debug!(remaining, "tick");
                Tick::Remaining(remaining)
            }
            TickOutcome::Expired => Tick::Expired(self.submit(SubmissionKind::Forced)),
            TickOutcome::Ignored => Tick::Inactive,
        }
    }

    /// Stop the countdown so no further tick can reach this session.
    pub fn teardown(&mut self) {
        if self.countdown.is_running() {
            tracing::info!(exam = %self.exam_id, attempt = %self.attempt_id, "session torn down");
        }
        self.countdown.stop();
    }

    fn submit(&mut self, submission: SubmissionKind) -> Arc<Report> {
        self.status = SessionStatus::Submitting;
        self.countdown.stop();

        let input = ScoringInput {
            metadata: ReportMetadata {
                attempt_id: self.attempt_id,
                exam_id: self.exam_id.clone(),
                submission,
                started_at: self.started_at,
                duration_secs: self.countdown.total_secs(),
            },
            questions: &self.questions,
            answers: &self.answers,
            reviews: &self.reviews,
            elapsed_secs: self.countdown.elapsed_secs(),
        };
        let report = Arc::new(score(&input, &self.policy));

        tracing::info!(
            exam = %self.exam_id,
            attempt = %self.attempt_id,
            ?submission,
            correct = report.correct,
            total = report.total,
            "session submitted"
        );

        self.report = Some(Arc::clone(&report));
        self.status = SessionStatus::Submitted;
        report
    }

    fn expect_status(&self, expected: SessionStatus) -> Result<(), SessionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                status: self.status,
                expected,
            })
        }
    }

    fn question_at(&self, position: usize) -> Result<&Question, SessionError> {
        self.questions
            .get(position)
            .ok_or(SessionError::InvalidPosition {
                position,
                len: self.questions.len(),
            })
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn exam_id(&self) -> &str {
        &self.exam_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// The shared, read-only question sequence.
    pub fn questions(&self) -> Arc<[Question]> {
        Arc::clone(&self.questions)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.countdown.elapsed_secs()
    }

    pub fn current_position(&self) -> usize {
        self.navigator.position()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.navigator.position())
    }

    pub fn answer(&self, position: usize) -> Option<OptionLabel> {
        self.answers.get(position)
    }

    pub fn is_flagged(&self, position: usize) -> bool {
        self.reviews.is_flagged(position)
    }

    pub fn answers(&self) -> &AnswerRegistry {
        &self.answers
    }

    pub fn reviews(&self) -> &ReviewRegistry {
        &self.reviews
    }

    /// The report, once the attempt has been submitted.
    pub fn report(&self) -> Option<Arc<Report>> {
        self.report.clone()
    }

    pub fn palette_status(&self, position: usize) -> PaletteStatus {
        let answered = self.answers.is_answered(position);
        let flagged = self.reviews.is_flagged(position);
        match (answered, flagged) {
            (true, true) => PaletteStatus::AnsweredAndMarked,
            (true, false) => PaletteStatus::Answered,
            (false, true) => PaletteStatus::MarkedForReview,
            (false, false) if self.navigator.is_visited(position) => PaletteStatus::NotAnswered,
            (false, false) => PaletteStatus::NotVisited,
        }
    }

    /// Palette state for every position, in order.
    pub fn palette(&self) -> Vec<PaletteStatus> {
        (0..self.questions.len())
            .map(|p| self.palette_status(p))
            .collect()
    }

    pub fn palette_summary(&self) -> PaletteSummary {
        let mut summary = PaletteSummary::default();
        for status in self.palette() {
            match status {
                PaletteStatus::NotVisited => summary.not_visited += 1,
                PaletteStatus::NotAnswered => summary.not_answered += 1,
                PaletteStatus::Answered => summary.answered += 1,
                PaletteStatus::MarkedForReview => summary.marked_for_review += 1,
                PaletteStatus::AnsweredAndMarked => summary.answered_and_marked += 1,
            }
        }
        summary
    }
}
