//! Drives one exam attempt end to end.
//!
//! The runner fetches the questions, starts a session, and then serializes
//! two event sources into it: clock ticks from a spawned ticker and student
//! commands from a channel. Whichever of "submit" or "time up" arrives first
//! produces the report; the session's own state guard makes the other a
//! no-op. The report is handed to the sink exactly once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{RunError, SessionError};
use crate::model::OptionLabel;
use crate::navigation::Step;
use crate::report::Report;
use crate::scoring::ScoringPolicy;
use crate::session::{ExamSession, Tick};
use crate::timer::{spawn_ticker, TICK_INTERVAL};
use crate::traits::{Acknowledgement, QuestionSetProvider, ReportSink};

/// Relative or absolute move requested by the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
    JumpTo(usize),
}

/// A student action delivered to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select { position: usize, option: OptionLabel },
    Clear(usize),
    ToggleReview(usize),
    Navigate(Navigation),
    Submit,
}

/// Callbacks fired while an attempt runs.
pub trait SessionObserver: Send + Sync {
    fn on_start(&self, session: &ExamSession);
    fn on_tick(&self, remaining_secs: u32);
    fn on_update(&self, session: &ExamSession);
    fn on_boundary(&self, step: Step);
    fn on_rejected(&self, command: &Command, error: &SessionError);
    fn on_submitted(&self, report: &Report);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_start(&self, _: &ExamSession) {}
    fn on_tick(&self, _: u32) {}
    fn on_update(&self, _: &ExamSession) {}
    fn on_boundary(&self, _: Step) {}
    fn on_rejected(&self, _: &Command, _: &SessionError) {}
    fn on_submitted(&self, _: &Report) {}
}

/// Configuration for the exam runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Length of the attempt.
    pub duration_secs: u32,
    /// Spacing between clock ticks.
    pub tick_interval: Duration,
    /// Marking scheme.
    pub policy: ScoringPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            duration_secs: 3600,
            tick_interval: TICK_INTERVAL,
            policy: ScoringPolicy::default(),
        }
    }
}

/// A submitted and delivered attempt.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Arc<Report>,
    pub acknowledgement: Acknowledgement,
}

/// Runs attempts against one provider/sink pair.
pub struct ExamRunner {
    provider: Arc<dyn QuestionSetProvider>,
    sink: Arc<dyn ReportSink>,
    config: RunnerConfig,
}

impl ExamRunner {
    pub fn new(
        provider: Arc<dyn QuestionSetProvider>,
        sink: Arc<dyn ReportSink>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            provider,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one attempt at `exam_id` until it is submitted or time runs out.
    ///
    /// Closing `commands` before submission abandons the attempt: the clock
    /// is stopped and nothing is delivered.
    pub async fn run(
        &self,
        exam_id: &str,
        mut commands: mpsc::Receiver<Command>,
        observer: &dyn SessionObserver,
    ) -> Result<RunOutcome, RunError> {
        let questions = self.provider.fetch_questions(exam_id).await?;
        tracing::debug!(
            exam = exam_id,
            provider = self.provider.name(),
            count = questions.len(),
            "questions loaded"
        );

        let mut session = ExamSession::begin(
            exam_id,
            questions,
            self.config.duration_secs,
            self.config.policy,
        )?;
        observer.on_start(&session);

        let (timer, mut ticks) = spawn_ticker(self.config.tick_interval);

        let report = loop {
            tokio::select! {
                Some(_) = ticks.recv() => match session.tick() {
                    Tick::Remaining(remaining) => observer.on_tick(remaining),
                    Tick::Expired(report) => break report,
                    Tick::Inactive => {}
                },
                command = commands.recv() => match command {
                    Some(command) => match apply(&mut session, &command) {
                        Ok(Applied::Submitted(report)) => break report,
                        Ok(Applied::Boundary(step)) => observer.on_boundary(step),
                        Ok(Applied::Updated) => observer.on_update(&session),
                        Err(e) => {
                            tracing::warn!(?command, "command rejected: {e}");
                            observer.on_rejected(&command, &e);
                        }
                    },
                    None => {
                        timer.cancel();
                        session.teardown();
                        return Err(RunError::Abandoned);
                    }
                },
            }
        };
        timer.cancel();
        observer.on_submitted(&report);

        match self.sink.submit_report(exam_id, &report).await {
            Ok(acknowledgement) => {
                tracing::info!(
                    exam = exam_id,
                    sink = self.sink.name(),
                    reference = %acknowledgement.reference,
                    "report delivered"
                );
                Ok(RunOutcome {
                    report,
                    acknowledgement,
                })
            }
            Err(source) => {
                tracing::warn!(exam = exam_id, sink = self.sink.name(), "report delivery failed: {source}");
                Err(RunError::Delivery { report, source })
            }
        }
    }
}

/// What a command did to the session.
#[derive(Debug)]
enum Applied {
    Updated,
    /// A relative move hit the first or last question.
    Boundary(Step),
    Submitted(Arc<Report>),
}

fn apply(session: &mut ExamSession, command: &Command) -> Result<Applied, SessionError> {
    match *command {
        Command::Select { position, option } => session.select_answer(position, option)?,
        Command::Clear(position) => {
            session.clear_answer(position)?;
        }
        Command::ToggleReview(position) => {
            session.toggle_review(position)?;
        }
        Command::Navigate(Navigation::Previous) => return Ok(moved(session.previous()?)),
        Command::Navigate(Navigation::Next) => return Ok(moved(session.next()?)),
        Command::Navigate(Navigation::JumpTo(target)) => {
            session.navigate(target)?;
        }
        Command::Submit => return Ok(Applied::Submitted(session.request_submit()?)),
    }
    Ok(Applied::Updated)
}

fn moved(step: Step) -> Applied {
    match step {
        Step::Moved(_) => Applied::Updated,
        Step::AtStart | Step::AtEnd => Applied::Boundary(step),
    }
}
