//! The `mocktest take` command.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use mocktest_core::error::{RunError, SessionError};
use mocktest_core::model::{OptionLabel, DEFAULT_LOCALE};
use mocktest_core::navigation::Step;
use mocktest_core::parser;
use mocktest_core::report::{format_duration, format_marks, Report};
use mocktest_core::runner::{Command, ExamRunner, Navigation, RunnerConfig, SessionObserver};
use mocktest_core::session::{ExamSession, PaletteStatus};
use mocktest_core::timer::TICK_INTERVAL;
use mocktest_core::traits::{QuestionSetProvider, ReportSink};
use mocktest_providers::config::{load_config_from, BackendConfig};
use mocktest_providers::file::{FileQuestionProvider, JsonReportSink};
use mocktest_providers::{create_provider, create_sink};

use super::show::summary_table;

/// Report directory when neither `--output` nor a local backend names one.
const DEFAULT_OUTPUT_DIR: &str = "./mocktest-results";

/// Print the countdown every this many seconds.
const TICK_PRINT_EVERY_SECS: u32 = 30;

const HELP: &str = "Commands: a <A-D> answer | c clear | r mark for review | n next | p previous | g <number> go to | s submit";

/// Renders the session to the terminal and paces the input reader.
///
/// Every non-submit command produces exactly one of `on_update`,
/// `on_boundary` or `on_rejected`; each of them acknowledges the command so
/// the reader only parses the next line against the updated position.
struct ConsoleObserver {
    locale: String,
    position: Arc<AtomicUsize>,
    acks: std_mpsc::Sender<()>,
}

impl ConsoleObserver {
    fn ack(&self) {
        let _ = self.acks.send(());
    }

    fn render(&self, session: &ExamSession) {
        let position = session.current_position();
        self.position.store(position, Ordering::SeqCst);

        let Some(question) = session.current_question() else {
            return;
        };
        let total = session.questions().len();

        let mut header = format!("\nQ{}/{}", position + 1, total);
        if let Some(topic) = &question.topic {
            header.push_str(&format!(" [{topic}]"));
        }
        header.push_str(&format!(
            " ({} marks) | time left {}",
            format_marks(question.marks),
            format_duration(session.remaining_secs())
        ));
        if session.is_flagged(position) {
            header.push_str(" | marked for review");
        }
        println!("{header}");
        println!("{}", question.text.get(&self.locale).unwrap_or_default());

        let selected = session.answer(position);
        for option in &question.options {
            let marker = if selected == Some(option.label) { '*' } else { ' ' };
            println!(
                " {marker} {}) {}",
                option.label,
                option.text.get(&self.locale).unwrap_or_default()
            );
        }

        let palette: String = session
            .palette()
            .iter()
            .map(|status| match status {
                PaletteStatus::NotVisited => '.',
                PaletteStatus::NotAnswered => 'o',
                PaletteStatus::Answered => '#',
                PaletteStatus::MarkedForReview => 'r',
                PaletteStatus::AnsweredAndMarked => 'R',
            })
            .collect();
        let summary = session.palette_summary();
        println!(
            "Palette [{palette}] answered {} | not answered {} | marked {} | not visited {}",
            summary.answered + summary.answered_and_marked,
            summary.not_answered,
            summary.marked_for_review + summary.answered_and_marked,
            summary.not_visited
        );
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_start(&self, session: &ExamSession) {
        println!(
            "Exam {}: {} questions, {} on the clock",
            session.exam_id(),
            session.questions().len(),
            format_duration(session.remaining_secs())
        );
        println!("{HELP}");
        self.render(session);
        self.ack();
    }

    fn on_tick(&self, remaining_secs: u32) {
        if remaining_secs % TICK_PRINT_EVERY_SECS == 0 {
            println!("-- time left {} --", format_duration(remaining_secs));
        }
    }

    fn on_update(&self, session: &ExamSession) {
        self.render(session);
        self.ack();
    }

    fn on_boundary(&self, step: Step) {
        match step {
            Step::AtStart => println!("Already at the first question."),
            Step::AtEnd => println!("Already at the last question."),
            Step::Moved(_) => {}
        }
        self.ack();
    }

    fn on_rejected(&self, _command: &Command, error: &SessionError) {
        println!("Not applied: {error}");
        self.ack();
    }

    fn on_submitted(&self, report: &Report) {
        if report.is_forced() {
            println!("\nTime is up. Your answers were submitted automatically.");
        } else {
            println!("\nSubmitted.");
        }
    }
}

/// Parse one input line against the current position.
///
/// `Ok(None)` means the line carries no command (blank or help).
fn parse_command(line: &str, position: usize) -> Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();

    let command = match (verb.to_ascii_lowercase().as_str(), arg) {
        ("a", Some(label)) => Command::Select {
            position,
            option: label.parse::<OptionLabel>()?,
        },
        ("a", None) => return Err("usage: a <A-D>".into()),
        ("c", _) => Command::Clear(position),
        ("r", _) => Command::ToggleReview(position),
        ("n", _) => Command::Navigate(Navigation::Next),
        ("p", _) => Command::Navigate(Navigation::Previous),
        ("g", Some(number)) => {
            let number: usize = number
                .parse()
                .map_err(|_| format!("not a question number: {number}"))?;
            if number == 0 {
                return Err("question numbers start at 1".into());
            }
            Command::Navigate(Navigation::JumpTo(number - 1))
        }
        ("g", None) => return Err("usage: g <number>".into()),
        ("s", _) => Command::Submit,
        ("h" | "?" | "help", _) => {
            println!("{HELP}");
            return Ok(None);
        }
        (other, _) => return Err(format!("unknown command '{other}'. {HELP}")),
    };
    Ok(Some(command))
}

/// Read stdin on a plain thread, one command at a time.
///
/// The thread waits for an acknowledgement after each command, so piped
/// input is applied in order against the right question. It stops after
/// submit or when the session is gone.
fn spawn_input_reader(
    commands: mpsc::Sender<Command>,
    position: Arc<AtomicUsize>,
    acks: std_mpsc::Receiver<()>,
) {
    std::thread::spawn(move || {
        if acks.recv().is_err() {
            return;
        }
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_command(&line, position.load(Ordering::SeqCst)) {
                Ok(Some(command)) => {
                    if commands.blocking_send(command).is_err() || command == Command::Submit {
                        break;
                    }
                    if acks.recv().is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => println!("{message}"),
            }
        }
    });
}

/// Where a report the sink did not accept is kept.
fn unsent_report_path(output: Option<&Path>, exam_id: &str, report: &Report) -> PathBuf {
    let dir = output
        .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR), Path::to_path_buf)
        .join("unsent");
    JsonReportSink::new(dir).report_path(exam_id, report)
}

pub async fn execute(
    exam: Option<String>,
    question_set: Option<PathBuf>,
    duration: Option<u32>,
    output: Option<PathBuf>,
    locale: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if let Some(d) = duration {
        anyhow::ensure!(d > 0, "duration must be positive");
    }

    let config = load_config_from(config_path.as_deref())?;
    let locale = locale.unwrap_or_else(|| config.default_locale.clone());

    let (exam_id, provider, sink, set_duration): (
        String,
        Arc<dyn QuestionSetProvider>,
        Arc<dyn ReportSink>,
        Option<u32>,
    ) = match &question_set {
        Some(path) => {
            let exam_id = match exam {
                Some(id) => id,
                None if path.is_file() => parser::parse_question_set(path)?.id,
                None => anyhow::bail!("--exam is required when --question-set is a directory"),
            };
            let file_provider = FileQuestionProvider::new(path);
            let set = file_provider
                .load_set(&exam_id)
                .with_context(|| format!("failed to load question set '{exam_id}'"))?;
            let output_dir = output.clone().unwrap_or_else(|| match &config.backend {
                BackendConfig::Local { output_dir, .. } => output_dir.clone(),
                BackendConfig::Http { .. } => PathBuf::from(DEFAULT_OUTPUT_DIR),
            });
            let provider: Arc<dyn QuestionSetProvider> = Arc::new(file_provider);
            let sink: Arc<dyn ReportSink> = Arc::new(JsonReportSink::new(output_dir));
            (exam_id, provider, sink, Some(set.duration_secs))
        }
        None => {
            let exam_id = exam.context("--exam is required")?;
            let mut backend = config.backend.clone();
            if let (Some(dir), BackendConfig::Local { output_dir, .. }) = (&output, &mut backend) {
                *output_dir = dir.clone();
            }
            let set_duration = match &backend {
                BackendConfig::Local { question_dir, .. } => FileQuestionProvider::new(question_dir)
                    .load_set(&exam_id)
                    .ok()
                    .map(|set| set.duration_secs),
                BackendConfig::Http { .. } => None,
            };
            (
                exam_id,
                create_provider(&backend)?,
                create_sink(&backend)?,
                set_duration,
            )
        }
    };

    let duration_secs = duration
        .or(set_duration.filter(|d| *d > 0))
        .unwrap_or(config.default_duration_secs);

    tracing::debug!(exam = %exam_id, duration_secs, locale = %locale, "starting attempt");

    let runner = ExamRunner::new(
        provider,
        sink,
        RunnerConfig {
            duration_secs,
            tick_interval: TICK_INTERVAL,
            policy: config.scoring_policy(),
        },
    );

    let (tx, rx) = mpsc::channel(16);
    let (ack_tx, ack_rx) = std_mpsc::channel();
    let position = Arc::new(AtomicUsize::new(0));
    spawn_input_reader(tx, Arc::clone(&position), ack_rx);

    let observer = ConsoleObserver {
        locale: if locale.is_empty() {
            DEFAULT_LOCALE.to_string()
        } else {
            locale
        },
        position,
        acks: ack_tx,
    };

    match runner.run(&exam_id, rx, &observer).await {
        Ok(outcome) => {
            println!("{}", summary_table(&outcome.report));
            println!("Report saved: {}", outcome.acknowledgement.reference);
            Ok(())
        }
        Err(RunError::Delivery { report, source }) => {
            println!("{}", summary_table(&report));
            let fallback = unsent_report_path(output.as_deref(), &exam_id, &report);
            report.save_json(&fallback)?;
            eprintln!("Report kept locally at {}", fallback.display());
            Err(anyhow::Error::new(source).context("failed to deliver report"))
        }
        Err(RunError::Abandoned) => {
            anyhow::bail!("input closed before the exam was submitted; attempt abandoned")
        }
        Err(e) => Err(e.into()),
    }
}
