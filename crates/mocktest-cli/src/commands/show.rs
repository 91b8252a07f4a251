//! The `mocktest show` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use mocktest_core::report::{format_duration, format_marks, Outcome, Report};
use mocktest_report::html::{generate_html, write_html_report};

pub fn execute(report_path: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let report = Report::load_json(&report_path)?;

    match format.as_str() {
        "html" => match &output {
            Some(path) => {
                write_html_report(&report, path)?;
                eprintln!("HTML report: {}", path.display());
            }
            None => println!("{}", generate_html(&report)),
        },
        "json" => emit(&serde_json::to_string_pretty(&report)?, output.as_deref())?,
        "markdown" | "md" => emit(&report.to_markdown(), output.as_deref())?,
        "text" => emit(&render_text(&report), output.as_deref())?,
        other => anyhow::bail!("unknown format '{other}' (expected text, json, markdown or html)"),
    }

    Ok(())
}

fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Written to: {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

/// Plain-text result: headline, summary table and per-question table.
pub(crate) fn render_text(report: &Report) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Result: {} (attempt {})\n",
        report.metadata.exam_id, report.metadata.attempt_id
    ));
    if report.is_forced() {
        out.push_str("Submitted automatically when time ran out.\n");
    }
    out.push('\n');
    out.push_str(&summary_table(report).to_string());
    out.push('\n');

    if !report.topics.is_empty() {
        let mut topics = Table::new();
        topics.set_header(vec!["Topic", "Correct", "Answered", "Total", "Marks", "Score"]);
        for t in &report.topics {
            topics.add_row(vec![
                Cell::new(&t.topic),
                Cell::new(t.correct),
                Cell::new(t.answered),
                Cell::new(t.total),
                Cell::new(format!(
                    "{}/{}",
                    format_marks(t.marks_obtained),
                    format_marks(t.max_marks)
                )),
                Cell::new(format!("{:.1}%", t.percentage)),
            ]);
        }
        out.push('\n');
        out.push_str(&topics.to_string());
        out.push('\n');
    }

    let mut questions = Table::new();
    questions.set_header(vec!["#", "Question", "Answer", "Correct", "Result", "Marks"]);
    for q in &report.breakdown {
        let result = match q.outcome {
            Outcome::Correct => "correct",
            Outcome::Wrong => "wrong",
            Outcome::Skipped => "skipped",
        };
        let position = if q.marked_for_review {
            format!("{} (R)", q.position + 1)
        } else {
            (q.position + 1).to_string()
        };
        questions.add_row(vec![
            Cell::new(position),
            Cell::new(&q.question_id),
            Cell::new(
                q.submitted
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(q.correct_option),
            Cell::new(result),
            Cell::new(format_marks(q.marks_awarded)),
        ]);
    }
    out.push('\n');
    out.push_str(&questions.to_string());

    out
}

/// The headline numbers of a report as a single-row table.
pub(crate) fn summary_table(report: &Report) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Score",
        "Accuracy",
        "Marks",
        "Correct",
        "Wrong",
        "Skipped",
        "Review",
        "Time",
    ]);
    table.add_row(vec![
        Cell::new(format!("{:.1}%", report.percentage)),
        Cell::new(format!("{:.1}%", report.accuracy)),
        Cell::new(format!(
            "{}/{}",
            format_marks(report.marks_obtained),
            format_marks(report.max_marks)
        )),
        Cell::new(format!("{}/{}", report.correct, report.total)),
        Cell::new(report.wrong),
        Cell::new(report.skipped),
        Cell::new(report.marked_for_review),
        Cell::new(format_duration(report.time_taken_secs)),
    ]);
    table
}
