//! HTML results page generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use mocktest_core::report::{format_duration, format_marks, Outcome, Report, TopicSummary};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML results page from a report.
pub fn generate_html(report: &Report) -> String {
    let mut html = String::new();
    let exam = html_escape(&report.metadata.exam_id);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>mocktest result: {exam}</title>\n"));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{exam}</h1>\n"));
    let started = report
        .metadata
        .started_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    html.push_str(&format!(
        "<p class=\"meta\">Attempt <code>{}</code> | started {} | time taken {} of {}</p>\n",
        report.metadata.attempt_id,
        started,
        format_duration(report.time_taken_secs),
        format_duration(report.metadata.duration_secs)
    ));
    if report.is_forced() {
        html.push_str("<p class=\"notice\">Submitted automatically when time ran out.</p>\n");
    }
    html.push_str("</header>\n");

    // Score cards
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<div class=\"cards\">\n");
    for (label, value) in [
        ("Score", format!("{:.1}%", report.percentage)),
        ("Accuracy", format!("{:.1}%", report.accuracy)),
        (
            "Marks",
            format!(
                "{} / {}",
                format_marks(report.marks_obtained),
                format_marks(report.max_marks)
            ),
        ),
    ] {
        html.push_str(&format!(
            "<div class=\"card\"><span class=\"label\">{label}</span><span class=\"value\">{value}</span></div>\n"
        ));
    }
    html.push_str("</div>\n");

    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Total</th><th>Answered</th><th>Correct</th><th>Wrong</th><th>Skipped</th><th>Marked for review</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td class=\"correct\">{}</td><td class=\"wrong\">{}</td><td>{}</td><td>{}</td></tr></tbody>\n",
        report.total,
        report.answered,
        report.correct,
        report.wrong,
        report.skipped,
        report.marked_for_review
    ));
    html.push_str("</table>\n");
    html.push_str("</section>\n");

    // Topics
    if !report.topics.is_empty() {
        html.push_str("<section class=\"topics\">\n");
        html.push_str("<h2>Topics</h2>\n");
        html.push_str(&generate_bar_chart(&report.topics));
        html.push_str("</section>\n");
    }

    // Per-question results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Question</th><th onclick=\"sortTable(2)\">Topic</th><th onclick=\"sortTable(3)\">Answer</th><th onclick=\"sortTable(4)\">Correct</th><th onclick=\"sortTable(5)\">Result</th><th onclick=\"sortTable(6)\">Marks</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for q in &report.breakdown {
        let (class, text) = match q.outcome {
            Outcome::Correct => ("correct", "correct"),
            Outcome::Wrong => ("wrong", "wrong"),
            Outcome::Skipped => ("skipped", "skipped"),
        };
        let submitted = q
            .submitted
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        let flag = if q.marked_for_review {
            " <span class=\"flag\" title=\"marked for review\">&#9873;</span>"
        } else {
            ""
        };

        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} / {}</td></tr>\n",
            class,
            q.position + 1,
            flag,
            html_escape(&q.question_id),
            html_escape(q.topic.as_deref().unwrap_or("-")),
            submitted,
            q.correct_option,
            text,
            format_marks(q.marks_awarded),
            format_marks(q.max_marks)
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML results page to a file.
pub fn write_html_report(report: &Report, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn generate_bar_chart(topics: &[TopicSummary]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = topics.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, topic) in topics.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let share = (topic.percentage / 100.0).clamp(0.0, 1.0);
        let width = (share * max_width as f64) as usize;

        let color = if share >= 0.8 {
            "#22c55e"
        } else if share >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&topic.topic)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}% ({}/{})</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            topic.percentage,
            topic.correct,
            topic.total
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --correct: #dcfce7; --wrong: #fde2e2; --skipped: #f3f4f6; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --correct: #064e3b; --wrong: #7f1d1d; --skipped: #1f2937; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.notice { padding: 0.5rem 1rem; border-left: 4px solid #eab308; background: var(--skipped); }
.cards { display: flex; gap: 1rem; margin: 1rem 0; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; min-width: 8rem; }
.card .label { display: block; color: #6b7280; font-size: 0.85rem; }
.card .value { display: block; font-size: 1.6rem; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.correct { background: var(--correct); }
.wrong { background: var(--wrong); }
.skipped { background: var(--skipped); }
.flag { color: #7c3aed; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use mocktest_core::model::OptionLabel;
    use mocktest_core::report::{QuestionResult, ReportMetadata, SubmissionKind};

    fn make_test_report(submission: SubmissionKind) -> Report {
        Report {
            metadata: ReportMetadata {
                attempt_id: uuid::Uuid::nil(),
                exam_id: "physics <mock>".into(),
                submission,
                started_at: Some(chrono::Utc::now()),
                duration_secs: 600,
            },
            total: 2,
            answered: 1,
            correct: 1,
            wrong: 0,
            skipped: 1,
            marked_for_review: 1,
            time_taken_secs: 125,
            percentage: 50.0,
            accuracy: 100.0,
            max_marks: 4.0,
            marks_obtained: 2.0,
            breakdown: vec![
                QuestionResult {
                    position: 0,
                    question_id: "kinematics-1".into(),
                    topic: Some("kinematics".into()),
                    submitted: Some(OptionLabel::C),
                    correct_option: OptionLabel::C,
                    outcome: Outcome::Correct,
                    marks_awarded: 2.0,
                    max_marks: 2.0,
                    marked_for_review: false,
                },
                QuestionResult {
                    position: 1,
                    question_id: "optics-1".into(),
                    topic: Some("optics".into()),
                    submitted: None,
                    correct_option: OptionLabel::A,
                    outcome: Outcome::Skipped,
                    marks_awarded: 0.0,
                    max_marks: 2.0,
                    marked_for_review: true,
                },
            ],
            topics: vec![
                TopicSummary {
                    topic: "kinematics".into(),
                    total: 1,
                    answered: 1,
                    correct: 1,
                    marks_obtained: 2.0,
                    max_marks: 2.0,
                    percentage: 100.0,
                },
                TopicSummary {
                    topic: "optics".into(),
                    total: 1,
                    answered: 0,
                    correct: 0,
                    marks_obtained: 0.0,
                    max_marks: 2.0,
                    percentage: 0.0,
                },
            ],
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report(SubmissionKind::Manual);
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("kinematics-1"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("2 / 4"));
        assert!(html.contains("02:05 of 10:00"));
        assert!(html.contains("<svg"));
        assert!(!html.contains("time ran out"));
    }

    #[test]
    fn html_report_escapes_exam_id() {
        let html = generate_html(&make_test_report(SubmissionKind::Manual));
        assert!(html.contains("physics &lt;mock&gt;"));
        assert!(!html.contains("physics <mock>"));
    }

    #[test]
    fn html_report_marks_forced_submission() {
        let html = generate_html(&make_test_report(SubmissionKind::Forced));
        assert!(html.contains("time ran out"));
    }

    #[test]
    fn html_report_without_topics_has_no_chart() {
        let mut report = make_test_report(SubmissionKind::Manual);
        report.topics.clear();
        let html = generate_html(&report);
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report(SubmissionKind::Manual);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
