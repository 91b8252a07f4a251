//! The `mocktest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use mocktest_core::parser;

pub fn execute(question_set_path: PathBuf) -> Result<()> {
    let sets = if question_set_path.is_dir() {
        parser::load_question_directory(&question_set_path)?
    } else {
        vec![parser::parse_question_set(&question_set_path)?]
    };

    anyhow::ensure!(
        !sets.is_empty(),
        "no question sets found in {}",
        question_set_path.display()
    );

    let mut total_warnings = 0;

    for set in &sets {
        println!(
            "Question set: {} [{}] ({} questions, {}s)",
            set.title,
            set.id,
            set.questions.len(),
            set.duration_secs
        );

        let warnings = parser::validate_question_set(set);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
