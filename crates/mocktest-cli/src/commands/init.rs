//! The `mocktest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("mocktest.toml").exists() {
        println!("mocktest.toml already exists, skipping.");
    } else {
        std::fs::write("mocktest.toml", SAMPLE_CONFIG)?;
        println!("Created mocktest.toml");
    }

    std::fs::create_dir_all("question-sets")?;
    let sample_path = std::path::Path::new("question-sets/sample.toml");
    if sample_path.exists() {
        println!("question-sets/sample.toml already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_QUESTION_SET)?;
        println!("Created question-sets/sample.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: mocktest validate --question-set question-sets/sample.toml");
    println!("  2. Run: mocktest take --exam sample");
    println!("  3. To use an exam portal, switch [backend] in mocktest.toml to type = \"http\"");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mocktest configuration

default_duration_secs = 3600
# Fraction of a question's marks deducted for a wrong answer (0 disables).
wrong_answer_penalty = 0.0
default_locale = "en"

[backend]
type = "local"
question_dir = "./question-sets"
output_dir = "./mocktest-results"

# [backend]
# type = "http"
# base_url = "https://portal.example.com/api"
# api_token = "${MOCKTEST_API_TOKEN}"
# timeout_secs = 30
"#;

const SAMPLE_QUESTION_SET: &str = r#"[question_set]
id = "sample"
title = "Sample Exam"
duration_secs = 300

[[questions]]
id = "arith-1"
topic = "arithmetic"
text = { en = "What is 7 x 8?", hi = "7 x 8 kitna hota hai?" }
correct = "C"
explanation = "7 x 8 = 56"

[questions.options]
A = "54"
B = "48"
C = "56"
D = "64"

[[questions]]
id = "geo-1"
topic = "geography"
text = "Which is the longest river in the world?"
correct = "A"

[questions.options]
A = "Nile"
B = "Amazon"
C = "Yangtze"
D = "Mississippi"

[[questions]]
id = "sci-1"
topic = "science"
marks = 2.0
text = "Which gas do plants absorb during photosynthesis?"
correct = "B"

[questions.options]
A = "Oxygen"
B = "Carbon dioxide"
C = "Nitrogen"
D = "Hydrogen"
"#;
