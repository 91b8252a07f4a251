//! TOML question set parser.
//!
//! Loads question sets from TOML files and directories, and validates them.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    LocalizedText, OptionLabel, Question, QuestionOption, QuestionSet, DEFAULT_LOCALE, OPTION_COUNT,
};

/// Intermediate TOML structure for parsing question set files.
#[derive(Debug, Deserialize)]
struct TomlQuestionFile {
    question_set: TomlQuestionSetHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestionSetHeader {
    id: String,
    title: String,
    #[serde(default = "default_duration")]
    duration_secs: u32,
}

fn default_duration() -> u32 {
    3600
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default)]
    index: Option<u32>,
    text: TomlText,
    options: BTreeMap<String, TomlText>,
    correct: String,
    #[serde(default = "default_marks")]
    marks: f64,
    #[serde(default)]
    explanation: Option<TomlText>,
    #[serde(default)]
    topic: Option<String>,
}

fn default_marks() -> f64 {
    1.0
}

/// Either a plain string (default locale) or a `locale = "text"` table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl From<TomlText> for LocalizedText {
    fn from(text: TomlText) -> Self {
        match text {
            TomlText::Plain(s) => LocalizedText::new(s),
            TomlText::Localized(map) => map.into_iter().collect(),
        }
    }
}

/// Parse a single TOML file into a `QuestionSet`.
pub fn parse_question_set(path: &Path) -> Result<QuestionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set file: {}", path.display()))?;

    parse_question_set_str(&content, path)
}

/// Parse a TOML string into a `QuestionSet`.
pub fn parse_question_set_str(content: &str, source_path: &Path) -> Result<QuestionSet> {
    let parsed: TomlQuestionFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(position, q)| {
            let correct_option: OptionLabel = q
                .correct
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;

            let mut options = q
                .options
                .into_iter()
                .map(|(label, text)| {
                    let label: OptionLabel = label
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
                    Ok(QuestionOption {
                        label,
                        text: text.into(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            options.sort_by_key(|o| o.label);
            if let Some(pair) = options.windows(2).find(|pair| pair[0].label == pair[1].label) {
                anyhow::bail!(
                    "question {}: option {} is given more than once",
                    q.id,
                    pair[0].label
                );
            }

            Ok(Question {
                index: q.index.unwrap_or(position as u32 + 1),
                id: q.id,
                text: q.text.into(),
                options,
                correct_option,
                marks: q.marks,
                explanation: q.explanation.map(Into::into),
                topic: q.topic,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionSet {
        id: parsed.question_set.id,
        title: parsed.question_set.title,
        duration_secs: parsed.question_set.duration_secs,
        questions,
    })
}

/// Recursively load all `.toml` question set files from a directory.
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_question_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_question_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    sets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(sets)
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn set(message: impl Into<String>) -> Self {
        Self {
            question_id: None,
            message: message.into(),
        }
    }

    fn question(q: &Question, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(q.id.clone()),
            message: message.into(),
        }
    }
}

/// Validate a question set for issues that would make an attempt unfair or
/// impossible to start.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.questions.is_empty() {
        warnings.push(ValidationWarning::set("question set has no questions"));
    }
    if set.duration_secs == 0 {
        warnings.push(ValidationWarning::set("duration_secs must be positive"));
    }

    let mut seen_ids = HashSet::new();
    for q in &set.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning::question(
                q,
                format!("duplicate question ID: {}", q.id),
            ));
        }
    }

    for q in &set.questions {
        if !q.has_option(q.correct_option) {
            warnings.push(ValidationWarning::question(
                q,
                format!("correct option {} is not among the options", q.correct_option),
            ));
        }
        if q.options.len() != OPTION_COUNT {
            warnings.push(ValidationWarning::question(
                q,
                format!("expected {OPTION_COUNT} options, found {}", q.options.len()),
            ));
        }
        if q.marks <= 0.0 {
            warnings.push(ValidationWarning::question(q, "marks must be positive"));
        }
        if !q.text.has_locale(DEFAULT_LOCALE) {
            warnings.push(ValidationWarning::question(
                q,
                format!("question text has no '{DEFAULT_LOCALE}' variant"),
            ));
        }
        if q.text.get(DEFAULT_LOCALE).is_some_and(|t| t.trim().is_empty()) {
            warnings.push(ValidationWarning::question(q, "question text is empty"));
        }
    }

    warnings
}
