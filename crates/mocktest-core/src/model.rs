//! Core data model types for mocktest.
//!
//! Questions arrive from a question set provider already normalized into
//! these shapes and stay immutable for the lifetime of a session.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Locale used when a requested text variant is missing.
pub const DEFAULT_LOCALE: &str = "en";

/// Number of options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Label of one answer option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// All labels in display order.
    pub const ALL: [OptionLabel; OPTION_COUNT] =
        [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            other => Err(format!("unknown option label: {other}")),
        }
    }
}

/// Text with one variant per locale (e.g. "en", "hi").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    /// Text with a single variant in the default locale.
    pub fn new(text: impl Into<String>) -> Self {
        Self::from_iter([(DEFAULT_LOCALE.to_string(), text.into())])
    }

    /// Add or replace a locale variant.
    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(locale.into(), text.into());
        self
    }

    /// Look up a variant, falling back to the default locale and then to
    /// whatever variant exists.
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0
            .get(locale)
            .or_else(|| self.0.get(DEFAULT_LOCALE))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.0.contains_key(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|t| t.trim().is_empty())
    }
}

impl FromIterator<(String, String)> for LocalizedText {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One labeled answer option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: OptionLabel,
    pub text: LocalizedText,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within a session.
    pub id: String,
    /// Display index as authored (1-based in most banks).
    pub index: u32,
    /// Question text per locale.
    pub text: LocalizedText,
    /// The labeled options, in display order.
    pub options: Vec<QuestionOption>,
    /// Label of the correct option.
    pub correct_option: OptionLabel,
    /// Points awarded for a correct answer.
    pub marks: f64,
    /// Worked explanation shown after submission.
    #[serde(default)]
    pub explanation: Option<LocalizedText>,
    /// Subject/topic tag used for topic-wise breakdowns.
    #[serde(default)]
    pub topic: Option<String>,
}

impl Question {
    /// Whether `label` is one of this question's options.
    pub fn has_option(&self, label: OptionLabel) -> bool {
        self.options.iter().any(|o| o.label == label)
    }

    pub fn option(&self, label: OptionLabel) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.label == label)
    }
}

/// A named, ordered collection of questions for one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    /// Exam identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Suggested duration for an attempt.
    pub duration_secs: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_label_display_and_parse() {
        assert_eq!(OptionLabel::B.to_string(), "B");
        assert_eq!("c".parse::<OptionLabel>().unwrap(), OptionLabel::C);
        assert_eq!(" D ".parse::<OptionLabel>().unwrap(), OptionLabel::D);
        assert!("E".parse::<OptionLabel>().is_err());
        assert!("".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn option_label_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&OptionLabel::A).unwrap(), "\"A\"");
        let label: OptionLabel = serde_json::from_str("\"D\"").unwrap();
        assert_eq!(label, OptionLabel::D);
    }

    #[test]
    fn localized_text_fallback() {
        let text = LocalizedText::new("Capital of France?").with("hi", "फ्रांस की राजधानी?");
        assert_eq!(text.get("hi"), Some("फ्रांस की राजधानी?"));
        assert_eq!(text.get("fr"), Some("Capital of France?"));

        let only_hindi = LocalizedText::default().with("hi", "प्रश्न");
        assert_eq!(only_hindi.get("en"), Some("प्रश्न"));
        assert_eq!(LocalizedText::default().get("en"), None);
    }

    #[test]
    fn question_option_lookup() {
        let question = Question {
            id: "q1".into(),
            index: 1,
            text: LocalizedText::new("2 + 2 = ?"),
            options: vec![
                QuestionOption {
                    label: OptionLabel::A,
                    text: LocalizedText::new("3"),
                },
                QuestionOption {
                    label: OptionLabel::B,
                    text: LocalizedText::new("4"),
                },
            ],
            correct_option: OptionLabel::B,
            marks: 2.0,
            explanation: None,
            topic: None,
        };
        assert!(question.has_option(OptionLabel::A));
        assert!(!question.has_option(OptionLabel::D));
        assert_eq!(
            question.option(OptionLabel::B).and_then(|o| o.text.get("en")),
            Some("4")
        );
    }
}
