//! REST exam portal backend.
//!
//! `GET {base}/exams/{id}/questions` supplies the question set and
//! `POST {base}/exams/{id}/reports` receives the finished report.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use mocktest_core::error::{LoadError, SubmitError};
use mocktest_core::model::{LocalizedText, OptionLabel, Question, QuestionOption};
use mocktest_core::report::Report;
use mocktest_core::traits::{Acknowledgement, QuestionSetProvider, ReportSink};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for an exam portal. Serves as both provider and sink.
pub struct HttpBackend {
    base_url: String,
    api_token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, api_token: Option<String>, timeout_secs: u64) -> Self {
        let timeout_secs = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.is_empty()),
            timeout_secs,
            client,
        }
    }

    /// `{base}/exams/{exam_id}/{resource}` with the exam id percent-encoded
    /// as a single path segment.
    fn url(&self, exam_id: &str, resource: &str) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| format!("invalid base URL {}: {e}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| format!("base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["exams", exam_id, resource]);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Response body: either `{"questions": [...]}` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireQuestionSet {
    Wrapped { questions: Vec<WireQuestion> },
    Bare(Vec<WireQuestion>),
}

impl WireQuestionSet {
    fn into_questions(self) -> Vec<WireQuestion> {
        match self {
            WireQuestionSet::Wrapped { questions } | WireQuestionSet::Bare(questions) => questions,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl From<WireText> for LocalizedText {
    fn from(text: WireText) -> Self {
        match text {
            WireText::Plain(s) => LocalizedText::new(s),
            WireText::Localized(map) => map.into_iter().collect(),
        }
    }
}

/// One question as the portal sends it. Options arrive either as a nested
/// `options` map or as flat `optionA`..`optionD` fields.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    id: WireId,
    #[serde(default)]
    index: Option<u32>,
    #[serde(alias = "question")]
    text: WireText,
    #[serde(default)]
    options: Option<BTreeMap<String, WireText>>,
    #[serde(default)]
    option_a: Option<WireText>,
    #[serde(default)]
    option_b: Option<WireText>,
    #[serde(default)]
    option_c: Option<WireText>,
    #[serde(default)]
    option_d: Option<WireText>,
    #[serde(alias = "correct", alias = "answer")]
    correct_option: String,
    #[serde(default)]
    marks: Option<f64>,
    #[serde(default)]
    explanation: Option<WireText>,
    #[serde(default)]
    topic: Option<String>,
}

fn normalize(position: usize, wire: WireQuestion) -> Result<Question, LoadError> {
    let id = match wire.id {
        WireId::Number(n) => n.to_string(),
        WireId::Text(s) => s,
    };

    let mut options = match wire.options {
        Some(map) => map
            .into_iter()
            .map(|(label, text)| {
                let label: OptionLabel = label
                    .parse()
                    .map_err(|e: String| LoadError::Parse(format!("question {id}: {e}")))?;
                Ok(QuestionOption {
                    label,
                    text: text.into(),
                })
            })
            .collect::<Result<Vec<_>, LoadError>>()?,
        None => OptionLabel::ALL
            .into_iter()
            .zip([wire.option_a, wire.option_b, wire.option_c, wire.option_d])
            .filter_map(|(label, text)| {
                text.map(|t| QuestionOption {
                    label,
                    text: t.into(),
                })
            })
            .collect(),
    };
    if options.is_empty() {
        return Err(LoadError::Parse(format!("question {id} has no options")));
    }
    options.sort_by_key(|o| o.label);
    if let Some(pair) = options.windows(2).find(|pair| pair[0].label == pair[1].label) {
        return Err(LoadError::Parse(format!(
            "question {id}: option {} is given more than once",
            pair[0].label
        )));
    }

    let correct_option: OptionLabel = wire
        .correct_option
        .parse()
        .map_err(|e: String| LoadError::Parse(format!("question {id}: {e}")))?;

    Ok(Question {
        index: wire.index.unwrap_or(position as u32 + 1),
        text: wire.text.into(),
        options,
        correct_option,
        marks: wire.marks.unwrap_or(1.0),
        explanation: wire.explanation.map(Into::into),
        topic: wire.topic,
        id,
    })
}

#[derive(Deserialize)]
struct WireAcknowledgement {
    #[serde(alias = "id")]
    reference: Option<String>,
}

#[async_trait]
impl QuestionSetProvider for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>, LoadError> {
        let url = self.url(exam_id, "questions").map_err(LoadError::Network)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LoadError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    LoadError::Network(format!("exam portal not reachable at {}", self.base_url))
                } else {
                    LoadError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(LoadError::NotFound(exam_id.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(LoadError::Rejected {
                status,
                message: body,
            });
        }

        let wire: WireQuestionSet = response
            .json()
            .await
            .map_err(|e| LoadError::Parse(format!("failed to parse response: {e}")))?;

        let questions = wire
            .into_questions()
            .into_iter()
            .enumerate()
            .map(|(position, q)| normalize(position, q))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = questions.len(), "question set fetched");
        Ok(questions)
    }
}

#[async_trait]
impl ReportSink for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, report), fields(attempt = %report.metadata.attempt_id))]
    async fn submit_report(
        &self,
        exam_id: &str,
        report: &Report,
    ) -> Result<Acknowledgement, SubmitError> {
        let url = self.url(exam_id, "reports").map_err(SubmitError::Network)?;
        let response = self
            .authorize(self.client.post(url.clone()))
            .json(report)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Timeout(self.timeout_secs)
                } else {
                    SubmitError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected {
                status,
                message: body,
            });
        }

        let reference = response
            .json::<WireAcknowledgement>()
            .await
            .ok()
            .and_then(|ack| ack.reference)
            .unwrap_or_else(|| url.to_string());

        Ok(Acknowledgement::new(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mocktest_core::scoring::ScoringPolicy;
    use mocktest_core::session::ExamSession;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::mock::sample_questions;

    fn submitted_report() -> Report {
        let mut session =
            ExamSession::begin("exam-1", sample_questions(3), 600, ScoringPolicy::default())
                .unwrap();
        session.select_answer(0, OptionLabel::A).unwrap();
        (*session.request_submit().unwrap()).clone()
    }

    #[tokio::test]
    async fn fetches_nested_option_shape() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "questions": [{
                "id": "q1",
                "text": {"en": "2 + 2 = ?", "hi": "2 + 2 = ?"},
                "options": {"A": "3", "B": "4", "C": "5", "D": {"en": "22"}},
                "correctOption": "B",
                "marks": 2.0,
                "topic": "arithmetic"
            }]
        });

        Mock::given(method("GET"))
            .and(path("/exams/exam-1/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let questions = backend.fetch_questions("exam-1").await.unwrap();

        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.id, "q1");
        assert_eq!(q.index, 1);
        assert_eq!(q.correct_option, OptionLabel::B);
        assert_eq!(q.options.len(), 4);
        assert_eq!(q.marks, 2.0);
        assert!(q.text.has_locale("hi"));
        assert_eq!(q.topic.as_deref(), Some("arithmetic"));
    }

    #[tokio::test]
    async fn fetches_flat_option_shape() {
        let server = MockServer::start().await;

        let body = serde_json::json!([
            {
                "id": 101,
                "question": "Capital of France?",
                "optionA": "Paris",
                "optionB": "Rome",
                "optionC": "Madrid",
                "optionD": "Berlin",
                "answer": "a"
            },
            {
                "id": 102,
                "question": "Largest planet?",
                "optionA": "Mars",
                "optionB": "Jupiter",
                "answer": "B",
                "explanation": "Jupiter is the largest."
            }
        ]);

        Mock::given(method("GET"))
            .and(path("/exams/geo/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let questions = backend.fetch_questions("geo").await.unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, "101");
        assert_eq!(questions[0].correct_option, OptionLabel::A);
        assert_eq!(questions[0].marks, 1.0);
        assert_eq!(questions[1].index, 2);
        assert_eq!(questions[1].options.len(), 2);
        assert!(questions[1].explanation.is_some());
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/exams/exam-1/questions"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), Some("secret".into()), 5);
        let questions = backend.fetch_questions("exam-1").await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn missing_exam_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/exams/nope/questions"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such exam"))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let err = backend.fetch_questions("nope").await.unwrap_err();
        assert!(matches!(err, LoadError::NotFound(ref id) if id == "nope"));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn server_error_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/exams/exam-1/questions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let err = backend.fetch_questions("exam-1").await.unwrap_err();
        assert!(matches!(err, LoadError::Rejected { status: 503, .. }));
        assert!(!err.is_permanent());
    }

    #[tokio::test]
    async fn malformed_payload_is_parse_error() {
        let server = MockServer::start().await;

        let body = serde_json::json!([{
            "id": "q1",
            "text": "Pick one",
            "options": {"A": "x", "Z": "y"},
            "correct": "A"
        }]);

        Mock::given(method("GET"))
            .and(path("/exams/exam-1/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let err = backend.fetch_questions("exam-1").await.unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[tokio::test]
    async fn repeated_option_label_is_parse_error() {
        let server = MockServer::start().await;

        let body = serde_json::json!([{
            "id": 7,
            "text": "Pick one",
            "options": {"a": "lower", "A": "upper", "B": "b", "C": "c"},
            "correct": "A"
        }]);

        Mock::given(method("GET"))
            .and(path("/exams/exam-1/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let err = backend.fetch_questions("exam-1").await.unwrap_err();
        assert!(
            matches!(&err, LoadError::Parse(message) if message.contains("question 7: option A is given more than once")),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn exam_id_is_a_single_path_segment() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/exams/unit%2F3%3Fdraft/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&format!("{}/api/", server.uri()), None, 5);
        let questions = backend.fetch_questions("unit/3?draft").await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn submits_report_and_returns_reference() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/exams/exam-1/reports"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "rpt-42"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let ack = backend
            .submit_report("exam-1", &submitted_report())
            .await
            .unwrap();
        assert_eq!(ack.reference, "rpt-42");
    }

    #[tokio::test]
    async fn submit_without_body_falls_back_to_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/exams/exam-1/reports"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let ack = backend
            .submit_report("exam-1", &submitted_report())
            .await
            .unwrap();
        assert!(ack.reference.ends_with("/exams/exam-1/reports"));
    }

    #[tokio::test]
    async fn rejected_report_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/exams/exam-1/reports"))
            .respond_with(ResponseTemplate::new(422).set_body_string("attempt closed"))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), None, 5);
        let err = backend
            .submit_report("exam-1", &submitted_report())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Rejected { status: 422, ref message } if message == "attempt closed"));
        assert!(err.is_permanent());
    }
}
