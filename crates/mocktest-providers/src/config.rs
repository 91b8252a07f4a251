//! Backend configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mocktest_core::model::DEFAULT_LOCALE;
use mocktest_core::scoring::ScoringPolicy;
use mocktest_core::traits::{QuestionSetProvider, ReportSink};

use crate::file::{FileQuestionProvider, JsonReportSink};
use crate::http::{HttpBackend, DEFAULT_TIMEOUT_SECS};

/// Where questions come from and where reports go.
///
/// Note: Custom Debug impl masks the API token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_token: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Local {
        #[serde(default = "default_question_dir")]
        question_dir: PathBuf,
        #[serde(default = "default_output_dir")]
        output_dir: PathBuf,
    },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Http {
                base_url,
                api_token: _,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_token", &"***")
                .field("timeout_secs", timeout_secs)
                .finish(),
            BackendConfig::Local {
                question_dir,
                output_dir,
            } => f
                .debug_struct("Local")
                .field("question_dir", question_dir)
                .field("output_dir", output_dir)
                .finish(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local {
            question_dir: default_question_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_question_dir() -> PathBuf {
    PathBuf::from("./question-sets")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./mocktest-results")
}

/// Top-level mocktest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MocktestConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Attempt length used when neither the CLI nor the question set says otherwise.
    #[serde(default = "default_duration")]
    pub default_duration_secs: u32,
    /// Fraction of a question's marks deducted for a wrong answer.
    #[serde(default)]
    pub wrong_answer_penalty: f64,
    /// Locale used to display question text.
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

fn default_duration() -> u32 {
    3600
}
fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Default for MocktestConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            default_duration_secs: default_duration(),
            wrong_answer_penalty: 0.0,
            default_locale: default_locale(),
        }
    }
}

impl MocktestConfig {
    pub fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy::with_penalty(self.wrong_answer_penalty)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim and never scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut resolved = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        resolved.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        resolved.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    resolved.push_str(rest);
    resolved
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

fn resolve_backend_config(config: &BackendConfig) -> BackendConfig {
    match config {
        BackendConfig::Http {
            base_url,
            api_token,
            timeout_secs,
        } => BackendConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_token: resolve_env_vars(api_token),
            timeout_secs: *timeout_secs,
        },
        BackendConfig::Local {
            question_dir,
            output_dir,
        } => BackendConfig::Local {
            question_dir: resolve_path(question_dir),
            output_dir: resolve_path(output_dir),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `mocktest.toml` in the current directory
/// 2. `~/.config/mocktest/config.toml`
///
/// `MOCKTEST_API_TOKEN` overrides the token of an http backend.
pub fn load_config() -> Result<MocktestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MocktestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("mocktest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => parse_config_file(&path)?,
        None => MocktestConfig::default(),
    };

    if let Ok(token) = std::env::var("MOCKTEST_API_TOKEN") {
        if let BackendConfig::Http { api_token, .. } = &mut config.backend {
            *api_token = token;
        }
    }

    config.backend = resolve_backend_config(&config.backend);
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<MocktestConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = toml::from_str::<MocktestConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;

    if !(0.0..=1.0).contains(&config.wrong_answer_penalty) {
        anyhow::bail!(
            "wrong_answer_penalty must be between 0 and 1, got {} ({})",
            config.wrong_answer_penalty,
            path.display()
        );
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("mocktest"))
}

/// Create the question set provider for a backend.
pub fn create_provider(config: &BackendConfig) -> Result<Arc<dyn QuestionSetProvider>> {
    match config {
        BackendConfig::Http {
            base_url,
            api_token,
            timeout_secs,
        } => {
            anyhow::ensure!(!base_url.is_empty(), "http backend requires base_url");
            Ok(Arc::new(HttpBackend::new(
                base_url,
                Some(api_token.clone()),
                *timeout_secs,
            )))
        }
        BackendConfig::Local { question_dir, .. } => {
            Ok(Arc::new(FileQuestionProvider::new(question_dir)))
        }
    }
}

/// Create the report sink for a backend.
pub fn create_sink(config: &BackendConfig) -> Result<Arc<dyn ReportSink>> {
    match config {
        BackendConfig::Http {
            base_url,
            api_token,
            timeout_secs,
        } => {
            anyhow::ensure!(!base_url.is_empty(), "http backend requires base_url");
            Ok(Arc::new(HttpBackend::new(
                base_url,
                Some(api_token.clone()),
                *timeout_secs,
            )))
        }
        BackendConfig::Local { output_dir, .. } => Ok(Arc::new(JsonReportSink::new(output_dir))),
    }
}
