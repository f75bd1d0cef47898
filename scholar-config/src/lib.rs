//! Loader for the study desk configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (every field has one)
//! 2. an optional or required YAML/TOML/JSON file (`scholar.yaml` by default)
//! 3. `SCHOLAR__`-prefixed environment variables, `__` separating sections
//!    (e.g. `SCHOLAR__LLM__STUDY_MODEL=gemini-2.5-pro`)
//!
//! String values may reference other variables as `${VAR}`; expansion is
//! recursive up to a fixed depth. API keys that are still empty or unresolved
//! after expansion fall back to `SERPAPI_API_KEY` and `GEMINI_API_KEY`.
use config::{Config, ConfigError, Environment, File};
use scholar_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const SEARCH_KEY_ENV: &str = "SERPAPI_API_KEY";
pub const LLM_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScholarConfig {
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub fetch: FetchConfig,
    pub study: StudyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: String,
    pub endpoint: String,
    pub engine: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://serpapi.com".into(),
            engine: "google_scholar".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub endpoint: String,
    /// Model used for summaries.
    pub summary_model: String,
    /// Model used for the question bank, flashcards and quizzes.
    pub study_model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            summary_model: "gemini-1.5-flash".into(),
            study_model: "gemini-2.5-flash".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Source text is cut to this many characters before prompting.
    pub max_source_chars: usize,
    pub default_topic: String,
    pub default_question_count: u32,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            max_source_chars: 8000,
            default_topic: "Integration in Calculus".into(),
            default_question_count: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: Option<String>,
    pub dir: Option<PathBuf>,
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        match self.format.as_deref() {
            None => Ok(LogFormat::Text),
            Some(raw) => raw
                .parse()
                .map_err(|e: scholar_common::ScholarError| ConfigError::Message(e.to_string())),
        }
    }
}

impl ScholarConfig {
    /// SerpAPI key, if one is actually configured.
    pub fn search_api_key(&self) -> Option<&str> {
        credential(&self.search.api_key)
    }

    /// Gemini key, if one is actually configured.
    pub fn llm_api_key(&self) -> Option<&str> {
        credential(&self.llm.api_key)
    }

    fn apply_credential_fallbacks(&mut self) {
        if credential(&self.search.api_key).is_none() {
            if let Ok(key) = std::env::var(SEARCH_KEY_ENV) {
                self.search.api_key = key;
            }
        }
        if credential(&self.llm.api_key).is_none() {
            if let Ok(key) = std::env::var(LLM_KEY_ENV) {
                self.llm.api_key = key;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Message("llm.timeout_secs must be positive".into()));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Message("fetch.timeout_secs must be positive".into()));
        }
        if self.study.max_source_chars == 0 {
            return Err(ConfigError::Message("study.max_source_chars must be positive".into()));
        }
        scholar_common::QuestionCount::new(self.study.default_question_count)
            .map_err(|e| ConfigError::Message(format!("study.default_question_count: {e}")))?;
        self.logging.log_format()?;
        Ok(())
    }
}

/// A key counts only when non-empty and free of unresolved `${...}` references.
pub fn credential(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains("${") {
        None
    } else {
        Some(trimmed)
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring.
pub struct ScholarConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: &'static str,
}

impl Default for ScholarConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScholarConfigLoader {
    /// Start with defaults only; environment overrides are attached in [`load`](Self::load)
    /// so they always win over files and inline snippets.
    ///
    /// ```
    /// use scholar_config::ScholarConfigLoader;
    ///
    /// let config = ScholarConfigLoader::new()
    ///     .with_yaml_str("study:\n  default_topic: Linear Algebra")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.study.default_topic, "Linear Algebra");
    /// assert_eq!(config.fetch.timeout_secs, 10);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "SCHOLAR",
        }
    }

    /// Attach a file that must exist; the format is inferred from its suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests, doctests).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge sources, expand `${VAR}` references, and materialise the typed config.
    ///
    /// ```
    /// use scholar_config::ScholarConfigLoader;
    ///
    /// temp_env::with_var("MY_GEMINI_TOKEN", Some("from-env"), || {
    ///     let config = ScholarConfigLoader::new()
    ///         .with_yaml_str("llm:\n  api_key: \"${MY_GEMINI_TOKEN}\"\n  study_model: gemini-2.0-flash")
    ///         .load()
    ///         .expect("valid configuration");
    ///
    ///     assert_eq!(config.llm_api_key(), Some("from-env"));
    ///     assert_eq!(config.llm.study_model, "gemini-2.0-flash");
    ///     assert_eq!(config.llm.summary_model, "gemini-1.5-flash");
    /// });
    /// ```
    pub fn load(self) -> Result<ScholarConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: ScholarConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.apply_credential_fallbacks();
        typed.validate()?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_nested_references() {
        temp_env::with_vars([("INNER", Some("abc")), ("OUTER", Some("key-${INNER}"))], || {
            let mut v = json!({ "llm": { "api_key": "${OUTER}" }, "list": ["$INNER", 3] });
            expand_env_in_value(&mut v);
            assert_eq!(v, json!({ "llm": { "api_key": "key-abc" }, "list": ["abc", 3] }));
        });
    }

    #[test]
    fn cyclic_references_terminate() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}");
            expand_env_in_value(&mut v);
            assert!(v.as_str().unwrap().contains("${"));
        });
    }

    #[test]
    fn unresolved_placeholders_are_not_credentials() {
        assert_eq!(credential("${SERPAPI_API_KEY}"), None);
        assert_eq!(credential("   "), None);
        assert_eq!(credential(" abc "), Some("abc"));
    }

    #[test]
    fn defaults_match_the_original_tool() {
        let cfg = ScholarConfig::default();
        assert_eq!(cfg.fetch.timeout_secs, 10);
        assert_eq!(cfg.fetch.user_agent, "Mozilla/5.0");
        assert_eq!(cfg.study.max_source_chars, 8000);
        assert_eq!(cfg.search.engine, "google_scholar");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn out_of_range_question_count_is_rejected() {
        let mut cfg = ScholarConfig::default();
        cfg.study.default_question_count = 42;
        assert!(cfg.validate().is_err());
    }
}
