//! LLM integration for the study desk.
//!
//! This crate exposes the [`traits::LlmClient`] interface, a Gemini
//! implementation, and the [`generate::StudyGenerator`] that turns source text
//! into summaries, question banks with flashcards, and quizzes.
//!
//! # Examples
//! ```no_run
//! use scholar_config::ScholarConfigLoader;
//! use scholar_llm::generator_from_config;
//!
//! let config = ScholarConfigLoader::new().load().expect("config");
//! match generator_from_config(&config).expect("valid endpoint") {
//!     Some(_generator) => println!("ready"),
//!     None => println!("GEMINI_API_KEY not found"),
//! }
//! ```
pub mod gemini;
pub mod generate;
pub mod traits;

pub use generate::{ContentDirective, GenerationError, QuestionBank, StudyGenerator};
pub use traits::{LlmClient, LlmError, LlmResponse};

use gemini::GeminiClient;
use scholar_config::ScholarConfig;
use std::sync::Arc;
use std::time::Duration;

/// Build the generator from configuration.
///
/// Returns `Ok(None)` when no Gemini key is configured; the caller reports that
/// on every generation attempt instead of failing at startup.
pub fn generator_from_config(config: &ScholarConfig) -> Result<Option<StudyGenerator>, LlmError> {
    let Some(api_key) = config.llm_api_key() else {
        tracing::warn!("llm.credentials.missing");
        return Ok(None);
    };
    let timeout = Duration::from_secs(config.llm.timeout_secs);

    let summary = GeminiClient::with_endpoint(
        &config.llm.endpoint,
        api_key.to_string(),
        config.llm.summary_model.clone(),
        timeout,
    )?;
    let study = GeminiClient::with_endpoint(
        &config.llm.endpoint,
        api_key.to_string(),
        config.llm.study_model.clone(),
        timeout,
    )?;

    Ok(Some(
        StudyGenerator::new(Arc::new(summary), Arc::new(study))
            .with_max_source_chars(config.study.max_source_chars),
    ))
}
