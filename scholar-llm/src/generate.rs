//! Study material generation on top of an [`LlmClient`].
//!
//! The generator owns prompt construction, source truncation and the strict
//! parsing of whatever the model sends back. Malformed output is returned as
//! [`GenerationError::Parse`] with the raw text attached so the caller can show
//! it to the user.

use crate::traits::{LlmClient, LlmError};
use regex::Regex;
use scholar_common::{
    ExplanationStyle, Flashcard, QaPair, QuestionCount, QuizQuestion, ResponseLength,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

pub const DEFAULT_MAX_SOURCE_CHARS: usize = 8000;

static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok());

/// What the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentDirective {
    Summary {
        explanation: ExplanationStyle,
        length: ResponseLength,
    },
    QuestionBank {
        count: QuestionCount,
    },
    Quiz {
        count: QuestionCount,
    },
}

impl ContentDirective {
    pub fn name(&self) -> &'static str {
        match self {
            ContentDirective::Summary { .. } => "summary",
            ContentDirective::QuestionBank { .. } => "question_bank",
            ContentDirective::Quiz { .. } => "quiz",
        }
    }

    /// Full prompt for `source`, which must already be truncated.
    pub fn prompt(&self, source: &str) -> String {
        match self {
            ContentDirective::Summary {
                explanation,
                length,
            } => format!(
                "Summarize the following text into {}, for {}.\nKeep it simple and concise.\n\nText: {source}\nNotes:",
                length.label(),
                explanation.label(),
            ),
            ContentDirective::QuestionBank { count } => {
                let n = count.get();
                format!(
                    "From the following text, create:\n\
                     1. A question bank of {n} short-answer questions.\n\
                     2. A set of {n} flashcards, each with a term on one side and its definition on the other.\n\n\
                     Format the output as a JSON object with exactly two keys: \"questions\" (an array of objects with \"question\" and \"answer\" keys) \
                     and \"flashcards\" (an array of objects with \"term\" and \"definition\" keys). Do not add any other keys.\n\n\
                     Text: {source}\nJSON:\n"
                )
            }
            ContentDirective::Quiz { count } => format!(
                "From the following text, create a multiple-choice practice quiz with {} questions.\n\
                 Each question should have a unique question ID, the question text, 4 options (labeled A, B, C, D), and the correct answer.\n\n\
                 Format the output as a JSON array of objects, where each object represents one question.\n\
                 Example structure:\n\
                 [\n  {{\n    \"id\": 1,\n    \"question\": \"What is the capital of France?\",\n    \
                 \"options\": {{ \"A\": \"Berlin\", \"B\": \"Paris\", \"C\": \"Madrid\", \"D\": \"Rome\" }},\n    \
                 \"answer\": \"B\"\n  }}\n]\n\n\
                 Text: {source}\nJSON:\n",
                count.get()
            ),
        }
    }
}

/// Question bank entries plus flashcards, as produced in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionBank {
    pub questions: Vec<QaPair>,
    pub flashcards: Vec<Flashcard>,
}

#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    #[error("no source text to generate from")]
    EmptySource,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("could not parse generated {what}: {message}")]
    Parse {
        what: &'static str,
        message: String,
        raw: String,
    },
}

impl GenerationError {
    /// Raw model output for parse failures.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            GenerationError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Builds prompts and parses answers for the three kinds of study material.
#[derive(Clone)]
pub struct StudyGenerator {
    summary_llm: Arc<dyn LlmClient>,
    study_llm: Arc<dyn LlmClient>,
    max_source_chars: usize,
}

impl StudyGenerator {
    pub fn new(summary_llm: Arc<dyn LlmClient>, study_llm: Arc<dyn LlmClient>) -> Self {
        Self {
            summary_llm,
            study_llm,
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
        }
    }

    pub fn with_max_source_chars(mut self, max: usize) -> Self {
        self.max_source_chars = max.max(1);
        self
    }

    pub async fn summarize(
        &self,
        source: &str,
        explanation: ExplanationStyle,
        length: ResponseLength,
    ) -> Result<String, GenerationError> {
        let directive = ContentDirective::Summary {
            explanation,
            length,
        };
        let raw = self.run(directive, source).await?;
        let summary = raw.trim();
        if summary.is_empty() {
            return Err(GenerationError::Parse {
                what: "summary",
                message: "empty summary".into(),
                raw,
            });
        }
        Ok(summary.to_string())
    }

    pub async fn question_bank(
        &self,
        source: &str,
        count: QuestionCount,
    ) -> Result<QuestionBank, GenerationError> {
        let raw = self
            .run(ContentDirective::QuestionBank { count }, source)
            .await?;
        let bank: QuestionBank = parse_strict("question bank", &raw)?;
        if bank.questions.is_empty() && bank.flashcards.is_empty() {
            return Err(GenerationError::Parse {
                what: "question bank",
                message: "no questions or flashcards".into(),
                raw,
            });
        }
        Ok(bank)
    }

    /// Parsed quiz questions. An empty array parses fine; the quiz controller rejects it.
    pub async fn quiz(
        &self,
        source: &str,
        count: QuestionCount,
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        let raw = self.run(ContentDirective::Quiz { count }, source).await?;
        parse_strict("quiz", &raw)
    }

    async fn run(&self, directive: ContentDirective, source: &str) -> Result<String, GenerationError> {
        if source.trim().is_empty() {
            return Err(GenerationError::EmptySource);
        }
        let llm = match directive {
            ContentDirective::Summary { .. } => &self.summary_llm,
            _ => &self.study_llm,
        };
        let clipped = truncate_chars(source, self.max_source_chars);
        let prompt = directive.prompt(clipped);

        let t0 = Instant::now();
        tracing::info!(
            directive = directive.name(),
            model = llm.model_name(),
            source_chars = clipped.chars().count(),
            "generate.start"
        );
        let resp = llm.generate(&prompt, None, None, None).await.inspect_err(|e| {
            tracing::warn!(directive = directive.name(), error = %e, "generate.failed");
        })?;
        tracing::info!(
            directive = directive.name(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response_chars = resp.text.len(),
            "generate.done"
        );
        Ok(resp.text)
    }
}

/// First `max` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Contents of the first fenced code block, or the trimmed text when there is none.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    FENCED_BLOCK
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

fn parse_strict<T: DeserializeOwned>(what: &'static str, raw: &str) -> Result<T, GenerationError> {
    serde_json::from_str(strip_fences(raw)).map_err(|e| {
        tracing::warn!(what, error = %e, "generate.parse_failed");
        GenerationError::Parse {
            what,
            message: e.to_string(),
            raw: raw.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::LlmResponse;
    use async_trait::async_trait;
    use scholar_common::OptionLabel;
    use std::sync::Mutex;

    /// Replies with a fixed text and remembers every prompt.
    struct Scripted {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmClient for Scripted {
        async fn generate(
            &self,
            prompt: &str,
            _system_prompt: Option<&str>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> Result<LlmResponse, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.clone(),
                    model: Some("scripted".into()),
                    tokens_used: None,
                }),
                Err(()) => Err(LlmError::EmptyResponse),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn generator(llm: Arc<Scripted>) -> StudyGenerator {
        StudyGenerator::new(llm.clone(), llm)
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_fences("Sure!\n```\n{\"a\":1}\n```\nDone"), "{\"a\":1}");
        assert_eq!(strip_fences("  [3]  "), "[3]");
    }

    #[test]
    fn summary_prompt_names_length_and_style() {
        let prompt = ContentDirective::Summary {
            explanation: ExplanationStyle::RealWorld,
            length: ResponseLength::Medium,
        }
        .prompt("body");
        assert!(prompt.starts_with(
            "Summarize the following text into Medium (1-2 paragraphs), for Real-world Applications."
        ));
        assert!(prompt.contains("Text: body"));
    }

    #[tokio::test]
    async fn source_is_truncated_before_prompting() {
        let llm = Scripted::replying("ok");
        let long = "x".repeat(50);
        generator(llm.clone())
            .with_max_source_chars(10)
            .summarize(&long, ExplanationStyle::Basic, ResponseLength::Short)
            .await
            .unwrap();
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains(&format!("Text: {}\n", "x".repeat(10))));
        assert!(!prompts[0].contains(&"x".repeat(11)));
    }

    #[tokio::test]
    async fn empty_source_makes_no_call() {
        let llm = Scripted::replying("unused");
        let err = generator(llm.clone())
            .quiz("   ", QuestionCount::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptySource));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn fenced_quiz_parses() {
        let llm = Scripted::replying(
            "```json\n[{\"id\":1,\"question\":\"2+2?\",\"options\":{\"A\":\"3\",\"B\":\"4\"},\"answer\":\"B\"}]\n```",
        );
        let quiz = generator(llm)
            .quiz("arithmetic", QuestionCount::new(1).unwrap())
            .await
            .unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].answer, OptionLabel::B);
    }

    #[tokio::test]
    async fn unknown_fields_are_a_parse_error_with_raw_text() {
        let raw = r#"{"questions":[],"flashcards":[],"notes":"extra"}"#;
        let err = generator(Scripted::replying(raw))
            .question_bank("text", QuestionCount::default())
            .await
            .unwrap_err();
        assert_eq!(err.raw_output(), Some(raw));
    }

    #[tokio::test]
    async fn mistyped_quiz_is_rejected() {
        let raw = r#"[{"id":"one","question":"q","options":{"A":"a"},"answer":"A"}]"#;
        let err = generator(Scripted::replying(raw))
            .quiz("text", QuestionCount::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Parse { what: "quiz", .. }));
    }

    #[tokio::test]
    async fn blank_summary_is_an_error() {
        let err = generator(Scripted::replying("  \n "))
            .summarize("text", ExplanationStyle::Basic, ResponseLength::Short)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Parse { what: "summary", .. }));
    }

    #[tokio::test]
    async fn llm_failure_is_attempted_once() {
        let llm = Scripted::failing();
        let err = generator(llm.clone())
            .question_bank("text", QuestionCount::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Llm(LlmError::EmptyResponse)));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn summary_and_study_use_their_own_clients() {
        let summary = Scripted::replying("short summary");
        let study = Scripted::replying(r#"{"questions":[{"question":"q","answer":"a"}],"flashcards":[]}"#);
        let generator = StudyGenerator::new(summary.clone(), study.clone());

        generator
            .summarize("text", ExplanationStyle::Basic, ResponseLength::Short)
            .await
            .unwrap();
        let bank = generator
            .question_bank("text", QuestionCount::default())
            .await
            .unwrap();

        assert_eq!(bank.questions.len(), 1);
        assert_eq!(summary.calls(), 1);
        assert_eq!(study.calls(), 1);
    }
}
