//! Common types and utilities shared across the Scholar crates.
//!
//! This crate holds the study domain model, the shared error type, and the
//! observability helpers used by the binary and by integration tests. It stays
//! dependency‑light so every other crate can depend on it.
//!
//! # Overview
//!
//! - [`model`]: papers, quiz questions, question bank entries, flashcards and
//!   the user's [`StudyPreferences`]
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`ScholarError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use scholar_common::{OptionLabel, QuestionCount, StudyPreferences};
//!
//! let mut prefs = StudyPreferences::default();
//! prefs.question_count = QuestionCount::new(3).unwrap();
//! assert_eq!(prefs.question_count.get(), 3);
//! assert_eq!("b".parse::<OptionLabel>().unwrap(), OptionLabel::B);
//! ```

pub mod model;
pub mod observability;

pub use model::{
    ExplanationStyle, Flashcard, OptionLabel, Paper, QaPair, QuestionCount, QuizQuestion,
    ResponseLength, StudyPreferences,
};

/// Error types used across the Scholar workspace.
#[derive(thiserror::Error, Debug)]
pub enum ScholarError {
    /// Configuration was incomplete or invalid (e.g. a missing API key).
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input or generated data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The paper search service failed.
    #[error("Search error: {0}")]
    Search(String),

    /// Retrieving or extracting page content failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The generation service failed or answered with something unusable.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Operation exceeded its timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`ScholarError`].
pub type Result<T> = std::result::Result<T, ScholarError>;
