//! Study domain model.
//!
//! These types double as wire types for the generation service, so the serde
//! attributes are strict: unknown fields are rejected instead of ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScholarError;

/// A paper returned by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

impl Paper {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Label of a multiple-choice option.
///
/// Skipping a question is not an option label; see `Choice::Skip` in
/// `scholar-study`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

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
    type Err = ScholarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            other => Err(ScholarError::Validation(format!(
                "unknown option label '{other}', expected one of A, B, C, D"
            ))),
        }
    }
}

/// One multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    pub options: BTreeMap<OptionLabel, String>,
    pub answer: OptionLabel,
}

impl QuizQuestion {
    /// Whether the answer label is one of the offered options.
    pub fn answer_is_offered(&self) -> bool {
        self.options.contains_key(&self.answer)
    }

    pub fn offers(&self, label: OptionLabel) -> bool {
        self.options.contains_key(&label)
    }
}

/// A short-answer entry of the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

/// Audience the summary is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExplanationStyle {
    #[default]
    Basic,
    Detailed,
    RealWorld,
    BestPractices,
    CommonChallenges,
}

impl ExplanationStyle {
    pub const ALL: [ExplanationStyle; 5] = [
        ExplanationStyle::Basic,
        ExplanationStyle::Detailed,
        ExplanationStyle::RealWorld,
        ExplanationStyle::BestPractices,
        ExplanationStyle::CommonChallenges,
    ];

    /// Human label, also used verbatim in the summary prompt.
    pub fn label(&self) -> &'static str {
        match self {
            ExplanationStyle::Basic => "Basic Explanation",
            ExplanationStyle::Detailed => "Detailed Explanation",
            ExplanationStyle::RealWorld => "Real-world Applications",
            ExplanationStyle::BestPractices => "Best Practices",
            ExplanationStyle::CommonChallenges => "Common Challenges",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ExplanationStyle::Basic => "basic",
            ExplanationStyle::Detailed => "detailed",
            ExplanationStyle::RealWorld => "real-world",
            ExplanationStyle::BestPractices => "best-practices",
            ExplanationStyle::CommonChallenges => "common-challenges",
        }
    }
}

impl FromStr for ExplanationStyle {
    type Err = ScholarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|style| style.key() == wanted || style.label().to_ascii_lowercase() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                ScholarError::Validation(format!(
                    "unknown explanation style '{}', expected one of basic, detailed, real-world, best-practices, common-challenges",
                    s.trim()
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseLength {
    #[default]
    Short,
    Medium,
    Long,
}

impl ResponseLength {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseLength::Short => "Short (1-2 sentences)",
            ResponseLength::Medium => "Medium (1-2 paragraphs)",
            ResponseLength::Long => "Long (Detailed explanation)",
        }
    }
}

impl FromStr for ResponseLength {
    type Err = ScholarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(ResponseLength::Short),
            "medium" => Ok(ResponseLength::Medium),
            "long" => Ok(ResponseLength::Long),
            other => Err(ScholarError::Validation(format!(
                "unknown response length '{other}', expected short, medium or long"
            ))),
        }
    }
}

/// Number of questions/flashcards to generate, bounded to `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct QuestionCount(u8);

impl QuestionCount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 10;

    pub fn new(n: u32) -> crate::Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&n) {
            Ok(Self(n as u8))
        } else {
            Err(ScholarError::Validation(format!(
                "question count must be between {} and {}, got {n}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(&self) -> u32 {
        u32::from(self.0)
    }
}

impl Default for QuestionCount {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u32> for QuestionCount {
    type Error = ScholarError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<QuestionCount> for u32 {
    fn from(c: QuestionCount) -> Self {
        c.get()
    }
}

/// Settings the user picks before generating material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyPreferences {
    pub explanation: ExplanationStyle,
    pub length: ResponseLength,
    pub question_count: QuestionCount,
}
