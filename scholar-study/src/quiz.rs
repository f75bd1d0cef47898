//! Quiz session controller.
//!
//! Phases: `NoQuiz -> QuizLoaded -> AnswersInProgress -> (submit) -> NoQuiz`.
//! A submitted quiz is consumed by [`QuizController::submit`]; it can never
//! be scored twice.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use scholar_common::{OptionLabel, QuizQuestion, ScholarError};
use thiserror::Error;

/// One answer to a quiz question. Skip is never an option label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Option(OptionLabel),
    Skip,
}

impl FromStr for Choice {
    type Err = ScholarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("skip") {
            return Ok(Choice::Skip);
        }
        s.parse().map(Choice::Option)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Option(label) => write!(f, "{label}"),
            Choice::Skip => f.write_str("skip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("the quiz has no questions")]
    Empty,
    #[error("question id {id} appears more than once")]
    DuplicateId { id: u32 },
    #[error("question {id} needs at least two options")]
    TooFewOptions { id: u32 },
    #[error("question {id} gives answer {answer}, which is not one of its options")]
    AnswerNotOffered { id: u32, answer: OptionLabel },
    #[error("there is no active quiz")]
    NoActiveQuiz,
    #[error("question {number} does not exist (the quiz has {total})")]
    QuestionOutOfRange { number: usize, total: usize },
    #[error("question {number} has no option {label}")]
    OptionNotOffered { number: usize, label: OptionLabel },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    NoQuiz,
    QuizLoaded,
    AnswersInProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect { chosen: OptionLabel },
    Skipped,
    NoAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    /// 1-based position in the quiz.
    pub number: usize,
    pub question: String,
    pub correct_answer: OptionLabel,
    pub verdict: Verdict,
}

impl QuestionOutcome {
    pub fn describe(&self) -> String {
        let n = self.number;
        let answer = self.correct_answer;
        match self.verdict {
            Verdict::Correct => format!("Q{n}: Correct!"),
            Verdict::Incorrect { .. } => {
                format!("Q{n}: Incorrect. The correct answer was {answer}.")
            }
            Verdict::Skipped => format!("Q{n}: Skipped. The correct answer was {answer}."),
            Verdict::NoAnswer => {
                format!("Q{n}: (No answer submitted) The correct answer was {answer}.")
            }
        }
    }
}

/// Result of scoring a quiz.
///
/// `attempted + skipped + unanswered` always equals the number of questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreReport {
    pub correct: usize,
    pub attempted: usize,
    pub skipped: usize,
    pub unanswered: usize,
    pub outcomes: Vec<QuestionOutcome>,
}

impl ScoreReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn headline(&self) -> String {
        format!(
            "You scored {} out of {} attempted questions.",
            self.correct, self.attempted
        )
    }
}

#[derive(Debug, Clone)]
struct ActiveQuiz {
    questions: Vec<QuizQuestion>,
    answers: BTreeMap<usize, Choice>,
}

#[derive(Debug, Clone, Default)]
pub struct QuizController {
    active: Option<ActiveQuiz>,
}

impl QuizController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> QuizPhase {
        match &self.active {
            None => QuizPhase::NoQuiz,
            Some(quiz) if quiz.answers.is_empty() => QuizPhase::QuizLoaded,
            Some(_) => QuizPhase::AnswersInProgress,
        }
    }

    pub fn questions(&self) -> Option<&[QuizQuestion]> {
        self.active.as_ref().map(|q| q.questions.as_slice())
    }

    /// Current choice for the question at `index` (0-based).
    pub fn choice(&self, index: usize) -> Option<Choice> {
        self.active.as_ref()?.answers.get(&index).copied()
    }

    /// Replace any active quiz with `questions`.
    ///
    /// On error the controller is left without a quiz.
    pub fn load_quiz(&mut self, questions: Vec<QuizQuestion>) -> Result<(), QuizError> {
        self.active = None;
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        let mut seen = BTreeSet::new();
        for q in &questions {
            if !seen.insert(q.id) {
                return Err(QuizError::DuplicateId { id: q.id });
            }
            if q.options.len() < 2 {
                return Err(QuizError::TooFewOptions { id: q.id });
            }
            if !q.answer_is_offered() {
                return Err(QuizError::AnswerNotOffered {
                    id: q.id,
                    answer: q.answer,
                });
            }
        }
        self.active = Some(ActiveQuiz {
            questions,
            answers: BTreeMap::new(),
        });
        Ok(())
    }

    /// Record `choice` for the question at `index` (0-based). Last call wins.
    pub fn record_answer(&mut self, index: usize, choice: Choice) -> Result<(), QuizError> {
        let quiz = self.active.as_mut().ok_or(QuizError::NoActiveQuiz)?;
        let question = quiz
            .questions
            .get(index)
            .ok_or(QuizError::QuestionOutOfRange {
                number: index + 1,
                total: quiz.questions.len(),
            })?;
        if let Choice::Option(label) = choice {
            if !question.offers(label) {
                return Err(QuizError::OptionNotOffered {
                    number: index + 1,
                    label,
                });
            }
        }
        quiz.answers.insert(index, choice);
        Ok(())
    }

    /// Score and discard the active quiz. Without one this returns an empty report.
    pub fn submit(&mut self) -> ScoreReport {
        let Some(quiz) = self.active.take() else {
            return ScoreReport::default();
        };

        let mut report = ScoreReport::default();
        for (index, q) in quiz.questions.into_iter().enumerate() {
            let verdict = match quiz.answers.get(&index) {
                None => {
                    report.unanswered += 1;
                    Verdict::NoAnswer
                }
                Some(Choice::Skip) => {
                    report.skipped += 1;
                    Verdict::Skipped
                }
                Some(Choice::Option(chosen)) => {
                    report.attempted += 1;
                    if *chosen == q.answer {
                        report.correct += 1;
                        Verdict::Correct
                    } else {
                        Verdict::Incorrect { chosen: *chosen }
                    }
                }
            };
            report.outcomes.push(QuestionOutcome {
                number: index + 1,
                question: q.question,
                correct_answer: q.answer,
                verdict,
            });
        }
        report
    }

    /// Drop the active quiz without scoring it.
    pub fn clear(&mut self) {
        self.active = None;
    }
}
