//! Study session core: state, quiz controller, command handlers and view.
//!
//! The terminal front end owns one [`SessionState`] and feeds
//! [`StudyCommand`]s through [`StudyDesk::dispatch`]. Everything the user sees
//! comes from [`render`] (the current state) and the returned [`Notice`]s
//! (what just happened).
//!
//! ```
//! use scholar_common::{OptionLabel, QuizQuestion};
//! use scholar_study::{Choice, QuizController};
//!
//! let mut quiz = QuizController::new();
//! quiz.load_quiz(vec![QuizQuestion {
//!     id: 1,
//!     question: "2 + 2?".into(),
//!     options: [(OptionLabel::A, "3".to_string()), (OptionLabel::B, "4".to_string())]
//!         .into_iter()
//!         .collect(),
//!     answer: OptionLabel::B,
//! }])
//! .unwrap();
//! quiz.record_answer(0, Choice::Option(OptionLabel::B)).unwrap();
//!
//! let report = quiz.submit();
//! assert_eq!(report.headline(), "You scored 1 out of 1 attempted questions.");
//! ```

pub mod desk;
pub mod quiz;
pub mod session;
pub mod view;

pub use desk::{Notice, PaperRef, StudyCommand, StudyDesk};
pub use quiz::{Choice, QuizController, QuizError, QuizPhase, ScoreReport, Verdict};
pub use session::{ContentSource, SessionState};
pub use view::{Tone, ViewLine, render};
