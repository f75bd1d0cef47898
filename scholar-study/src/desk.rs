//! Command handlers for one study session.
//!
//! [`StudyDesk::dispatch`] runs a single [`StudyCommand`] to completion
//! against a [`SessionState`]. Handlers never fail: every outcome, good or
//! bad, comes back as a list of [`Notice`]s for the message log.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use scholar_common::{ExplanationStyle, QuestionCount, ResponseLength};
use scholar_llm::{GenerationError, StudyGenerator};
use scholar_web::{ContentFetcher, PaperSearch};

use crate::quiz::{Choice, QuizPhase, Verdict};
use crate::session::{ContentSource, SessionState};

pub const MISSING_SEARCH_KEY: &str = "SERPAPI_API_KEY not found. Please add it to .env";
pub const MISSING_LLM_KEY: &str = "GEMINI_API_KEY not found. Please add it to .env";
pub const NO_PAPERS_FOUND: &str = "No papers found. Try another topic.";
pub const SNIPPET_FALLBACK: &str = "Could not retrieve full content. Using the snippet instead.";
pub const FETCH_FIRST: &str =
    "Please fetch the content (/fetch) to retrieve the full text before generating study materials.";

/// A message for the user, tagged by severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// Offending model output, shown verbatim.
    Raw(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(t)
            | Notice::Success(t)
            | Notice::Warning(t)
            | Notice::Error(t)
            | Notice::Raw(t) => t,
        }
    }
}

/// How the user points at a paper: 1-based position or exact title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperRef {
    Index(usize),
    Title(String),
}

impl FromStr for PaperRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(n) => PaperRef::Index(n),
            Err(_) => PaperRef::Title(s.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyCommand {
    /// Search for the given topic, or the current one when `None`.
    Search(Option<String>),
    Select(PaperRef),
    Fetch,
    Summarize,
    GenerateQuestionBank,
    GenerateQuiz,
    /// Answer question `question` (1-based).
    Answer { question: usize, choice: Choice },
    Submit,
    SetExplanation(ExplanationStyle),
    SetLength(ResponseLength),
    SetQuestionCount(QuestionCount),
    SetTopic(String),
}

impl StudyCommand {
    pub fn name(&self) -> &'static str {
        match self {
            StudyCommand::Search(_) => "search",
            StudyCommand::Select(_) => "select",
            StudyCommand::Fetch => "fetch",
            StudyCommand::Summarize => "summary",
            StudyCommand::GenerateQuestionBank => "qa",
            StudyCommand::GenerateQuiz => "quiz",
            StudyCommand::Answer { .. } => "answer",
            StudyCommand::Submit => "submit",
            StudyCommand::SetExplanation(_) => "style",
            StudyCommand::SetLength(_) => "length",
            StudyCommand::SetQuestionCount(_) => "count",
            StudyCommand::SetTopic(_) => "topic",
        }
    }
}

/// The external services a session talks to.
///
/// Search and generation are optional: without credentials the matching
/// commands report a configuration error each time they are tried.
#[derive(Clone)]
pub struct StudyDesk {
    search: Option<Arc<dyn PaperSearch>>,
    fetcher: Arc<dyn ContentFetcher>,
    generator: Option<StudyGenerator>,
}

impl StudyDesk {
    pub fn new(
        search: Option<Arc<dyn PaperSearch>>,
        fetcher: Arc<dyn ContentFetcher>,
        generator: Option<StudyGenerator>,
    ) -> Self {
        Self {
            search,
            fetcher,
            generator,
        }
    }

    pub async fn dispatch(&self, state: &mut SessionState, command: StudyCommand) -> Vec<Notice> {
        let started = Instant::now();
        let name = command.name();
        tracing::info!(session = %state.id, command = name, "desk.command.start");

        let notices = match command {
            StudyCommand::Search(topic) => self.search(state, topic).await,
            StudyCommand::Select(paper) => select(state, paper),
            StudyCommand::Fetch => self.fetch(state).await,
            StudyCommand::Summarize => self.summarize(state).await,
            StudyCommand::GenerateQuestionBank => self.question_bank(state).await,
            StudyCommand::GenerateQuiz => self.quiz(state).await,
            StudyCommand::Answer { question, choice } => answer(state, question, choice),
            StudyCommand::Submit => submit(state),
            StudyCommand::SetExplanation(style) => {
                state.preferences.explanation = style;
                vec![Notice::Info(format!("Explanation type: {}", style.label()))]
            }
            StudyCommand::SetLength(length) => {
                state.preferences.length = length;
                vec![Notice::Info(format!("Response length: {}", length.label()))]
            }
            StudyCommand::SetQuestionCount(count) => {
                state.preferences.question_count = count;
                vec![Notice::Info(format!(
                    "Questions/flashcards to generate: {}",
                    count.get()
                ))]
            }
            StudyCommand::SetTopic(topic) => {
                state.topic = topic.trim().to_string();
                vec![Notice::Info(format!("Topic: {}", state.topic))]
            }
        };

        tracing::info!(
            session = %state.id,
            command = name,
            notices = notices.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "desk.command.done"
        );
        notices
    }

    async fn search(&self, state: &mut SessionState, topic: Option<String>) -> Vec<Notice> {
        if let Some(topic) = topic {
            state.topic = topic.trim().to_string();
        }
        if state.topic.is_empty() {
            return vec![Notice::Warning("Enter a topic to search for.".into())];
        }
        let Some(search) = &self.search else {
            tracing::warn!(session = %state.id, "desk.search.no_credentials");
            return vec![Notice::Error(MISSING_SEARCH_KEY.into())];
        };

        let found = search.search(&state.topic).await;
        match found {
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "desk.search.failed");
                vec![Notice::Error(format!("Search failed: {e}"))]
            }
            Ok(papers) if papers.is_empty() => {
                state.replace_papers(papers);
                vec![Notice::Warning(NO_PAPERS_FOUND.into())]
            }
            Ok(papers) => {
                let n = papers.len();
                state.replace_papers(papers);
                vec![Notice::Success(format!(
                    "Found {n} papers. Choose one with /select <number or title>."
                ))]
            }
        }
    }

    async fn fetch(&self, state: &mut SessionState) -> Vec<Notice> {
        let Some(paper) = state.selected_paper().cloned() else {
            return vec![Notice::Warning("Choose a paper first (/select).".into())];
        };

        let fetched = self.fetcher.fetch(&paper.link).await;
        state.clear_content();
        match fetched {
            Ok(text) if !text.trim().is_empty() => {
                state.content = Some((text, ContentSource::Page));
                vec![Notice::Success("Content successfully retrieved!".into())]
            }
            other => {
                let mut notices = Vec::new();
                if let Err(e) = other {
                    tracing::warn!(session = %state.id, link = %paper.link, error = %e, "desk.fetch.failed");
                    notices.push(Notice::Warning(format!("Could not scrape the webpage: {e}")));
                }
                notices.push(Notice::Warning(SNIPPET_FALLBACK.into()));
                if paper.snippet.trim().is_empty() {
                    notices.push(Notice::Warning(
                        "This paper has no snippet either; there is nothing to study yet.".into(),
                    ));
                } else {
                    state.content = Some((paper.snippet, ContentSource::Snippet));
                }
                notices
            }
        }
    }

    /// Content plus generator, or the notice explaining why generation cannot run.
    fn generation_inputs(&self, state: &SessionState) -> Result<(String, &StudyGenerator), Notice> {
        let Some(content) = state.content_text() else {
            return Err(Notice::Info(FETCH_FIRST.into()));
        };
        let Some(generator) = &self.generator else {
            tracing::warn!(session = %state.id, "desk.generate.no_credentials");
            return Err(Notice::Error(MISSING_LLM_KEY.into()));
        };
        Ok((content.to_string(), generator))
    }

    async fn summarize(&self, state: &mut SessionState) -> Vec<Notice> {
        let (content, generator) = match self.generation_inputs(state) {
            Ok(inputs) => inputs,
            Err(notice) => return vec![notice],
        };
        let prefs = state.preferences;
        state.summary = None;
        match generator
            .summarize(&content, prefs.explanation, prefs.length)
            .await
        {
            Ok(summary) => {
                state.summary = Some(summary);
                vec![Notice::Success("Summarized notes are ready.".into())]
            }
            Err(e) => generation_failed("summary", e),
        }
    }

    async fn question_bank(&self, state: &mut SessionState) -> Vec<Notice> {
        let (content, generator) = match self.generation_inputs(state) {
            Ok(inputs) => inputs,
            Err(notice) => return vec![notice],
        };
        let count = state.preferences.question_count;
        state.questions = None;
        state.flashcards = None;
        match generator.question_bank(&content, count).await {
            Ok(bank) => {
                let msg = format!(
                    "Generated {} questions and {} flashcards.",
                    bank.questions.len(),
                    bank.flashcards.len()
                );
                state.questions = Some(bank.questions);
                state.flashcards = Some(bank.flashcards);
                vec![Notice::Success(msg)]
            }
            Err(e) => generation_failed("Q&A and flashcards", e),
        }
    }

    async fn quiz(&self, state: &mut SessionState) -> Vec<Notice> {
        let (content, generator) = match self.generation_inputs(state) {
            Ok(inputs) => inputs,
            Err(notice) => return vec![notice],
        };
        let count = state.preferences.question_count;
        state.quiz.clear();
        let questions = match generator.quiz(&content, count).await {
            Ok(questions) => questions,
            Err(e) => return generation_failed("quiz", e),
        };
        let n = questions.len();
        match state.quiz.load_quiz(questions) {
            Ok(()) => vec![Notice::Success(format!(
                "Practice quiz ready ({n} questions). Answer with /answer <number> <A-D|skip>, then /submit."
            ))],
            Err(e) => {
                tracing::warn!(session = %state.id, error = %e, "desk.quiz.rejected");
                vec![Notice::Error(format!("The generated quiz is unusable: {e}"))]
            }
        }
    }
}

fn generation_failed(what: &str, err: GenerationError) -> Vec<Notice> {
    let mut notices = vec![Notice::Error(format!("Error generating {what}: {err}"))];
    if let Some(raw) = err.raw_output() {
        notices.push(Notice::Raw(raw.to_string()));
    }
    notices
}

fn position_by_title(state: &SessionState, title: &str) -> Option<usize> {
    state.papers.iter().position(|p| p.title == title)
}

fn select(state: &mut SessionState, paper: PaperRef) -> Vec<Notice> {
    if state.papers.is_empty() {
        return vec![Notice::Warning("Search for papers first (/search).".into())];
    }
    let index = match &paper {
        // an out-of-range number may still be a title such as "1984"
        PaperRef::Index(n) => n
            .checked_sub(1)
            .filter(|i| *i < state.papers.len())
            .or_else(|| position_by_title(state, &n.to_string())),
        PaperRef::Title(title) => position_by_title(state, title),
    };
    let Some(index) = index else {
        return vec![Notice::Warning(match paper {
            PaperRef::Index(n) => format!(
                "There is no paper {n}; choose between 1 and {}.",
                state.papers.len()
            ),
            PaperRef::Title(t) => format!("No paper titled \"{t}\"."),
        })];
    };

    if state.selected == Some(index) {
        return vec![Notice::Info(format!(
            "\"{}\" is already selected.",
            state.papers[index].title
        ))];
    }
    state.selected = Some(index);
    state.clear_content();
    vec![Notice::Success(format!(
        "Selected \"{}\". Use /fetch to retrieve its content.",
        state.papers[index].title
    ))]
}

fn answer(state: &mut SessionState, question: usize, choice: Choice) -> Vec<Notice> {
    if question == 0 {
        return vec![Notice::Error("Questions are numbered from 1.".into())];
    }
    match state.quiz.record_answer(question - 1, choice) {
        Ok(()) => vec![Notice::Info(format!("Q{question}: {choice} recorded."))],
        Err(e) => vec![Notice::Error(e.to_string())],
    }
}

fn submit(state: &mut SessionState) -> Vec<Notice> {
    if state.quiz.phase() == QuizPhase::NoQuiz {
        return vec![Notice::Info("There is no quiz to submit.".into())];
    }
    let report = state.quiz.submit();
    tracing::info!(
        session = %state.id,
        correct = report.correct,
        attempted = report.attempted,
        skipped = report.skipped,
        unanswered = report.unanswered,
        "desk.quiz.scored"
    );

    let mut notices: Vec<Notice> = report
        .outcomes
        .iter()
        .map(|o| match o.verdict {
            Verdict::Correct => Notice::Success(o.describe()),
            Verdict::Incorrect { .. } => Notice::Warning(o.describe()),
            Verdict::Skipped | Verdict::NoAnswer => Notice::Info(o.describe()),
        })
        .collect();
    notices.push(Notice::Success(report.headline()));
    notices
}
