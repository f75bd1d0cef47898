use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scholar_common::{OptionLabel, Paper, QuestionCount, StudyPreferences};
use scholar_llm::{LlmClient, LlmError, LlmResponse, StudyGenerator};
use scholar_web::{ContentFetcher, FetchError, PaperSearch, SearchError};
use scholar_study::desk::{MISSING_LLM_KEY, MISSING_SEARCH_KEY, NO_PAPERS_FOUND, SNIPPET_FALLBACK};
use scholar_study::{
    Choice, ContentSource, Notice, PaperRef, QuizPhase, SessionState, StudyCommand, StudyDesk,
    render,
};

struct FakeSearch {
    papers: Result<Vec<Paper>, String>,
    calls: AtomicUsize,
}

#[async_trait]
impl PaperSearch for FakeSearch {
    async fn search(&self, _topic: &str) -> Result<Vec<Paper>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.papers.clone().map_err(SearchError::Api)
    }
}

/// Returns the page text, or fails when `None`.
struct FakeFetcher(Option<String>);

#[async_trait]
impl ContentFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.0
            .clone()
            .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))
    }
}

/// Replies from a queue and records every prompt.
#[derive(Default)]
struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn with(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::default(),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(
        &self,
        prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse)?;
        Ok(LlmResponse {
            text,
            model: None,
            tokens_used: None,
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

const QUIZ_OF_THREE: &str = r#"```json
[
  {"id": 1, "question": "What is the integral of 2x?", "options": {"A": "x^2 + C", "B": "2", "C": "x", "D": "2x^2"}, "answer": "A"},
  {"id": 2, "question": "What does dx denote?", "options": {"A": "A constant", "B": "An infinitesimal width", "C": "A limit", "D": "A sum"}, "answer": "B"},
  {"id": 3, "question": "Who formalised the integral?", "options": {"A": "Euler", "B": "Gauss", "C": "Riemann", "D": "Fermat"}, "answer": "C"}
]
```"#;

fn papers() -> Vec<Paper> {
    vec![
        Paper::new("Riemann sums", "https://papers.example/riemann", "Partitions of an interval."),
        Paper::new("Lebesgue integration", "https://papers.example/lebesgue", "Measure theory."),
        Paper::new("Riemann sums", "https://papers.example/dup", "A duplicate title."),
    ]
}

struct Harness {
    desk: StudyDesk,
    state: SessionState,
    search: Arc<FakeSearch>,
    llm: Arc<ScriptedLlm>,
}

impl Harness {
    fn new(found: Result<Vec<Paper>, String>, page: Option<&str>, replies: &[&str]) -> Self {
        let search = Arc::new(FakeSearch {
            papers: found,
            calls: AtomicUsize::new(0),
        });
        let llm = ScriptedLlm::with(replies);
        let generator = StudyGenerator::new(llm.clone(), llm.clone());
        let desk = StudyDesk::new(
            Some(search.clone() as Arc<dyn PaperSearch>),
            Arc::new(FakeFetcher(page.map(str::to_string))),
            Some(generator),
        );
        Self {
            desk,
            state: SessionState::new("Integration in Calculus", StudyPreferences::default()),
            search,
            llm,
        }
    }

    async fn run(&mut self, command: StudyCommand) -> Vec<Notice> {
        self.desk.dispatch(&mut self.state, command).await
    }

    /// Search, select the first paper and fetch it.
    async fn ready(&mut self) {
        self.run(StudyCommand::Search(None)).await;
        self.run(StudyCommand::Select(PaperRef::Index(1))).await;
        self.run(StudyCommand::Fetch).await;
    }
}

#[tokio::test]
async fn quiz_with_correct_skip_and_no_answer_scores_one_of_one() {
    let mut h = Harness::new(Ok(papers()), Some("Integrals accumulate area."), &[QUIZ_OF_THREE]);
    h.ready().await;

    h.run(StudyCommand::GenerateQuiz).await;
    assert_eq!(h.state.quiz.phase(), QuizPhase::QuizLoaded);

    h.run(StudyCommand::Answer {
        question: 1,
        choice: Choice::Option(OptionLabel::A),
    })
    .await;
    h.run(StudyCommand::Answer {
        question: 2,
        choice: Choice::Skip,
    })
    .await;

    let notices = h.run(StudyCommand::Submit).await;
    let texts: Vec<_> = notices.iter().map(Notice::text).collect();
    assert_eq!(
        texts,
        [
            "Q1: Correct!",
            "Q2: Skipped. The correct answer was B.",
            "Q3: (No answer submitted) The correct answer was C.",
            "You scored 1 out of 1 attempted questions.",
        ]
    );
    assert_eq!(h.state.quiz.phase(), QuizPhase::NoQuiz);

    let again = h.run(StudyCommand::Submit).await;
    assert_eq!(again, vec![Notice::Info("There is no quiz to submit.".into())]);
}

#[tokio::test]
async fn second_answer_overrides_the_first() {
    let mut h = Harness::new(Ok(papers()), Some("text"), &[QUIZ_OF_THREE]);
    h.ready().await;
    h.run(StudyCommand::GenerateQuiz).await;

    for label in [OptionLabel::D, OptionLabel::A] {
        h.run(StudyCommand::Answer {
            question: 1,
            choice: Choice::Option(label),
        })
        .await;
    }
    let notices = h.run(StudyCommand::Submit).await;
    assert_eq!(
        notices.last(),
        Some(&Notice::Success("You scored 1 out of 1 attempted questions.".into()))
    );
}

#[tokio::test]
async fn empty_results_leave_nothing_selectable_and_generate_nothing() {
    let mut h = Harness::new(Ok(Vec::new()), Some("text"), &["unused"]);

    let notices = h.run(StudyCommand::Search(Some("Obscure topic".into()))).await;
    assert_eq!(notices, vec![Notice::Warning(NO_PAPERS_FOUND.into())]);
    assert!(h.state.papers.is_empty());

    let select = h.run(StudyCommand::Select(PaperRef::Index(1))).await;
    assert!(matches!(&select[0], Notice::Warning(_)));
    assert!(h.state.selected.is_none());

    h.run(StudyCommand::Summarize).await;
    h.run(StudyCommand::GenerateQuiz).await;
    assert!(h.llm.prompts().is_empty());
    assert_eq!(h.state.topic, "Obscure topic");
}

#[tokio::test]
async fn fetch_failure_falls_back_to_snippet_for_generation() {
    let mut h = Harness::new(Ok(papers()), None, &["Short notes."]);
    h.run(StudyCommand::Search(None)).await;
    h.run(StudyCommand::Select(PaperRef::Index(2))).await;

    let notices = h.run(StudyCommand::Fetch).await;
    assert!(notices.contains(&Notice::Warning(SNIPPET_FALLBACK.into())));
    assert_eq!(
        h.state.content,
        Some(("Measure theory.".to_string(), ContentSource::Snippet))
    );

    h.run(StudyCommand::Summarize).await;
    assert_eq!(h.state.summary.as_deref(), Some("Short notes."));
    assert!(h.llm.prompts()[0].contains("Text: Measure theory.\n"));
}

#[tokio::test]
async fn missing_credentials_are_reported_and_nothing_is_called() {
    let search = Arc::new(FakeSearch {
        papers: Ok(papers()),
        calls: AtomicUsize::new(0),
    });
    let desk = StudyDesk::new(None, Arc::new(FakeFetcher(Some("text".into()))), None);
    let mut state = SessionState::new("Integration in Calculus", StudyPreferences::default());

    let notices = desk.dispatch(&mut state, StudyCommand::Search(None)).await;
    assert_eq!(notices, vec![Notice::Error(MISSING_SEARCH_KEY.into())]);
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);

    state.replace_papers(papers());
    state.selected = Some(0);
    desk.dispatch(&mut state, StudyCommand::Fetch).await;
    let notices = desk.dispatch(&mut state, StudyCommand::GenerateQuiz).await;
    assert_eq!(notices, vec![Notice::Error(MISSING_LLM_KEY.into())]);
    assert_eq!(state.quiz.phase(), QuizPhase::NoQuiz);
}

#[tokio::test]
async fn malformed_quiz_shows_raw_output_and_stays_empty() {
    let mut h = Harness::new(Ok(papers()), Some("text"), &["Sorry, I cannot help with that."]);
    h.ready().await;

    let notices = h.run(StudyCommand::GenerateQuiz).await;
    assert!(matches!(&notices[0], Notice::Error(msg) if msg.starts_with("Error generating quiz")));
    assert_eq!(
        notices[1],
        Notice::Raw("Sorry, I cannot help with that.".into())
    );
    assert_eq!(h.state.quiz.phase(), QuizPhase::NoQuiz);
    assert_eq!(h.llm.prompts().len(), 1);
}

#[tokio::test]
async fn empty_quiz_array_is_rejected() {
    let mut h = Harness::new(Ok(papers()), Some("text"), &["[]"]);
    h.ready().await;

    let notices = h.run(StudyCommand::GenerateQuiz).await;
    assert!(matches!(&notices[0], Notice::Error(msg) if msg.contains("no questions")));
    assert_eq!(h.state.quiz.phase(), QuizPhase::NoQuiz);
}

#[tokio::test]
async fn question_bank_and_flashcards_are_stored_and_rendered() {
    let bank = r#"{"questions": [{"question": "What is an antiderivative?", "answer": "A function whose derivative is f."}],
                   "flashcards": [{"term": "Integrand", "definition": "The function being integrated."}]}"#;
    let mut h = Harness::new(Ok(papers()), Some("text"), &[bank]);
    h.ready().await;
    h.run(StudyCommand::SetQuestionCount(QuestionCount::new(1).unwrap()))
        .await;

    let notices = h.run(StudyCommand::GenerateQuestionBank).await;
    assert_eq!(
        notices,
        vec![Notice::Success("Generated 1 questions and 1 flashcards.".into())]
    );
    assert!(h.llm.prompts()[0].contains("A question bank of 1 short-answer questions."));

    let lines: Vec<_> = render(&h.state).into_iter().map(|l| l.text).collect();
    assert!(lines.contains(&"Question Bank (1 Questions)".to_string()));
    assert!(lines.contains(&"Term: Integrand".to_string()));
}

#[tokio::test]
async fn new_search_clears_selection_and_generated_material() {
    let mut h = Harness::new(Ok(papers()), Some("text"), &["Notes.", QUIZ_OF_THREE]);
    h.ready().await;
    h.run(StudyCommand::Summarize).await;
    h.run(StudyCommand::GenerateQuiz).await;
    assert!(h.state.summary.is_some());

    h.run(StudyCommand::Search(Some("Series".into()))).await;
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 2);
    assert!(h.state.selected.is_none());
    assert!(h.state.content.is_none());
    assert!(h.state.summary.is_none());
    assert_eq!(h.state.quiz.phase(), QuizPhase::NoQuiz);
}

#[tokio::test]
async fn search_failure_keeps_previous_results() {
    let mut h = Harness::new(Err("quota exceeded".into()), None, &[]);
    h.state.replace_papers(papers());

    let notices = h.run(StudyCommand::Search(None)).await;
    assert!(matches!(&notices[0], Notice::Error(msg) if msg.contains("quota exceeded")));
    assert_eq!(h.state.papers.len(), 3);
}

#[tokio::test]
async fn duplicate_titles_select_the_first_match() {
    let mut h = Harness::new(Ok(papers()), Some("text"), &[]);
    h.run(StudyCommand::Search(None)).await;

    h.run(StudyCommand::Select(PaperRef::Title("Riemann sums".into())))
        .await;
    assert_eq!(h.state.selected, Some(0));

    let notices = h.run(StudyCommand::Select(PaperRef::Index(9))).await;
    assert!(matches!(&notices[0], Notice::Warning(_)));
    assert_eq!(h.state.selected, Some(0));
}

#[tokio::test]
async fn numeric_titles_are_selectable_when_not_a_valid_position() {
    let found = vec![
        Paper::new("Calculus primer", "https://papers.example/primer", "Basics."),
        Paper::new("1984", "https://papers.example/1984", "A numeric title."),
    ];
    let mut h = Harness::new(Ok(found), Some("text"), &[]);
    h.run(StudyCommand::Search(None)).await;

    let notices = h.run(StudyCommand::Select("1984".parse().unwrap())).await;
    assert!(matches!(&notices[0], Notice::Success(_)), "got {notices:?}");
    assert_eq!(h.state.selected, Some(1));

    h.run(StudyCommand::Select("1".parse().unwrap())).await;
    assert_eq!(h.state.selected, Some(0));
}

#[tokio::test]
async fn answers_for_unknown_questions_or_options_are_errors() {
    let quiz = r#"[{"id": 1, "question": "Q?", "options": {"A": "yes", "B": "no"}, "answer": "A"}]"#;
    let mut h = Harness::new(Ok(papers()), Some("text"), &[quiz]);
    h.ready().await;
    h.run(StudyCommand::GenerateQuiz).await;

    let notices = h
        .run(StudyCommand::Answer {
            question: 1,
            choice: Choice::Option(OptionLabel::D),
        })
        .await;
    assert!(matches!(&notices[0], Notice::Error(_)));

    let notices = h
        .run(StudyCommand::Answer {
            question: 0,
            choice: Choice::Skip,
        })
        .await;
    assert!(matches!(&notices[0], Notice::Error(_)));
    assert_eq!(h.state.quiz.phase(), QuizPhase::QuizLoaded);
}

#[tokio::test]
async fn preferences_flow_into_the_summary_prompt() {
    let mut h = Harness::new(Ok(papers()), Some("Integrals accumulate area."), &["Notes."]);
    h.ready().await;
    h.run(StudyCommand::SetExplanation("best-practices".parse().unwrap()))
        .await;
    h.run(StudyCommand::SetLength("long".parse().unwrap())).await;
    h.run(StudyCommand::Summarize).await;

    let prompt = &h.llm.prompts()[0];
    assert!(prompt.starts_with(
        "Summarize the following text into Long (Detailed explanation), for Best Practices."
    ));
}
