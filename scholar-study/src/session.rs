use scholar_common::{Flashcard, Paper, QaPair, StudyPreferences};
use uuid::Uuid;

use crate::quiz::QuizController;

/// Where the working text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Paragraphs scraped from the paper's page.
    Page,
    /// The search snippet, used when the page gave nothing.
    Snippet,
}

/// Everything one interactive session knows.
///
/// Generated material is `None` until the matching command succeeds.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: Uuid,
    pub topic: String,
    pub preferences: StudyPreferences,
    pub papers: Vec<Paper>,
    /// Index into `papers`.
    pub selected: Option<usize>,
    pub content: Option<(String, ContentSource)>,
    pub summary: Option<String>,
    pub questions: Option<Vec<QaPair>>,
    pub flashcards: Option<Vec<Flashcard>>,
    pub quiz: QuizController,
}

impl SessionState {
    pub fn new(topic: impl Into<String>, preferences: StudyPreferences) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            preferences,
            papers: Vec::new(),
            selected: None,
            content: None,
            summary: None,
            questions: None,
            flashcards: None,
            quiz: QuizController::new(),
        }
    }

    pub fn selected_paper(&self) -> Option<&Paper> {
        self.papers.get(self.selected?)
    }

    /// Working text, if any non-blank text has been retrieved.
    pub fn content_text(&self) -> Option<&str> {
        self.content
            .as_ref()
            .map(|(text, _)| text.as_str())
            .filter(|text| !text.trim().is_empty())
    }

    /// Install a new result list; everything derived from the old one goes.
    pub fn replace_papers(&mut self, papers: Vec<Paper>) {
        self.papers = papers;
        self.selected = None;
        self.clear_content();
    }

    /// Drop retrieved content and every piece of material generated from it.
    pub fn clear_content(&mut self) {
        self.content = None;
        self.clear_generated();
    }

    pub fn clear_generated(&mut self) {
        self.summary = None;
        self.questions = None;
        self.flashcards = None;
        self.quiz.clear();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(String::new(), StudyPreferences::default())
    }
}
