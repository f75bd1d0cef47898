//! Pure rendering of a [`SessionState`] into styled lines.

use scholar_common::OptionLabel;

use crate::quiz::Choice;
use crate::session::{ContentSource, SessionState};

pub const START_HINT: &str =
    "Start by searching for a topic with /search <topic> (or just /search for the current one).";

/// Visual role of a line; the terminal front end maps it to a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Body,
    Muted,
    Selected,
    Hint,
    Emphasis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub text: String,
    pub tone: Tone,
}

impl ViewLine {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// Lines describing `state`, top to bottom.
///
/// Quiz results are never part of the view; they are reported once when the
/// quiz is submitted.
pub fn render(state: &SessionState) -> Vec<ViewLine> {
    let mut out = Vec::new();
    let prefs = &state.preferences;
    out.push(ViewLine::new(
        format!("Topic: {}", display_or(&state.topic, "(none)")),
        Tone::Emphasis,
    ));
    out.push(ViewLine::new(
        format!(
            "{} | {} | {} questions",
            prefs.explanation.label(),
            prefs.length.label(),
            prefs.question_count.get()
        ),
        Tone::Muted,
    ));
    out.push(blank());

    if state.papers.is_empty() {
        out.push(ViewLine::new(START_HINT, Tone::Hint));
        return out;
    }

    out.push(ViewLine::new(
        format!("Papers ({})", state.papers.len()),
        Tone::Heading,
    ));
    for (i, paper) in state.papers.iter().enumerate() {
        let chosen = state.selected == Some(i);
        let marker = if chosen { ">" } else { " " };
        out.push(ViewLine::new(
            format!("{marker} {}. {}", i + 1, paper.title),
            if chosen { Tone::Selected } else { Tone::Body },
        ));
    }
    out.push(blank());

    let Some(paper) = state.selected_paper() else {
        out.push(ViewLine::new(
            "Choose a paper to work with: /select <number or title>.",
            Tone::Hint,
        ));
        return out;
    };
    out.push(ViewLine::new(
        format!("Link: {}", display_or(&paper.link, "#")),
        Tone::Muted,
    ));
    out.push(ViewLine::new(format!("Snippet: {}", paper.snippet), Tone::Body));
    out.push(blank());

    let Some(text) = state.content_text() else {
        out.push(ViewLine::new(
            "Please fetch the content (/fetch) to retrieve the full text before generating study materials.",
            Tone::Hint,
        ));
        return out;
    };
    let origin = match state.content.as_ref().map(|(_, source)| *source) {
        Some(ContentSource::Snippet) => "the snippet",
        _ => "the page",
    };
    out.push(ViewLine::new(
        format!(
            "Working text: {} characters from {origin}. Generate with /summary, /qa or /quiz.",
            text.chars().count()
        ),
        Tone::Muted,
    ));

    if let Some(summary) = &state.summary {
        out.push(blank());
        out.push(ViewLine::new("Summarized Notes", Tone::Heading));
        out.extend(summary.lines().map(|l| ViewLine::new(l, Tone::Body)));
    }

    if let Some(questions) = state.questions.as_ref().filter(|q| !q.is_empty()) {
        out.push(blank());
        out.push(ViewLine::new(
            format!("Question Bank ({} Questions)", questions.len()),
            Tone::Heading,
        ));
        for q in questions {
            out.push(ViewLine::new(format!("Question: {}", q.question), Tone::Emphasis));
            out.push(ViewLine::new(format!("  Answer: {}", q.answer), Tone::Body));
        }
    }

    if let Some(cards) = state.flashcards.as_ref().filter(|c| !c.is_empty()) {
        out.push(blank());
        out.push(ViewLine::new(
            format!("Flashcards ({} Cards)", cards.len()),
            Tone::Heading,
        ));
        for card in cards {
            out.push(ViewLine::new(format!("Term: {}", card.term), Tone::Emphasis));
            out.push(ViewLine::new(
                format!("  Definition: {}", card.definition),
                Tone::Body,
            ));
        }
    }

    if let Some(questions) = state.quiz.questions() {
        out.push(blank());
        out.push(ViewLine::new(
            format!("Practice Quiz ({} Questions)", questions.len()),
            Tone::Heading,
        ));
        for (i, q) in questions.iter().enumerate() {
            let choice = state.quiz.choice(i);
            out.push(ViewLine::new(
                format!("Q{}: {}", i + 1, q.question),
                Tone::Emphasis,
            ));
            for (label, text) in &q.options {
                out.push(option_line(*label, text, choice));
            }
            let skipped = choice == Some(Choice::Skip);
            out.push(ViewLine::new(
                format!("  ({}) Skip", if skipped { "x" } else { " " }),
                if skipped { Tone::Selected } else { Tone::Muted },
            ));
        }
        out.push(ViewLine::new(
            "Answer with /answer <number> <A-D|skip>, then /submit.",
            Tone::Hint,
        ));
    }

    out
}

fn option_line(label: OptionLabel, text: &str, choice: Option<Choice>) -> ViewLine {
    let picked = choice == Some(Choice::Option(label));
    ViewLine::new(
        format!("  ({}) {label}. {text}", if picked { "x" } else { " " }),
        if picked { Tone::Selected } else { Tone::Body },
    )
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn blank() -> ViewLine {
    ViewLine::new(String::new(), Tone::Body)
}
