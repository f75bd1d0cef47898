use ratatui::style::{Color, Modifier, Style};
use scholar_study::{Notice, Tone};

pub fn user_header() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

pub fn label() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn value() -> Style {
    Style::default().fg(Color::White)
}

pub fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn system() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn error() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

pub fn success() -> Style {
    Style::default().fg(Color::LightGreen)
}

pub fn warning() -> Style {
    Style::default().fg(Color::LightYellow)
}

pub fn raw() -> Style {
    Style::default().fg(Color::Magenta)
}

pub fn notice(n: &Notice) -> Style {
    match n {
        Notice::Info(_) => system(),
        Notice::Success(_) => success(),
        Notice::Warning(_) => warning(),
        Notice::Error(_) => error(),
        Notice::Raw(_) => raw(),
    }
}

/// Prefix shown before a notice in the message log.
pub fn notice_marker(n: &Notice) -> &'static str {
    match n {
        Notice::Info(_) => "·",
        Notice::Success(_) => "✓",
        Notice::Warning(_) => "!",
        Notice::Error(_) => "×",
        Notice::Raw(_) => "│",
    }
}

pub fn tone(t: Tone) -> Style {
    match t {
        Tone::Heading => label(),
        Tone::Body => value(),
        Tone::Muted => dim(),
        Tone::Selected => Style::default()
            .fg(Color::LightGreen)
            .add_modifier(Modifier::BOLD),
        Tone::Hint => Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
        Tone::Emphasis => Style::default().fg(Color::Cyan),
    }
}
