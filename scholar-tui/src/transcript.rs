use ratatui::style::Style;
use scholar_study::Notice;

use crate::styles;

#[derive(Clone)]
pub struct TranscriptLine {
    pub text: String,
    pub style: Style,
}

impl TranscriptLine {
    pub fn new(text: String, style: Style) -> Self {
        Self { text, style }
    }

    /// A notice becomes one line; raw model output keeps its own line breaks,
    /// each one marked.
    pub fn from_notice(n: &Notice) -> Vec<Self> {
        let style = styles::notice(n);
        let marker = styles::notice_marker(n);
        match n {
            Notice::Raw(text) => text
                .lines()
                .map(|line| Self::new(format!("  {marker} {line}"), style))
                .collect(),
            other => vec![Self::new(format!("{marker} {}", other.text()), style)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_output_is_split_per_line() {
        let lines = TranscriptLine::from_notice(&Notice::Raw("{\n  \"oops\"\n".into()));
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["  │ {", "  │   \"oops\""]);
    }

    #[test]
    fn severity_is_marked() {
        let lines = TranscriptLine::from_notice(&Notice::Error("no key".into()));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "× no key");
        assert_eq!(lines[0].style, styles::error());
    }
}
