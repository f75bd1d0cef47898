use crate::transcript::TranscriptLine;
use anyhow::Result;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::io::Stdout;
use textwrap::wrap;

pub struct ViewSnap<'a> {
    pub input: &'a str,
    pub input_cursor: usize,
    pub study: &'a [TranscriptLine],
    pub study_scroll: usize, // from top
    pub messages: &'a [TranscriptLine],
    pub scroll: usize, // from bottom
    pub busy: Option<&'static str>,
    pub spinner: &'static str,
    pub session: &'a str,
}

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, snap: &ViewSnap<'_>) -> Result<()> {
    term.draw(|frame| {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(Line::from(vec![Span::styled(
            " Scholar Study Desk ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .wrap(Wrap { trim: true });
        frame.render_widget(header, layout[0]);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);

        // Study panel, scrolled from the top
        let visible_h = panels[0].height.saturating_sub(2) as usize;
        let wrapped = wrap_lines(snap.study, panels[0].width.saturating_sub(2) as usize);
        let start = snap
            .study_scroll
            .min(wrapped.len().saturating_sub(visible_h));
        let end = (start + visible_h).min(wrapped.len());
        let study = List::new(to_items(&wrapped[start..end]))
            .block(Block::default().borders(Borders::ALL).title(" Study "));
        frame.render_widget(study, panels[0]);

        // Message log, scrolled from the bottom
        let visible_h = panels[1].height.saturating_sub(2) as usize;
        let wrapped = wrap_lines(snap.messages, panels[1].width.saturating_sub(2) as usize);
        let total = wrapped.len();
        let scroll = snap.scroll.min(total.saturating_sub(visible_h));
        let start = total.saturating_sub(visible_h + scroll);
        let end = total.saturating_sub(scroll);
        let log = List::new(to_items(&wrapped[start..end]))
            .block(Block::default().borders(Borders::ALL).title(" Messages "));
        frame.render_widget(log, panels[1]);

        let input_box = Paragraph::new(snap.input)
            .block(Block::default().borders(Borders::ALL).title(" Input "));
        frame.render_widget(Clear, layout[2]);
        frame.render_widget(input_box, layout[2]);

        let caret_x = layout[2].x + 1 + visual_caret_col(snap.input, snap.input_cursor);
        let caret_y = layout[2].y + 1;
        frame.set_cursor_position(Position {
            x: caret_x,
            y: caret_y,
        });

        let status_line = Line::from(vec![
            Span::raw(" "),
            Span::styled(snap.spinner, Style::default().fg(Color::Yellow)),
            Span::raw(" "),
            match snap.busy {
                Some(what) => {
                    Span::styled(format!("Working on /{what}…"), Style::default().fg(Color::Yellow))
                }
                None => Span::styled("Idle", Style::default().fg(Color::Green)),
            },
            Span::styled(
                format!(" • session {} • PgUp/PgDn study • ↑/↓ messages", snap.session),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let status = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[3]);
    })?;

    Ok(())
}

fn to_items(lines: &[(String, Style)]) -> Vec<ListItem<'static>> {
    lines
        .iter()
        .map(|(text, style)| ListItem::new(Line::from(Span::styled(text.clone(), *style))))
        .collect()
}

fn visual_caret_col(input: &str, cursor: usize) -> u16 {
    use unicode_width::UnicodeWidthStr;
    UnicodeWidthStr::width(&input[..cursor]) as u16
}

pub(crate) fn wrap_lines(lines: &[TranscriptLine], width: usize) -> Vec<(String, Style)> {
    let effective_width = width.max(1);
    let mut out = Vec::new();

    for entry in lines {
        let style = entry.style;
        for raw_line in entry.text.split('\n') {
            if raw_line.is_empty() {
                out.push((String::new(), style));
                continue;
            }
            // keep indentation on wrapped continuation lines
            let indent: String = raw_line.chars().take_while(|c| *c == ' ').collect();
            let options = textwrap::Options::new(effective_width).subsequent_indent(&indent);
            let segments = wrap(raw_line, options);
            if segments.is_empty() {
                out.push((String::new(), style));
            } else {
                out.extend(segments.into_iter().map(|seg| (seg.into_owned(), style)));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_lines_keep_style_and_indent() {
        let style = Style::default().fg(Color::Red);
        let lines = [
            TranscriptLine::new("  Answer: one two three four".into(), style),
            TranscriptLine::new(String::new(), Style::default()),
        ];
        let out = wrap_lines(&lines, 14);
        let texts: Vec<_> = out.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, ["  Answer: one", "  two three", "  four", ""]);
        assert!(out[..3].iter().all(|(_, s)| *s == style));
    }

    #[test]
    fn zero_width_does_not_panic() {
        let lines = [TranscriptLine::new("abc".into(), Style::default())];
        assert!(!wrap_lines(&lines, 0).is_empty());
    }
}
