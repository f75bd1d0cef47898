use crate::{
    command::{Command, HELP, parse_command},
    feeders::spawn_tui_feeders,
    input::InputLine,
    styles,
    transcript::TranscriptLine,
    view::{self, ViewSnap},
};
use anyhow::Result;
use crossterm::{
    event::{Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, style::Style};
use scholar_study::{Notice, SessionState, StudyCommand, StudyDesk, render};
use std::{
    collections::VecDeque,
    io::{self, Stdout},
};
use tokio::sync::mpsc;

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub enum TuiMsg {
    InputEvent(CtEvent),
    InputError(String),
    Tick,
}

enum Action {
    Submit(String),
    Quit,
}

enum Flow {
    Continue,
    Dispatch(StudyCommand),
    Quit,
}

/// Restores the terminal however the loop ends.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct StudyTui {
    term: Terminal<CrosstermBackend<Stdout>>,
    session: String,

    input: InputLine,
    study: Vec<TranscriptLine>,
    study_scroll: usize, // from top
    lines: Vec<TranscriptLine>,
    scroll: usize, // from bottom
    dirty: bool,

    busy: Option<&'static str>,
    spin_idx: usize,
}

/// Run the study desk in the terminal until the user quits.
///
/// Commands are processed one at a time; keys typed while one is in flight
/// are held back and replayed once it finishes.
pub async fn run(desk: StudyDesk, mut state: SessionState) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut tui = StudyTui::new(&state)?;
    tracing::info!(session = %state.id, "tui.start");

    let (tx, mut rx) = mpsc::channel::<TuiMsg>(256);
    spawn_tui_feeders(tx);

    let mut held: VecDeque<TuiMsg> = VecDeque::new();
    tui.draw()?;

    loop {
        let msg = match held.pop_front() {
            Some(msg) => msg,
            None => match rx.recv().await {
                Some(msg) => msg,
                None => break,
            },
        };

        let line = match msg {
            TuiMsg::Tick => {
                if tui.dirty {
                    tui.draw()?;
                }
                continue;
            }
            TuiMsg::InputError(e) => {
                tracing::warn!(error = %e, "tui.input.error");
                tui.push_styled(format!("× Input error: {e}"), styles::error());
                continue;
            }
            TuiMsg::InputEvent(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                match tui.handle_key(key) {
                    Some(Action::Submit(line)) => line,
                    Some(Action::Quit) => break,
                    None => continue,
                }
            }
            TuiMsg::InputEvent(CtEvent::Resize(..)) => {
                tui.dirty = true;
                continue;
            }
            TuiMsg::InputEvent(_) => continue,
        };

        let cmd = match tui.route_submit(line) {
            Flow::Continue => continue,
            Flow::Quit => break,
            Flow::Dispatch(cmd) => cmd,
        };

        tui.set_busy(Some(cmd.name()));
        tui.draw()?;
        let notices = {
            let work = desk.dispatch(&mut state, cmd);
            tokio::pin!(work);
            loop {
                tokio::select! {
                    notices = &mut work => break notices,
                    msg = rx.recv() => match msg {
                        Some(TuiMsg::Tick) => {
                            tui.step_spinner();
                            tui.draw()?;
                        }
                        Some(other) => held.push_back(other),
                        None => break (&mut work).await,
                    },
                }
            }
        };
        tui.push_notices(&notices);
        tui.refresh_study(&state);
        tui.set_busy(None);
    }

    tracing::info!(session = %state.id, "tui.stop");
    Ok(())
}

impl StudyTui {
    fn new(state: &SessionState) -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut term = Terminal::new(backend)?;
        term.clear()?;

        let mut tui = Self {
            term,
            session: state.id.simple().to_string()[..8].to_string(),
            input: InputLine::default(),
            study: Vec::new(),
            study_scroll: 0,
            lines: vec![TranscriptLine::new(
                "Welcome. Type /search <topic> to begin, or /help for all commands.".into(),
                styles::system(),
            )],
            scroll: 0,
            dirty: true,
            busy: None,
            spin_idx: 0,
        };
        tui.refresh_study(state);
        Ok(tui)
    }

    fn refresh_study(&mut self, state: &SessionState) {
        self.study = render(state)
            .into_iter()
            .map(|l| TranscriptLine::new(l.text, styles::tone(l.tone)))
            .collect();
        self.dirty = true;
    }

    fn push_styled<S: Into<String>>(&mut self, s: S, style: Style) {
        self.lines.push(TranscriptLine::new(s.into(), style));
        self.scroll = 0;
        self.dirty = true;
    }

    fn push_blank(&mut self) {
        self.push_styled(String::new(), Style::default());
    }

    fn push_notices(&mut self, notices: &[Notice]) {
        for n in notices {
            self.lines.extend(TranscriptLine::from_notice(n));
        }
        self.push_blank();
    }

    fn spinner(&self) -> &'static str {
        if self.busy.is_some() {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn set_busy(&mut self, what: Option<&'static str>) {
        self.busy = what;
        self.dirty = true;
    }

    fn step_spinner(&mut self) {
        if self.busy.is_some() {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            self.dirty = true;
        }
    }

    fn draw(&mut self) -> Result<()> {
        let snap = ViewSnap {
            input: self.input.text(),
            input_cursor: self.input.cursor(),
            study: &self.study,
            study_scroll: self.study_scroll,
            messages: &self.lines,
            scroll: self.scroll,
            busy: self.busy,
            spinner: self.spinner(),
            session: &self.session,
        };
        view::draw(&mut self.term, &snap)?;
        self.dirty = false;
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        self.dirty = true;
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), KeyModifiers::CONTROL) => return Some(Action::Quit),
            (KeyCode::PageUp, _) => {
                self.study_scroll = self.study_scroll.saturating_sub(5);
            }
            (KeyCode::PageDown, _) => {
                self.study_scroll = self
                    .study_scroll
                    .saturating_add(5)
                    .min(self.study.len().saturating_sub(1));
            }
            (KeyCode::Up, _) => {
                self.scroll = self
                    .scroll
                    .saturating_add(1)
                    .min(self.lines.len().saturating_sub(1));
            }
            (KeyCode::Down, _) => self.scroll = self.scroll.saturating_sub(1),
            (KeyCode::Enter, _) => return Some(Action::Submit(self.input.take())),
            (KeyCode::Left, _) => self.input.left(),
            (KeyCode::Right, _) => self.input.right(),
            (KeyCode::Home, _) => self.input.home(),
            (KeyCode::End, _) => self.input.end(),
            (KeyCode::Backspace, _) => self.input.backspace(),
            (KeyCode::Delete, _) => self.input.delete(),
            (KeyCode::Esc, _) => self.input.clear(),
            (KeyCode::Char(ch), _) => self.input.insert(ch),
            _ => self.dirty = false,
        }
        None
    }

    fn route_submit(&mut self, line: String) -> Flow {
        let s = line.trim();
        if s.is_empty() {
            return Flow::Continue;
        }
        self.push_styled(format!("→ {s}"), styles::user_header());

        match parse_command(s) {
            Command::Study(cmd) => Flow::Dispatch(cmd),
            Command::Quit => Flow::Quit,
            Command::Help => {
                self.push_styled("Commands:", styles::label());
                for (form, what) in HELP {
                    self.push_styled(format!("  {form:<24}{what}"), styles::value());
                }
                self.push_styled(
                    "PgUp/PgDn scroll the study panel, ↑/↓ the messages, Ctrl-C quits.",
                    styles::dim(),
                );
                self.push_blank();
                Flow::Continue
            }
            Command::Clear => {
                self.lines.clear();
                self.scroll = 0;
                self.dirty = true;
                Flow::Continue
            }
            Command::Usage(msg) => {
                self.push_styled(format!("× {msg}"), styles::error());
                self.push_blank();
                Flow::Continue
            }
            Command::Unknown(s) => {
                self.push_styled(format!("× Unknown command: {s}"), styles::error());
                self.push_styled("Commands start with '/'. Try `/help`.", styles::dim());
                self.push_blank();
                Flow::Continue
            }
        }
    }
}
