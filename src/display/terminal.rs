// src/display/terminal.rs
//! Terminal-based session screen with capture keys

use crate::{
    config::LoggerConfig,
    error::{LoggerError, Result},
    gps::data::{Position, RECORD_TIME_FORMAT},
    monitor::{Session, StatsSnapshot, Status},
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    time::Duration,
};
use tokio::{sync::mpsc, time::sleep};

/// What a key press asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Capture,
    Connect,
    Detach,
    Quit,
}

impl Action {
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('c') | KeyCode::Char(' ') | KeyCode::Enter => Some(Action::Capture),
            KeyCode::Char('o') => Some(Action::Connect),
            KeyCode::Char('d') => Some(Action::Detach),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => None,
        }
    }
}

/// Puts the terminal into raw mode and restores it on drop, on every exit
/// path.
struct RawModeGuard;

impl RawModeGuard {
    fn enter(stdout: &mut impl Write) -> Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(stdout, Hide, DisableLineWrap)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, Show, EnableLineWrap);
        let _ = terminal::disable_raw_mode();
    }
}

pub struct TerminalDisplay {
    log_name: String,
    status_line: String,
    status_is_error: bool,
    refresh: Duration,
}

impl TerminalDisplay {
    pub fn new(log_name: impl Into<String>) -> Self {
        Self {
            log_name: log_name.into(),
            status_line: String::new(),
            status_is_error: false,
            refresh: Duration::from_millis(100),
        }
    }

    /// Run the screen until the user quits
    pub async fn run(
        &mut self,
        session: &Session,
        config: &LoggerConfig,
        mut status_rx: mpsc::UnboundedReceiver<Status>,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        let _guard = RawModeGuard::enter(&mut stdout)?;

        loop {
            while let Ok(status) = status_rx.try_recv() {
                self.apply_status(&status);
            }

            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
            self.render_display(&mut stdout, session.fixes().latest(), session.stats())?;
            stdout.flush()?;

            while event::poll(Duration::ZERO)? {
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                match Action::from_key(&key) {
                    Some(Action::Quit) => return Ok(()),
                    Some(Action::Capture) => {
                        // Outcome arrives as a status message
                        let _ = session.capture();
                    }
                    Some(Action::Connect) => {
                        let _ = session.connect_serial(config).await;
                    }
                    Some(Action::Detach) => session.detach().await,
                    None => {}
                }
            }

            sleep(self.refresh).await;
        }
    }

    fn apply_status(&mut self, status: &Status) {
        self.status_is_error = matches!(
            status,
            Status::ReadError(_)
                | Status::ConnectFailed(_)
                | Status::CaptureFailed(_)
                | Status::WaitingForTransport
        );
        self.status_line = status.to_string();
    }

    fn render_display(
        &self,
        stdout: &mut impl Write,
        fix: Option<Position>,
        stats: StatsSnapshot,
    ) -> Result<()> {
        // Header
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\r\n"),
            Print("NMEA Logger"),
            Print("\r\n"),
            Print("=".repeat(60)),
            Print("\r\n"),
            ResetColor
        )?;

        self.render_position_section(stdout, fix)?;
        self.render_session_section(stdout, stats)?;
        self.render_status_section(stdout)?;

        // Footer
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\r\n"),
            Print("[c] capture  [o] open serial  [d] detach  [q] quit"),
            Print("\r\n"),
            ResetColor
        )?;

        Ok(())
    }

    fn render_position_section(
        &self,
        stdout: &mut impl Write,
        fix: Option<Position>,
    ) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print("LAST POSITION:\r\n"),
            ResetColor
        )?;

        match fix {
            Some(pos) => {
                let lat = Position::format_coordinate(pos.latitude());
                let lon = Position::format_coordinate(pos.longitude());
                let time = pos.timestamp().format(RECORD_TIME_FORMAT);
                execute!(
                    stdout,
                    Print(format!("  Latitude:  {}\r\n", lat)),
                    Print(format!("  Longitude: {}\r\n", lon)),
                    Print(format!("  Altitude:  {:>12.1} m\r\n", pos.altitude_m())),
                    Print(format!("  Time:      {}\r\n", time)),
                )?;
            }
            None => execute!(stdout, Print("  No fix\r\n"))?,
        }

        execute!(stdout, Print("\r\n"))?;
        Ok(())
    }

    fn render_session_section(&self, stdout: &mut impl Write, stats: StatsSnapshot) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print("SESSION:\r\n"),
            ResetColor,
            Print(format!("  Log file:    {}\r\n", self.log_name)),
            Print(format!("  Sentences:   {:>10}\r\n", stats.lines)),
            Print(format!("  Fixes:       {:>10}\r\n", stats.fixes)),
            Print(format!("  Ignored:     {:>10}\r\n", stats.ignored)),
            Print(format!("  Read errors: {:>10}\r\n\r\n", stats.read_errors)),
        )?;
        Ok(())
    }

    fn render_status_section(&self, stdout: &mut impl Write) -> Result<()> {
        let color = if self.status_is_error { Color::Red } else { Color::Magenta };
        let text = if self.status_line.is_empty() {
            "Ready"
        } else {
            &self.status_line
        };

        execute!(
            stdout,
            SetForegroundColor(color),
            Print("STATUS:\r\n"),
            ResetColor,
            Print(format!("  {}\r\n\r\n", text))
        )
        .map_err(LoggerError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_key_mapping() {
        let none = KeyModifiers::NONE;
        assert_eq!(Action::from_key(&press(KeyCode::Char('c'), none)), Some(Action::Capture));
        assert_eq!(Action::from_key(&press(KeyCode::Enter, none)), Some(Action::Capture));
        assert_eq!(Action::from_key(&press(KeyCode::Char('o'), none)), Some(Action::Connect));
        assert_eq!(Action::from_key(&press(KeyCode::Char('d'), none)), Some(Action::Detach));
        assert_eq!(Action::from_key(&press(KeyCode::Esc, none)), Some(Action::Quit));
        assert_eq!(
            Action::from_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(Action::from_key(&press(KeyCode::Char('x'), none)), None);
    }

    #[test]
    fn test_key_release_ignored() {
        let mut key = press(KeyCode::Char('c'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(Action::from_key(&key), None);
    }

    #[test]
    fn test_render_shows_fix_and_status() {
        let mut display = TerminalDisplay::new("session_20240101_000000.csv");
        display.apply_status(&Status::CaptureFailed("No position available for capture".into()));
        assert!(display.status_is_error);

        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let pos = Position::new(48.1173, 11.5167, 545.4, ts);
        let stats = StatsSnapshot {
            lines: 3,
            fixes: 2,
            ignored: 1,
            read_errors: 0,
        };
        let mut out = Vec::new();
        display.render_display(&mut out, Some(pos), stats).unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("48.117300"));
        assert!(text.contains("545.4 m"));
        assert!(text.contains("session_20240101_000000.csv"));
        assert!(text.contains("No position available for capture"));
    }

    #[test]
    fn test_render_without_fix() {
        let display = TerminalDisplay::new("log.csv");
        let mut out = Vec::new();
        display.render_display(&mut out, None, StatsSnapshot::default()).unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("No fix"));
        assert!(text.contains("Ready"));
    }
}
