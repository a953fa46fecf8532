use std::io::{self, Write};

use blake3::Hash;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use thiserror::Error;

use super::{BASKET_TAB, DemoShell, FAVORITES_TAB, MAIN_TAB, ShellOutcome};
use crate::NavError;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("navigation error: {0}")]
    Navigation(#[from] NavError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverFlow {
    Continue,
    Quit,
}

/// Terminal loop around a [`DemoShell`]: raw mode, alternate screen and
/// key handling. Frames are fingerprinted so unchanged output is not redrawn.
pub struct TerminalDriver {
    shell: Option<DemoShell>,
    last_frame: Option<Hash>,
}

impl TerminalDriver {
    pub fn new(shell: DemoShell) -> Self {
        Self {
            shell: Some(shell),
            last_frame: None,
        }
    }

    pub fn shell(&self) -> Option<&DemoShell> {
        self.shell.as_ref()
    }

    pub fn run(mut self) -> DriverResult<()> {
        let mut stdout = io::stdout();
        self.enter(&mut stdout)?;
        let result = self.run_inner(&mut stdout);
        self.exit(&mut stdout);
        result
    }

    /// Feed key events without touching the real terminal.
    pub fn run_scripted<I>(&mut self, out: &mut impl Write, keys: I) -> DriverResult<()>
    where
        I: IntoIterator<Item = KeyEvent>,
    {
        self.draw(out)?;
        for key in keys {
            if self.handle_key(key)? == DriverFlow::Quit {
                break;
            }
            self.draw(out)?;
        }
        Ok(())
    }

    fn run_inner(&mut self, stdout: &mut impl Write) -> DriverResult<()> {
        loop {
            self.draw(stdout)?;
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key)? == DriverFlow::Quit {
                        return Ok(());
                    }
                }
                Event::Resize(..) => self.last_frame = None,
                _ => {}
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DriverResult<DriverFlow> {
        if key.code == KeyCode::Char('r') {
            let shell = self.take_shell()?;
            self.shell = Some(shell.restart()?);
            self.last_frame = None;
            return Ok(DriverFlow::Continue);
        }

        let shell = self.shell_mut()?;
        match key.code {
            KeyCode::Char('1') => shell.select(MAIN_TAB)?,
            KeyCode::Char('2') => shell.select(FAVORITES_TAB)?,
            KeyCode::Char('3') => shell.select(BASKET_TAB)?,
            KeyCode::Char('p') => shell.open_profile()?,
            KeyCode::Char('d') => shell.open_detail()?,
            KeyCode::Backspace | KeyCode::Esc => {
                if shell.back()? == ShellOutcome::Exit {
                    return Ok(DriverFlow::Quit);
                }
            }
            KeyCode::Char('q') => return Ok(DriverFlow::Quit),
            _ => {}
        }
        Ok(DriverFlow::Continue)
    }

    fn draw(&mut self, out: &mut impl Write) -> DriverResult<()> {
        let frame = self.shell_mut()?.render()?;
        let hash = blake3::hash(frame.as_bytes());
        if self.last_frame == Some(hash) {
            return Ok(());
        }
        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
        for (row, line) in frame.lines().enumerate() {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            queue!(out, MoveTo(0, row), Print(line))?;
        }
        out.flush()?;
        self.last_frame = Some(hash);
        Ok(())
    }

    fn shell_mut(&mut self) -> DriverResult<&mut DemoShell> {
        self.shell
            .as_mut()
            .ok_or_else(|| DriverError::Terminal("shell lost during restart".to_string()))
    }

    fn take_shell(&mut self) -> DriverResult<DemoShell> {
        self.shell
            .take()
            .ok_or_else(|| DriverError::Terminal("shell lost during restart".to_string()))
    }

    fn enter(&self, stdout: &mut impl Write) -> DriverResult<()> {
        terminal::enable_raw_mode().map_err(|err| DriverError::Terminal(err.to_string()))?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(())
    }

    fn exit(&self, stdout: &mut impl Write) {
        execute!(stdout, Show, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::navigation::NavigationConfig;
    use crate::shell::DemoHost;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn driver() -> TerminalDriver {
        let shell = DemoShell::create(DemoHost::new(), NavigationConfig::default(), None).unwrap();
        TerminalDriver::new(shell)
    }

    fn selected(driver: &TerminalDriver) -> Option<String> {
        driver.shell().unwrap().navigator().selected_tab()
    }

    #[test]
    fn keys_drive_navigation() {
        let mut driver = driver();
        let mut out = Vec::new();
        driver
            .run_scripted(
                &mut out,
                [key(KeyCode::Char('3')), key(KeyCode::Char('d'))],
            )
            .unwrap();
        assert_eq!(selected(&driver).as_deref(), Some(BASKET_TAB));
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Detail #1"));
    }

    #[test]
    fn unhandled_back_quits() {
        let mut driver = driver();
        assert_eq!(
            driver.handle_key(key(KeyCode::Char('2'))).unwrap(),
            DriverFlow::Continue
        );
        assert_eq!(
            driver.handle_key(key(KeyCode::Esc)).unwrap(),
            DriverFlow::Continue
        );
        assert_eq!(selected(&driver).as_deref(), Some(MAIN_TAB));
        assert_eq!(
            driver.handle_key(key(KeyCode::Backspace)).unwrap(),
            DriverFlow::Quit
        );
    }

    #[test]
    fn restart_key_keeps_navigation() {
        let mut driver = driver();
        driver.handle_key(key(KeyCode::Char('2'))).unwrap();
        driver.handle_key(key(KeyCode::Char('p'))).unwrap();
        driver.handle_key(key(KeyCode::Char('r'))).unwrap();
        assert_eq!(selected(&driver).as_deref(), Some(FAVORITES_TAB));
        let depth = driver
            .shell()
            .unwrap()
            .navigator()
            .with(|nav| nav.stack(FAVORITES_TAB).map(|stack| stack.depth()))
            .unwrap();
        assert_eq!(depth, Some(2));
    }

    #[test]
    fn identical_frames_are_skipped() {
        let mut driver = driver();
        let mut out = Vec::new();
        driver.draw(&mut out).unwrap();
        let first = out.len();
        driver.draw(&mut out).unwrap();
        assert_eq!(out.len(), first);
        driver.handle_key(key(KeyCode::Char('2'))).unwrap();
        driver.draw(&mut out).unwrap();
        assert!(out.len() > first);
    }
}
