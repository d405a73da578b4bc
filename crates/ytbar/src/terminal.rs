//! Terminal setup and teardown for ratatui sessions.

use std::io::{self, Write};

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Position;
use ratatui::{Terminal, TerminalOptions, Viewport};

pub struct TerminalGuard {
    // Own the ratatui Terminal and restore terminal state on drop.
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    alternate_screen: bool,
    restored: bool,
}

impl TerminalGuard {
    /// Take over the terminal, either inline below the prompt or on the alternate screen.
    pub fn new(alternate_screen: bool, inline_height: u16) -> io::Result<Self> {
        // Enable raw mode so keypresses are delivered directly.
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        let viewport = if alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
            Viewport::Fullscreen
        } else {
            // Inline rendering keeps the final frame in the shell scrollback.
            Viewport::Inline(inline_height)
        };

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::with_options(backend, TerminalOptions { viewport })?;

        Ok(Self {
            terminal,
            alternate_screen,
            restored: false,
        })
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
        &mut self.terminal
    }

    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        disable_raw_mode()?;

        if self.alternate_screen {
            execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        } else {
            // Park the cursor under the inline viewport so the shell prompt lands below it.
            let area = self.terminal.get_frame().area();
            self.terminal
                .set_cursor_position(Position::new(0, area.bottom().saturating_sub(1)))?;
            let backend = self.terminal.backend_mut();
            backend.write_all(b"\r\n")?;
            backend.flush()?;
        }

        self.terminal.show_cursor()?;

        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort cleanup, never panic in Drop.
        let _ = self.restore();
    }
}
