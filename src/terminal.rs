//! Terminal setup for the interactive study screen.

use std::io::{self, Stdout};
use std::ops::{Deref, DerefMut};
use std::panic;
use std::sync::Once;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

pub type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

static PANIC_HOOK: Once = Once::new();

/// Raw-mode alternate screen with mouse capture for card drags.
///
/// The terminal is put back the way it was when this value is dropped, or
/// by [`StudyTerminal::leave`] when the caller wants to see the error.
pub struct StudyTerminal {
    terminal: AppTerminal,
    active: bool,
}

impl StudyTerminal {
    pub fn enter() -> io::Result<Self> {
        PANIC_HOOK.call_once(install_panic_hook);

        enable_raw_mode()?;
        let entered = execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)
            .and_then(|()| Terminal::new(CrosstermBackend::new(io::stdout())));
        match entered {
            Ok(terminal) => Ok(Self {
                terminal,
                active: true,
            }),
            Err(e) => {
                let _ = reset();
                Err(e)
            }
        }
    }

    pub fn leave(mut self) -> io::Result<()> {
        self.active = false;
        reset()
    }
}

impl Deref for StudyTerminal {
    type Target = AppTerminal;

    fn deref(&self) -> &AppTerminal {
        &self.terminal
    }
}

impl DerefMut for StudyTerminal {
    fn deref_mut(&mut self) -> &mut AppTerminal {
        &mut self.terminal
    }
}

impl Drop for StudyTerminal {
    fn drop(&mut self) {
        if self.active {
            let _ = reset();
        }
    }
}

fn reset() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen)
}

/// Restore the screen before the panic message is printed.
fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = reset();
        previous(info);
    }));
}
