//! The seam between the session core and the editor's engines.
//!
//! The core owns lifecycle, queues and teardown. Everything that needs a
//! terminal, a file store or a command grammar is reached through
//! [`EditorHost`].

use crate::error::Result;
use crate::exrc;
use crate::screen::Screen;
use crate::screen::ScreenId;
use crate::session::Session;

/// One input event from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Character(char),
    Interrupt,
}

impl Event {
    /// Enter or an interrupt dismisses a pending message.
    pub fn confirms(self) -> bool {
        matches!(
            self,
            Event::Interrupt | Event::Character('\r') | Event::Character('\n')
        )
    }
}

pub trait EditorHost {
    /// Terminal-dependent screen setup. Runs after the screen is linked, so a
    /// failure still leaves it to be ended by teardown.
    fn init_screen(&mut self, _session: &mut Session, _screen: ScreenId) -> Result<()> {
        Ok(())
    }

    /// Special-key table setup.
    fn init_keys(&mut self, _session: &mut Session, _screen: ScreenId) -> Result<()> {
        Ok(())
    }

    /// Reads the startup files. The default follows the historic order:
    /// `NEXINIT`/`EXINIT`, then the home rc file, then the local one.
    fn read_startup_files(&mut self, session: &mut Session, screen: ScreenId) -> Result<()> {
        exrc::read_startup_files(self, session, screen)
    }

    /// Lists the files that can be recovered (`-r` without arguments).
    fn list_recovery(&mut self, session: &mut Session, screen: ScreenId) -> Result<()>;

    /// Looks up `tag` and attaches its file to the screen.
    fn open_tag(&mut self, session: &mut Session, screen: ScreenId, tag: &str) -> Result<()>;

    /// Opens the screen's file reference.
    fn init_file(&mut self, session: &mut Session, screen: ScreenId) -> Result<()>;

    /// Executes pending command batches.
    fn run_commands(&mut self, session: &mut Session, screen: ScreenId) -> Result<()>;

    /// Blocks for the next input event.
    fn next_event(&mut self, session: &mut Session, screen: ScreenId) -> Result<Event>;

    fn bell(&mut self, session: &mut Session);

    /// One turn of the line interpreter. Returns the screen to run next, or
    /// `None` when no screens remain.
    fn ex(&mut self, session: &mut Session, screen: ScreenId) -> Result<Option<ScreenId>>;

    /// One turn of the visual interpreter, with the same contract as
    /// [`EditorHost::ex`].
    fn vi(&mut self, session: &mut Session, screen: ScreenId) -> Result<Option<ScreenId>>;

    /// Releases the screen's file. `force` discards modifications.
    fn end_file(&mut self, _session: &mut Session, _screen: &mut Screen, _force: bool) -> Result<()> {
        Ok(())
    }

    /// Final hook for a screen that has already been unlinked.
    fn end_screen(&mut self, _session: &mut Session, _screen: Screen) -> Result<()> {
        Ok(())
    }
}
