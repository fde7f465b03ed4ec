use std::fmt;

use bitflags::bitflags;

use crate::file_ref::FileRefId;
use crate::options::Options;

bitflags! {
    /// Per-screen mode and state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScreenFlags: u32 {
        /// Line-oriented interpreter is active.
        const EX = 1 << 0;
        /// Visual interpreter is active.
        const VI = 1 << 1;
        /// Batch mode: no prompts, no informational output.
        const EX_SILENT = 1 << 2;
        /// The screen asked to be closed.
        const EXIT = 1 << 3;
        /// The screen asked to be closed, discarding modifications.
        const EXIT_FORCE = 1 << 4;
        /// A message was printed in ex context during setup and the user
        /// has not seen it yet.
        const SCR_EX = 1 << 5;
        /// Show the file status line on the first visual refresh.
        const STATUS_CNT = 1 << 6;
        /// Argument list holds recovery names rather than file names.
        const ARG_RECOVER = 1 << 7;

        const MODE_MASK = Self::EX.bits() | Self::VI.bits();
        const EXIT_MASK = Self::EXIT.bits() | Self::EXIT_FORCE.bits();
    }
}

/// Stable handle for a screen linked into a session's queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(pub(crate) u32);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One editing window. Built in two phases: [`Screen::allocate`] produces a
/// handle with no fallible work done, the session links it, and only then
/// do the host and the driver populate it.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    id: ScreenId,
    pub flags: ScreenFlags,
    pub rows: usize,
    pub cols: usize,
    /// Lines moved by an uncounted scroll command.
    pub default_scroll: usize,
    /// Files named on the command line, in order.
    pub args: Vec<String>,
    pub file: Option<FileRefId>,
    pub options: Options,
}

impl Screen {
    pub(crate) fn allocate(id: ScreenId) -> Self {
        Self {
            id,
            flags: ScreenFlags::empty(),
            rows: 0,
            cols: 0,
            default_scroll: 0,
            args: Vec::new(),
            file: None,
            options: Options::default(),
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    /// Replaces the active interpreter bit, leaving every other flag alone.
    pub fn set_mode(&mut self, mode: ScreenFlags) {
        self.flags.remove(ScreenFlags::MODE_MASK);
        self.flags.insert(mode & ScreenFlags::MODE_MASK);
    }

    pub fn is_ex(&self) -> bool {
        self.flags.contains(ScreenFlags::EX)
    }

    pub fn is_vi(&self) -> bool {
        self.flags.contains(ScreenFlags::VI)
    }

    pub fn exit_requested(&self) -> bool {
        self.flags.intersects(ScreenFlags::EXIT_MASK)
    }
}
