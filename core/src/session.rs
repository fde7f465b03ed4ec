use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::io::Write;

use bitflags::bitflags;
#[cfg(debug_assertions)]
use tracing::warn;

use crate::command_queue::CommandQueue;
use crate::config::Config;
use crate::error::ExviErr;
use crate::error::Result;
use crate::file_ref::FileRef;
use crate::file_ref::FileRefId;
use crate::host::Event;
use crate::message::MessageQueue;
use crate::mode::EditorMode;
use crate::screen::Screen;
use crate::screen::ScreenId;
#[cfg(debug_assertions)]
use crate::trace::TraceSink;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SessionFlags: u32 {
        /// Keep recovery snapshots of modified files.
        const SNAPSHOT = 1 << 0;
        /// Standard input is not a terminal.
        const SCRIPTED = 1 << 1;
        /// Ring the bell before exiting.
        const BELL_SCHED = 1 << 2;
    }
}

/// Process-wide editor state, passed explicitly to every driver step and
/// collaborator.
#[derive(Debug)]
pub struct Session {
    program: String,
    mode: Option<EditorMode>,
    pub flags: SessionFlags,
    /// The `-c` command, run once against the first file.
    pub command_option: Option<String>,
    visible: VecDeque<Screen>,
    hidden: VecDeque<Screen>,
    /// Screen collecting a command line outside the normal queues.
    pub ccl_screen: Option<Screen>,
    pub commands: CommandQueue,
    pub messages: MessageQueue,
    file_refs: Vec<FileRef>,
    /// Text storage shared by every screen's unnamed buffer.
    pub default_text: Vec<u8>,
    pub cut_buffers: BTreeMap<char, Vec<u8>>,
    /// Key sequences: maps and abbreviations.
    pub sequences: BTreeMap<String, String>,
    /// Events read ahead of the interpreter that will consume them.
    pub input_events: VecDeque<Event>,
    pub config: Config,
    next_screen_id: u32,
    #[cfg(debug_assertions)]
    trace: Option<TraceSink>,
}

impl Session {
    pub fn new(program: impl Into<String>, config: Config) -> Self {
        Self {
            program: program.into(),
            mode: None,
            flags: SessionFlags::empty(),
            command_option: None,
            visible: VecDeque::new(),
            hidden: VecDeque::new(),
            ccl_screen: None,
            commands: CommandQueue::default(),
            messages: MessageQueue::default(),
            file_refs: Vec::new(),
            default_text: Vec::new(),
            cut_buffers: BTreeMap::new(),
            sequences: BTreeMap::new(),
            input_events: VecDeque::new(),
            config,
            next_screen_id: 1,
            #[cfg(debug_assertions)]
            trace: None,
        }
    }

    /// Name the process was invoked as; prefixes error messages.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn mode(&self) -> Option<EditorMode> {
        self.mode
    }

    /// Records the detected mode. The first value sticks.
    pub(crate) fn fix_mode(&mut self, mode: EditorMode) -> EditorMode {
        *self.mode.get_or_insert(mode)
    }

    /// Allocates a screen and links it at the front of the visible queue.
    /// Nothing fallible happens before the link, so teardown always finds it.
    pub fn link_screen(&mut self) -> ScreenId {
        let id = ScreenId(self.next_screen_id);
        self.next_screen_id += 1;
        self.visible.push_front(Screen::allocate(id));
        id
    }

    pub fn screen(&self, id: ScreenId) -> Option<&Screen> {
        self.visible
            .iter()
            .chain(self.hidden.iter())
            .chain(self.ccl_screen.iter())
            .find(|screen| screen.id() == id)
    }

    pub fn screen_mut(&mut self, id: ScreenId) -> Option<&mut Screen> {
        self.visible
            .iter_mut()
            .chain(self.hidden.iter_mut())
            .chain(self.ccl_screen.iter_mut())
            .find(|screen| screen.id() == id)
    }

    pub fn require_screen_mut(&mut self, id: ScreenId) -> Result<&mut Screen> {
        self.screen_mut(id).ok_or(ExviErr::UnknownScreen(id))
    }

    /// Unlinks a screen from whichever queue holds it.
    pub fn remove_screen(&mut self, id: ScreenId) -> Option<Screen> {
        if let Some(index) = self.visible.iter().position(|screen| screen.id() == id) {
            return self.visible.remove(index);
        }
        if let Some(index) = self.hidden.iter().position(|screen| screen.id() == id) {
            return self.hidden.remove(index);
        }
        if self.ccl_screen.as_ref().is_some_and(|screen| screen.id() == id) {
            return self.ccl_screen.take();
        }
        None
    }

    /// Moves a visible screen to the back of the hidden queue.
    pub fn hide_screen(&mut self, id: ScreenId) -> Result<()> {
        let index = self
            .visible
            .iter()
            .position(|screen| screen.id() == id)
            .ok_or(ExviErr::UnknownScreen(id))?;
        if let Some(screen) = self.visible.remove(index) {
            self.hidden.push_back(screen);
        }
        Ok(())
    }

    pub fn first_visible(&self) -> Option<ScreenId> {
        self.visible.front().map(Screen::id)
    }

    pub fn visible_ids(&self) -> Vec<ScreenId> {
        self.visible.iter().map(Screen::id).collect()
    }

    pub fn hidden_ids(&self) -> Vec<ScreenId> {
        self.hidden.iter().map(Screen::id).collect()
    }

    pub(crate) fn pop_visible(&mut self) -> Option<Screen> {
        self.visible.pop_front()
    }

    pub(crate) fn pop_hidden(&mut self) -> Option<Screen> {
        self.hidden.pop_front()
    }

    /// Returns the reference for `name`, creating it if needed. Every call
    /// without a name creates a new scratch file.
    pub fn add_file(&mut self, name: Option<&str>) -> FileRefId {
        let existing = name.and_then(|name| {
            self.file_refs
                .iter()
                .position(|file| file.name.as_deref() == Some(name))
        });
        if let Some(index) = existing {
            return FileRefId(index);
        }
        self.file_refs.push(match name {
            Some(name) => FileRef::named(name),
            None => FileRef::scratch(),
        });
        FileRefId(self.file_refs.len() - 1)
    }

    pub fn file(&self, id: FileRefId) -> Option<&FileRef> {
        self.file_refs.get(id.0)
    }

    pub fn file_mut(&mut self, id: FileRefId) -> Option<&mut FileRef> {
        self.file_refs.get_mut(id.0)
    }

    pub fn files(&self) -> &[FileRef] {
        &self.file_refs
    }

    /// Writes every pending message to `out`, oldest first.
    pub fn flush_messages(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let Self {
            program, messages, ..
        } = self;
        messages.drain_to(out, program)
    }

    #[cfg(debug_assertions)]
    pub(crate) fn open_trace(&mut self, path: &std::path::Path) -> Result<()> {
        let sink = TraceSink::open(path).map_err(|source| ExviErr::TraceFile {
            path: path.to_path_buf(),
            source,
        })?;
        self.trace = Some(sink);
        Ok(())
    }

    /// Appends a line to the `-T` trace file, when one is open.
    #[cfg(debug_assertions)]
    pub fn trace(&mut self, args: fmt::Arguments<'_>) {
        let Some(sink) = self.trace.as_mut() else {
            return;
        };
        if let Err(err) = sink.write_line(args) {
            warn!("trace write failed: {err}");
            self.trace = None;
        }
    }

    #[cfg(not(debug_assertions))]
    pub fn trace(&mut self, _args: fmt::Arguments<'_>) {}

    #[cfg(debug_assertions)]
    pub(crate) fn close_trace(&mut self) {
        if let Some(Err(err)) = self.trace.take().map(TraceSink::close) {
            warn!("trace close failed: {err}");
        }
    }

    /// Drops the stores screens share. Only done explicitly in debug builds,
    /// where leak checkers run.
    #[cfg(debug_assertions)]
    pub(crate) fn release_shared(&mut self) {
        self.file_refs.clear();
        self.input_events.clear();
        self.cut_buffers.clear();
        self.sequences.clear();
        self.default_text.clear();
    }
}
