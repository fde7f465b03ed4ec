//! A line-mode host: every screen runs a minimal ex command reader over the
//! process's standard streams. There is no visual mode; `vi` screens fall
//! back to ex after saying so.

use std::fs;
use std::io;
use std::io::BufRead;
use std::io::Write;
use std::path::Path;

use exvi_core::EditorHost;
use exvi_core::Event;
use exvi_core::ExviErr;
use exvi_core::QueuedCommand;
use exvi_core::Result;
use exvi_core::ScreenFlags;
use exvi_core::ScreenId;
use exvi_core::Session;
use exvi_core::end_screen;
use exvi_core::options::OptionName;
use exvi_core::script;
use strum::IntoEnumIterator;
use tempfile::TempPath;
use tracing::debug;
use tracing::warn;

/// Tags file searched by `-t`, relative to the working directory.
const TAGS_FILE: &str = "tags";

/// Scripts sourcing scripts deeper than this are refused.
const MAX_SOURCE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// The screen switched interpreters.
    Switch,
}

pub struct LineHost {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    errors: Box<dyn Write>,
    /// Backing files for unnamed buffers, removed when the host is dropped.
    scratch: Vec<TempPath>,
}

impl LineHost {
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>, errors: Box<dyn Write>) -> Self {
        Self {
            input,
            output,
            errors,
            scratch: Vec::new(),
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn show_messages(&mut self, session: &mut Session) -> Result<()> {
        session.flush_messages(&mut self.errors)?;
        Ok(())
    }

    fn prompt(&mut self, session: &Session, screen: ScreenId) -> Result<()> {
        let wanted = session.screen(screen).is_some_and(|screen| {
            screen.options.prompt && !screen.flags.contains(ScreenFlags::EX_SILENT)
        });
        if wanted {
            self.output.write_all(b":")?;
            self.output.flush()?;
        }
        Ok(())
    }

    /// Runs one batch line by line. Batches queued by the batch itself run
    /// to completion before its next line.
    fn run_batch(
        &mut self,
        session: &mut Session,
        screen: ScreenId,
        batch: QueuedCommand,
        depth: usize,
    ) -> Result<()> {
        let name = batch.name.as_deref().unwrap_or("command");
        if depth > MAX_SOURCE_DEPTH {
            session
                .messages
                .error(format!("{name}: scripts nested too deeply"));
            return Ok(());
        }
        debug!("running {name} at depth {depth}");

        let text = String::from_utf8_lossy(&batch.text).into_owned();
        let pending = session.commands.len();
        for line in text.lines() {
            if exit_requested(session, screen) {
                break;
            }
            self.execute(session, screen, line)?;
            while session.commands.len() > pending {
                let Some(nested) = session.commands.pop_next() else {
                    break;
                };
                self.run_batch(session, screen, nested, depth + 1)?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, session: &mut Session, screen: ScreenId, line: &str) -> Result<Flow> {
        let line = line.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
        let split = line
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(line.len());
        let (name, rest) = match split {
            // Single-character commands such as `"`.
            0 => line.split_at(line.chars().next().map_or(0, char::len_utf8)),
            _ => line.split_at(split),
        };
        let (force, rest) = match rest.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let rest = rest.trim();

        match name {
            "" | "\"" => {}
            name if abbreviates(name, "quit", 1) => {
                let flag = if force {
                    ScreenFlags::EXIT_FORCE
                } else {
                    ScreenFlags::EXIT
                };
                session.require_screen_mut(screen)?.flags.insert(flag);
            }
            name if abbreviates(name, "source", 2) => source(session, rest)?,
            name if abbreviates(name, "set", 2) => set(session, screen, rest)?,
            name if abbreviates(name, "visual", 2) => {
                session.require_screen_mut(screen)?.set_mode(ScreenFlags::VI);
                return Ok(Flow::Switch);
            }
            name if abbreviates(name, "file", 1) => file_status(session, screen)?,
            name => session
                .messages
                .error(format!("The {name} command is unknown")),
        }
        Ok(Flow::Continue)
    }

    /// Describes the file a screen was opened on.
    fn announce_file(&mut self, session: &mut Session, screen: ScreenId) -> Result<()> {
        let Some(file) = session.screen(screen).and_then(|screen| screen.file) else {
            return Ok(());
        };
        let Some(file_ref) = session.file(file) else {
            return Ok(());
        };
        let recover = file_ref.recover;
        let Some(name) = file_ref.name.clone() else {
            let path = tempfile::Builder::new()
                .prefix("exvi.")
                .tempfile()?
                .into_temp_path();
            debug!("scratch file {}", path.display());
            if let Some(file_ref) = session.file_mut(file) {
                file_ref.temp_name = Some(path.to_path_buf());
            }
            self.scratch.push(path);
            return Ok(());
        };

        if recover {
            session
                .messages
                .error(format!("No recovery file for {name}"));
        }
        match fs::read(&name) {
            Ok(contents) => {
                let lines = contents.iter().filter(|byte| **byte == b'\n').count();
                session.messages.info(format!("\"{name}\": {lines} lines"));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                session.messages.info(format!("\"{name}\": new file"));
            }
            Err(err) => session.messages.sys_err(&name, &err),
        }
        Ok(())
    }
}

impl EditorHost for LineHost {
    fn list_recovery(&mut self, session: &mut Session, _screen: ScreenId) -> Result<()> {
        session.messages.info("No files to recover");
        Ok(())
    }

    fn open_tag(&mut self, session: &mut Session, screen: ScreenId, tag: &str) -> Result<()> {
        let tags = match fs::read_to_string(TAGS_FILE) {
            Ok(tags) => tags,
            Err(err) => {
                session.messages.sys_err(TAGS_FILE, &err);
                return Err(ExviErr::AlreadyReported);
            }
        };
        let Some(path) = lookup_tag(&tags, tag) else {
            session.messages.error(format!("{tag}: tag not found"));
            return Err(ExviErr::AlreadyReported);
        };
        let file = session.add_file(Some(path));
        session.require_screen_mut(screen)?.file = Some(file);
        self.announce_file(session, screen)
    }

    fn init_file(&mut self, session: &mut Session, screen: ScreenId) -> Result<()> {
        self.announce_file(session, screen)
    }

    fn run_commands(&mut self, session: &mut Session, screen: ScreenId) -> Result<()> {
        while let Some(batch) = session.commands.pop_next() {
            self.run_batch(session, screen, batch, 0)?;
            if exit_requested(session, screen) {
                break;
            }
        }
        Ok(())
    }

    fn next_event(&mut self, _session: &mut Session, _screen: ScreenId) -> Result<Event> {
        let byte = self.input.fill_buf()?.first().copied();
        Ok(match byte {
            Some(byte) => {
                self.input.consume(1);
                Event::Character(char::from(byte))
            }
            None => Event::Interrupt,
        })
    }

    fn bell(&mut self, _session: &mut Session) {
        if let Err(err) = self.output.write_all(b"\x07").and_then(|()| self.output.flush()) {
            warn!("bell failed: {err}");
        }
    }

    fn ex(&mut self, session: &mut Session, screen: ScreenId) -> Result<Option<ScreenId>> {
        loop {
            self.show_messages(session)?;
            if exit_requested(session, screen) {
                end_screen(self, session, screen)?;
                self.show_messages(session)?;
                return Ok(session.first_visible());
            }

            self.prompt(session, screen)?;
            let Some(line) = self.read_line()? else {
                session
                    .require_screen_mut(screen)?
                    .flags
                    .insert(ScreenFlags::EXIT);
                continue;
            };
            if self.execute(session, screen, &line)? == Flow::Switch {
                return Ok(Some(screen));
            }
            if session.commands.is_running() {
                self.run_commands(session, screen)?;
            }
        }
    }

    fn vi(&mut self, session: &mut Session, screen: ScreenId) -> Result<Option<ScreenId>> {
        session
            .messages
            .info("Visual mode is not available; continuing in ex mode");
        session.require_screen_mut(screen)?.set_mode(ScreenFlags::EX);
        Ok(Some(screen))
    }
}

fn exit_requested(session: &Session, screen: ScreenId) -> bool {
    session
        .screen(screen)
        .is_none_or(|screen| screen.exit_requested())
}

/// True when `word` is `full` or a prefix of it at least `min` long.
fn abbreviates(word: &str, full: &str, min: usize) -> bool {
    word.len() >= min && full.starts_with(word)
}

/// File for `tag` in a `name<TAB>file<TAB>address` tags file.
fn lookup_tag<'a>(tags: &'a str, tag: &str) -> Option<&'a str> {
    tags.lines().find_map(|line| {
        let mut fields = line.split('\t');
        let name = fields.next()?;
        let file = fields.next()?;
        (name == tag).then_some(file)
    })
}

fn source(session: &mut Session, path: &str) -> Result<()> {
    if path.is_empty() {
        session.messages.error("Usage: source file");
        return Ok(());
    }
    match script::source_file(session, Path::new(path)) {
        Err(ExviErr::AlreadyReported) => Ok(()),
        result => result,
    }
}

fn set(session: &mut Session, screen: ScreenId, args: &str) -> Result<()> {
    let options = &mut session.require_screen_mut(screen)?.options;
    let mut shown = Vec::new();
    let mut errors = Vec::new();

    if args.is_empty() {
        shown.extend(OptionName::iter().map(|name| options.describe(name)));
    }
    for arg in args.split_whitespace() {
        if let Some(name) = arg.strip_suffix('?') {
            match name.parse::<OptionName>() {
                Ok(name) => shown.push(options.describe(name)),
                Err(_) => errors.push(format!("set: no {name} option")),
            }
        } else if let Err(err) = options.set_assignment(arg) {
            errors.push(err.to_string());
        }
    }

    for line in shown {
        session.messages.info(line);
    }
    for err in errors {
        session.messages.error(err);
    }
    Ok(())
}

fn file_status(session: &mut Session, screen: ScreenId) -> Result<()> {
    let screen = session
        .screen(screen)
        .ok_or(ExviErr::UnknownScreen(screen))?;
    let readonly = if screen.options.readonly {
        ", readonly"
    } else {
        ""
    };
    let name = screen
        .file
        .and_then(|file| session.file(file))
        .map_or("[no file]", |file| file.display_name())
        .to_string();
    session.messages.info(format!("\"{name}\"{readonly}"));
    Ok(())
}
