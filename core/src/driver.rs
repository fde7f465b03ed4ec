//! Session driver: boots the editor, runs the interpreters until no screen
//! is left, and always finishes through [`teardown`].
//!
//! The driver is a state machine. Each state runs one step and names the
//! next state; any step failing stops the machine, and every stop, success
//! or not, goes through the same teardown.

use std::fmt;
use std::io::Write;

use exvi_process_hardening::Promises;
use exvi_process_hardening::Sandbox;
use strum_macros::Display;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::ExviErr;
use crate::error::Result;
use crate::flags::CommandLine;
use crate::flags::ForcedMode;
use crate::flags::parse_command_line;
use crate::flags::usage;
use crate::host::EditorHost;
use crate::mode::EditorMode;
use crate::normalize::normalize_legacy_args;
use crate::options::Options;
use crate::screen::ScreenFlags;
use crate::screen::ScreenId;
use crate::script;
use crate::session::Session;
use crate::session::SessionFlags;
use crate::teardown::end_screen;
use crate::teardown::teardown;

/// Categories the editor needs for its whole life.
const BASE_PROMISES: &str = "stdio rpath wpath cpath fattr flock getpw tty proc exec";

/// `-S`: no subprocesses and no exec.
const SECURE_PROMISES: &str = "stdio rpath wpath cpath fattr flock getpw tty";

/// Shown when setup messages were printed in ex context.
const CONTINUE_PROMPT: &str = "Press Enter to continue: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

/// Process output streams.
pub struct Console<'a> {
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
enum Declaration {
    #[strum(to_string = "base")]
    Base,
    #[strum(to_string = "secure")]
    Secure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Sandboxing(Declaration),
    DetectingMode,
    ParsingFlags,
    ConstructingScreen,
    ApplyingOptions,
    RunningStartup,
    OpeningFiles,
    MainLoop,
    Done,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Sandboxing(declaration) => write!(f, "sandboxing ({declaration})"),
            State::DetectingMode => f.write_str("detecting mode"),
            State::ParsingFlags => f.write_str("parsing flags"),
            State::ConstructingScreen => f.write_str("constructing screen"),
            State::ApplyingOptions => f.write_str("applying options"),
            State::RunningStartup => f.write_str("running startup"),
            State::OpeningFiles => f.write_str("opening files"),
            State::MainLoop => f.write_str("main loop"),
            State::Done => f.write_str("done"),
        }
    }
}

/// Runs the editor over `args` (the arguments after the program name) and
/// returns the process exit status.
pub fn run_editor<H>(
    session: &mut Session,
    host: &mut H,
    sandbox: &mut dyn Sandbox,
    args: Vec<String>,
    console: Console<'_>,
) -> ExitStatus
where
    H: EditorHost + ?Sized,
{
    let Console { stdout, stderr } = console;
    let mut driver = Driver {
        session,
        host,
        sandbox,
        stdout,
        stderr,
        args,
        mode: EditorMode::Vi,
        grammar: EditorMode::Ex,
        launch_mode: ScreenFlags::VI,
        command_line: CommandLine::default(),
        screen: None,
    };

    let status = match driver.drive() {
        Ok(()) => ExitStatus::Success,
        Err(err) => {
            driver.report(err);
            ExitStatus::Failure
        }
    };

    let Driver {
        session,
        host,
        stderr,
        ..
    } = driver;
    teardown(session, host, stderr);
    info!("editor exiting with status {}", status.code());
    status
}

struct Driver<'a, H: ?Sized> {
    session: &'a mut Session,
    host: &'a mut H,
    sandbox: &'a mut dyn Sandbox,
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
    args: Vec<String>,
    mode: EditorMode,
    /// Grammar the flags are parsed with; differs from `mode` for names
    /// outside every family.
    grammar: EditorMode,
    /// Interpreter the main loop starts in: the detected mode adjusted by
    /// `-e`/`-v`.
    launch_mode: ScreenFlags,
    command_line: CommandLine,
    screen: Option<ScreenId>,
}

impl<H> Driver<'_, H>
where
    H: EditorHost + ?Sized,
{
    fn drive(&mut self) -> Result<()> {
        let mut state = State::Sandboxing(Declaration::Base);
        loop {
            debug!("driver state: {state}");
            self.session.trace(format_args!("state: {state}"));
            state = match state {
                State::Sandboxing(declaration) => self.declare(declaration)?,
                State::DetectingMode => self.detect_mode(),
                State::ParsingFlags => self.parse_flags()?,
                State::ConstructingScreen => self.construct_screen()?,
                State::ApplyingOptions => self.apply_options()?,
                State::RunningStartup => self.run_startup()?,
                State::OpeningFiles => self.open_files()?,
                State::MainLoop => self.main_loop()?,
                State::Done => return Ok(()),
            };
        }
    }

    fn declare(&mut self, declaration: Declaration) -> Result<State> {
        let (promises, next) = match declaration {
            Declaration::Base => (BASE_PROMISES, State::DetectingMode),
            Declaration::Secure => (SECURE_PROMISES, State::ConstructingScreen),
        };
        let promises: Promises = promises.parse()?;
        self.sandbox.declare(&promises)?;
        Ok(next)
    }

    fn detect_mode(&mut self) -> State {
        self.mode = self
            .session
            .fix_mode(EditorMode::from_program_name(self.session.program()));
        self.grammar = EditorMode::grammar_for(self.session.program());
        self.launch_mode = self.mode.screen_mode();
        self.args = normalize_legacy_args(std::mem::take(&mut self.args));
        self.session.flags.insert(SessionFlags::SNAPSHOT);
        debug!(
            "mode {:?}, grammar {:?}, arguments {:?}",
            self.mode, self.grammar, self.args
        );
        State::ParsingFlags
    }

    fn parse_flags(&mut self) -> Result<State> {
        let mut command_line = parse_command_line(self.grammar, self.session.program(), &self.args)?;

        #[cfg(debug_assertions)]
        {
            if let Some(path) = &command_line.trace_file {
                self.session.open_trace(path)?;
            }
            if command_line.attach {
                self.wait_for_debugger();
            }
        }

        match command_line.forced_mode {
            Some(ForcedMode::Ex) => self.launch_mode = ScreenFlags::EX,
            Some(ForcedMode::Vi) => self.launch_mode = ScreenFlags::VI,
            None => {}
        }
        if command_line.no_snapshot {
            self.session.flags.remove(SessionFlags::SNAPSHOT);
        }
        self.session.command_option = command_line.command.take();

        let secure = command_line.secure;
        let ex = self.launch_mode.contains(ScreenFlags::EX);
        if command_line.silent && !ex {
            return Err(ExviErr::usage("-s option is only applicable to ex."));
        }
        if ex && self.session.flags.contains(SessionFlags::SCRIPTED) {
            command_line.silent = true;
        }
        self.command_line = command_line;

        Ok(if secure {
            State::Sandboxing(Declaration::Secure)
        } else {
            State::ConstructingScreen
        })
    }

    fn construct_screen(&mut self) -> Result<State> {
        // Linked before anything can fail so teardown finds it.
        let id = self.session.link_screen();
        self.screen = Some(id);
        self.host.init_screen(self.session, id)?;
        // Everything up to the main loop runs as ex.
        self.session
            .require_screen_mut(id)?
            .flags
            .insert(ScreenFlags::EX);
        self.host.init_keys(self.session, id)?;
        Ok(State::ApplyingOptions)
    }

    fn apply_options(&mut self) -> Result<State> {
        let id = self.current()?;
        let (mut options, errors) = Options::from_config(&self.session.config);
        for err in errors {
            self.session.messages.error(err.to_string());
        }

        if self.command_line.readonly || self.mode.is_readonly() {
            options.readonly = true;
        }
        if self.command_line.secure {
            options.secure = true;
        }
        if let Some(window) = &self.command_line.window {
            if let Err(err) = options.set_assignment(&format!("window={window}")) {
                self.session.messages.error(err.to_string());
            }
        }

        // Batch mode: nothing printed unless asked for.
        let silent = self.command_line.silent;
        if silent {
            options.autoprint = false;
            options.prompt = false;
            options.verbose = false;
            options.warn = false;
        }

        let screen = self.session.require_screen_mut(id)?;
        if silent {
            screen.flags.insert(ScreenFlags::EX_SILENT);
        }
        screen.rows = options.lines;
        screen.cols = options.columns;
        screen.options = options;
        Ok(State::RunningStartup)
    }

    fn run_startup(&mut self) -> Result<State> {
        let id = self.current()?;
        if !self.command_line.silent && self.startup_enabled() {
            self.host.read_startup_files(self.session, id)?;
            if self.exit_requested(id) {
                end_screen(self.host, self.session, id)?;
                return Ok(State::Done);
            }
        }

        if self.command_line.recover && self.command_line.files.is_empty() {
            self.host.list_recovery(self.session, id)?;
            end_screen(self.host, self.session, id)?;
            return Ok(State::Done);
        }

        // After every chance to set the window option; later changes to
        // `window` leave the scroll default alone.
        let no_command = self.session.command_option.is_none();
        let screen = self.session.require_screen_mut(id)?;
        screen.default_scroll = (screen.options.window + 1) / 2;

        // Without -c, messages from here on belong to the final interpreter.
        if no_command {
            screen.set_mode(self.launch_mode);
        }
        Ok(State::OpeningFiles)
    }

    fn open_files(&mut self) -> Result<State> {
        let id = self.current()?;
        if let Some(tag) = self.command_line.tag.clone() {
            self.host.open_tag(self.session, id, &tag)?;
        }

        let files = std::mem::take(&mut self.command_line.files);
        let recover = self.command_line.recover;
        let attached = self.session.require_screen_mut(id)?.file;
        if !files.is_empty() {
            let mut args = Vec::with_capacity(files.len() + 1);
            if let Some(name) = attached
                .and_then(|file| self.session.file(file))
                .and_then(|file| file.name.clone())
            {
                args.push(name);
            }
            args.extend(files);
            let screen = self.session.require_screen_mut(id)?;
            screen.args = args;
            if recover {
                screen.flags.insert(ScreenFlags::ARG_RECOVER);
            }
        }

        if attached.is_none() {
            let first = self
                .session
                .screen(id)
                .and_then(|screen| screen.args.first().cloned());
            let file = self.session.add_file(first.as_deref());
            if first.is_some() && recover {
                if let Some(file) = self.session.file_mut(file) {
                    file.recover = true;
                }
            }
            self.session.require_screen_mut(id)?.file = Some(file);
            self.host.init_file(self.session, id)?;
        }

        // Runs against whichever file is attached, including one opened by
        // the tag or by a startup script.
        if let Some(command) = self.session.command_option.take() {
            script::queue_string(self.session, "-c option", command);
        }
        if self.session.commands.is_running() {
            self.host.run_commands(self.session, id)?;
            if self.exit_requested(id) {
                end_screen(self.host, self.session, id)?;
                return Ok(State::Done);
            }
        }

        let shown_in_ex = self
            .session
            .screen(id)
            .is_some_and(|screen| screen.flags.contains(ScreenFlags::SCR_EX));
        if shown_in_ex {
            self.wait_for_confirmation(id)?;
        }
        Ok(State::MainLoop)
    }

    /// Holds setup messages on screen until the user presses Enter.
    fn wait_for_confirmation(&mut self, id: ScreenId) -> Result<()> {
        self.stdout.write_all(CONTINUE_PROMPT.as_bytes())?;
        self.stdout.flush()?;
        loop {
            let event = self.host.next_event(self.session, id)?;
            if event.confirms() {
                return Ok(());
            }
            self.host.bell(self.session);
        }
    }

    fn main_loop(&mut self) -> Result<State> {
        let id = self.current()?;
        let screen = self.session.require_screen_mut(id)?;
        screen.set_mode(self.launch_mode);
        screen.flags.insert(ScreenFlags::STATUS_CNT);

        let mut current = Some(id);
        while let Some(id) = current {
            self.screen = Some(id);
            let is_ex = self
                .session
                .screen(id)
                .ok_or(ExviErr::UnknownScreen(id))?
                .is_ex();
            current = if is_ex {
                self.host.ex(self.session, id)?
            } else {
                self.host.vi(self.session, id)?
            };
        }
        self.screen = None;
        Ok(State::Done)
    }

    fn current(&self) -> Result<ScreenId> {
        self.screen
            .ok_or_else(|| ExviErr::Host("no current screen".to_string()))
    }

    fn exit_requested(&self, id: ScreenId) -> bool {
        self.session
            .screen(id)
            .is_none_or(|screen| screen.exit_requested())
    }

    #[cfg(debug_assertions)]
    fn startup_enabled(&self) -> bool {
        self.session.config.read_startup_files && !self.command_line.skip_startup
    }

    #[cfg(not(debug_assertions))]
    fn startup_enabled(&self) -> bool {
        self.session.config.read_startup_files
    }

    /// `-D w`: lets a debugger attach before anything else happens.
    #[cfg(debug_assertions)]
    fn wait_for_debugger(&mut self) {
        use std::io::Read;

        const TTY: &str = "/dev/tty";
        let tty = match std::fs::File::open(TTY) {
            Ok(tty) => tty,
            Err(err) => {
                let _ = writeln!(self.stderr, "{}: {TTY}: {err}", self.session.program());
                return;
            }
        };
        let _ = write!(
            self.stdout,
            "process {} waiting, enter <CR> to continue: ",
            std::process::id()
        );
        let _ = self.stdout.flush();
        for byte in tty.bytes() {
            match byte {
                Ok(b'\n' | b'\r') | Err(_) => break,
                Ok(_) => {}
            }
        }
    }

    /// Routes a failure to where the user will see it: straight to stderr
    /// when no screen could carry it, otherwise into the message queue.
    fn report(&mut self, err: ExviErr) {
        warn!("editor failed: {err}");
        self.session.trace(format_args!("failed: {err}"));
        let program = self.session.program().to_string();
        let written = match &err {
            ExviErr::UnknownFlag => writeln!(self.stderr, "{}", usage(self.grammar)),
            ExviErr::AlreadyReported => Ok(()),
            err if err.is_reported_immediately() => writeln!(self.stderr, "{program}: {err}"),
            err => {
                self.session.messages.error(err.to_string());
                Ok(())
            }
        };
        if let Err(write_err) = written {
            warn!("cannot report failure: {write_err}");
        }
    }
}
