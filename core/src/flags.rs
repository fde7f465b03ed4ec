//! The three command-line grammars, keyed by [`EditorMode`].
//!
//! | flag | ex | vi | view |
//! |------|----|----|------|
//! | `-c cmd` `-F` `-r` `-S` `-t tag` `-w size` | yes | yes | yes |
//! | `-e` | | yes | yes |
//! | `-v` `-s` | yes | | |
//! | `-R` | yes | yes | |
//!
//! Debug builds add `-D s|w` and `-T file` to every grammar.

#[cfg(debug_assertions)]
use std::path::PathBuf;

use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use tracing::debug;

use crate::error::ExviErr;
use crate::error::Result;
use crate::mode::EditorMode;

const COMMAND: &str = "command";
const FORCE_EX: &str = "ex";
const FORCE_VI: &str = "vi";
const NO_SNAPSHOT: &str = "no-snapshot";
const READONLY: &str = "readonly";
const RECOVER: &str = "recover";
const SECURE: &str = "secure";
const SILENT: &str = "silent";
const TAG: &str = "tag";
const WINDOW: &str = "window";
const FILES: &str = "files";
#[cfg(debug_assertions)]
const DEBUG: &str = "debug";
#[cfg(debug_assertions)]
const TRACE: &str = "trace";

/// Interpreter requested by `-e` (vi and view) or `-v` (ex).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedMode {
    Ex,
    Vi,
}

/// Flags recognized by a single pass over the normalized arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub command: Option<String>,
    pub forced_mode: Option<ForcedMode>,
    pub no_snapshot: bool,
    pub readonly: bool,
    pub recover: bool,
    pub secure: bool,
    pub silent: bool,
    pub tag: Option<String>,
    pub window: Option<String>,
    /// Remaining non-flag arguments: file names, or recovery names under `-r`.
    pub files: Vec<String>,
    /// `-D s`: do not read startup files.
    #[cfg(debug_assertions)]
    pub skip_startup: bool,
    /// `-D w`: wait on the terminal so a debugger can attach.
    #[cfg(debug_assertions)]
    pub attach: bool,
    #[cfg(debug_assertions)]
    pub trace_file: Option<PathBuf>,
}

/// Usage line printed when the grammar rejects an argument.
pub fn usage(mode: EditorMode) -> &'static str {
    match mode {
        EditorMode::Ex => "usage: ex [-FRrSsv] [-c command] [-t tag] [-w size] [file ...]",
        EditorMode::Vi => "usage: vi [-eFRrS] [-c command] [-t tag] [-w size] [file ...]",
        EditorMode::View => "usage: view [-eFrS] [-c command] [-t tag] [-w size] [file ...]",
    }
}

pub fn parse_command_line(mode: EditorMode, program: &str, args: &[String]) -> Result<CommandLine> {
    let argv = std::iter::once(program.to_string()).chain(args.iter().cloned());
    let matches = grammar(mode)
        .try_get_matches_from(argv)
        .map_err(|err| {
            debug!("rejected command line: {err}");
            ExviErr::UnknownFlag
        })?;

    let mut commands = values(&matches, COMMAND);
    if commands.len() > 1 {
        return Err(ExviErr::usage("only one -c command may be specified."));
    }

    let recover = flag(&matches, RECOVER);
    let mut tags = values(&matches, TAG);
    if recover && !tags.is_empty() {
        return Err(ExviErr::usage("only one of -r and -t may be specified."));
    }
    if tags.len() > 1 {
        return Err(ExviErr::usage("only one tag file may be specified."));
    }

    let forced_mode = if flag(&matches, FORCE_EX) {
        Some(ForcedMode::Ex)
    } else if flag(&matches, FORCE_VI) {
        Some(ForcedMode::Vi)
    } else {
        None
    };

    #[cfg_attr(not(debug_assertions), allow(unused_mut))]
    let mut command_line = CommandLine {
        command: commands.pop(),
        forced_mode,
        no_snapshot: flag(&matches, NO_SNAPSHOT),
        readonly: flag(&matches, READONLY),
        recover,
        secure: flag(&matches, SECURE),
        silent: flag(&matches, SILENT),
        tag: tags.pop(),
        window: values(&matches, WINDOW).pop(),
        files: values(&matches, FILES),
        ..Default::default()
    };

    #[cfg(debug_assertions)]
    {
        for value in values(&matches, DEBUG) {
            match value.chars().next() {
                Some('s') => command_line.skip_startup = true,
                Some('w') => command_line.attach = true,
                _ => return Err(ExviErr::usage("-D requires s or w argument.")),
            }
        }
        command_line.trace_file = values(&matches, TRACE).pop().map(PathBuf::from);
    }

    Ok(command_line)
}

fn grammar(mode: EditorMode) -> Command {
    let (name, force_ex, force_vi, readonly, silent) = match mode {
        EditorMode::Ex => ("ex", false, true, true, true),
        EditorMode::Vi => ("vi", true, false, true, false),
        EditorMode::View => ("view", true, false, false, false),
    };

    let mut command = Command::new(name)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(value_arg(COMMAND, 'c'))
        .arg(flag_arg(NO_SNAPSHOT, 'F'))
        .arg(flag_arg(RECOVER, 'r'))
        .arg(flag_arg(SECURE, 'S'))
        .arg(value_arg(TAG, 't'))
        .arg(value_arg(WINDOW, 'w'))
        // Flag parsing stops at the first file name.
        .arg(
            Arg::new(FILES)
                .action(ArgAction::Append)
                .num_args(1..)
                .trailing_var_arg(true),
        );

    if force_ex {
        command = command.arg(flag_arg(FORCE_EX, 'e'));
    }
    if force_vi {
        command = command.arg(flag_arg(FORCE_VI, 'v'));
    }
    if readonly {
        command = command.arg(flag_arg(READONLY, 'R'));
    }
    if silent {
        command = command.arg(flag_arg(SILENT, 's'));
    }

    #[cfg(debug_assertions)]
    {
        command = command
            .arg(value_arg(DEBUG, 'D'))
            .arg(value_arg(TRACE, 'T'));
    }

    command
}

fn flag_arg(id: &'static str, short: char) -> Arg {
    Arg::new(id).short(short).action(ArgAction::SetTrue)
}

fn value_arg(id: &'static str, short: char) -> Arg {
    Arg::new(id)
        .short(short)
        .action(ArgAction::Append)
        .num_args(1)
        .allow_hyphen_values(true)
}

/// Flags absent from the active grammar read as unset.
fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches
        .try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

fn values(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .try_get_many::<String>(id)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
