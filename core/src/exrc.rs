//! Startup files.
//!
//! `NEXINIT` or `EXINIT` wins over the home rc file. The local rc file is read
//! only when the `exrc` option is on and it is not the file already read from
//! the home directory.

use std::fs::File;
use std::fs::Metadata;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::error::Result;
use crate::host::EditorHost;
use crate::screen::Screen;
use crate::screen::ScreenId;
use crate::script;
use crate::session::Session;

const NEXRC: &str = ".nexrc";
const EXRC: &str = ".exrc";

/// Where startup commands come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupSources {
    pub nexinit: Option<String>,
    pub exinit: Option<String>,
    pub home: Option<PathBuf>,
    /// Directory searched for the local rc file.
    pub local_dir: PathBuf,
}

impl StartupSources {
    pub fn from_env() -> Self {
        Self {
            nexinit: std::env::var("NEXINIT").ok(),
            exinit: std::env::var("EXINIT").ok(),
            home: std::env::var_os("HOME")
                .filter(|home| !home.is_empty())
                .map(PathBuf::from),
            local_dir: PathBuf::from("."),
        }
    }
}

pub fn read_startup_files<H>(host: &mut H, session: &mut Session, screen: ScreenId) -> Result<()>
where
    H: EditorHost + ?Sized,
{
    run_startup(host, session, screen, &StartupSources::from_env())
}

/// Runs each startup batch as soon as it is queued and stops early once the
/// screen asks to exit.
pub fn run_startup<H>(
    host: &mut H,
    session: &mut Session,
    screen: ScreenId,
    sources: &StartupSources,
) -> Result<()>
where
    H: EditorHost + ?Sized,
{
    let mut home_rc = None;
    if let Some(text) = &sources.nexinit {
        script::queue_string(session, "NEXINIT", text.as_str());
    } else if let Some(text) = &sources.exinit {
        script::queue_string(session, "EXINIT", text.as_str());
    } else if let Some(home) = &sources.home {
        home_rc = source_rc(session, &[home.join(NEXRC), home.join(EXRC)], None)?;
    }
    if run_batch(host, session, screen)? {
        return Ok(());
    }

    let exrc = session
        .screen(screen)
        .is_some_and(|screen| screen.options.exrc);
    if exrc {
        let local = [sources.local_dir.join(NEXRC), sources.local_dir.join(EXRC)];
        source_rc(session, &local, home_rc)?;
        run_batch(host, session, screen)?;
    }
    Ok(())
}

/// Returns true when startup should stop.
fn run_batch<H>(host: &mut H, session: &mut Session, screen: ScreenId) -> Result<bool>
where
    H: EditorHost + ?Sized,
{
    if session.commands.is_running() {
        host.run_commands(session, screen)?;
    }
    Ok(session.screen(screen).is_none_or(Screen::exit_requested))
}

/// Identity of a file on disk, to recognize the same rc file reached by two
/// paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

/// Sources the first candidate that exists. A candidate that exists but
/// fails the safety checks stops the search.
fn source_rc(
    session: &mut Session,
    candidates: &[PathBuf],
    skip: Option<FileIdentity>,
) -> Result<Option<FileIdentity>> {
    for path in candidates {
        let name = path.display().to_string();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                session.messages.sys_err(&name, &err);
                return Ok(None);
            }
        };
        let metadata = match file.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                session.messages.sys_err(&name, &err);
                return Ok(None);
            }
        };
        if let Some(reason) = rejection(&metadata) {
            session
                .messages
                .error(format!("{name}: not sourced: {reason}"));
            return Ok(None);
        }

        let identity = identity(&metadata);
        if identity.is_some() && identity == skip {
            debug!("{name} already read from the home directory");
            return Ok(identity);
        }
        debug!("sourcing {name}");
        script::source_descriptor(session, &name, file)?;
        return Ok(identity);
    }
    Ok(None)
}

#[cfg(unix)]
fn rejection(metadata: &Metadata) -> Option<&'static str> {
    use std::os::unix::fs::MetadataExt;

    // SAFETY: geteuid has no preconditions and cannot fail.
    let euid = unsafe { libc::geteuid() };
    if metadata.uid() != euid && metadata.uid() != 0 {
        return Some("not owned by you or root");
    }
    if metadata.mode() & 0o022 != 0 {
        return Some("writable by a user other than the owner");
    }
    None
}

#[cfg(not(unix))]
fn rejection(_metadata: &Metadata) -> Option<&'static str> {
    None
}

#[cfg(unix)]
fn identity(metadata: &Metadata) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;

    Some(FileIdentity {
        dev: metadata.dev(),
        ino: metadata.ino(),
    })
}

#[cfg(not(unix))]
fn identity(_metadata: &Metadata) -> Option<FileIdentity> {
    None
}
