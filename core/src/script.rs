//! Loads command scripts (rc files, `:source` targets) into the command
//! queue as single batches.

use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use tracing::debug;
use tracing::warn;

use crate::command_queue::QueuedCommand;
use crate::error::ExviErr;
use crate::error::Result;
use crate::session::Session;

/// Largest script accepted, in bytes.
pub const MAX_SCRIPT_BYTES: u64 = 1_048_576;

/// Opens `path` and queues its contents. Failures are queued as a message
/// naming the file and returned as [`ExviErr::AlreadyReported`].
pub fn source_file(session: &mut Session, path: &Path) -> Result<()> {
    let name = path.display().to_string();
    match File::open(path) {
        Ok(file) => source_descriptor(session, &name, file),
        Err(err) => {
            warn!("cannot open script {name}: {err}");
            session.messages.sys_err(&name, &err);
            Err(ExviErr::AlreadyReported)
        }
    }
}

/// Queues the contents of an already open script. Nothing is queued unless
/// the whole file was read.
pub fn source_descriptor(session: &mut Session, name: &str, file: File) -> Result<()> {
    let text = file
        .metadata()
        .and_then(|metadata| read_script(&file, metadata.len()));
    match text {
        Ok(text) => {
            debug!("queued script {name} ({} bytes)", text.len());
            queue_string(session, name, text);
            Ok(())
        }
        Err(err) => {
            warn!("cannot load script {name}: {err}");
            session.messages.sys_err(name, &err);
            Err(ExviErr::AlreadyReported)
        }
    }
}

/// Queues `text` to run before anything already pending.
pub fn queue_string(session: &mut Session, name: &str, text: impl Into<Vec<u8>>) {
    session.commands.push_front(QueuedCommand {
        name: Some(name.to_string()),
        text: text.into(),
        immediate: true,
    });
}

/// Reads exactly `size` bytes. Oversized scripts are refused before any
/// read; fewer bytes than `size` is an I/O error.
pub(crate) fn read_script<R: Read>(reader: R, size: u64) -> io::Result<Vec<u8>> {
    if size > MAX_SCRIPT_BYTES {
        return Err(io::Error::from(io::ErrorKind::OutOfMemory));
    }
    let len = usize::try_from(size).map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;

    let mut text = Vec::new();
    text.try_reserve_exact(len)
        .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
    reader.take(size).read_to_end(&mut text)?;
    if text.len() != len {
        return Err(io::Error::from_raw_os_error(libc::EIO));
    }
    Ok(text)
}
