use std::io;
use std::path::PathBuf;

use exvi_process_hardening::SandboxError;
use thiserror::Error;

use crate::screen::ScreenId;

pub type Result<T> = std::result::Result<T, ExviErr>;

#[derive(Debug, Error)]
pub enum ExviErr {
    /// Conflicting or malformed flags.
    #[error("{0}")]
    Usage(String),

    /// The active flag grammar does not recognize an argument.
    #[error("unrecognized command-line argument")]
    UnknownFlag,

    #[error("sandbox: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("{}: {source}", path.display())]
    TraceFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A collaborator failed after queueing a message that explains why.
    #[error("error already reported")]
    AlreadyReported,

    /// A collaborator failed without queueing anything.
    #[error("{0}")]
    Host(String),

    #[error("screen {0} is not linked into the session")]
    UnknownScreen(ScreenId),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExviErr {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Errors that are written straight to stderr instead of joining the
    /// pending message queue: they happen before there is a screen whose
    /// messages could carry them.
    pub(crate) fn is_reported_immediately(&self) -> bool {
        matches!(
            self,
            Self::Usage(_) | Self::UnknownFlag | Self::Sandbox(_) | Self::TraceFile { .. }
        )
    }
}
