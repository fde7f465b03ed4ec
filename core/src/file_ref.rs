use std::path::PathBuf;

/// Index of a [`FileRef`] in the session's file queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileRefId(pub(crate) usize);

/// A file known to the session. Screens editing the same name share one
/// reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRef {
    /// `None` for an anonymous scratch file.
    pub name: Option<String>,
    /// Working copy backing the edit, once the host has created one.
    pub temp_name: Option<PathBuf>,
    /// Open the file from its recovery snapshot.
    pub recover: bool,
}

impl FileRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn scratch() -> Self {
        Self::default()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("[scratch]")
    }
}
