//! Privilege-restriction declarations for the editor process.
//!
//! A declaration names the resource categories ([`Promise`]s) the process
//! will keep using. Declarations are one-way: a later declaration may only
//! name a subset of the one before it. On Linux, dropping `proc` or `exec`
//! installs a seccomp filter that makes the matching system calls fail with
//! `EPERM`; the other categories are recorded but not enforced by the kernel.

mod promise;
#[cfg(target_os = "linux")]
mod seccomp;

pub use promise::Promise;
pub use promise::Promises;

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("cannot widen sandbox to `{requested}`: already restricted to `{declared}`")]
    Widen {
        requested: Promises,
        declared: Promises,
    },
    #[error("unknown promise `{0}`")]
    UnknownPromise(String),
    #[error("failed to install seccomp filter: {0}")]
    Seccomp(String),
}

/// Something that can accept a sandbox declaration.
pub trait Sandbox {
    fn declare(&mut self, promises: &Promises) -> Result<(), SandboxError>;
}

/// Applies declarations to the current process.
#[derive(Debug, Default)]
pub struct ProcessSandbox {
    declared: Option<Promises>,
}

impl ProcessSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent successful declaration, if any.
    pub fn declared(&self) -> Option<&Promises> {
        self.declared.as_ref()
    }
}

impl Sandbox for ProcessSandbox {
    fn declare(&mut self, promises: &Promises) -> Result<(), SandboxError> {
        let previous = self.declared.clone().unwrap_or_else(Promises::all);
        check_narrowing(&previous, promises)?;

        let dropped = previous.difference(promises);
        debug!("sandbox declaration `{promises}` (dropping `{dropped}`)");
        enforce(&dropped)?;

        self.declared = Some(promises.clone());
        Ok(())
    }
}

/// Fails unless `requested` is a subset of `declared`.
pub fn check_narrowing(declared: &Promises, requested: &Promises) -> Result<(), SandboxError> {
    if requested.is_subset(declared) {
        Ok(())
    } else {
        Err(SandboxError::Widen {
            requested: requested.clone(),
            declared: declared.clone(),
        })
    }
}

#[cfg(target_os = "linux")]
fn enforce(dropped: &Promises) -> Result<(), SandboxError> {
    seccomp::deny_categories(dropped.contains(Promise::Proc), dropped.contains(Promise::Exec))
}

#[cfg(not(target_os = "linux"))]
fn enforce(dropped: &Promises) -> Result<(), SandboxError> {
    if !dropped.is_empty() {
        debug!("no kernel enforcement for `{dropped}` on this platform");
    }
    Ok(())
}
