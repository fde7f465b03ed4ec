use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use strum::IntoEnumIterator;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::IntoStaticStr;

use crate::SandboxError;

/// Resource category a process promises to keep using.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Promise {
    /// Standard I/O on already-open descriptors.
    Stdio,
    /// Read-only path operations.
    Rpath,
    /// Write path operations.
    Wpath,
    /// File creation and removal.
    Cpath,
    /// File attribute changes.
    Fattr,
    /// Advisory file locking.
    Flock,
    /// Password database lookups.
    Getpw,
    /// Terminal control.
    Tty,
    /// Creating and signalling processes.
    Proc,
    /// Executing programs.
    Exec,
}

/// An ordered set of [`Promise`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Promises {
    set: BTreeSet<Promise>,
}

impl Promises {
    pub fn new<I>(promises: I) -> Self
    where
        I: IntoIterator<Item = Promise>,
    {
        Self {
            set: promises.into_iter().collect(),
        }
    }

    /// Every category; the implicit declaration of an unrestricted process.
    pub fn all() -> Self {
        Self::new(Promise::iter())
    }

    pub fn contains(&self, promise: Promise) -> bool {
        self.set.contains(&promise)
    }

    pub fn is_subset(&self, other: &Promises) -> bool {
        self.set.is_subset(&other.set)
    }

    /// Categories present in `self` but missing from `other`.
    pub fn difference(&self, other: &Promises) -> Promises {
        Self::new(self.set.difference(&other.set).copied())
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Promise> + '_ {
        self.set.iter().copied()
    }
}

impl FromStr for Promises {
    type Err = SandboxError;

    /// Parses a whitespace-separated list such as `"stdio rpath tty"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(|word| {
                word.parse::<Promise>()
                    .map_err(|_| SandboxError::UnknownPromise(word.to_string()))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(|set| Self { set })
    }
}

impl fmt::Display for Promises {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for promise in &self.set {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            let name: &'static str = (*promise).into();
            f.write_str(name)?;
        }
        Ok(())
    }
}
