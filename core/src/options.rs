//! The handful of editor options the session core reads or forces.
//!
//! Assignments use the historic forms: `name` turns a boolean on, `noname`
//! turns it off, `name=value` sets a number.

use std::str::FromStr;

use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use thiserror::Error;

use crate::config::Config;
use crate::config::Geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum OptionName {
    #[strum(to_string = "autoprint", serialize = "ap")]
    Autoprint,
    #[strum(to_string = "columns", serialize = "co")]
    Columns,
    #[strum(to_string = "exrc", serialize = "ex")]
    Exrc,
    #[strum(to_string = "lines")]
    Lines,
    #[strum(to_string = "prompt")]
    Prompt,
    #[strum(to_string = "readonly", serialize = "ro")]
    Readonly,
    #[strum(to_string = "secure")]
    Secure,
    #[strum(to_string = "verbose")]
    Verbose,
    #[strum(to_string = "warn")]
    Warn,
    #[strum(to_string = "window", serialize = "w", serialize = "wi")]
    Window,
}

impl OptionName {
    pub fn is_boolean(self) -> bool {
        !matches!(
            self,
            OptionName::Columns | OptionName::Lines | OptionName::Window
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("set: no {0} option")]
    Unknown(String),

    #[error("set: the {0} option is not a boolean")]
    NotBoolean(OptionName),

    #[error("set: the {0} option requires a value")]
    MissingValue(OptionName),

    #[error("set: the {0} option is a boolean and takes no value")]
    UnexpectedValue(OptionName),

    #[error("set: illegal number {value} for {name}")]
    IllegalNumber { name: OptionName, value: String },
}

/// Option values for one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub autoprint: bool,
    pub prompt: bool,
    pub verbose: bool,
    pub warn: bool,
    pub readonly: bool,
    pub secure: bool,
    pub exrc: bool,
    pub lines: usize,
    pub columns: usize,
    pub window: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self::with_geometry(Geometry::default())
    }
}

impl Options {
    pub fn with_geometry(geometry: Geometry) -> Self {
        Self {
            autoprint: true,
            prompt: true,
            verbose: false,
            warn: true,
            readonly: false,
            secure: false,
            exrc: false,
            lines: geometry.lines,
            columns: geometry.columns,
            window: geometry.lines.saturating_sub(1).max(1),
        }
    }

    /// Defaults for the configured terminal, then every assignment from the
    /// configuration file. Bad assignments are returned, not fatal.
    pub fn from_config(config: &Config) -> (Self, Vec<OptionError>) {
        let mut options = Self::with_geometry(config.geometry);
        let errors = config
            .option_assignments
            .iter()
            .filter_map(|assignment| options.set_assignment(assignment).err())
            .collect();
        (options, errors)
    }

    /// Applies one `name`, `noname` or `name=value` assignment.
    pub fn set_assignment(&mut self, assignment: &str) -> Result<(), OptionError> {
        let assignment = assignment.trim();
        if let Some((name, value)) = assignment.split_once('=') {
            let name = parse_name(name)?;
            if name.is_boolean() {
                return Err(OptionError::UnexpectedValue(name));
            }
            let number = value
                .parse::<usize>()
                .ok()
                .filter(|number| *number > 0)
                .ok_or_else(|| OptionError::IllegalNumber {
                    name,
                    value: value.to_string(),
                })?;
            self.set_number(name, number);
            return Ok(());
        }

        let (name, value) = match OptionName::from_str(assignment) {
            Ok(name) => (name, true),
            Err(_) => match assignment.strip_prefix("no") {
                Some(rest) => (parse_name(rest)?, false),
                None => return Err(OptionError::Unknown(assignment.to_string())),
            },
        };
        if !name.is_boolean() {
            return Err(if value {
                OptionError::MissingValue(name)
            } else {
                OptionError::NotBoolean(name)
            });
        }
        self.set_bool(name, value)
    }

    pub fn set_bool(&mut self, name: OptionName, value: bool) -> Result<(), OptionError> {
        let slot = match name {
            OptionName::Autoprint => &mut self.autoprint,
            OptionName::Exrc => &mut self.exrc,
            OptionName::Prompt => &mut self.prompt,
            OptionName::Readonly => &mut self.readonly,
            OptionName::Secure => &mut self.secure,
            OptionName::Verbose => &mut self.verbose,
            OptionName::Warn => &mut self.warn,
            OptionName::Columns | OptionName::Lines | OptionName::Window => {
                return Err(OptionError::NotBoolean(name));
            }
        };
        *slot = value;
        Ok(())
    }

    fn set_number(&mut self, name: OptionName, value: usize) {
        match name {
            OptionName::Columns => self.columns = value,
            OptionName::Lines => {
                self.lines = value;
                self.window = self.window.min(value.saturating_sub(1).max(1));
            }
            // A window larger than the screen is clamped.
            OptionName::Window => self.window = value.min(self.lines.saturating_sub(1).max(1)),
            _ => {}
        }
    }

    /// The option as it would be written back: `window=23`, `noprompt`.
    pub fn describe(&self, name: OptionName) -> String {
        let flag = |on: bool| {
            if on {
                name.to_string()
            } else {
                format!("no{name}")
            }
        };
        match name {
            OptionName::Autoprint => flag(self.autoprint),
            OptionName::Exrc => flag(self.exrc),
            OptionName::Prompt => flag(self.prompt),
            OptionName::Readonly => flag(self.readonly),
            OptionName::Secure => flag(self.secure),
            OptionName::Verbose => flag(self.verbose),
            OptionName::Warn => flag(self.warn),
            OptionName::Columns => format!("{name}={}", self.columns),
            OptionName::Lines => format!("{name}={}", self.lines),
            OptionName::Window => format!("{name}={}", self.window),
        }
    }
}

fn parse_name(name: &str) -> Result<OptionName, OptionError> {
    OptionName::from_str(name).map_err(|_| OptionError::Unknown(name.to_string()))
}
