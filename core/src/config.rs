use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

const CONFIG_TOML_FILE: &str = "config.toml";

const DEFAULT_LINES: usize = 24;
const DEFAULT_COLUMNS: usize = 80;

/// Terminal size used before the terminal driver reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub lines: usize,
    pub columns: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            lines: DEFAULT_LINES,
            columns: DEFAULT_COLUMNS,
        }
    }
}

impl Geometry {
    /// `LINES` and `COLUMNS` from the environment, when they hold positive
    /// numbers.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("LINES").ok().as_deref(),
            std::env::var("COLUMNS").ok().as_deref(),
        )
    }

    fn from_values(lines: Option<&str>, columns: Option<&str>) -> Self {
        let parse = |value: Option<&str>, default: usize| {
            value
                .and_then(|value| value.trim().parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(default)
        };
        Self {
            lines: parse(lines, DEFAULT_LINES),
            columns: parse(columns, DEFAULT_COLUMNS),
        }
    }
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigToml {
    #[serde(default)]
    pub options: BTreeMap<String, OptionValueToml>,

    /// Set to `false` to skip `EXINIT` and the rc files.
    pub startup: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OptionValueToml {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl OptionValueToml {
    fn assignment(&self, name: &str) -> String {
        match self {
            OptionValueToml::Bool(true) => name.to_string(),
            OptionValueToml::Bool(false) => format!("no{name}"),
            OptionValueToml::Integer(value) => format!("{name}={value}"),
            OptionValueToml::String(value) => format!("{name}={value}"),
        }
    }
}

/// Settings resolved before the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `config.toml`.
    pub exvi_home: Option<PathBuf>,
    /// `set` assignments applied to every new screen, in file order.
    pub option_assignments: Vec<String>,
    pub read_startup_files: bool,
    pub geometry: Geometry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exvi_home: None,
            option_assignments: Vec::new(),
            read_startup_files: true,
            geometry: Geometry::default(),
        }
    }
}

impl Config {
    /// Reads `config.toml` from [`find_exvi_home`]. A missing file yields the
    /// defaults.
    pub fn load() -> io::Result<Self> {
        let exvi_home = find_exvi_home();
        let mut config = match &exvi_home {
            Some(home) => Self::load_from_dir(home)?,
            None => Self::default(),
        };
        config.exvi_home = exvi_home;
        config.geometry = Geometry::from_env();
        Ok(config)
    }

    pub fn load_from_dir(exvi_home: &Path) -> io::Result<Self> {
        let path = exvi_home.join(CONFIG_TOML_FILE);
        let toml = read_config_from_path(&path)?.unwrap_or_default();
        Ok(Self::from_toml(toml, Some(exvi_home.to_path_buf())))
    }

    pub fn from_toml(toml: ConfigToml, exvi_home: Option<PathBuf>) -> Self {
        let option_assignments = toml
            .options
            .iter()
            .map(|(name, value)| value.assignment(name))
            .collect();
        Self {
            exvi_home,
            option_assignments,
            read_startup_files: toml.startup.unwrap_or(true),
            geometry: Geometry::default(),
        }
    }
}

/// `$EXVI_HOME` if set, otherwise `~/.exvi`.
pub fn find_exvi_home() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("EXVI_HOME").filter(|home| !home.is_empty()) {
        return Some(PathBuf::from(home));
    }
    dirs::home_dir().map(|mut path| {
        path.push(".exvi");
        path
    })
}

fn read_config_from_path(path: &Path) -> io::Result<Option<ConfigToml>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<ConfigToml>(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::error!("Failed to parse {}: {err}", path.display());
                Err(io::Error::new(io::ErrorKind::InvalidData, err))
            }
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!("{} not found, using defaults", path.display());
            Ok(None)
        }
        Err(err) => {
            tracing::error!("Failed to read {}: {err}", path.display());
            Err(err)
        }
    }
}
