use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory for convention overrides.
pub const CONFIG_FILE_NAME: &str = "modref.json";

/// Default pattern for modules that may only be imported by their own kind.
pub const DEFAULT_RESTRICTED_PATTERN: &str = r"\.server\.(j|t)s$";

/// Default suffix of modules replaced by reference stubs.
pub const DEFAULT_CLIENT_SUFFIX: &str = ".client.js";

/// Default export condition added to every server-side resolution.
pub const DEFAULT_RESTRICTED_CONDITION: &str = "react-server";

/// A compiled "restricted module" file name pattern.
#[derive(Debug, Clone)]
pub struct RestrictedPattern {
    source: String,
    regex: regex_lite::Regex,
}

impl RestrictedPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = regex_lite::Regex::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for RestrictedPattern {
    fn default() -> Self {
        Self {
            source: DEFAULT_RESTRICTED_PATTERN.to_string(),
            regex: regex_lite::Regex::new(DEFAULT_RESTRICTED_PATTERN)
                .unwrap_or_else(|_| unreachable!("default restricted pattern is valid")),
        }
    }
}

impl Serialize for RestrictedPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for RestrictedPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Naming conventions shared by both loaders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Conventions {
    /// Modules matching this may only be imported by other matching modules.
    pub restricted_pattern: RestrictedPattern,

    /// Modules whose file name ends with this are replaced by reference stubs.
    pub client_suffix: String,

    /// Condition the server-side resolve hook adds to every resolution.
    pub restricted_condition: String,

    /// Conditions used when resolving `export *` targets as a client would.
    pub client_conditions: Vec<String>,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            restricted_pattern: RestrictedPattern::default(),
            client_suffix: DEFAULT_CLIENT_SUFFIX.to_string(),
            restricted_condition: DEFAULT_RESTRICTED_CONDITION.to_string(),
            client_conditions: vec!["node".to_string(), "import".to_string()],
        }
    }
}

impl Conventions {
    /// Whether `path` names a restricted (server-only) module.
    #[must_use]
    pub fn is_restricted(&self, path: &str) -> bool {
        self.restricted_pattern.is_match(path)
    }

    /// Whether `path` names a client module that gets stubbed out.
    #[must_use]
    pub fn is_client_module(&self, path: &str) -> bool {
        path.ends_with(&self.client_suffix)
    }

    /// Load conventions from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Runtime configuration for the modref CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Naming conventions for restricted and client modules.
    pub conventions: Conventions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            conventions: Conventions::default(),
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Create a config for `cwd`, picking up `modref.json` if one exists there.
    pub fn load(cwd: PathBuf) -> Result<Self> {
        let path = cwd.join(CONFIG_FILE_NAME);
        let conventions = if path.is_file() {
            Conventions::from_file(&path)?
        } else {
            Conventions::default()
        };
        Ok(Self::new(cwd).with_conventions(conventions))
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Set naming conventions.
    #[must_use]
    pub fn with_conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }
}
