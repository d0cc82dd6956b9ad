use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::ConfigError;

/// One token rule from the configuration file.
///
/// `priority` is a signed weight; smaller values win when several rules
/// match the same input. Rules of equal priority are disambiguated by their
/// order in the file, earliest first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    /// Token name reported in the emitted tables. Must be unique.
    pub name: String,
    /// Regular expression describing the token.
    pub pattern: String,
    /// Disambiguation weight; lower wins.
    pub priority: i32,
}

impl Rule {
    /// Creates a new [`Rule`].
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            priority,
        }
    }
}

/// Top-level shape of the YAML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// The token rules, in file order.
    #[serde(default)]
    pub tokens: Vec<Rule>,
}

impl Config {
    /// Reads the rule list from a YAML file, sorted by priority ascending.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read or is not
    /// valid YAML.
    pub fn load(path: &Path) -> Result<Vec<Rule>, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parses the rule list from YAML text, sorted by priority ascending.
    ///
    /// The sort is stable, so rules of equal priority keep their file order;
    /// the compiler relies on this to break priority ties.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_yaml::Error`] on malformed input.
    pub fn from_yaml(text: &str) -> Result<Vec<Rule>, serde_yaml::Error> {
        let mut config: Config = serde_yaml::from_str(text)?;
        config.tokens.sort_by_key(|rule| rule.priority);
        Ok(config.tokens)
    }
}
