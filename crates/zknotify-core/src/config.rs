use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use toml::Value;
use tracing::{debug, warn};

use crate::constants::*;
use crate::error::{NotifyError, ValidationError};

/// The closed set of options a handler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Server,
    Znode,
    StartTemplate,
    EndTemplate,
}

impl ConfigKey {
    pub const REQUIRED: [ConfigKey; 2] = [ConfigKey::Server, ConfigKey::Znode];
    pub const TEMPLATES: [ConfigKey; 2] = [ConfigKey::StartTemplate, ConfigKey::EndTemplate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => OPTION_SERVER,
            Self::Znode => OPTION_ZNODE,
            Self::StartTemplate => OPTION_START_TEMPLATE,
            Self::EndTemplate => OPTION_END_TEMPLATE,
        }
    }
}

impl Display for ConfigKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an option name has no counterpart in [`ConfigKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption(pub String);

impl FromStr for ConfigKey {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.starts_with(RESERVED_PREFIX) {
            return Err(UnknownOption(value.to_string()));
        }
        match value {
            OPTION_SERVER => Ok(Self::Server),
            OPTION_ZNODE => Ok(Self::Znode),
            OPTION_START_TEMPLATE => Ok(Self::StartTemplate),
            OPTION_END_TEMPLATE => Ok(Self::EndTemplate),
            _ => Err(UnknownOption(value.to_string())),
        }
    }
}

/// Handler options.
///
/// Options may be set one by one after construction, so nothing is checked
/// until [`HandlerConfig::validate`] runs right before a payload is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerConfig {
    server: Option<String>,
    znode: Option<String>,
    start_template: Option<String>,
    end_template: Option<String>,
}

impl HandlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from `(name, value)` pairs.
    ///
    /// Unknown names, and any name carrying the reserved `config_` prefix,
    /// are logged and skipped. A known name with a non-string value is an
    /// error.
    pub fn from_options<I, K>(options: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut cfg = Self::default();
        cfg.apply_options(options)?;
        Ok(cfg)
    }

    /// Applies `(name, value)` pairs on top of the current values.
    pub fn apply_options<I, K>(&mut self, options: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (name, value) in options {
            let name = name.as_ref();
            match ConfigKey::from_str(name) {
                Ok(key) => {
                    self.set(key, value)?;
                }
                Err(UnknownOption(name)) => {
                    warn!("zknotify: configuration option not found: {name}");
                }
            }
        }
        Ok(())
    }

    /// Parses a flat TOML table of options.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let table = toml::from_str::<toml::Table>(text)?;
        Self::from_options(table).map_err(|e| <toml::de::Error as serde::de::Error>::custom(e))
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, NotifyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| NotifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table =
            toml::from_str::<toml::Table>(&text).map_err(|source| NotifyError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        let cfg = Self::from_options(table)?;
        debug!("loaded handler options from {}", path.display());
        Ok(cfg)
    }

    /// Sets an option from a dynamically typed value.
    pub fn set(&mut self, key: ConfigKey, value: Value) -> Result<&mut Self, ValidationError> {
        match value {
            Value::String(text) => {
                *self.slot(key) = Some(text);
                Ok(self)
            }
            other => Err(ValidationError::InvalidType {
                key,
                found: other.type_str(),
            }),
        }
    }

    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::Server => self.server.as_deref(),
            ConfigKey::Znode => self.znode.as_deref(),
            ConfigKey::StartTemplate => self.start_template.as_deref(),
            ConfigKey::EndTemplate => self.end_template.as_deref(),
        }
    }

    /// Clears an option.
    pub fn unset(&mut self, key: ConfigKey) -> &mut Self {
        *self.slot(key) = None;
        self
    }

    pub fn set_server(&mut self, server: impl Into<String>) -> &mut Self {
        self.server = Some(server.into());
        self
    }

    pub fn set_znode(&mut self, znode: impl Into<String>) -> &mut Self {
        self.znode = Some(znode.into());
        self
    }

    pub fn set_start_template(&mut self, path: impl Into<String>) -> &mut Self {
        self.start_template = Some(path.into());
        self
    }

    pub fn set_end_template(&mut self, path: impl Into<String>) -> &mut Self {
        self.end_template = Some(path.into());
        self
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn znode(&self) -> Option<&str> {
        self.znode.as_deref()
    }

    pub fn start_template(&self) -> Option<&str> {
        self.start_template.as_deref()
    }

    pub fn end_template(&self) -> Option<&str> {
        self.end_template.as_deref()
    }

    /// Checks required options and that configured template files exist.
    ///
    /// # Errors
    /// Returns [`ValidationError::MissingOption`] when `server` or `znode` is
    /// unset or empty, and [`ValidationError::TemplateNotFound`] for a
    /// configured template path that is not on disk.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for key in ConfigKey::REQUIRED {
            if self.get(key).map_or(true, str::is_empty) {
                return Err(ValidationError::MissingOption(key));
            }
        }

        for key in ConfigKey::TEMPLATES {
            if let Some(template) = self.get(key) {
                let path = PathBuf::from(template);
                if !path.exists() {
                    return Err(ValidationError::TemplateNotFound(path));
                }
            }
        }

        Ok(())
    }

    fn slot(&mut self, key: ConfigKey) -> &mut Option<String> {
        match key {
            ConfigKey::Server => &mut self.server,
            ConfigKey::Znode => &mut self.znode,
            ConfigKey::StartTemplate => &mut self.start_template,
            ConfigKey::EndTemplate => &mut self.end_template,
        }
    }
}
