use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigKey;

/// A configuration problem detected by a setter or by
/// [`HandlerConfig::validate`](crate::config::HandlerConfig::validate).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("required argument {0} is missing")]
    MissingOption(ConfigKey),
    #[error("invalid type for option '{key}': expected string, got {found}")]
    InvalidType { key: ConfigKey, found: &'static str },
    #[error("template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
}

/// Every failure a notification can surface to the host.
///
/// Nothing here is retried or swallowed; the host decides whether a failed
/// notification aborts its run.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render template {template}")]
    Render {
        template: String,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("failed to connect to coordination store at {server}")]
    StoreConnect {
        server: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write znode {path}")]
    StoreWrite {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl NotifyError {
    /// True when the error is a configuration problem rather than an I/O or
    /// store failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
