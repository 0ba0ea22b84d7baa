//! Core logic for zknotify.
//!
//! This crate defines the handler configuration, the run snapshot supplied by
//! the host, payload templates, the coordination store seam and the
//! notification handler that ties them together.

pub mod config;
pub mod constants;
pub mod error;
pub mod handler;
pub mod run;
pub mod store;
pub mod template;

pub use config::{ConfigKey, HandlerConfig};
pub use error::{NotifyError, ValidationError};
pub use handler::NotificationHandler;
pub use run::{Phase, RunContext, RunHook};
pub use store::{MemoryStore, StoreConnection, StoreConnector};
pub use template::{TemplateContext, TemplateRenderer, TemplateSource};
