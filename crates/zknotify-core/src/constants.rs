//! Constants used across the zknotify workspace.

/// Option names starting with this prefix are never settable.
pub const RESERVED_PREFIX: &str = "config_";

/// External option names accepted by [`crate::config::HandlerConfig`].
pub const OPTION_SERVER: &str = "server";
pub const OPTION_ZNODE: &str = "znode";
pub const OPTION_START_TEMPLATE: &str = "start_template";
pub const OPTION_END_TEMPLATE: &str = "end_template";

/// Built-in payload templates, shipped with the crate.
pub const DEFAULT_START_TEMPLATE: &str = include_str!("../resources/start.json.hbs");
pub const DEFAULT_END_TEMPLATE: &str = include_str!("../resources/end.json.hbs");
