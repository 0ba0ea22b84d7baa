//! The seam between the handler and a coordination store client.

use anyhow::Result;

pub mod memory;

pub use memory::MemoryStore;

/// Opens connections to a coordination store.
pub trait StoreConnector: std::fmt::Debug {
    type Connection: StoreConnection;

    /// Connects to `server`, a client-specific connection string such as
    /// `host1:2181,host2:2181`.
    fn connect(&self, server: &str) -> Result<Self::Connection>;
}

/// An open store session.
pub trait StoreConnection {
    /// Replaces the data stored at `path`.
    fn write(&self, path: &str, data: &str) -> Result<()>;
}
