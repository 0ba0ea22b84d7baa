//! ZooKeeper backend for zknotify.
//!
//! Wraps the `zookeeper` client crate behind the core store seam. Session
//! handling, reconnects and timeouts are left to the client.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};
use zknotify_core::{StoreConnection, StoreConnector};
use zookeeper::{WatchedEvent, Watcher, ZooKeeper};

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens ZooKeeper sessions for a notification handler.
#[derive(Debug, Clone)]
pub struct ZooKeeperConnector {
    session_timeout: Duration,
}

impl Default for ZooKeeperConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ZooKeeperConnector {
    pub fn new() -> Self {
        Self {
            session_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }
}

impl StoreConnector for ZooKeeperConnector {
    type Connection = ZooKeeperConnection;

    fn connect(&self, server: &str) -> Result<Self::Connection> {
        info!("opening zookeeper session to {server}");
        let zk = ZooKeeper::connect(server, self.session_timeout, SessionLogger)
            .with_context(|| format!("failed to open zookeeper session to {server}"))?;
        Ok(ZooKeeperConnection { zk })
    }
}

/// Logs session state changes reported by the client.
struct SessionLogger;

impl Watcher for SessionLogger {
    fn handle(&self, event: WatchedEvent) {
        debug!("zookeeper event: {:?}", event);
    }
}

/// An open ZooKeeper session.
pub struct ZooKeeperConnection {
    zk: ZooKeeper,
}

impl StoreConnection for ZooKeeperConnection {
    fn write(&self, path: &str, data: &str) -> Result<()> {
        let stat = self
            .zk
            .set_data(path, data.as_bytes().to_vec(), None)
            .with_context(|| format!("failed to set data on znode {path}"))?;
        debug!("znode {path} now at version {}", stat.version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_timeout() {
        let connector = ZooKeeperConnector::default();
        assert_eq!(connector.session_timeout(), DEFAULT_SESSION_TIMEOUT);
    }

    #[test]
    fn session_timeout_is_configurable() {
        let connector = ZooKeeperConnector::new().with_session_timeout(Duration::from_secs(3));
        assert_eq!(connector.session_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn handler_validates_before_opening_a_session() {
        use zknotify_core::{HandlerConfig, NotificationHandler};

        let mut cfg = HandlerConfig::new();
        cfg.set_server("127.0.0.1:2181")
            .set_znode("/app/node1")
            .set_start_template("/tmp/nonexistent-template.hbs");
        let mut handler = NotificationHandler::new(cfg, ZooKeeperConnector::new());

        let err = handler.notify(None).expect_err("validation must fail");
        assert!(err.is_validation());
        assert!(!handler.is_connected());
    }
}
