use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};
use tracing::debug;

use crate::store::{StoreConnection, StoreConnector};

#[derive(Debug, Default)]
struct Journal {
    connects: Vec<String>,
    writes: Vec<(String, String)>,
    fail_writes: bool,
}

/// An in-process store that records every connect and write.
///
/// Clones share one journal, so a caller can keep a handle after moving the
/// connector into a handler.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    journal: Rc<RefCell<Journal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.journal.borrow_mut().fail_writes = fail;
    }

    /// Servers connected to, in order.
    pub fn connects(&self) -> Vec<String> {
        self.journal.borrow().connects.clone()
    }

    /// `(path, data)` pairs written, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.journal.borrow().writes.clone()
    }

    /// The most recent data written to `path`.
    pub fn read(&self, path: &str) -> Option<String> {
        self.journal
            .borrow()
            .writes
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, data)| data.clone())
    }
}

impl StoreConnector for MemoryStore {
    type Connection = MemoryStore;

    fn connect(&self, server: &str) -> Result<Self::Connection> {
        debug!("memory store: connect {server}");
        self.journal.borrow_mut().connects.push(server.to_string());
        Ok(self.clone())
    }
}

impl StoreConnection for MemoryStore {
    fn write(&self, path: &str, data: &str) -> Result<()> {
        let mut journal = self.journal.borrow_mut();
        if journal.fail_writes {
            bail!("memory store rejected write to {path}");
        }
        debug!("memory store: write {} bytes to {path}", data.len());
        journal.writes.push((path.to_string(), data.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_journal() {
        let store = MemoryStore::new();
        let conn = store.connect("127.0.0.1:2181").unwrap();
        conn.write("/app/node1", "first").unwrap();
        conn.write("/app/node1", "second").unwrap();

        assert_eq!(store.connects(), vec!["127.0.0.1:2181".to_string()]);
        assert_eq!(store.writes().len(), 2);
        assert_eq!(store.read("/app/node1").as_deref(), Some("second"));
        assert_eq!(store.read("/app/other"), None);
    }

    #[test]
    fn failing_writes_are_not_recorded() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        let conn = store.connect("127.0.0.1:2181").unwrap();

        let err = conn.write("/app/node1", "data").expect_err("write must fail");
        assert!(err.to_string().contains("/app/node1"));
        assert!(store.writes().is_empty());
    }
}
