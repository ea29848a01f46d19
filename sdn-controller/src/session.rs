//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! The session table. One task per accepted connection owns the socket
//! and writes to a task-owned outbound queue; the shared map guarded by
//! a single mutex holds only a lightweight handle (the queue's sender),
//! never the socket itself. Sending on a session therefore never
//! happens while the table lock is held.

use std::collections::HashMap;
use std::sync::Arc;

use sdn_proto::Message;
use tokio::sync::{Mutex, mpsc};

/// A lightweight handle to a connected router's session. The only way to
/// send on the session is through `tx`; this enforces the single-writer-
/// per-session invariant.
#[derive(Clone)]
pub struct SessionHandle {
    pub tx: mpsc::UnboundedSender<Message>,
}

#[derive(Default, Clone)]
pub struct SessionTable {
    inner: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        SessionTable::default()
    }

    pub async fn insert(&self, router_name: String, handle: SessionHandle) {
        self.inner.lock().await.insert(router_name, handle);
    }

    pub async fn remove(&self, router_name: &str) {
        self.inner.lock().await.remove(router_name);
    }

    pub async fn get(&self, router_name: &str) -> Option<SessionHandle> {
        self.inner.lock().await.get(router_name).cloned()
    }

    pub async fn contains(&self, router_name: &str) -> bool {
        self.inner.lock().await.contains_key(router_name)
    }

    /// A snapshot of every connected router's handle, taken under the lock
    /// and released immediately; sending happens after the lock is
    /// dropped.
    pub async fn snapshot(&self) -> Vec<(String, SessionHandle)> {
        self.inner
            .lock()
            .await
            .iter()
            .map(|(name, handle)| (name.clone(), handle.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disconnect_removes_from_table() {
        let table = SessionTable::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        table.insert("R1".to_owned(), SessionHandle { tx }).await;
        assert!(table.contains("R1").await);
        table.remove("R1").await;
        assert!(!table.contains("R1").await);
    }
}
