// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transaction Table (§4.4): the listener's exclusive, unshared map from
//! `RequestKey` to the worker currently responsible for it.
//!
//! Only the listener ever touches this; workers communicate transitions
//! back to it over a channel (see [`crate::listener`]). That's what lets
//! `insert`/`lookup`/`remove` stay a bare `HashMap` with no locking.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::packet::RequestKey;

/// Opaque identity for a spawned handler worker, used only to recognize
/// "this is the worker that used to own this entry" on abnormal exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(pub u64);

/// A signal the listener can deliver to a live worker: currently only
/// "a duplicate arrived while you were in `Replied` state, resend."
#[derive(Debug, Clone, Copy)]
pub struct RetransmitSignal;

/// A transaction's state, per §3: `Handling` while the handler callback
/// (local or remote) hasn't produced a reply yet, `Replied` once it has and
/// the reply is cached for retransmission.
pub enum Transaction {
    Handling { worker_id: WorkerId },
    Replied {
        worker_id: WorkerId,
        retransmit_tx: mpsc::Sender<RetransmitSignal>,
    },
}

impl Transaction {
    pub fn worker_id(&self) -> WorkerId {
        match self {
            Transaction::Handling { worker_id } => *worker_id,
            Transaction::Replied { worker_id, .. } => *worker_id,
        }
    }
}

/// The listener's in-flight request map. At most one entry per
/// [`RequestKey`] at any time (§3 invariant).
#[derive(Default)]
pub struct TransactionTable {
    entries: HashMap<RequestKey, Transaction>,
}

impl TransactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RequestKey) -> Option<&Transaction> {
        self.entries.get(key)
    }

    pub fn insert_handling(&mut self, key: RequestKey, worker_id: WorkerId) {
        self.entries.insert(key, Transaction::Handling { worker_id });
    }

    /// Transition an existing entry to `Replied`. A no-op if the key isn't
    /// present (e.g. it was already purged by a racing crash cleanup).
    pub fn mark_replied(
        &mut self,
        key: &RequestKey,
        retransmit_tx: mpsc::Sender<RetransmitSignal>,
    ) {
        if let Some(entry) = self.entries.get(key) {
            let worker_id = entry.worker_id();
            self.entries.insert(
                *key,
                Transaction::Replied {
                    worker_id,
                    retransmit_tx,
                },
            );
        }
    }

    pub fn remove(&mut self, key: &RequestKey) -> Option<Transaction> {
        self.entries.remove(key)
    }

    /// Reverse scan by worker identity, used only on abnormal worker exit
    /// (§4.1: "purge any table entry whose worker matches the dead
    /// worker"). Rare enough that O(n) is the right tradeoff over
    /// maintaining a second index (§9).
    pub fn remove_by_worker(&mut self, worker_id: WorkerId) -> Vec<RequestKey> {
        let dead: Vec<RequestKey> = self
            .entries
            .iter()
            .filter(|(_, tx)| tx.worker_id() == worker_id)
            .map(|(key, _)| *key)
            .collect();

        for key in &dead {
            self.entries.remove(key);
        }
        dead
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn key(id: u8) -> RequestKey {
        RequestKey::new("10.0.0.1".parse::<IpAddr>().unwrap(), 1700, id)
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = TransactionTable::new();
        table.insert_handling(key(7), WorkerId(1));
        assert!(matches!(table.get(&key(7)), Some(Transaction::Handling { .. })));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_mark_replied_transitions_state() {
        let mut table = TransactionTable::new();
        table.insert_handling(key(7), WorkerId(1));
        let (tx, _rx) = mpsc::channel(1);
        table.mark_replied(&key(7), tx);
        assert!(matches!(table.get(&key(7)), Some(Transaction::Replied { .. })));
    }

    #[test]
    fn test_mark_replied_missing_key_is_noop() {
        let mut table = TransactionTable::new();
        let (tx, _rx) = mpsc::channel(1);
        table.mark_replied(&key(9), tx);
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut table = TransactionTable::new();
        table.insert_handling(key(7), WorkerId(1));
        assert!(table.remove(&key(7)).is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_by_worker_purges_only_matching_entries() {
        let mut table = TransactionTable::new();
        table.insert_handling(key(1), WorkerId(1));
        table.insert_handling(key(2), WorkerId(2));
        table.insert_handling(key(3), WorkerId(1));

        let purged = table.remove_by_worker(WorkerId(1));
        assert_eq!(purged.len(), 2);
        assert_eq!(table.len(), 1);
        assert!(table.get(&key(2)).is_some());
    }

    #[test]
    fn test_at_most_one_entry_per_key() {
        let mut table = TransactionTable::new();
        table.insert_handling(key(7), WorkerId(1));
        table.insert_handling(key(7), WorkerId(2));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&key(7)).unwrap().worker_id(), WorkerId(2));
    }
}
