// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `ServerCounter`: named counters keyed `(server-endpoint, NAS, metric)`.
//!
//! Counter updates are monotonic between resets; pull-reset returns a
//! snapshot and zeroes in one step, per §3's invariants. A plain
//! `std::sync::Mutex` is enough here: every critical section is a handful of
//! `HashMap` operations with no `.await` inside it, so there's nothing a
//! `tokio::sync::Mutex` would buy us.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;

/// A point-in-time read of every counter the server has tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Server-level counters (`invalidRequests`, `discardNoHandler`, ...).
    pub server: HashMap<&'static str, u64>,
    /// Per-NAS counters, keyed by the NAS's source IP.
    pub per_nas: HashMap<IpAddr, HashMap<&'static str, u64>>,
}

/// The kind of read requested via [`ServerCounters::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsKind {
    /// Return the current values, then zero every counter.
    Pull,
    /// Return the current values without mutating anything.
    Read,
    /// Zero every counter and return an acknowledgement snapshot (all
    /// zeros, by construction).
    Reset,
}

/// The counter store for one server instance.
#[derive(Debug, Default)]
pub struct ServerCounters {
    server: Mutex<HashMap<&'static str, u64>>,
    per_nas: Mutex<HashMap<IpAddr, HashMap<&'static str, u64>>>,
}

impl ServerCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_server(&self, metric: &'static str) {
        *self.server.lock().unwrap().entry(metric).or_insert(0) += 1;
    }

    pub fn incr_nas(&self, nas_ip: IpAddr, metric: &'static str) {
        *self
            .per_nas
            .lock()
            .unwrap()
            .entry(nas_ip)
            .or_default()
            .entry(metric)
            .or_insert(0) += 1;
    }

    /// Read, pull, or reset the counter store per `kind`.
    pub fn stats(&self, kind: StatsKind) -> CounterSnapshot {
        let mut server = self.server.lock().unwrap();
        let mut per_nas = self.per_nas.lock().unwrap();

        let snapshot = CounterSnapshot {
            server: server.clone(),
            per_nas: per_nas.clone(),
        };

        match kind {
            StatsKind::Read => snapshot,
            StatsKind::Pull => {
                server.clear();
                per_nas.clear();
                snapshot
            }
            StatsKind::Reset => {
                server.clear();
                per_nas.clear();
                CounterSnapshot::default()
            }
        }
    }
}
