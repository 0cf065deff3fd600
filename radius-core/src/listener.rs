// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Listener (§4.1): the singleton owner of the UDP socket and the
//! transaction table. All socket I/O and all table mutations happen on this
//! one task; handler workers only ever reach back in via `events` and the
//! per-worker `JoinSet`, never by touching the table directly.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Notify};
use tokio::task::{Id as TaskId, JoinSet};

use crate::collaborators::{
    AdmissionQueue, HandlerRegistry, NasRegistry, NodeMonitor, PacketCodec, RemoteExecutor,
    RequestLogger,
};
use crate::config::ServerConfig;
use crate::counters::{CounterSnapshot, ServerCounters, StatsKind};
use crate::error::ServerError;
use crate::packet::RequestKey;
use crate::transaction::{RetransmitSignal, TransactionTable, WorkerId};
use crate::worker::{run_worker, ListenerEvent, WorkerParams};

/// Bundles the five external collaborator trait objects (§6) plus the
/// handler registry (§10.4) a `Listener` needs wired in before it can run.
pub struct Collaborators {
    pub nas_registry: Arc<dyn NasRegistry>,
    pub node_monitor: Arc<dyn NodeMonitor>,
    pub codec: Arc<dyn PacketCodec>,
    pub admission: Arc<dyn AdmissionQueue>,
    pub remote_executor: Arc<dyn RemoteExecutor>,
    pub handler_registry: Arc<dyn HandlerRegistry>,
    pub logger: Arc<dyn RequestLogger>,
}

/// A bound RADIUS server instance. One per `(listen_ip, listen_port)`.
#[derive(Clone)]
pub struct Listener {
    config: Arc<ServerConfig>,
    collaborators: Arc<Collaborators>,
    counters: Arc<ServerCounters>,
    shutdown: Arc<Notify>,
    running: Arc<AtomicBool>,
    server_name: String,
}

impl Listener {
    /// Validate `config` and prepare a server instance. Does not bind a
    /// socket yet; that happens in [`Listener::run`].
    pub fn new(config: ServerConfig, collaborators: Collaborators) -> Result<Self, ServerError> {
        config.validate()?;
        let server_name = format!("{}:{}", config.bind_address, config.port);
        Ok(Self {
            config: Arc::new(config),
            collaborators: Arc::new(collaborators),
            counters: Arc::new(ServerCounters::new()),
            shutdown: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
            server_name,
        })
    }

    /// Bind the UDP socket and run the ingest loop until [`Listener::shutdown`]
    /// is called.
    pub async fn run(&self) -> Result<(), ServerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|_| ServerError::Config("invalid bind address/port".into()))?;

        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let socket = Arc::new(socket);

        tracing::info!(%addr, "RADIUS listener bound");

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ListenerEvent>();
        let mut table = TransactionTable::new();
        let mut workers: JoinSet<()> = JoinSet::new();
        let mut task_ids: HashMap<TaskId, WorkerId> = HashMap::new();
        let next_worker_id = AtomicU64::new(0);
        let mut buf = vec![0u8; self.config.max_message_size];

        loop {
            tokio::select! {
                recv = socket.recv_from(&mut buf) => {
                    match recv {
                        Ok((len, src_addr)) => {
                            self.ingest_packet(
                                &buf[..len],
                                src_addr,
                                &socket,
                                &mut table,
                                &mut workers,
                                &mut task_ids,
                                &next_worker_id,
                                &event_tx,
                            )
                            .await;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "UDP recv error");
                        }
                    }
                }

                Some(event) = event_rx.recv() => {
                    Self::handle_event(event, &mut table);
                }

                Some(result) = workers.join_next_with_id(), if !workers.is_empty() => {
                    Self::handle_join(result, &mut table, &mut task_ids);
                }

                _ = self.shutdown.notified() => {
                    tracing::info!("shutdown signal received, stopping listener");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Step-by-step §4.1 packet-ingest algorithm.
    #[allow(clippy::too_many_arguments)]
    async fn ingest_packet(
        &self,
        bytes: &[u8],
        src_addr: SocketAddr,
        socket: &Arc<UdpSocket>,
        table: &mut TransactionTable,
        workers: &mut JoinSet<()>,
        task_ids: &mut HashMap<TaskId, WorkerId>,
        next_worker_id: &AtomicU64,
        event_tx: &mpsc::UnboundedSender<ListenerEvent>,
    ) {
        // 1. Parse minimally: need at least 2 bytes to read the request id.
        // No NAS is known yet, so this counts against the server-level
        // counter rather than a per-NAS one (§9 open question).
        if bytes.len() < 2 {
            self.counters.incr_server("invalidRequests");
            tracing::debug!(%src_addr, "bad_pdu: datagram shorter than 2 bytes");
            return;
        }
        let request_id = bytes[1];

        // 2. NAS lookup.
        let (handler, nas) = match self
            .collaborators
            .nas_registry
            .lookup(self.config.bind_address, self.config.port, src_addr.ip())
            .await
        {
            Some(found) => found,
            None => {
                self.counters.incr_server("invalidRequests");
                tracing::debug!(%src_addr, "unknown_nas");
                return;
            }
        };

        // 3. Form the request key.
        let key = RequestKey::new(src_addr.ip(), src_addr.port(), request_id);

        // 4. Table consultation.
        match table.get(&key) {
            None => {
                self.counters.incr_nas(nas.nas_ip, "requests");
                let worker_id = WorkerId(next_worker_id.fetch_add(1, Ordering::Relaxed));

                let params = WorkerParams {
                    key,
                    worker_id,
                    src_addr,
                    packet: bytes.to_vec(),
                    handler,
                    nas,
                    socket: socket.clone(),
                    config: self.config.clone(),
                    counters: self.counters.clone(),
                    codec: self.collaborators.codec.clone(),
                    node_monitor: self.collaborators.node_monitor.clone(),
                    admission: self.collaborators.admission.clone(),
                    remote_executor: self.collaborators.remote_executor.clone(),
                    handler_registry: self.collaborators.handler_registry.clone(),
                    logger: self.collaborators.logger.clone(),
                    events: event_tx.clone(),
                    server_name: self.server_name.clone(),
                };

                let abort_handle = workers.spawn(run_worker(params));
                task_ids.insert(abort_handle.id(), worker_id);
                table.insert_handling(key, worker_id);
            }
            Some(crate::transaction::Transaction::Handling { .. }) => {
                self.counters.incr_nas(nas.nas_ip, "dupRequests");
                tracing::debug!(%src_addr, request_id, "duplicate while handling, swallowed");
            }
            Some(crate::transaction::Transaction::Replied { retransmit_tx, .. }) => {
                self.counters.incr_nas(nas.nas_ip, "dupRequests");
                // Never block the listener on a slow/stuck worker.
                let _ = retransmit_tx.try_send(RetransmitSignal);
                tracing::debug!(%src_addr, request_id, "duplicate after reply, retransmitting");
            }
        }
    }

    fn handle_event(event: ListenerEvent, table: &mut TransactionTable) {
        match event {
            ListenerEvent::Replied {
                key,
                retransmit_tx,
                ..
            } => {
                table.mark_replied(&key, retransmit_tx);
            }
            ListenerEvent::Discarded { key } => {
                table.remove(&key);
            }
        }
    }

    fn handle_join(
        result: Result<(TaskId, ()), tokio::task::JoinError>,
        table: &mut TransactionTable,
        task_ids: &mut HashMap<TaskId, WorkerId>,
    ) {
        match result {
            Ok((task_id, ())) => {
                // Normal exit: the worker already removed its own entry via
                // `Discarded`. Just drop the bookkeeping.
                task_ids.remove(&task_id);
            }
            Err(join_error) => {
                let task_id = join_error.id();
                if let Some(worker_id) = task_ids.remove(&task_id) {
                    let purged = table.remove_by_worker(worker_id);
                    if !purged.is_empty() {
                        tracing::warn!(
                            worker_id = worker_id.0,
                            purged = purged.len(),
                            "worker exited abnormally, purged dangling transactions"
                        );
                    }
                }
            }
        }
    }

    /// Signal the listener to stop accepting new packets and return from
    /// [`Listener::run`].
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// §4.1 `stats(kind)`.
    pub fn stats(&self, kind: StatsKind) -> CounterSnapshot {
        self.counters.stats(kind)
    }
}
