// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handler Worker (§4.2): one short-lived task per accepted request:
//! admission, node selection + invocation, reply transmission, and serving
//! retransmissions until the retention window closes.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::collaborators::{
    AdmissionQueue, HandlerRegistry, NodeMonitor, PacketCodec, RemoteExecutor, RequestLogEvent,
    RequestLogger,
};
use crate::config::ServerConfig;
use crate::counters::ServerCounters;
use crate::dispatcher::{dispatch, DispatchOutcome};
use crate::error::DiscardReason;
use crate::packet::{Handler, NasProperties, RadiusReply, RadiusRequest, ReplyFields};
use crate::transaction::{RetransmitSignal, WorkerId};

/// Signals a worker sends back to the listener so it can keep the
/// transaction table in sync without the worker ever touching it directly.
pub enum ListenerEvent {
    Replied {
        key: crate::packet::RequestKey,
        worker_id: WorkerId,
        retransmit_tx: mpsc::Sender<RetransmitSignal>,
    },
    Discarded {
        key: crate::packet::RequestKey,
    },
}

/// Everything a worker needs to run one request to completion. Built by the
/// listener at spawn time from its own collaborator handles plus the
/// per-request packet and NAS lookup result.
pub struct WorkerParams {
    pub key: crate::packet::RequestKey,
    pub worker_id: WorkerId,
    pub src_addr: SocketAddr,
    pub packet: Vec<u8>,
    pub handler: Handler,
    pub nas: NasProperties,
    pub socket: Arc<UdpSocket>,
    pub config: Arc<ServerConfig>,
    pub counters: Arc<ServerCounters>,
    pub codec: Arc<dyn PacketCodec>,
    pub node_monitor: Arc<dyn NodeMonitor>,
    pub admission: Arc<dyn AdmissionQueue>,
    pub remote_executor: Arc<dyn RemoteExecutor>,
    pub handler_registry: Arc<dyn HandlerRegistry>,
    pub logger: Arc<dyn RequestLogger>,
    pub events: mpsc::UnboundedSender<ListenerEvent>,
    pub server_name: String,
}

/// Runs one request end to end. Never panics out of this function: a
/// handler callback fault is caught and turned into a `HandlerFailure`
/// discard (§7).
pub async fn run_worker(params: WorkerParams) {
    let WorkerParams {
        key,
        worker_id,
        src_addr,
        packet,
        handler,
        nas,
        socket,
        config,
        counters,
        codec,
        node_monitor,
        admission,
        remote_executor,
        handler_registry,
        logger,
        events,
        server_name,
    } = params;

    let token = match admission.ask(&server_name).await {
        Some(token) => token,
        None => {
            counters.incr_nas(nas.nas_ip, "packetsDropped");
            log_discard(&nas, &key, &DiscardReason::PacketsDropped);
            let _ = events.send(ListenerEvent::Discarded { key });
            return;
        }
    };

    let outcome = resolve_reply(
        &key,
        &packet,
        &handler,
        &nas,
        codec.as_ref(),
        node_monitor.as_ref(),
        remote_executor.as_ref(),
        handler_registry.as_ref(),
        counters.as_ref(),
        logger.as_ref(),
        config.remote_reply_timeout(),
    )
    .await;

    admission.done(token).await;

    let reply = match outcome {
        Ok((request, reply)) => {
            send_reply(
                &key,
                worker_id,
                &request,
                &reply,
                src_addr,
                socket,
                codec.as_ref(),
                logger.as_ref(),
                counters.as_ref(),
                &nas,
                config.resend_timeout(),
                config.resend_retries,
                &events,
            )
            .await;
            return;
        }
        Err(reason) => reason,
    };

    bump_discard_counter(&counters, &nas, &reply);
    logger.write_request(&key, RequestLogEvent::Discarded(&reply));
    log_discard(&nas, &key, &reply);
    let _ = events.send(ListenerEvent::Discarded { key });
}

/// Steps 2–4 of §4.2: decode, select a node, invoke the handler (locally or
/// remotely), and resolve the callback's outcome down to a plain
/// `Result<(request, reply), DiscardReason>`.
#[allow(clippy::too_many_arguments)]
async fn resolve_reply(
    key: &crate::packet::RequestKey,
    packet: &[u8],
    handler: &Handler,
    nas: &NasProperties,
    codec: &dyn PacketCodec,
    node_monitor: &dyn NodeMonitor,
    remote_executor: &dyn RemoteExecutor,
    handler_registry: &dyn HandlerRegistry,
    counters: &ServerCounters,
    logger: &dyn RequestLogger,
    remote_timeout: std::time::Duration,
) -> Result<(RadiusRequest, RadiusReply), DiscardReason> {
    let request = codec.decode(packet, &nas.secret).map_err(|_| DiscardReason::BadPdu)?;
    logger.write_request(key, RequestLogEvent::Received(&request));

    if let Some(metric) = request.command.request_counter() {
        counters.incr_nas(nas.nas_ip, metric);
    }

    let candidates = node_monitor.nodes_for(&handler.module).await;
    let local_node = node_monitor.local_node();

    let reply = match dispatch(&candidates, &nas.handler_nodes, &local_node) {
        DispatchOutcome::Discard(reason) => return Err(reason),
        DispatchOutcome::Node(node) if node == local_node => {
            invoke_local(handler_registry, &request, nas, handler).await?
        }
        DispatchOutcome::Node(node) => {
            match tokio::time::timeout(remote_timeout, remote_executor.invoke(&node, &request, nas))
                .await
            {
                Ok(Ok(reply)) => reply,
                Ok(Err(reason)) => return Err(reason),
                Err(_elapsed) => return Err(DiscardReason::RemoteHandlerReplyTimeout(node)),
            }
        }
    };

    Ok((request, reply))
}

/// Invokes the local handler callback, isolating its panics (the "uncaught
/// fault" branch of §4.2 step 4) via `catch_unwind` rather than a
/// spawned task, since the callback borrows request/nas/handler and can't
/// be made `'static` without cloning them.
async fn invoke_local(
    handler_registry: &dyn HandlerRegistry,
    request: &RadiusRequest,
    nas: &NasProperties,
    handler: &Handler,
) -> Result<RadiusReply, DiscardReason> {
    let callback = handler_registry
        .resolve(&handler.module)
        .ok_or_else(|| DiscardReason::HandlerFailure(format!("unregistered module {}", handler.module)))?;

    let outcome = AssertUnwindSafe(callback.handle(request, nas, handler))
        .catch_unwind()
        .await
        .map_err(|panic_payload| DiscardReason::HandlerFailure(describe_panic(panic_payload)))?;

    match outcome {
        crate::packet::HandlerOutcome::Reply(reply) => Ok(reply),
        crate::packet::HandlerOutcome::NoReply => Err(DiscardReason::HandlerReturnedNoReply),
        crate::packet::HandlerOutcome::BadReturn(v) => Err(DiscardReason::BadReturn(v)),
    }
}

fn describe_panic(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked with non-string payload".to_string()
    }
}

/// Step 4 `{reply, response}` path plus step 5's retain state: encode,
/// transmit, log, signal the listener, then serve up to
/// `config.resend_retries` retransmissions until `resend_timeout` expires.
#[allow(clippy::too_many_arguments)]
async fn send_reply(
    key: &crate::packet::RequestKey,
    worker_id: WorkerId,
    request: &RadiusRequest,
    reply: &RadiusReply,
    src_addr: SocketAddr,
    socket: Arc<UdpSocket>,
    codec: &dyn PacketCodec,
    logger: &dyn RequestLogger,
    counters: &ServerCounters,
    nas: &NasProperties,
    resend_timeout: std::time::Duration,
    resend_retries: u8,
    events: &mpsc::UnboundedSender<ListenerEvent>,
) {
    let fields = ReplyFields::resolve(request, reply);
    let bytes = codec.encode_reply(request, reply, fields);

    if socket.send_to(&bytes, src_addr).await.is_err() {
        tracing::warn!(nas_ip = %nas.nas_ip, request_id = key.request_id, "failed to send reply");
    }

    if let Some(metric) = reply.command.reply_counter() {
        counters.incr_nas(nas.nas_ip, metric);
    }
    logger.write_request(key, RequestLogEvent::Replied(reply));
    if nas.trace {
        tracing::info!(nas_ip = %nas.nas_ip, request_id = key.request_id, "trace: replied");
    }

    let (retransmit_tx, mut retransmit_rx) = mpsc::channel(resend_retries.max(1) as usize);
    let _ = events.send(ListenerEvent::Replied {
        key: *key,
        worker_id,
        retransmit_tx,
    });

    let mut retries_left = resend_retries;
    let sleep = tokio::time::sleep(resend_timeout);
    tokio::pin!(sleep);

    loop {
        if retries_left == 0 {
            (&mut sleep).await;
            break;
        }

        tokio::select! {
            _ = &mut sleep => break,
            received = retransmit_rx.recv() => {
                match received {
                    Some(RetransmitSignal) => {
                        let _ = socket.send_to(&bytes, src_addr).await;
                        retries_left -= 1;
                    }
                    None => break,
                }
            }
        }
    }

    let _ = events.send(ListenerEvent::Discarded { key: *key });
}

fn bump_discard_counter(counters: &ServerCounters, nas: &NasProperties, reason: &DiscardReason) {
    match reason {
        DiscardReason::BadPdu => counters.incr_nas(nas.nas_ip, "malformedRequests"),
        DiscardReason::NoNodes | DiscardReason::NoNodesLocal => {
            counters.incr_server("discardNoHandler")
        }
        DiscardReason::RemoteHandlerReplyTimeout(_) | DiscardReason::HandlerFailure(_) => {
            counters.incr_nas(nas.nas_ip, "handlerFailure")
        }
        DiscardReason::HandlerReturnedNoReply | DiscardReason::BadReturn(_) => {}
        DiscardReason::PacketsDropped => counters.incr_nas(nas.nas_ip, "packetsDropped"),
        DiscardReason::UnknownNas => counters.incr_server("invalidRequests"),
    }
}

fn log_discard(nas: &NasProperties, key: &crate::packet::RequestKey, reason: &DiscardReason) {
    tracing::debug!(
        nas_ip = %nas.nas_ip,
        nas_port = nas.nas_port,
        request_id = key.request_id,
        reason = %reason,
        "request discarded"
    );
    if nas.trace {
        tracing::info!(
            nas_ip = %nas.nas_ip,
            request_id = key.request_id,
            "trace: discarded: {reason}"
        );
    }
}
