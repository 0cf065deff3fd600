// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! External collaborator interfaces (§6).
//!
//! The core never implements RADIUS attribute codecs, a NAS registry, node
//! membership tracking, rate limiting, or request logging itself. Those
//! are pinned here as trait seams so a host application can wire in its own
//! (a database-backed NAS registry, a gossip-based node monitor, whatever).
//! `radius-server` supplies minimal in-memory implementations of all of them.

use std::collections::HashSet;
use std::net::IpAddr;

use async_trait::async_trait;

use crate::error::DiscardReason;
use crate::packet::{Handler, NasProperties, RadiusReply, RadiusRequest, ReplyFields};

/// Identifies a worker node that may run handler modules. Plain `String`
/// rather than a numeric id: node identities come from the membership
/// monitor and are compared for equality only, never parsed.
pub type NodeId = String;

/// Identifies a handler module, e.g. `"auth.pap"`.
pub type HandlerId = String;

/// An admission token. Dropping it (or calling [`AdmissionQueue::done`])
/// releases whatever slot it represents.
#[derive(Debug)]
pub struct Token(pub(crate) u64);

impl Token {
    /// Construct a token carrying `id`. The id is opaque to the core;
    /// `AdmissionQueue` implementations use it however they see fit (a
    /// sequence number, a bucket index, ...).
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Maps an incoming packet's origin to the handler and NAS properties that
/// should process it.
#[async_trait]
pub trait NasRegistry: Send + Sync {
    async fn lookup(
        &self,
        listen_ip: IpAddr,
        listen_port: u16,
        nas_ip: IpAddr,
    ) -> Option<(Handler, NasProperties)>;
}

/// Reports which worker nodes currently advertise a given handler module.
#[async_trait]
pub trait NodeMonitor: Send + Sync {
    async fn nodes_for(&self, module: &HandlerId) -> HashSet<NodeId>;

    /// The identity of the node this listener instance runs on.
    fn local_node(&self) -> NodeId;
}

/// RADIUS wire codec. Decoding needs the NAS's shared secret; encoding a
/// reply needs the fields the core resolved in [`ReplyFields::resolve`].
#[async_trait]
pub trait PacketCodec: Send + Sync {
    fn decode(&self, bytes: &[u8], secret: &[u8]) -> Result<RadiusRequest, DiscardReason>;
    fn encode_reply(&self, request: &RadiusRequest, reply: &RadiusReply, fields: ReplyFields) -> Vec<u8>;
}

/// Admission control in front of handler work.
#[async_trait]
pub trait AdmissionQueue: Send + Sync {
    async fn ask(&self, name: &str) -> Option<Token>;
    async fn done(&self, token: Token);
}

/// Where decoded requests and encoded replies get logged, per NAS trace
/// settings.
pub trait RequestLogger: Send + Sync {
    fn write_request(&self, key: &crate::packet::RequestKey, event: RequestLogEvent<'_>);
}

/// What's being logged for a given transaction key.
pub enum RequestLogEvent<'a> {
    Received(&'a RadiusRequest),
    Replied(&'a RadiusReply),
    Discarded(&'a DiscardReason),
}

/// Invokes a handler module on a remote worker node and awaits its reply.
/// Out of scope per §1 (no proxying/transport is specified) beyond the
/// trait seam and the 15s timeout the core wraps every call in. See
/// [`crate::worker`].
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn invoke(
        &self,
        node: &NodeId,
        request: &RadiusRequest,
        nas: &NasProperties,
    ) -> Result<RadiusReply, DiscardReason>;
}

/// The user-supplied callback that turns a decoded request into a reply.
#[async_trait]
pub trait RadiusHandler: Send + Sync {
    async fn handle(
        &self,
        request: &RadiusRequest,
        nas: &NasProperties,
        handler: &Handler,
    ) -> crate::packet::HandlerOutcome;
}

/// Resolves a [`Handler`]'s opaque module identifier to the callback that
/// implements it. Local-invocation-only concern: a remote node resolves its
/// own modules independently behind [`RemoteExecutor`].
pub trait HandlerRegistry: Send + Sync {
    fn resolve(&self, module: &HandlerId) -> Option<std::sync::Arc<dyn RadiusHandler>>;
}
