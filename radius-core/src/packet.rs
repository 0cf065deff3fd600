// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire-adjacent types: requests, replies, NAS properties, and the handler
//! registration pinned by a NAS lookup.
//!
//! The actual RADIUS attribute encoding/decoding is an external collaborator
//! (see [`crate::collaborators::PacketCodec`]); this module only carries the
//! decoded shape the core state machine operates on.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::collaborators::NodeId;

/// RADIUS command codes the core cares about (request side and reply side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Request,
    Accept,
    Challenge,
    Reject,
    AccReq,
    AccResp,
    CoaReq,
    CoaAck,
    CoaNak,
    DiscReq,
    DiscAck,
    DiscNak,
}

impl Command {
    /// Per-NAS counter name bumped when a request of this command is accepted
    /// for handling. `None` for commands that only ever appear on replies.
    pub fn request_counter(self) -> Option<&'static str> {
        match self {
            Command::Request => Some("accessRequests"),
            Command::AccReq => Some("accountRequests"),
            Command::CoaReq => Some("coaRequests"),
            Command::DiscReq => Some("disconnectRequests"),
            _ => None,
        }
    }

    /// Per-NAS counter name bumped when a reply of this command is sent.
    /// `None` for commands that only ever appear on requests.
    pub fn reply_counter(self) -> Option<&'static str> {
        match self {
            Command::Accept => Some("accessAccepts"),
            Command::Reject => Some("accessRejects"),
            Command::Challenge => Some("accessChallenges"),
            Command::AccResp => Some("accountResponses"),
            Command::CoaAck => Some("coaAcks"),
            Command::CoaNak => Some("coaNaks"),
            Command::DiscAck => Some("discAcks"),
            Command::DiscNak => Some("discNaks"),
            _ => None,
        }
    }
}

/// A single attribute-value pair, opaque past its type octet.
pub type Avp = (u8, Vec<u8>);

/// A decoded RADIUS request, handed to the handler callback.
#[derive(Debug, Clone)]
pub struct RadiusRequest {
    pub request_id: u8,
    pub command: Command,
    pub attributes: Vec<Avp>,
    pub secret: Vec<u8>,
    pub authenticator: [u8; 16],
    /// True if the request itself carried a Message-Authenticator attribute.
    pub msg_hmac: bool,
    pub eap_message: Vec<u8>,
}

/// The reply a handler callback produces for a [`RadiusRequest`].
#[derive(Debug, Clone)]
pub struct RadiusReply {
    pub command: Command,
    pub attributes: Vec<Avp>,
    /// The handler's own opinion on whether to force Message-Authenticator.
    pub msg_hmac: bool,
}

/// Outcome a user-supplied handler callback may return.
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    Reply(RadiusReply),
    NoReply,
    /// Anything else (RFC wouldn't recognize the shape), counted as a
    /// `bad_return` discard rather than silently coerced.
    BadReturn(String),
}

/// Fields the core resolves before asking the codec to encode a reply:
/// the request id it must carry and the final `msg_hmac` decision per
/// `request.msg_hmac ∨ handler.msg_hmac ∨ (len(EAP-Message) > 0)`.
#[derive(Debug, Clone, Copy)]
pub struct ReplyFields {
    pub request_id: u8,
    pub msg_hmac: bool,
}

impl ReplyFields {
    pub fn resolve(request: &RadiusRequest, reply: &RadiusReply) -> Self {
        Self {
            request_id: request.request_id,
            msg_hmac: request.msg_hmac || reply.msg_hmac || !request.eap_message.is_empty(),
        }
    }
}

/// A NAS's declared preference for which worker nodes may run its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerNodes {
    /// Pin execution to the node the listener itself runs on.
    Local,
    /// Execution may happen on any node in this set (subject to
    /// availability reported by the node monitor).
    Nodes(std::collections::HashSet<NodeId>),
}

/// Opaque handler module identifier plus its opaque per-NAS configuration.
#[derive(Debug, Clone)]
pub struct Handler {
    pub module: crate::collaborators::HandlerId,
    pub config: serde_json::Value,
}

/// Properties of a NAS, as sourced from the external NAS registry for a
/// single incoming packet. Copied into the handler worker at spawn time.
#[derive(Debug, Clone)]
pub struct NasProperties {
    pub server_ip: IpAddr,
    pub server_port: u16,
    pub nas_ip: IpAddr,
    pub nas_port: u16,
    pub secret: Vec<u8>,
    pub trace: bool,
    pub handler_nodes: HandlerNodes,
}

/// `(source IP, source port, 1-byte request id)`, unique within the
/// retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub request_id: u8,
}

impl RequestKey {
    pub fn new(src_ip: IpAddr, src_port: u16, request_id: u8) -> Self {
        Self {
            src_ip,
            src_port,
            request_id,
        }
    }
}
