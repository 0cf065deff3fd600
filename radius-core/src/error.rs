// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy.
//!
//! Two distinct error surfaces, matching §7's propagation policy: setup-time
//! failures (`ServerError`, via `thiserror`, the only place this crate
//! returns `Result::Err` out of a running server) and per-packet discard
//! reasons (`DiscardReason`), which are always recovered locally to a
//! counter bump and a trace line, never a process-level failure.

use std::net::SocketAddr;

use crate::collaborators::NodeId;

/// Why a single packet's processing was abandoned without a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    BadPdu,
    UnknownNas,
    NoNodes,
    NoNodesLocal,
    HandlerReturnedNoReply,
    BadReturn(String),
    RemoteHandlerReplyTimeout(NodeId),
    HandlerFailure(String),
    PacketsDropped,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadPdu => write!(f, "bad_pdu"),
            Self::UnknownNas => write!(f, "unknown_nas"),
            Self::NoNodes => write!(f, "no_nodes"),
            Self::NoNodesLocal => write!(f, "no_nodes_local"),
            Self::HandlerReturnedNoReply => write!(f, "handler_returned_noreply"),
            Self::BadReturn(v) => write!(f, "bad_return: {v}"),
            Self::RemoteHandlerReplyTimeout(node) => {
                write!(f, "remote_handler_reply_timeout: {node}")
            }
            Self::HandlerFailure(reason) => write!(f, "handler_failure: {reason}"),
            Self::PacketsDropped => write!(f, "packets_dropped"),
        }
    }
}

impl std::error::Error for DiscardReason {}

/// Setup and lifecycle errors. These are the only failures a `Listener`
/// surfaces as `Result::Err`; everything that happens once the socket is
/// bound and reception has started becomes a `DiscardReason` instead.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("server already running")]
    AlreadyRunning,
}

impl From<crate::config::ConfigError> for ServerError {
    fn from(e: crate::config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
