// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RADIUS (RFC 2865/2866/3576) server core.
//!
//! This crate owns the protocol-agnostic state machine: a UDP listener that
//! de-duplicates requests, dispatches each one to a handler module on a
//! local or remote worker node, and retains replies for retransmission.
//! Everything protocol-specific or deployment-specific (RADIUS attribute
//! encoding, NAS configuration storage, node membership, rate limiting, and
//! the handler callbacks themselves) is a trait object supplied by the host
//! application (see [`collaborators`]).

pub mod collaborators;
pub mod config;
pub mod counters;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod packet;
pub mod transaction;
pub mod worker;

pub use collaborators::{
    AdmissionQueue, HandlerId, HandlerRegistry, NasRegistry, NodeId, NodeMonitor, PacketCodec,
    RadiusHandler, RemoteExecutor, RequestLogEvent, RequestLogger, Token,
};
pub use config::{ConfigError, RateLimitConfig, ServerConfig};
pub use counters::{CounterSnapshot, ServerCounters, StatsKind};
pub use error::{DiscardReason, ServerError};
pub use listener::{Collaborators, Listener};
pub use packet::{
    Avp, Command, Handler, HandlerNodes, HandlerOutcome, NasProperties, RadiusReply,
    RadiusRequest, ReplyFields, RequestKey,
};
