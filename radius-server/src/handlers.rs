// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reference [`RadiusHandler`] callbacks, registered with
//! [`crate::collaborators::handlers::StaticHandlerRegistry`] in `main.rs`.
//!
//! These exist so the binary answers real RADIUS traffic out of the box;
//! a production deployment replaces them with its own policy (LDAP/SQL
//! authentication, accounting sinks, CoA orchestration, ...) behind the
//! same `RadiusHandler` trait.

use async_trait::async_trait;
use radius_core::{Command, Handler, HandlerOutcome, NasProperties, RadiusHandler, RadiusReply, RadiusRequest};

/// Answers every access/CoA/disconnect request affirmatively. Useful for
/// smoke-testing a NAS integration before wiring real policy.
pub struct AcceptAllHandler;

#[async_trait]
impl RadiusHandler for AcceptAllHandler {
    async fn handle(
        &self,
        request: &RadiusRequest,
        _nas: &NasProperties,
        _handler: &Handler,
    ) -> HandlerOutcome {
        let reply_command = match request.command {
            Command::Request => Command::Accept,
            Command::CoaReq => Command::CoaAck,
            Command::DiscReq => Command::DiscAck,
            other => {
                return HandlerOutcome::BadReturn(format!(
                    "auth.accept-all does not handle {other:?}"
                ))
            }
        };

        HandlerOutcome::Reply(RadiusReply {
            command: reply_command,
            attributes: Vec::new(),
            msg_hmac: false,
        })
    }
}

/// Accepts accounting requests, logs them, and acknowledges. Declines
/// anything that isn't an accounting request rather than silently ignoring
/// the NAS's module/command mismatch.
pub struct AcctLogHandler;

#[async_trait]
impl RadiusHandler for AcctLogHandler {
    async fn handle(
        &self,
        request: &RadiusRequest,
        nas: &NasProperties,
        _handler: &Handler,
    ) -> HandlerOutcome {
        if request.command != Command::AccReq {
            return HandlerOutcome::BadReturn(format!(
                "acct.log-only only handles AccReq, got {:?}",
                request.command
            ));
        }

        tracing::info!(
            nas_ip = %nas.nas_ip,
            request_id = request.request_id,
            attribute_count = request.attributes.len(),
            "accounting record"
        );

        HandlerOutcome::Reply(RadiusReply {
            command: Command::AccResp,
            attributes: Vec::new(),
            msg_hmac: false,
        })
    }
}
