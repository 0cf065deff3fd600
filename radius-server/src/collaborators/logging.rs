// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`RequestLogger`] reference implementation on top of `tracing`. Per §7,
//! every event is written at `debug`, regardless of the NAS's `trace` flag:
//! the worker already gates its own `info`-level trace lines on that flag
//! (see `radius_core::worker`), so this collaborator just needs to record
//! what happened for whoever's watching the log stream.

use radius_core::{RequestKey, RequestLogEvent, RequestLogger};

pub struct TracingRequestLogger;

impl RequestLogger for TracingRequestLogger {
    fn write_request(&self, key: &RequestKey, event: RequestLogEvent<'_>) {
        match event {
            RequestLogEvent::Received(request) => tracing::debug!(
                nas_ip = %key.src_ip,
                nas_port = key.src_port,
                request_id = key.request_id,
                command = ?request.command,
                "request received"
            ),
            RequestLogEvent::Replied(reply) => tracing::debug!(
                nas_ip = %key.src_ip,
                nas_port = key.src_port,
                request_id = key.request_id,
                command = ?reply.command,
                "reply sent"
            ),
            RequestLogEvent::Discarded(reason) => tracing::debug!(
                nas_ip = %key.src_ip,
                nas_port = key.src_port,
                request_id = key.request_id,
                reason = %reason,
                "request discarded"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radius_core::{Command, RadiusReply};

    #[test]
    fn test_write_request_does_not_panic_on_any_event() {
        let logger = TracingRequestLogger;
        let key = RequestKey::new("10.0.0.5".parse().unwrap(), 1700, 7);

        logger.write_request(
            &key,
            RequestLogEvent::Replied(&RadiusReply {
                command: Command::Accept,
                attributes: vec![],
                msg_hmac: false,
            }),
        );
        logger.write_request(
            &key,
            RequestLogEvent::Discarded(&radius_core::DiscardReason::HandlerReturnedNoReply),
        );
    }
}
