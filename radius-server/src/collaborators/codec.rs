// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Minimal RFC 2865/2866/3576 wire codec.
//!
//! The core never inspects attribute bytes itself; this is the one place
//! that parses and reassembles a RADIUS datagram. Attribute values are kept
//! opaque (type octet + raw payload); policy handlers decide what to make
//! of them.

use md5::{Digest, Md5};
use radius_core::{
    Avp, Command, DiscardReason, PacketCodec, RadiusReply, RadiusRequest, ReplyFields,
};

const HEADER_LEN: usize = 20;
const MSG_AUTHENTICATOR_TYPE: u8 = 80;
const EAP_MESSAGE_TYPE: u8 = 79;

fn code_to_command(code: u8) -> Option<Command> {
    match code {
        1 => Some(Command::Request),
        2 => Some(Command::Accept),
        3 => Some(Command::Reject),
        4 => Some(Command::AccReq),
        5 => Some(Command::AccResp),
        11 => Some(Command::Challenge),
        40 => Some(Command::DiscReq),
        41 => Some(Command::DiscAck),
        42 => Some(Command::DiscNak),
        43 => Some(Command::CoaReq),
        44 => Some(Command::CoaAck),
        45 => Some(Command::CoaNak),
        _ => None,
    }
}

fn command_to_code(command: Command) -> u8 {
    match command {
        Command::Request => 1,
        Command::Accept => 2,
        Command::Reject => 3,
        Command::AccReq => 4,
        Command::AccResp => 5,
        Command::Challenge => 11,
        Command::DiscReq => 40,
        Command::DiscAck => 41,
        Command::DiscNak => 42,
        Command::CoaReq => 43,
        Command::CoaAck => 44,
        Command::CoaNak => 45,
    }
}

fn parse_attributes(bytes: &[u8]) -> Result<Vec<Avp>, DiscardReason> {
    let mut attrs = Vec::new();
    let mut cursor = 0usize;
    while cursor < bytes.len() {
        if cursor + 2 > bytes.len() {
            return Err(DiscardReason::BadPdu);
        }
        let attr_type = bytes[cursor];
        let attr_len = bytes[cursor + 1] as usize;
        if attr_len < 2 || cursor + attr_len > bytes.len() {
            return Err(DiscardReason::BadPdu);
        }
        let value = bytes[cursor + 2..cursor + attr_len].to_vec();
        attrs.push((attr_type, value));
        cursor += attr_len;
    }
    Ok(attrs)
}

fn encode_attributes(attrs: &[Avp]) -> Vec<u8> {
    let mut out = Vec::new();
    for (attr_type, value) in attrs {
        out.push(*attr_type);
        out.push((value.len() + 2) as u8);
        out.extend_from_slice(value);
    }
    out
}

/// A minimal, dependency-light RADIUS attribute codec good enough to run
/// the reference server end to end. It is not a complete RFC 2865 dictionary
/// implementation (no vendor-specific attribute parsing, no password
/// encryption/decryption); that's left to the handler callbacks, which see
/// the raw attribute list.
pub struct MinimalRadiusCodec;

impl MinimalRadiusCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MinimalRadiusCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketCodec for MinimalRadiusCodec {
    fn decode(&self, bytes: &[u8], secret: &[u8]) -> Result<RadiusRequest, DiscardReason> {
        if bytes.len() < HEADER_LEN {
            return Err(DiscardReason::BadPdu);
        }

        let code = bytes[0];
        let request_id = bytes[1];
        let declared_len = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        if declared_len < HEADER_LEN || declared_len > bytes.len() {
            return Err(DiscardReason::BadPdu);
        }

        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&bytes[4..20]);

        let command = code_to_command(code).ok_or(DiscardReason::BadPdu)?;
        let attributes = parse_attributes(&bytes[HEADER_LEN..declared_len])?;

        let msg_hmac = attributes.iter().any(|(t, _)| *t == MSG_AUTHENTICATOR_TYPE);
        let eap_message: Vec<u8> = attributes
            .iter()
            .filter(|(t, _)| *t == EAP_MESSAGE_TYPE)
            .flat_map(|(_, v)| v.iter().copied())
            .collect();

        Ok(RadiusRequest {
            request_id,
            command,
            attributes,
            secret: secret.to_vec(),
            authenticator,
            msg_hmac,
            eap_message,
        })
    }

    fn encode_reply(&self, request: &RadiusRequest, reply: &RadiusReply, fields: ReplyFields) -> Vec<u8> {
        let mut attributes = reply.attributes.clone();
        if fields.msg_hmac && !attributes.iter().any(|(t, _)| *t == MSG_AUTHENTICATOR_TYPE) {
            attributes.push((MSG_AUTHENTICATOR_TYPE, vec![0u8; 16]));
        }

        let body = encode_attributes(&attributes);
        let total_len = HEADER_LEN + body.len();

        let mut out = Vec::with_capacity(total_len);
        out.push(command_to_code(reply.command));
        out.push(fields.request_id);
        out.extend_from_slice(&(total_len as u16).to_be_bytes());
        out.extend_from_slice(&[0u8; 16]); // placeholder, filled in below
        out.extend_from_slice(&body);

        // RFC 2865 §3 response authenticator:
        // MD5(code + id + length + request-authenticator + attributes + secret)
        let mut hasher = Md5::new();
        hasher.update([out[0], out[1]]);
        hasher.update(&out[2..4]);
        hasher.update(request.authenticator);
        hasher.update(&body);
        hasher.update(&request.secret);
        let digest = hasher.finalize();
        out[4..20].copy_from_slice(&digest);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request_bytes(code: u8, id: u8) -> Vec<u8> {
        let mut bytes = vec![code, id, 0, 0];
        bytes.extend_from_slice(&[7u8; 16]);
        let len = bytes.len() as u16;
        bytes[2..4].copy_from_slice(&len.to_be_bytes());
        bytes
    }

    #[test]
    fn test_decode_rejects_short_datagram() {
        let codec = MinimalRadiusCodec::new();
        let result = codec.decode(&[1, 2], b"secret");
        assert_eq!(result.unwrap_err(), DiscardReason::BadPdu);
    }

    #[test]
    fn test_decode_rejects_unknown_code() {
        let codec = MinimalRadiusCodec::new();
        let bytes = make_request_bytes(200, 5);
        assert_eq!(codec.decode(&bytes, b"secret").unwrap_err(), DiscardReason::BadPdu);
    }

    #[test]
    fn test_decode_access_request_round_trip() {
        let codec = MinimalRadiusCodec::new();
        let bytes = make_request_bytes(1, 42);
        let request = codec.decode(&bytes, b"secret").unwrap();
        assert_eq!(request.request_id, 42);
        assert_eq!(request.command, Command::Request);
        assert!(request.attributes.is_empty());
        assert!(!request.msg_hmac);
    }

    #[test]
    fn test_encode_reply_sets_code_and_id() {
        let codec = MinimalRadiusCodec::new();
        let bytes = make_request_bytes(1, 42);
        let request = codec.decode(&bytes, b"shared-secret").unwrap();
        let reply = RadiusReply {
            command: Command::Accept,
            attributes: vec![],
            msg_hmac: false,
        };
        let fields = ReplyFields::resolve(&request, &reply);
        let encoded = codec.encode_reply(&request, &reply, fields);
        assert_eq!(encoded[0], 2); // Access-Accept
        assert_eq!(encoded[1], 42);
    }
}
