// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Server configuration.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Admission-control (rate limiter) configuration, handed to whatever
/// `AdmissionQueue` the host application wires in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of tokens the queue can hold at once.
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Tokens restored per second.
    #[serde(default = "default_refill_per_sec")]
    pub refill_per_sec: u32,
}

fn default_capacity() -> u32 {
    1000
}

fn default_refill_per_sec() -> u32 {
    500
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_per_sec: default_refill_per_sec(),
        }
    }
}

/// RADIUS server core configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0).
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// UDP port to listen on (default: 1812, the RFC 2865 auth port).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Reply retention window, in milliseconds (default 5000).
    #[serde(default = "default_resend_timeout_ms")]
    pub resend_timeout_ms: u64,

    /// Hard timeout on a remote handler RPC, in milliseconds (default 15000).
    #[serde(default = "default_remote_reply_timeout_ms")]
    pub remote_reply_timeout_ms: u64,

    /// Number of retransmissions served per retained reply (default 3).
    #[serde(default = "default_resend_retries")]
    pub resend_retries: u8,

    /// Maximum accepted datagram size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    /// Admission queue (rate limiter) configuration.
    #[serde(default)]
    pub rate_config: RateLimitConfig,
}

fn default_bind_address() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    1812
}

fn default_resend_timeout_ms() -> u64 {
    5000
}

fn default_remote_reply_timeout_ms() -> u64 {
    15_000
}

fn default_resend_retries() -> u8 {
    3
}

fn default_max_message_size() -> usize {
    4096
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            resend_timeout_ms: default_resend_timeout_ms(),
            remote_reply_timeout_ms: default_remote_reply_timeout_ms(),
            resend_retries: default_resend_retries(),
            max_message_size: default_max_message_size(),
            rate_config: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    pub fn resend_timeout(&self) -> Duration {
        Duration::from_millis(self.resend_timeout_ms)
    }

    pub fn remote_reply_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_reply_timeout_ms)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port cannot be 0".into()));
        }
        if self.resend_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "resend_timeout_ms cannot be 0".into(),
            ));
        }
        if self.remote_reply_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "remote_reply_timeout_ms cannot be 0".into(),
            ));
        }
        if self.max_message_size < 2 {
            return Err(ConfigError::InvalidValue(
                "max_message_size must allow at least 2 bytes (request id)".into(),
            ));
        }
        if self.rate_config.capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "rate_config.capacity cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 1812);
        assert_eq!(config.resend_timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trip_json() {
        let config = ServerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.port, parsed.port);
        assert_eq!(config.rate_config.capacity, parsed.rate_config.capacity);
    }

    #[test]
    fn test_validation_port_zero() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_capacity() {
        let config = ServerConfig {
            rate_config: RateLimitConfig {
                capacity: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resend_timeout_duration() {
        let config = ServerConfig {
            resend_timeout_ms: 2500,
            ..Default::default()
        };
        assert_eq!(config.resend_timeout(), Duration::from_millis(2500));
    }
}
