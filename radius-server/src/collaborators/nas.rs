// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory [`NasRegistry`] loaded once from a JSON file at startup.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::path::Path;

use async_trait::async_trait;
use radius_core::{Handler, HandlerNodes, NasProperties, NasRegistry};
use serde::Deserialize;

/// One NAS entry as it appears in the `--nas-file` JSON document.
#[derive(Debug, Clone, Deserialize)]
struct NasFileEntry {
    nas_ip: IpAddr,
    #[serde(default)]
    nas_port: u16,
    secret: String,
    #[serde(default)]
    trace: bool,
    handler_module: String,
    #[serde(default)]
    handler_config: serde_json::Value,
    /// Either the string `"local"` or an explicit list of node ids.
    #[serde(default = "default_handler_nodes")]
    handler_nodes: HandlerNodesSpec,
}

fn default_handler_nodes() -> HandlerNodesSpec {
    HandlerNodesSpec::Local("local".to_string())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum HandlerNodesSpec {
    Local(String),
    Nodes(Vec<String>),
}

impl From<HandlerNodesSpec> for HandlerNodes {
    fn from(spec: HandlerNodesSpec) -> Self {
        match spec {
            HandlerNodesSpec::Local(_) => HandlerNodes::Local,
            HandlerNodesSpec::Nodes(nodes) => {
                HandlerNodes::Nodes(nodes.into_iter().collect::<HashSet<_>>())
            }
        }
    }
}

/// Keyed by NAS source IP only, per §6: one server process serves requests
/// for a single `(listen_ip, listen_port)` pair, so the lookup key doesn't
/// need to carry those back.
pub struct InMemoryNasRegistry {
    entries: HashMap<IpAddr, (Handler, NasProperties)>,
}

impl InMemoryNasRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let raw: Vec<NasFileEntry> = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut entries = HashMap::with_capacity(raw.len());
        for entry in raw {
            let nas_ip = entry.nas_ip;
            let properties = NasProperties {
                server_ip: "0.0.0.0".parse().unwrap(),
                server_port: 0,
                nas_ip,
                nas_port: entry.nas_port,
                secret: entry.secret.into_bytes(),
                trace: entry.trace,
                handler_nodes: entry.handler_nodes.into(),
            };
            let handler = Handler {
                module: entry.handler_module,
                config: entry.handler_config,
            };
            entries.insert(nas_ip, (handler, properties));
        }

        Ok(Self { entries })
    }
}

#[async_trait]
impl NasRegistry for InMemoryNasRegistry {
    async fn lookup(
        &self,
        listen_ip: IpAddr,
        listen_port: u16,
        nas_ip: IpAddr,
    ) -> Option<(Handler, NasProperties)> {
        self.entries.get(&nas_ip).map(|(handler, properties)| {
            let mut properties = properties.clone();
            properties.server_ip = listen_ip;
            properties.server_port = listen_port;
            (handler.clone(), properties)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_lookup_unknown_nas_returns_none() {
        let registry = InMemoryNasRegistry::empty();
        let result = registry
            .lookup(
                "0.0.0.0".parse().unwrap(),
                1812,
                "10.0.0.5".parse().unwrap(),
            )
            .await;
        assert!(result.is_none());
    }

    #[test]
    fn test_from_file_parses_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{
                "nas_ip": "10.0.0.5",
                "secret": "testing123",
                "handler_module": "auth.accept-all",
                "handler_nodes": "local"
            }}]"#
        )
        .unwrap();

        let registry = InMemoryNasRegistry::from_file(file.path()).unwrap();
        assert_eq!(registry.entries.len(), 1);
        let (handler, properties) = registry.entries.get(&"10.0.0.5".parse().unwrap()).unwrap();
        assert_eq!(handler.module, "auth.accept-all");
        assert_eq!(properties.secret, b"testing123");
        assert_eq!(properties.handler_nodes, HandlerNodes::Local);
    }
}
