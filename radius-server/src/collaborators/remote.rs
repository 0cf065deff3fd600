// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reference [`RemoteExecutor`] for a single-process deployment.
//!
//! Proxying a request to another worker node's RPC transport is out of
//! scope per §1's non-goals, so there is no real implementation to provide
//! here: `--nas-file` entries should stick to `"handler_nodes": "local"` (or
//! omit it, which defaults the same way) until a host application supplies
//! its own `RemoteExecutor` wired to whatever cluster transport it runs.

use async_trait::async_trait;
use radius_core::{DiscardReason, NasProperties, NodeId, RadiusReply, RadiusRequest, RemoteExecutor};

/// Always reports `no_nodes`, as if the candidate node never actually
/// advertised the module: for this binary, there is no transport
/// behind it to advertise one.
pub struct UnreachableRemoteExecutor;

#[async_trait]
impl RemoteExecutor for UnreachableRemoteExecutor {
    async fn invoke(
        &self,
        _node: &NodeId,
        _request: &RadiusRequest,
        _nas: &NasProperties,
    ) -> Result<RadiusReply, DiscardReason> {
        Err(DiscardReason::NoNodes)
    }
}
