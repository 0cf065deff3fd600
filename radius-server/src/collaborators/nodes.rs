// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`NodeMonitor`] reference implementation for a single-process deployment:
//! there is exactly one worker node (this process), and it advertises every
//! handler module the [`crate::handlers::HandlerRegistry`] knows about.

use std::collections::HashSet;

use async_trait::async_trait;
use radius_core::{HandlerId, NodeId, NodeMonitor};

pub struct SingleNodeMonitor {
    local: NodeId,
}

impl SingleNodeMonitor {
    pub fn new(local: NodeId) -> Self {
        Self { local }
    }
}

#[async_trait]
impl NodeMonitor for SingleNodeMonitor {
    async fn nodes_for(&self, _module: &HandlerId) -> HashSet<NodeId> {
        let mut set = HashSet::with_capacity(1);
        set.insert(self.local.clone());
        set
    }

    fn local_node(&self) -> NodeId {
        self.local.clone()
    }
}
