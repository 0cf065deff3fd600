// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`HandlerRegistry`] reference implementation: a static map from module
//! name to the `RadiusHandler` callback that implements it, built once at
//! startup from `main.rs`'s `--nas-file`-independent handler wiring.

use std::collections::HashMap;
use std::sync::Arc;

use radius_core::{HandlerId, HandlerRegistry, RadiusHandler};

#[derive(Default)]
pub struct StaticHandlerRegistry {
    modules: HashMap<HandlerId, Arc<dyn RadiusHandler>>,
}

impl StaticHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: impl Into<HandlerId>, handler: Arc<dyn RadiusHandler>) {
        self.modules.insert(module.into(), handler);
    }
}

impl HandlerRegistry for StaticHandlerRegistry {
    fn resolve(&self, module: &HandlerId) -> Option<Arc<dyn RadiusHandler>> {
        self.modules.get(module).cloned()
    }
}
