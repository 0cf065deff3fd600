// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatcher (§4.3): a pure function from "who's advertising this
//! handler module" + "what this NAS allows" to a single node selection.
//!
//! Deliberately free of I/O and `async`: the worker calls this once per
//! request and acts on the result, which keeps it trivial to unit-test for
//! fairness without touching a runtime.

use std::collections::HashSet;

use rand::Rng;

use crate::collaborators::NodeId;
use crate::error::DiscardReason;
use crate::packet::HandlerNodes;

/// The node the worker should run the handler on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Node(NodeId),
    Discard(DiscardReason),
}

/// Select a node for this request.
///
/// `candidates` is the set of nodes currently advertising the handler
/// module (from the node monitor); `preference` is the NAS's
/// `handler_nodes` setting; `local_node` is this listener's own identity.
///
/// See §9: a preference set that intersects the candidate set to nothing
/// is treated as `no_nodes` (the source leaves this branch undefined), and
/// the `no_nodes` / `no_nodes_local` reasons both map to the
/// `discardNoHandler` counter at the call site.
pub fn dispatch(
    candidates: &HashSet<NodeId>,
    preference: &HandlerNodes,
    local_node: &NodeId,
) -> DispatchOutcome {
    if candidates.is_empty() {
        return DispatchOutcome::Discard(DiscardReason::NoNodes);
    }

    match preference {
        HandlerNodes::Local => {
            if candidates.contains(local_node) {
                DispatchOutcome::Node(local_node.clone())
            } else {
                DispatchOutcome::Discard(DiscardReason::NoNodesLocal)
            }
        }
        HandlerNodes::Nodes(preferred) => {
            let eligible: Vec<&NodeId> =
                candidates.iter().filter(|n| preferred.contains(*n)).collect();

            match eligible.len() {
                0 => DispatchOutcome::Discard(DiscardReason::NoNodes),
                1 => DispatchOutcome::Node(eligible[0].clone()),
                n => {
                    let idx = rand::thread_rng().gen_range(0..n);
                    DispatchOutcome::Node(eligible[idx].clone())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(names: &[&str]) -> HashSet<NodeId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_candidates_discards_no_nodes() {
        let result = dispatch(&HashSet::new(), &HandlerNodes::Local, &"n1".to_string());
        assert_eq!(result, DispatchOutcome::Discard(DiscardReason::NoNodes));
    }

    #[test]
    fn test_local_preference_present() {
        let candidates = nodes(&["n1", "n2"]);
        let result = dispatch(&candidates, &HandlerNodes::Local, &"n1".to_string());
        assert_eq!(result, DispatchOutcome::Node("n1".to_string()));
    }

    #[test]
    fn test_local_preference_absent() {
        let candidates = nodes(&["n2"]);
        let result = dispatch(&candidates, &HandlerNodes::Local, &"n1".to_string());
        assert_eq!(
            result,
            DispatchOutcome::Discard(DiscardReason::NoNodesLocal)
        );
    }

    #[test]
    fn test_single_candidate_in_preference_set() {
        let candidates = nodes(&["n1", "n2"]);
        let preference = HandlerNodes::Nodes(nodes(&["n2"]));
        let result = dispatch(&candidates, &preference, &"n1".to_string());
        assert_eq!(result, DispatchOutcome::Node("n2".to_string()));
    }

    #[test]
    fn test_empty_intersection_discards_no_nodes() {
        let candidates = nodes(&["n1"]);
        let preference = HandlerNodes::Nodes(nodes(&["n2", "n3"]));
        let result = dispatch(&candidates, &preference, &"n1".to_string());
        assert_eq!(result, DispatchOutcome::Discard(DiscardReason::NoNodes));
    }

    #[test]
    fn test_dispatch_fairness_across_many_nodes() {
        let candidates = nodes(&["n1", "n2", "n3", "n4"]);
        let preference = HandlerNodes::Nodes(candidates.clone());
        let local = "local".to_string();

        let mut counts: std::collections::HashMap<NodeId, u32> = std::collections::HashMap::new();
        const TRIALS: u32 = 4000;
        for _ in 0..TRIALS {
            if let DispatchOutcome::Node(n) = dispatch(&candidates, &preference, &local) {
                *counts.entry(n).or_insert(0) += 1;
            }
        }

        assert_eq!(counts.len(), 4, "every node should be selected at least once");
        let expected = TRIALS as f64 / 4.0;
        for count in counts.values() {
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(
                deviation < 0.2,
                "node selection frequency too skewed: {count} vs expected ~{expected}"
            );
        }
    }
}
