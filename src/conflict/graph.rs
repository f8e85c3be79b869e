//! Serialization graph
//!
//! Directed graph of transactions. An edge u → v means u must precede v in
//! any equivalent serial order. Three dependency kinds produce edges:
//! WR (writer → later reader of that version), WW (previous committer →
//! current writer), RW (previous reader → current writer, the
//! anti-dependency that closes write-skew cycles).
//!
//! Aborted transactions are purged - node and inbound edges - so they never
//! poison later cycle checks. All adjacency uses ordered containers, making
//! traversal order deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The dependency kind that produced an edge.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DependencyKind {
    /// Writer precedes a reader of the version it installed.
    WriteRead,
    /// Committed writer precedes the next writer of the same variable.
    WriteWrite,
    /// Reader precedes a later writer of the variable it read.
    ReadWrite,
}

impl DependencyKind {
    /// Returns the conventional short label.
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::WriteRead => "WR",
            DependencyKind::WriteWrite => "WW",
            DependencyKind::ReadWrite => "RW",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Directed dependency graph over transaction identities.
#[derive(Clone, Debug, Default)]
pub struct SerializationGraph {
    /// node → successor → kinds that justify the edge.
    nodes: BTreeMap<String, BTreeMap<String, BTreeSet<DependencyKind>>>,
}

impl SerializationGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Ensures a node exists for the transaction.
    pub fn ensure_node(&mut self, txn: &str) {
        self.nodes.entry(txn.to_string()).or_default();
    }

    /// Whether the transaction has a node.
    pub fn contains(&self, txn: &str) -> bool {
        self.nodes.contains_key(txn)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Adds an edge `from → to` tagged with the dependency kind. Self-edges
    /// are ignored; both endpoints are created if missing.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: DependencyKind) {
        if from == to {
            return;
        }
        self.ensure_node(to);
        self.nodes
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_default()
            .insert(kind);
    }

    /// The dependency kinds on edge `from → to`, if present.
    pub fn edge_kinds(&self, from: &str, to: &str) -> Option<&BTreeSet<DependencyKind>> {
        self.nodes.get(from)?.get(to)
    }

    /// Removes a node together with every inbound edge.
    pub fn remove_node(&mut self, txn: &str) {
        self.nodes.remove(txn);
        for successors in self.nodes.values_mut() {
            successors.remove(txn);
        }
    }

    /// Successor identities of a node, in deterministic order.
    pub fn successors(&self, txn: &str) -> Vec<&str> {
        self.nodes
            .get(txn)
            .map(|succ| succ.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether any cycle is reachable from `start`.
    ///
    /// Classical DFS with a visited set and a recursion stack; a back-edge
    /// into the stack means a cycle. Starting from the transaction whose
    /// edges just changed suffices: any new cycle must pass through it.
    pub fn has_cycle_from(&self, start: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = BTreeSet::new();
        self.dfs(start, &mut visited, &mut stack)
    }

    fn dfs<'a>(
        &'a self,
        node: &'a str,
        visited: &mut BTreeSet<&'a str>,
        stack: &mut BTreeSet<&'a str>,
    ) -> bool {
        visited.insert(node);
        stack.insert(node);
        for successor in self.successors(node) {
            if stack.contains(successor) {
                return true;
            }
            if !visited.contains(successor) && self.dfs(successor, visited, stack) {
                return true;
            }
        }
        stack.remove(node);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_creates_nodes() {
        let mut graph = SerializationGraph::new();
        graph.add_edge("T1", "T2", DependencyKind::WriteRead);

        assert!(graph.contains("T1"));
        assert!(graph.contains("T2"));
        assert_eq!(graph.successors("T1"), vec!["T2"]);
    }

    #[test]
    fn test_self_edges_ignored() {
        let mut graph = SerializationGraph::new();
        graph.add_edge("T1", "T1", DependencyKind::WriteWrite);
        assert!(graph.successors("T1").is_empty());
    }

    #[test]
    fn test_edge_kinds_accumulate() {
        let mut graph = SerializationGraph::new();
        graph.add_edge("T1", "T2", DependencyKind::WriteRead);
        graph.add_edge("T1", "T2", DependencyKind::ReadWrite);

        let kinds = graph.edge_kinds("T1", "T2").unwrap();
        assert!(kinds.contains(&DependencyKind::WriteRead));
        assert!(kinds.contains(&DependencyKind::ReadWrite));
    }

    #[test]
    fn test_two_node_cycle_detected() {
        let mut graph = SerializationGraph::new();
        graph.add_edge("T1", "T2", DependencyKind::ReadWrite);
        graph.add_edge("T2", "T1", DependencyKind::ReadWrite);

        assert!(graph.has_cycle_from("T1"));
        assert!(graph.has_cycle_from("T2"));
    }

    #[test]
    fn test_chain_is_acyclic() {
        let mut graph = SerializationGraph::new();
        graph.add_edge("T1", "T2", DependencyKind::WriteWrite);
        graph.add_edge("T2", "T3", DependencyKind::WriteRead);

        assert!(!graph.has_cycle_from("T1"));
        assert!(!graph.has_cycle_from("T3"));
    }

    #[test]
    fn test_cycle_not_reachable_from_start() {
        let mut graph = SerializationGraph::new();
        graph.add_edge("T1", "T2", DependencyKind::WriteWrite);
        graph.add_edge("T2", "T1", DependencyKind::ReadWrite);
        graph.ensure_node("T3");
        graph.add_edge("T1", "T3", DependencyKind::WriteRead);

        // T3 has no outgoing edges; no cycle is reachable from it.
        assert!(!graph.has_cycle_from("T3"));
    }

    #[test]
    fn test_remove_node_drops_inbound_edges() {
        let mut graph = SerializationGraph::new();
        graph.add_edge("T1", "T2", DependencyKind::ReadWrite);
        graph.add_edge("T2", "T1", DependencyKind::ReadWrite);
        graph.remove_node("T2");

        assert!(!graph.contains("T2"));
        assert!(graph.successors("T1").is_empty());
        assert!(!graph.has_cycle_from("T1"));
    }

    #[test]
    fn test_longer_cycle_detected() {
        let mut graph = SerializationGraph::new();
        graph.add_edge("T1", "T2", DependencyKind::WriteWrite);
        graph.add_edge("T2", "T3", DependencyKind::ReadWrite);
        graph.add_edge("T3", "T1", DependencyKind::WriteRead);

        assert!(graph.has_cycle_from("T3"));
    }
}
