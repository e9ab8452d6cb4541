//! Graph index
//!
//! Builds the lookup structures the engine traverses: node-by-id and
//! ordered edges-by-source. Built once at engine construction; read-only
//! thereafter. Dangling edge targets are tolerated here and surface as
//! resolution failures when actually traversed.

use std::collections::{HashMap, HashSet};

use crate::workflow::{Edge, Node, WorkflowDefinition, DEFAULT_OUTPUT};

#[derive(Debug)]
pub struct GraphIndex {
    /// Nodes in declaration order (fallback start node, stable tie-breaks)
    nodes: Vec<Node>,

    /// Node id -> index into `nodes`
    by_id: HashMap<String, usize>,

    /// Source node id -> outgoing edges in declaration order
    edges_by_source: HashMap<String, Vec<Edge>>,
}

impl GraphIndex {
    pub fn build(definition: &WorkflowDefinition) -> Self {
        let nodes = definition.steps.nodes.clone();

        let by_id = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let mut edges_by_source: HashMap<String, Vec<Edge>> = HashMap::new();
        for edge in &definition.steps.edges {
            edges_by_source
                .entry(edge.source.clone())
                .or_default()
                .push(edge.clone());
        }

        Self {
            nodes,
            by_id,
            edges_by_source,
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    /// All nodes in declaration order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Outgoing edges of a node, in declaration order
    pub fn outgoing(&self, source: &str) -> &[Edge] {
        self.edges_by_source
            .get(source)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Select the entry node for a run.
    ///
    /// Precedence: nodes with no incoming edges ("roots"), preferring the
    /// trigger family, ties broken by ascending editor `position.x`; if the
    /// graph has no roots at all (cyclic or malformed) the first declared
    /// node is used rather than failing the run. Returns `None` only for an
    /// empty node list.
    pub fn select_start_node(&self) -> Option<&Node> {
        let targets: HashSet<&str> = self
            .edges_by_source
            .values()
            .flatten()
            .map(|e| e.target.as_str())
            .collect();

        let roots: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|n| !targets.contains(n.id.as_str()))
            .collect();

        if roots.is_empty() {
            return self.nodes.first();
        }

        let triggers: Vec<&Node> = roots.iter().copied().filter(|n| n.is_trigger()).collect();
        let candidates = if triggers.is_empty() { roots } else { triggers };

        // min_by keeps the first candidate on equal x, so declaration order
        // settles exact ties
        candidates
            .into_iter()
            .min_by(|a, b| a.position.x.total_cmp(&b.position.x))
    }

    /// Resolve the node a completed step transitions to.
    ///
    /// Edge matching: exact handle match, then (for non-default outputs) an
    /// edge whose handle is the default label or unset, then the first
    /// outgoing edge regardless of handle. `None` means no route exists —
    /// the normal "workflow is finished" signal, not an error. A dangling
    /// edge target also resolves to `None`.
    pub fn resolve_next(&self, current: &str, output: &str) -> Option<&Node> {
        let edges = self.outgoing(current);
        if edges.is_empty() {
            return None;
        }

        let exact = edges
            .iter()
            .find(|e| e.source_handle.as_deref() == Some(output));

        let fallback = if exact.is_none() && output != DEFAULT_OUTPUT {
            edges.iter().find(|e| {
                e.source_handle.is_none() || e.source_handle.as_deref() == Some(DEFAULT_OUTPUT)
            })
        } else {
            None
        };

        let edge = exact.or(fallback).or_else(|| edges.first())?;
        self.node(&edge.target)
    }
}
