// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::node::NodeId;
use crate::dag::schema::Schema;

/// Topology of a dag plus the slot labels attached to its edges.
///
/// Vertices are [`NodeId`] handles. Slot labels are kept per successor:
/// `successor -> { predecessor -> label }`. Cloning yields a fully
/// independent copy of both.
#[derive(Debug, Clone)]
pub struct DagGraph {
    graph: DiGraphMap<NodeId, ()>,
    slots: HashMap<NodeId, HashMap<NodeId, String>>,
}

impl Default for DagGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DagGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraphMap::new(),
            slots: HashMap::new(),
        }
    }

    pub fn from_schema(schema: &Schema) -> Self {
        let mut graph = Self::new();
        graph.define(schema);
        graph
    }

    /// Rebuild the graph from scratch.
    ///
    /// Nodes referenced only as children are created implicitly. Cycles are
    /// accepted here and only rejected when a run starts.
    pub fn define(&mut self, schema: &Schema) {
        self.graph.clear();
        self.slots.clear();

        for (parent, children) in schema.iter() {
            let edges = children.edges();
            if edges.is_empty() {
                self.graph.add_node(parent);
                continue;
            }

            for (child, label) in edges {
                self.graph.add_edge(parent, child, ());
                if let Some(label) = label {
                    self.set_slot(child, parent, label);
                }
            }
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.graph.contains_node(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.nodes()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_edge(&self, parent: NodeId, child: NodeId) -> bool {
        self.graph.contains_edge(parent, child)
    }

    /// Direct predecessors, in edge insertion order.
    pub fn predecessors(&self, node: NodeId) -> Vec<NodeId> {
        if !self.contains(node) {
            return Vec::new();
        }
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .collect()
    }

    /// Direct successors, in edge insertion order.
    pub fn successors(&self, node: NodeId) -> Vec<NodeId> {
        if !self.contains(node) {
            return Vec::new();
        }
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect()
    }

    /// Slot label of the `predecessor -> successor` edge, if any.
    pub fn slot(&self, successor: NodeId, predecessor: NodeId) -> Option<&str> {
        self.slots
            .get(&successor)
            .and_then(|by_pred| by_pred.get(&predecessor))
            .map(|s| s.as_str())
    }

    /// Attach (or replace) a slot label. An empty label removes it.
    pub fn set_slot(&mut self, successor: NodeId, predecessor: NodeId, label: &str) {
        if label.is_empty() {
            if let Some(by_pred) = self.slots.get_mut(&successor) {
                by_pred.remove(&predecessor);
            }
            return;
        }
        self.slots
            .entry(successor)
            .or_default()
            .insert(predecessor, label.to_string());
    }

    /// Topological order of all nodes, or the node at which a cycle was found.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, NodeId> {
        toposort(&self.graph, None).map_err(|cycle| cycle.node_id())
    }
}
