use crate::{Color, Edge, EdgeId, EventType, GraphEvent, IdGenerator, Node, NodeId};
use anyhow::{anyhow, Result};
use log::debug;

/// Authoritative node and edge collections observed by the renderer
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Nodes in insertion order
    nodes: Vec<Node>,

    /// Edges in insertion order
    edges: Vec<Edge>,

    /// Tracks every id that has been inserted so none is reissued
    ids: IdGenerator,

    /// Mutation history, unbounded until drained with `take_events`
    events: Vec<GraphEvent>,
}

impl GraphStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing collections (edges are taken as given)
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        let mut store = Self::new();
        for node in nodes {
            store.add_node(node)?;
        }
        for edge in edges {
            store.add_edge(edge)?;
        }
        Ok(store)
    }

    // ========== Node Operations ==========

    /// Insert a node. Its id must not already be present.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.contains_node(node.id) {
            return Err(anyhow!("Node already exists: {}", node.id));
        }

        debug!("store: add node {} ({:?})", node.id, node.label);
        self.ids.observe(node.id);
        self.log_event(EventType::NodeAdded { node: node.clone() });
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node together with every edge incident to it.
    ///
    /// Both removals happen before this returns, so no caller can observe an
    /// edge pointing at the removed node. Absent ids are a no-op.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<Edge>)> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);

        let mut cascaded_edges = Vec::new();
        self.edges.retain(|edge| {
            if edge.involves(id) {
                cascaded_edges.push(*edge);
                false
            } else {
                true
            }
        });

        debug!(
            "store: remove node {} with {} incident edge(s)",
            id,
            cascaded_edges.len()
        );

        self.log_event(EventType::NodeRemoved {
            node: node.clone(),
            cascaded_edges: cascaded_edges.clone(),
        });

        Some((node, cascaded_edges))
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Id of the most recently inserted node still present
    pub fn last_node_id(&self) -> Option<NodeId> {
        self.nodes.last().map(|n| n.id)
    }

    /// Overwrite a node's label
    pub fn update_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        let new_label = label.into();
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;

        let old_label = std::mem::replace(&mut node.label, new_label.clone());

        self.log_event(EventType::NodeLabelChanged {
            id,
            old_label,
            new_label,
        });

        Ok(())
    }

    /// Overwrite a node's color
    pub fn update_color(&mut self, id: NodeId, color: Option<Color>) -> Result<()> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;

        let old_color = node.color;
        node.set_color(color);

        self.log_event(EventType::NodeColorChanged {
            id,
            old_color,
            new_color: color,
        });

        Ok(())
    }

    // ========== Edge Operations ==========

    /// Insert an edge as given; endpoint checks belong to the caller.
    /// Its id must not already be present.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if self.get_edge(edge.id).is_some() {
            return Err(anyhow!("Edge already exists: {}", edge.id));
        }

        debug!("store: add edge {} ({} -> {})", edge.id, edge.from, edge.to);
        self.log_event(EventType::EdgeAdded { edge });
        self.edges.push(edge);
        Ok(())
    }

    /// Remove an edge. Absent ids are a no-op.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        let edge = self.edges.remove(index);

        debug!("store: remove edge {}", id);
        self.log_event(EventType::EdgeRemoved { id });

        Some(edge)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges with `id` at either end
    pub fn incident_edges(&self, id: NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.involves(id)).collect()
    }

    // ========== Counts & Ids ==========

    /// Number of nodes
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id bookkeeping used by the assignment policy
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    // ========== Event Log ==========

    fn log_event(&mut self, event: EventType) {
        self.events.push(GraphEvent::new(event));
    }

    /// Mutation history since the store was created or last drained
    pub fn events(&self) -> &[GraphEvent] {
        &self.events
    }

    /// Drain the mutation history. The log keeps every event until this is
    /// called.
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }
}
