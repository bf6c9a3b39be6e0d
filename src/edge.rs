use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of an edge (sortable, timestamp-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub Ulid);

impl EdgeId {
    pub fn new() -> Self {
        EdgeId(Ulid::new())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directed connection between two nodes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Edge {
    pub id: EdgeId,

    /// Source node
    pub from: NodeId,

    /// Destination node
    pub to: NodeId,
}

impl Edge {
    /// Create an edge with a freshly minted id
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            id: EdgeId::new(),
            from,
            to,
        }
    }

    /// Check if this edge touches a given node at either end
    pub fn involves(&self, node_id: NodeId) -> bool {
        self.from == node_id || self.to == node_id
    }

    pub fn starts_from(&self, node_id: NodeId) -> bool {
        self.from == node_id
    }

    pub fn ends_at(&self, node_id: NodeId) -> bool {
        self.to == node_id
    }
}

/// Edge data as offered by a toolbar or canvas gesture.
///
/// The id is optional; one is minted when the descriptor becomes an [`Edge`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EdgeId>,
    pub from: NodeId,
    pub to: NodeId,
}

impl EdgeDescriptor {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { id: None, from, to }
    }

    pub fn with_id(id: EdgeId, from: NodeId, to: NodeId) -> Self {
        Self {
            id: Some(id),
            from,
            to,
        }
    }

    /// Turn the descriptor into an edge, keeping the supplied id if any
    pub fn into_edge(self) -> Edge {
        Edge {
            id: self.id.unwrap_or_default(),
            from: self.from,
            to: self.to,
        }
    }
}

impl From<Edge> for EdgeDescriptor {
    fn from(edge: Edge) -> Self {
        EdgeDescriptor::with_id(edge.id, edge.from, edge.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_involves() {
        let edge = Edge::new(NodeId(1), NodeId(2));

        assert!(edge.involves(NodeId(1)));
        assert!(edge.involves(NodeId(2)));
        assert!(!edge.involves(NodeId(3)));
        assert!(edge.starts_from(NodeId(1)));
        assert!(edge.ends_at(NodeId(2)));
    }

    #[test]
    fn test_descriptor_keeps_supplied_id() {
        let id = EdgeId::new();
        let edge = EdgeDescriptor::with_id(id, NodeId(0), NodeId(1)).into_edge();
        assert_eq!(edge.id, id);
    }

    #[test]
    fn test_descriptor_mints_distinct_ids() {
        let descriptor = EdgeDescriptor::new(NodeId(0), NodeId(1));
        assert_ne!(descriptor.into_edge().id, descriptor.into_edge().id);
    }

    #[test]
    fn test_descriptor_without_id_deserializes() {
        let descriptor: EdgeDescriptor = serde_json::from_str(r#"{"from":0,"to":1}"#).unwrap();
        assert_eq!(descriptor, EdgeDescriptor::new(NodeId(0), NodeId(1)));
    }
}
