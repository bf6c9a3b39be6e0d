use crate::{Color, Edge, EdgeId, Node, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A graph mutation with timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEvent {
    pub timestamp: DateTime<Utc>,
    pub event: EventType,
}

impl GraphEvent {
    /// Create a new event with the current timestamp
    pub fn new(event: EventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    /// Create a new event with a specific timestamp
    pub fn with_timestamp(timestamp: DateTime<Utc>, event: EventType) -> Self {
        Self { timestamp, event }
    }
}

/// Mutations recorded by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventType {
    NodeAdded {
        node: Node,
    },

    /// A node and every edge that touched it, removed in one step
    NodeRemoved {
        node: Node,
        cascaded_edges: Vec<Edge>,
    },

    EdgeAdded {
        edge: Edge,
    },

    EdgeRemoved {
        id: EdgeId,
    },

    NodeLabelChanged {
        id: NodeId,
        old_label: String,
        new_label: String,
    },

    NodeColorChanged {
        id: NodeId,
        old_color: Option<Color>,
        new_color: Option<Color>,
    },
}
