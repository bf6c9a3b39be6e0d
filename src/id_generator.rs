//! Node id assignment policy shared by every trigger path.
//! Ids grow monotonically from 0 and are never handed out twice in a session,
//! even after the node that carried one has been deleted.

use crate::{Node, NodeId};

#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    /// Highest id issued or observed so far
    high_water: Option<NodeId>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next auto-assigned node gets; `None` once `u64::MAX` has
    /// been used
    pub fn peek(&self) -> Option<NodeId> {
        match self.high_water {
            None => Some(NodeId::FIRST),
            Some(high) => high.next(),
        }
    }

    /// Labelled node carrying the next id. Nothing is reserved until the
    /// node is inserted and its id observed.
    pub fn peek_node(&self) -> Option<Node> {
        let id = self.peek()?;
        Some(Node::new(id, Self::label_for(id)))
    }

    /// Record an inserted id so it is never issued again
    pub fn observe(&mut self, id: NodeId) {
        if self.high_water.map_or(true, |high| id > high) {
            self.high_water = Some(id);
        }
    }

    /// Default label for an auto-assigned id.
    ///
    /// The first node reads `"0"`; every later one is padded with a single
    /// space on each side, e.g. `" 7 "`.
    pub fn label_for(id: NodeId) -> String {
        if id == NodeId::FIRST {
            id.to_string()
        } else {
            format!(" {} ", id)
        }
    }

    pub fn high_water(&self) -> Option<NodeId> {
        self.high_water
    }
}
