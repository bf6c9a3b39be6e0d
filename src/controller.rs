use crate::{
    EdgeDescriptor, EdgeId, EdgePolicy, EditorConfig, EventBus, GraphStore, Message, Node, NodeId,
    NodesLength,
};
use anyhow::{anyhow, bail, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Where a mutation request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerSource {
    /// Direct manipulation on the canvas
    CanvasGesture,
    /// A command delivered over the event bus
    ExternalCommand,
}

/// Selection handed over by a delete gesture: nodes plus the edges the
/// renderer saw attached to them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

impl DeleteRequest {
    pub fn nodes(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            edges: Vec::new(),
        }
    }

    pub fn with_edges(mut self, edges: impl IntoIterator<Item = EdgeId>) -> Self {
        self.edges.extend(edges);
        self
    }
}

/// The only sanctioned way to create or remove nodes and edges.
///
/// Canvas gestures and bus commands both come through here so they share one
/// id policy and one count announcement path.
#[derive(Debug)]
pub struct MutationController {
    store: Rc<RefCell<GraphStore>>,
    bus: EventBus,
    config: EditorConfig,
}

impl MutationController {
    pub fn new(store: Rc<RefCell<GraphStore>>, bus: EventBus, config: EditorConfig) -> Self {
        Self { store, bus, config }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The node the next `add_node` call will insert; `None` once the id
    /// space is used up
    pub fn next_node(&self) -> Option<Node> {
        self.store.borrow().ids().peek_node()
    }

    /// Create a node with the next id and announce the new count.
    ///
    /// Fails without touching the store or the bus once an id of `u64::MAX`
    /// has been used.
    pub fn add_node(&self, source: TriggerSource) -> Result<Node> {
        let node = {
            let mut store = self.store.borrow_mut();
            let node = store
                .ids()
                .peek_node()
                .ok_or_else(|| anyhow!("Node id space exhausted"))?;
            store.add_node(node.clone())?;
            node
        };

        debug!("controller: node {} added via {:?}", node.id, source);
        self.announce_count();
        Ok(node)
    }

    /// Insert an edge descriptor, minting an id if none was supplied.
    ///
    /// A supplied id already in the store is rejected. Under
    /// [`EdgePolicy::Strict`] a descriptor naming a missing endpoint is
    /// rejected too; otherwise it is inserted as given.
    pub fn add_edge(&self, descriptor: EdgeDescriptor) -> Result<EdgeId> {
        let mut store = self.store.borrow_mut();

        let missing: Vec<NodeId> = [descriptor.from, descriptor.to]
            .into_iter()
            .filter(|id| !store.contains_node(*id))
            .collect();

        if !missing.is_empty() {
            match self.config.edge_policy {
                EdgePolicy::Strict => bail!(
                    "Dangling edge reference: {} -> {} (missing {:?})",
                    descriptor.from,
                    descriptor.to,
                    missing
                ),
                EdgePolicy::Permissive => warn!(
                    "controller: edge {} -> {} references missing node(s) {:?}",
                    descriptor.from, descriptor.to, missing
                ),
            }
        }

        let edge = descriptor.into_edge();
        store.add_edge(edge)?;
        Ok(edge.id)
    }

    /// Remove the selected nodes with their incident edges, then announce
    /// the new count once. Unknown ids are skipped.
    pub fn delete_nodes(&self, request: &DeleteRequest) -> Vec<Node> {
        let mut removed = Vec::new();
        {
            let mut store = self.store.borrow_mut();
            for &node_id in &request.nodes {
                let Some((node, _cascaded)) = store.remove_node(node_id) else {
                    debug!("controller: delete of unknown node {} ignored", node_id);
                    continue;
                };

                // Already gone through the cascade; kept for selections that
                // name edges the store still holds.
                for &edge_id in &request.edges {
                    let incident = store
                        .get_edge(edge_id)
                        .is_some_and(|edge| edge.involves(node_id));
                    if incident {
                        store.remove_edge(edge_id);
                    }
                }

                removed.push(node);
            }
        }

        self.announce_count();
        removed
    }

    /// Remove edges only; the node count does not change so nothing is announced
    pub fn delete_edges(&self, ids: &[EdgeId]) -> usize {
        let mut store = self.store.borrow_mut();
        ids.iter()
            .filter(|id| store.remove_edge(**id).is_some())
            .count()
    }

    /// React to a bus message addressed to the editor
    pub fn handle(&self, message: &Message) {
        match message {
            Message::ActivateAddNode(request) if request.requested => {
                if let Err(err) = self.add_node(TriggerSource::ExternalCommand) {
                    warn!("controller: node not added: {err:#}");
                }
            }
            Message::ActivateAddNode(_) => {
                debug!("controller: add-node request with requested=false ignored");
            }
            Message::EdgeAddReady(descriptor) => {
                if let Err(err) = self.add_edge(*descriptor) {
                    warn!("controller: edge rejected: {err:#}");
                }
            }
            Message::NodesLength(_) => {}
        }
    }

    fn announce_count(&self) {
        let length = self.store.borrow().count();
        self.bus.publish(Message::NodesLength(NodesLength { length }));
    }
}
