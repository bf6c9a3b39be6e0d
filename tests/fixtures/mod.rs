// Helper functions to build editors and graphs for integration tests

use node_graph_editor::{
    Channel, Color, EdgeDescriptor, EdgeId, EditorConfig, GraphEditor, GraphStore, Message, Node,
    NodeId, NodesLength, Subscription, TriggerSource,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Records every `nodes-length` announcement, like a toolbar would
pub struct CountListener {
    pub lengths: Rc<RefCell<Vec<usize>>>,
    _subscription: Subscription,
}

impl CountListener {
    pub fn attach(editor: &GraphEditor) -> Self {
        let lengths = Rc::new(RefCell::new(Vec::new()));
        let lengths_in = Rc::clone(&lengths);
        let subscription = editor.bus().subscribe(Channel::NodesLength, move |msg| {
            if let Message::NodesLength(NodesLength { length }) = msg {
                lengths_in.borrow_mut().push(*length);
            }
        });
        Self {
            lengths,
            _subscription: subscription,
        }
    }

    pub fn announced(&self) -> Vec<usize> {
        self.lengths.borrow().clone()
    }
}

/// Mounted editor with `count` nodes added through canvas gestures
pub fn mounted_editor(count: usize) -> GraphEditor {
    let mut editor = GraphEditor::new(EditorConfig::default());
    editor.mount().unwrap();
    for _ in 0..count {
        editor.controller().add_node(TriggerSource::CanvasGesture).unwrap();
    }
    editor
}

/// Star around node 0 with `leaves` spokes plus a ring between the leaves
pub fn star_with_ring(leaves: u64) -> (GraphEditor, Vec<EdgeId>) {
    let editor = mounted_editor(leaves as usize + 1);
    let mut edges = Vec::new();
    for leaf in 1..=leaves {
        edges.push(
            editor
                .controller()
                .add_edge(EdgeDescriptor::new(NodeId(0), NodeId(leaf)))
                .unwrap(),
        );
        let next = if leaf == leaves { 1 } else { leaf + 1 };
        edges.push(
            editor
                .controller()
                .add_edge(EdgeDescriptor::new(NodeId(leaf), NodeId(next)))
                .unwrap(),
        );
    }
    (editor, edges)
}

/// The `{id:3, label:"3", color:"#ffffff"}` node used by the edit dialog tests
pub fn store_with_white_node() -> GraphStore {
    GraphStore::from_parts(vec![Node::new(NodeId(3), "3").with_color(Color::WHITE)], Vec::new())
        .unwrap()
}
