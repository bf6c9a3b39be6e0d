use crate::{
    Channel, Color, Draft, EditSession, EditorConfig, EventBus, GraphStore, MutationController,
    Node, NodeId, Subscription,
};
use anyhow::{bail, Result};
use log::debug;
use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

/// Bus subscriptions held while the editing surface is mounted
#[derive(Debug)]
struct Mount {
    _add_node: Subscription,
    _edge_ready: Subscription,
}

impl Mount {
    fn acquire(bus: &EventBus, controller: &Rc<MutationController>) -> Self {
        Self {
            _add_node: bus.subscribe(Channel::ActivateAddNode, forward(controller)),
            _edge_ready: bus.subscribe(Channel::EdgeAddReady, forward(controller)),
        }
    }
}

/// Handler that routes a message to the controller while it is alive
fn forward(controller: &Rc<MutationController>) -> impl FnMut(&crate::Message) + 'static {
    let controller: Weak<MutationController> = Rc::downgrade(controller);
    move |message| {
        if let Some(controller) = controller.upgrade() {
            controller.handle(message);
        }
    }
}

/// One editor instance: store, bus, controller and edit dialog state.
///
/// The bus handle can be cloned out to toolbar collaborators. Command
/// subscriptions exist only between [`GraphEditor::mount`] and
/// [`GraphEditor::unmount`] (or drop).
#[derive(Debug)]
pub struct GraphEditor {
    store: Rc<RefCell<GraphStore>>,
    bus: EventBus,
    controller: Rc<MutationController>,
    session: EditSession,
    mount: Option<Mount>,
}

impl GraphEditor {
    pub fn new(config: EditorConfig) -> Self {
        let store = Rc::new(RefCell::new(GraphStore::new()));
        let bus = EventBus::new();
        let session = EditSession::new(&config);
        let controller = Rc::new(MutationController::new(
            Rc::clone(&store),
            bus.clone(),
            config,
        ));

        Self {
            store,
            bus,
            controller,
            session,
            mount: None,
        }
    }

    // ========== Mount Lifecycle ==========

    /// Start listening for toolbar commands
    pub fn mount(&mut self) -> Result<()> {
        if self.mount.is_some() {
            bail!("Editor is already mounted");
        }
        self.mount = Some(Mount::acquire(&self.bus, &self.controller));
        debug!("editor: mounted");
        Ok(())
    }

    /// Stop listening. Returns false if the editor was not mounted.
    pub fn unmount(&mut self) -> bool {
        let was_mounted = self.mount.take().is_some();
        if was_mounted {
            debug!("editor: unmounted");
        }
        was_mounted
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    // ========== Collaborator Access ==========

    /// Shared handle for toolbar controls
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Entry points for canvas gestures
    pub fn controller(&self) -> &MutationController {
        &self.controller
    }

    /// Live collections for the renderer. Release the borrow before mutating.
    pub fn store(&self) -> Ref<'_, GraphStore> {
        self.store.borrow()
    }

    // ========== Edit Dialog ==========

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Open the edit dialog for a double-clicked node
    pub fn open_edit(&mut self, node_id: NodeId) -> Result<Draft> {
        let store = self.store.borrow();
        self.session.open(&store, node_id).cloned()
    }

    pub fn set_draft_label(&mut self, label: impl Into<String>) -> Result<()> {
        self.session.set_label(label)
    }

    pub fn set_draft_color(&mut self, color: Option<Color>) -> Result<()> {
        self.session.set_color(color)
    }

    /// OK button
    pub fn confirm_edit(&mut self) -> Result<Node> {
        let mut store = self.store.borrow_mut();
        self.session.confirm(&mut store)
    }

    /// Cancel button
    pub fn cancel_edit(&mut self) -> Option<Draft> {
        self.session.cancel()
    }
}

impl Default for GraphEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddNodeRequest, EdgeDescriptor, Message};

    fn request_node(bus: &EventBus) -> usize {
        bus.publish(Message::ActivateAddNode(AddNodeRequest { requested: true }))
    }

    #[test]
    fn test_commands_ignored_until_mounted() {
        let mut editor = GraphEditor::default();

        assert_eq!(request_node(editor.bus()), 0);
        assert_eq!(editor.store().count(), 0);

        editor.mount().unwrap();
        assert_eq!(request_node(editor.bus()), 1);
        assert_eq!(editor.store().count(), 1);
    }

    #[test]
    fn test_double_mount_rejected() {
        let mut editor = GraphEditor::default();
        editor.mount().unwrap();

        assert!(editor.mount().is_err());
        assert_eq!(editor.bus().subscriber_count(Channel::ActivateAddNode), 1);
    }

    #[test]
    fn test_remount_does_not_duplicate_handlers() {
        let mut editor = GraphEditor::default();
        for _ in 0..3 {
            editor.mount().unwrap();
            assert!(editor.unmount());
        }
        editor.mount().unwrap();

        request_node(editor.bus());
        assert_eq!(editor.store().count(), 1);
        assert_eq!(editor.bus().subscriber_count(Channel::ActivateAddNode), 1);
        assert_eq!(editor.bus().subscriber_count(Channel::EdgeAddReady), 1);
    }

    #[test]
    fn test_unmount_releases_subscriptions() {
        let mut editor = GraphEditor::default();
        editor.mount().unwrap();
        assert!(editor.unmount());
        assert!(!editor.unmount());

        assert_eq!(editor.bus().subscriber_count(Channel::ActivateAddNode), 0);
        assert_eq!(editor.bus().subscriber_count(Channel::EdgeAddReady), 0);
    }

    #[test]
    fn test_drop_releases_subscriptions() {
        let mut editor = GraphEditor::default();
        editor.mount().unwrap();
        let bus = editor.bus().clone();

        drop(editor);

        assert_eq!(bus.subscriber_count(Channel::ActivateAddNode), 0);
        assert_eq!(request_node(&bus), 0);
    }

    #[test]
    fn test_edge_ready_inserts_edge() {
        let mut editor = GraphEditor::default();
        editor.mount().unwrap();
        request_node(editor.bus());
        request_node(editor.bus());

        editor
            .bus()
            .publish(Message::EdgeAddReady(EdgeDescriptor::new(NodeId(0), NodeId(1))));

        let store = editor.store();
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edges()[0].from, NodeId(0));
        assert_eq!(store.edges()[0].to, NodeId(1));
    }

    #[test]
    fn test_edit_roundtrip_through_editor() {
        let mut editor = GraphEditor::default();
        editor.mount().unwrap();
        request_node(editor.bus());

        let draft = editor.open_edit(NodeId(0)).unwrap();
        assert_eq!(draft.label, None);

        editor.set_draft_label("root").unwrap();
        let node = editor.confirm_edit().unwrap();

        assert_eq!(node.label, "root");
        assert!(!editor.session().is_open());
    }
}
