use crate::{
    AddNodeRequest, Channel, Color, DeleteRequest, Edge, EdgeDescriptor, EdgeId, EditorConfig,
    EventBus, GraphEditor, Message, NodeId, NodesLength, Subscription, TriggerSource,
};
use egui::{pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke};
use std::cell::Cell;
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::rc::Rc;

const NODE_RADIUS: f32 = 22.0;
/// How far from an edge's line a click still selects it
const EDGE_HIT_TOLERANCE: f32 = 6.0;
const DEFAULT_FILL: Color32 = Color32::from_rgb(0x97, 0xc2, 0xfc);
const SELECTED_STROKE: Color32 = Color32::from_rgb(0x2b, 0x7c, 0xe9);

/// Main application state
pub struct NodeGraphEditorApp {
    /// Graph engine; mounted for the lifetime of the app
    editor: GraphEditor,

    /// Toolbar controls talking to the editor over the bus
    toolbar: Toolbar,

    /// The one render state for this mount
    view: CanvasView,

    /// Widget buffers for the edit dialog
    dialog: DialogBuffers,

    /// Status message
    status_message: String,
}

/// External control: publishes commands and listens for the node count
struct Toolbar {
    bus: EventBus,
    node_count: Rc<Cell<usize>>,
    _count_subscription: Subscription,
}

impl Toolbar {
    fn new(bus: &EventBus) -> Self {
        let node_count = Rc::new(Cell::new(0));
        let count = Rc::clone(&node_count);
        let subscription = bus.subscribe(Channel::NodesLength, move |message| {
            if let Message::NodesLength(NodesLength { length }) = message {
                count.set(*length);
            }
        });

        Self {
            bus: bus.clone(),
            node_count,
            _count_subscription: subscription,
        }
    }

    fn request_node(&self) {
        self.bus
            .publish(Message::ActivateAddNode(AddNodeRequest { requested: true }));
    }

    fn offer_edge(&self, from: NodeId, to: NodeId) {
        self.bus
            .publish(Message::EdgeAddReady(EdgeDescriptor::new(from, to)));
    }

    fn node_count(&self) -> usize {
        self.node_count.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CanvasMode {
    #[default]
    Select,
    AddNode,
    AddEdge,
}

/// What a click in Select mode picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Node(NodeId),
    Edge(EdgeId),
}

impl Selection {
    fn node(self) -> Option<NodeId> {
        match self {
            Selection::Node(id) => Some(id),
            Selection::Edge(_) => None,
        }
    }
}

#[derive(Default)]
struct CanvasView {
    mode: CanvasMode,

    /// Canvas-space positions; nodes without one get a ring slot
    positions: HashMap<NodeId, Pos2>,

    selected: Option<Selection>,

    /// First endpoint picked in AddEdge mode
    edge_source: Option<NodeId>,
}

struct DialogBuffers {
    label: String,
    color: [u8; 3],
}

impl Default for DialogBuffers {
    fn default() -> Self {
        Self {
            label: String::new(),
            color: [DEFAULT_FILL.r(), DEFAULT_FILL.g(), DEFAULT_FILL.b()],
        }
    }
}

impl Default for NodeGraphEditorApp {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl NodeGraphEditorApp {
    pub fn new(config: EditorConfig) -> Self {
        let mut editor = GraphEditor::new(config);
        let status_message = match editor.mount() {
            Ok(()) => "Click \"Add Node\" or switch to a canvas mode.".to_string(),
            Err(err) => format!("Editor failed to mount: {err}"),
        };
        let toolbar = Toolbar::new(editor.bus());

        Self {
            editor,
            toolbar,
            view: CanvasView::default(),
            dialog: DialogBuffers::default(),
            status_message,
        }
    }

    fn render_ui(&mut self, ctx: &egui::Context) {
        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("➕ Add Node").clicked() {
                    self.toolbar.request_node();
                }
                ui.separator();

                ui.selectable_value(&mut self.view.mode, CanvasMode::Select, "Select");
                ui.selectable_value(&mut self.view.mode, CanvasMode::AddNode, "Place Node");
                ui.selectable_value(&mut self.view.mode, CanvasMode::AddEdge, "Connect");
                ui.separator();

                let can_delete = self.view.selected.is_some();
                if ui
                    .add_enabled(can_delete, egui::Button::new("🗑 Delete Selected"))
                    .clicked()
                {
                    self.delete_selected();
                }
                ui.separator();

                ui.label(format!("Nodes: {}", self.toolbar.node_count()));
                ui.label(format!("Edges: {}", self.editor.store().edge_count()));
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
            });
        });

        // Central panel (canvas)
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_canvas(ui);
        });

        if ctx.input(|i| i.key_pressed(egui::Key::Delete)) && !self.editor.session().is_open() {
            self.delete_selected();
        }

        self.render_edit_dialog(ctx);
    }

    fn render_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
        let canvas_rect = response.rect;

        // Snapshot so no store borrow is held while gestures mutate it
        let (nodes, edges) = {
            let store = self.editor.store();
            (store.nodes().to_vec(), store.edges().to_vec())
        };
        self.assign_missing_positions(&nodes, canvas_rect);

        for edge in &edges {
            if let (Some(from), Some(to)) = (
                self.view.positions.get(&edge.from),
                self.view.positions.get(&edge.to),
            ) {
                let from = canvas_rect.min + from.to_vec2();
                let to = canvas_rect.min + to.to_vec2();
                let stroke = if self.view.selected == Some(Selection::Edge(edge.id)) {
                    Stroke::new(3.0, SELECTED_STROKE)
                } else {
                    Stroke::new(1.5, Color32::DARK_GRAY)
                };
                painter.line_segment([from, to], stroke);
            }
        }

        for node in &nodes {
            let Some(pos) = self.view.positions.get(&node.id) else {
                continue;
            };
            let center = canvas_rect.min + pos.to_vec2();
            let fill = node
                .color
                .map(|c| Color32::from_rgb(c.r, c.g, c.b))
                .unwrap_or(DEFAULT_FILL);
            let highlighted = self.view.selected == Some(Selection::Node(node.id))
                || self.view.edge_source == Some(node.id);
            let stroke = if highlighted {
                Stroke::new(3.0, SELECTED_STROKE)
            } else {
                Stroke::new(1.0, Color32::from_rgb(0x2b, 0x7c, 0xe9))
            };

            painter.circle(center, NODE_RADIUS, fill, stroke);
            painter.text(
                center,
                Align2::CENTER_CENTER,
                &node.label,
                FontId::proportional(14.0),
                Color32::BLACK,
            );
        }

        let Some(pointer) = response.interact_pointer_pos() else {
            return;
        };
        let local = pos2(pointer.x - canvas_rect.min.x, pointer.y - canvas_rect.min.y);
        let hit = self.pick(local, &edges);

        if response.double_clicked() {
            if let Some(node_id) = hit.and_then(Selection::node) {
                self.open_edit_dialog(node_id);
            }
            return;
        }

        if response.clicked() {
            self.handle_click(local, hit);
        }
    }

    fn handle_click(&mut self, local: Pos2, hit: Option<Selection>) {
        let hit_node = hit.and_then(Selection::node);
        match self.view.mode {
            CanvasMode::Select => {
                self.view.selected = hit;
            }
            CanvasMode::AddNode => {
                if hit_node.is_none() {
                    match self.editor.controller().add_node(TriggerSource::CanvasGesture) {
                        Ok(node) => {
                            self.view.positions.insert(node.id, local);
                            self.status_message = format!("Added node {}", node.id);
                        }
                        Err(err) => self.status_message = format!("Cannot add node: {err}"),
                    }
                }
            }
            CanvasMode::AddEdge => match (self.view.edge_source, hit_node) {
                (None, Some(source)) => {
                    self.view.edge_source = Some(source);
                    self.status_message = format!("Connecting from node {source}; pick a target");
                }
                (Some(source), Some(target)) => {
                    self.toolbar.offer_edge(source, target);
                    self.view.edge_source = None;
                    self.status_message = format!("Connected {source} -> {target}");
                }
                (_, None) => {
                    self.view.edge_source = None;
                }
            },
        }
    }

    fn delete_selected(&mut self) {
        match self.view.selected.take() {
            Some(Selection::Node(node_id)) => self.delete_node(node_id),
            Some(Selection::Edge(edge_id)) => {
                let removed = self.editor.controller().delete_edges(&[edge_id]);
                self.status_message = format!("Deleted {removed} edge(s)");
            }
            None => {}
        }
    }

    fn delete_node(&mut self, node_id: NodeId) {
        let incident: Vec<_> = self
            .editor
            .store()
            .incident_edges(node_id)
            .into_iter()
            .map(|edge| edge.id)
            .collect();
        let request = DeleteRequest::nodes([node_id]).with_edges(incident);

        let removed = self.editor.controller().delete_nodes(&request);
        for node in &removed {
            self.view.positions.remove(&node.id);
        }
        self.status_message = format!("Deleted {} node(s)", removed.len());
    }

    fn render_edit_dialog(&mut self, ctx: &egui::Context) {
        if !self.editor.session().is_open() {
            return;
        }

        let editor = &mut self.editor;
        let dialog = &mut self.dialog;
        let mut confirmed = false;
        let mut cancelled = false;

        egui::Window::new("Edit Node")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Label");
                    let input = ui.add(
                        egui::TextEdit::singleline(&mut dialog.label)
                            .hint_text("Please enter your new label"),
                    );
                    if input.changed() {
                        let _ = editor.set_draft_label(dialog.label.clone());
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("Color");
                    if ui.color_edit_button_srgb(&mut dialog.color).changed() {
                        let _ = editor.set_draft_color(Some(Color::from(dialog.color)));
                    }
                    ui.label(Color::from(dialog.color).to_hex());
                });

                ui.separator();
                ui.horizontal(|ui| {
                    confirmed = ui.button("OK").clicked();
                    cancelled = ui.button("Cancel").clicked();
                });
            });

        if confirmed {
            self.status_message = match self.editor.confirm_edit() {
                Ok(node) => format!("Node {} renamed to {:?}", node.id, node.label),
                Err(err) => format!("Edit failed: {err}"),
            };
        } else if cancelled || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.editor.cancel_edit();
            self.status_message = "Edit cancelled".to_string();
        }
    }

    fn open_edit_dialog(&mut self, node_id: NodeId) {
        match self.editor.open_edit(node_id) {
            Ok(draft) => {
                self.dialog.label.clear();
                self.dialog.color = draft
                    .color
                    .map(Color::to_array)
                    .unwrap_or(DialogBuffers::default().color);
            }
            Err(err) => self.status_message = format!("Cannot edit node {node_id}: {err}"),
        }
    }

    /// Nodes created over the bus have no click position; park them on a ring
    fn assign_missing_positions(&mut self, nodes: &[crate::Node], canvas_rect: Rect) {
        let center = pos2(canvas_rect.width() / 2.0, canvas_rect.height() / 2.0);
        let radius = (canvas_rect.width().min(canvas_rect.height()) / 2.0 - NODE_RADIUS * 2.0)
            .max(NODE_RADIUS * 2.0);

        for node in nodes {
            if self.view.positions.contains_key(&node.id) {
                continue;
            }
            let angle = (node.id.value() % 12) as f32 / 12.0 * TAU;
            let ring = 1.0 - 0.2 * ((node.id.value() / 12) % 4) as f32;
            let pos = center + vec2(angle.cos(), angle.sin()) * radius * ring;
            self.view.positions.insert(node.id, pos);
        }
    }

    /// Nodes win over edges, since edges run underneath them
    fn pick(&self, local: Pos2, edges: &[Edge]) -> Option<Selection> {
        self.node_at(local)
            .map(Selection::Node)
            .or_else(|| self.edge_at(local, edges).map(Selection::Edge))
    }

    fn node_at(&self, local: Pos2) -> Option<NodeId> {
        self.view
            .positions
            .iter()
            .filter(|(_, pos)| pos.distance(local) <= NODE_RADIUS)
            .map(|(id, _)| *id)
            .max()
    }

    fn edge_at(&self, local: Pos2, edges: &[Edge]) -> Option<EdgeId> {
        edges
            .iter()
            .filter_map(|edge| {
                let from = self.view.positions.get(&edge.from)?;
                let to = self.view.positions.get(&edge.to)?;
                Some((edge.id, distance_to_segment(local, *from, *to)))
            })
            .filter(|(_, distance)| *distance <= EDGE_HIT_TOLERANCE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_sq();
    if length_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

impl eframe::App for NodeGraphEditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render_ui(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Two nodes 200px apart on a horizontal line, joined by one edge
    fn app_with_edge() -> (NodeGraphEditorApp, EdgeId) {
        let mut app = NodeGraphEditorApp::default();
        for pos in [pos2(100.0, 100.0), pos2(300.0, 100.0)] {
            let node = app
                .editor
                .controller()
                .add_node(TriggerSource::CanvasGesture)
                .unwrap();
            app.view.positions.insert(node.id, pos);
        }
        let edge_id = app
            .editor
            .controller()
            .add_edge(EdgeDescriptor::new(NodeId(0), NodeId(1)))
            .unwrap();
        (app, edge_id)
    }

    fn edges(app: &NodeGraphEditorApp) -> Vec<Edge> {
        app.editor.store().edges().to_vec()
    }

    #[test]
    fn test_distance_to_segment() {
        let a = pos2(0.0, 0.0);
        let b = pos2(10.0, 0.0);

        assert_eq!(distance_to_segment(pos2(5.0, 3.0), a, b), 3.0);
        // Past the end the nearest point is the endpoint
        assert_eq!(distance_to_segment(pos2(13.0, 4.0), a, b), 5.0);
        assert_eq!(distance_to_segment(pos2(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn test_pick_prefers_node_then_edge() {
        let (app, edge_id) = app_with_edge();
        let edges = edges(&app);

        assert_eq!(
            app.pick(pos2(110.0, 100.0), &edges),
            Some(Selection::Node(NodeId(0)))
        );
        assert_eq!(
            app.pick(pos2(200.0, 104.0), &edges),
            Some(Selection::Edge(edge_id))
        );
        assert_eq!(app.pick(pos2(200.0, 150.0), &edges), None);
    }

    #[test]
    fn test_delete_selected_edge_keeps_nodes() {
        let (mut app, edge_id) = app_with_edge();
        let hit = app.pick(pos2(200.0, 100.0), &edges(&app));

        app.handle_click(pos2(200.0, 100.0), hit);
        assert_eq!(app.view.selected, Some(Selection::Edge(edge_id)));

        app.delete_selected();

        let store = app.editor.store();
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.count(), 2);
        assert_eq!(app.view.selected, None);
    }

    #[test]
    fn test_delete_selected_node_cascades() {
        let (mut app, _) = app_with_edge();
        let hit = app.pick(pos2(300.0, 100.0), &edges(&app));

        app.handle_click(pos2(300.0, 100.0), hit);
        app.delete_selected();

        let store = app.editor.store();
        assert_eq!(store.count(), 1);
        assert_eq!(store.edge_count(), 0);
        assert!(!app.view.positions.contains_key(&NodeId(1)));
    }
}
