use node_graph_editor::{
    AddNodeRequest, Channel, DeleteRequest, EdgeDescriptor, EditorConfig, GraphEditor, Message,
    NodeId, NodesLength, TriggerSource,
};
use std::cell::Cell;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    println!("Node Graph Editor - Engine Walkthrough");
    println!("======================================\n");

    let mut editor = GraphEditor::new(EditorConfig::default());
    editor.mount()?;

    // A toolbar listening for the node count
    let announced = Rc::new(Cell::new(0));
    let announced_in = Rc::clone(&announced);
    let _toolbar = editor.bus().subscribe(Channel::NodesLength, move |message| {
        if let Message::NodesLength(NodesLength { length }) = message {
            announced_in.set(*length);
        }
    });

    // Toolbar button and canvas gesture share one id policy
    editor
        .bus()
        .publish(Message::ActivateAddNode(AddNodeRequest { requested: true }));
    editor.controller().add_node(TriggerSource::CanvasGesture)?;
    editor.controller().add_node(TriggerSource::CanvasGesture)?;

    println!("✓ Added three nodes");
    for node in editor.store().nodes() {
        println!("  {} -> {:?}", node.id, node.label);
    }
    println!("  Toolbar sees {} node(s)", announced.get());

    // Edges: one from the gesture flow over the bus, one directly
    editor
        .bus()
        .publish(Message::EdgeAddReady(EdgeDescriptor::new(NodeId(0), NodeId(1))));
    editor
        .controller()
        .add_edge(EdgeDescriptor::new(NodeId(1), NodeId(2)))?;
    println!("\n✓ Connected 0 -> 1 -> 2");
    println!("  Edges: {}", editor.store().edge_count());

    // Cascade delete
    let request = DeleteRequest::nodes([NodeId(1)]);
    editor.controller().delete_nodes(&request);
    println!("\n✓ Deleted node 1");
    println!("  Nodes: {}, edges: {}", editor.store().count(), editor.store().edge_count());
    println!("  Toolbar sees {} node(s)", announced.get());

    // Ids are not reused
    let node = editor.controller().add_node(TriggerSource::CanvasGesture)?;
    println!("\n✓ Next node gets id {} ({:?})", node.id, node.label);

    // Edit dialog
    editor.open_edit(NodeId(0))?;
    editor.set_draft_label("hub")?;
    let node = editor.confirm_edit()?;
    println!("\n✓ Renamed node {} to {:?}", node.id, node.label);

    println!("\n📜 History: {} event(s)", editor.store().events().len());

    editor.unmount();
    println!(
        "\n✅ Unmounted; {} command subscription(s) left",
        editor.bus().subscriber_count(Channel::ActivateAddNode)
    );

    Ok(())
}
