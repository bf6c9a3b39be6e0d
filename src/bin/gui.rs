use eframe::egui;
use node_graph_editor::{EditorConfig, NodeGraphEditorApp};
use std::path::Path;

fn main() -> eframe::Result<()> {
    // Optional first argument: path to an editor config JSON file
    let config = match std::env::args().nth(1) {
        Some(path) => match EditorConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{err:#}; using default config");
                EditorConfig::default()
            }
        },
        None => EditorConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 720.0])
            .with_title("Node Graph Editor"),
        ..Default::default()
    };

    eframe::run_native(
        "Node Graph Editor",
        options,
        Box::new(move |_cc| Ok(Box::new(NodeGraphEditorApp::new(config)))),
    )
}
