// Node Graph Editor - Core Library

pub mod bus;
pub mod config;
pub mod controller;
pub mod edge;
pub mod editor;
pub mod event;
pub mod id_generator;
pub mod node;
pub mod session;
pub mod store;
pub mod ui;

// Re-export main types for convenience
pub use bus::{AddNodeRequest, Channel, EventBus, Message, NodesLength, Subscription};
pub use config::{EdgePolicy, EditorConfig};
pub use controller::{DeleteRequest, MutationController, TriggerSource};
pub use edge::{Edge, EdgeDescriptor, EdgeId};
pub use editor::GraphEditor;
pub use event::{EventType, GraphEvent};
pub use id_generator::IdGenerator;
pub use node::{Color, Node, NodeId};
pub use session::{Draft, EditSession, EditState};
pub use store::GraphStore;
pub use ui::NodeGraphEditorApp;
