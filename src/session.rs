use crate::{Color, EditorConfig, GraphStore, Node, NodeId};
use anyhow::{anyhow, bail, Result};
use log::debug;

/// Uncommitted values shown in the edit dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub node_id: NodeId,

    /// Unset until the user types
    pub label: Option<String>,

    /// Starts as the node's current color
    pub color: Option<Color>,
}

/// Lifecycle of the "edit node" dialog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing(Draft),
}

/// Drives one edit dialog at a time: open, draft, then confirm or cancel
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: EditState,
    commit_color: bool,
}

impl EditSession {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: EditState::Idle,
            commit_color: config.commit_color_on_confirm,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            EditState::Editing(draft) => Some(draft),
            EditState::Idle => None,
        }
    }

    /// Idle -> Editing for the node that was double-clicked
    pub fn open(&mut self, store: &GraphStore, node_id: NodeId) -> Result<&Draft> {
        if let EditState::Editing(draft) = &self.state {
            bail!(
                "Edit session already open for node {}; cannot open node {}",
                draft.node_id,
                node_id
            );
        }

        let node = store
            .get_node(node_id)
            .ok_or_else(|| anyhow!("Node not found: {}", node_id))?;

        debug!("session: editing node {}", node_id);
        self.state = EditState::Editing(Draft {
            node_id,
            label: None,
            color: node.color,
        });

        self.draft()
            .ok_or_else(|| anyhow!("Edit session failed to open"))
    }

    fn draft_mut(&mut self) -> Result<&mut Draft> {
        match &mut self.state {
            EditState::Editing(draft) => Ok(draft),
            EditState::Idle => Err(anyhow!("No edit session open")),
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> Result<()> {
        self.draft_mut()?.label = Some(label.into());
        Ok(())
    }

    pub fn set_color(&mut self, color: Option<Color>) -> Result<()> {
        self.draft_mut()?.color = color;
        Ok(())
    }

    /// Editing -> Idle, writing the draft label onto the node.
    ///
    /// An unset draft label leaves the node label alone. The draft color is
    /// only written when `commit_color_on_confirm` is enabled.
    pub fn confirm(&mut self, store: &mut GraphStore) -> Result<Node> {
        let draft = match std::mem::take(&mut self.state) {
            EditState::Editing(draft) => draft,
            EditState::Idle => bail!("No edit session open"),
        };

        let current = store
            .get_node(draft.node_id)
            .ok_or_else(|| anyhow!("Node {} was removed while editing", draft.node_id))?
            .clone();

        if let Some(label) = draft.label {
            store.update_label(draft.node_id, label)?;
        }

        if draft.color != current.color {
            if self.commit_color {
                store.update_color(draft.node_id, draft.color)?;
            } else {
                debug!(
                    "session: color edit on node {} not committed ({:?})",
                    draft.node_id, draft.color
                );
            }
        }

        store
            .get_node(draft.node_id)
            .cloned()
            .ok_or_else(|| anyhow!("Node not found: {}", draft.node_id))
    }

    /// Editing -> Idle, dropping the draft. The store is not touched.
    pub fn cancel(&mut self) -> Option<Draft> {
        match std::mem::take(&mut self.state) {
            EditState::Editing(draft) => {
                debug!("session: edit of node {} cancelled", draft.node_id);
                Some(draft)
            }
            EditState::Idle => None,
        }
    }
}
