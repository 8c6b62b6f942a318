//! Host events and the answers a session gives back

use serde::{Deserialize, Serialize};

use crate::ast::NodeId;
use crate::registry::ReplayReport;

/// What the cursor is on when the user opens the context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// Not on a ctree item
    Nothing,
    /// A ctree item in the pseudocode
    Item { id: NodeId },
    /// An entry of the local variable list
    LVar { idx: usize },
}

impl Selection {
    /// The selected ctree item, if any
    pub fn item(&self) -> Option<NodeId> {
        match self {
            Selection::Item { id } => Some(*id),
            _ => None,
        }
    }
}

/// Ctree maturity levels reported by the host while it builds a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    Zero,
    Built,
    Transformed,
    Nice,
    Casted,
    /// Ctree is ready; no further host transformations follow
    Final,
}

/// Events delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    RightClick { selection: Selection },
    Maturity { maturity: Maturity },
}

/// Context menu entries offered for a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupAction {
    MarkSuperfluous,
    UnmarkSuperfluous,
}

impl PopupAction {
    pub fn label(self) -> &'static str {
        match self {
            PopupAction::MarkSuperfluous => "Mark as superfluous",
            PopupAction::UnmarkSuperfluous => "Unmark as superfluous",
        }
    }
}

/// Kind of refresh the host must perform after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Regenerate the text from the (already rewritten) ctree
    Text,
    /// Decompile the function again from scratch
    View,
}

/// Answer to a [`HostEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Ignored,
    Popup(Vec<PopupAction>),
    Replayed(ReplayReport),
}
