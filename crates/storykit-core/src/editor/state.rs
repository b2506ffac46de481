//! Editor mode machine.
//!
//! The editor is always in exactly one [`EditorState`] and has at most one
//! active [`Tool`]. Every user action goes through [`Mode::apply`], which is
//! the complete transition table:
//!
//! | From | Action | To |
//! |---|---|---|
//! | `Idle` | `ActivateTool(t)` | `PlacingText` / `PlacingSticker` / `Idle` (toggles off if `t` is active) |
//! | `Idle` + draw tool | `PointerDown` | `Drawing` |
//! | `Drawing` | `PointerUp` | `Idle` |
//! | `Idle` + non-draw tool | `GrabLayer(id)` | `Dragging(id)` |
//! | `Dragging(_)` | `PointerUp` | `Idle` |
//! | `Dragging(id)` | `LayerRemoved(id)` | `Idle` |
//! | `PlacingText` | `CommitText` | `Idle`, no tool |
//! | `PlacingSticker` | `PickSticker` | `Idle`, no tool |
//! | `PlacingText` / `PlacingSticker` | `DismissPlacement` | `Idle`, no tool |
//!
//! `PointerDown`, `PointerUp`, and `LayerRemoved` never fail; outside the rows
//! above they leave the mode unchanged. Any other unlisted pair is an
//! [`InvalidTransition`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layer::LayerId;

/// Current interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "layer", rename_all = "camelCase")]
pub enum EditorState {
    #[default]
    Idle,
    Drawing,
    PlacingText,
    PlacingSticker,
    Dragging(LayerId),
}

/// Toolbar tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Draw,
    Text,
    Sticker,
    /// Only changes which options the host shows.
    Filter,
}

impl Tool {
    /// Parse a tool name as sent by the host (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draw" => Some(Tool::Draw),
            "text" => Some(Tool::Text),
            "sticker" => Some(Tool::Sticker),
            "filter" => Some(Tool::Filter),
            _ => None,
        }
    }

    fn entry_state(self) -> EditorState {
        match self {
            Tool::Text => EditorState::PlacingText,
            Tool::Sticker => EditorState::PlacingSticker,
            Tool::Draw | Tool::Filter => EditorState::Idle,
        }
    }
}

/// A user action fed to the mode machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ActivateTool(Tool),
    PointerDown,
    PointerUp,
    GrabLayer(LayerId),
    CommitText,
    PickSticker,
    DismissPlacement,
    LayerRemoved(LayerId),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ActivateTool(_) => "activate tool",
            Action::PointerDown => "pointer down",
            Action::PointerUp => "pointer up",
            Action::GrabLayer(_) => "grab layer",
            Action::CommitText => "commit text",
            Action::PickSticker => "pick sticker",
            Action::DismissPlacement => "dismiss placement",
            Action::LayerRemoved(_) => "remove layer",
        }
    }
}

/// An action that is not allowed in the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} while {from:?}")]
pub struct InvalidTransition {
    pub from: EditorState,
    pub action: &'static str,
}

/// State plus active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mode {
    pub state: EditorState,
    pub tool: Option<Tool>,
}

impl Mode {
    pub fn new() -> Self {
        Self::default()
    }

    fn idle(tool: Option<Tool>) -> Self {
        Self {
            state: EditorState::Idle,
            tool,
        }
    }

    /// Apply one action and return the next mode.
    pub fn apply(self, action: Action) -> Result<Mode, InvalidTransition> {
        use EditorState::*;

        let next = match (self.state, action) {
            (Idle, Action::ActivateTool(tool)) => {
                if self.tool == Some(tool) {
                    Mode::idle(None)
                } else {
                    Mode {
                        state: tool.entry_state(),
                        tool: Some(tool),
                    }
                }
            }

            (Idle, Action::PointerDown) if self.tool == Some(Tool::Draw) => Mode {
                state: Drawing,
                tool: self.tool,
            },
            (_, Action::PointerDown) => self,

            (Drawing | Dragging(_), Action::PointerUp) => Mode::idle(self.tool),
            (_, Action::PointerUp) => self,

            (Idle, Action::GrabLayer(id)) if self.tool != Some(Tool::Draw) => Mode {
                state: Dragging(id),
                tool: self.tool,
            },

            (Dragging(dragged), Action::LayerRemoved(removed)) if dragged == removed => {
                Mode::idle(self.tool)
            }
            (_, Action::LayerRemoved(_)) => self,

            (PlacingText, Action::CommitText) => Mode::idle(None),
            (PlacingSticker, Action::PickSticker) => Mode::idle(None),
            (PlacingText | PlacingSticker, Action::DismissPlacement) => Mode::idle(None),

            (from, action) => {
                return Err(InvalidTransition {
                    from,
                    action: action.name(),
                })
            }
        };

        Ok(next)
    }
}
