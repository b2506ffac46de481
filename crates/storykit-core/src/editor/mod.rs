//! Interactive editor surface.
//!
//! An [`EditorSession`] owns everything one edit produces: the overlay
//! layers, the freehand drawing buffer, the active filter, and the decoded
//! base image once it arrives. The host forwards pointer events and toolbar
//! actions, calls [`EditorSession::render_preview`] after each change, and
//! ends the session with [`EditorSession::finish`] or
//! [`EditorSession::cancel`].

mod session;
mod state;

pub use session::{EditorError, EditorSession};
pub use state::{Action, EditorState, InvalidTransition, Mode, Tool};
