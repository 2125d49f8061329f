//! Session control: snapshot history and the session controller.

mod controller;
mod history;

pub use controller::{Mode, MoveError, SessionController, SessionError, SessionUpdate};
pub use history::History;
