//! A terminal chat client for a conversational assistant that speaks
//! plain text over a WebSocket.
//!
//! The crate includes a CLI tool for using in the terminal. It can also be
//! used as a library: [`SessionBuilder`] wires a conversation controller
//! to a real WebSocket connection, and [`markup`] renders the emphasis
//! the assistant puts in its replies.

#![deny(missing_docs)]

pub mod markup;
mod session;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`palaver_core`] crate.
pub mod core {
    pub use palaver_core::*;
}
