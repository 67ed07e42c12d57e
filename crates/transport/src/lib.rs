//! An abstraction layer for persistent, bidirectional text connections.
//!
//! This crate defines the contract between the conversation controller
//! and the socket it talks through. A [`Connector`] opens a
//! [`TransportSession`] against an [`Endpoint`] and reports lifecycle
//! events through an [`EventSink`]. Implementors are expected to drive
//! their socket state through a [`StateCell`] so that every transport
//! follows the same one-way state machine.
//!
//! Types in this crate don't define any I/O, the concrete transports
//! live in their own crates.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod endpoint;
mod event;
mod session;
mod state;

pub use endpoint::*;
pub use event::*;
pub use session::*;
pub use state::*;
