//! Core logic of the conversation: the controller that owns the
//! transport session, the transcript it maintains, and the signals it
//! derives for the presentation layer.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod config;
mod controller;
mod error;
pub mod transcript;
mod transport_client;

pub use config::{ClientConfig, ClientConfigBuilder, ReconnectPolicy};
pub use controller::{Controller, ControllerBuilder, Snapshot, Update};
pub use error::{Error, ErrorKind};
pub use palaver_transport::{ConnectionStatus, Endpoint, SessionId};
