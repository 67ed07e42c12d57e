//! A WebSocket transport built on `tokio-tungstenite`.
//!
//! Each session runs one background task that owns the socket. The
//! session handle talks to that task over a command channel, and the
//! task reports everything it observes through the session's
//! [`EventSink`].
//!
//! Secure (`wss`) endpoints need the `tls` feature.

#[macro_use]
extern crate tracing;

mod socket;

use std::time::Duration;

use palaver_transport::{
    Connector, Endpoint, EventSink, SendError, SocketState, StateCell,
    TransportSession,
};
use tokio::sync::mpsc;
use tracing::Instrument;

use socket::{Command, run_socket};

/// Opens [`WsSession`]s.
#[derive(Clone, Debug, Default)]
pub struct WsConnector {
    connect_timeout: Option<Duration>,
}

impl WsConnector {
    /// Creates a connector without a connect timeout.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails sessions that are not open within `timeout`.
    #[inline]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

impl Connector for WsConnector {
    type Session = WsSession;

    fn open(&self, endpoint: &Endpoint, sink: EventSink) -> WsSession {
        let state = StateCell::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let url = endpoint.url();
        debug!(%url, "opening socket");

        tokio::spawn(
            run_socket(
                url.clone(),
                self.connect_timeout,
                state.clone(),
                sink,
                cmd_rx,
            )
            .instrument(trace_span!("socket", url = %url)),
        );
        WsSession { state, cmd_tx }
    }
}

/// A WebSocket session. Dropping it closes the socket.
#[derive(Debug)]
pub struct WsSession {
    state: StateCell,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl TransportSession for WsSession {
    #[inline]
    fn state(&self) -> SocketState {
        self.state.get()
    }

    fn send(&self, text: &str) -> Result<(), SendError> {
        let state = self.state.get();
        if state != SocketState::Open {
            return Err(SendError::NotConnected(state));
        }
        self.cmd_tx
            .send(Command::Send(text.to_owned()))
            .map_err(|_| SendError::NotConnected(self.state.get()))
    }

    fn close(&self) {
        if self.state.transition(SocketState::Closing) {
            debug!("close requested");
        }
        // The socket task may already be gone.
        self.cmd_tx.send(Command::Close).ok();
    }
}

impl Drop for WsSession {
    fn drop(&mut self) {
        self.close();
    }
}
