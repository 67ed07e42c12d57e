use std::error::Error;
use std::fmt::{self, Display};

use crate::{ConnectionStatus, Endpoint, EventSink, SocketState};

/// The error returned when a frame cannot be handed to the socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SendError {
    /// The socket is not open. Nothing was transmitted.
    NotConnected(SocketState),
}

impl Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::NotConnected(state) => {
                write!(f, "not connected (socket is {state:?})")
            }
        }
    }
}

impl Error for SendError {}

/// One persistent connection to an [`Endpoint`].
///
/// A session is never reopened. Once it reaches a terminal state it is
/// inert, and a fresh session must be opened to talk to the endpoint
/// again.
pub trait TransportSession: Send + Sync + 'static {
    /// Returns the live socket state.
    fn state(&self) -> SocketState;

    /// Returns the connection status derived from [`Self::state`].
    #[inline]
    fn status(&self) -> ConnectionStatus {
        self.state().into()
    }

    /// Transmits `text` verbatim as one text frame.
    ///
    /// Fails without transmitting anything unless the socket is open.
    /// There is no queueing and no retry.
    fn send(&self, text: &str) -> Result<(), SendError>;

    /// Closes the connection regardless of its current state.
    ///
    /// Calling this more than once is harmless. After this returns the
    /// state is never `Open` again.
    fn close(&self);
}

impl<T: TransportSession + ?Sized> TransportSession for Box<T> {
    #[inline]
    fn state(&self) -> SocketState {
        (**self).state()
    }

    #[inline]
    fn send(&self, text: &str) -> Result<(), SendError> {
        (**self).send(text)
    }

    #[inline]
    fn close(&self) {
        (**self).close()
    }
}

/// A type that opens transport sessions.
///
/// Once the connector is created it should behave like a stateless
/// factory: every call to [`Connector::open`] yields an independent
/// session.
pub trait Connector: Send + Sync + 'static {
    /// The session type this connector opens.
    type Session: TransportSession;

    /// Starts connecting to `endpoint` and returns the session right
    /// away, in the `Connecting` state unless the connection failed
    /// immediately.
    ///
    /// All lifecycle events of the session are reported to `sink`.
    fn open(&self, endpoint: &Endpoint, sink: EventSink) -> Self::Session;
}
