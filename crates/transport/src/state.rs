use std::fmt::{self, Display};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// The live state of a socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketState {
    /// The connection is being established.
    Connecting = 0,
    /// The connection is established and can carry frames.
    Open = 1,
    /// A close has been requested but the socket has not finished.
    Closing = 2,
    /// The socket is closed.
    Closed = 3,
    /// The socket ended because of an error.
    Failed = 4,
}

impl SocketState {
    #[inline]
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            3 => Self::Closed,
            _ => Self::Failed,
        }
    }

    /// Returns `true` if the state machine may move from `self` to
    /// `next`. Nothing ever moves back to `Connecting` or `Open`.
    pub fn can_transition_to(self, next: SocketState) -> bool {
        use SocketState::*;
        match (self, next) {
            (Connecting, Open | Closing | Closed | Failed) => true,
            (Open, Closing | Closed | Failed) => true,
            (Closing, Closed | Failed) => true,
            _ => false,
        }
    }
}

/// The connection status shown to the user.
///
/// It is always derived from a [`SocketState`], never stored.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Waiting for the connection to open.
    Connecting,
    /// Ready to send and receive.
    Open,
    /// The connection has been closed.
    Closed,
    /// The connection ended with an error.
    Errored,
}

impl From<SocketState> for ConnectionStatus {
    #[inline]
    fn from(state: SocketState) -> Self {
        match state {
            SocketState::Connecting => Self::Connecting,
            SocketState::Open => Self::Open,
            SocketState::Closing | SocketState::Closed => Self::Closed,
            SocketState::Failed => Self::Errored,
        }
    }
}

impl Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "connected",
            Self::Closed => "disconnected",
            Self::Errored => "error",
        };
        f.write_str(s)
    }
}

/// A shared, lock-free cell holding a [`SocketState`].
///
/// All clones observe the same state. Transitions that the state machine
/// doesn't allow are rejected, so once a cell reaches a terminal state
/// it stays there.
#[derive(Clone, Debug)]
pub struct StateCell(Arc<AtomicU8>);

impl Default for StateCell {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    /// Creates a cell in the `Connecting` state.
    #[inline]
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(SocketState::Connecting as u8)))
    }

    /// Returns the current state.
    #[inline]
    pub fn get(&self) -> SocketState {
        SocketState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next` if allowed, returning whether the move happened.
    pub fn transition(&self, next: SocketState) -> bool {
        let result = self.0.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |current| {
                SocketState::from_u8(current)
                    .can_transition_to(next)
                    .then_some(next as u8)
            },
        );
        match result {
            Ok(prev) => {
                trace!(
                    from = ?SocketState::from_u8(prev),
                    to = ?next,
                    "socket state"
                );
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), SocketState::Connecting);
        assert!(cell.transition(SocketState::Open));
        assert!(cell.transition(SocketState::Closing));
        assert!(cell.transition(SocketState::Closed));
        assert_eq!(cell.get(), SocketState::Closed);
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let cell = StateCell::new();
        assert!(cell.transition(SocketState::Failed));
        assert!(!cell.transition(SocketState::Open));
        assert!(!cell.transition(SocketState::Closed));
        assert!(!cell.transition(SocketState::Connecting));
        assert_eq!(cell.get(), SocketState::Failed);
    }

    #[test]
    fn test_never_reopens_after_close_request() {
        let cell = StateCell::new();
        assert!(cell.transition(SocketState::Closing));
        assert!(!cell.transition(SocketState::Open));

        let clone = cell.clone();
        assert!(clone.transition(SocketState::Closed));
        assert_eq!(cell.get(), SocketState::Closed);
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(
            ConnectionStatus::from(SocketState::Connecting),
            ConnectionStatus::Connecting
        );
        assert_eq!(
            ConnectionStatus::from(SocketState::Open),
            ConnectionStatus::Open
        );
        assert_eq!(
            ConnectionStatus::from(SocketState::Closing),
            ConnectionStatus::Closed
        );
        assert_eq!(
            ConnectionStatus::from(SocketState::Failed),
            ConnectionStatus::Errored
        );
        assert_eq!(
            serde_json::to_string(&ConnectionStatus::Errored).unwrap(),
            "\"errored\""
        );
    }
}
