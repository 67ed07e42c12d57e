mod builder;
mod notice;
mod reconnect;
mod state;

use palaver_actor::Actor;
use palaver_transport::{ConnectionStatus, Endpoint, SessionId};

use crate::error::Error;
use crate::transcript::Turn;
pub use builder::ControllerBuilder;
use state::{ControllerState, UpdateDraft};

/// A change the presentation layer should reflect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    /// A turn was appended to the transcript at `index`.
    TurnAppended {
        /// Position of the turn in the transcript.
        index: usize,
        /// The appended turn.
        turn: Turn,
    },
    /// Bring the turn at this index into view. Always follows
    /// `TurnAppended`, pointing at the newest turn.
    ScrollTo(usize),
    /// The derived connection status changed.
    StatusChanged(ConnectionStatus),
    /// The pending-response flag changed.
    PendingChanged(bool),
    /// The draft was consumed by a successful submission.
    DraftCleared,
}

/// Everything the presentation layer needs to draw the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// The connection status at the time of the snapshot.
    pub status: ConnectionStatus,
    /// Whether a reply is awaited.
    pub pending: bool,
    /// The unsent input.
    pub draft: String,
    /// Why the connection ended, if it has.
    pub last_error: Option<Error>,
    /// Every turn so far, oldest first.
    pub transcript: Vec<Turn>,
}

/// The conversation controller.
///
/// It owns exactly one transport session at a time and serializes every
/// transport event, submission and read through a single actor, so the
/// transcript order is the order in which things were observed.
///
/// Handles are cheap to clone. The controller shuts down when
/// [`Controller::shutdown`] is called or the last handle is dropped,
/// and the transport session is closed either way.
#[derive(Clone)]
pub struct Controller {
    handle: Actor<ControllerState>,
    endpoint: Endpoint,
}

impl Controller {
    /// Returns the session identity of this conversation.
    #[inline]
    pub fn session_id(&self) -> SessionId {
        self.endpoint.session_id()
    }

    /// Returns the endpoint this conversation talks to.
    #[inline]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Submits user text.
    ///
    /// Whitespace-only text is rejected without touching the transcript.
    /// When the connection is open, a user turn is appended and the text
    /// is sent. Otherwise a system turn records that nothing was sent,
    /// and the text is kept as the draft.
    pub async fn submit_turn<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<(), Error> {
        let text = text.into();
        self.handle
            .ask(move |state, handle| state.submit_turn(text, handle))
            .await
            .unwrap_or_else(|_| Err(shut_down()))
    }

    /// Submits the current draft, see [`Controller::submit_turn`].
    pub async fn submit_draft(&self) -> Result<(), Error> {
        self.handle
            .ask(|state, handle| {
                let draft = state.draft().to_owned();
                state.submit_turn(draft, handle)
            })
            .await
            .unwrap_or_else(|_| Err(shut_down()))
    }

    /// Replaces the unsent input.
    #[inline]
    pub fn update_draft<S: Into<String>>(&self, text: S) {
        self.handle.send(UpdateDraft(text.into())).ok();
    }

    /// Returns the unsent input.
    pub async fn draft(&self) -> String {
        self.handle
            .ask(|state, _| state.draft().to_owned())
            .await
            .unwrap_or_default()
    }

    /// Returns the connection status, derived from the live socket
    /// state at the time of the call.
    pub async fn current_status(&self) -> ConnectionStatus {
        self.handle
            .ask(|state, _| state.current_status())
            .await
            .unwrap_or(ConnectionStatus::Closed)
    }

    /// Returns whether a reply is awaited.
    pub async fn is_pending(&self) -> bool {
        self.handle
            .ask(|state, _| state.is_pending())
            .await
            .unwrap_or(false)
    }

    /// Returns a copy of the transcript.
    pub async fn transcript(&self) -> Vec<Turn> {
        self.handle
            .ask(|state, _| state.transcript().as_slice().to_vec())
            .await
            .unwrap_or_default()
    }

    /// Returns a consistent view of the whole conversation.
    ///
    /// After shutdown, `None` is returned since the state is gone.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.handle.ask(|state, _| state.snapshot()).await.ok()
    }

    /// Tears the conversation down.
    ///
    /// The transport session is closed unconditionally and the
    /// controller stops handling anything else. Calling this again is a
    /// no-op.
    pub async fn shutdown(&self) {
        self.handle
            .ask(|state, handle| state.shutdown(handle))
            .await
            .ok();
    }
}

#[inline]
fn shut_down() -> Error {
    Error::connection_not_open().with_reason("the conversation has shut down")
}
