//! An in-process fake transport for testing purpose.
//!
//! [`TestConnector`] stands in for a real socket. Every session it opens
//! gets a [`Remote`], the backend's end of the connection, which tests
//! use to accept the connection, push frames, hang up or fail it, and
//! inspect what the client sent. Replies to sent frames can also be
//! scripted up front with [`PresetReply`].
//!
//! # Note
//!
//! This crate is not meant for production use. All state sits behind
//! plain mutexes and frames are copied freely.

#[macro_use]
extern crate tracing;

mod preset;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use palaver_transport::{
    CloseInfo, Connector, Endpoint, EventSink, SendError, SocketState,
    StateCell, TransportSession,
};

pub use preset::*;

/// How new connections are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AcceptMode {
    /// Stay in `Connecting` until [`Remote::accept`] is called.
    #[default]
    Manual,
    /// Open as soon as the session is created.
    Immediately,
    /// Fail as soon as the session is created.
    Refuse,
}

#[derive(Default)]
struct Shared {
    accept_mode: AcceptMode,
    replies: VecDeque<PresetReply>,
    remotes: Vec<Remote>,
}

/// A fake connector. Clones share the same script and connections.
#[derive(Clone, Default)]
pub struct TestConnector {
    shared: Arc<Mutex<Shared>>,
}

impl TestConnector {
    /// Creates a connector whose sessions open immediately.
    #[inline]
    pub fn accepting() -> Self {
        let connector = Self::default();
        connector.set_accept_mode(AcceptMode::Immediately);
        connector
    }

    /// Changes how subsequent connections are treated.
    #[inline]
    pub fn set_accept_mode(&self, mode: AcceptMode) {
        lock(&self.shared).accept_mode = mode;
    }

    /// Appends a reply to the script. Each frame sent by any session
    /// consumes the next reply; once the script runs out the backend
    /// stays silent.
    #[inline]
    pub fn add_reply(&self, reply: PresetReply) {
        lock(&self.shared).replies.push_back(reply);
    }

    /// Returns the backend end of the most recent session.
    #[inline]
    pub fn last_remote(&self) -> Option<Remote> {
        lock(&self.shared).remotes.last().cloned()
    }

    /// Returns how many sessions have been opened.
    #[inline]
    pub fn connection_count(&self) -> usize {
        lock(&self.shared).remotes.len()
    }
}

impl Connector for TestConnector {
    type Session = TestSession;

    fn open(&self, endpoint: &Endpoint, sink: EventSink) -> TestSession {
        let remote = Remote {
            endpoint: endpoint.clone(),
            state: StateCell::new(),
            sink,
            sent: Default::default(),
        };
        let mode = {
            let mut shared = lock(&self.shared);
            shared.remotes.push(remote.clone());
            shared.accept_mode
        };
        debug!(url = %endpoint, ?mode, "fake connection");

        match mode {
            AcceptMode::Manual => {}
            AcceptMode::Immediately => remote.accept(),
            AcceptMode::Refuse => remote.fail("connection refused"),
        }
        TestSession {
            remote,
            shared: Arc::clone(&self.shared),
        }
    }
}

/// The client end of a fake connection.
pub struct TestSession {
    remote: Remote,
    shared: Arc<Mutex<Shared>>,
}

impl TransportSession for TestSession {
    #[inline]
    fn state(&self) -> SocketState {
        self.remote.state.get()
    }

    fn send(&self, text: &str) -> Result<(), SendError> {
        let state = self.remote.state.get();
        if state != SocketState::Open {
            return Err(SendError::NotConnected(state));
        }
        lock(&self.remote.sent).push(text.to_owned());

        let Some(reply) = lock(&self.shared).replies.pop_front() else {
            return Ok(());
        };
        if reply.frames.is_empty() {
            return Ok(());
        }
        let remote = self.remote.clone();
        tokio::spawn(async move {
            tokio::time::sleep(reply.delay()).await;
            for frame in reply.frames {
                remote.push_frame(frame);
            }
        });
        Ok(())
    }

    fn close(&self) {
        let state = &self.remote.state;
        if state.transition(SocketState::Closing) {
            state.transition(SocketState::Closed);
            self.remote.sink.closed(None);
        }
    }
}

/// The backend end of a fake connection.
#[derive(Clone)]
pub struct Remote {
    endpoint: Endpoint,
    state: StateCell,
    sink: EventSink,
    sent: Arc<Mutex<Vec<String>>>,
}

impl Remote {
    /// Completes the handshake.
    pub fn accept(&self) {
        if self.state.transition(SocketState::Open) {
            self.sink.opened();
        }
    }

    /// Delivers one text frame to the client.
    ///
    /// Frames pushed while the connection is not open are dropped, as a
    /// real socket would never deliver them.
    pub fn push_frame<S: Into<String>>(&self, text: S) {
        if self.state.get() != SocketState::Open {
            trace!("dropping frame on a connection that is not open");
            return;
        }
        self.sink.message(text);
    }

    /// Closes the connection from the backend side.
    pub fn hang_up(&self, info: Option<CloseInfo>) {
        if self.state.transition(SocketState::Closed) {
            self.sink.closed(info);
        }
    }

    /// Fails the connection, reporting an error followed by a close.
    pub fn fail<S: Into<String>>(&self, info: S) {
        if self.state.transition(SocketState::Failed) {
            self.sink.errored(info);
            self.sink.closed(None);
        }
    }

    /// Returns the frames the client sent, in order.
    #[inline]
    pub fn sent(&self) -> Vec<String> {
        lock(&self.sent).clone()
    }

    /// Returns the endpoint the client connected to.
    #[inline]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the live socket state.
    #[inline]
    pub fn state(&self) -> SocketState {
        self.state.get()
    }
}

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use palaver_transport::TransportEvent;

    use super::*;

    fn recording_sink() -> (EventSink, Arc<Mutex<Vec<TransportEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = EventSink::new({
            let events = Arc::clone(&events);
            move |event| events.lock().unwrap().push(event)
        });
        (sink, events)
    }

    fn endpoint() -> Endpoint {
        Endpoint::new("localhost:8000", false, 1.into())
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_replies() {
        let connector = TestConnector::accepting();
        connector.add_reply(PresetReply::with_frames(["Hello, ", "world!"]));
        connector.add_reply(PresetReply::silent());

        let (sink, events) = recording_sink();
        let session = connector.open(&endpoint(), sink);
        assert_eq!(session.state(), SocketState::Open);

        session.send("Hi").unwrap();
        session.send("Anyone?").unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                TransportEvent::Opened,
                TransportEvent::Message("Hello, ".to_owned()),
                TransportEvent::Message("world!".to_owned()),
            ]
        );
        let remote = connector.last_remote().unwrap();
        assert_eq!(remote.sent(), vec!["Hi", "Anyone?"]);
        assert_eq!(remote.endpoint().url(), "ws://localhost:8000/ws/1");
    }

    #[test]
    fn test_manual_accept_and_send_rejection() {
        let connector = TestConnector::default();
        let (sink, events) = recording_sink();
        let session = connector.open(&endpoint(), sink);

        assert_eq!(
            session.send("early"),
            Err(SendError::NotConnected(SocketState::Connecting))
        );
        connector.last_remote().unwrap().accept();
        assert_eq!(session.state(), SocketState::Open);

        session.close();
        session.close();
        assert_eq!(session.state(), SocketState::Closed);
        assert!(session.send("late").is_err());
        assert_eq!(
            *events.lock().unwrap(),
            vec![TransportEvent::Opened, TransportEvent::Closed(None)]
        );
    }

    #[test]
    fn test_refused_connection() {
        let connector = TestConnector::default();
        connector.set_accept_mode(AcceptMode::Refuse);
        let (sink, events) = recording_sink();
        let session = connector.open(&endpoint(), sink);

        assert_eq!(session.state(), SocketState::Failed);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                TransportEvent::Errored("connection refused".to_owned()),
                TransportEvent::Closed(None),
            ]
        );
    }
}
