use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, PoisonError};

/// Details about how a connection was closed by the peer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CloseInfo {
    /// The close code sent by the peer.
    pub code: u16,
    /// The close reason sent by the peer, possibly empty.
    pub reason: String,
}

/// A lifecycle event reported by a transport session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransportEvent {
    /// The connection is open.
    Opened,
    /// A complete text frame arrived.
    Message(String),
    /// The connection is closed. No further events follow.
    Closed(Option<CloseInfo>),
    /// The connection failed. A `Closed` event follows.
    Errored(String),
}

type Listener = Box<dyn Fn(TransportEvent) + Send + Sync>;

#[derive(Default)]
struct Fired {
    opened: bool,
    errored: bool,
    closed: bool,
}

struct Inner {
    listener: Listener,
    fired: Mutex<Fired>,
}

/// The callback surface a transport reports its events to.
///
/// The sink enforces the event contract on behalf of the transport:
/// `Opened`, `Errored` and `Closed` are delivered at most once each,
/// messages are delivered in the order they are reported, and nothing
/// is delivered after `Closed`.
#[derive(Clone)]
pub struct EventSink {
    inner: Arc<Inner>,
}

impl EventSink {
    /// Creates a sink forwarding events to `listener`.
    #[inline]
    pub fn new(
        listener: impl Fn(TransportEvent) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                listener: Box::new(listener),
                fired: Mutex::new(Fired::default()),
            }),
        }
    }

    /// Reports that the connection opened.
    #[inline]
    pub fn opened(&self) {
        self.emit(TransportEvent::Opened);
    }

    /// Reports one inbound text frame.
    #[inline]
    pub fn message<S: Into<String>>(&self, text: S) {
        self.emit(TransportEvent::Message(text.into()));
    }

    /// Reports an error.
    #[inline]
    pub fn errored<S: Into<String>>(&self, info: S) {
        self.emit(TransportEvent::Errored(info.into()));
    }

    /// Reports that the connection closed.
    #[inline]
    pub fn closed(&self, info: Option<CloseInfo>) {
        self.emit(TransportEvent::Closed(info));
    }

    /// Returns `true` once `Closed` has been delivered.
    pub fn is_closed(&self) -> bool {
        self.inner
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    fn emit(&self, event: TransportEvent) {
        // Held while calling the listener so that concurrent reporters
        // cannot interleave with a `Closed` event.
        let mut fired = self
            .inner
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if fired.closed {
            trace!("dropping event after close: {event:?}");
            return;
        }
        let first = match &event {
            TransportEvent::Opened => {
                !std::mem::replace(&mut fired.opened, true)
            }
            TransportEvent::Errored(_) => {
                !std::mem::replace(&mut fired.errored, true)
            }
            TransportEvent::Closed(_) => {
                !std::mem::replace(&mut fired.closed, true)
            }
            TransportEvent::Message(_) => true,
        };
        if !first {
            trace!("dropping repeated event: {event:?}");
            return;
        }
        (self.inner.listener)(event);
    }
}

impl Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recording_sink() -> (EventSink, Arc<Mutex<Vec<TransportEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = EventSink::new({
            let events = Arc::clone(&events);
            move |event| events.lock().unwrap().push(event)
        });
        (sink, events)
    }

    #[test]
    fn test_lifecycle_events_fire_once() {
        let (sink, events) = recording_sink();
        sink.opened();
        sink.opened();
        sink.message("a");
        sink.message("b");
        sink.errored("boom");
        sink.errored("boom again");
        sink.closed(None);

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                TransportEvent::Opened,
                TransportEvent::Message("a".to_owned()),
                TransportEvent::Message("b".to_owned()),
                TransportEvent::Errored("boom".to_owned()),
                TransportEvent::Closed(None),
            ]
        );
    }

    #[test]
    fn test_nothing_after_close() {
        let (sink, events) = recording_sink();
        sink.closed(Some(CloseInfo {
            code: 1000,
            reason: "bye".to_owned(),
        }));
        sink.opened();
        sink.message("late");
        sink.errored("late");
        sink.closed(None);

        assert!(sink.is_closed());
        assert_eq!(events.lock().unwrap().len(), 1);
    }
}
