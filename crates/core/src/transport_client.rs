use std::sync::Arc;

use palaver_transport::{Connector, Endpoint, EventSink, TransportSession};

type OpenFn = Arc<
    dyn Fn(&Endpoint, EventSink) -> Box<dyn TransportSession> + Send + Sync,
>;

/// A wrapper around a connector that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct TransportClient {
    open_fn: OpenFn,
}

impl TransportClient {
    #[inline]
    pub fn new<C: Connector>(connector: C) -> Self {
        // Erase `C` so the controller doesn't need a generic parameter.
        let open_fn: OpenFn = Arc::new(
            move |endpoint: &Endpoint,
                  sink: EventSink|
                  -> Box<dyn TransportSession> {
                Box::new(connector.open(endpoint, sink))
            },
        );
        Self { open_fn }
    }

    /// Opens a fresh session against `endpoint`.
    #[inline]
    pub fn open(
        &self,
        endpoint: &Endpoint,
        sink: EventSink,
    ) -> Box<dyn TransportSession> {
        trace!(url = %endpoint, "opening session");
        (self.open_fn)(endpoint, sink)
    }
}

#[cfg(test)]
mod tests {
    use palaver_test_transport::TestConnector;
    use palaver_transport::SocketState;

    use super::*;

    #[test]
    fn test_open_through_erased_connector() {
        let connector = TestConnector::accepting();
        let client = TransportClient::new(connector.clone());
        let endpoint = Endpoint::new("localhost", false, 3.into());

        let session = client.open(&endpoint, EventSink::new(|_| {}));
        assert_eq!(session.state(), SocketState::Open);
        session.send("ping").unwrap();

        let remote = connector.last_remote().unwrap();
        assert_eq!(remote.sent(), vec!["ping"]);
        assert_eq!(remote.endpoint(), &endpoint);
    }
}
