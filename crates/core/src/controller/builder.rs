use palaver_actor::Actor;
use palaver_transport::{Connector, Endpoint, SessionId};

use super::state::{ControllerState, Initialize};
use super::{Controller, Update};
use crate::config::ClientConfig;
use crate::transport_client::TransportClient;

/// [`Controller`] builder.
pub struct ControllerBuilder {
    pub(crate) transport: TransportClient,
    pub(crate) config: ClientConfig,
    pub(crate) session_id: Option<SessionId>,
    pub(crate) on_update: Option<Box<dyn Fn(&Update) + Send + Sync>>,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified connector.
    #[inline]
    pub fn with_connector<C: Connector>(connector: C) -> Self {
        Self {
            transport: TransportClient::new(connector),
            config: ClientConfig::default(),
            session_id: None,
            on_update: None,
        }
    }

    /// Sets the client configuration.
    #[inline]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a fixed session identity instead of deriving one from the
    /// clock.
    #[inline]
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Attaches a callback to be invoked on every [`Update`].
    ///
    /// The callback runs on the controller's task, in the order the
    /// updates happen. It should return quickly and must not call back
    /// into the controller and wait for it.
    #[inline]
    pub fn on_update(
        mut self,
        on_update: impl Fn(&Update) + Send + Sync + 'static,
    ) -> Self {
        self.on_update = Some(Box::new(on_update));
        self
    }

    /// Builds the controller and starts connecting.
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> Controller {
        let Self {
            transport,
            config,
            session_id,
            on_update,
        } = self;

        let session_id = session_id.unwrap_or_else(SessionId::now);
        let endpoint =
            Endpoint::new(config.host.clone(), config.secure, session_id);
        let state = ControllerState::new(
            transport,
            config,
            endpoint.clone(),
            on_update,
        );

        let handle = Actor::spawn(state, Some("conversation"));
        // Nothing else can be in the mailbox yet, so this is always the
        // first message handled.
        handle.send(Initialize).ok();
        Controller { handle, endpoint }
    }
}
