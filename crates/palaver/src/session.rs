use std::time::Duration;

use palaver_core::{
    ClientConfig, ConnectionStatus, Controller, ControllerBuilder, Error,
    SessionId, Snapshot, Update,
};
use palaver_ws_transport::WsConnector;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    connector: WsConnector,
    config: ClientConfig,
    session_id: Option<SessionId>,
    on_update: Option<Box<dyn Fn(&Update) + Send + Sync>>,
}

impl SessionBuilder {
    /// Creates a session builder with the specified configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            connector: WsConnector::new(),
            config,
            session_id: None,
            on_update: None,
        }
    }

    /// Gives up on the opening handshake after `timeout`.
    #[inline]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connector = self.connector.with_connect_timeout(timeout);
        self
    }

    /// Uses a fixed session identity.
    #[inline]
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Attaches a callback to be invoked whenever the conversation
    /// changes.
    #[inline]
    pub fn on_update(
        mut self,
        on_update: impl Fn(&Update) + Send + Sync + 'static,
    ) -> Self {
        self.on_update = Some(Box::new(on_update));
        self
    }

    /// Builds a new session and starts connecting.
    pub fn build(self) -> Session {
        let mut builder = ControllerBuilder::with_connector(self.connector)
            .with_config(self.config);
        if let Some(session_id) = self.session_id {
            builder = builder.with_session_id(session_id);
        }
        if let Some(on_update) = self.on_update {
            builder = builder.on_update(on_update);
        }
        Session {
            controller: builder.build(),
        }
    }
}

/// A chat session, like a window that displays messages and has an input
/// box.
///
/// It is a thin wrapper around a [`Controller`] talking over a
/// WebSocket.
pub struct Session {
    controller: Controller,
}

impl Session {
    /// Sends a message to the assistant.
    #[inline]
    pub async fn send_message(&self, message: &str) -> Result<(), Error> {
        self.controller.submit_turn(message).await
    }

    /// Sends the draft again, which holds the last message that could
    /// not be sent.
    #[inline]
    pub async fn retry(&self) -> Result<(), Error> {
        self.controller.submit_draft().await
    }

    /// Returns the connection status.
    #[inline]
    pub async fn status(&self) -> ConnectionStatus {
        self.controller.current_status().await
    }

    /// Returns a view of the whole conversation, or `None` once the
    /// session is shut down.
    #[inline]
    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.controller.snapshot().await
    }

    /// Returns the underlying controller.
    #[inline]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Closes the connection and stops the conversation.
    #[inline]
    pub async fn shutdown(&self) {
        self.controller.shutdown().await;
    }
}
