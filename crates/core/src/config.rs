use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1:8000";

/// How the controller reconnects after the connection is lost.
///
/// Delays grow exponentially from `initial_interval` up to
/// `max_interval`, each randomized by `randomization_factor`, and the
/// controller gives up after `max_attempts` consecutive failures.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first attempt.
    pub initial_interval: Duration,
    /// Upper bound for a single delay.
    pub max_interval: Duration,
    /// Growth factor between attempts.
    pub multiplier: f64,
    /// Jitter applied to every delay, between 0 and 1.
    pub randomization_factor: f64,
    /// Attempts made before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
            randomization_factor: 0.5,
            max_attempts: 5,
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug, Default)]
pub struct ClientConfigBuilder {
    host: Option<String>,
    secure: bool,
    response_timeout: Option<Duration>,
    reconnect: Option<ReconnectPolicy>,
}

impl ClientConfigBuilder {
    /// Creates a builder with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend host, optionally with a port.
    #[inline]
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Uses the secure socket scheme.
    #[inline]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Gives up waiting for a reply after `timeout`.
    #[inline]
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Reconnects after the connection is lost.
    #[inline]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> ClientConfig {
        ClientConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            secure: self.secure,
            response_timeout: self.response_timeout,
            reconnect: self.reconnect,
        }
    }
}

/// Configuration for a conversation.
///
/// By default there is no response timeout and no reconnection: a lost
/// connection stays lost.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub(crate) host: String,
    pub(crate) secure: bool,
    pub(crate) response_timeout: Option<Duration>,
    pub(crate) reconnect: Option<ReconnectPolicy>,
}

impl Default for ClientConfig {
    #[inline]
    fn default() -> Self {
        ClientConfigBuilder::new().build()
    }
}

impl ClientConfig {
    /// Returns the backend host.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns whether the secure scheme is used.
    #[inline]
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Returns the response timeout, if any.
    #[inline]
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout
    }

    /// Returns the reconnection policy, if any.
    #[inline]
    pub fn reconnect(&self) -> Option<&ReconnectPolicy> {
        self.reconnect.as_ref()
    }
}
