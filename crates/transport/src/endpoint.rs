use std::fmt::{self, Display};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Identifies one client session to the backend.
///
/// The identifier is the wall-clock time in whole seconds at which the
/// session started. It only addresses the endpoint; it is not a secret
/// and two sessions started within the same second share it.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Derives an identifier from the current wall-clock time.
    #[inline]
    pub fn now() -> Self {
        Self::at(SystemTime::now())
    }

    /// Derives an identifier from the given time. Times before the Unix
    /// epoch map to zero.
    #[inline]
    pub fn at(time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    /// Returns the raw numeric value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The address of the assistant's socket for one session, of the form
/// `<ws|wss>://<host>/ws/<session id>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    secure: bool,
    session_id: SessionId,
}

impl Endpoint {
    /// Creates an endpoint. `host` may include a port, e.g.
    /// `example.com:8000`. Use `secure` when the client is served over a
    /// secure origin, which selects the `wss` scheme.
    #[inline]
    pub fn new<S: Into<String>>(
        host: S,
        secure: bool,
        session_id: SessionId,
    ) -> Self {
        let host = host.into();
        let host = host.trim_end_matches('/').to_owned();
        Self {
            host,
            secure,
            session_id,
        }
    }

    /// Returns the URL scheme.
    #[inline]
    pub fn scheme(&self) -> &'static str {
        if self.secure { "wss" } else { "ws" }
    }

    /// Returns the host part.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the session this endpoint addresses.
    #[inline]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the full URL.
    #[inline]
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/ws/{}", self.scheme(), self.host, self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_url() {
        let endpoint =
            Endpoint::new("localhost:8000", false, 1_700_000_000.into());
        assert_eq!(endpoint.url(), "ws://localhost:8000/ws/1700000000");

        let endpoint = Endpoint::new("chat.example.com/", true, 42.into());
        assert_eq!(endpoint.host(), "chat.example.com");
        assert_eq!(endpoint.url(), "wss://chat.example.com/ws/42");
    }

    #[test]
    fn test_session_id_is_whole_seconds() {
        let time = UNIX_EPOCH + Duration::from_millis(12_345);
        assert_eq!(SessionId::at(time).get(), 12);
        assert_eq!(SessionId::at(UNIX_EPOCH - Duration::from_secs(1)).get(), 0);
    }
}
