use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A submission was made while the connection was not open.
    ConnectionNotOpen,
    /// A submission was empty or whitespace only.
    EmptySubmission,
    /// The connection failed.
    SocketError,
    /// The connection was closed.
    SocketClosed,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConnectionNotOpen => write!(f, "Connection not open"),
            ErrorKind::EmptySubmission => write!(f, "Empty submission"),
            ErrorKind::SocketError => write!(f, "Socket error"),
            ErrorKind::SocketClosed => write!(f, "Socket closed"),
        }
    }
}

/// Describes a conversation error.
///
/// None of these errors are fatal. They are reported back to the caller
/// or recorded in the transcript, and the controller keeps running.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    #[inline]
    fn new(kind: ErrorKind) -> Self {
        Self { kind, reason: None }
    }

    /// Creates a new error with the `ConnectionNotOpen` kind.
    #[inline]
    pub fn connection_not_open() -> Self {
        Self::new(ErrorKind::ConnectionNotOpen)
    }

    /// Creates a new error with the `EmptySubmission` kind.
    #[inline]
    pub fn empty_submission() -> Self {
        Self::new(ErrorKind::EmptySubmission)
    }

    /// Creates a new error with the `SocketError` kind.
    #[inline]
    pub fn socket_error() -> Self {
        Self::new(ErrorKind::SocketError)
    }

    /// Creates a new error with the `SocketClosed` kind.
    #[inline]
    pub fn socket_closed() -> Self {
        Self::new(ErrorKind::SocketClosed)
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => Display::fmt(&self.kind, f),
        }
    }
}

impl StdError for Error {}
