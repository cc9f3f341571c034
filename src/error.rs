use std::fmt;
use std::io;

/// Error domain for every fallible operation in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A MIME type or extension has no entry in the registry.
    MimeNotFound,
    /// Response headers were already emitted for the current response.
    HeadersAlreadySent,
    /// The byte source could not be opened or read.
    SourceUnreadable,
    /// The request was cancelled while the body was being written.
    Cancelled,
    /// Writing to the response sink failed.
    SinkFailed,
    InvalidArg,
    Failed,
}

#[derive(Debug)]
pub struct MimedropError {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MimedropError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn mime_not_found(key: &str) -> Self {
        Self::new(ErrorKind::MimeNotFound, format!("no registry entry for {:?}", key))
    }

    pub fn headers_already_sent() -> Self {
        Self::new(
            ErrorKind::HeadersAlreadySent,
            "response headers were already sent",
        )
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "Operation cancelled")
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::MimeNotFound
    }

    /// Re-tags an I/O failure coming from a byte source.
    pub(crate) fn unreadable(err: io::Error, what: impl fmt::Display) -> Self {
        Self::with_source(
            ErrorKind::SourceUnreadable,
            format!("{}: {}", what, err),
            Box::new(err),
        )
    }
}

impl fmt::Display for MimedropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for MimedropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<io::Error> for MimedropError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::UnexpectedEof => ErrorKind::SourceUnreadable,
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::WriteZero => ErrorKind::SinkFailed,
            io::ErrorKind::InvalidInput => ErrorKind::InvalidArg,
            _ => ErrorKind::Failed,
        };

        Self::with_source(kind, err.to_string(), Box::new(err))
    }
}

pub type MimedropResult<T> = Result<T, MimedropError>;
