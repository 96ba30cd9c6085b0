use thiserror::Error;

/// Top-level error type for the `scanfly-api` crate.
///
/// A capability fetch can fail three ways at this layer: the transport
/// itself (connect/DNS/timeout), a non-success HTTP status, or a broken
/// client configuration. `scanfly-core` treats the first two identically
/// when deciding whether to fall back to the next candidate address.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// TLS setup or client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// The HTTP status code, if the server got far enough to send one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Tls(_) => None,
        }
    }

    /// Returns `true` if the request never reached the server.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect() || e.is_timeout())
    }
}
