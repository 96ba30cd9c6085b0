// eSCL HTTP client
//
// Thin wrapper over `reqwest::Client`. Base URLs are carried as strings
// rather than `url::Url` because discovered link-local IPv6 endpoints
// need an RFC 6874 zone suffix (`%25<ifindex>`) that the WHATWG parser
// behind `Url` rejects; an unparsable URL simply surfaces as a transport
// error when the request is sent, which callers already treat as a
// fetch failure.

use bytes::Bytes;
use tracing::debug;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Path of the eSCL capability document, relative to the device base URL.
pub const CAPABILITIES_PATH: &str = "ScannerCapabilities";

/// Shared HTTP client for talking to eSCL scanners.
///
/// Cheap to clone: every clone shares the same connection pool, so a
/// single client instance serves all devices in the registry.
#[derive(Debug, Clone)]
pub struct EsclClient {
    http: reqwest::Client,
}

impl EsclClient {
    /// Build a client from a [`TransportConfig`].
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// Wrap a pre-built `reqwest::Client`.
    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// GET `base` + `path`, returning the raw body on a 2xx status.
    pub async fn get(&self, base: &str, path: &str) -> Result<Bytes, Error> {
        let url = join_base(base, path);
        debug!(%url, "GET");

        let resp = self.http.get(&url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url,
            });
        }

        resp.bytes().await.map_err(Error::Transport)
    }

    /// Fetch the device's capability document.
    pub async fn capabilities(&self, base: &str) -> Result<Bytes, Error> {
        self.get(base, CAPABILITIES_PATH).await
    }
}

/// Join a base URL with a relative path, inserting a `/` if the base
/// lacks a trailing one.
pub(crate) fn join_base(base: &str, path: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
