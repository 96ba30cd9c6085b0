// ── Candidate addresses ──
//
// One discovered endpoint at which a device might be reachable, and the
// base-URL formatting rules the prober applies to it.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use url::Url;

/// One candidate network endpoint for a discovered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddrInfo {
    pub addr: IpAddr,
    pub port: u16,
    /// Link-local IPv6 addresses need an explicit scope to connect.
    pub linklocal: bool,
    /// Interface index, appended as the zone for link-local addresses.
    pub interface: u32,
    /// Optional resource path advertised alongside the address
    /// (the eSCL `rs` TXT record).
    pub rs: Option<String>,
}

impl AddrInfo {
    /// Format the eSCL base URL for this endpoint.
    ///
    /// IPv6 literals are bracketed; a link-local address appends its
    /// zone as `%25<ifindex>` per RFC 6874. The result always ends
    /// with `/` so relative paths can be appended directly.
    pub fn base_url(&self) -> String {
        let host = match self.addr {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => {
                if self.linklocal {
                    format!("[{v6}%25{}]", self.interface)
                } else {
                    format!("[{v6}]")
                }
            }
        };

        match &self.rs {
            Some(rs) => format!("http://{host}:{}/{}/", self.port, rs.trim_matches('/')),
            None => format!("http://{host}:{}/", self.port),
        }
    }
}

/// Normalize a statically configured base URL so its path ends with `/`.
pub fn normalize_base_url(url: &Url) -> String {
    let s = url.to_string();
    if s.ends_with('/') {
        s
    } else {
        format!("{s}/")
    }
}
