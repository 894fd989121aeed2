use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

/// Decides whether a host on the campus network is directly reachable.
///
/// The ceremony uses this to guess whether the portal will demand an
/// email OTP: inside the campus network it does not, outside it does.
#[async_trait]
pub trait NetworkPresence: Send + Sync {
    /// Whether `host` answers from here.
    async fn is_reachable(&self, host: &str) -> bool;
}

/// Default [`NetworkPresence`] built on a plain TCP connect.
///
/// A completed handshake counts as reachable, and so does a connection
/// refused, since a refusal proves a host answered. Timeouts and
/// resolution failures count as unreachable.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    port: u16,
    timeout: Duration,
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self {
            port: 443,
            timeout: Duration::from_secs(2),
        }
    }
}

impl TcpProbe {
    /// Probe a different port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Adjust how long the connect may take before the host counts as
    /// unreachable.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl NetworkPresence for TcpProbe {
    async fn is_reachable(&self, host: &str) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect((host, self.port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => e.kind() == ErrorKind::ConnectionRefused,
            Err(_) => {
                tracing::debug!(host, port = self.port, "reachability probe timed out");
                false
            }
        }
    }
}
