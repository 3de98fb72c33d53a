//! Live connectivity probes.
//!
//! The tester runs a minimal reachability/credential check for one section:
//! a TCP connect for the database, an HTTP GET for URL-based services. It
//! consumes the section's real (unmasked) values for the duration of the
//! probe only — they never appear in the result, and every probe runs under
//! a bounded timeout so a dead endpoint cannot hang the caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::registry::{ProbeKind, Section};

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Structured outcome of a connection test.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Whether the probe succeeded.
    pub success: bool,
    /// Human-readable outcome for operator diagnosis. Never contains a
    /// secret value.
    pub message: String,
    /// When the probe completed.
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
            timestamp: Utc::now(),
        }
    }

    fn fail(message: String) -> Self {
        Self {
            success: false,
            message,
            timestamp: Utc::now(),
        }
    }
}

/// A concrete probe built from a section's resolved values.
#[derive(Clone)]
pub enum ProbeTarget {
    /// TCP connect.
    Tcp { host: String, port: u16 },
    /// HTTP GET, optionally sending a credential header.
    Http {
        url: String,
        /// `(header name, header value)` — the value is a secret.
        auth_header: Option<(String, String)>,
    },
}

impl fmt::Debug for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => f
                .debug_struct("Tcp")
                .field("host", host)
                .field("port", port)
                .finish(),
            Self::Http { url, auth_header } => f
                .debug_struct("Http")
                .field("url", url)
                .field(
                    "auth_header",
                    &auth_header.as_ref().map(|(name, _)| (name, "[REDACTED]")),
                )
                .finish(),
        }
    }
}

/// Executes probe targets. A trait seam so tests can substitute a
/// deterministic runner for the real network.
#[async_trait::async_trait]
pub trait ProbeRunner: Send + Sync {
    /// Run the probe. `Ok` carries a success message, `Err` a failure
    /// message. Neither may contain credential values.
    async fn run(&self, target: &ProbeTarget) -> Result<String, String>;
}

/// The production runner: real TCP connects and HTTP requests.
pub struct NetworkProbeRunner {
    client: reqwest::Client,
}

impl NetworkProbeRunner {
    /// Create a runner with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for NetworkProbeRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProbeRunner for NetworkProbeRunner {
    async fn run(&self, target: &ProbeTarget) -> Result<String, String> {
        match target {
            ProbeTarget::Tcp { host, port } => {
                match tokio::net::TcpStream::connect((host.as_str(), *port)).await {
                    Ok(_) => Ok(format!("reached {host}:{port}")),
                    Err(e) => Err(format!("cannot reach {host}:{port}: {e}")),
                }
            }
            ProbeTarget::Http { url, auth_header } => {
                let mut request = self.client.get(url.clone());
                if let Some((name, value)) = auth_header {
                    request = request.header(name.as_str(), value.as_str());
                }
                match request.send().await {
                    Ok(response) => {
                        let status = response.status();
                        if status.is_success() || status.is_redirection() {
                            Ok(format!("endpoint responded with HTTP {status}"))
                        } else {
                            // Reachable but rejected — credentials or
                            // config are wrong.
                            Err(format!("endpoint rejected the request: HTTP {status}"))
                        }
                    }
                    Err(e) => Err(format!("request to endpoint failed: {e}")),
                }
            }
        }
    }
}

impl fmt::Debug for NetworkProbeRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkProbeRunner").finish_non_exhaustive()
    }
}

/// Runs a section's probe against its resolved values.
pub struct ConnectionTester {
    runner: Arc<dyn ProbeRunner>,
    timeout: Duration,
}

impl ConnectionTester {
    /// Create a tester with the given runner and per-probe timeout.
    #[must_use]
    pub fn new(runner: Arc<dyn ProbeRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    /// A tester using the real network and the default timeout.
    #[must_use]
    pub fn with_network(timeout: Duration) -> Self {
        Self::new(Arc::new(NetworkProbeRunner::new()), timeout)
    }

    /// Run the section's probe with the given resolved (real) values.
    ///
    /// Never returns the values; the result carries only a message. A probe
    /// that exceeds the timeout reports a distinguishable timeout failure
    /// instead of hanging.
    pub async fn test(&self, section: &Section, values: &HashMap<String, String>) -> TestResult {
        let target = match build_target(section, values) {
            Ok(target) => target,
            Err(message) => return TestResult::fail(message),
        };

        match tokio::time::timeout(self.timeout, self.runner.run(&target)).await {
            Ok(Ok(message)) => TestResult::ok(message),
            Ok(Err(message)) => TestResult::fail(message),
            Err(_) => TestResult::fail(format!(
                "probe timed out after {}s",
                self.timeout.as_secs()
            )),
        }
    }
}

impl fmt::Debug for ConnectionTester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTester")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Turn a section's probe definition plus resolved values into a concrete
/// target. Unconfigured or malformed inputs fail fast with a clear message
/// and no network activity.
fn build_target(
    section: &Section,
    values: &HashMap<String, String>,
) -> Result<ProbeTarget, String> {
    let value_of = |key: &str| values.get(key).map(String::as_str).unwrap_or("");

    match &section.probe {
        ProbeKind::Tcp { host_key, port_key } => {
            let host = value_of(host_key);
            if host.is_empty() {
                return Err(format!("'{host_key}' is not configured"));
            }
            let port_raw = value_of(port_key);
            let port: u16 = port_raw
                .parse()
                .map_err(|_| format!("'{port_key}' is not a valid port: '{port_raw}'"))?;
            Ok(ProbeTarget::Tcp {
                host: host.to_owned(),
                port,
            })
        }
        ProbeKind::Http {
            url_key,
            auth_header,
        } => {
            let url = value_of(url_key);
            if url.is_empty() {
                return Err(format!("'{url_key}' is not configured"));
            }
            let auth_header = match auth_header {
                Some((header, field_key)) => {
                    Some((header.clone(), value_of(field_key).to_owned()))
                }
                None => None,
            };
            Ok(ProbeTarget::Http {
                url: url.to_owned(),
                auth_header,
            })
        }
        ProbeKind::None => Err(format!(
            "no connectivity probe defined for section '{}'",
            section.id
        )),
    }
}
