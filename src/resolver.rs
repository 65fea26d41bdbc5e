// Server selection: turns the configured server list into the single base
// URL the rest of the client talks to.

use crate::config::ResolutionStrategy;
use crate::error::ClientError;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Liveness endpoint every training server exposes.
pub const PING_PATH: &str = "/api/ping";

pub struct ServerResolver<'a> {
    http: &'a Client,
    timeout: Duration,
}

impl<'a> ServerResolver<'a> {
    pub fn new(http: &'a Client, timeout: Duration) -> Self {
        ServerResolver { http, timeout }
    }

    /// Pick a server according to `strategy`. Probing stops at the first
    /// server that answers the ping with a success status.
    pub fn resolve(&self, servers: &[String], strategy: ResolutionStrategy) -> Result<String, ClientError> {
        match strategy {
            ResolutionStrategy::Fixed { index } => {
                let server = servers.get(index).ok_or(ClientError::ServerIndexOutOfRange {
                    index,
                    len: servers.len(),
                })?;
                let server = normalize_base_url(server);
                info!(server = %server, index, "using fixed server");
                Ok(server)
            }
            ResolutionStrategy::Probe => {
                let mut tried = Vec::with_capacity(servers.len());
                for server in servers {
                    let server = normalize_base_url(server);
                    if self.is_alive(&server) {
                        info!(server = %server, "connected to server");
                        return Ok(server);
                    }
                    tried.push(server);
                }
                Err(ClientError::NoServerAvailable { tried })
            }
        }
    }

    fn is_alive(&self, server: &str) -> bool {
        let url = format!("{server}{PING_PATH}");
        match self.http.get(&url).timeout(self.timeout).send() {
            Ok(res) if res.status().is_success() => true,
            Ok(res) => {
                debug!(url = %url, status = %res.status(), "ping rejected");
                false
            }
            Err(e) => {
                debug!(url = %url, error = %e, "ping failed");
                false
            }
        }
    }
}

/// Strip surrounding whitespace and trailing slashes so paths can be
/// appended with a plain `format!`.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
