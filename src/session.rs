// Session set-up: the chosen server plus the bearer token used for every
// later request. Tokens are cached in the config file and never refreshed.

use crate::config::{ClientConfig, ConfigStore};
use crate::error::ClientError;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable holding the username sent to the token endpoint.
pub const USER_ENV: &str = "CLIENT_USER";
pub const DEFAULT_USER: &str = "user1";
pub const TOKEN_PATH: &str = "/api/token";

pub fn username_from_env() -> String {
    std::env::var(USER_ENV).unwrap_or_else(|_| DEFAULT_USER.into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub base_url: String,
    pub bearer_token: Option<String>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

impl Session {
    /// Build the session for `base_url`, requesting a token when the
    /// configuration does not carry one yet.
    pub fn establish(
        http: &Client,
        config: &mut ClientConfig,
        store: &ConfigStore,
        base_url: String,
        username: &str,
    ) -> Self {
        let bearer_token = ensure_token(http, config, store, &base_url, username);
        Session { base_url, bearer_token }
    }

    /// A session with an explicitly supplied token. Nothing is persisted.
    pub fn with_token(base_url: String, token: Option<String>) -> Self {
        Session {
            base_url,
            bearer_token: token,
        }
    }

    pub fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Return the cached token, or obtain one from the server and persist it.
///
/// The server accepts the username either as JSON or as a form; JSON is
/// tried first. A failure here is logged and yields `None`: requests then go
/// out unauthenticated and the server's rejection surfaces on first use.
pub fn ensure_token(
    http: &Client,
    config: &mut ClientConfig,
    store: &ConfigStore,
    base_url: &str,
    username: &str,
) -> Option<String> {
    if let Some(token) = &config.token {
        return Some(token.clone());
    }

    let url = format!("{base_url}{TOKEN_PATH}");
    let body = TokenRequest { username };
    let response = request_token(http.post(&url).json(&body)).or_else(|e| {
        debug!(error = %e, "JSON token request failed, retrying as form");
        request_token(http.post(&url).form(&body))
    });

    match response {
        Ok(Some(token)) => {
            info!(username, "obtained access token");
            config.token = Some(token.clone());
            if let Err(e) = store.save(config) {
                warn!(error = %e, "could not persist access token");
            }
            Some(token)
        }
        Ok(None) => {
            warn!("token endpoint answered without a token");
            None
        }
        Err(e) => {
            warn!(error = %e, "could not obtain access token");
            None
        }
    }
}

fn request_token(req: RequestBuilder) -> Result<Option<String>, ClientError> {
    let res = req.send()?;
    let status = res.status();
    if !status.is_success() {
        let url = res.url().to_string();
        let body = res.text().unwrap_or_default();
        return Err(ClientError::from_status(status, url, body));
    }
    let parsed: TokenResponse = res.json().map_err(ClientError::Decode)?;
    Ok(parsed.token)
}
