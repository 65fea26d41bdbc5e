// Connection set-up against mock servers: server discovery and token
// acquisition.

use distia_client::config::{ClientConfig, ConfigStore, ResolutionStrategy};
use distia_client::resolver::ServerResolver;
use distia_client::session::ensure_token;
use distia_client::{ClientError, ConnectOptions, HttpClient};
use mockito::Server;
use reqwest::blocking::Client;
use std::sync::Arc;
use std::time::Duration;

const UNREACHABLE: &str = "http://127.0.0.1:1";

fn resolver(http: &Client) -> ServerResolver<'_> {
    ServerResolver::new(http, Duration::from_secs(2))
}

#[test]
fn probe_returns_first_live_server_and_stops() {
    let mut down = Server::new();
    let mut live = Server::new();
    let mut later = Server::new();

    let down_ping = down.mock("GET", "/api/ping").with_status(503).expect(1).create();
    let live_ping = live.mock("GET", "/api/ping").with_status(200).expect(1).create();
    let later_ping = later.mock("GET", "/api/ping").with_status(200).expect(0).create();

    let servers = vec![UNREACHABLE.to_string(), down.url(), format!("{}/", live.url()), later.url()];
    let http = Client::new();
    let chosen = resolver(&http).resolve(&servers, ResolutionStrategy::Probe).unwrap();

    assert_eq!(chosen, live.url());
    down_ping.assert();
    live_ping.assert();
    later_ping.assert();
}

#[test]
fn probe_with_no_live_server_fails() {
    let mut down = Server::new();
    let _ping = down.mock("GET", "/api/ping").with_status(500).create();

    let servers = vec![UNREACHABLE.to_string(), down.url()];
    let http = Client::new();
    let err = resolver(&http).resolve(&servers, ResolutionStrategy::Probe).unwrap_err();
    match err {
        ClientError::NoServerAvailable { tried } => assert_eq!(tried, servers),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn connect_without_servers_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path().join("config.json")));
    let config = ClientConfig {
        servers: vec![UNREACHABLE.to_string()],
        ..ClientConfig::default()
    };

    let err = HttpClient::connect(config, Arc::clone(&store), &ConnectOptions::default())
        .err()
        .expect("connect should fail");
    assert!(matches!(err, ClientError::NoServerAvailable { .. }));
    assert!(!store.path().exists());
}

#[test]
fn token_via_json_is_persisted_once() {
    let mut server = Server::new();
    let json_token = server
        .mock("POST", "/api/token")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::Json(serde_json::json!({"username": "alice"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token": "tok-json"}"#)
        .expect(1)
        .create();
    let form_token = server
        .mock("POST", "/api/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .expect(0)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("config.json"));
    let mut config = ClientConfig::default();
    let http = Client::new();

    let first = ensure_token(&http, &mut config, &store, &server.url(), "alice");
    let second = ensure_token(&http, &mut config, &store, &server.url(), "alice");

    assert_eq!(first.as_deref(), Some("tok-json"));
    assert_eq!(second.as_deref(), Some("tok-json"));
    assert_eq!(store.load().unwrap().token.as_deref(), Some("tok-json"));
    json_token.assert();
    form_token.assert();
}

#[test]
fn token_falls_back_to_form() {
    let mut server = Server::new();
    // JSON bodies match no mock, so mockito answers 501
    let form_token = server
        .mock("POST", "/api/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("username=user1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token": "tok-form"}"#)
        .expect(1)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("config.json"));
    let mut config = ClientConfig::default();
    let http = Client::new();

    let token = ensure_token(&http, &mut config, &store, &server.url(), "user1");
    assert_eq!(token.as_deref(), Some("tok-form"));
    assert_eq!(config.token.as_deref(), Some("tok-form"));

    // a fresh process reads the persisted token and asks for nothing
    let mut reloaded = store.load().unwrap();
    let again = ensure_token(&http, &mut reloaded, &store, &server.url(), "user1");
    assert_eq!(again.as_deref(), Some("tok-form"));
    form_token.assert();
}

#[test]
fn token_failure_leaves_client_unauthenticated() {
    let mut server = Server::new();
    let _ping = server.mock("GET", "/api/ping").with_status(200).create();
    let _token = server.mock("POST", "/api/token").with_status(500).expect(2).create();

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path().join("config.json")));
    let config = ClientConfig {
        servers: vec![server.url()],
        ..ClientConfig::default()
    };
    let opts = ConnectOptions {
        username: Some("user1".into()),
        ..ConnectOptions::default()
    };

    let client = HttpClient::connect(config, Arc::clone(&store), &opts).unwrap();
    assert_eq!(client.base_url(), server.url());
    assert!(!client.has_token());
    assert!(!store.path().exists());
}

#[test]
fn connect_resolves_and_stores_token() {
    let mut server = Server::new();
    let _ping = server.mock("GET", "/api/ping").with_status(200).create();
    let _token = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token": "abc"}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path().join("config.json")));
    let config = ClientConfig {
        servers: vec![UNREACHABLE.to_string(), server.url()],
        ..ClientConfig::default()
    };
    let opts = ConnectOptions {
        username: Some("user1".into()),
        ..ConnectOptions::default()
    };

    let client = HttpClient::connect(config, Arc::clone(&store), &opts).unwrap();
    assert_eq!(client.session().bearer_token.as_deref(), Some("abc"));

    let saved = store.load().unwrap();
    assert_eq!(saved.token.as_deref(), Some("abc"));
    assert_eq!(saved.servers, vec![UNREACHABLE.to_string(), server.url()]);
}
