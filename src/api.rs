// API client module: a small blocking HTTP client for the training service.
// Connection set-up (server resolution, token) happens once in `connect`;
// every operation afterwards is a single request with no automatic retry.

use crate::config::{ClientConfig, ConfigStore};
use crate::error::ClientError;
use crate::resolver::{normalize_base_url, ServerResolver};
use crate::session::{username_from_env, Session};
use crate::types::{
    CreateJobRequest, DatasetUpload, JobCreated, JobList, JobStatus, ModelCatalog, NodeList, TrainType,
    TrainingResults,
};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Operations the front-ends need from the training service.
///
/// `HttpClient` is the only production implementation; the trait exists so
/// polling and the background refresher can be driven by a fake in tests.
pub trait TrainingClient {
    fn upload_dataset(&self, file_path: &Path, name: Option<&str>) -> Result<DatasetUpload, ClientError>;
    fn create_job(&self, request: &CreateJobRequest) -> Result<JobCreated, ClientError>;
    fn get_job_status(&self, job_id: &str) -> Result<JobStatus, ClientError>;
    fn get_results(&self, job_id: &str) -> Result<TrainingResults, ClientError>;
    fn list_jobs(&self, user_id: Option<&str>) -> Result<JobList, ClientError>;
    fn get_models(&self, task: TrainType) -> Result<ModelCatalog, ClientError>;
    /// Stream the trained model to `out_path` (default `model_{id}.pkl`).
    /// A stream interrupted mid-way leaves the partial file behind.
    fn download_model(&self, job_id: &str, out_path: Option<&Path>) -> Result<PathBuf, ClientError>;
}

/// Overrides applied on top of the configuration file when connecting.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Skip resolution and talk to this server.
    pub server: Option<String>,
    /// Use this token as-is; it is not written back to the config.
    pub token: Option<String>,
    /// Username for the token request; `CLIENT_USER` when unset.
    pub username: Option<String>,
}

#[derive(Clone)]
pub struct HttpClient {
    http: Client,
    session: Session,
    api_prefix: String,
    config: ClientConfig,
    store: Arc<ConfigStore>,
}

impl HttpClient {
    /// Resolve a server, establish the session and return a ready client.
    ///
    /// Fails only when no server can be selected; token problems are logged
    /// and deferred to the first authenticated call.
    pub fn connect(mut config: ClientConfig, store: Arc<ConfigStore>, opts: &ConnectOptions) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        let base_url = match &opts.server {
            Some(server) => normalize_base_url(server),
            None => ServerResolver::new(&http, config.timeout()).resolve(&config.servers, config.resolution)?,
        };

        let session = match &opts.token {
            Some(token) => Session::with_token(base_url, Some(token.clone())),
            None => {
                let username = opts.username.clone().unwrap_or_else(username_from_env);
                Session::establish(&http, &mut config, &store, base_url, &username)
            }
        };

        Ok(HttpClient {
            http,
            api_prefix: config.api_prefix(),
            session,
            config,
            store,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.session.base_url
    }

    pub fn has_token(&self) -> bool {
        self.session.bearer_token.is_some()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Write the in-memory configuration back to disk. Every config
    /// mutation made by the client ends with this call.
    pub fn persist(&self) -> Result<(), ClientError> {
        self.store.save(&self.config)
    }

    /// Replace the configured server list with the cluster's current nodes.
    ///
    /// A non-200 answer, an undecodable body or an empty node list is logged
    /// and ignored (`Ok(None)`); only transport failures and a failed save
    /// are reported.
    pub fn update_server_list(&mut self) -> Result<Option<Vec<String>>, ClientError> {
        let url = format!("{}/api/cluster/nodes", self.session.base_url);
        let res = self.request(self.http.get(&url)).send()?;
        if res.status() != StatusCode::OK {
            warn!(status = %res.status(), "server list refresh rejected");
            return Ok(None);
        }
        let nodes = match res.json::<NodeList>() {
            Ok(list) => list.nodes,
            Err(e) => {
                warn!(error = %e, "server list refresh returned an unexpected body");
                return Ok(None);
            }
        };
        if nodes.is_empty() {
            warn!("server list refresh returned no nodes, keeping current list");
            return Ok(None);
        }
        info!(?nodes, "server list updated");
        self.config.servers = nodes.clone();
        self.persist()?;
        Ok(Some(nodes))
    }

    fn training_url(&self, path: &str) -> String {
        format!("{}{}{}", self.session.base_url, self.api_prefix, path)
    }

    fn root_url(&self, path: &str) -> String {
        format!("{}{}", self.session.base_url, path)
    }

    /// Attach the JSON accept header and, when present, the bearer token.
    fn request(&self, req: RequestBuilder) -> RequestBuilder {
        self.session
            .authorize(req.header(ACCEPT, HeaderValue::from_static("application/json")))
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let res = self.request(req).send()?;
        let status = res.status();
        debug!(url = %res.url(), %status, "response");
        if status.is_success() {
            return Ok(res);
        }
        let url = res.url().to_string();
        let body = res.text().unwrap_or_default();
        Err(ClientError::from_status(status, url, body))
    }

    fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        self.send(req)?.json().map_err(ClientError::Decode)
    }
}

impl TrainingClient for HttpClient {
    fn upload_dataset(&self, file_path: &Path, name: Option<&str>) -> Result<DatasetUpload, ClientError> {
        if !file_path.exists() {
            return Err(ClientError::FileNotFound(file_path.to_path_buf()));
        }
        let part = multipart::Part::file(file_path)?.mime_str("text/csv")?;
        let mut form = multipart::Form::new().part("file", part);
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }

        let url = self.training_url("dataset/upload");
        debug!(url = %url, file = %file_path.display(), "uploading dataset");
        self.send_json(self.http.post(&url).multipart(form))
    }

    fn create_job(&self, request: &CreateJobRequest) -> Result<JobCreated, ClientError> {
        if request.model_names.is_empty() {
            return Err(ClientError::InvalidArgument("at least one model must be selected".into()));
        }
        let url = self.training_url("train");
        debug!(url = %url, dataset_id = %request.dataset_id, "creating training job");
        self.send_json(self.http.post(&url).json(request))
    }

    fn get_job_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        let url = self.training_url(&format!("train/{job_id}/status"));
        self.send_json(self.http.get(&url))
    }

    fn get_results(&self, job_id: &str) -> Result<TrainingResults, ClientError> {
        let url = self.training_url(&format!("train/{job_id}/results"));
        self.send_json(self.http.get(&url))
    }

    fn list_jobs(&self, user_id: Option<&str>) -> Result<JobList, ClientError> {
        let url = self.root_url("/api/jobs");
        let mut req = self.http.get(&url);
        if let Some(user_id) = user_id {
            req = req.query(&[("user_id", user_id)]);
        }
        self.send_json(req)
    }

    fn get_models(&self, task: TrainType) -> Result<ModelCatalog, ClientError> {
        let url = self.training_url(&format!("models/{task}"));
        self.send_json(self.http.get(&url))
    }

    fn download_model(&self, job_id: &str, out_path: Option<&Path>) -> Result<PathBuf, ClientError> {
        let url = self.root_url(&format!("/api/jobs/{job_id}/model"));
        let mut res = self.send(self.http.get(&url))?;

        let out = out_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(format!("model_{job_id}.pkl")));
        let mut writer = BufWriter::new(File::create(&out)?);
        let bytes = res.copy_to(&mut writer)?;
        writer.flush()?;
        info!(path = %out.display(), bytes, "model downloaded");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client(dir: &Path) -> HttpClient {
        let store = Arc::new(ConfigStore::new(dir.join("config.json")));
        let opts = ConnectOptions {
            server: Some("http://127.0.0.1:1/".into()),
            token: Some("tok".into()),
            username: None,
        };
        HttpClient::connect(ClientConfig::default(), store, &opts).unwrap()
    }

    #[test]
    fn overrides_skip_resolution_and_token_request() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());
        assert_eq!(client.base_url(), "http://127.0.0.1:1");
        assert!(client.has_token());
        // token overrides are not persisted
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn builds_prefixed_urls() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());
        assert_eq!(
            client.training_url("train/abc/status"),
            "http://127.0.0.1:1/api/v1/training/train/abc/status"
        );
        assert_eq!(client.root_url("/api/jobs"), "http://127.0.0.1:1/api/jobs");
    }

    #[test]
    fn upload_of_missing_file_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());
        let missing = dir.path().join("nope.csv");
        let err = client.upload_dataset(&missing, None).unwrap_err();
        assert!(matches!(err, ClientError::FileNotFound(p) if p == missing));
    }

    #[test]
    fn create_job_requires_models() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());
        let req = CreateJobRequest::new("ds-1", TrainType::Classification, vec![]);
        assert!(matches!(client.create_job(&req), Err(ClientError::InvalidArgument(_))));
    }
}
