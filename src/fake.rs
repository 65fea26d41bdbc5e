// In-memory `TrainingClient` used by unit tests.

use crate::api::TrainingClient;
use crate::error::ClientError;
use crate::status::JobState;
use crate::types::{
    CreateJobRequest, DatasetUpload, JobCreated, JobList, JobStatus, ModelCatalog, TrainType, TrainingResults,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeClient {
    /// Status sequence returned by successive `get_job_status` calls; the
    /// last entry repeats. Empty means the job does not exist.
    statuses: Vec<String>,
    status_calls: AtomicUsize,
    models: HashMap<TrainType, Vec<String>>,
    model_calls: AtomicUsize,
    failing_models: bool,
    pub created: Mutex<Vec<CreateJobRequest>>,
}

impl FakeClient {
    pub fn with_statuses(statuses: &[&str]) -> Self {
        FakeClient {
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
            ..FakeClient::default()
        }
    }

    pub fn with_models(task: TrainType, models: &[&str]) -> Self {
        let mut fake = FakeClient::default();
        fake.models.insert(task, models.iter().map(|m| m.to_string()).collect());
        fake
    }

    pub fn failing_models() -> Self {
        FakeClient {
            failing_models: true,
            ..FakeClient::default()
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn model_calls(&self) -> usize {
        self.model_calls.load(Ordering::SeqCst)
    }

    fn not_found(what: &str) -> ClientError {
        ClientError::NotFound {
            url: format!("fake://{what}"),
            body: String::new(),
        }
    }
}

impl TrainingClient for FakeClient {
    fn upload_dataset(&self, file_path: &Path, _name: Option<&str>) -> Result<DatasetUpload, ClientError> {
        if !file_path.exists() {
            return Err(ClientError::FileNotFound(file_path.to_path_buf()));
        }
        Ok(DatasetUpload {
            dataset_id: "ds-fake".into(),
        })
    }

    fn create_job(&self, request: &CreateJobRequest) -> Result<JobCreated, ClientError> {
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(JobCreated {
            training_id: format!("job-{}", created.len()),
        })
    }

    fn get_job_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        let n = self.status_calls.fetch_add(1, Ordering::SeqCst);
        let raw = self
            .statuses
            .get(n)
            .or_else(|| self.statuses.last())
            .ok_or_else(|| FakeClient::not_found(job_id))?;
        Ok(JobStatus {
            training_id: Some(job_id.to_string()),
            status: JobState::from(raw.as_str()),
        })
    }

    fn get_results(&self, job_id: &str) -> Result<TrainingResults, ClientError> {
        Err(FakeClient::not_found(job_id))
    }

    fn list_jobs(&self, _user_id: Option<&str>) -> Result<JobList, ClientError> {
        Ok(JobList::default())
    }

    fn get_models(&self, task: TrainType) -> Result<ModelCatalog, ClientError> {
        self.model_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_models {
            return Err(FakeClient::not_found(task.as_str()));
        }
        Ok(ModelCatalog {
            models: self.models.get(&task).cloned().unwrap_or_default(),
        })
    }

    fn download_model(&self, job_id: &str, _out_path: Option<&Path>) -> Result<PathBuf, ClientError> {
        Err(FakeClient::not_found(job_id))
    }
}
