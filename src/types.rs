// Request and response payloads of the training service HTTP contract.
// Field names mirror the server's JSON exactly.

use crate::status::JobState;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// ML problem category; selects which model set the server offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrainType {
    Classification,
    Regression,
}

impl TrainType {
    pub fn as_str(self) -> &'static str {
        match self {
            TrainType::Classification => "classification",
            TrainType::Regression => "regression",
        }
    }
}

impl fmt::Display for TrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response of `POST {prefix}dataset/upload`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetUpload {
    pub dataset_id: String,
}

/// Body of `POST {prefix}train`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateJobRequest {
    pub dataset_id: String,
    pub train_type: TrainType,
    pub model_names: Vec<String>,
    /// Extra hyper-parameters; only sent when non-empty.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl CreateJobRequest {
    pub fn new(dataset_id: impl Into<String>, train_type: TrainType, model_names: Vec<String>) -> Self {
        CreateJobRequest {
            dataset_id: dataset_id.into(),
            train_type,
            model_names,
            params: Map::new(),
        }
    }
}

/// Response of `POST {prefix}train`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobCreated {
    pub training_id: String,
}

/// Response of `GET {prefix}train/{id}/status`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobStatus {
    #[serde(default)]
    pub training_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: JobState,
}

/// Outcome of training one model inside a job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelResult {
    pub model_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: JobState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET {prefix}train/{id}/results`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrainingResults {
    pub training_id: String,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub train_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_names: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: JobState,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<ModelResult>,
}

/// One row of `GET /api/jobs`. Only the id and status are interpreted; the
/// rest of the row is kept for display.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobSummary {
    #[serde(default, alias = "job_id", alias = "id")]
    pub training_id: Option<String>,
    #[serde(default)]
    pub status: Option<JobState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct JobList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub jobs: Vec<JobSummary>,
}

/// Response of `GET {prefix}models/{task}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ModelCatalog {
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<String>,
}

/// Response of `GET /api/cluster/nodes`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct NodeList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<String>,
}
