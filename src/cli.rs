// Command-line argument parsing with clap.

use crate::types::TrainType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Client for the DistIA training service.
#[derive(Parser, Debug, Clone)]
#[command(name = "distia", version, about, long_about = None)]
pub struct Cli {
    /// Server URL; skips server discovery.
    #[arg(long, global = true, env = "DISTIA_SERVER")]
    pub server: Option<String>,

    /// Access token; used as-is and not saved.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Configuration file.
    #[arg(long, global = true, env = "DISTIA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print raw JSON responses.
    #[arg(long, global = true)]
    pub json: bool,

    /// Without a subcommand the interactive console starts.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Upload a CSV dataset.
    Upload {
        csv: PathBuf,
        /// Display name for the dataset.
        #[arg(long)]
        name: Option<String>,
    },

    /// Start a training job on an uploaded dataset.
    CreateJob {
        #[arg(long)]
        dataset_id: String,
        #[arg(long, value_enum)]
        task: TrainType,
        /// Model to train; repeat or comma-separate for several.
        #[arg(long = "model", required = true, value_delimiter = ',')]
        models: Vec<String>,
        /// Extra parameters as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Show the status of a job.
    Status {
        job_id: String,
        /// Keep polling until the job completes or fails.
        #[arg(long)]
        wait: bool,
        /// Seconds between polls with --wait.
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },

    /// Show the results and metrics of a job.
    Results { job_id: String },

    /// List training jobs.
    List {
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Download the trained model of a job.
    Download {
        job_id: String,
        /// Output path (default: model_<job_id>.pkl).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the models available for a task.
    Models {
        #[arg(value_enum)]
        task: TrainType,
    },

    /// Replace the configured server list with the cluster's nodes.
    UpdateServers,

    /// Interactive menu.
    Console,
}
