// Subcommand dispatch: load the config, connect, run one operation and
// print its result.

use crate::api::{ConnectOptions, HttpClient, TrainingClient};
use crate::cli::{Cli, Commands};
use crate::config::ConfigStore;
use crate::error::ClientError;
use crate::poll::{wait_for_terminal, PollOptions};
use crate::render;
use crate::status::JobState;
use crate::types::{CreateJobRequest, JobStatus};
use crate::ui;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

pub fn run(cli: Cli) -> Result<()> {
    let store = Arc::new(ConfigStore::new(
        cli.config.clone().unwrap_or_else(ConfigStore::default_path),
    ));
    let config = store.load()?;
    let opts = ConnectOptions {
        server: cli.server.clone(),
        token: cli.token.clone(),
        username: None,
    };
    let mut client = HttpClient::connect(config, store, &opts)?;

    let command = cli.command.unwrap_or(Commands::Console);
    if let Commands::Console = command {
        return ui::main_menu(client);
    }

    let mut out = io::stdout().lock();
    execute(&mut client, command, cli.json, &mut out)
}

/// Run one non-interactive command against `client`, writing to `out`.
pub fn execute<W: Write>(client: &mut HttpClient, command: Commands, json: bool, out: &mut W) -> Result<()> {
    match command {
        Commands::Upload { csv, name } => {
            let uploaded = client.upload_dataset(&csv, name.as_deref())?;
            emit(out, json, &uploaded, |w| writeln!(w, "Dataset uploaded: {}", uploaded.dataset_id))?;
        }
        Commands::CreateJob {
            dataset_id,
            task,
            models,
            params,
        } => {
            let mut request = CreateJobRequest::new(dataset_id, task, models);
            request.params = parse_params(&params)?;
            let created = client.create_job(&request)?;
            emit(out, json, &created, |w| writeln!(w, "Training job created: {}", created.training_id))?;
        }
        Commands::Status { job_id, wait, interval } => {
            let state = if wait {
                wait_with_spinner(client, &job_id, Duration::from_secs(interval.max(1)))?
            } else {
                client.get_job_status(&job_id)?.status
            };
            let status = JobStatus {
                training_id: Some(job_id.clone()),
                status: state,
            };
            emit(out, json, &status, |w| render::write_status(w, &job_id, &status.status))?;
        }
        Commands::Results { job_id } => {
            let results = client.get_results(&job_id)?;
            emit(out, json, &results, |w| render::write_results(w, &results))?;
        }
        Commands::List { user_id } => {
            let jobs = client.list_jobs(user_id.as_deref())?;
            emit(out, json, &jobs, |w| render::write_jobs(w, &jobs))?;
        }
        Commands::Download { job_id, output } => {
            let path = client.download_model(&job_id, output.as_deref())?;
            let saved = json!({"path": path.display().to_string()});
            emit(out, json, &saved, |w| writeln!(w, "Model saved to: {}", path.display()))?;
        }
        Commands::Models { task } => {
            let catalog = client.get_models(task)?;
            emit(out, json, &catalog, |w| {
                writeln!(w, "Models for {task}:")?;
                render::write_options(w, &catalog.models)
            })?;
        }
        Commands::UpdateServers => match client.update_server_list()? {
            Some(nodes) => writeln!(out, "Server list updated: {}", nodes.join(", "))?,
            None => writeln!(out, "Server list unchanged.")?,
        },
        Commands::Console => ui::main_menu(client.clone())?,
    }
    Ok(())
}

fn emit<W, T, F>(out: &mut W, json: bool, value: &T, text: F) -> Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&mut W) -> io::Result<()>,
{
    if json {
        serde_json::to_writer_pretty(&mut *out, value).context("serializing response")?;
        writeln!(out)?;
    } else {
        text(out)?;
    }
    Ok(())
}

/// Parse the `--params` argument, which must be a JSON object.
pub fn parse_params(raw: &str) -> Result<Map<String, Value>, ClientError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ClientError::InvalidArgument("--params must be a JSON object".into())),
        Err(e) => Err(ClientError::InvalidArgument(format!("--params is not valid JSON: {e}"))),
    }
}

fn wait_with_spinner(client: &HttpClient, job_id: &str, interval: Duration) -> Result<JobState> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    let opts = PollOptions {
        interval,
        max_polls: None,
    };
    let state = wait_for_terminal(client, job_id, opts, |n, state| {
        spinner.set_message(format!("{} (poll {n})", state.label()));
    });
    spinner.finish_and_clear();
    Ok(state?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_must_be_an_object() {
        assert_eq!(parse_params("{}").unwrap(), Map::new());
        let map = parse_params(r#"{"k": 5, "weights": "distance"}"#).unwrap();
        assert_eq!(map["k"], json!(5));
        assert!(matches!(parse_params("[1,2]"), Err(ClientError::InvalidArgument(_))));
        assert!(matches!(parse_params("{oops"), Err(ClientError::InvalidArgument(_))));
    }
}
