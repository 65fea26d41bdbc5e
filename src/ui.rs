// UI layer: an interactive menu built on `dialoguer`.
// Every action catches its own client errors and prints them, so a failed
// request never ends the session; only terminal IO errors do.

use crate::api::{HttpClient, TrainingClient};
use crate::error::ClientError;
use crate::poll::{wait_for_terminal, PollOptions};
use crate::refresh::ModelRefresher;
use crate::render;
use crate::types::{CreateJobRequest, TrainType};
use anyhow::Result;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Ids created during this session, offered as defaults in later prompts.
#[derive(Debug, Default)]
struct SessionLists {
    datasets: Vec<String>,
    jobs: Vec<String>,
}

/// Main interactive menu. Runs until the user chooses "Exit".
///
/// A background refresher keeps the model lists warm; it is stopped when
/// the menu returns.
pub fn main_menu(mut api: HttpClient) -> Result<()> {
    let refresher = match ModelRefresher::start(
        Arc::new(api.clone()),
        api.config().tasks.clone(),
        api.config().model_refresh_interval(),
    ) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!(error = %e, "could not start model refresher");
            None
        }
    };

    let title = api.config().display_option("TITTLE").unwrap_or("DistIA").to_string();
    println!("=== {title} === connected to {}", api.base_url());
    if !api.has_token() {
        println!("No access token; authenticated requests will be rejected.");
    }

    let mut lists = SessionLists::default();
    let items = [
        "Upload dataset",
        "Create training job",
        "Check training status",
        "View training results",
        "List training jobs",
        "Download model",
        "Refresh server list",
        "Exit",
    ];
    loop {
        let selection = Select::new().with_prompt("Main menu").items(&items).default(0).interact()?;
        match selection {
            0 => handle_upload(&api, &mut lists)?,
            1 => handle_create_job(&api, refresher.as_ref(), &mut lists)?,
            2 => handle_status(&api, &lists)?,
            3 => handle_results(&api, &lists)?,
            4 => handle_list(&api)?,
            5 => handle_download(&api, &lists)?,
            6 => match api.update_server_list() {
                Ok(Some(nodes)) => println!("Server list updated: {}", nodes.join(", ")),
                Ok(None) => println!("Server list unchanged."),
                Err(e) => report(&e),
            },
            _ => break,
        }
    }

    if let Some(refresher) = refresher {
        refresher.stop();
    }
    println!("Bye!");
    Ok(())
}

fn spinner(msg: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

fn report(err: &ClientError) {
    println!("❌ Error: {}", render::describe_error(err));
}

fn handle_upload(api: &HttpClient, lists: &mut SessionLists) -> Result<()> {
    let path: String = Input::new().with_prompt("Dataset path (CSV)").interact_text()?;
    let name: String = Input::new()
        .with_prompt("Dataset name (optional)")
        .allow_empty(true)
        .interact_text()?;
    let name = Some(name.trim()).filter(|n| !n.is_empty());

    let spinner = spinner("Uploading...")?;
    let result = api.upload_dataset(&PathBuf::from(path.trim()), name);
    spinner.finish_and_clear();
    match result {
        Ok(uploaded) => {
            println!("✅ Dataset uploaded. Id: {}", uploaded.dataset_id);
            lists.datasets.push(uploaded.dataset_id);
        }
        Err(e) => report(&e),
    }
    Ok(())
}

/// Pick one of `known` or type a different id.
fn choose_id(prompt: &str, known: &[String]) -> Result<Option<String>> {
    if known.is_empty() {
        let id: String = Input::new().with_prompt(prompt).allow_empty(true).interact_text()?;
        let id = id.trim().to_string();
        return Ok(Some(id).filter(|i| !i.is_empty()));
    }
    let mut items: Vec<String> = known
        .iter()
        .map(|id| render::truncate_id(id, render::ID_DISPLAY_LEN))
        .collect();
    items.push("Other...".into());
    let idx = Select::new().with_prompt(prompt).items(&items).default(0).interact()?;
    if idx < known.len() {
        return Ok(Some(known[idx].clone()));
    }
    choose_id(prompt, &[])
}

fn choose_models(api: &HttpClient, refresher: Option<&ModelRefresher>, task: TrainType) -> Result<Vec<String>> {
    let cached = refresher.and_then(|r| r.models(task)).filter(|m| !m.is_empty());
    let models = match cached {
        Some(models) => models,
        None => match api.get_models(task) {
            Ok(catalog) => catalog.models,
            Err(e) => {
                report(&e);
                Vec::new()
            }
        },
    };

    if models.is_empty() {
        let typed: String = Input::new()
            .with_prompt("No model list available; model names (comma separated)")
            .allow_empty(true)
            .interact_text()?;
        return Ok(typed
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect());
    }

    loop {
        let picked = MultiSelect::new()
            .with_prompt("Models to train (space to toggle, enter to confirm)")
            .items(&models)
            .interact()?;
        if !picked.is_empty() {
            return Ok(picked.into_iter().map(|i| models[i].clone()).collect());
        }
        println!("Select at least one model.");
    }
}

fn handle_create_job(api: &HttpClient, refresher: Option<&ModelRefresher>, lists: &mut SessionLists) -> Result<()> {
    let Some(dataset_id) = choose_id("Dataset id", &lists.datasets)? else {
        println!("No dataset selected.");
        return Ok(());
    };
    let tasks = &api.config().tasks;
    if tasks.is_empty() {
        println!("No tasks configured.");
        return Ok(());
    }
    let task = tasks[Select::new().with_prompt("Task").items(tasks.as_slice()).default(0).interact()?];
    let models = choose_models(api, refresher, task)?;
    if models.is_empty() {
        println!("No models selected.");
        return Ok(());
    }

    let request = CreateJobRequest::new(dataset_id, task, models);
    let spinner = spinner("Creating training job...")?;
    let result = api.create_job(&request);
    spinner.finish_and_clear();
    match result {
        Ok(created) => {
            println!("✅ Training job created. Id: {}", created.training_id);
            lists.jobs.push(created.training_id);
        }
        Err(e) => report(&e),
    }
    Ok(())
}

fn handle_status(api: &HttpClient, lists: &SessionLists) -> Result<()> {
    let Some(job_id) = choose_id("Job id", &lists.jobs)? else {
        return Ok(());
    };
    let wait = Confirm::new()
        .with_prompt("Wait until the job finishes?")
        .default(false)
        .interact()?;

    let result = if wait {
        let spinner = spinner("Waiting...")?;
        let opts = PollOptions::default();
        let result = wait_for_terminal(api, &job_id, opts, |n, state| {
            spinner.set_message(format!("{} (poll {n})", state.label()));
        });
        spinner.finish_and_clear();
        result
    } else {
        api.get_job_status(&job_id).map(|s| s.status)
    };

    match result {
        Ok(state) => render::write_status(&mut io::stdout(), &job_id, &state)?,
        Err(e) => report(&e),
    }
    Ok(())
}

fn handle_results(api: &HttpClient, lists: &SessionLists) -> Result<()> {
    let Some(job_id) = choose_id("Job id", &lists.jobs)? else {
        return Ok(());
    };
    match api.get_results(&job_id) {
        Ok(results) => render::write_results(&mut io::stdout(), &results)?,
        Err(e) => report(&e),
    }
    Ok(())
}

fn handle_list(api: &HttpClient) -> Result<()> {
    let user: String = Input::new()
        .with_prompt("Filter by user id (optional)")
        .allow_empty(true)
        .interact_text()?;
    let user = Some(user.trim()).filter(|u| !u.is_empty());
    match api.list_jobs(user) {
        Ok(jobs) => render::write_jobs(&mut io::stdout(), &jobs)?,
        Err(e) => report(&e),
    }
    Ok(())
}

fn handle_download(api: &HttpClient, lists: &SessionLists) -> Result<()> {
    let Some(job_id) = choose_id("Job id", &lists.jobs)? else {
        return Ok(());
    };
    let output: String = Input::new()
        .with_prompt("Output path (optional)")
        .allow_empty(true)
        .interact_text()?;
    let output = Some(output.trim()).filter(|o| !o.is_empty()).map(PathBuf::from);

    let spinner = spinner("Downloading...")?;
    let result = api.download_model(&job_id, output.as_deref());
    spinner.finish_and_clear();
    match result {
        Ok(path) => println!("✅ Model saved to: {}", path.display()),
        Err(e) => report(&e),
    }
    Ok(())
}
