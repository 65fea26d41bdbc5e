// Text rendering shared by the CLI subcommands and the console menu.

use crate::error::ClientError;
use crate::status::JobState;
use crate::types::{JobList, ModelResult, TrainingResults};
use crossterm::style::{style, Color, Stylize};
use std::env;
use std::io::{self, IsTerminal, Write};
use std::sync::OnceLock;

/// Ids longer than this are shortened in listings.
pub const ID_DISPLAY_LEN: usize = 10;

pub fn truncate_id(id: &str, max: usize) -> String {
    if id.chars().count() > max {
        let head: String = id.chars().take(max).collect();
        format!("{head}...")
    } else {
        id.to_string()
    }
}

fn status_color(state: &JobState) -> Color {
    match state {
        JobState::Completed => Color::Green,
        JobState::Running => Color::Cyan,
        JobState::Pending => Color::Yellow,
        JobState::Failed => Color::Red,
        JobState::Unknown(_) => Color::Magenta,
    }
}

/// Colours are used only when stdout is a terminal and `NO_COLOR` is unset.
pub fn colors_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| wants_color(env::var_os("NO_COLOR").is_some(), io::stdout().is_terminal()))
}

fn wants_color(no_color: bool, is_terminal: bool) -> bool {
    is_terminal && !no_color
}

fn paint(text: &str, color: Option<Color>, bold: bool) -> String {
    if !colors_enabled() {
        return text.to_string();
    }
    let mut styled = style(text);
    if let Some(color) = color {
        styled = styled.with(color);
    }
    if bold {
        styled = styled.bold();
    }
    styled.to_string()
}

/// Status label, e.g. "✅ Completed", coloured when the terminal allows it.
pub fn status_line(state: &JobState) -> String {
    paint(state.label(), Some(status_color(state)), false)
}

pub fn write_status<W: Write>(w: &mut W, job_id: &str, state: &JobState) -> io::Result<()> {
    writeln!(w, "Job {job_id}: {}", status_line(state))?;
    if let JobState::Unknown(raw) = state {
        writeln!(w, "  (server reported \"{raw}\")")?;
    }
    Ok(())
}

pub fn write_model_result<W: Write>(w: &mut W, model: &ModelResult) -> io::Result<()> {
    writeln!(w, "Model: {}", paint(&model.model_name, None, true))?;
    writeln!(w, "  Status: {}", status_line(&model.status))?;
    if model.metrics.is_empty() {
        writeln!(w, "  Metrics: -")?;
    } else {
        writeln!(w, "  Metrics:")?;
        for (name, value) in &model.metrics {
            writeln!(w, "    {name:<16} {value:.4}")?;
        }
    }
    writeln!(w, "  Errors: {}", model.error.as_deref().unwrap_or("-"))
}

pub fn write_results<W: Write>(w: &mut W, results: &TrainingResults) -> io::Result<()> {
    let unknown = "unknown";
    writeln!(
        w,
        "Results of training {}",
        truncate_id(&results.training_id, ID_DISPLAY_LEN)
    )?;
    writeln!(
        w,
        "Dataset id: {}",
        results
            .dataset_id
            .as_deref()
            .map(|id| truncate_id(id, ID_DISPLAY_LEN))
            .unwrap_or_else(|| "-".into())
    )?;
    writeln!(w, "Training type: {}", results.train_type.as_deref().unwrap_or("~"))?;
    writeln!(w, "Status: {}", status_line(&results.status))?;
    writeln!(w, "Created at: {}", results.created_at.as_deref().unwrap_or(unknown))?;
    writeln!(w, "Started at: {}", results.started_at.as_deref().unwrap_or(unknown))?;
    writeln!(w, "Completed at: {}", results.completed_at.as_deref().unwrap_or(unknown))?;
    if let Some(err) = &results.error {
        writeln!(w, "Error: {}", paint(err, Some(Color::Red), false))?;
    }
    writeln!(w)?;
    if results.results.is_empty() {
        return writeln!(w, "No model results yet.");
    }
    writeln!(w, "Results and metrics per model:")?;
    for model in &results.results {
        writeln!(w)?;
        write_model_result(w, model)?;
    }
    Ok(())
}

pub fn write_jobs<W: Write>(w: &mut W, list: &JobList) -> io::Result<()> {
    if list.jobs.is_empty() {
        return writeln!(w, "No training jobs found.");
    }
    writeln!(w, "{:<14} {}", "JOB", "STATUS")?;
    for job in &list.jobs {
        let id = job.training_id.as_deref().unwrap_or("-");
        let status = job
            .status
            .as_ref()
            .map(status_line)
            .unwrap_or_else(|| "-".to_string());
        writeln!(w, "{:<14} {}", truncate_id(id, ID_DISPLAY_LEN), status)?;
    }
    Ok(())
}

/// Numbered list of options as the console shows them.
pub fn write_options<W: Write>(w: &mut W, items: &[String]) -> io::Result<()> {
    for (i, item) in items.iter().enumerate() {
        writeln!(w, "| {i:>2} | {}", truncate_id(item, ID_DISPLAY_LEN))?;
    }
    Ok(())
}

/// One-line, user-facing explanation of a client error.
pub fn describe_error(err: &ClientError) -> String {
    match err {
        ClientError::NoServerAvailable { .. } | ClientError::ServerIndexOutOfRange { .. } => {
            format!("{err}. Check the server list in your config file.")
        }
        ClientError::FileNotFound(path) => format!("file not found: {}", path.display()),
        ClientError::Transport(e) if e.is_timeout() => format!("the server did not answer in time ({e})"),
        ClientError::Transport(e) => format!("could not reach the server ({e})"),
        ClientError::NotFound { url, .. } => format!("not found on the server: {url}"),
        ClientError::Auth { status, .. } => {
            format!("the server rejected our credentials ({status}); remove the token from the config to request a new one")
        }
        ClientError::Http { status, body } if body.is_empty() => format!("request failed ({status})"),
        ClientError::Http { status, body } => format!("request failed ({status}): {body}"),
        ClientError::Decode(e) => format!("unexpected answer from the server ({e})"),
        ClientError::InvalidArgument(msg) => msg.clone(),
        ClientError::Config { .. } | ClientError::ConfigParse { .. } | ClientError::Io(_) => err.to_string(),
    }
}

/// Like `describe_error`, for errors that reached the top of a front-end.
pub fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client_err) => describe_error(client_err),
        None => format!("{err:#}"),
    }
}
