// Status polling. The service has no push channel, so front-ends that want
// to wait for a job call `wait_for_terminal` and render each observation.

use crate::api::TrainingClient;
use crate::error::ClientError;
use crate::status::JobState;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    /// Give up after this many status requests; `None` polls forever.
    pub max_polls: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            interval: Duration::from_secs(5),
            max_polls: None,
        }
    }
}

/// Poll `job_id` until it completes or fails, or the poll budget runs out.
///
/// Returns the last observed state, which is non-terminal only when the
/// budget was exhausted. `on_poll` sees every observation, numbered from 1.
/// Errors from the status request abort the wait.
pub fn wait_for_terminal<C, F>(client: &C, job_id: &str, opts: PollOptions, mut on_poll: F) -> Result<JobState, ClientError>
where
    C: TrainingClient + ?Sized,
    F: FnMut(u32, &JobState),
{
    let mut polls = 0u32;
    loop {
        let state = client.get_job_status(job_id)?.status;
        polls += 1;
        on_poll(polls, &state);

        if state.is_terminal() || opts.max_polls.is_some_and(|max| polls >= max) {
            return Ok(state);
        }
        thread::sleep(opts.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeClient;

    fn fast(max_polls: Option<u32>) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(1),
            max_polls,
        }
    }

    #[test]
    fn stops_at_first_terminal_state() {
        let client = FakeClient::with_statuses(&["pending", "running", "completed", "running"]);
        let mut seen = Vec::new();
        let state = wait_for_terminal(&client, "job-1", fast(None), |n, s| seen.push((n, s.clone()))).unwrap();

        assert_eq!(state, JobState::Completed);
        assert_eq!(
            seen,
            vec![(1, JobState::Pending), (2, JobState::Running), (3, JobState::Completed)]
        );
        assert_eq!(client.status_calls(), 3);
    }

    #[test]
    fn failed_is_terminal() {
        let client = FakeClient::with_statuses(&["running", "failed"]);
        let state = wait_for_terminal(&client, "job-1", fast(None), |_, _| {}).unwrap();
        assert_eq!(state, JobState::Failed);
    }

    #[test]
    fn unknown_states_keep_polling_until_budget() {
        let client = FakeClient::with_statuses(&["queued"]);
        let state = wait_for_terminal(&client, "job-1", fast(Some(4)), |_, _| {}).unwrap();
        assert_eq!(state, JobState::Unknown("queued".into()));
        assert_eq!(client.status_calls(), 4);
    }

    #[test]
    fn status_errors_abort() {
        let client = FakeClient::default();
        let err = wait_for_terminal(&client, "missing", fast(None), |_, _| {}).unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
    }
}
