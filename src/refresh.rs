// Background refresh of the per-task model catalogue.
//
// The refresher owns one thread that sleeps on a channel for the configured
// interval, then fetches the model list for every task. Stopping (or
// dropping) the handle closes the channel, which wakes the thread at once.
// The refresher never touches the configuration file.

use crate::api::TrainingClient;
use crate::types::TrainType;
use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

type Catalog = Arc<RwLock<HashMap<TrainType, Vec<String>>>>;

pub struct ModelRefresher {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    catalog: Catalog,
}

impl ModelRefresher {
    /// Spawn the refresh thread. The first refresh runs one interval after
    /// start, so it does not race the caller's own first requests.
    pub fn start<C>(client: Arc<C>, tasks: Vec<TrainType>, interval: Duration) -> io::Result<Self>
    where
        C: TrainingClient + Send + Sync + 'static,
    {
        let catalog: Catalog = Arc::default();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let shared = Arc::clone(&catalog);
        let handle = thread::Builder::new().name("model-refresh".into()).spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => refresh_once(client.as_ref(), &tasks, &shared),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("model refresher stopped");
                    break;
                }
            }
        })?;

        Ok(ModelRefresher {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            catalog,
        })
    }

    /// Last successfully fetched model list for `task`, if any.
    pub fn models(&self, task: TrainType) -> Option<Vec<String>> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&task)
            .cloned()
    }

    /// Cancel the refresh loop and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("model refresher thread panicked");
            }
        }
    }
}

impl Drop for ModelRefresher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn refresh_once<C: TrainingClient + ?Sized>(client: &C, tasks: &[TrainType], catalog: &RwLock<HashMap<TrainType, Vec<String>>>) {
    for &task in tasks {
        match client.get_models(task) {
            Ok(list) => {
                debug!(%task, count = list.models.len(), "model list refreshed");
                catalog
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(task, list.models);
            }
            // keep whatever we had; the next cycle may succeed
            Err(e) => debug!(%task, error = %e, "model list refresh failed"),
        }
    }
}
