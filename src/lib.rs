// Library root
// -----------
// Client for the DistIA training service. The binary (`main.rs`) parses the
// command line and hands over to `commands`; everything else is usable as a
// library.
//
// Module responsibilities:
// - `config`: the JSON configuration file and its single writer.
// - `resolver`: picks the server to talk to (ping probe or fixed index).
// - `session`: bearer token lookup/acquisition.
// - `api`: the `TrainingClient` trait and its HTTP implementation.
// - `types` / `status`: wire payloads and the job status model.
// - `poll` / `refresh`: status polling and the background model refresher.
// - `cli`, `commands`, `ui`, `render`: the command-line and console
//   front-ends.
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod poll;
pub mod refresh;
pub mod render;
pub mod resolver;
pub mod session;
pub mod status;
pub mod types;
pub mod ui;

#[cfg(test)]
mod fake;

pub use api::{ConnectOptions, HttpClient, TrainingClient};
pub use config::{ClientConfig, ConfigStore, ResolutionStrategy};
pub use error::ClientError;
pub use status::JobState;
