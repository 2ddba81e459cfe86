pub mod config;
pub mod director;
pub mod jsonl_store;
pub mod logging;
pub mod runner;

pub use config::{ConfigError, ResolvedOutputs, TournamentConfig, ValidationError};
pub use director::{Ack, ActionError, Director};
pub use jsonl_store::JsonlStore;
pub use runner::{RunSummary, RunnerError, TournamentRunner};
