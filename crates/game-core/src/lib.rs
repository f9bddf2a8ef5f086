//! Client SDK for the GAME agent orchestration API.
//!
//! The service decides what an agent does next; this crate runs the local
//! half of that loop. An agent is registered remotely, its workers (named
//! action spaces with their own state) are registered as a map, and each
//! step sends the current state to the decision endpoint and applies the
//! returned action by executing one of the active worker's functions,
//! switching worker, or waiting.
//!
//! # Architecture Overview
//!
//! - **Transport**: bearer-token authenticated JSON over HTTP with a single error taxonomy
//! - **Registration**: agent and worker-map creation
//! - **Functions**: typed action spaces of async executables
//! - **Workers and sessions**: per-worker state callbacks and the per-run identity
//! - **Agent orchestration**: the compile / step / run state machine
//! - **Configuration system**: YAML files with `GAME_*` environment overrides

pub mod agent;
pub mod config;
pub mod errors;
pub mod functions;
pub mod registration;
pub mod session;
pub mod transport;
pub mod types;
pub mod worker;

pub use agent::Agent;
pub use config::{
    load_config, AgentDefinition, ClientConfig, ConfigLoader, GameConfig, LoggingConfig,
};
pub use errors::GameError;
pub use functions::{ActionSpace, Executable, Function, FunctionOutput};
pub use registration::{create_agent, create_workers};
pub use session::Session;
pub use transport::GameClient;
pub use types::{
    ActionResponse, ActionType, AgentStateResponse, Argument, FunctionDefinition, FunctionResult,
    FunctionResultStatus, State,
};
pub use worker::{StateFn, WorkerConfig};
