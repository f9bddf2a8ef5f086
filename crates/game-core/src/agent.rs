//! Agent orchestration loop.
//!
//! An `Agent` is registered with the GAME service at construction and owns a
//! set of workers. After `compile()` registers the workers as a map, each
//! `step()` asks the decision endpoint what to do next and applies the
//! answer locally: execute a function of the active worker, move to another
//! worker, or wait. The loop is strictly sequential; every step is one
//! network round trip followed by at most one function execution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::AgentDefinition;
use crate::errors::GameError;
use crate::registration::{create_agent, create_workers};
use crate::session::Session;
use crate::transport::GameClient;
use crate::types::{
    ActionResponse, ActionType, CurrentAction, FunctionDefinition, FunctionResult, State,
    PROTOCOL_VERSION,
};
use crate::worker::{into_state, StateFn, WorkerConfig};

const AGENT_STATE_CONTEXT: &str = "Agent";

#[derive(Debug, Serialize)]
struct ActionRequest<'a> {
    location: &'a str,
    map_id: &'a str,
    environment: &'a State,
    functions: Vec<FunctionDefinition>,
    events: Map<String, Value>,
    agent_state: &'a State,
    current_action: CurrentAction<'a>,
    version: &'static str,
}

pub struct Agent {
    client: GameClient,
    definition: AgentDefinition,
    agent_id: String,
    session: Session,
    workers: Vec<WorkerConfig>,
    worker_states: HashMap<String, State>,
    current_worker_id: Option<String>,
    map_id: Option<String>,
    agent_state: State,
    state_fn: StateFn,
}

impl Agent {
    /// Validate the agent-level state, then register the agent remotely.
    ///
    /// `state_fn` is invoked once with `(None, None)` before any network
    /// call; a result that is not a JSON object fails construction.
    pub async fn new<F>(
        client: GameClient,
        definition: AgentDefinition,
        state_fn: F,
        workers: Vec<WorkerConfig>,
    ) -> Result<Self, GameError>
    where
        F: Fn(Option<&FunctionResult>, Option<&State>) -> Value + Send + Sync + 'static,
    {
        let state_fn: StateFn = Arc::new(state_fn);
        let agent_state = into_state(state_fn(None, None), AGENT_STATE_CONTEXT)?;

        let agent_id = create_agent(
            &client,
            &definition.name,
            &definition.description,
            &definition.goal,
        )
        .await?;

        let mut agent = Self {
            client,
            definition,
            agent_id,
            session: Session::new(),
            workers: Vec::new(),
            worker_states: HashMap::new(),
            current_worker_id: None,
            map_id: None,
            agent_state,
            state_fn,
        };
        for worker in workers {
            agent.add_worker(worker);
        }
        Ok(agent)
    }

    /// Add a worker, replacing any worker with the same id in place.
    /// Workers added after `compile()` are only registered by the next compile.
    pub fn add_worker(&mut self, worker: WorkerConfig) {
        match self.workers.iter_mut().find(|w| w.id() == worker.id()) {
            Some(existing) => {
                log::debug!("Replacing worker {}", worker.id());
                *existing = worker;
            }
            None => {
                log::debug!("Adding worker {}", worker.id());
                self.workers.push(worker);
            }
        }
    }

    pub fn get_worker_config(&self, worker_id: &str) -> Option<&WorkerConfig> {
        self.workers.iter().find(|w| w.id() == worker_id)
    }

    pub fn workers(&self) -> &[WorkerConfig] {
        &self.workers
    }

    pub fn current_worker_id(&self) -> Option<&str> {
        self.current_worker_id.as_deref()
    }

    pub fn worker_state(&self, worker_id: &str) -> Option<&State> {
        self.worker_states.get(worker_id)
    }

    pub fn agent_state(&self) -> &State {
        &self.agent_state
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn map_id(&self) -> Option<&str> {
        self.map_id.as_deref()
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start a new session: fresh id, no pending function result.
    pub fn reset(&mut self) {
        self.session.reset();
        log::info!("Session reset: {}", self.session.id());
    }

    /// Register all workers as one map and compute their initial states.
    ///
    /// The first worker added becomes the active one. Returns the map id.
    pub async fn compile(&mut self) -> Result<String, GameError> {
        let first_worker_id = self
            .workers
            .first()
            .map(|w| w.id().to_string())
            .ok_or_else(|| GameError::State("No workers added to the agent".to_string()))?;

        let map_id = create_workers(&self.client, &self.workers).await?;

        let mut worker_states = HashMap::with_capacity(self.workers.len());
        for worker in &self.workers {
            worker_states.insert(worker.id().to_string(), worker.state(None, None)?);
        }

        self.worker_states = worker_states;
        self.current_worker_id = Some(first_worker_id);
        self.map_id = Some(map_id.clone());
        log::info!(
            "Compiled agent {} with {} worker(s), map {}",
            self.agent_id,
            self.workers.len(),
            map_id
        );
        Ok(map_id)
    }

    async fn get_action(&self) -> Result<ActionResponse, GameError> {
        let (worker_id, map_id) = self.compiled()?;
        let worker = self
            .get_worker_config(worker_id)
            .ok_or_else(|| GameError::WorkerNotFound(worker_id.to_string()))?;
        let environment = self.worker_states.get(worker_id).ok_or_else(|| {
            GameError::State(format!(
                "Worker '{}' has no state; call compile() after adding workers",
                worker_id
            ))
        })?;

        let placeholder;
        let function_result = match self.session.function_result() {
            Some(result) => result,
            None => {
                placeholder = FunctionResult::placeholder();
                &placeholder
            }
        };

        let request = ActionRequest {
            location: worker_id,
            map_id,
            environment,
            functions: worker.function_definitions(),
            events: Map::new(),
            agent_state: &self.agent_state,
            current_action: function_result.to_current_action(),
            version: PROTOCOL_VERSION,
        };

        let endpoint = format!("/v2/agents/{}/actions", self.agent_id);
        let data = self.client.post(&endpoint, &request).await?;
        serde_json::from_value(data)
            .map_err(|e| GameError::Parse(format!("Malformed action response: {}", e)))
    }

    fn compiled(&self) -> Result<(&str, &str), GameError> {
        match (self.current_worker_id.as_deref(), self.map_id.as_deref()) {
            (Some(worker_id), Some(map_id)) => Ok((worker_id, map_id)),
            _ => Err(GameError::State(
                "Agent has not been compiled; call compile() first".to_string(),
            )),
        }
    }

    /// Ask for the next action and apply it. Returns the decision acted on.
    pub async fn step(&mut self) -> Result<ActionResponse, GameError> {
        let (worker_id, _) = self.compiled()?;
        log::info!("Agent step: worker {}", worker_id);
        let response = self.get_action().await?;

        log::info!("Action type: {}", response.action_type);
        if response.agent_state.has_new_task() {
            if let Some(task) = response
                .agent_state
                .current_task
                .as_ref()
                .and_then(|t| t.task.as_deref())
            {
                log::info!("New task: {}", task);
            }
        }

        match &response.action_type {
            ActionType::CallFunction | ActionType::ContinueFunction => {
                let call = response.call_function_args()?;
                let worker_id = self.current_worker_id.clone().unwrap_or_default();
                let worker = self
                    .workers
                    .iter()
                    .find(|w| w.id() == worker_id)
                    .ok_or_else(|| GameError::WorkerNotFound(worker_id.clone()))?;
                let function = worker.action_space().get(&call.fn_name).ok_or_else(|| {
                    GameError::FunctionNotFound {
                        worker_id: worker_id.clone(),
                        fn_name: call.fn_name.clone(),
                    }
                })?;

                log::info!("Executing function: {} {:?}", call.fn_name, call.args);
                let result = function.execute(call.fn_id.as_deref(), &call.args).await;
                log::info!(
                    "Function result: {:?} {}",
                    result.action_status,
                    result.feedback_message
                );

                self.session.set_function_result(result);
                let new_state =
                    worker.state(self.session.function_result(), self.worker_states.get(&worker_id))?;
                self.worker_states.insert(worker_id, new_state);
            }
            ActionType::Wait => {
                log::warn!("Decision service asked the agent to wait; nothing to do");
            }
            ActionType::GoTo => {
                let go_to = response.go_to_args()?;
                if self.get_worker_config(&go_to.location_id).is_none() {
                    log::warn!(
                        "Moving to unknown worker '{}'; the next step will fail",
                        go_to.location_id
                    );
                }
                log::info!("Moving to worker: {}", go_to.location_id);
                self.current_worker_id = Some(go_to.location_id);
            }
            ActionType::Unknown(action_type) => {
                return Err(GameError::UnknownActionType(action_type.clone()));
            }
        }

        let raw = (self.state_fn)(self.session.function_result(), Some(&self.agent_state));
        self.agent_state = into_state(raw, AGENT_STATE_CONTEXT)?;

        Ok(response)
    }

    /// Reset the session and step until an error occurs.
    pub async fn run(&mut self) -> Result<(), GameError> {
        self.reset();
        log::info!("Agent {} run started", self.agent_id);
        loop {
            self.step().await?;
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("agent_id", &self.agent_id)
            .field("definition", &self.definition)
            .field("session", &self.session)
            .field("workers", &self.workers)
            .field("current_worker_id", &self.current_worker_id)
            .field("map_id", &self.map_id)
            .field("agent_state", &self.agent_state)
            .finish()
    }
}
