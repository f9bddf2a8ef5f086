//! Worker configuration
//!
//! A worker is a named action space with its own view of the world. Its
//! state callback is wrapped so the emitted state always carries the
//! worker's instructions, and so a callback that produces anything other
//! than a key/value mapping is rejected as soon as it is invoked.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::errors::GameError;
use crate::functions::{ActionSpace, Function};
use crate::types::{FunctionDefinition, FunctionResult, State};

/// Callback producing a new state from the last function result and the
/// previous state. Both are `None` on the first call.
pub type StateFn = Arc<dyn Fn(Option<&FunctionResult>, Option<&State>) -> Value + Send + Sync>;

/// Key merged into every worker state.
pub const INSTRUCTIONS_KEY: &str = "instructions";

/// Accept a callback result only if it is a mapping.
pub(crate) fn into_state(value: Value, context: &str) -> Result<State, GameError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(GameError::validation(format!(
            "{} state function must return a dictionary, got {}",
            context,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Clone)]
pub struct WorkerConfig {
    id: String,
    description: String,
    instruction: String,
    state_fn: StateFn,
    action_space: ActionSpace,
}

impl WorkerConfig {
    pub fn new<F>(
        id: impl Into<String>,
        description: impl Into<String>,
        state_fn: F,
        action_space: Vec<Function>,
    ) -> Result<Self, GameError>
    where
        F: Fn(Option<&FunctionResult>, Option<&State>) -> Value + Send + Sync + 'static,
    {
        Ok(Self {
            id: id.into(),
            description: description.into(),
            instruction: String::new(),
            state_fn: Arc::new(state_fn),
            action_space: ActionSpace::new(action_space)?,
        })
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn function_definitions(&self) -> Vec<FunctionDefinition> {
        self.action_space.definitions()
    }

    /// Invoke the state callback and merge the instructions in.
    /// Keys returned by the callback win over the injected one.
    pub fn state(
        &self,
        function_result: Option<&FunctionResult>,
        current_state: Option<&State>,
    ) -> Result<State, GameError> {
        let raw = (self.state_fn)(function_result, current_state);
        let raw = into_state(raw, &format!("Worker {}", self.id))?;

        let mut state = State::new();
        state.insert(
            INSTRUCTIONS_KEY.to_string(),
            Value::String(self.instruction.clone()),
        );
        state.extend(raw);
        Ok(state)
    }
}

impl fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("instruction", &self.instruction)
            .field("action_space", &self.action_space.names())
            .finish()
    }
}
