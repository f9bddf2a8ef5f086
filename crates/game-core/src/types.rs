//! Wire types shared between the agent loop and the GAME decision service
//!
//! These structures mirror the JSON exchanged with the remote service: the
//! record of a local function execution that is fed back upstream, the
//! advertised function definitions, and the decision (`ActionResponse`) that
//! tells the loop what to do next.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::GameError;

/// Key/value snapshot produced by agent and worker state callbacks.
pub type State = Map<String, Value>;

/// Protocol version tag sent with every decision request.
pub const PROTOCOL_VERSION: &str = "v2";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionResultStatus {
    Done,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FunctionResult {
    pub action_id: String,
    pub action_status: FunctionResultStatus,
    pub feedback_message: String,
    #[serde(default)]
    pub info: Map<String, Value>,
}

/// Outgoing view of a [`FunctionResult`]; `info` stays local.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CurrentAction<'a> {
    pub action_id: &'a str,
    pub action_status: FunctionResultStatus,
    pub feedback_message: &'a str,
}

impl FunctionResult {
    pub fn new(
        action_id: impl Into<String>,
        action_status: FunctionResultStatus,
        feedback_message: impl Into<String>,
        info: Map<String, Value>,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            action_status,
            feedback_message: feedback_message.into(),
            info,
        }
    }

    /// Neutral result sent when nothing has been executed yet in the session.
    pub fn placeholder() -> Self {
        Self::new("", FunctionResultStatus::Done, "", Map::new())
    }

    pub fn to_current_action(&self) -> CurrentAction<'_> {
        CurrentAction {
            action_id: &self.action_id,
            action_status: self.action_status,
            feedback_message: &self.feedback_message,
        }
    }

    pub fn is_done(&self) -> bool {
        self.action_status == FunctionResultStatus::Done
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub arg_type: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Value>,
}

impl Argument {
    pub fn new(
        name: impl Into<String>,
        arg_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arg_type: arg_type.into(),
            optional: false,
            constraints: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_constraints(mut self, constraints: Value) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// Definition of a function as advertised to the decision service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub fn_name: String,
    pub fn_description: String,
    pub args: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    CallFunction,
    ContinueFunction,
    Wait,
    GoTo,
    Unknown(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::CallFunction => "call_function",
            ActionType::ContinueFunction => "continue_function",
            ActionType::Wait => "wait",
            ActionType::GoTo => "go_to",
            ActionType::Unknown(other) => other,
        }
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "call_function" => ActionType::CallFunction,
            "continue_function" => ActionType::ContinueFunction,
            "wait" => ActionType::Wait,
            "go_to" => ActionType::GoTo,
            _ => ActionType::Unknown(value),
        }
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// High-level plan reported by the decision service.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct HlpResponse {
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub observation_reflection: Option<String>,
    #[serde(default)]
    pub plan: Option<Vec<String>>,
    #[serde(default)]
    pub plan_reasoning: Option<String>,
    #[serde(default)]
    pub current_state_of_execution: Option<String>,
    #[serde(default)]
    pub change_indicator: Option<String>,
    #[serde(default)]
    pub log: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CurrentTask {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub task_reasoning: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AgentStateResponse {
    #[serde(default)]
    pub hlp: Option<HlpResponse>,
    #[serde(default)]
    pub current_task: Option<CurrentTask>,
}

impl AgentStateResponse {
    /// True when the service generated a new high-level task in this round.
    pub fn has_new_task(&self) -> bool {
        self.hlp
            .as_ref()
            .and_then(|hlp| hlp.change_indicator.as_deref())
            .map(|indicator| !indicator.is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActionResponse {
    pub action_type: ActionType,
    #[serde(default)]
    pub agent_state: AgentStateResponse,
    #[serde(default)]
    pub action_args: Option<Map<String, Value>>,
}

/// `action_args` of a `call_function` / `continue_function` decision.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CallFunctionArgs {
    #[serde(default)]
    pub fn_id: Option<String>,
    pub fn_name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// `action_args` of a `go_to` decision.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GoToArgs {
    pub location_id: String,
}

impl ActionResponse {
    pub fn call_function_args(&self) -> Result<CallFunctionArgs, GameError> {
        let args = self.action_args.as_ref().ok_or_else(|| {
            GameError::InvalidAction("No function information provided by GAME".to_string())
        })?;
        serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| GameError::InvalidAction(format!("Malformed function information: {}", e)))
    }

    pub fn go_to_args(&self) -> Result<GoToArgs, GameError> {
        let args = self.action_args.as_ref().ok_or_else(|| {
            GameError::InvalidAction("No location information provided by GAME".to_string())
        })?;
        serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| GameError::InvalidAction(format!("Malformed location information: {}", e)))
    }
}
