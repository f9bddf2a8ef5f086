//! Executable functions and the per-worker action space
//!
//! A [`Function`] pairs the definition advertised to the decision service with
//! the local code that runs when the service picks it. Both halves are built
//! from the same fields, so what the service sees is always what the worker
//! can execute. An [`ActionSpace`] is the name-keyed registry a worker looks
//! functions up in when a decision names one.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::GameError;
use crate::types::{Argument, FunctionDefinition, FunctionResult, FunctionResultStatus};

/// What an executable reports back after running.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionOutput {
    pub status: FunctionResultStatus,
    pub feedback: String,
    pub info: Map<String, Value>,
}

impl FunctionOutput {
    pub fn done(feedback: impl Into<String>) -> Self {
        Self {
            status: FunctionResultStatus::Done,
            feedback: feedback.into(),
            info: Map::new(),
        }
    }

    pub fn error(feedback: impl Into<String>) -> Self {
        Self {
            status: FunctionResultStatus::Error,
            feedback: feedback.into(),
            info: Map::new(),
        }
    }

    pub fn with_info(mut self, key: impl Into<String>, value: Value) -> Self {
        self.info.insert(key.into(), value);
        self
    }
}

// Local code bound to a function definition
#[async_trait]
pub trait Executable: Send + Sync {
    async fn call(&self, args: Map<String, Value>) -> anyhow::Result<FunctionOutput>;
}

#[async_trait]
impl<F> Executable for F
where
    F: Fn(Map<String, Value>) -> anyhow::Result<FunctionOutput> + Send + Sync,
{
    async fn call(&self, args: Map<String, Value>) -> anyhow::Result<FunctionOutput> {
        self(args)
    }
}

#[derive(Clone)]
pub struct Function {
    name: String,
    description: String,
    args: Vec<Argument>,
    hint: Option<String>,
    executable: Arc<dyn Executable>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        args: Vec<Argument>,
        executable: impl Executable + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args,
            hint: None,
            executable: Arc::new(executable),
        }
    }

    /// Build a function around a synchronous closure.
    pub fn from_fn<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        args: Vec<Argument>,
        f: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>) -> anyhow::Result<FunctionOutput> + Send + Sync + 'static,
    {
        Self::new(name, description, args, f)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    pub fn definition(&self) -> FunctionDefinition {
        FunctionDefinition {
            fn_name: self.name.clone(),
            fn_description: self.description.clone(),
            args: self.args.clone(),
            hint: self.hint.clone(),
        }
    }

    /// Match the arguments proposed by the decision service against the
    /// declared ones. Values wrapped as `{"value": ...}` are unwrapped.
    pub fn bind_args(&self, provided: &Map<String, Value>) -> Result<Map<String, Value>, GameError> {
        let mut bound = Map::new();
        for (name, value) in provided {
            if !self.args.iter().any(|arg| &arg.name == name) {
                return Err(GameError::ArgumentMismatch {
                    fn_name: self.name.clone(),
                    message: format!("unexpected argument '{}'", name),
                });
            }
            let value = match value {
                Value::Object(wrapped) if wrapped.contains_key("value") => wrapped["value"].clone(),
                other => other.clone(),
            };
            bound.insert(name.clone(), value);
        }

        let missing: Vec<&str> = self
            .args
            .iter()
            .filter(|arg| !arg.optional && !bound.contains_key(&arg.name))
            .map(|arg| arg.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(GameError::ArgumentMismatch {
                fn_name: self.name.clone(),
                message: format!("missing required argument(s): {}", missing.join(", ")),
            });
        }

        Ok(bound)
    }

    /// Run the function for a decision. Argument mismatches and executable
    /// failures come back as `ERROR` results; they do not abort the loop.
    pub async fn execute(&self, fn_id: Option<&str>, args: &Map<String, Value>) -> FunctionResult {
        let action_id = fn_id.unwrap_or_default().to_string();

        let bound = match self.bind_args(args) {
            Ok(bound) => bound,
            Err(e) => {
                log::warn!("{}", e);
                return FunctionResult::new(
                    action_id,
                    FunctionResultStatus::Error,
                    e.to_string(),
                    Map::new(),
                );
            }
        };

        match self.executable.call(bound).await {
            Ok(output) => FunctionResult::new(action_id, output.status, output.feedback, output.info),
            Err(e) => {
                log::error!("Function '{}' failed: {}", self.name, e);
                FunctionResult::new(
                    action_id,
                    FunctionResultStatus::Error,
                    format!("Error executing function: {}", e),
                    Map::new(),
                )
            }
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("args", &self.args)
            .field("hint", &self.hint)
            .field("executable", &"<dyn Executable>")
            .finish()
    }
}

/// Functions a worker can be told to execute, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ActionSpace {
    functions: Vec<Function>,
    index: HashMap<String, usize>,
}

impl ActionSpace {
    /// Build from a list. Two functions with the same name are rejected.
    pub fn new(functions: Vec<Function>) -> Result<Self, GameError> {
        let mut index = HashMap::with_capacity(functions.len());
        for (position, function) in functions.iter().enumerate() {
            if index.insert(function.name.clone(), position).is_some() {
                let mut errors = HashMap::new();
                errors.insert(function.name.clone(), "duplicate function name".to_string());
                return Err(GameError::validation_with_errors(
                    format!("Duplicate function name in action space: {}", function.name),
                    errors,
                ));
            }
        }
        Ok(Self { functions, index })
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.index.get(name).map(|&position| &self.functions[position])
    }

    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.functions.iter().map(Function::definition).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.iter().map(Function::name).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
