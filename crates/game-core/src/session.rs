//! Per-run session identity and pending function result

use uuid::Uuid;

use crate::types::FunctionResult;

/// Identity of one agent run plus the last function execution result.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    function_result: Option<FunctionResult>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            function_result: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn function_result(&self) -> Option<&FunctionResult> {
        self.function_result.as_ref()
    }

    pub(crate) fn set_function_result(&mut self, result: FunctionResult) {
        self.function_result = Some(result);
    }

    /// Fresh identity, no pending result.
    pub fn reset(&mut self) {
        self.id = Uuid::new_v4().to_string();
        self.function_result = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
