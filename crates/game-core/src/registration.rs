//! Remote registration of agents and worker maps
//!
//! Both calls create records on the service every time they succeed; callers
//! should make them once per logical agent or worker set.

use serde::Serialize;
use serde_json::Value;

use crate::errors::GameError;
use crate::transport::GameClient;
use crate::types::FunctionDefinition;
use crate::worker::WorkerConfig;

pub const AGENTS_ENDPOINT: &str = "/v2/agents";
pub const WORKERS_ENDPOINT: &str = "/v2/workers";

#[derive(Debug, Serialize)]
struct CreateAgentRequest<'a> {
    name: &'a str,
    description: &'a str,
    goal: &'a str,
}

#[derive(Debug, Serialize)]
struct WorkerDescriptor<'a> {
    id: &'a str,
    description: &'a str,
    instruction: &'a str,
    action_space: Vec<FunctionDefinition>,
}

#[derive(Debug, Serialize)]
struct CreateWorkersRequest<'a> {
    workers: Vec<WorkerDescriptor<'a>>,
}

/// Register an agent and return its id.
pub async fn create_agent(
    client: &GameClient,
    name: &str,
    description: &str,
    goal: &str,
) -> Result<String, GameError> {
    if name.trim().is_empty() {
        return Err(GameError::validation_with_errors(
            "Name cannot be empty",
            [("name".to_string(), "must be a non-empty string".to_string())]
                .into_iter()
                .collect(),
        ));
    }

    let request = CreateAgentRequest {
        name,
        description,
        goal,
    };
    let data = client
        .post_with_timeout(
            AGENTS_ENDPOINT,
            &request,
            client.config().request_timeout_duration(),
        )
        .await?;

    let agent_id = extract_id(&data)
        .ok_or_else(|| GameError::api("Failed to create agent: missing id in response"))?;
    log::info!("Created agent '{}' with id {}", name, agent_id);
    Ok(agent_id)
}

/// Register a set of workers as one map and return the map id.
pub async fn create_workers(
    client: &GameClient,
    workers: &[WorkerConfig],
) -> Result<String, GameError> {
    let request = CreateWorkersRequest {
        workers: workers
            .iter()
            .map(|worker| WorkerDescriptor {
                id: worker.id(),
                description: worker.description(),
                instruction: worker.instruction(),
                action_space: worker.function_definitions(),
            })
            .collect(),
    };

    let data = client
        .post_with_timeout(
            WORKERS_ENDPOINT,
            &request,
            client.config().request_timeout_duration(),
        )
        .await?;

    let map_id = extract_id(&data)
        .ok_or_else(|| GameError::api("Failed to create worker: missing id in response"))?;
    log::info!("Registered {} worker(s) as map {}", workers.len(), map_id);
    Ok(map_id)
}

fn extract_id(data: &Value) -> Option<String> {
    match data.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
