//! Authenticated HTTP transport for the GAME API
//!
//! Every call goes through [`GameClient`]: it exchanges the static API key
//! for a bearer token once, reuses that token afterwards, and turns every
//! transport or protocol failure into a [`GameError`] exactly once. Success
//! bodies are unwrapped from the service's `{"data": ...}` envelope.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::errors::GameError;

pub const TOKEN_ENDPOINT: &str = "/api/accesses/tokens";

pub struct GameClient {
    client: Client,
    config: ClientConfig,
    access_token: Mutex<Option<String>>,
}

impl GameClient {
    pub fn new(mut config: ClientConfig) -> Result<Self, GameError> {
        if config.api_key.trim().is_empty() {
            return Err(GameError::Configuration("API key not set".to_string()));
        }
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        config.validate()?;

        Ok(Self {
            client: Client::new(),
            config,
            access_token: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Bearer token for API calls, exchanged on first use and cached.
    pub async fn access_token(&self) -> Result<String, GameError> {
        let mut cached = self.access_token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.exchange_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Forget the cached token; the next call exchanges a new one.
    pub async fn clear_access_token(&self) {
        *self.access_token.lock().await = None;
    }

    async fn exchange_token(&self) -> Result<String, GameError> {
        let url = format!("{}{}", self.config.api_base_url, TOKEN_ENDPOINT);
        log::debug!("Requesting access token from {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .timeout(self.config.request_timeout_duration())
            .json(&json!({ "data": {} }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if status == StatusCode::UNAUTHORIZED {
            log::error!("Token exchange rejected the API key");
            return Err(GameError::Authentication {
                message: "Invalid API key".to_string(),
                status_code: Some(status.as_u16()),
                response: decode_lenient(&body),
            });
        }
        if !status.is_success() {
            let err = GameError::api_with_status(
                format!("Failed to obtain access token: HTTP {}", status.as_u16()),
                status.as_u16(),
                decode_lenient(&body),
            );
            log::error!("{}", err);
            return Err(err);
        }

        let decoded: Value = serde_json::from_str(&body)
            .map_err(|_| GameError::api("Invalid JSON response from token endpoint"))?;
        decoded
            .get("data")
            .and_then(|data| data.get("accessToken"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                GameError::api("Failed to obtain access token: missing accessToken in response")
            })
    }

    /// POST `payload` to `endpoint` with the transport's default timeout.
    pub async fn post<T>(&self, endpoint: &str, payload: &T) -> Result<Value, GameError>
    where
        T: Serialize + ?Sized,
    {
        self.send(endpoint, payload, None).await
    }

    pub async fn post_with_timeout<T>(
        &self,
        endpoint: &str,
        payload: &T,
        timeout: Duration,
    ) -> Result<Value, GameError>
    where
        T: Serialize + ?Sized,
    {
        self.send(endpoint, payload, Some(timeout)).await
    }

    async fn send<T>(
        &self,
        endpoint: &str,
        payload: &T,
        timeout: Option<Duration>,
    ) -> Result<Value, GameError>
    where
        T: Serialize + ?Sized,
    {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.config.api_base_url, endpoint);
        log::debug!("POST {}", url);

        let mut request = self.client.post(&url).bearer_auth(token).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            let err = transport_error(e);
            log::error!("POST {} failed: {}", endpoint, err);
            err
        })?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        log::debug!("Response from {} ({}): {}", endpoint, status, body);

        let result = classify(status, &body);
        if let Err(err) = &result {
            if err.is_authentication_error() {
                self.clear_access_token().await;
            }
            log::error!("POST {} failed: {}", endpoint, err);
        }
        result
    }
}

impl fmt::Debug for GameClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameClient")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

fn transport_error(e: reqwest::Error) -> GameError {
    if e.is_timeout() {
        GameError::api(format!("Connection timeout: {}", e))
    } else if e.is_connect() {
        GameError::api(format!("Connection failed: {}", e))
    } else {
        GameError::api(format!("Request failed: {}", e))
    }
}

fn classify(status: StatusCode, body: &str) -> Result<Value, GameError> {
    match status.as_u16() {
        200 => unwrap_envelope(body),
        204 => Ok(Value::Object(Map::new())),
        401 => Err(GameError::Authentication {
            message: "Invalid API key".to_string(),
            status_code: Some(401),
            response: decode_lenient(body),
        }),
        400 => Err(GameError::validation(
            error_message(body).unwrap_or_else(|| "Invalid request".to_string()),
        )),
        429 => Err(GameError::api_with_status(
            "Rate limit exceeded",
            429,
            decode_lenient(body),
        )),
        code if code >= 500 => Err(GameError::api_with_status(
            "Server error",
            code,
            decode_lenient(body),
        )),
        code => {
            let decoded = decode_lenient(body);
            Err(GameError::api_with_status(
                format!(
                    "Unexpected response status {}: {}",
                    code,
                    decoded
                        .as_ref()
                        .map(Value::to_string)
                        .unwrap_or_else(|| body.to_string())
                ),
                code,
                decoded,
            ))
        }
    }
}

fn unwrap_envelope(body: &str) -> Result<Value, GameError> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let decoded: Value =
        serde_json::from_str(body).map_err(|_| GameError::api("Invalid JSON response"))?;
    match decoded.get("data") {
        Some(Value::Null) | None => Ok(Value::Object(Map::new())),
        Some(data) => Ok(data.clone()),
    }
}

fn decode_lenient(body: &str) -> Option<Value> {
    serde_json::from_str(body).ok()
}

/// Message from an error body: `error.message`, or a bare string `error`.
fn error_message(body: &str) -> Option<String> {
    let decoded = decode_lenient(body)?;
    match decoded.get("error")? {
        Value::String(message) => Some(message.clone()),
        error => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
