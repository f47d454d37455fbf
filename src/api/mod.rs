//! Zabbix API client.
//!
//! JSON-RPC 2.0 over HTTP(S) against `<frontend>/api_jsonrpc.php`. The
//! session token is owned by the single thread of control and released
//! with `logout` on every exit path.

pub mod models;

pub use models::*;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::ApiConfig;

const JSONRPC_PATH: &str = "api_jsonrpc.php";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// API error types.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error {code}: {message} {data}")]
    Rpc {
        code: i64,
        message: String,
        data: String,
    },
    #[error("unexpected API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Transient errors are worth retrying; API-level errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

#[derive(serde::Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: String,
}

#[derive(serde::Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

/// Blocking client for the Zabbix JSON-RPC API.
pub struct ZabbixApi {
    http: reqwest::blocking::Client,
    endpoint: String,
    auth: Option<String>,
    next_id: u64,
}

impl ZabbixApi {
    /// Build a client from the resolved configuration. No network call yet.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        let mut endpoint = config.api_url.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        endpoint.push_str(JSONRPC_PATH);

        Ok(Self {
            http,
            endpoint,
            auth: None,
            next_id: 1,
        })
    }

    /// Log in and store the session token.
    pub fn login(&mut self, config: &ApiConfig) -> Result<(), ApiError> {
        let result = self.call(
            "user.login",
            json!({
                "username": config.username,
                "password": config.password,
            }),
        )?;
        match result.as_str() {
            Some(token) => {
                self.auth = Some(token.to_string());
                tracing::debug!("logged in to {}", self.endpoint);
                Ok(())
            }
            None => Err(ApiError::Decode("user.login did not return a token".into())),
        }
    }

    /// Release the session. Best-effort: failures are logged, not raised.
    pub fn logout(&mut self) {
        if self.auth.is_some() {
            if let Err(err) = self.call("user.logout", json!([])) {
                tracing::warn!("logout failed: {}", err);
            }
            self.auth = None;
        }
    }

    /// Remote API version (`apiinfo.version`), no authentication required.
    pub fn api_version(&mut self) -> Result<String, ApiError> {
        let result = self.call("apiinfo.version", json!([]))?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("apiinfo.version did not return a string".into()))
    }

    /// Perform one JSON-RPC call and return the raw `result` value.
    pub fn call(&mut self, method: &str, params: Value) -> Result<Value, ApiError> {
        let id = self.next_id;
        self.next_id += 1;
        let body = build_request(method, params, id, self.auth.as_deref());

        tracing::debug!(method, id, "API call");
        let response: RpcResponse = self
            .http
            .post(self.endpoint.as_str())
            .json(&body)
            .send()?
            .json()
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if let Some(err) = response.error {
            return Err(ApiError::Rpc {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }
        response
            .result
            .ok_or_else(|| ApiError::Decode(format!("{method}: response carries no result")))
    }

    /// Perform one call and decode the result into a typed record.
    pub fn call_typed<T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<T, ApiError> {
        let raw = self.call(method, params)?;
        serde_json::from_value(raw).map_err(|e| ApiError::Decode(format!("{method}: {e}")))
    }
}

/// Assemble the JSON-RPC request envelope.
///
/// `user.login` and `apiinfo.version` are the unauthenticated methods; the
/// session token is attached to everything else once present.
fn build_request(method: &str, params: Value, id: u64, auth: Option<&str>) -> Value {
    let mut body = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": id,
    });
    if let Some(token) = auth {
        if method != "user.login" && method != "apiinfo.version" {
            body["auth"] = json!(token);
        }
    }
    body
}
