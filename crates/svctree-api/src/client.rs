//! Blocking JSON-RPC 2.0 client for the management API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use svctree_core::{ServiceDocument, ServiceId};

use crate::ApiError;

/// Authenticated session with the management API.
///
/// `authenticate` obtains a session token (`user.login`); every later
/// `invoke` attaches it to the request envelope.
pub struct ManagementClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    session: Option<String>,
    next_id: u64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl ManagementClient {
    pub fn new(endpoint: &str) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            session: None,
            next_id: 1,
        })
    }

    /// Log in and keep the returned session token for later calls.
    pub fn authenticate(&mut self, user: &str, password: &str) -> Result<(), ApiError> {
        let params = serde_json::json!({ "user": user, "password": password });
        let result = self.call("user.login", params)?;
        let token = result
            .as_str()
            .ok_or_else(|| ApiError::MalformedResponse("user.login result is not a string".to_string()))?;
        self.session = Some(token.to_string());
        debug!(endpoint = %self.endpoint, user, "authenticated");
        Ok(())
    }

    /// Invoke an authenticated method. Fails without a prior `authenticate`.
    pub fn invoke(&mut self, method: &str, params: Value) -> Result<Value, ApiError> {
        if self.session.is_none() {
            return Err(ApiError::NotAuthenticated);
        }
        self.call(method, params)
    }

    /// Ask the platform to create a service from the document's scalar
    /// fields; returns the new service id.
    pub fn create_service(&mut self, doc: &ServiceDocument) -> Result<ServiceId, ApiError> {
        let params = serde_json::json!({
            "name": doc.name,
            "algorithm": doc.algorithm,
            "showsla": doc.showsla as i64,
            "goodsla": doc.goodsla,
            "sortorder": doc.sortorder,
        });
        let result = self.invoke("service.create", params)?;
        let id = extract_service_id(&result)?;
        debug!(service = %id, name = %doc.name, "service created via API");
        Ok(id)
    }

    /// Ask the platform to delete services, one bulk call for all ids.
    pub fn delete_services(&mut self, ids: &[ServiceId]) -> Result<(), ApiError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.invoke("service.delete", serde_json::json!(ids))?;
        debug!(count = ids.len(), "services deleted via API");
        Ok(())
    }

    fn call(&mut self, method: &str, params: Value) -> Result<Value, ApiError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            auth: self.session.as_deref(),
            id: self.next_id,
        };
        self.next_id += 1;
        debug!(method, "management API call");
        let response: RpcResponse = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| ApiError::Http(e.to_string()))?
            .json()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        unwrap_response(response)
    }
}

fn unwrap_response(response: RpcResponse) -> Result<Value, ApiError> {
    if let Some(error) = response.error {
        return Err(ApiError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    response
        .result
        .ok_or_else(|| ApiError::MalformedResponse("neither result nor error present".to_string()))
}

/// `service.create` answers `{"serviceids": ["<id>", ...]}`; the first id is
/// the created service.
fn extract_service_id(result: &Value) -> Result<ServiceId, ApiError> {
    let ids = result
        .get("serviceids")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::MalformedResponse("serviceids missing from result".to_string()))?;
    match ids.first() {
        Some(Value::String(id)) => Ok(id.clone()),
        // Some deployments answer with numeric ids.
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ApiError::MalformedResponse(
            "serviceids is empty or not id-valued".to_string(),
        )),
    }
}
