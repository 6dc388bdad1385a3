// Pass Protector - JSON-RPC 2.0 Protocol Types
//
// Minimal JSON-RPC 2.0 envelope plus the typed parameters of each method.
// Requests and responses are newline-delimited on the socket.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::ProviderKind;
use crate::store::CredentialFields;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Value,
}

/// A JSON-RPC 2.0 success/error response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC 2.0 error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Application error codes
pub const NOT_SIGNED_IN: i32 = -32001;
pub const RECORD_NOT_FOUND: i32 = -32002;

// Methods
pub const SESSION_CURRENT: &str = "session.current";
pub const SESSION_SIGN_IN: &str = "session.sign_in";
pub const SESSION_SIGN_OUT: &str = "session.sign_out";
pub const CREDENTIALS_LIST: &str = "credentials.list";
pub const CREDENTIALS_REVEAL: &str = "credentials.reveal";
pub const CREDENTIALS_CREATE: &str = "credentials.create";
pub const CREDENTIALS_UPDATE: &str = "credentials.update";
pub const CREDENTIALS_DELETE: &str = "credentials.delete";

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }

    /// Create a parse error response (id is null because we couldn't parse it).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error(Value::Null, PARSE_ERROR, message)
    }
}

impl JsonRpcRequest {
    /// Validate that this is a proper JSON-RPC 2.0 request.
    pub fn validate(&self) -> Result<(), String> {
        if self.jsonrpc != "2.0" {
            return Err("jsonrpc must be \"2.0\"".to_string());
        }
        if self.method.is_empty() {
            return Err("method must not be empty".to_string());
        }
        Ok(())
    }

    /// Decode `params` into the method's parameter type.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, String> {
        let params = match self.params {
            Value::Null => Value::Object(Default::default()),
            ref other => other.clone(),
        };
        serde_json::from_value(params).map_err(|e| format!("Invalid params: {}", e))
    }
}

// ─── Method Parameters ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignInParams {
    pub provider: ProviderKind,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdParams {
    pub id: Uuid,
}

/// Missing fields decode as empty so validation can name all of them at once.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    pub site: String,
    pub username: String,
    pub password: String,
}

impl From<FieldParams> for CredentialFields {
    fn from(p: FieldParams) -> Self {
        CredentialFields::new(p.site, p.username, p.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: FieldParams,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
