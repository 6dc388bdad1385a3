// Pass Protector - Unix Domain Socket Server
//
// Listens on a Unix domain socket for JSON-RPC 2.0 requests from scripts and
// local tools. Each connection is handled in a spawned tokio task. Every
// request re-reads the persisted session first, so a `pass-protector login`
// in another terminal is picked up without restarting the gateway.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::auth::{
    AnonymousProvider, AuthError, EmailProvider, IdentityProvider, ProviderKind, SessionManager,
};
use crate::config::Tenancy;
use crate::store::{
    CredentialFields, CredentialRecord, CredentialStore, Database, OwnerId, SqliteCredentialStore,
    StoreError,
};
use crate::vault::{mask_password, RecordLocks};

use super::protocol::*;

/// A failed method call, ready to become a JSON-RPC error object.
#[derive(Debug)]
struct MethodError {
    code: i32,
    message: String,
}

impl MethodError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn not_found(id: &Uuid) -> Self {
        Self::new(RECORD_NOT_FOUND, format!("Credential not found: {}", id))
    }
}

impl From<StoreError> for MethodError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::not_found(&id),
            other => Self::new(INTERNAL_ERROR, other.to_string()),
        }
    }
}

impl From<AuthError> for MethodError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Cancelled | AuthError::Rejected(_) => Self::new(INVALID_PARAMS, e.to_string()),
            AuthError::Persistence(_) => Self::new(INTERNAL_ERROR, e.to_string()),
        }
    }
}

type MethodResult = Result<Value, MethodError>;

/// Request handling shared by all connections.
pub struct Gateway {
    db_path: PathBuf,
    hex_key: Zeroizing<String>,
    tenancy: Tenancy,
    sessions: Arc<SessionManager>,
    locks: RecordLocks,
}

impl Gateway {
    pub fn new(
        db_path: PathBuf,
        hex_key: Zeroizing<String>,
        tenancy: Tenancy,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            db_path,
            hex_key,
            tenancy,
            sessions,
            locks: RecordLocks::new(),
        }
    }

    /// Parse and answer a single JSON-RPC request line.
    pub async fn handle(&self, raw: &str) -> JsonRpcResponse {
        let request: JsonRpcRequest = match serde_json::from_str(raw) {
            Ok(req) => req,
            Err(e) => return JsonRpcResponse::parse_error(format!("Parse error: {}", e)),
        };

        if let Err(e) = request.validate() {
            return JsonRpcResponse::error(request.id, INVALID_REQUEST, e);
        }

        tracing::debug!(method = %request.method, "Gateway request");

        if let Err(e) = self.sessions.resync() {
            return JsonRpcResponse::error(request.id, INTERNAL_ERROR, e.to_string());
        }

        let id = request.id.clone();
        match self.dispatch(&request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::debug!(method = %request.method, code = e.code, "Gateway request failed");
                JsonRpcResponse::error(id, e.code, e.message)
            }
        }
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> MethodResult {
        match request.method.as_str() {
            SESSION_CURRENT => self.session_current(),
            SESSION_SIGN_IN => self.session_sign_in(params(request)?),
            SESSION_SIGN_OUT => self.session_sign_out(),
            CREDENTIALS_LIST => self.credentials_list(),
            CREDENTIALS_REVEAL => self.credentials_reveal(params(request)?),
            CREDENTIALS_CREATE => self.credentials_create(params(request)?),
            CREDENTIALS_UPDATE => self.credentials_update(params(request)?).await,
            CREDENTIALS_DELETE => self.credentials_delete(params(request)?).await,
            other => Err(MethodError::new(
                METHOD_NOT_FOUND,
                format!("Unknown method: {}", other),
            )),
        }
    }

    fn open_db(&self) -> Result<Database, MethodError> {
        Ok(Database::open_existing(&self.db_path, &self.hex_key)?)
    }

    /// The owner filter for credential methods.
    fn owner(&self) -> Result<Option<OwnerId>, MethodError> {
        match self.tenancy {
            Tenancy::Shared => Ok(None),
            Tenancy::PerUser => self
                .sessions
                .current()
                .map(|s| Some(s.owner_id()))
                .ok_or_else(|| MethodError::new(NOT_SIGNED_IN, "Not signed in")),
        }
    }

    // ─── Session Methods ─────────────────────────────────────────────────────

    fn session_current(&self) -> MethodResult {
        Ok(json!({ "session": self.sessions.current() }))
    }

    fn session_sign_in(&self, params: SignInParams) -> MethodResult {
        let provider: Box<dyn IdentityProvider> = match params.provider {
            ProviderKind::Anonymous => Box::new(AnonymousProvider),
            ProviderKind::Email => Box::new(EmailProvider::new(params.email.unwrap_or_default())),
        };
        let session = self.sessions.sign_in(provider.as_ref())?;
        Ok(json!({ "session": session }))
    }

    fn session_sign_out(&self) -> MethodResult {
        self.sessions.sign_out()?;
        Ok(json!({ "session": null }))
    }

    // ─── Credential Methods ──────────────────────────────────────────────────

    fn credentials_list(&self) -> MethodResult {
        let owner = self.owner()?;
        let db = self.open_db()?;
        let records = SqliteCredentialStore::new(&db).list(owner.as_ref())?;

        let rows: Vec<Value> = records.iter().map(masked).collect();
        Ok(Value::Array(rows))
    }

    fn credentials_reveal(&self, params: IdParams) -> MethodResult {
        let owner = self.owner()?;
        let db = self.open_db()?;
        let record = visible_record(&SqliteCredentialStore::new(&db), &params.id, owner.as_ref())?
            .ok_or_else(|| MethodError::not_found(&params.id))?;

        tracing::info!(credential_id = %record.id, "Password revealed over gateway");
        Ok(json!({
            "id": record.id.to_string(),
            "site": record.site,
            "username": record.username,
            "password": record.password(),
        }))
    }

    fn credentials_create(&self, params: FieldParams) -> MethodResult {
        let owner = self.owner()?;
        let fields = checked_fields(params)?;

        let db = self.open_db()?;
        let id = SqliteCredentialStore::new(&db).create(&fields, owner.as_ref())?;
        Ok(json!({ "id": id.to_string() }))
    }

    async fn credentials_update(&self, params: UpdateParams) -> MethodResult {
        let owner = self.owner()?;
        let fields = checked_fields(params.fields)?;

        let _guard = self.locks.acquire(params.id).await;
        let db = self.open_db()?;
        SqliteCredentialStore::new(&db).update(&params.id, &fields, owner.as_ref())?;
        Ok(json!({ "id": params.id.to_string() }))
    }

    async fn credentials_delete(&self, params: IdParams) -> MethodResult {
        let owner = self.owner()?;

        let _guard = self.locks.acquire(params.id).await;
        let db = self.open_db()?;
        let store = SqliteCredentialStore::new(&db);

        // A record that exists but belongs to someone else is reported as
        // missing; one that is already gone is a successful no-op.
        if let Some(existing) = store.get(&params.id)? {
            if !is_visible(&existing, owner.as_ref()) {
                return Err(MethodError::not_found(&params.id));
            }
        }

        let deleted = store.delete(&params.id)?;
        Ok(json!({ "id": params.id.to_string(), "deleted": deleted }))
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn params<T: serde::de::DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, MethodError> {
    request
        .params()
        .map_err(|e| MethodError::new(INVALID_PARAMS, e))
}

fn checked_fields(params: FieldParams) -> Result<CredentialFields, MethodError> {
    let fields = CredentialFields::from(params);
    let missing = fields.missing();
    if !missing.is_empty() {
        return Err(MethodError::new(
            INVALID_PARAMS,
            format!("Please fill in: {}", missing.join(", ")),
        ));
    }
    Ok(fields)
}

fn is_visible(record: &CredentialRecord, owner: Option<&OwnerId>) -> bool {
    owner.is_none() || record.is_owned_by(owner)
}

fn visible_record(
    store: &dyn CredentialStore,
    id: &Uuid,
    owner: Option<&OwnerId>,
) -> Result<Option<CredentialRecord>, MethodError> {
    Ok(store.get(id)?.filter(|r| is_visible(r, owner)))
}

fn masked(record: &CredentialRecord) -> Value {
    json!({
        "id": record.id.to_string(),
        "site": record.site,
        "username": record.username,
        "password": mask_password(record.password()),
        "created_at": record.created_at.to_rfc3339(),
        "updated_at": record.updated_at.to_rfc3339(),
    })
}

// ─── Server ──────────────────────────────────────────────────────────────────

/// Unix Domain Socket server for Pass Protector.
pub struct UdsServer {
    gateway: Arc<Gateway>,
    socket_path: PathBuf,
}

impl UdsServer {
    pub fn new(gateway: Gateway, socket_path: PathBuf) -> Self {
        Self {
            gateway: Arc::new(gateway),
            socket_path,
        }
    }

    /// Start the UDS server. This runs until the process is terminated.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.socket_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Remove stale socket file if it exists
        if self.socket_path.exists() {
            tokio::fs::remove_file(&self.socket_path).await?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Owner-only access to the socket
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.socket_path, perms)?;
        }

        tracing::info!(
            socket = %self.socket_path.display(),
            "Pass Protector gateway listening"
        );

        loop {
            let (stream, _addr) = listener.accept().await?;
            let gateway = Arc::clone(&self.gateway);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, &gateway).await {
                    tracing::error!("Connection handler error: {}", e);
                }
            });
        }
    }
}

/// Reads newline-delimited JSON-RPC requests and writes one response line
/// per request.
async fn handle_connection(
    stream: tokio::net::UnixStream,
    gateway: &Gateway,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = gateway.handle(&line).await;
        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
