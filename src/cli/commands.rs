// Pass Protector - CLI Command Handlers
//
// Each function handles one CLI subcommand. Record commands go through a
// `VaultView` fed by the session manager, so the CLI follows the same
// create/update/refresh rules as any other front end. Data goes to stdout,
// notices and prompts to stderr.

use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{
    AnonymousProvider, AuthError, EmailProvider, IdentityProvider, Session, SessionManager,
};
use crate::config::{self, Config, Tenancy};
use crate::error::PassError;
use crate::gateway::{Gateway, UdsServer};
use crate::keychain::{KeyringProvider, MasterKeyProvider};
use crate::store::{Database, SqliteCredentialStore};
use crate::vault::{CopyField, Field, NoticeLevel, StdoutClipboard, VaultError, VaultView};

use super::Commands;

/// Execute the parsed CLI command.
pub async fn execute(command: Commands) -> Result<(), PassError> {
    match command {
        Commands::Init => cmd_init(),
        Commands::Login { email, anonymous } => cmd_login(email, anonymous),
        Commands::Logout => cmd_logout(),
        Commands::Whoami => cmd_whoami(),
        Commands::List { reveal } => cmd_list(reveal),
        Commands::Add {
            site,
            username,
            password,
        } => cmd_add(site, username, password),
        Commands::Edit {
            id,
            site,
            username,
            password,
        } => cmd_edit(id, site, username, password),
        Commands::Delete { id } => cmd_delete(id),
        Commands::Copy { id, field } => cmd_copy(id, field),
        Commands::Config { tenancy } => cmd_config(tenancy),
        Commands::Serve => cmd_serve().await,
    }
}

// ─── Init ────────────────────────────────────────────────────────────────────

fn cmd_init() -> Result<(), PassError> {
    let provider = KeyringProvider::new();

    let dir = config::data_dir();
    std::fs::create_dir_all(&dir)?;

    let hex_key = provider.database_key_hex()?;

    let path = config::db_path();
    let _db = Database::open(&path, &hex_key)
        .map_err(|e| PassError::Other(format!("Failed to initialize database: {}", e)))?;

    // Writes the defaults on first run, keeps an existing file as is.
    let config = Config::load_from(&dir)?;
    config.save_to(&dir)?;

    println!("✓ Pass Protector initialized");
    println!("  Database: {}", path.display());
    println!("  Tenancy:  {}", config.tenancy);
    println!("  Master key stored in platform keyring");
    println!();
    match config.tenancy {
        Tenancy::PerUser => println!("Next: sign in with `pass-protector login`"),
        Tenancy::Shared => println!(
            "Next: add an entry with `pass-protector add --site <site> --username <name> --password <password>`"
        ),
    }

    Ok(())
}

// ─── Session ─────────────────────────────────────────────────────────────────

fn cmd_login(email: Option<String>, anonymous: bool) -> Result<(), PassError> {
    let manager = session_manager()?;

    let provider: Box<dyn IdentityProvider> = if anonymous {
        Box::new(AnonymousProvider)
    } else {
        let email = match email {
            Some(email) => email,
            None => prompt("Email (leave empty to cancel): ")?,
        };
        Box::new(EmailProvider::new(email))
    };

    let session = report_sign_in(manager.sign_in(provider.as_ref()))?;
    eprintln!("✓ Signed in as {}", session);
    Ok(())
}

/// A cancelled sign-in is shown as a failed action rather than an error
/// message, but still fails the command.
fn report_sign_in(result: Result<Session, AuthError>) -> Result<Session, PassError> {
    match result {
        Ok(session) => Ok(session),
        Err(AuthError::Cancelled) => {
            eprintln!("✗ Sign-in cancelled");
            Err(PassError::Reported)
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_logout() -> Result<(), PassError> {
    let manager = session_manager()?;

    if manager.current().is_none() {
        eprintln!("Not signed in");
        return Ok(());
    }
    manager.sign_out()?;
    eprintln!("✓ Signed out");

    Ok(())
}

fn cmd_whoami() -> Result<(), PassError> {
    let manager = session_manager()?;

    match manager.current() {
        Some(session) => {
            println!("{}", session);
            println!(
                "  Signed in: {}",
                session.signed_in_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => println!("Not signed in"),
    }

    Ok(())
}

// ─── List ────────────────────────────────────────────────────────────────────

fn cmd_list(reveal: bool) -> Result<(), PassError> {
    let db = open_db()?;
    let store = SqliteCredentialStore::new(&db);
    let mut view = load_view(&store)?;

    if reveal {
        view.toggle_password_visibility();
    }

    let rows = view.rows();
    if rows.is_empty() {
        println!("No passwords stored yet.");
        println!(
            "Add one with: pass-protector add --site <site> --username <name> --password <password>"
        );
        return Ok(());
    }

    println!("Stored passwords ({}):\n", rows.len());
    for row in &rows {
        println!(
            "  {:>3} │ {} │ {:24} │ {:20} │ {}",
            row.index, row.id, row.site, row.username, row.password,
        );
    }

    Ok(())
}

// ─── Add / Edit / Delete ─────────────────────────────────────────────────────

fn cmd_add(site: String, username: String, password: String) -> Result<(), PassError> {
    let db = open_db()?;
    let store = SqliteCredentialStore::new(&db);
    let mut view = load_view(&store)?;

    view.set_field(Field::Site, site);
    view.set_field(Field::Username, username);
    view.set_field(Field::Password, password);

    let result = view.save(&store);
    let id = finish(&mut view, result)?;
    println!("{}", id);

    Ok(())
}

fn cmd_edit(
    id: String,
    site: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<(), PassError> {
    let id = parse_id(&id)?;

    let db = open_db()?;
    let store = SqliteCredentialStore::new(&db);
    let mut view = load_view(&store)?;

    let selected = view.select_for_edit(id);
    finish(&mut view, selected)?;

    for (field, value) in [
        (Field::Site, site),
        (Field::Username, username),
        (Field::Password, password),
    ] {
        if let Some(value) = value {
            view.set_field(field, value);
        }
    }

    let result = view.save(&store);
    finish(&mut view, result)?;

    Ok(())
}

fn cmd_delete(id: String) -> Result<(), PassError> {
    let id = parse_id(&id)?;

    let db = open_db()?;
    let store = SqliteCredentialStore::new(&db);
    let mut view = load_view(&store)?;

    let result = view.delete(id, &store);
    finish(&mut view, result)?;

    Ok(())
}

// ─── Copy ────────────────────────────────────────────────────────────────────

fn cmd_copy(id: String, field: CopyField) -> Result<(), PassError> {
    let id = parse_id(&id)?;

    let db = open_db()?;
    let store = SqliteCredentialStore::new(&db);
    let mut view = load_view(&store)?;

    let result = view.copy(id, field, &mut StdoutClipboard);
    finish(&mut view, result)?;

    Ok(())
}

// ─── Config ──────────────────────────────────────────────────────────────────

fn cmd_config(tenancy: Option<Tenancy>) -> Result<(), PassError> {
    let mut config = Config::load()?;

    if let Some(tenancy) = tenancy {
        config.tenancy = tenancy;
        config.save()?;
        tracing::info!(%tenancy, "Tenancy changed");
        eprintln!("✓ Tenancy set to {}", tenancy);
    }

    println!("Data directory: {}", config::data_dir().display());
    println!("Tenancy:        {}", config.tenancy);
    println!("Socket:         {}", config.socket_path().display());

    Ok(())
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve() -> Result<(), PassError> {
    let keychain = Arc::new(KeyringProvider::new());
    ensure_initialized(keychain.as_ref())?;

    let config = Config::load()?;
    let hex_key = keychain.database_key_hex()?;
    let path = config::db_path();

    // Fail fast on a missing database or a wrong key.
    Database::open_existing(&path, &hex_key)?;

    let sessions = Arc::new(SessionManager::new(keychain));
    let gateway = Gateway::new(path, hex_key, config.tenancy, sessions);

    let socket_path = config.socket_path();
    eprintln!(
        "Starting Pass Protector gateway at {}...",
        socket_path.display()
    );

    UdsServer::new(gateway, socket_path)
        .run()
        .await
        .map_err(|e| PassError::Other(format!("Gateway error: {}", e)))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn ensure_initialized(keychain: &dyn MasterKeyProvider) -> Result<(), PassError> {
    if !keychain.has_master_secret()? {
        return Err(PassError::Other(
            "Pass Protector is not initialized. Run `pass-protector init` first.".to_string(),
        ));
    }
    Ok(())
}

/// Open the encrypted database using the platform keyring.
fn open_db() -> Result<Database, PassError> {
    let keychain = KeyringProvider::new();
    ensure_initialized(&keychain)?;

    let hex_key = keychain.database_key_hex()?;
    Ok(Database::open_existing(&config::db_path(), &hex_key)?)
}

/// A session manager that has picked up whatever session is persisted.
fn session_manager() -> Result<SessionManager, PassError> {
    let manager = SessionManager::new(Arc::new(KeyringProvider::new()));
    manager.resync()?;
    Ok(manager)
}

/// Build the view and feed it every session notification produced while
/// the persisted session is restored.
fn load_view(store: &SqliteCredentialStore<'_>) -> Result<VaultView, PassError> {
    let config = Config::load()?;
    let manager = SessionManager::new(Arc::new(KeyringProvider::new()));
    let mut view = VaultView::new(config.tenancy);

    let (tx, rx) = mpsc::channel::<Option<Session>>();
    let subscription = manager.observe(move |session| {
        let _ = tx.send(session.cloned());
    });
    manager.resync()?;
    subscription.unsubscribe();

    for session in rx.try_iter() {
        view.apply_session(session, store);
    }

    if config.tenancy == Tenancy::Shared {
        let result = view.refresh(store);
        finish(&mut view, result)?;
    } else if view.session().is_none() {
        return Err(VaultError::NotSignedIn.into());
    }

    // A failed listing on sign-in has already queued its notice.
    if flush_notices(&mut view) {
        return Err(PassError::Reported);
    }

    Ok(view)
}

/// Print pending notices to stderr. Returns true if any was an error.
fn flush_notices(view: &mut VaultView) -> bool {
    let mut failed = false;
    for notice in view.take_notices() {
        failed |= notice.level == NoticeLevel::Error;
        eprintln!("{}", notice);
    }
    failed
}

/// Show the notices a view action produced. A failed action, or a
/// successful one whose follow-up listing failed, has already been
/// described by its notice, so it maps to `Reported`.
fn finish<T>(view: &mut VaultView, result: Result<T, VaultError>) -> Result<T, PassError> {
    let failed = flush_notices(view);
    let value = result.map_err(|_| PassError::Reported)?;
    if failed {
        return Err(PassError::Reported);
    }
    Ok(value)
}

fn parse_id(raw: &str) -> Result<Uuid, PassError> {
    Uuid::parse_str(raw.trim()).map_err(|e| PassError::Other(format!("Invalid UUID: {}", e)))
}

fn prompt(label: &str) -> Result<String, PassError> {
    let mut stderr = io::stderr();
    stderr.write_all(label.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
