// Pass Protector - Configuration
//
// Where data lives and how records are partitioned. Everything sits in one
// data directory: the encrypted database and a small `config.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Overrides the data directory.
pub const HOME_ENV: &str = "PASS_PROTECTOR_HOME";

const APP_DIR: &str = "pass-protector";
const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "pass-protector.db";
const SOCKET_FILE: &str = "pass-protector.sock";

/// How records are partitioned between sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Tenancy {
    /// One collection for everyone; no sign-in needed.
    Shared,
    /// Each session sees only the records it created.
    #[default]
    PerUser,
}

impl std::fmt::Display for Tenancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tenancy::Shared => write!(f, "shared"),
            Tenancy::PerUser => write!(f, "per-user"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tenancy: Tenancy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
}

impl Config {
    /// Read `config.json` from `dir`. A missing file yields the defaults.
    pub fn load_from(dir: &Path) -> io::Result<Self> {
        let path = dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{}: {}", path.display(), e),
                )
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn save_to(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(CONFIG_FILE), json)
    }

    pub fn load() -> io::Result<Self> {
        Self::load_from(&data_dir())
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&data_dir())
    }

    /// The configured socket, or the runtime-dir default.
    pub fn socket_path(&self) -> PathBuf {
        self.socket_path.clone().unwrap_or_else(default_socket_path)
    }
}

fn resolve_data_dir(home_override: Option<PathBuf>) -> PathBuf {
    home_override.unwrap_or_else(|| {
        dirs_next::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    })
}

/// Directory holding the database and `config.json`.
pub fn data_dir() -> PathBuf {
    resolve_data_dir(
        std::env::var_os(HOME_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from),
    )
}

/// Path to the encrypted database file.
pub fn db_path() -> PathBuf {
    data_dir().join(DB_FILE)
}

/// `$XDG_RUNTIME_DIR/pass-protector/pass-protector.sock`, falling back to
/// `/tmp/pass-protector/pass-protector.sock`.
pub fn default_socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"));
    runtime_dir.join(APP_DIR).join(SOCKET_FILE)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
