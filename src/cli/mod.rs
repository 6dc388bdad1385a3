// Pass Protector - CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: init, login, logout, whoami, list, add, edit, delete, copy,
// config, serve.

mod commands;

use clap::{Parser, Subcommand};

use crate::config::Tenancy;
use crate::vault::CopyField;

pub use commands::execute;

/// Pass Protector - site/username/password records in an encrypted local store.
#[derive(Parser, Debug)]
#[command(name = "pass-protector")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize: create the master key, the encrypted database and the config file.
    Init,

    /// Sign in. Without flags, prompts for an email address.
    Login {
        /// Sign in with this email address.
        #[arg(long, conflicts_with = "anonymous")]
        email: Option<String>,

        /// Sign in as a fresh anonymous identity.
        #[arg(long)]
        anonymous: bool,
    },

    /// Sign out of the current session.
    Logout,

    /// Show the current session.
    Whoami,

    /// List the password entries visible to the current session.
    List {
        /// Show passwords in plain text instead of masked.
        #[arg(long)]
        reveal: bool,
    },

    /// Add a new password entry.
    Add {
        /// The site or service (e.g. "example.com").
        #[arg(long)]
        site: String,

        /// The account name on that site.
        #[arg(long)]
        username: String,

        /// The password. Prefer a shell that keeps this out of history.
        #[arg(long)]
        password: String,
    },

    /// Edit an existing entry. Only the given fields change.
    Edit {
        /// The UUID of the entry to edit.
        id: String,

        #[arg(long)]
        site: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,
    },

    /// Delete an entry by ID.
    Delete {
        /// The UUID of the entry to delete.
        id: String,
    },

    /// Write one field of an entry to stdout, e.g. `| wl-copy`.
    Copy {
        /// The UUID of the entry.
        id: String,

        #[arg(long, value_enum, default_value = "password")]
        field: CopyField,
    },

    /// Show or change the configuration.
    Config {
        /// Whether records are shared or partitioned per signed-in user.
        #[arg(long, value_enum)]
        tenancy: Option<Tenancy>,
    },

    /// Start the JSON-RPC gateway on a Unix domain socket.
    Serve,
}
