//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::{resolve_data_dir, Settings};
use crate::errors::{Result, VaultError};
use crate::vault::{VaultSession, VaultStore, MIN_PASSWORD_LEN};

/// Supplies the master password without a prompt (scripts, tests).
pub const PASSWORD_ENV: &str = "VAULTZERO_PASSWORD";

/// Supplies the new password for `change-password` without a prompt.
pub const NEW_PASSWORD_ENV: &str = "VAULTZERO_NEW_PASSWORD";

/// VaultZero: local password vault with a browser bridge.
#[derive(Parser)]
#[command(
    name = "vaultzero",
    about = "Local encrypted password vault with a browser extension bridge",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault data directory (default: $VAULTZERO_HOME or ~/.vaultzero)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// Unlock the vault and answer browser requests until Ctrl-C
    Serve,

    /// List stored credentials
    List {
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
    },

    /// Show one credential
    Show {
        /// Credential id
        id: String,
        /// Print the password in clear text
        #[arg(long)]
        reveal: bool,
    },

    /// Add a credential
    Add {
        /// Display name (e.g. GitHub)
        #[arg(long)]
        service: String,
        /// Site URL
        #[arg(long, default_value = "")]
        url: String,
        /// Login name
        #[arg(long)]
        username: String,
        /// Category (default: Other)
        #[arg(long, default_value = "")]
        category: String,
        /// Password (omit for interactive prompt)
        #[arg(long, conflicts_with = "generate")]
        password: Option<String>,
        /// Generate a strong password instead of prompting
        #[arg(long)]
        generate: bool,
    },

    /// Replace fields of a credential (omitted fields are kept)
    Update {
        /// Credential id
        id: String,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// New password
        #[arg(long, conflicts_with = "generate")]
        password: Option<String>,
        /// Replace the password with a generated one
        #[arg(long)]
        generate: bool,
    },

    /// Delete a credential
    Delete {
        /// Credential id
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Toggle the favorite flag of a credential
    Favorite {
        /// Credential id
        id: String,
    },

    /// Find credentials for a site, the way the browser extension does
    Search {
        /// Page URL
        url: String,
    },

    /// Import a browser CSV export (Chrome, Edge, Firefox, Safari)
    Import {
        /// Path to the CSV file
        file: PathBuf,
    },

    /// Export credentials to CSV (passwords in clear text)
    Export {
        /// Output CSV path
        file: PathBuf,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Write an encrypted backup of the credentials
    Backup {
        /// Output file
        path: PathBuf,
    },

    /// Restore credentials from an encrypted backup
    Restore {
        /// Backup file, sealed under the current master password
        path: PathBuf,
    },

    /// Change the master password
    ChangePassword,

    /// Manage stored credit cards
    Card {
        #[command(subcommand)]
        action: CardAction,
    },

    /// Generate a random password
    Generate {
        /// Length (8-128)
        #[arg(short, long, default_value = "20")]
        length: usize,
        #[arg(long)]
        no_uppercase: bool,
        #[arg(long)]
        no_lowercase: bool,
        #[arg(long)]
        no_digits: bool,
        #[arg(long)]
        no_symbols: bool,
        /// Leave out look-alike characters (il1Lo0O)
        #[arg(long)]
        exclude_ambiguous: bool,
    },

    /// Permanently delete the vault
    Destroy {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Card subcommands.
#[derive(clap::Subcommand)]
pub enum CardAction {
    /// List cards
    List {
        /// Print full card numbers and CVVs
        #[arg(long)]
        reveal: bool,
    },

    /// Add a card
    Add {
        /// Nickname (e.g. "Personal Visa")
        #[arg(long)]
        name: String,
        #[arg(long)]
        holder: String,
        #[arg(long)]
        number: String,
        /// MM
        #[arg(long)]
        month: String,
        /// YYYY
        #[arg(long)]
        year: String,
        #[arg(long)]
        cvv: String,
        /// visa, mastercard, amex, ...
        #[arg(long, default_value = "")]
        card_type: String,
        #[arg(long, default_value = "")]
        zip: String,
    },

    /// Delete a card
    Delete {
        /// Card id
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// The data directory for this invocation.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    resolve_data_dir(cli.data_dir.as_deref())
}

/// Settings from the data directory.
pub fn settings(cli: &Cli) -> Result<Settings> {
    Settings::load(&data_dir(cli)?)
}

/// A locked session over the data directory.
pub fn session(cli: &Cli) -> Result<VaultSession> {
    Ok(VaultSession::new(VaultStore::new(data_dir(cli)?)))
}

/// Prompt for the password and unlock the vault.
pub fn open_session(cli: &Cli) -> Result<VaultSession> {
    open_session_with_password(cli).map(|(session, _)| session)
}

/// Like `open_session`, also handing back the password that worked.
pub fn open_session_with_password(cli: &Cli) -> Result<(VaultSession, Zeroizing<String>)> {
    let session = session(cli)?;
    if !session.vault_exists() {
        output::tip("Run `vaultzero init` to create a vault.");
        return Err(VaultError::VaultNotFound(
            session.store().vault_path().to_path_buf(),
        ));
    }

    let password = prompt_password()?;
    session.unlock(&password)?;
    Ok((session, password))
}

/// Get the master password, trying in order:
/// 1. `VAULTZERO_PASSWORD` env var
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .allow_empty_password(true)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation.
///
/// `env_var` is checked first for scripted use.  Enforces the minimum
/// password length.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env(env_var) {
        if pw.chars().count() < MIN_PASSWORD_LEN {
            return Err(VaultError::Policy(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Prompt for a credential password (may be empty).
pub fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}

fn password_from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}
