//! `vaultzero change-password`: re-key the vault under a new master password.
//!
//! Verifies the current password, generates a new salt, derives a new
//! key and rewrites the whole vault under it.

use crate::cli::output;
use crate::cli::{open_session_with_password, prompt_new_password, Cli, NEW_PASSWORD_ENV};
use crate::errors::Result;

/// Execute the `change-password` command.
pub fn execute(cli: &Cli) -> Result<()> {
    // 1. Unlock with the current password.
    output::info("Enter your current master password.");
    let (session, current) = open_session_with_password(cli)?;

    // 2. Choose the new one.
    output::info("Choose your new master password.");
    let new_password = prompt_new_password(NEW_PASSWORD_ENV)?;

    // 3. Re-key and rewrite.
    session.change_password(&current, &new_password)?;
    output::success("Master password changed.");
    Ok(())
}
