//! `vaultzero init`: create a new, empty vault.

use crate::cli::output;
use crate::cli::{prompt_new_password, session, Cli, PASSWORD_ENV};
use crate::errors::{Result, VaultError};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let session = session(cli)?;

    if session.vault_exists() {
        output::tip("Use `vaultzero add` to add credentials to the existing vault.");
        return Err(VaultError::VaultAlreadyExists(
            session.store().vault_path().to_path_buf(),
        ));
    }

    let password = prompt_new_password(PASSWORD_ENV)?;
    session.create(&password)?;

    output::success(&format!(
        "Vault created at {}",
        session.store().dir().display()
    ));
    output::tip("Run `vaultzero serve` to let the browser extension reach it.");
    Ok(())
}
