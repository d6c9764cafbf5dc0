//! `vaultzero destroy`: permanently delete the vault files.

use crate::cli::output;
use crate::cli::{confirm, open_session, Cli};
use crate::errors::Result;

/// Execute the `destroy` command.
///
/// Requires the master password, so a stranger at the keyboard cannot
/// wipe the vault.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let session = open_session(cli)?;

    if !force && !confirm("Permanently delete the vault and every credential in it?")? {
        output::info("Cancelled.");
        return Ok(());
    }

    session.delete_vault()?;
    output::success("Vault deleted.");
    Ok(())
}
