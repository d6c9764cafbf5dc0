//! `vaultzero delete`: remove a credential from the vault.

use crate::cli::output;
use crate::cli::{confirm, open_session, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: &str, force: bool) -> Result<()> {
    let session = open_session(cli)?;
    let credential = session.credential(id)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force
        && !confirm(&format!(
            "Delete '{}' ({})?",
            credential.service_name, credential.username
        ))?
    {
        output::info("Cancelled.");
        return Ok(());
    }

    session.delete_credential(id)?;
    output::success(&format!("Deleted '{}'", credential.service_name));
    Ok(())
}
