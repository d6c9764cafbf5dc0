//! `vaultzero backup` and `vaultzero restore`: encrypted credential backups.
//!
//! A backup is sealed with the current master key, so it can only be
//! restored while the vault is unlocked with the same password.

use std::path::Path;

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;

/// Execute the `backup` command.
pub fn execute_backup(cli: &Cli, path: &Path) -> Result<()> {
    let session = open_session(cli)?;
    let count = session.export_backup(path)?;
    output::success(&format!(
        "Backed up {count} credential(s) to {}",
        path.display()
    ));
    Ok(())
}

/// Execute the `restore` command.
pub fn execute_restore(cli: &Cli, path: &Path) -> Result<()> {
    let session = open_session(cli)?;
    let report = session.import_backup(path)?;
    output::print_import_report(&report);
    Ok(())
}
