//! `vaultzero import`: import a browser password export (CSV).

use std::fs::File;
use std::path::Path;

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `import` command.
pub fn execute(cli: &Cli, file: &Path) -> Result<()> {
    if !file.exists() {
        return Err(VaultError::CommandFailed(format!(
            "file not found: {}",
            file.display()
        )));
    }

    let session = open_session(cli)?;
    let report = session.import_csv(File::open(file)?)?;
    output::print_import_report(&report);
    Ok(())
}
