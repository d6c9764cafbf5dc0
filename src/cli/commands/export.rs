//! `vaultzero export`: write every credential to a CSV file.
//!
//! The file uses the Chrome layout (`name,url,username,password`) so
//! any browser can import it.  Passwords are in clear text.

use std::path::Path;

use crate::cli::output;
use crate::cli::{confirm, open_session, Cli};
use crate::errors::Result;

/// Execute the `export` command.
pub fn execute(cli: &Cli, file: &Path, force: bool) -> Result<()> {
    if !force && !confirm("The CSV file will contain every password in clear text. Continue?")? {
        output::info("Cancelled.");
        return Ok(());
    }

    let session = open_session(cli)?;
    let count = session.export_csv(file)?;
    output::success(&format!(
        "Exported {count} credential(s) to {}",
        file.display()
    ));
    output::warning("Delete the file once you no longer need it.");
    Ok(())
}
