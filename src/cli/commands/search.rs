//! `vaultzero search`: site matching as the browser extension sees it.

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;

/// Execute the `search` command.
pub fn execute(cli: &Cli, url: &str) -> Result<()> {
    let session = open_session(cli)?;
    let matches = session.search(url)?;
    if matches.is_empty() {
        output::info(&format!("No credentials match {url}"));
        return Ok(());
    }
    output::print_credentials_table(&matches);
    Ok(())
}
