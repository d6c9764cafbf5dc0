//! `vaultzero show`: print one credential.

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: &str, reveal: bool) -> Result<()> {
    let session = open_session(cli)?;
    let credential = session.credential(id)?;
    output::print_credential(&credential, reveal);
    Ok(())
}
