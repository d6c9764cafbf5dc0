//! `vaultzero list`: show stored credentials (no passwords).

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, favorites: bool) -> Result<()> {
    let session = open_session(cli)?;
    let mut credentials = session.credentials()?;
    if favorites {
        credentials.retain(|c| c.is_favorite);
    }
    output::print_credentials_table(&credentials);
    Ok(())
}
