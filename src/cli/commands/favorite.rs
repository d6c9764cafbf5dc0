//! `vaultzero favorite`: toggle the favorite flag.

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;

/// Execute the `favorite` command.
pub fn execute(cli: &Cli, id: &str) -> Result<()> {
    let session = open_session(cli)?;
    let favorite = session.toggle_favorite(id)?;
    if favorite {
        output::success("Marked as favorite");
    } else {
        output::success("Removed from favorites");
    }
    Ok(())
}
