//! `vaultzero generate`: print a random password.  No vault needed.

use crate::errors::Result;
use crate::generator::{generate, PasswordOptions};

/// Execute the `generate` command.
pub fn execute(options: &PasswordOptions) -> Result<()> {
    let password = generate(options)?;
    println!("{}", password.as_str());
    Ok(())
}
