//! `vaultzero add`: store a new credential.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_session, prompt_secret, Cli};
use crate::errors::Result;
use crate::generator::generate_strong;
use crate::vault::CredentialInput;

/// Arguments of the `add` command.
pub struct AddArgs<'a> {
    pub service: &'a str,
    pub url: &'a str,
    pub username: &'a str,
    pub category: &'a str,
    pub password: Option<&'a str>,
    pub generate: bool,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: AddArgs<'_>) -> Result<()> {
    let session = open_session(cli)?;

    let password = match (args.password, args.generate) {
        (Some(pw), _) => Zeroizing::new(pw.to_string()),
        (None, true) => generate_strong(0)?,
        (None, false) => prompt_secret(&format!("Password for {}", args.username))?,
    };

    let credential = session.add_credential(CredentialInput {
        service_name: args.service.to_string(),
        url: args.url.to_string(),
        username: args.username.to_string(),
        password: password.to_string(),
        category: args.category.to_string(),
    })?;

    output::success(&format!(
        "Added '{}' ({}) with id {}",
        credential.service_name, credential.username, credential.id
    ));
    if args.generate {
        output::tip("Run `vaultzero show <ID> --reveal` to see the generated password.");
    }
    Ok(())
}
