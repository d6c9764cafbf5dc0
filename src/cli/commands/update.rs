//! `vaultzero update`: replace fields of an existing credential.

use crate::cli::output;
use crate::cli::{open_session, Cli};
use crate::errors::Result;
use crate::generator::generate_strong;
use crate::vault::CredentialInput;

/// Arguments of the `update` command; `None` keeps the stored value.
pub struct UpdateArgs<'a> {
    pub service: Option<&'a str>,
    pub url: Option<&'a str>,
    pub username: Option<&'a str>,
    pub category: Option<&'a str>,
    pub password: Option<&'a str>,
    pub generate: bool,
}

/// Execute the `update` command.
pub fn execute(cli: &Cli, id: &str, args: UpdateArgs<'_>) -> Result<()> {
    let session = open_session(cli)?;
    let current = session.credential(id)?;

    let password = match (args.password, args.generate) {
        (Some(pw), _) => pw.to_string(),
        (None, true) => generate_strong(0)?.to_string(),
        (None, false) => current.password.clone(),
    };
    let pick = |new: Option<&str>, old: &str| new.unwrap_or(old).to_string();

    let updated = session.update_credential(
        id,
        CredentialInput {
            service_name: pick(args.service, &current.service_name),
            url: pick(args.url, &current.url),
            username: pick(args.username, &current.username),
            password,
            category: pick(args.category, &current.category),
        },
    )?;

    output::success(&format!("Updated '{}'", updated.service_name));
    Ok(())
}
