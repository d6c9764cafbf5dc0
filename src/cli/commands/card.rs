//! `vaultzero card`: list, add and delete stored credit cards.

use crate::cli::output;
use crate::cli::{confirm, open_session, Cli};
use crate::errors::Result;
use crate::vault::CreditCardInput;

/// Execute `card list`.
pub fn execute_list(cli: &Cli, reveal: bool) -> Result<()> {
    let session = open_session(cli)?;
    output::print_cards_table(&session.credit_cards()?, reveal);
    Ok(())
}

/// Execute `card add`.
pub fn execute_add(cli: &Cli, input: CreditCardInput) -> Result<()> {
    let session = open_session(cli)?;
    let card = session.add_credit_card(input)?;
    output::success(&format!("Added card '{}' with id {}", card.card_name, card.id));
    Ok(())
}

/// Execute `card delete`.
pub fn execute_delete(cli: &Cli, id: &str, force: bool) -> Result<()> {
    let session = open_session(cli)?;

    if !force && !confirm(&format!("Delete card '{id}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    session.delete_credit_card(id)?;
    output::success("Card deleted");
    Ok(())
}
