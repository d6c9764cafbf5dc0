//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::transfer::ImportReport;
use crate::vault::{Credential, CreditCard};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

fn star(favorite: bool) -> &'static str {
    if favorite {
        "\u{2605}"
    } else {
        ""
    }
}

/// Print a table of credentials.  Passwords are never shown here.
pub fn print_credentials_table(credentials: &[Credential]) {
    if credentials.is_empty() {
        info("No credentials in this vault yet.");
        tip("Run `vaultzero add --service <NAME> --username <USER>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "ID", "Service", "Username", "URL", "Category"]);

    for c in credentials {
        table.add_row(vec![
            star(c.is_favorite).to_string(),
            c.id.clone(),
            c.service_name.clone(),
            c.username.clone(),
            c.url.clone(),
            c.category.clone(),
        ]);
    }

    println!("{table}");
}

/// Print every field of one credential.
pub fn print_credential(c: &Credential, reveal: bool) {
    let password = if reveal {
        c.password.clone()
    } else {
        "\u{2022}".repeat(8)
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["ID", c.id.as_str()]);
    table.add_row(vec!["Service", c.service_name.as_str()]);
    table.add_row(vec!["URL", c.url.as_str()]);
    table.add_row(vec!["Username", c.username.as_str()]);
    table.add_row(vec!["Password", password.as_str()]);
    table.add_row(vec!["Category", c.category.as_str()]);
    table.add_row(vec!["Favorite", if c.is_favorite { "yes" } else { "no" }]);
    table.add_row(vec![
        "Created".to_string(),
        c.created_at.format(TIME_FORMAT).to_string(),
    ]);
    println!("{table}");
}

/// `**** 1234` style masking for card numbers.
pub fn mask_card_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("\u{2022}\u{2022}\u{2022}\u{2022} {tail}")
}

/// Print a table of credit cards.
pub fn print_cards_table(cards: &[CreditCard], reveal: bool) {
    if cards.is_empty() {
        info("No credit cards stored.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Holder", "Number", "Expiry", "CVV", "Type"]);

    for card in cards {
        let (number, cvv) = if reveal {
            (card.card_number.clone(), card.cvv.clone())
        } else {
            (mask_card_number(&card.card_number), "\u{2022}\u{2022}\u{2022}".into())
        };
        table.add_row(vec![
            card.id.clone(),
            card.card_name.clone(),
            card.cardholder_name.clone(),
            number,
            format!("{}/{}", card.expiry_month, card.expiry_year),
            cvv,
            card.card_type.clone(),
        ]);
    }

    println!("{table}");
}

/// Summarize a bulk import.
pub fn print_import_report(report: &ImportReport) {
    success(&format!(
        "Imported {} of {} credential(s), skipped {}",
        report.imported, report.total_processed, report.skipped
    ));
    for message in &report.errors {
        tip(message);
    }
}
