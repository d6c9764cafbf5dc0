//! CSV password exports from Chrome/Edge, Firefox, Safari, and a generic
//! `url,username,password` layout.

use std::io::{Read, Write};

use crate::errors::{Result, VaultError};
use crate::vault::domain::service_name_from_url;
use crate::vault::Credential;

/// Header written by `write_csv` (the Chrome layout).
pub const EXPORT_HEADER: [&str; 4] = ["name", "url", "username", "password"];

/// Which browser produced the file, sniffed from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFormat {
    /// `name,url,username,password`
    Chrome,
    /// `url,username,password,httpRealm,formActionOrigin,...`
    Firefox,
    /// `Title,URL,Username,Password,Notes,OTPAuth`
    Safari,
    /// Anything else: column 0 is the URL, then username, then password.
    Generic,
}

/// One usable row from an export file.
///
/// Credentials have no notes field, so Safari's `Notes` and `OTPAuth`
/// columns are not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedLogin {
    pub service_name: String,
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Guess the export layout from its header row.
///
/// Column names are compared whole and case-insensitively, so the
/// `username` column of a Firefox export does not count as `name`.
pub fn detect_format<S: AsRef<str>>(header: &[S]) -> CsvFormat {
    let columns: Vec<String> = header
        .iter()
        .map(|h| h.as_ref().trim().to_lowercase())
        .collect();
    let has = |name: &str| columns.iter().any(|c| c == name);

    if has("name") && has("url") && has("username") && has("password") {
        CsvFormat::Chrome
    } else if has("httprealm") || has("formactionorigin") {
        CsvFormat::Firefox
    } else if has("title") && has("notes") {
        CsvFormat::Safari
    } else {
        CsvFormat::Generic
    }
}

/// Parse an export file.
///
/// Rows with fewer than three fields, or with an empty username or
/// password, are dropped silently.  An empty file, a malformed file, or
/// a file with no usable rows is a `Parse` error.
pub fn parse_csv<R: Read>(input: R) -> Result<Vec<ImportedLogin>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| VaultError::Parse(format!("failed to parse CSV: {e}")))?;
        rows.push(
            record
                .iter()
                .map(|field| field.trim_start().to_string())
                .collect::<Vec<_>>(),
        );
    }

    let Some((header, body)) = rows.split_first() else {
        return Err(VaultError::Parse("CSV file is empty".into()));
    };
    let format = detect_format(header);

    let logins: Vec<ImportedLogin> = body
        .iter()
        .filter_map(|row| parse_row(row, format))
        .collect();

    if logins.is_empty() {
        return Err(VaultError::Parse("no valid credentials found in CSV".into()));
    }
    Ok(logins)
}

fn parse_row(row: &[String], format: CsvFormat) -> Option<ImportedLogin> {
    if row.len() < 3 {
        return None;
    }
    let field = |i: usize| row.get(i).cloned().unwrap_or_default();

    let mut login = match format {
        CsvFormat::Chrome | CsvFormat::Safari if row.len() < 4 => return None,
        CsvFormat::Chrome | CsvFormat::Safari => ImportedLogin {
            service_name: field(0),
            url: field(1),
            username: field(2),
            password: field(3),
        },
        CsvFormat::Firefox | CsvFormat::Generic => ImportedLogin {
            service_name: service_name_from_url(&row[0]),
            url: field(0),
            username: field(1),
            password: field(2),
        },
    };

    if login.username.is_empty() || login.password.is_empty() {
        return None;
    }
    if login.service_name.is_empty() && !login.url.is_empty() {
        login.service_name = service_name_from_url(&login.url);
    }
    Some(login)
}

/// Write credentials in the Chrome layout, header first.
pub fn write_csv<W: Write>(output: W, credentials: &[Credential]) -> Result<()> {
    let mut writer = ::csv::Writer::from_writer(output);
    let to_err = |e: ::csv::Error| VaultError::Serialization(format!("CSV export: {e}"));

    writer.write_record(EXPORT_HEADER).map_err(to_err)?;
    for cred in credentials {
        writer
            .write_record([
                cred.service_name.as_str(),
                cred.url.as_str(),
                cred.username.as_str(),
                cred.password.as_str(),
            ])
            .map_err(to_err)?;
    }
    writer.flush()?;
    Ok(())
}
