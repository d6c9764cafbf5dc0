//! Random password generation.
//!
//! Characters are drawn uniformly from the selected pool with the
//! thread-local CSPRNG (ChaCha, seeded from the OS).

use rand::Rng;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";
const AMBIGUOUS: &str = "il1Lo0O";

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 128;

/// Length used by `generate_strong` when asked for less than 12.
pub const STRONG_DEFAULT_LENGTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordOptions {
    /// Clamped to `MIN_LENGTH..=MAX_LENGTH`.
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
    pub exclude_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 20,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
            exclude_ambiguous: false,
        }
    }
}

impl PasswordOptions {
    fn pool(&self) -> Vec<char> {
        let classes = [
            (self.uppercase, UPPERCASE),
            (self.lowercase, LOWERCASE),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ];
        classes
            .iter()
            .filter(|(on, _)| *on)
            .flat_map(|(_, chars)| chars.chars())
            .filter(|c| !(self.exclude_ambiguous && AMBIGUOUS.contains(*c)))
            .collect()
    }
}

/// Generate a password from `options`.
pub fn generate(options: &PasswordOptions) -> Result<Zeroizing<String>> {
    let pool = options.pool();
    if pool.is_empty() {
        return Err(VaultError::Policy("no character types selected".into()));
    }

    let length = options.length.clamp(MIN_LENGTH, MAX_LENGTH);
    let mut rng = rand::rng();
    let password: String = (0..length)
        .map(|_| pool[rng.random_range(0..pool.len())])
        .collect();
    Ok(Zeroizing::new(password))
}

/// All character classes, ambiguous characters excluded.
pub fn generate_strong(length: usize) -> Result<Zeroizing<String>> {
    let length = if length < 12 {
        STRONG_DEFAULT_LENGTH
    } else {
        length
    };
    generate(&PasswordOptions {
        length,
        exclude_ambiguous: true,
        ..PasswordOptions::default()
    })
}
