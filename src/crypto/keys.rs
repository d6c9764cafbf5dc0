//! The in-memory master key.

use std::fmt;

use zeroize::Zeroize;

use super::kdf::KEY_LEN;

/// A 32-byte master key that zeroes its memory when dropped.
///
/// Never persisted: it lives only as long as an unlocked session and is
/// re-derived from password + salt on the next unlock.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Take ownership of raw key bytes, wiping the caller's buffer.
    pub fn new(bytes: &mut [u8; KEY_LEN]) -> Self {
        let key = Self { bytes: *bytes };
        bytes.zeroize();
        key
    }

    /// Access the raw key bytes (e.g. to pass to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl PartialEq for MasterKey {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for MasterKey {}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(**redacted**)")
    }
}
