//! One-time code issuance and verification state.
//!
//! A pending verification lives only in process memory: the salted digest
//! of the expected code, who it was issued to, when it dies, and how many
//! wrong guesses it has absorbed. The digest is SHA-256 over the normalized
//! contact concatenated with the code, so a code captured for one contact
//! is useless against another.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use copperkart_core::Contact;

/// Wrong guesses allowed before the verification is torn down.
pub(crate) const MAX_ATTEMPTS: u32 = 4;

/// Codes are exactly this many ASCII digits.
pub(crate) const CODE_LENGTH: usize = 6;

/// How long a code stays valid.
const TTL_MINUTES: i64 = 5;

/// The one live verification a customer may have.
#[derive(Debug, Clone)]
pub(crate) struct PendingVerification {
    pub contact: Contact,
    code_hash: [u8; 32],
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

impl PendingVerification {
    /// Issue a verification for `contact` expecting `code`.
    pub fn issue(contact: Contact, code: &str) -> Self {
        let code_hash = hash_code(&contact, code);
        Self {
            contact,
            code_hash,
            expires_at: Utc::now() + Duration::minutes(TTL_MINUTES),
            attempts: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn matches(&self, code: &str) -> bool {
        hash_code(&self.contact, code) == self.code_hash
    }
}

/// A fresh random 6-digit code, leading zeros included.
pub(crate) fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Shape check only; says nothing about whether the code is right.
pub(crate) fn is_well_formed_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

fn hash_code(contact: &Contact, code: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(contact.normalized().as_bytes());
    hasher.update(code.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..32 {
            let code = generate_code();
            assert!(is_well_formed_code(&code), "bad code: {code}");
        }
    }

    #[test]
    fn test_well_formed_code() {
        assert!(is_well_formed_code("000123"));
        assert!(!is_well_formed_code("12345"));
        assert!(!is_well_formed_code("1234567"));
        assert!(!is_well_formed_code("12345a"));
        assert!(!is_well_formed_code(""));
    }

    #[test]
    fn test_digest_binds_contact_and_code() {
        let contact = Contact::parse("user@example.com").unwrap();
        let other = Contact::parse("9876543210").unwrap();

        let pending = PendingVerification::issue(contact, "123456");
        assert!(pending.matches("123456"));
        assert!(!pending.matches("123457"));

        // Same code issued to a different contact hashes differently.
        let stolen = PendingVerification::issue(other, "123456");
        assert_ne!(stolen.code_hash, pending.code_hash);
    }

    #[test]
    fn test_expiry_window() {
        let contact = Contact::parse("user@example.com").unwrap();
        let pending = PendingVerification::issue(contact, "123456");
        assert!(!pending.is_expired(Utc::now()));
        assert!(pending.is_expired(Utc::now() + Duration::minutes(TTL_MINUTES + 1)));
    }
}
