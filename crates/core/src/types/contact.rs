//! Customer contact types: email addresses and Indian mobile numbers.
//!
//! The OTP login flow accepts either form, so [`Contact`] wraps both behind
//! one parser. Parsing normalizes the input (trim, lowercase) so that two
//! renderings of the same contact always compare and hash the same way.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a contact.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input string is empty.
    #[error("contact cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The email is missing an @ symbol or has an empty side.
    #[error("invalid email address")]
    InvalidEmail,
    /// The mobile number is not 10 digits starting with 6-9.
    #[error("mobile number must be 10 digits starting with 6-9")]
    InvalidMobile,
    /// The input is neither a valid email nor a valid mobile number.
    #[error("enter a valid email address or 10-digit mobile number")]
    Unrecognized,
}

/// An email address, stored lowercased.
///
/// Validation is structural only: a non-empty local part and domain separated
/// by a single @ symbol, within the RFC 5321 length limit. Deliverability is
/// the backend's problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string, trimming and lowercasing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 254 characters,
    /// or not of the form `local@domain`.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ContactError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let mut parts = s.split('@');
        let (local, domain) = (parts.next().unwrap_or(""), parts.next().unwrap_or(""));
        if local.is_empty() || domain.is_empty() || parts.next().is_some() || !domain.contains('.')
        {
            return Err(ContactError::InvalidEmail);
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A 10-digit Indian mobile number.
///
/// ## Constraints
///
/// - Exactly 10 ASCII digits
/// - First digit in 6-9 (TRAI mobile numbering plan)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Mobile(String);

impl Mobile {
    /// Parse a `Mobile` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::InvalidMobile` unless the input is exactly
    /// 10 ASCII digits with the first in 6-9.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty);
        }
        if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ContactError::InvalidMobile);
        }
        if !matches!(s.as_bytes().first(), Some(b'6'..=b'9')) {
            return Err(ContactError::InvalidMobile);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the mobile number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Mobile` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Mobile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Mobile {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A customer contact: either an email address or a mobile number.
///
/// ## Examples
///
/// ```
/// use copperkart_core::Contact;
///
/// assert!(matches!(Contact::parse("user@example.com"), Ok(Contact::Email(_))));
/// assert!(matches!(Contact::parse("9876543210"), Ok(Contact::Mobile(_))));
/// assert!(Contact::parse("not-a-contact").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Contact {
    /// An email address.
    Email(Email),
    /// A 10-digit Indian mobile number.
    Mobile(Mobile),
}

impl Contact {
    /// Parse a contact, accepting either a valid email or a valid mobile.
    ///
    /// Mobile parsing is attempted first since any 10-digit string is
    /// unambiguous; everything else falls through to email parsing.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::Empty` for blank input and
    /// `ContactError::Unrecognized` when neither form matches.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ContactError::Empty);
        }
        if let Ok(mobile) = Mobile::parse(trimmed) {
            return Ok(Self::Mobile(mobile));
        }
        if let Ok(email) = Email::parse(trimmed) {
            return Ok(Self::Email(email));
        }
        Err(ContactError::Unrecognized)
    }

    /// The canonical string form used for digests and comparisons.
    #[must_use]
    pub fn normalized(&self) -> &str {
        match self {
            Self::Email(e) => e.as_str(),
            Self::Mobile(m) => m.as_str(),
        }
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}
