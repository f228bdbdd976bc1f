//! Login Identifier Value Object
//!
//! A username or an email address as typed on the login form.
//!
//! ## Normalization
//! NFKC, then trim, then lowercase. Usernames and emails are stored in the
//! same canonical form, so a lookup is a plain equality match on either.

use std::fmt;

use unicode_normalization::UnicodeNormalization;

use crate::error::{AuthError, AuthResult};

/// Upper bound on identifier length (RFC 5321 email limit)
pub const IDENTIFIER_MAX_LENGTH: usize = 254;

/// Canonical form shared by usernames, emails and login identifiers
pub fn canonicalize(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_lowercase()
}

/// Normalized username-or-email
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(input: &str) -> AuthResult<Self> {
        let canonical = canonicalize(input);

        if canonical.is_empty() {
            return Err(AuthError::Validation(
                "Username or email is required".to_string(),
            ));
        }

        if canonical.chars().count() > IDENTIFIER_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "Username or email must be at most {IDENTIFIER_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(canonical))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier has the shape of an email address
    pub fn is_email(&self) -> bool {
        self.0.contains('@')
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identifier").field(&self.0).finish()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
