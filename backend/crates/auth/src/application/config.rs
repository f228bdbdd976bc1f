//! Application Configuration
//!
//! Configuration for the Auth application layer. Passed in explicitly at
//! construction; nothing here reads the environment.

use std::fmt;
use std::time::Duration;

use platform::cookie::CookiePolicy;
use platform::password::HashingParams;
use platform::token::TokenSecret;
use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Minimum HS256 secret length in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default access token TTL (15 minutes)
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh token TTL (10 days)
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(10 * 24 * 3600);

/// Default bound on a single credential store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} secret must not be empty")]
    EmptySecret(&'static str),

    #[error("{name} secret must be at least {min} bytes (got {actual})")]
    SecretTooShort {
        name: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("access and refresh token secrets must differ")]
    SharedSecret,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// Token lifetimes are carried in whole seconds
    #[error("{0} must be at least one second")]
    TtlTooShort(&'static str),
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 key for access tokens
    pub access_token_secret: TokenSecret,
    pub access_token_ttl: Duration,
    /// HS256 key for refresh tokens (must differ from the access key)
    pub refresh_token_secret: TokenSecret,
    pub refresh_token_ttl: Duration,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Argon2id cost
    pub hashing: HashingParams,
    /// Upper bound on each credential store call
    pub store_timeout: Duration,
}

impl AuthConfig {
    /// Config with the given secrets and default lifetimes
    pub fn new(access_token_secret: TokenSecret, refresh_token_secret: TokenSecret) -> Self {
        Self {
            access_token_secret,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_secret,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            access_cookie_name: "accessToken".to_string(),
            refresh_cookie_name: "refreshToken".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            password_pepper: None,
            hashing: HashingParams::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Create config with random secrets (for development)
    pub fn with_random_secrets() -> Self {
        Self::new(TokenSecret::generate(), TokenSecret::generate())
    }

    /// Create config for development (random secrets, insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secrets()
        }
    }

    /// Reject configurations that would weaken token separation
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_secret("access token", &self.access_token_secret)?;
        check_secret("refresh token", &self.refresh_token_secret)?;

        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }

        if self.access_token_ttl.as_secs() == 0 {
            return Err(ConfigError::TtlTooShort("access token TTL"));
        }
        if self.refresh_token_ttl.as_secs() == 0 {
            return Err(ConfigError::TtlTooShort("refresh token TTL"));
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("store timeout"));
        }

        Ok(())
    }

    /// Attributes for the session cookies
    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            ..CookiePolicy::default()
        }
    }
}

fn check_secret(name: &'static str, secret: &TokenSecret) -> Result<(), ConfigError> {
    if secret.is_empty() {
        return Err(ConfigError::EmptySecret(name));
    }
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::SecretTooShort {
            name,
            min: MIN_SECRET_LENGTH,
            actual: secret.len(),
        });
    }
    Ok(())
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("access_cookie_name", &self.access_cookie_name)
            .field("refresh_cookie_name", &self.refresh_cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .field("pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("hashing", &self.hashing)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}
