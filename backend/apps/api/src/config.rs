//! Server Configuration
//!
//! Reads settings through a lookup function so parsing can be tested
//! without touching the process environment.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::config::{AuthConfig, SameSite};
use platform::token::TokenSecret;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[derive(Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Build from `lookup` (usually `std::env::var(..).ok()`)
    ///
    /// With `allow_dev_secrets`, missing token secrets fall back to random
    /// ones; otherwise both are required.
    pub fn from_lookup<F>(lookup: F, allow_dev_secrets: bool) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let frontend_origins = var("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let mut auth = match (var("ACCESS_TOKEN_SECRET"), var("REFRESH_TOKEN_SECRET")) {
            (Some(access), Some(refresh)) => {
                AuthConfig::new(TokenSecret::new(access), TokenSecret::new(refresh))
            }
            (None, None) if allow_dev_secrets => {
                tracing::warn!("Token secrets not set, using random development secrets");
                AuthConfig::development()
            }
            _ => bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must both be set"),
        };

        if let Some(ttl) = var("ACCESS_TOKEN_EXPIRY") {
            auth.access_token_ttl =
                parse_duration(&ttl).context("ACCESS_TOKEN_EXPIRY is not a valid duration")?;
        }
        if let Some(ttl) = var("REFRESH_TOKEN_EXPIRY") {
            auth.refresh_token_ttl =
                parse_duration(&ttl).context("REFRESH_TOKEN_EXPIRY is not a valid duration")?;
        }
        if let Some(timeout) = var("STORE_TIMEOUT") {
            auth.store_timeout =
                parse_duration(&timeout).context("STORE_TIMEOUT is not a valid duration")?;
        }
        if let Some(secure) = var("COOKIE_SECURE") {
            auth.cookie_secure = parse_bool(&secure).context("COOKIE_SECURE must be a boolean")?;
        }
        if let Some(same_site) = var("COOKIE_SAME_SITE") {
            auth.cookie_same_site = same_site
                .parse::<SameSite>()
                .map_err(anyhow::Error::msg)
                .context("COOKIE_SAME_SITE must be Strict, Lax or None")?;
        }
        auth.password_pepper = var("PASSWORD_PEPPER").map(String::into_bytes);

        auth.validate().context("invalid auth configuration")?;

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
            auth,
        })
    }
}

/// `90`, `90s`, `15m`, `1h`, `10d`
pub fn parse_duration(input: &str) -> anyhow::Result<Duration> {
    let input = input.trim();
    let (digits, unit) = match input.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => input.split_at(split),
        None => (input, "s"),
    };

    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid number in duration {input:?}"))?;

    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        other => bail!("unknown duration unit {other:?}"),
    };

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .context("duration out of range")
}

fn parse_bool(input: &str) -> anyhow::Result<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => bail!("not a boolean: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const ACCESS: &str = "access-secret-access-secret-access-secret";
    const REFRESH: &str = "refresh-secret-refresh-secret-refresh-secret";

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("10d").unwrap(), Duration::from_secs(864_000));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5w").is_err());
        assert!(parse_duration("m").is_err());
    }

    #[test]
    fn test_full_config() {
        let config = ServerConfig::from_lookup(
            lookup(&[
                ("DATABASE_URL", "postgres://localhost/app"),
                ("ACCESS_TOKEN_SECRET", ACCESS),
                ("ACCESS_TOKEN_EXPIRY", "1h"),
                ("REFRESH_TOKEN_SECRET", REFRESH),
                ("REFRESH_TOKEN_EXPIRY", "7d"),
                ("COOKIE_SECURE", "false"),
                ("COOKIE_SAME_SITE", "lax"),
                ("PASSWORD_PEPPER", "pepper"),
                ("FRONTEND_ORIGINS", "https://a.example, https://b.example"),
                ("BIND_ADDR", "127.0.0.1:8080"),
            ]),
            false,
        )
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(
            config.frontend_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.auth.refresh_token_ttl, Duration::from_secs(7 * 86_400));
        assert!(!config.auth.cookie_secure);
        assert_eq!(config.auth.cookie_same_site, SameSite::Lax);
        assert_eq!(config.auth.password_pepper.as_deref(), Some(&b"pepper"[..]));
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(
            lookup(&[
                ("DATABASE_URL", "postgres://localhost/app"),
                ("ACCESS_TOKEN_SECRET", ACCESS),
                ("REFRESH_TOKEN_SECRET", REFRESH),
            ]),
            false,
        )
        .unwrap();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(900));
        assert!(config.auth.cookie_secure);
        assert!(config.auth.password_pepper.is_none());
    }

    #[test]
    fn test_secrets_required_outside_development() {
        let env = [("DATABASE_URL", "postgres://localhost/app")];
        assert!(ServerConfig::from_lookup(lookup(&env), false).is_err());

        let config = ServerConfig::from_lookup(lookup(&env), true).unwrap();
        assert!(config.auth.validate().is_ok());
    }

    #[test]
    fn test_rejects_one_missing_secret() {
        let env = [
            ("DATABASE_URL", "postgres://localhost/app"),
            ("ACCESS_TOKEN_SECRET", ACCESS),
        ];
        assert!(ServerConfig::from_lookup(lookup(&env), true).is_err());
    }

    #[test]
    fn test_rejects_equal_secrets() {
        let env = [
            ("DATABASE_URL", "postgres://localhost/app"),
            ("ACCESS_TOKEN_SECRET", ACCESS),
            ("REFRESH_TOKEN_SECRET", ACCESS),
        ];
        assert!(ServerConfig::from_lookup(lookup(&env), false).is_err());
    }

    #[test]
    fn test_requires_database_url() {
        let env = [
            ("ACCESS_TOKEN_SECRET", ACCESS),
            ("REFRESH_TOKEN_SECRET", REFRESH),
        ];
        assert!(ServerConfig::from_lookup(lookup(&env), false).is_err());
    }
}
