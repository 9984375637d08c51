use crate::auth::{AuthError, AuthResult};

const DEV_FALLBACK_SECRET: &str = "insecure-development-secret-change-in-production";
const ONE_DAY_SECS: i64 = 24 * 60 * 60;

/// Authentication configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub jwt_secret: String,
    pub jwt_kid: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let issuer = lookup("QUOTES_JWT_ISSUER").unwrap_or_else(|| "http://localhost".into());
        let audience = lookup("QUOTES_JWT_AUDIENCE").unwrap_or_else(|| "quotes-api".into());
        let access_token_ttl_secs = parse_ttl(&lookup, "QUOTES_ACCESS_TOKEN_TTL_SECS", ONE_DAY_SECS)?;
        let refresh_token_ttl_secs =
            parse_ttl(&lookup, "QUOTES_REFRESH_TOKEN_TTL_SECS", 3 * ONE_DAY_SECS)?;

        let jwt_secret = match lookup("CONFIG_SECRET_KEY")
            .or_else(|| lookup("SECRET_KEY"))
            .filter(|secret| !secret.is_empty())
        {
            Some(secret) => secret,
            None => {
                log::warn!("no CONFIG_SECRET_KEY or SECRET_KEY set; using the development signing secret");
                DEV_FALLBACK_SECRET.to_string()
            }
        };
        let jwt_kid = lookup("QUOTES_JWT_KID");

        Ok(Self {
            issuer,
            audience,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
            jwt_secret,
            jwt_kid,
        })
    }
}

fn parse_ttl<F>(lookup: &F, key: &str, default: i64) -> AuthResult<i64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(AuthError::Config(format!(
                "{key} must be a positive number of seconds, got '{raw}'"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_lifetimes_default_to_one_and_three_days() {
        let config = AuthConfig::from_lookup(|_| None).expect("config");
        assert_eq!(config.access_token_ttl_secs, 86_400);
        assert_eq!(config.refresh_token_ttl_secs, 259_200);
        assert_eq!(config.jwt_secret, DEV_FALLBACK_SECRET);
    }

    #[test]
    fn prefers_config_secret_key() {
        let config = AuthConfig::from_lookup(|key| match key {
            "CONFIG_SECRET_KEY" => Some("primary".into()),
            "SECRET_KEY" => Some("secondary".into()),
            _ => None,
        })
        .expect("config");
        assert_eq!(config.jwt_secret, "primary");

        let config = AuthConfig::from_lookup(|key| (key == "SECRET_KEY").then(|| "secondary".into()))
            .expect("config");
        assert_eq!(config.jwt_secret, "secondary");
    }

    #[test]
    fn rejects_invalid_ttl() {
        let err = AuthConfig::from_lookup(|key| {
            (key == "QUOTES_ACCESS_TOKEN_TTL_SECS").then(|| "soon".into())
        })
        .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }
}
