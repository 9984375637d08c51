//! Persistent refresh tokens with rotation and blacklisting.
//!
//! Tokens are handed out as `<token_id>.<secret>`; only a salted SHA-512 of
//! the secret is stored. Rotation revokes the presented token, so a revoked
//! token showing up again means it leaked.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rocket_db_pools::sqlx::{self, PgPool, Postgres, Row, Transaction};
use sha2::{Digest, Sha512};
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult};

const SECRET_LEN: usize = 32;
const SALT_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct RefreshTokenIssued {
    pub token_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RefreshTokenRotation {
    pub user_id: i32,
    pub old_token_id: Uuid,
    pub new_token: RefreshTokenIssued,
}

#[derive(Debug, Clone)]
pub struct RefreshTokenStore {
    pool: PgPool,
}

impl RefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn issue_token_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> AuthResult<RefreshTokenIssued> {
        let token_id = Uuid::new_v4();
        let secret = generate_secret();
        let salt = generate_salt();
        let expires_at = now + ttl;
        let stored = encode_hash(&salt, &hash_secret(&secret, &salt));

        sqlx::query(
            "INSERT INTO user_refresh_tokens (token_id, user_id, hashed_token, issued_at, expires_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(token_id)
        .bind(user_id)
        .bind(stored)
        .bind(now)
        .bind(expires_at)
        .execute(&mut **tx)
        .await?;

        Ok(RefreshTokenIssued {
            token_id,
            token: format!("{token_id}.{secret}"),
            expires_at,
        })
    }

    /// Blacklist `plain_token` and issue its replacement.
    ///
    /// Returns [`AuthError::TokenReuseDetected`] when the token was already revoked.
    pub async fn rotate_token_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        plain_token: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> AuthResult<RefreshTokenRotation> {
        let parsed = ParsedRefreshToken::parse(plain_token)?;

        let row = sqlx::query(
            "SELECT user_id, hashed_token, expires_at, revoked_at FROM user_refresh_tokens WHERE token_id = $1 FOR UPDATE",
        )
        .bind(parsed.token_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AuthError::TokenInvalid)?;

        let user_id: i32 = row.try_get("user_id")?;
        let hashed: String = row.try_get("hashed_token")?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
        let revoked_at: Option<DateTime<Utc>> = row.try_get("revoked_at")?;

        if !verify_secret(&parsed.secret, &hashed)? {
            return Err(AuthError::TokenInvalid);
        }

        if revoked_at.is_some() {
            return Err(AuthError::TokenReuseDetected { user_id });
        }

        if expires_at <= now {
            return Err(AuthError::TokenExpired);
        }

        sqlx::query(
            "UPDATE user_refresh_tokens SET revoked_at = $1, last_used_at = $1 WHERE token_id = $2",
        )
        .bind(now)
        .bind(parsed.token_id)
        .execute(&mut **tx)
        .await?;

        let new_token = self.issue_token_tx(tx, user_id, now, ttl).await?;

        Ok(RefreshTokenRotation {
            user_id,
            old_token_id: parsed.token_id,
            new_token,
        })
    }

    /// Revoke one token. Returns its owner when the token was known.
    pub async fn revoke_token_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        plain_token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<i32>> {
        let parsed = ParsedRefreshToken::parse(plain_token)?;

        let user_id: Option<i32> = sqlx::query_scalar(
            "UPDATE user_refresh_tokens SET revoked_at = COALESCE(revoked_at, $1) WHERE token_id = $2 RETURNING user_id",
        )
        .bind(now)
        .bind(parsed.token_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(user_id)
    }

    pub async fn revoke_all_for_user_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let result = sqlx::query(
            "UPDATE user_refresh_tokens SET revoked_at = $1 WHERE user_id = $2 AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete expired tokens and blacklist entries older than 30 days.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let result = sqlx::query(
            "DELETE FROM user_refresh_tokens WHERE expires_at <= $1 OR (revoked_at IS NOT NULL AND revoked_at <= $2)",
        )
        .bind(now)
        .bind(now - Duration::days(30))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug)]
struct ParsedRefreshToken {
    token_id: Uuid,
    secret: String,
}

impl ParsedRefreshToken {
    fn parse(token: &str) -> AuthResult<Self> {
        let (id, secret) = token.split_once('.').ok_or(AuthError::TokenInvalid)?;
        let token_id = id.parse::<Uuid>().map_err(|_| AuthError::TokenInvalid)?;
        if secret.is_empty() {
            return Err(AuthError::TokenInvalid);
        }

        Ok(Self {
            token_id,
            secret: secret.to_string(),
        })
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD_NO_PAD.encode(bytes)
}

fn generate_salt() -> [u8; SALT_LEN] {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn hash_secret(secret: &str, salt: &[u8]) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(salt);
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

fn encode_hash(salt: &[u8], hash: &[u8]) -> String {
    format!("{}${}", STANDARD_NO_PAD.encode(salt), STANDARD_NO_PAD.encode(hash))
}

fn verify_secret(secret: &str, stored: &str) -> AuthResult<bool> {
    let (salt_b64, hash_b64) = stored.split_once('$').ok_or(AuthError::TokenInvalid)?;
    let salt = STANDARD_NO_PAD
        .decode(salt_b64)
        .map_err(|_| AuthError::TokenInvalid)?;
    let expected = STANDARD_NO_PAD
        .decode(hash_b64)
        .map_err(|_| AuthError::TokenInvalid)?;
    Ok(constant_time_eq(&hash_secret(secret, &salt), &expected))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_and_secret() {
        let id = Uuid::new_v4();
        let parsed = ParsedRefreshToken::parse(&format!("{id}.abc.def")).expect("parse");
        assert_eq!(parsed.token_id, id);
        assert_eq!(parsed.secret, "abc.def");
    }

    #[test]
    fn rejects_malformed_tokens() {
        let empty_secret = format!("{}.", Uuid::new_v4());
        for token in ["", "no-dot", "not-a-uuid.secret", empty_secret.as_str()] {
            assert!(
                matches!(ParsedRefreshToken::parse(token), Err(AuthError::TokenInvalid)),
                "{token:?} should be rejected"
            );
        }
    }

    #[test]
    fn stored_hash_verifies_only_its_secret() {
        let salt = generate_salt();
        let secret = generate_secret();
        let stored = encode_hash(&salt, &hash_secret(&secret, &salt));

        assert!(verify_secret(&secret, &stored).expect("verify"));
        assert!(!verify_secret("other-secret", &stored).expect("verify"));
        assert!(verify_secret(&secret, "missing-separator").is_err());
    }
}
