//! Token endpoints: obtain, refresh (with rotation), verify, logout, and the
//! current-user lookup.

use chrono::{DateTime, Duration, Utc};
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_db_pools::sqlx::{self, Postgres, Row, Transaction};
use rocket_okapi::openapi;

use crate::auth::guards::AuthUser;
use crate::auth::responses::{
    LogoutRequest, TokenObtainRequest, TokenPairResponse, TokenRefreshRequest,
    TokenVerifyRequest, TokenVerifyResponse, UserRole, UserSummary,
};
use crate::auth::{AuthError, AuthResult, AuthState};

/// Exchange username and password for an access/refresh token pair.
#[openapi(tag = "Auth")]
#[post("/auth/token", data = "<payload>")]
pub async fn obtain_token(
    state: &State<AuthState>,
    pool: &State<sqlx::PgPool>,
    payload: Json<TokenObtainRequest>,
) -> AuthResult<Json<TokenPairResponse>> {
    let username = payload.username.trim();
    let password = payload.password.as_str();

    if username.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "username and password are required".into(),
        ));
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        SELECT id, username, email, role, password_hash, token_version, disabled
        FROM users
        WHERE lower(username) = lower($1)
        FOR UPDATE
        "#,
    )
    .bind(username)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AuthError::InvalidCredentials)?;

    let user_id: i32 = row.try_get("id")?;
    let db_username: String = row.try_get("username")?;
    let email: Option<String> = row.try_get("email")?;
    let role_str: String = row.try_get("role")?;
    let password_hash: String = row.try_get("password_hash")?;
    let token_version: i32 = row.try_get("token_version")?;
    let disabled: bool = row.try_get("disabled")?;

    if !state.password_service.verify_password(password, &password_hash)? {
        log::info!("rejected login for '{}'", db_username);
        return Err(AuthError::InvalidCredentials);
    }

    if disabled {
        return Err(AuthError::AccountDisabled);
    }

    sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let role = UserRole::parse(&role_str);
    let access = state
        .jwt_service
        .issue_access_token(user_id, &db_username, role.as_str(), token_version)?;
    let refresh = state
        .refresh_store
        .issue_token_tx(&mut tx, user_id, now, refresh_ttl(state))
        .await?;

    tx.commit().await?;

    Ok(Json(TokenPairResponse {
        access: access.token,
        refresh: refresh.token,
        access_expires_at: access.expires_at,
        refresh_expires_at: refresh.expires_at,
        user: Some(UserSummary {
            id: user_id,
            username: db_username,
            email,
            role,
        }),
    }))
}

/// Rotate a refresh token: the presented token is blacklisted and a new pair issued.
#[openapi(tag = "Auth")]
#[post("/auth/token/refresh", data = "<payload>")]
pub async fn refresh_token(
    state: &State<AuthState>,
    pool: &State<sqlx::PgPool>,
    payload: Json<TokenRefreshRequest>,
) -> AuthResult<Json<TokenPairResponse>> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let rotation = match state
        .refresh_store
        .rotate_token_tx(&mut tx, payload.refresh.trim(), now, refresh_ttl(state))
        .await
    {
        Ok(rotation) => rotation,
        Err(AuthError::TokenReuseDetected { user_id }) => {
            tx.rollback().await?;
            log::warn!("refresh token reuse detected for user {}", user_id);
            revoke_all_sessions(state, pool, user_id, now).await?;
            return Err(AuthError::Unauthorized);
        }
        Err(err) => return Err(err),
    };

    let row = sqlx::query("SELECT username, role, token_version, disabled FROM users WHERE id = $1")
        .bind(rotation.user_id)
        .fetch_one(&mut *tx)
        .await?;

    let username: String = row.try_get("username")?;
    let role_str: String = row.try_get("role")?;
    let token_version: i32 = row.try_get("token_version")?;
    let disabled: bool = row.try_get("disabled")?;

    if disabled {
        return Err(AuthError::AccountDisabled);
    }

    let access = state.jwt_service.issue_access_token(
        rotation.user_id,
        &username,
        UserRole::parse(&role_str).as_str(),
        token_version,
    )?;

    tx.commit().await?;

    log::debug!(
        "rotated refresh token {} for user {}",
        rotation.old_token_id,
        rotation.user_id
    );

    Ok(Json(TokenPairResponse {
        access: access.token,
        refresh: rotation.new_token.token,
        access_expires_at: access.expires_at,
        refresh_expires_at: rotation.new_token.expires_at,
        user: None,
    }))
}

/// Check an access token's signature and expiry.
#[openapi(tag = "Auth")]
#[post("/auth/token/verify", data = "<payload>")]
pub async fn verify_token(
    state: &State<AuthState>,
    payload: Json<TokenVerifyRequest>,
) -> AuthResult<Json<TokenVerifyResponse>> {
    let claims = state.jwt_service.decode_access_token(payload.token.trim())?;
    Ok(Json(TokenVerifyResponse {
        valid: true,
        expires_at: claims.expires_at(),
    }))
}

/// Blacklist a refresh token; with `allDevices` every session of its owner ends.
#[openapi(tag = "Auth")]
#[post("/auth/logout", data = "<payload>")]
pub async fn logout(
    state: &State<AuthState>,
    pool: &State<sqlx::PgPool>,
    payload: Json<LogoutRequest>,
) -> AuthResult<status::NoContent> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let owner = state
        .refresh_store
        .revoke_token_tx(&mut tx, payload.refresh.trim(), now)
        .await?;

    if let (Some(user_id), Some(true)) = (owner, payload.all_devices) {
        state
            .refresh_store
            .revoke_all_for_user_tx(&mut tx, user_id, now)
            .await?;
        increment_token_version(&mut tx, user_id).await?;
    }

    tx.commit().await?;

    Ok(status::NoContent)
}

/// Account behind the presented access token.
#[openapi(tag = "Auth")]
#[get("/auth/me")]
pub async fn current_user(user: AuthUser) -> Json<UserSummary> {
    Json(user.summary())
}

fn refresh_ttl(state: &State<AuthState>) -> Duration {
    Duration::seconds(state.config.refresh_token_ttl_secs)
}

async fn increment_token_version(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
) -> AuthResult<()> {
    sqlx::query("UPDATE users SET token_version = token_version + 1 WHERE id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn revoke_all_sessions(
    state: &State<AuthState>,
    pool: &State<sqlx::PgPool>,
    user_id: i32,
    now: DateTime<Utc>,
) -> AuthResult<()> {
    let mut tx = pool.begin().await?;
    let revoked = state
        .refresh_store
        .revoke_all_for_user_tx(&mut tx, user_id, now)
        .await?;
    increment_token_version(&mut tx, user_id).await?;
    tx.commit().await?;

    log::info!("revoked {} refresh tokens for user {}", revoked, user_id);
    Ok(())
}
