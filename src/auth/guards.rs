use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket_db_pools::sqlx::{self, Row};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use crate::auth::responses::{UserRole, UserSummary};
use crate::auth::{AuthError, AuthResult, AuthState};

const BEARER_SCHEME_NAME: &str = "BearerAuth";

/// Caller identified by a valid bearer access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub token_version: i32,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_user(request).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

/// Caller with the `admin` role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequireAdmin {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthUser::from_request(request).await {
            Outcome::Success(user) if user.is_admin() => Outcome::Success(RequireAdmin(user)),
            Outcome::Success(_) => Outcome::Error((Status::Forbidden, AuthError::Forbidden)),
            Outcome::Error(err) => Outcome::Error(err),
            Outcome::Forward(_) => {
                Outcome::Error((Status::Unauthorized, AuthError::Unauthorized))
            }
        }
    }
}

fn bearer_security_input() -> rocket_okapi::Result<RequestHeaderInput> {
    let scheme = SecurityScheme {
        description: Some("Access token from `POST /auth/token`, sent as `Authorization: Bearer <token>`.".to_owned()),
        data: SecuritySchemeData::Http {
            scheme: "bearer".to_owned(),
            bearer_format: Some("JWT".to_owned()),
        },
        extensions: Object::default(),
    };
    let mut requirement = SecurityRequirement::new();
    requirement.insert(BEARER_SCHEME_NAME.to_owned(), Vec::new());
    Ok(RequestHeaderInput::Security(
        BEARER_SCHEME_NAME.to_owned(),
        scheme,
        requirement,
    ))
}

impl<'r> OpenApiFromRequest<'r> for AuthUser {
    fn from_request_input(
        _generator: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        bearer_security_input()
    }
}

impl<'r> OpenApiFromRequest<'r> for RequireAdmin {
    fn from_request_input(
        _generator: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        bearer_security_input()
    }
}

async fn extract_user(request: &Request<'_>) -> AuthResult<AuthUser> {
    let token = bearer_token_from_request(request)?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let pool = request
        .guard::<&State<sqlx::PgPool>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("database pool missing from state".into()))?;

    let claims = auth_state.jwt_service.decode_access_token(token)?;
    let user_id = claims.user_id()?;

    let row = sqlx::query(
        "SELECT username, email, role, token_version, disabled FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool.inner())
    .await?
    .ok_or(AuthError::Unauthorized)?;

    let username: String = row.try_get("username")?;
    let email: Option<String> = row.try_get("email")?;
    let role_str: String = row.try_get("role")?;
    let token_version: i32 = row.try_get("token_version")?;
    let disabled: bool = row.try_get("disabled")?;

    if disabled {
        return Err(AuthError::AccountDisabled);
    }

    // Logout-everywhere and token reuse bump the version; role changes invalidate too.
    if token_version != claims.token_version || role_str != claims.role {
        return Err(AuthError::TokenInvalid);
    }

    Ok(AuthUser {
        id: user_id,
        username,
        email,
        role: UserRole::parse(&role_str),
        token_version,
    })
}

fn bearer_token_from_request<'a>(request: &'a Request<'_>) -> AuthResult<&'a str> {
    let header = request
        .headers()
        .get_one("Authorization")
        .ok_or(AuthError::Unauthorized)?;
    parse_bearer(header)
}

fn parse_bearer(header: &str) -> AuthResult<&str> {
    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("Bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::Unauthorized),
    }
}
