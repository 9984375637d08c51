//! Quote resource: list, fetch, create, update and delete.
//!
//! Writes resolve the show and role by name with the same lookup-or-create
//! rules the importer uses, so API-created quotes and imported quotes share
//! the same rows.

use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::RequireAdmin;
use crate::error::ApiError;
use crate::importer::{PgQuoteStore, QuoteStore, UNKNOWN_CHARACTER};
use crate::models::{DataResponse, PageMetadata, PaginatedResponse, QuoteDetail};
use crate::routes::helpers::{like_pattern, require_name};
use crate::routes::params::QuoteListParams;

const QUOTE_DETAIL_SELECT: &str = r#"
    SELECT q.id, q.quote_text AS text, q.show_id, s.name AS show_name,
           q.role_id, r.name AS role_name, q.contains_adult_language, q.created_at
    FROM quotes q
    JOIN shows s ON s.id = q.show_id
    JOIN roles r ON r.id = q.role_id
"#;

const QUOTE_FILTER: &str = r#"
    WHERE ($1::TEXT IS NULL OR s.name = $1)
      AND ($2::TEXT IS NULL OR q.quote_text ILIKE $2)
      AND ($3::BOOLEAN IS NULL OR q.contains_adult_language = $3)
"#;

/// Body for creating or replacing a quote.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotePayload {
    pub text: String,
    /// Show name; created when it does not exist yet.
    pub show: String,
    /// Role name; defaults to "Unknown Character".
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub contains_adult_language: bool,
}

struct ResolvedQuote {
    text: String,
    show_id: i32,
    role_id: i32,
    contains_adult_language: bool,
}

async fn resolve_payload(pool: &PgPool, payload: &QuotePayload) -> Result<ResolvedQuote, ApiError> {
    let text = require_name(&payload.text, "text")?;
    let show_name = require_name(&payload.show, "show")?;
    let role_name = match payload.role.as_deref() {
        Some(role) => require_name(role, "role")?,
        None => UNKNOWN_CHARACTER.to_string(),
    };

    let store = PgQuoteStore::new(pool.clone());
    let show = store.get_or_create_show(&show_name).await?;
    let role = store.get_or_create_role(&role_name).await?;
    if show.created || role.created {
        log::info!("created catalog entries while saving quote (show '{}', role '{}')", show_name, role_name);
    }

    Ok(ResolvedQuote {
        text,
        show_id: show.id,
        role_id: role.id,
        contains_adult_language: payload.contains_adult_language,
    })
}

async fn fetch_quote(pool: &PgPool, id: i32) -> Result<QuoteDetail, ApiError> {
    sqlx::query_as::<_, QuoteDetail>(&format!("{QUOTE_DETAIL_SELECT} WHERE q.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Quote {id} not found")))
}

fn duplicate_text(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::Conflict("A quote with this text already exists".into()),
        other => other,
    }
}

/// List quotes with optional show, text and adult-language filters.
#[openapi(tag = "Quotes")]
#[get("/quotes?<params..>")]
pub async fn list_quotes(
    params: QuoteListParams,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<Json<PaginatedResponse<QuoteDetail>>, ApiError> {
    let show = params.show_filter();
    let pattern = params.search_term().map(like_pattern);

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM quotes q JOIN shows s ON s.id = q.show_id {QUOTE_FILTER}"
    ))
    .bind(show)
    .bind(pattern.as_deref())
    .bind(params.adult)
    .fetch_one(pool.inner())
    .await?;

    let quotes: Vec<QuoteDetail> = sqlx::query_as(&format!(
        "{QUOTE_DETAIL_SELECT} {QUOTE_FILTER} ORDER BY q.id ASC LIMIT $4 OFFSET $5"
    ))
    .bind(show)
    .bind(pattern.as_deref())
    .bind(params.adult)
    .bind(params.size())
    .bind(params.offset())
    .fetch_all(pool.inner())
    .await?;

    Ok(Json(PaginatedResponse::new(
        quotes,
        PageMetadata::new(params.page(), params.size(), total),
    )))
}

/// Fetch a single quote.
#[openapi(tag = "Quotes")]
#[get("/quotes/<id>")]
pub async fn get_quote(
    id: i32,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<Json<DataResponse<QuoteDetail>>, ApiError> {
    Ok(Json(DataResponse::new(fetch_quote(pool.inner(), id).await?)))
}

/// Create a quote. Duplicate text is rejected with 409.
#[openapi(tag = "Quotes")]
#[post("/quotes", data = "<payload>")]
pub async fn create_quote(
    payload: Json<QuotePayload>,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<status::Created<Json<DataResponse<QuoteDetail>>>, ApiError> {
    let resolved = resolve_payload(pool.inner(), &payload).await?;

    let id: i32 = sqlx::query_scalar(
        r#"INSERT INTO quotes (quote_text, show_id, role_id, contains_adult_language)
           VALUES ($1, $2, $3, $4)
           RETURNING id"#,
    )
    .bind(&resolved.text)
    .bind(resolved.show_id)
    .bind(resolved.role_id)
    .bind(resolved.contains_adult_language)
    .fetch_one(pool.inner())
    .await
    .map_err(duplicate_text)?;

    let quote = fetch_quote(pool.inner(), id).await?;
    Ok(status::Created::new(format!("/api/v1/quotes/{id}")).body(Json(DataResponse::new(quote))))
}

/// Replace every field of a quote.
#[openapi(tag = "Quotes")]
#[put("/quotes/<id>", data = "<payload>")]
pub async fn update_quote(
    id: i32,
    payload: Json<QuotePayload>,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<Json<DataResponse<QuoteDetail>>, ApiError> {
    let resolved = resolve_payload(pool.inner(), &payload).await?;

    let updated: Option<i32> = sqlx::query_scalar(
        r#"UPDATE quotes
           SET quote_text = $1, show_id = $2, role_id = $3, contains_adult_language = $4
           WHERE id = $5
           RETURNING id"#,
    )
    .bind(&resolved.text)
    .bind(resolved.show_id)
    .bind(resolved.role_id)
    .bind(resolved.contains_adult_language)
    .bind(id)
    .fetch_optional(pool.inner())
    .await
    .map_err(duplicate_text)?;

    if updated.is_none() {
        return Err(ApiError::NotFound(format!("Quote {id} not found")));
    }

    Ok(Json(DataResponse::new(fetch_quote(pool.inner(), id).await?)))
}

/// Delete a quote. The show and role rows stay.
#[openapi(tag = "Quotes")]
#[delete("/quotes/<id>")]
pub async fn delete_quote(
    id: i32,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<status::NoContent, ApiError> {
    let result = sqlx::query("DELETE FROM quotes WHERE id = $1")
        .bind(id)
        .execute(pool.inner())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Quote {id} not found")));
    }

    Ok(status::NoContent)
}
