use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::openapi;

use crate::auth::RequireAdmin;
use crate::error::ApiError;
use crate::models::{DataResponse, Stats};

/// Row counts across the quote catalog.
#[openapi(tag = "Stats")]
#[get("/stats")]
pub async fn get_stats(
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<Json<DataResponse<Stats>>, ApiError> {
    let stats = sqlx::query_as::<_, Stats>(
        r#"
        SELECT
            CAST((SELECT COUNT(*) FROM quotes) AS BIGINT) AS total_quotes,
            CAST((SELECT COUNT(*) FROM shows) AS BIGINT) AS total_shows,
            CAST((SELECT COUNT(*) FROM roles) AS BIGINT) AS total_roles,
            CAST((SELECT COUNT(*) FROM quotes WHERE contains_adult_language) AS BIGINT) AS adult_language_quotes
        "#,
    )
    .fetch_one(pool.inner())
    .await?;

    Ok(Json(DataResponse::new(stats)))
}
