use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_db_pools::sqlx::PgPool;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::RequireAdmin;
use crate::error::ApiError;
use crate::models::{DataResponse, NamedWithCount, PaginatedResponse};
use crate::routes::helpers::{CatalogTable, require_name};
use crate::routes::params::NamedListParams;

/// Body for creating a show or a role.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NamePayload {
    pub name: String,
}

/// List shows with their quote counts.
#[openapi(tag = "Shows")]
#[get("/shows?<params..>")]
pub async fn list_shows(
    params: NamedListParams,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<Json<PaginatedResponse<NamedWithCount>>, ApiError> {
    Ok(Json(CatalogTable::Shows.list(pool.inner(), &params).await?))
}

#[openapi(tag = "Shows")]
#[get("/shows/<id>")]
pub async fn get_show(
    id: i32,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<Json<DataResponse<NamedWithCount>>, ApiError> {
    Ok(Json(DataResponse::new(
        CatalogTable::Shows.get(pool.inner(), id).await?,
    )))
}

#[openapi(tag = "Shows")]
#[post("/shows", data = "<payload>")]
pub async fn create_show(
    payload: Json<NamePayload>,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<status::Created<Json<DataResponse<NamedWithCount>>>, ApiError> {
    let name = require_name(&payload.name, "name")?;
    let show = CatalogTable::Shows.create(pool.inner(), &name).await?;
    Ok(status::Created::new(format!("/api/v1/shows/{}", show.id))
        .body(Json(DataResponse::new(show))))
}

/// Delete a show. Fails with 409 while quotes reference it.
#[openapi(tag = "Shows")]
#[delete("/shows/<id>")]
pub async fn delete_show(
    id: i32,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<status::NoContent, ApiError> {
    CatalogTable::Shows.delete(pool.inner(), id).await?;
    Ok(status::NoContent)
}
