use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};
use rocket_db_pools::sqlx::PgPool;
use rocket_okapi::openapi;

use crate::auth::RequireAdmin;
use crate::error::ApiError;
use crate::models::{DataResponse, NamedWithCount, PaginatedResponse};
use crate::routes::helpers::{CatalogTable, require_name};
use crate::routes::params::NamedListParams;
use crate::routes::shows::NamePayload;

/// List roles (characters) with their quote counts.
#[openapi(tag = "Roles")]
#[get("/roles?<params..>")]
pub async fn list_roles(
    params: NamedListParams,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<Json<PaginatedResponse<NamedWithCount>>, ApiError> {
    Ok(Json(CatalogTable::Roles.list(pool.inner(), &params).await?))
}

#[openapi(tag = "Roles")]
#[get("/roles/<id>")]
pub async fn get_role(
    id: i32,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<Json<DataResponse<NamedWithCount>>, ApiError> {
    Ok(Json(DataResponse::new(
        CatalogTable::Roles.get(pool.inner(), id).await?,
    )))
}

#[openapi(tag = "Roles")]
#[post("/roles", data = "<payload>")]
pub async fn create_role(
    payload: Json<NamePayload>,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<status::Created<Json<DataResponse<NamedWithCount>>>, ApiError> {
    let name = require_name(&payload.name, "name")?;
    let role = CatalogTable::Roles.create(pool.inner(), &name).await?;
    Ok(status::Created::new(format!("/api/v1/roles/{}", role.id))
        .body(Json(DataResponse::new(role))))
}

#[openapi(tag = "Roles")]
#[delete("/roles/<id>")]
pub async fn delete_role(
    id: i32,
    pool: &State<PgPool>,
    _admin: RequireAdmin,
) -> Result<status::NoContent, ApiError> {
    CatalogTable::Roles.delete(pool.inner(), id).await?;
    Ok(status::NoContent)
}
