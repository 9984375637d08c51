//! Administrative operations.

use rocket::serde::json::Json;
use rocket::{State, post};
use rocket_db_pools::sqlx::PgPool;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::RequireAdmin;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::importer::{ImportSummary, PgQuoteStore, QuoteImporter};
use crate::models::DataResponse;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub summary: ImportSummary,
    /// Progress lines in the order the importer wrote them.
    pub messages: Vec<String>,
}

/// Run the quote importer against the configured import file.
#[openapi(tag = "Admin")]
#[post("/admin/import")]
pub async fn import_quotes(
    config: &State<AppConfig>,
    pool: &State<PgPool>,
    admin: RequireAdmin,
) -> Result<Json<DataResponse<ImportReport>>, ApiError> {
    let path = config.import_path();
    log::info!("quote import requested by '{}'", admin.0.username);

    let importer = QuoteImporter::new(PgQuoteStore::new(pool.inner().clone()));
    let mut output = Vec::new();
    let summary = importer.run(&path, &mut output).await?;

    let messages = String::from_utf8_lossy(&output)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();

    Ok(Json(DataResponse::new(ImportReport { summary, messages })))
}
