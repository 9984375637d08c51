//! Entry point behind the `import_quotes` command.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::Duration;

use rocket_db_pools::sqlx::postgres::PgPoolOptions;

use super::{ImportError, ImportResult, ImportSummary, PgQuoteStore, QuoteImporter};
use crate::db;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Import `path` into the database at `database_url`.
///
/// The input file is checked before any connection is opened, so a missing
/// file leaves the database untouched. Connection and migration failures are
/// returned as [`ImportError`] like every other import failure.
pub async fn import_from_database<W: Write>(
    database_url: &str,
    path: &Path,
    out: &mut W,
) -> ImportResult<ImportSummary> {
    match tokio::fs::metadata(path).await {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ImportError::FileNotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ImportError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(database_url)
        .await?;

    let result = async {
        db::run_migrations(&pool).await?;
        QuoteImporter::new(PgQuoteStore::new(pool.clone()))
            .run(path, out)
            .await
    }
    .await;

    pool.close().await;
    result
}
