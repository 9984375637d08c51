//! Shared helpers for the route handlers.

use rocket_db_pools::sqlx::{self, PgPool};

use crate::error::ApiError;
use crate::models::{NamedWithCount, PageMetadata, PaginatedResponse};
use crate::routes::params::NamedListParams;

/// Turn a user search term into an `ILIKE` substring pattern.
///
/// `%`, `_` and `\` in the term match literally.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trimmed, non-empty name from a request payload.
pub fn require_name(value: &str, field: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("'{field}' must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// The two name-keyed lookup tables behind the show and role endpoints.
#[derive(Debug, Clone, Copy)]
pub enum CatalogTable {
    Shows,
    Roles,
}

impl CatalogTable {
    pub fn label(self) -> &'static str {
        match self {
            CatalogTable::Shows => "Show",
            CatalogTable::Roles => "Role",
        }
    }

    fn list_sql(self) -> &'static str {
        match self {
            CatalogTable::Shows => {
                r#"SELECT s.id, s.name, s.created_at, COUNT(q.id) AS quote_count
                   FROM shows s
                   LEFT JOIN quotes q ON q.show_id = s.id
                   WHERE ($1::TEXT IS NULL OR s.name ILIKE $1)
                   GROUP BY s.id
                   ORDER BY s.name ASC
                   LIMIT $2 OFFSET $3"#
            }
            CatalogTable::Roles => {
                r#"SELECT r.id, r.name, r.created_at, COUNT(q.id) AS quote_count
                   FROM roles r
                   LEFT JOIN quotes q ON q.role_id = r.id
                   WHERE ($1::TEXT IS NULL OR r.name ILIKE $1)
                   GROUP BY r.id
                   ORDER BY r.name ASC
                   LIMIT $2 OFFSET $3"#
            }
        }
    }

    fn count_sql(self) -> &'static str {
        match self {
            CatalogTable::Shows => "SELECT COUNT(*) FROM shows WHERE ($1::TEXT IS NULL OR name ILIKE $1)",
            CatalogTable::Roles => "SELECT COUNT(*) FROM roles WHERE ($1::TEXT IS NULL OR name ILIKE $1)",
        }
    }

    fn get_sql(self) -> &'static str {
        match self {
            CatalogTable::Shows => {
                r#"SELECT s.id, s.name, s.created_at, COUNT(q.id) AS quote_count
                   FROM shows s
                   LEFT JOIN quotes q ON q.show_id = s.id
                   WHERE s.id = $1
                   GROUP BY s.id"#
            }
            CatalogTable::Roles => {
                r#"SELECT r.id, r.name, r.created_at, COUNT(q.id) AS quote_count
                   FROM roles r
                   LEFT JOIN quotes q ON q.role_id = r.id
                   WHERE r.id = $1
                   GROUP BY r.id"#
            }
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            CatalogTable::Shows => "INSERT INTO shows (name) VALUES ($1) RETURNING id",
            CatalogTable::Roles => "INSERT INTO roles (name) VALUES ($1) RETURNING id",
        }
    }

    fn delete_sql(self) -> &'static str {
        match self {
            CatalogTable::Shows => "DELETE FROM shows WHERE id = $1",
            CatalogTable::Roles => "DELETE FROM roles WHERE id = $1",
        }
    }

    pub async fn list(
        self,
        pool: &PgPool,
        params: &NamedListParams,
    ) -> Result<PaginatedResponse<NamedWithCount>, ApiError> {
        let pattern = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern);

        let total: i64 = sqlx::query_scalar(self.count_sql())
            .bind(pattern.as_deref())
            .fetch_one(pool)
            .await?;

        let rows: Vec<NamedWithCount> = sqlx::query_as(self.list_sql())
            .bind(pattern.as_deref())
            .bind(params.size())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows,
            PageMetadata::new(params.page(), params.size(), total),
        ))
    }

    pub async fn get(self, pool: &PgPool, id: i32) -> Result<NamedWithCount, ApiError> {
        sqlx::query_as::<_, NamedWithCount>(self.get_sql())
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{} {} not found", self.label(), id)))
    }

    /// Insert a new row. An existing name is a conflict, not a lookup.
    pub async fn create(self, pool: &PgPool, name: &str) -> Result<NamedWithCount, ApiError> {
        let id: i32 = sqlx::query_scalar(self.insert_sql())
            .bind(name)
            .fetch_one(pool)
            .await
            .map_err(|err| match ApiError::from(err) {
                ApiError::Conflict(_) => {
                    ApiError::Conflict(format!("{} '{}' already exists", self.label(), name))
                }
                other => other,
            })?;
        self.get(pool, id).await
    }

    /// Delete a row that no quote references.
    pub async fn delete(self, pool: &PgPool, id: i32) -> Result<(), ApiError> {
        let result = sqlx::query(self.delete_sql())
            .bind(id)
            .execute(pool)
            .await
            .map_err(|err| match ApiError::from(err) {
                ApiError::Conflict(_) => ApiError::Conflict(format!(
                    "{} {} is still referenced by quotes",
                    self.label(),
                    id
                )),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("{} {} not found", self.label(), id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("force"), "%force%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(require_name("  Alien ", "name").expect("valid"), "Alien");
        assert!(matches!(
            require_name("   ", "name"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
