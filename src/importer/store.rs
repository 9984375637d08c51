//! Lookup-or-create persistence for the import pipeline.

use rocket_db_pools::sqlx::{self, PgPool};

/// Result of a lookup-or-create: the row id and whether this call inserted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub id: i32,
    pub created: bool,
}

impl Lookup {
    pub fn existing(id: i32) -> Self {
        Self { id, created: false }
    }

    pub fn created(id: i32) -> Self {
        Self { id, created: true }
    }
}

/// Storage operations the importer needs.
///
/// Each call is an independent statement; nothing spans records.
#[allow(async_fn_in_trait)]
pub trait QuoteStore {
    async fn get_or_create_show(&self, name: &str) -> Result<Lookup, sqlx::Error>;

    async fn get_or_create_role(&self, name: &str) -> Result<Lookup, sqlx::Error>;

    /// Keyed on the exact quote text. The other arguments only apply on insert.
    async fn get_or_create_quote(
        &self,
        text: &str,
        show_id: i32,
        role_id: i32,
        contains_adult_language: bool,
    ) -> Result<Lookup, sqlx::Error>;

    async fn count_quotes(&self) -> Result<i64, sqlx::Error>;
}

#[derive(Debug, Clone, Copy)]
enum NamedTable {
    Shows,
    Roles,
}

impl NamedTable {
    fn select_sql(self) -> &'static str {
        match self {
            NamedTable::Shows => "SELECT id FROM shows WHERE name = $1",
            NamedTable::Roles => "SELECT id FROM roles WHERE name = $1",
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            NamedTable::Shows => {
                "INSERT INTO shows (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id"
            }
            NamedTable::Roles => {
                "INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id"
            }
        }
    }
}

/// Postgres-backed [`QuoteStore`].
#[derive(Debug, Clone)]
pub struct PgQuoteStore {
    pool: PgPool,
}

impl PgQuoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lookup_or_create_named(
        &self,
        table: NamedTable,
        name: &str,
    ) -> Result<Lookup, sqlx::Error> {
        if let Some(id) = sqlx::query_scalar::<_, i32>(table.select_sql())
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(Lookup::existing(id));
        }

        let inserted = sqlx::query_scalar::<_, i32>(table.insert_sql())
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match inserted {
            Some(id) => Ok(Lookup::created(id)),
            // Another writer inserted the same name between our select and insert.
            None => {
                let id = sqlx::query_scalar::<_, i32>(table.select_sql())
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(Lookup::existing(id))
            }
        }
    }
}

impl QuoteStore for PgQuoteStore {
    async fn get_or_create_show(&self, name: &str) -> Result<Lookup, sqlx::Error> {
        self.lookup_or_create_named(NamedTable::Shows, name).await
    }

    async fn get_or_create_role(&self, name: &str) -> Result<Lookup, sqlx::Error> {
        self.lookup_or_create_named(NamedTable::Roles, name).await
    }

    async fn get_or_create_quote(
        &self,
        text: &str,
        show_id: i32,
        role_id: i32,
        contains_adult_language: bool,
    ) -> Result<Lookup, sqlx::Error> {
        const SELECT: &str =
            "SELECT id FROM quotes WHERE md5(quote_text) = md5($1) AND quote_text = $1";

        if let Some(id) = sqlx::query_scalar::<_, i32>(SELECT)
            .bind(text)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(Lookup::existing(id));
        }

        let inserted = sqlx::query_scalar::<_, i32>(
            r#"INSERT INTO quotes (quote_text, show_id, role_id, contains_adult_language)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT ((md5(quote_text))) DO NOTHING
               RETURNING id"#,
        )
        .bind(text)
        .bind(show_id)
        .bind(role_id)
        .bind(contains_adult_language)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => Ok(Lookup::created(id)),
            None => {
                let id = sqlx::query_scalar::<_, i32>(SELECT)
                    .bind(text)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(Lookup::existing(id))
            }
        }
    }

    async fn count_quotes(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM quotes")
            .fetch_one(&self.pool)
            .await
    }
}
