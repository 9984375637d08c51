#[macro_use]
extern crate rocket;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod importer;
pub mod models;
pub mod request_logger;
pub mod routes;

use crate::auth::{AuthConfig, AuthState};
use crate::config::AppConfig;
use crate::db::QuotesDb;
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::fs::FileServer;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

/// Install the global logger once; later calls are no-ops.
pub fn init_logger(default_filter: &str) {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
    });
}

pub fn rocket() -> Rocket<Build> {
    let config = AppConfig::from_env();
    init_logger(config.log_filter());
    log::info!("starting quotes API server");
    build_rocket(config)
}

fn cors_options(config: &AppConfig) -> CorsOptions {
    let allowed_origins = if config.cors_allowed_origins.is_empty() {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&config.cors_allowed_origins)
    };

    CorsOptions::default()
        .allowed_origins(allowed_origins)
        .allowed_methods(
            vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Patch,
            ]
            .into_iter()
            .map(From::from)
            .collect(),
        )
        .allow_credentials(true)
}

fn mount_static_dirs(mut rocket: Rocket<Build>, config: &AppConfig) -> Rocket<Build> {
    for (base, dir) in [("/static", config.static_dir()), ("/media", config.media_dir())] {
        if dir.is_dir() {
            log::info!("serving {} from {}", base, dir.display());
            rocket = rocket.mount(base, FileServer::from(dir));
        } else {
            log::debug!("{} not mounted: {} is not a directory", base, dir.display());
        }
    }
    rocket
}

/// Assemble the server from an explicit configuration.
pub fn build_rocket(config: AppConfig) -> Rocket<Build> {
    let mut figment = rocket::Config::figment();
    if let Some(url) = &config.database_url {
        figment = figment.merge(("databases.quotes_db.url", url.clone()));
    }

    let mut rocket = rocket::custom(figment).attach(RequestLogger);

    rocket = match cors_options(&config).to_cors() {
        Ok(cors) => rocket.attach(cors),
        Err(err) => {
            let message = err.to_string();
            rocket.attach(AdHoc::try_on_ignite("CORS", |rocket| async move {
                log::error!("invalid CORS configuration: {}", message);
                Err(rocket)
            }))
        }
    };

    let rocket = mount_static_dirs(rocket, &config);

    rocket
        .attach(QuotesDb::init())
        .manage(config)
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match QuotesDb::fetch(&rocket) {
                    Some(pool) => match db::run_migrations(pool).await {
                        Ok(()) => {
                            log::info!("database migrations successful");
                            Ok(rocket)
                        }
                        Err(e) => {
                            log::error!("database migrations failed: {}", e);
                            Err(rocket)
                        }
                    },
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        // Share the pool with guards and handlers, and wire the auth services
        .attach(AdHoc::try_on_ignite(
            "Manage DB Pool and Auth",
            |rocket| async move {
                let pool = match QuotesDb::fetch(&rocket) {
                    Some(db) => (**db).clone(),
                    None => return Err(rocket),
                };

                let auth_state = match AuthConfig::from_env()
                    .and_then(|config| AuthState::from_config(config, pool.clone()))
                {
                    Ok(state) => state,
                    Err(err) => {
                        log::error!("failed to initialize authentication: {}", err);
                        return Err(rocket);
                    }
                };

                Ok(rocket.manage(pool).manage(auth_state))
            },
        ))
        // Drop refresh tokens that can no longer be used
        .attach(AdHoc::on_liftoff("Purge Expired Refresh Tokens", |rocket| {
            Box::pin(async move {
                if let Some(auth) = rocket.state::<AuthState>() {
                    match auth.refresh_store.purge_expired(chrono::Utc::now()).await {
                        Ok(purged) => log::info!("purged {} stale refresh tokens", purged),
                        Err(err) => log::warn!("refresh token purge failed: {}", err),
                    }
                }
            })
        }))
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Health routes
                routes::health::health_check,
                // Auth routes
                auth::routes::obtain_token,
                auth::routes::refresh_token,
                auth::routes::verify_token,
                auth::routes::logout,
                auth::routes::current_user,
                // Quote routes
                routes::quotes::list_quotes,
                routes::quotes::get_quote,
                routes::quotes::create_quote,
                routes::quotes::update_quote,
                routes::quotes::delete_quote,
                // Show routes
                routes::shows::list_shows,
                routes::shows::get_show,
                routes::shows::create_show,
                routes::shows::delete_show,
                // Role routes
                routes::roles::list_roles,
                routes::roles::get_role,
                routes::roles::create_role,
                routes::roles::delete_role,
                // Stats routes
                routes::stats::get_stats,
                // Admin routes
                routes::admin::import_quotes,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Quotes API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::{self, PgPool};

    use crate::auth::{AuthConfig, AuthResult, AuthState, PasswordService, UserRole};
    use crate::config::AppConfig;

    pub use database::{TestDatabase, TestDatabaseError};

    pub const TEST_JWT_SECRET: &str = "quotes-test-secret";

    /// Auth configuration with short-lived tokens and a fixed secret.
    pub fn test_auth_config() -> AuthConfig {
        AuthConfig {
            issuer: "https://quotes.test".into(),
            audience: "quotes-api".into(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 3 * 24 * 60 * 60,
            jwt_secret: TEST_JWT_SECRET.into(),
            jwt_kid: Some("test-kid".into()),
        }
    }

    /// Auth services bound to `pool` using [`test_auth_config`].
    pub fn test_auth_state(pool: &PgPool) -> AuthResult<AuthState> {
        AuthState::from_config(test_auth_config(), pool.clone())
    }

    /// Convenience helpers for seeding tables in tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert an account with a hashed password, returning its id.
        pub async fn insert_user(
            &self,
            username: &str,
            role: UserRole,
            password: &str,
        ) -> Result<i32, Box<dyn std::error::Error>> {
            let hash = PasswordService::new()?.hash_password(password)?;
            let id = sqlx::query_scalar(
                "INSERT INTO users (username, role, password_hash) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(username)
            .bind(role.as_str())
            .bind(hash)
            .fetch_one(self.pool)
            .await?;
            Ok(id)
        }

        pub async fn count(&self, table: &str) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(self.pool)
                .await
        }
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::{GenericImage, ImageExt, core::WaitFor};

        use crate::db::MIGRATOR;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("neither TEST_DATABASE_URL nor TEST_USE_CONTAINERS is set")]
            MissingUrl,
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral database for integration tests, dropped on close.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<GenericImage>>,
        }

        impl TestDatabase {
            /// Use `TEST_DATABASE_URL` when set, otherwise start a Postgres
            /// container if `TEST_USE_CONTAINERS` is enabled.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
                    return Self::provision(&url, None).await;
                }

                let use_containers = std::env::var("TEST_USE_CONTAINERS")
                    .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false);
                if use_containers {
                    return Self::new_container().await;
                }

                Err(TestDatabaseError::MissingUrl)
            }

            /// Provision a fresh database inside a disposable Postgres container.
            pub async fn new_container() -> Result<Self, TestDatabaseError> {
                let image = GenericImage::new("postgres", "16-alpine")
                    .with_wait_for(WaitFor::message_on_stdout(
                        "database system is ready to accept connections",
                    ))
                    .with_wait_for(WaitFor::message_on_stderr(
                        "database system is ready to accept connections",
                    ));

                let container = image
                    .with_env_var("POSTGRES_DB", "postgres")
                    .with_env_var("POSTGRES_USER", "postgres")
                    .with_env_var("POSTGRES_PASSWORD", "postgres")
                    .start()
                    .await?;
                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                Self::provision(&admin_url, Some(container)).await
            }

            async fn provision(
                base_url: &str,
                container: Option<ContainerAsync<GenericImage>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options: PgConnectOptions = base_url.parse()?;
                let base_options = base_options.log_statements(LevelFilter::Off);

                let base_name = base_options
                    .get_database()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "postgres".to_string());

                let admin_options = base_options.clone().database("postgres");
                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let new_db_name = format!("{}_{}", base_name, Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", new_db_name);
                sqlx::query(&create_sql).execute(&admin_pool).await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&new_db_name))
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name: new_db_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database_with_fallback(self.admin_options.clone(), &self.database_name)
                    .await?;

                self.container.take();
                Ok(())
            }
        }

        async fn drop_database_with_fallback(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_force = format!("DROP DATABASE \"{}\" WITH (FORCE)", database_name);
            match sqlx::query(&drop_force).execute(&admin_pool).await {
                Ok(_) => Ok(()),
                Err(err) if force_drop_unsupported(&err) => {
                    let drop_sql = format!("DROP DATABASE \"{}\"", database_name);
                    sqlx::query(&drop_sql).execute(&admin_pool).await?;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }

        fn force_drop_unsupported(err: &sqlx::Error) -> bool {
            matches!(
                err,
                sqlx::Error::Database(db_err)
                    if db_err
                        .code()
                        .map(|code| code == "42601" || code == "0A000")
                        .unwrap_or(false)
            )
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let db_name = self.database_name.clone();
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                            let _ = drop_database_with_fallback(admin_options, &db_name).await;
                        });
                    } else {
                        std::thread::spawn(move || {
                            if let Ok(rt) = tokio::runtime::Runtime::new() {
                                rt.block_on(async move {
                                    pool.close().await;
                                    let _ =
                                        drop_database_with_fallback(admin_options, &db_name).await;
                                });
                            }
                        });
                    }
                }
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        auth_state: Option<AuthState>,
        app_config: Option<AppConfig>,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                ..Default::default()
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        /// Manage a `PgPool` for database-backed routes and the auth guards.
        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        pub fn manage_auth_state(mut self, state: AuthState) -> Self {
            self.auth_state = Some(state);
            self
        }

        pub fn manage_app_config(mut self, config: AppConfig) -> Self {
            self.app_config = Some(config);
            self
        }

        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }
            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }
            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }
            if let Some(config) = self.app_config {
                rocket = rocket.manage(config);
            }

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
