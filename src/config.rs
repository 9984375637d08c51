//! Application settings loaded from environment variables.

use std::path::PathBuf;

use crate::importer::DEFAULT_IMPORT_FILE;

/// Deployment settings shared by the server and the admin binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_dir: PathBuf,
    pub import_file: String,
    pub debug: bool,
    pub database_url: Option<String>,
    /// Empty means every origin is allowed.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = lookup("QUOTES_BASE_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let import_file = lookup("QUOTES_IMPORT_FILE")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMPORT_FILE.to_string());
        let debug = lookup("CONFIG_DEBUG")
            .and_then(|value| value.trim().parse::<i32>().ok())
            .map(|value| value != 0)
            .unwrap_or(false);
        let database_url = lookup("DATABASE_URL").filter(|value| !value.trim().is_empty());
        let cors_allowed_origins = lookup("CONFIG_CORS_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            base_dir,
            import_file,
            debug,
            database_url,
            cors_allowed_origins,
        }
    }

    /// Location of the quote import file.
    pub fn import_path(&self) -> PathBuf {
        self.base_dir.join(&self.import_file)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.base_dir.join("static")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.base_dir.join("media")
    }

    /// Default `env_logger` filter for this configuration.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug,rocket::server=info,rocket::request=info"
        } else {
            "info,rocket::server=warn,rocket::request=warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_resolve_against_current_directory() {
        let config = AppConfig::default();
        assert_eq!(config.import_path(), PathBuf::from("./movie_quotes.json"));
        assert_eq!(config.static_dir(), PathBuf::from("./static"));
        assert!(!config.debug);
        assert!(config.database_url.is_none());
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("QUOTES_BASE_DIR", "/srv/quotes"),
            ("QUOTES_IMPORT_FILE", "quotes.json"),
            ("CONFIG_DEBUG", "1"),
            ("DATABASE_URL", "postgres://db/quotes"),
            (
                "CONFIG_CORS_ALLOWED_ORIGINS",
                "https://a.example, https://b.example",
            ),
        ]);

        assert_eq!(config.import_path(), PathBuf::from("/srv/quotes/quotes.json"));
        assert_eq!(config.media_dir(), PathBuf::from("/srv/quotes/media"));
        assert!(config.debug);
        assert_eq!(config.database_url.as_deref(), Some("postgres://db/quotes"));
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.log_filter().starts_with("debug"));
    }

    #[test]
    fn non_numeric_debug_flag_is_off() {
        assert!(!config_from(&[("CONFIG_DEBUG", "yes")]).debug);
        assert!(!config_from(&[("CONFIG_DEBUG", "0")]).debug);
    }
}
