//! Movie quote import pipeline.
//!
//! Loads a JSON array of quote records and writes them into the normalized
//! `shows` / `roles` / `quotes` schema:
//!
//! 1. **Loading** (`record`) - Reads the file and validates each element
//! 2. **Persistence** (`store`) - Lookup-or-create for shows, roles and quotes
//! 3. **Coordination** (`coordinator`) - Walks the records and reports progress
//! 4. **Statistics** (`stats`) - Counts what a run created
//!
//! Re-running against the same file is safe: quotes are keyed on their exact
//! text, shows and roles on their exact name.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use quotes_api::importer::{PgQuoteStore, QuoteImporter};
//!
//! let importer = QuoteImporter::new(PgQuoteStore::new(pool));
//! let summary = importer.run(&path, &mut std::io::stdout()).await?;
//! println!("{} new quotes", summary.quotes_created);
//! ```

pub mod command;
pub mod coordinator;
pub mod error;
pub mod record;
pub mod stats;
pub mod store;

pub use command::import_from_database;
pub use coordinator::QuoteImporter;
pub use error::{ImportError, ImportResult};
pub use record::{QuoteRecord, load_records};
pub use stats::ImportSummary;
pub use store::{Lookup, PgQuoteStore, QuoteStore};

/// Role assigned to every imported quote; the source data has no character attribution.
pub const UNKNOWN_CHARACTER: &str = "Unknown Character";

/// Default name of the import file inside the base directory.
pub const DEFAULT_IMPORT_FILE: &str = "movie_quotes.json";
