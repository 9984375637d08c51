use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use quotes_api::config::AppConfig;
use quotes_api::importer::import_from_database;

#[derive(Parser, Debug)]
#[command(
    name = "import_quotes",
    about = "Load movie quotes from a JSON file into the database"
)]
struct Args {
    /// Path to the JSON file. Defaults to `<QUOTES_BASE_DIR>/<QUOTES_IMPORT_FILE>`.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = AppConfig::from_env();
    quotes_api::init_logger(if config.debug { "debug" } else { "warn" });

    let args = Args::parse();
    let path = args.file.unwrap_or_else(|| config.import_path());
    let mut stdout = io::stdout().lock();

    // Failures are reported, not signalled through the exit status.
    let Some(database_url) = args.database_url.or_else(|| config.database_url.clone()) else {
        writeln!(stdout, "Error loading quotes: DATABASE_URL is not set")?;
        return Ok(());
    };

    if let Err(err) = import_from_database(&database_url, &path, &mut stdout).await {
        log::error!("quote import failed: {}", err);
        writeln!(stdout, "{err}")?;
    }

    stdout.flush()
}
