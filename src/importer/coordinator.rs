//! Import coordinator.
//!
//! Walks the records of an input file in order, resolving the show and role
//! for each one before creating its quote, and writes a progress line per
//! step to the operator's output.

use std::io::Write;
use std::path::Path;

use super::record::{QuoteRecord, load_records};
use super::store::QuoteStore;
use super::{ImportError, ImportResult, ImportSummary, UNKNOWN_CHARACTER};

const CREATED_PREVIEW_CHARS: usize = 50;
const EXISTING_PREVIEW_CHARS: usize = 30;

/// Sequential importer over any [`QuoteStore`].
pub struct QuoteImporter<S> {
    store: S,
}

impl<S: QuoteStore> QuoteImporter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Import every record of `path`, writing progress lines to `out`.
    ///
    /// The first failing record stops the run; earlier records stay committed.
    pub async fn run<W: Write>(&self, path: &Path, out: &mut W) -> ImportResult<ImportSummary> {
        log::info!("importing movie quotes from {}", path.display());

        let records = load_records(path).await?;
        let mut summary = ImportSummary::default();

        for (index, value) in records.iter().enumerate() {
            let record = QuoteRecord::from_value(index, value)?;
            self.import_record(&record, &mut summary, out).await?;
        }

        summary.records_processed = records.len();
        summary.total_quotes = self.store.count_quotes().await?;

        writeln!(out).map_err(ImportError::Output)?;
        writeln!(out, "{summary}").map_err(ImportError::Output)?;

        log::info!(
            "import finished: {} quotes, {} shows, {} roles created from {} records",
            summary.quotes_created,
            summary.shows_created,
            summary.roles_created,
            summary.records_processed
        );

        Ok(summary)
    }

    async fn import_record<W: Write>(
        &self,
        record: &QuoteRecord,
        summary: &mut ImportSummary,
        out: &mut W,
    ) -> ImportResult<()> {
        let show = self.store.get_or_create_show(&record.movie).await?;
        if show.created {
            summary.shows_created += 1;
            writeln!(out, "Created show: {}", record.movie).map_err(ImportError::Output)?;
        }

        let role = self.store.get_or_create_role(UNKNOWN_CHARACTER).await?;
        if role.created {
            summary.roles_created += 1;
            writeln!(out, "Created role: {UNKNOWN_CHARACTER}").map_err(ImportError::Output)?;
        }

        let quote = self
            .store
            .get_or_create_quote(&record.quote, show.id, role.id, false)
            .await?;

        if quote.created {
            summary.quotes_created += 1;
            writeln!(
                out,
                "Created: \"{}\" from {}",
                preview(&record.quote, CREATED_PREVIEW_CHARS),
                record.movie
            )
            .map_err(ImportError::Output)?;
        } else {
            log::debug!("quote {} already present", quote.id);
            writeln!(
                out,
                "Already exists: \"{}\"",
                preview(&record.quote, EXISTING_PREVIEW_CHARS)
            )
            .map_err(ImportError::Output)?;
        }

        Ok(())
    }
}

/// Shorten `text` to `max_chars` characters, marking the cut with `...`.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
