//! Import statistics tracking.

use std::fmt;

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

/// Counts produced by one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Quotes inserted by this run
    pub quotes_created: usize,
    /// Shows inserted by this run
    pub shows_created: usize,
    /// Roles inserted by this run
    pub roles_created: usize,
    /// Records read from the input file
    pub records_processed: usize,
    /// Quote rows in the store after the run
    pub total_quotes: i64,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Movie quotes loaded successfully!")?;
        writeln!(f, "New quotes created: {}", self.quotes_created)?;
        writeln!(f, "New shows created: {}", self.shows_created)?;
        writeln!(f, "New roles created: {}", self.roles_created)?;
        writeln!(f, "Total records processed: {}", self.records_processed)?;
        write!(f, "Total quotes in database: {}", self.total_quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_block_lists_every_counter() {
        let summary = ImportSummary {
            quotes_created: 1,
            shows_created: 2,
            roles_created: 1,
            records_processed: 2,
            total_quotes: 1,
        };

        let rendered = summary.to_string();
        assert!(rendered.contains("New quotes created: 1"));
        assert!(rendered.contains("New shows created: 2"));
        assert!(rendered.contains("New roles created: 1"));
        assert!(rendered.contains("Total records processed: 2"));
        assert!(rendered.ends_with("Total quotes in database: 1"));
    }
}
