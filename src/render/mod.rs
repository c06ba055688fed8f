pub mod delimited;
pub mod document;

use chrono::{DateTime, FixedOffset};

use crate::aggregate::Aggregation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `|`-separated lines, one per record.
    Delimited,
    /// Indented HTML fragment grouped by year.
    Document,
}

/// The only place records are turned into text.
pub fn render(format: OutputFormat, agg: &Aggregation, timestamp: &DateTime<FixedOffset>) -> String {
    match format {
        OutputFormat::Delimited => delimited::render(agg),
        OutputFormat::Document => document::render(agg, timestamp),
    }
}
