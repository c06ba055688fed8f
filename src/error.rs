use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a page from a [`crate::source::PageSource`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("invalid URL `{url}`: {reason}")]
    BadUrl { url: String, reason: String },
    #[error("session already closed")]
    Closed,
    #[error("no page registered for {0}")]
    NotFound(String),
    #[error("pagination stalled: page {page} was served twice")]
    Stalled { page: String },
    #[error("listing reports page {current} of {last} but offers no next control")]
    Truncated { current: u32, last: u32 },
    #[error("pagination skipped ahead: expected page {expected}, got page {got}")]
    Skipped { expected: u32, got: u32 },
    #[error("listing has no entries matching `{selector}`")]
    NoEntries { selector: String },
}

/// Why a listing entry could not be mapped to a record shape.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("entry has {0} lines, expected at least 3")]
    TooShort(usize),
    #[error("no bracketed type tag in `{0}`")]
    MissingTag(String),
    #[error("unknown publication type `[{0}]`")]
    UnknownTag(String),
    #[error("missing {0} line")]
    MissingLine(&'static str),
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("no PMID number in `{0}`")]
    Pmid(String),
    #[error("cannot split `{line}` on `{delimiter}`")]
    Split { line: String, delimiter: &'static str },
    #[error("no `Chapter …, N-M p.` pattern in `{0}`")]
    Chapter(String),
    #[error("`{0}` does not start with a 4-digit year")]
    Year(String),
}

/// Why a secondary lookup could not produce the required citation fields.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no author list on the article page")]
    MissingAuthors,
    #[error("no citation string on the article page")]
    MissingCitation,
    #[error("no journal name on the article page")]
    MissingJournal,
    #[error("citation `{0}` has no journal/info delimiter")]
    MalformedCitation(String),
    #[error("no 4-digit year in citation info `{0}`")]
    Year(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch {url}: {source}")]
    PageFetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("record {index} ({}): {source}", .title.as_deref().unwrap_or("untitled"))]
    Classification {
        index: usize,
        title: Option<String>,
        #[source]
        source: ClassifyError,
    },
    /// Recovered gap; logged, never returned from the pipeline.
    #[error("record {index} ({title}): no {field} found, using \"{fallback}\"")]
    FieldExtraction {
        index: usize,
        title: String,
        field: &'static str,
        fallback: &'static str,
    },
    #[error("record {index} ({title}): lookup of PMID {id} failed: {source}")]
    Resolution {
        index: usize,
        title: String,
        id: String,
        #[source]
        source: ResolveError,
    },
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
    #[error("cannot read member list {}: {source}", .path.display())]
    Members {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
