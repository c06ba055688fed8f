use std::path::Path;

use regex::{Captures, Regex};
use tracing::{info, warn};

use crate::error::PipelineError;

pub const MARK_OPEN: &str = "==^";
pub const MARK_CLOSE: &str = "$==";

/// Wraps known member names in highlight markers.
///
/// All names go into a single alternation ordered longest-first, so one
/// left-to-right pass picks the longest name at each position and never
/// touches text it already wrapped.
#[derive(Debug, Default)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = members
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        names.dedup();

        if names.is_empty() {
            return Self::default();
        }

        let alternation = names.iter().map(|n| regex::escape(n)).collect::<Vec<_>>().join("|");
        match Regex::new(&alternation) {
            Ok(re) => Self { pattern: Some(re) },
            Err(e) => {
                warn!("Member list too large to highlight ({}), skipping", e);
                Self::default()
            }
        }
    }

    /// Load a newline-delimited member list.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Members {
            path: path.to_path_buf(),
            source,
        })?;
        let hl = Self::new(text.lines());
        info!("Loaded member list from {}", path.display());
        Ok(hl)
    }

    pub fn highlight(&self, authors: &str) -> String {
        match &self.pattern {
            Some(re) => re
                .replace_all(authors, |c: &Captures| format!("{}{}{}", MARK_OPEN, &c[0], MARK_CLOSE))
                .into_owned(),
            None => authors.to_string(),
        }
    }
}
