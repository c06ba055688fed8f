use std::collections::HashMap;

use super::{parse_url, Document, PageSource};
use crate::error::FetchError;

/// Serves canned pages by URL and records what was visited.
#[derive(Default)]
pub struct MemorySource {
    pages: HashMap<String, String>,
    pub visits: Vec<String>,
    pub closed: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        let key = parse_url(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string());
        self.pages.insert(key, body.into());
        self
    }

    pub fn fixture(self, url: &str, name: &str) -> Self {
        let body = std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
        self.page(url, body)
    }
}

impl PageSource for MemorySource {
    async fn navigate(&mut self, url: &str) -> Result<Document, FetchError> {
        if self.closed {
            return Err(FetchError::Closed);
        }
        let url = parse_url(url)?;
        self.visits.push(url.to_string());
        let body = self
            .pages
            .get(url.as_str())
            .ok_or_else(|| FetchError::NotFound(url.to_string()))?;
        Ok(Document::new(url.clone(), body))
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
