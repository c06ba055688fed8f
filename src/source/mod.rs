pub mod http;
#[cfg(test)]
pub mod memory;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::{FetchError, PipelineError};

pub use http::HttpSource;

/// A browsing session: navigates to a URL and hands back the parsed page.
///
/// Sessions are scoped resources. Whoever opens one must call [`close`]
/// on every exit path; a closed session refuses further navigation.
///
/// [`close`]: PageSource::close
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn navigate(&mut self, url: &str) -> Result<Document, FetchError>;
    async fn close(&mut self);
}

/// A fetched page, queryable with CSS selectors.
pub struct Document {
    url: Url,
    html: Html,
}

impl Document {
    pub fn new(url: Url, body: &str) -> Self {
        Self {
            url,
            html: Html::parse_document(body),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> scraper::html::Select<'a, 'b> {
        self.html.select(selector)
    }

    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// Resolve a possibly relative href against this page's URL.
    pub fn join(&self, href: &str) -> Result<Url, FetchError> {
        self.url.join(href).map_err(|e| FetchError::BadUrl {
            url: href.to_string(),
            reason: e.to_string(),
        })
    }
}

pub fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::BadUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Rendered text of an element with whitespace runs collapsed.
pub fn text_of(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn compile(selector: &str) -> Result<Selector, PipelineError> {
    Selector::parse(selector).map_err(|e| PipelineError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
