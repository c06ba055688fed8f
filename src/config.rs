use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "publist";

/// Which kind of My NCBI listing `--id` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Collection,
    Author,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub collection: CollectionSettings,
    pub author: AuthorSettings,
    pub http: HttpSettings,
}

/// A saved collection: report blocks of text lines, paged by a number
/// input, completed from the legacy `/pubmed/{id}` article page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub url: String,
    pub entry: String,
    pub line: String,
    pub page_input: String,
    pub next: String,
    pub article_url: String,
    pub article_authors: String,
    pub article_citation: String,
    pub article_link: String,
    pub article_icon: String,
    pub pubmed_icon: String,
}

/// A public author bibliography: docsum entries with one span per field,
/// completed from the current PubMed article page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthorSettings {
    pub url: String,
    pub entry: String,
    pub title: String,
    pub title_link: String,
    pub authors: String,
    pub pmid: String,
    pub date: String,
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub page: String,
    pub editors: String,
    pub chapter: String,
    pub chapter_title: String,
    pub publisher: String,
    pub next: String,
    pub article_url: String,
    pub article_journal: String,
    pub article_citation: String,
    pub article_link: String,
    pub article_icon: String,
    pub pubmed_icon: String,
}

/// The article page used to complete entries that carry a PMID.
///
/// `authors` is absent when the listing already supplies them; `journal`
/// is absent when the journal leads the citation string.
#[derive(Debug, Clone)]
pub struct ArticleSettings {
    pub url: String,
    pub authors: Option<String>,
    pub journal: Option<String>,
    pub citation: String,
    pub link: String,
    pub icon: String,
    pub pubmed_icon: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            url: "https://www.ncbi.nlm.nih.gov/sites/myncbi/browse/collection/{id}/?sort=date&direction=ascending".into(),
            entry: "div.rprt".into(),
            line: "div.rprtnum, p.title, p.desc, p.details, p.resc".into(),
            page_input: "input.num".into(),
            next: "a.next".into(),
            article_url: "https://www.ncbi.nlm.nih.gov/pubmed/{id}".into(),
            article_authors: "div.auths > a".into(),
            article_citation: "div.cit".into(),
            article_link: "div.icons.portlet > a".into(),
            article_icon: "img".into(),
            pubmed_icon: "imgs/pubmed.png".into(),
        }
    }
}

impl Default for AuthorSettings {
    fn default() -> Self {
        Self {
            url: "https://www.ncbi.nlm.nih.gov/myncbi/{id}.1/bibliography/public/?sortby=pubDate&sdirection=ascending".into(),
            entry: "div.ncbi-docsum".into(),
            title: "span.title".into(),
            title_link: "a".into(),
            authors: "span.authors".into(),
            pmid: "span.pmid".into(),
            date: "span.displaydate".into(),
            journal: "span.journalname".into(),
            volume: "span.volume".into(),
            issue: "span.issue".into(),
            page: "span.page".into(),
            editors: "span.editors".into(),
            chapter: "span.chapter-details".into(),
            chapter_title: "span.chaptertitle".into(),
            publisher: "span.book-publisher".into(),
            next: "a.nextPage.enabled".into(),
            article_url: "https://pubmed.ncbi.nlm.nih.gov/{id}".into(),
            article_journal: "#full-view-journal-trigger".into(),
            article_citation: "span.cit".into(),
            article_link: "a.link-item.dialog-focus".into(),
            article_icon: "img".into(),
            pubmed_icon: "https://upload.wikimedia.org/wikipedia/commons/thumb/f/fb/US-NLM-PubMed-Logo.svg/200px-US-NLM-PubMed-Logo.svg.png".into(),
        }
    }
}

impl CollectionSettings {
    pub fn article(&self) -> ArticleSettings {
        ArticleSettings {
            url: self.article_url.clone(),
            authors: Some(self.article_authors.clone()),
            journal: None,
            citation: self.article_citation.clone(),
            link: self.article_link.clone(),
            icon: self.article_icon.clone(),
            pubmed_icon: self.pubmed_icon.clone(),
        }
    }
}

impl AuthorSettings {
    pub fn article(&self) -> ArticleSettings {
        ArticleSettings {
            url: self.article_url.clone(),
            authors: None,
            journal: Some(self.article_journal.clone()),
            citation: self.article_citation.clone(),
            link: self.article_link.clone(),
            icon: self.article_icon.clone(),
            pubmed_icon: self.pubmed_icon.clone(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("publist/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 30,
            max_retries: 3,
            backoff_ms: 2000,
        }
    }
}

impl Settings {
    /// Defaults, then `publist.toml` (or `path`), then `PUBLIST__*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("PUBLIST").separator("__"))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        Ok(settings)
    }

    /// First listing page for `id`.
    pub fn start_url(&self, kind: ListingKind, id: &str) -> String {
        match kind {
            ListingKind::Collection => expand(&self.collection.url, id),
            ListingKind::Author => expand(&self.author.url, id),
        }
    }
}

/// Fill the `{id}` placeholder of a URL template.
pub fn expand(template: &str, id: &str) -> String {
    template.replace("{id}", id)
}
