use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use tracing::debug;

use crate::config::{expand, ArticleSettings};
use crate::error::{PipelineError, ResolveError};
use crate::record::{leading_year, Link};
use crate::source::{compile, text_of, Document, PageSource};

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[12]\d{3}").unwrap());

/// Citation fields recovered from an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Author names in page order, not yet highlighted. Empty when the
    /// page is not read for authors.
    pub authors: Vec<String>,
    pub journal: String,
    pub year: u16,
    /// `None` when the citation has no `;` part (epub ahead of print).
    pub issue: Option<String>,
    pub full_text: Option<Link>,
    pub entry: Link,
}

/// Completes PMID-bearing entries from the article page.
pub struct SecondaryResolver {
    url_template: String,
    pubmed_icon: String,
    authors: Option<Selector>,
    journal: Option<Selector>,
    citation: Selector,
    link: Selector,
    icon: Selector,
}

impl SecondaryResolver {
    pub fn from_settings(settings: &ArticleSettings) -> Result<Self, PipelineError> {
        Ok(Self {
            url_template: settings.url.clone(),
            pubmed_icon: settings.pubmed_icon.clone(),
            authors: settings.authors.as_deref().map(compile).transpose()?,
            journal: settings.journal.as_deref().map(compile).transpose()?,
            citation: compile(&settings.citation)?,
            link: compile(&settings.link)?,
            icon: compile(&settings.icon)?,
        })
    }

    pub async fn resolve<S: PageSource>(
        &self,
        source: &mut S,
        pmid: &str,
    ) -> Result<Resolution, ResolveError> {
        let url = expand(&self.url_template, pmid);
        let doc = source.navigate(&url).await?;
        self.parse(&doc)
    }

    pub fn parse(&self, doc: &Document) -> Result<Resolution, ResolveError> {
        let authors: Vec<String> = match &self.authors {
            Some(sel) => {
                let names: Vec<String> = doc
                    .select(sel)
                    .map(text_of)
                    .filter(|name| !name.is_empty())
                    .collect();
                if names.is_empty() {
                    return Err(ResolveError::MissingAuthors);
                }
                names
            }
            None => Vec::new(),
        };

        let citation = doc
            .first(&self.citation)
            .map(text_of)
            .filter(|c| !c.is_empty())
            .ok_or(ResolveError::MissingCitation)?;

        let (journal, year, info) = match &self.journal {
            // "Nature. 2019 Jan;565(7740):100-105. doi: …"
            None => {
                let (journal, info) = split_citation(&citation)?;
                let info = info.trim();
                let year = leading_year(info).ok_or_else(|| ResolveError::Year(info.to_string()))?;
                (journal.to_string(), year, info)
            }
            // journal shown apart, citation "2019 Jan;565(7740):100-105."
            Some(sel) => {
                let journal = doc
                    .first(sel)
                    .map(text_of)
                    .filter(|j| !j.is_empty())
                    .ok_or(ResolveError::MissingJournal)?;
                let info = citation.trim();
                let head = info.split(';').next().unwrap_or_default();
                let year = YEAR_RE
                    .find(head)
                    .and_then(|m| m.as_str().parse().ok())
                    .ok_or_else(|| ResolveError::Year(info.to_string()))?;
                (journal, year, info)
            }
        };
        let issue = info
            .split_once(';')
            .map(|(_, rest)| rest.trim().trim_end_matches('.').to_string());

        Ok(Resolution {
            authors,
            journal,
            year,
            issue,
            full_text: self.full_text_link(doc),
            entry: Link {
                href: doc.url().to_string(),
                icon: self.pubmed_icon.clone(),
            },
        })
    }

    fn full_text_link(&self, doc: &Document) -> Option<Link> {
        let anchor = doc.first(&self.link)?;
        let href = anchor.value().attr("href")?;
        let Some(src) = anchor
            .select(&self.icon)
            .next()
            .and_then(|img| img.value().attr("src"))
        else {
            debug!(href, "Link control without icon, skipping");
            return None;
        };
        Some(Link {
            href: doc.join(href).ok()?.to_string(),
            icon: doc.join(src).ok()?.to_string(),
        })
    }
}

/// `"Nature. 2019 Jan;565(7740):100-105. doi: …"` → `("Nature", "2019 Jan;565(7740):100-105")`
fn split_citation(citation: &str) -> Result<(&str, &str), ResolveError> {
    let mut parts = citation.split(". ");
    match (parts.next(), parts.next()) {
        (Some(journal), Some(info)) => Ok((journal, info)),
        _ => Err(ResolveError::MalformedCitation(citation.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthorSettings, CollectionSettings};
    use crate::source::memory::MemorySource;

    fn resolver() -> SecondaryResolver {
        SecondaryResolver::from_settings(&CollectionSettings::default().article()).unwrap()
    }

    fn current_resolver() -> SecondaryResolver {
        SecondaryResolver::from_settings(&AuthorSettings::default().article()).unwrap()
    }

    fn article(body: &str) -> Document {
        Document::new(
            reqwest::Url::parse("https://www.ncbi.nlm.nih.gov/pubmed/1").unwrap(),
            &format!("<html><body>{}</body></html>", body),
        )
    }

    #[tokio::test]
    async fn resolves_full_citation() {
        let mut source = MemorySource::new()
            .fixture("https://www.ncbi.nlm.nih.gov/pubmed/30000111", "article_full.html");
        let r = resolver().resolve(&mut source, "30000111").await.unwrap();

        assert_eq!(r.authors, vec!["Smith J", "Doe A", "Lee M"]);
        assert_eq!(r.journal, "Nature");
        assert_eq!(r.year, 2019);
        assert_eq!(r.issue.as_deref(), Some("565(7740):100-105"));
        assert_eq!(
            r.full_text,
            Some(Link {
                href: "https://doi.org/10.1038/s41586-019-0001-1".into(),
                icon: "https://www.ncbi.nlm.nih.gov/corehtml/pmc/pmcgifs/nature.gif".into(),
            })
        );
        assert_eq!(r.entry.href, "https://www.ncbi.nlm.nih.gov/pubmed/30000111");
        assert_eq!(r.entry.icon, "imgs/pubmed.png");
    }

    #[tokio::test]
    async fn epub_citation_has_no_issue() {
        let mut source = MemorySource::new()
            .fixture("https://www.ncbi.nlm.nih.gov/pubmed/30000222", "article_epub.html");
        let r = resolver().resolve(&mut source, "30000222").await.unwrap();
        assert_eq!(r.journal, "Cell Rep");
        assert_eq!(r.year, 2020);
        assert_eq!(r.issue, None);
        assert_eq!(r.full_text, None);
    }

    #[test]
    fn missing_authors_is_fatal() {
        let doc = article(r#"<div class="cit">Nature. 2019;1:2.</div>"#);
        assert!(matches!(resolver().parse(&doc), Err(ResolveError::MissingAuthors)));
    }

    #[test]
    fn missing_citation_is_fatal() {
        let doc = article(r#"<div class="auths"><a>Smith J</a></div>"#);
        assert!(matches!(resolver().parse(&doc), Err(ResolveError::MissingCitation)));
    }

    #[test]
    fn citation_without_delimiter_is_fatal() {
        // an issue alone, with no journal/info split, is not enough
        let doc = article(r#"<div class="auths"><a>Smith J</a></div><div class="cit">565(7740):100-105</div>"#);
        assert!(matches!(resolver().parse(&doc), Err(ResolveError::MalformedCitation(_))));
    }

    #[test]
    fn info_without_year_is_fatal() {
        let doc = article(r#"<div class="auths"><a>Smith J</a></div><div class="cit">Nature. Jan;565:1-2.</div>"#);
        assert!(matches!(resolver().parse(&doc), Err(ResolveError::Year(_))));
    }

    #[test]
    fn link_without_icon_is_ignored() {
        let doc = article(
            r#"<div class="auths"><a>Smith J</a></div><div class="cit">Nature. 2019;1:2.</div>
               <div class="icons portlet"><a href="https://doi.org/x">Full text</a></div>"#,
        );
        let r = resolver().parse(&doc).unwrap();
        assert_eq!(r.full_text, None);
        assert_eq!(r.issue.as_deref(), Some("1:2"));
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let mut source = MemorySource::new();
        let err = resolver().resolve(&mut source, "1").await.unwrap_err();
        assert!(matches!(err, ResolveError::Fetch(_)));
    }

    #[tokio::test]
    async fn current_page_reads_journal_apart_from_citation() {
        let mut source = MemorySource::new()
            .fixture("https://pubmed.ncbi.nlm.nih.gov/30000333", "article_current.html");
        let r = current_resolver().resolve(&mut source, "30000333").await.unwrap();

        assert!(r.authors.is_empty());
        assert_eq!(r.journal, "Genome Res");
        assert_eq!(r.year, 2018);
        assert_eq!(r.issue.as_deref(), Some("28(5):600-611"));
        assert_eq!(
            r.full_text,
            Some(Link {
                href: "https://genome.cshlp.org/content/28/5/600".into(),
                icon: "https://cdn.ncbi.nlm.nih.gov/corehtml/query/egifs/genomeres.gif".into(),
            })
        );
        assert_eq!(r.entry.href, "https://pubmed.ncbi.nlm.nih.gov/30000333");
        assert!(r.entry.icon.ends_with("US-NLM-PubMed-Logo.svg.png"));
    }

    #[test]
    fn current_page_year_found_before_issue() {
        let doc = article(
            r#"<button id="full-view-journal-trigger">Cell Rep</button><span class="cit">Epub 2020 Mar 3;31(9):107.</span>"#,
        );
        let r = current_resolver().parse(&doc).unwrap();
        assert_eq!(r.year, 2020);
        assert_eq!(r.issue.as_deref(), Some("31(9):107"));
    }

    #[test]
    fn current_page_without_journal_is_fatal() {
        let doc = article(r#"<span class="cit">2020 Mar;31(9):107.</span>"#);
        assert!(matches!(current_resolver().parse(&doc), Err(ResolveError::MissingJournal)));
    }

    #[test]
    fn legacy_selectors_do_not_match_current_page() {
        let doc = article(
            r#"<button id="full-view-journal-trigger">Cell Rep</button><span class="cit">2020 Mar;31(9):107.</span>"#,
        );
        assert!(matches!(resolver().parse(&doc), Err(ResolveError::MissingAuthors)));
    }
}
