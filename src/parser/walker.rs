use std::collections::HashSet;

use reqwest::Url;
use scraper::{ElementRef, Selector};
use tracing::info;

use crate::config::{AuthorSettings, CollectionSettings};
use crate::error::{FetchError, PipelineError};
use crate::source::{compile, text_of, Document, PageSource};

/// One listing entry as read off the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Text lines of a collection report block.
    Lines(Vec<String>),
    /// Named spans of an author bibliography docsum.
    Docsum(Docsum),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Docsum {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub pmid: Option<String>,
    pub date: Option<String>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub page: Option<String>,
    pub editors: Option<String>,
    pub chapter: Option<String>,
    pub chapter_title: Option<String>,
    pub publisher: Option<String>,
}

/// A listing entry tagged with its position in the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub index: usize,
    pub entry: Entry,
}

struct DocsumSelectors {
    title: Selector,
    title_link: Selector,
    authors: Selector,
    pmid: Selector,
    date: Selector,
    journal: Selector,
    volume: Selector,
    issue: Selector,
    page: Selector,
    editors: Selector,
    chapter: Selector,
    chapter_title: Selector,
    publisher: Selector,
}

enum EntryReader {
    Lines(Selector),
    Docsum(Box<DocsumSelectors>),
}

pub struct ListingSelectors {
    entry_css: String,
    entry: Selector,
    reader: EntryReader,
    page_input: Option<Selector>,
    next: Selector,
}

impl ListingSelectors {
    pub fn from_collection(settings: &CollectionSettings) -> Result<Self, PipelineError> {
        Ok(Self {
            entry_css: settings.entry.clone(),
            entry: compile(&settings.entry)?,
            reader: EntryReader::Lines(compile(&settings.line)?),
            page_input: Some(compile(&settings.page_input)?),
            next: compile(&settings.next)?,
        })
    }

    pub fn from_author(settings: &AuthorSettings) -> Result<Self, PipelineError> {
        let docsum = DocsumSelectors {
            title: compile(&settings.title)?,
            title_link: compile(&settings.title_link)?,
            authors: compile(&settings.authors)?,
            pmid: compile(&settings.pmid)?,
            date: compile(&settings.date)?,
            journal: compile(&settings.journal)?,
            volume: compile(&settings.volume)?,
            issue: compile(&settings.issue)?,
            page: compile(&settings.page)?,
            editors: compile(&settings.editors)?,
            chapter: compile(&settings.chapter)?,
            chapter_title: compile(&settings.chapter_title)?,
            publisher: compile(&settings.publisher)?,
        };
        Ok(Self {
            entry_css: settings.entry.clone(),
            entry: compile(&settings.entry)?,
            reader: EntryReader::Docsum(Box::new(docsum)),
            page_input: None,
            next: compile(&settings.next)?,
        })
    }
}

impl EntryReader {
    fn read(&self, el: ElementRef<'_>) -> Entry {
        match self {
            EntryReader::Lines(line) => Entry::Lines(
                el.select(line)
                    .map(text_of)
                    .filter(|line| !line.is_empty())
                    .collect(),
            ),
            EntryReader::Docsum(sel) => {
                let field = |s: &Selector| el.select(s).next().map(text_of).filter(|t| !t.is_empty());
                Entry::Docsum(Docsum {
                    title: field(&sel.title).or_else(|| field(&sel.title_link)),
                    authors: field(&sel.authors),
                    pmid: field(&sel.pmid),
                    date: field(&sel.date),
                    journal: field(&sel.journal),
                    volume: field(&sel.volume),
                    issue: field(&sel.issue),
                    page: field(&sel.page),
                    editors: field(&sel.editors),
                    chapter: field(&sel.chapter),
                    chapter_title: field(&sel.chapter_title),
                    publisher: field(&sel.publisher),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePosition {
    pub current: u32,
    pub last: u32,
}

/// What one listing page offers: its entries and the way forward.
#[derive(Debug)]
pub struct ListingPage {
    pub entries: Vec<Entry>,
    pub position: Option<PagePosition>,
    pub next: Option<Url>,
}

impl ListingPage {
    pub fn parse(doc: &Document, sel: &ListingSelectors) -> Result<Self, FetchError> {
        let entries = doc
            .select(&sel.entry)
            .map(|entry| sel.reader.read(entry))
            .collect();

        let position = sel
            .page_input
            .as_ref()
            .and_then(|s| doc.first(s))
            .and_then(|input| {
                let current = input.value().attr("value")?.trim().parse().ok()?;
                let last = input.value().attr("last")?.trim().parse().ok()?;
                Some(PagePosition { current, last })
            });

        let next = match doc.first(&sel.next).and_then(|a| a.value().attr("href")) {
            Some(href) => Some(doc.join(href)?),
            None => None,
        };

        Ok(Self {
            entries,
            position,
            next,
        })
    }

    /// The has-next signal: `Ok(None)` once the listing is exhausted.
    pub fn next_page(&self) -> Result<Option<&Url>, FetchError> {
        match (self.position, &self.next) {
            (Some(p), _) if p.current >= p.last => Ok(None),
            (_, Some(next)) => Ok(Some(next)),
            (Some(p), None) => Err(FetchError::Truncated {
                current: p.current,
                last: p.last,
            }),
            (None, None) => Ok(None),
        }
    }
}

/// Walk every page of the listing starting at `start`, in source order.
pub async fn walk<S: PageSource>(
    source: &mut S,
    start: &str,
    sel: &ListingSelectors,
) -> Result<Vec<RawBlock>, PipelineError> {
    let fetch_err = |url: &str, source: FetchError| PipelineError::PageFetch {
        url: url.to_string(),
        source,
    };

    let mut url = start.to_string();
    let mut visited: HashSet<String> = HashSet::new();
    let mut previous: Option<u32> = None;
    let mut blocks = Vec::new();

    loop {
        let doc = source.navigate(&url).await.map_err(|e| fetch_err(&url, e))?;
        visited.insert(doc.url().to_string());
        let page = ListingPage::parse(&doc, sel).map_err(|e| fetch_err(&url, e))?;

        if let (Some(prev), Some(pos)) = (previous, page.position) {
            if pos.current <= prev {
                return Err(fetch_err(
                    &url,
                    FetchError::Stalled {
                        page: pos.current.to_string(),
                    },
                ));
            }
            if pos.current != prev + 1 {
                return Err(fetch_err(
                    &url,
                    FetchError::Skipped {
                        expected: prev + 1,
                        got: pos.current,
                    },
                ));
            }
        }
        previous = page.position.map(|p| p.current);

        match page.position {
            Some(p) => info!("Listing page {}/{}: {} entries", p.current, p.last, page.entries.len()),
            None => info!("Listing page {}: {} entries", url, page.entries.len()),
        }

        for entry in page.entries.iter().cloned() {
            blocks.push(RawBlock {
                index: blocks.len() + 1,
                entry,
            });
        }

        let next = match page.next_page().map_err(|e| fetch_err(&url, e))? {
            Some(next) => next.to_string(),
            None => break,
        };
        if visited.contains(&next) {
            return Err(fetch_err(&url, FetchError::Stalled { page: next }));
        }
        url = next;
    }

    if blocks.is_empty() {
        return Err(fetch_err(
            start,
            FetchError::NoEntries {
                selector: sel.entry_css.clone(),
            },
        ));
    }
    Ok(blocks)
}
