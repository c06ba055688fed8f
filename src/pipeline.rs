use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::aggregate::{Aggregation, YearAggregator};
use crate::config::{ListingKind, Settings};
use crate::error::PipelineError;
use crate::parser::classify::title_of;
use crate::parser::{classify, walk, Classified, Highlighter, ListingSelectors, RawBlock, SecondaryResolver, Shape};
use crate::record::{Links, Record, EPUB_SENTINEL};
use crate::source::PageSource;

const TITLE_PREVIEW: usize = 40;

/// Listing walk → classification → lookup → highlighting → aggregation.
pub struct Pipeline {
    listing: ListingSelectors,
    resolver: SecondaryResolver,
    highlighter: Highlighter,
}

impl Pipeline {
    pub fn new(
        settings: &Settings,
        kind: ListingKind,
        highlighter: Highlighter,
    ) -> Result<Self, PipelineError> {
        let (listing, resolver) = match kind {
            ListingKind::Collection => (
                ListingSelectors::from_collection(&settings.collection)?,
                SecondaryResolver::from_settings(&settings.collection.article())?,
            ),
            ListingKind::Author => (
                ListingSelectors::from_author(&settings.author)?,
                SecondaryResolver::from_settings(&settings.author.article())?,
            ),
        };
        Ok(Self {
            listing,
            resolver,
            highlighter,
        })
    }

    /// Run against the listing at `start`. Both sessions are closed before
    /// this returns, whether or not the run succeeded.
    pub async fn run<L, R>(
        &self,
        listing: &mut L,
        secondary: &mut R,
        start: &str,
    ) -> Result<Aggregation, PipelineError>
    where
        L: PageSource,
        R: PageSource,
    {
        let result = self.collect(listing, secondary, start).await;
        listing.close().await;
        secondary.close().await;
        result
    }

    async fn collect<L, R>(
        &self,
        listing: &mut L,
        secondary: &mut R,
        start: &str,
    ) -> Result<Aggregation, PipelineError>
    where
        L: PageSource,
        R: PageSource,
    {
        let blocks = walk(listing, start, &self.listing).await?;
        info!("Collected {} entries", blocks.len());

        let pb = progress_bar(blocks.len());
        let mut aggregator = YearAggregator::new();
        for block in &blocks {
            match self.process(block, secondary, &pb).await {
                Ok(record) => aggregator.add(record),
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(aggregator.finalize())
    }

    async fn process<R: PageSource>(
        &self,
        block: &RawBlock,
        secondary: &mut R,
        pb: &ProgressBar,
    ) -> Result<Record, PipelineError> {
        let preview = truncate(title_of(block).unwrap_or_default(), TITLE_PREVIEW);
        pb.suspend(|| info!("Parsing {}. {}", block.index, preview));

        let Classified { index, title, shape } =
            classify(block).map_err(|source| PipelineError::Classification {
                index: block.index,
                title: title_of(block).map(str::to_string),
                source,
            })?;

        let record = match shape {
            Shape::JournalWithId {
                pmid,
                listed_authors,
            } => {
                let res = self
                    .resolver
                    .resolve(secondary, &pmid)
                    .await
                    .map_err(|source| PipelineError::Resolution {
                        index,
                        title: title.clone(),
                        id: pmid.clone(),
                        source,
                    })?;
                let issue = res.issue.unwrap_or_else(|| {
                    let gap = PipelineError::FieldExtraction {
                        index,
                        title: title.clone(),
                        field: "issue",
                        fallback: EPUB_SENTINEL,
                    };
                    pb.suspend(|| warn!("{}", gap));
                    EPUB_SENTINEL.to_string()
                });
                let authors = match listed_authors {
                    Some(listed) => self.highlighter.highlight(&listed),
                    None => res
                        .authors
                        .iter()
                        .map(|name| self.highlighter.highlight(name))
                        .collect::<Vec<_>>()
                        .join(", "),
                };
                Record {
                    index,
                    title,
                    authors,
                    venue: res.journal,
                    year: res.year,
                    issue,
                    links: Links {
                        full_text: res.full_text,
                        entry: Some(res.entry),
                    },
                }
            }
            Shape::JournalPlain(fields) | Shape::BookChapter(fields) => Record {
                index,
                title,
                authors: self.highlighter.highlight(&fields.authors),
                venue: fields.venue,
                year: fields.year,
                issue: fields.issue,
                links: Links::default(),
            },
        };

        Ok(record)
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

fn truncate(s: &str, max: usize) -> String {
    let truncated: String = s.chars().take(max).collect();
    format!("{}...", truncated)
}
