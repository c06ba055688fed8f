use std::sync::LazyLock;

use regex::Regex;

use super::walker::{Docsum, Entry, RawBlock};
use crate::error::ClassifyError;
use crate::record::leading_year;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").unwrap());
static PMID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"PMID:\s*(\d+)").unwrap());
static CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Chapter[^,]*),\s*(\d+-\d+)\s*p\.").unwrap());

/// Fields read straight from the listing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFields {
    pub authors: String,
    pub venue: String,
    pub year: u16,
    pub issue: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Carries a PMID; the article page supplies the fields. Author
    /// bibliographies list the authors themselves.
    JournalWithId {
        pmid: String,
        listed_authors: Option<String>,
    },
    JournalPlain(ListedFields),
    BookChapter(ListedFields),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub index: usize,
    pub title: String,
    pub shape: Shape,
}

/// Title of a block, if it has one. Used for diagnostics.
pub fn title_of(block: &RawBlock) -> Option<&str> {
    match &block.entry {
        Entry::Lines(lines) => lines.get(1).map(String::as_str),
        Entry::Docsum(d) => d.title.as_deref(),
    }
}

/// Map a listing entry to its record shape.
pub fn classify(block: &RawBlock) -> Result<Classified, ClassifyError> {
    match &block.entry {
        Entry::Lines(lines) => classify_lines(block.index, lines),
        Entry::Docsum(d) => classify_docsum(block.index, d),
    }
}

/// Layout: `[label, title, authors, details, …, trailing metadata]`. The
/// last bracketed token of the trailing line is the publication type.
fn classify_lines(index: usize, lines: &[String]) -> Result<Classified, ClassifyError> {
    if lines.len() < 3 {
        return Err(ClassifyError::TooShort(lines.len()));
    }
    let title = lines[1].clone();
    let trailing = &lines[lines.len() - 1];
    let body = &lines[2..lines.len() - 1];

    let tag = TAG_RE
        .captures_iter(trailing)
        .last()
        .map(|c| c[1].trim().to_string())
        .ok_or_else(|| ClassifyError::MissingTag(trailing.clone()))?;

    let shape = match tag.as_str() {
        "book" => Shape::BookChapter(parse_book(body)?),
        "journal" => match PMID_RE.captures(trailing) {
            Some(caps) => Shape::JournalWithId {
                pmid: caps[1].to_string(),
                listed_authors: None,
            },
            None => Shape::JournalPlain(parse_journal(body)?),
        },
        _ => return Err(ClassifyError::UnknownTag(tag)),
    };

    Ok(Classified { index, title, shape })
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, ClassifyError> {
    field.as_deref().ok_or(ClassifyError::MissingField(name))
}

/// A docsum with a PMID span is looked up; otherwise a journal name span
/// makes it a plain journal entry and anything else is a book chapter.
fn classify_docsum(index: usize, d: &Docsum) -> Result<Classified, ClassifyError> {
    let title = required(&d.title, "title")?;
    let authors = required(&d.authors, "authors")?.trim_end_matches('.').to_string();

    if let Some(pmid) = &d.pmid {
        let id = pmid
            .split_whitespace()
            .last()
            .filter(|id| id.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| ClassifyError::Pmid(pmid.clone()))?;
        return Ok(Classified {
            index,
            title: title.to_string(),
            shape: Shape::JournalWithId {
                pmid: id.to_string(),
                listed_authors: Some(authors),
            },
        });
    }

    let date = required(&d.date, "date")?;
    let year = leading_year(date).ok_or_else(|| ClassifyError::Year(date.to_string()))?;
    let page = required(&d.page, "page")?.trim_end_matches('.');

    if let Some(journal) = &d.journal {
        // "12" "(3)" ":45-52." run together as printed
        let issue = format!(
            "{}{}{}",
            d.volume.as_deref().unwrap_or_default(),
            d.issue.as_deref().unwrap_or_default(),
            page
        );
        return Ok(Classified {
            index,
            title: title.to_string(),
            shape: Shape::JournalPlain(ListedFields {
                authors,
                venue: journal.trim_end_matches('.').to_string(),
                year,
                issue,
            }),
        });
    }

    let editors = required(&d.editors, "editors")?;
    let chapter = required(&d.chapter, "chapter")?;
    let chapter_title = required(&d.chapter_title, "chapter title")?;
    let publisher = required(&d.publisher, "publisher")?;
    Ok(Classified {
        index,
        title: chapter_title.to_string(),
        shape: Shape::BookChapter(ListedFields {
            authors,
            venue: format!("In: {} {}", title, editors),
            year,
            issue: format!("{}; {} {}", publisher, chapter, page),
        }),
    })
}

fn authors_and_details(body: &[String]) -> Result<(String, &str), ClassifyError> {
    let authors = body.first().ok_or(ClassifyError::MissingLine("authors"))?;
    let details = body.get(1).ok_or(ClassifyError::MissingLine("details"))?;
    Ok((authors.trim_end_matches('.').to_string(), details.as_str()))
}

// "Nature. 2019 Jan;565(7740):100-105."
fn parse_journal(body: &[String]) -> Result<ListedFields, ClassifyError> {
    let (authors, details) = authors_and_details(body)?;
    let mut parts = details.split(". ");
    let journal = parts.next().unwrap_or_default();
    let issue = parts.next().ok_or_else(|| ClassifyError::Split {
        line: details.to_string(),
        delimiter: ". ",
    })?;
    let issue = issue.trim_end_matches('.').to_string();
    let year = leading_year(&issue).ok_or_else(|| ClassifyError::Year(issue.clone()))?;

    Ok(ListedFields {
        authors,
        venue: journal.to_string(),
        year,
        issue,
    })
}

// "Springer; 2015. Chapter 3, 45-67 p."
fn parse_book(body: &[String]) -> Result<ListedFields, ClassifyError> {
    let (authors, details) = authors_and_details(body)?;
    let split_err = || ClassifyError::Split {
        line: details.to_string(),
        delimiter: "; ",
    };
    let parts: Vec<&str> = details.split("; ").collect();
    let [publisher, info] = parts[..] else {
        return Err(split_err());
    };
    let publisher = publisher.trim_end_matches('.');
    let year = leading_year(info).ok_or_else(|| ClassifyError::Year(info.to_string()))?;
    let caps = CHAPTER_RE
        .captures(info)
        .ok_or_else(|| ClassifyError::Chapter(info.to_string()))?;

    Ok(ListedFields {
        authors,
        venue: caps[1].trim().to_string(),
        year,
        issue: format!("{}; {}", publisher, &caps[2]),
    })
}
