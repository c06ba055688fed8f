use std::borrow::Cow;

use crate::aggregate::Aggregation;
use crate::record::{Link, Record};

pub const DELIMITER: char = '|';

/// One line per record:
/// `title|authors|venue|year|issue|link|icon|entry link|entry icon`.
pub fn render(agg: &Aggregation) -> String {
    let mut out = String::new();
    for record in agg.records() {
        out.push_str(&line(record));
        out.push('\n');
    }
    out
}

fn line(r: &Record) -> String {
    let year = r.year.to_string();
    let (link, icon) = link_fields(r.links.full_text.as_ref());
    let (entry, entry_icon) = link_fields(r.links.entry.as_ref());
    let fields: [&str; 9] = [
        &r.title, &r.authors, &r.venue, &year, &r.issue, link, icon, entry, entry_icon,
    ];
    let sep = DELIMITER.to_string();
    fields
        .iter()
        .map(|f| clean(f))
        .collect::<Vec<_>>()
        .join(sep.as_str())
}

fn link_fields(link: Option<&Link>) -> (&str, &str) {
    link.map(|l| (l.href.as_str(), l.icon.as_str()))
        .unwrap_or(("", ""))
}

/// Keep the field count fixed: a delimiter inside a value becomes `/`.
fn clean(field: &str) -> Cow<'_, str> {
    if field.contains(DELIMITER) {
        Cow::Owned(field.replace(DELIMITER, "/"))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::YearAggregator;
    use crate::record::Links;

    fn rec(index: usize, year: u16, links: Links) -> Record {
        Record {
            index,
            title: format!("Paper {}", index),
            authors: "Smith J, ==^Doe A$==".into(),
            venue: "Nature".into(),
            year,
            issue: "565(7740):100-105".into(),
            links,
        }
    }

    fn link(href: &str, icon: &str) -> Link {
        Link {
            href: href.into(),
            icon: icon.into(),
        }
    }

    #[test]
    fn resplit_recovers_core_fields() {
        let mut agg = YearAggregator::new();
        agg.add(rec(1, 2019, Links::default()));
        let out = render(&agg.finalize());
        let fields: Vec<&str> = out.trim_end_matches('\n').split(DELIMITER).collect();
        assert_eq!(fields.len(), 9);
        assert_eq!(&fields[..5], &["Paper 1", "Smith J, ==^Doe A$==", "Nature", "2019", "565(7740):100-105"]);
        assert_eq!(&fields[5..], &["", "", "", ""]);
    }

    #[test]
    fn links_fill_primary_then_entry() {
        let links = Links {
            full_text: Some(link("https://doi.org/x", "https://img/x.gif")),
            entry: Some(link("https://pubmed.ncbi.nlm.nih.gov/1", "imgs/pubmed.png")),
        };
        let mut agg = YearAggregator::new();
        agg.add(rec(1, 2019, links));
        let out = render(&agg.finalize());
        assert_eq!(
            out,
            "Paper 1|Smith J, ==^Doe A$==|Nature|2019|565(7740):100-105|https://doi.org/x|https://img/x.gif|https://pubmed.ncbi.nlm.nih.gov/1|imgs/pubmed.png\n"
        );
    }

    #[test]
    fn entry_link_without_full_text_leaves_primary_empty() {
        let links = Links {
            full_text: None,
            entry: Some(link("https://pubmed.ncbi.nlm.nih.gov/1", "imgs/pubmed.png")),
        };
        let mut agg = YearAggregator::new();
        agg.add(rec(1, 2019, links));
        let out = render(&agg.finalize());
        assert!(out.ends_with("|||https://pubmed.ncbi.nlm.nih.gov/1|imgs/pubmed.png\n"));
    }

    #[test]
    fn lines_follow_aggregation_order() {
        let mut agg = YearAggregator::new();
        agg.add(rec(1, 2020, Links::default()));
        agg.add(rec(2, 2019, Links::default()));
        agg.add(rec(3, 2020, Links::default()));
        let out = render(&agg.finalize());
        let titles: Vec<&str> = out.lines().map(|l| l.split(DELIMITER).next().unwrap()).collect();
        assert_eq!(titles, vec!["Paper 3", "Paper 1", "Paper 2"]);
    }

    #[test]
    fn delimiter_inside_field_is_replaced() {
        let mut r = rec(1, 2019, Links::default());
        r.title = "A|B test".into();
        let mut agg = YearAggregator::new();
        agg.add(r);
        let out = render(&agg.finalize());
        assert_eq!(out.split(DELIMITER).count(), 9);
        assert!(out.starts_with("A/B test|"));
    }
}
