use chrono::{DateTime, FixedOffset};

use crate::aggregate::{Aggregation, YearGroup};
use crate::parser::highlight::{MARK_CLOSE, MARK_OPEN};
use crate::record::{Link, Record};

const TIMESTAMP_FORMAT: &str = "%a, %m/%d/%Y %I:%M:%S %p %Z";
const INDENT: &str = " ";

enum Node {
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Node>,
    },
    Void {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
    },
    Text(String),
    /// Text that may carry member highlight markers.
    Marked(String),
}

fn el(tag: &'static str, children: Vec<Node>) -> Node {
    Node::Element {
        tag,
        attrs: Vec::new(),
        children,
    }
}

fn el_with(tag: &'static str, attrs: Vec<(&'static str, String)>, children: Vec<Node>) -> Node {
    Node::Element {
        tag,
        attrs,
        children,
    }
}

fn text(s: impl Into<String>) -> Node {
    Node::Text(s.into())
}

impl Node {
    fn write(&self, out: &mut String, depth: usize) {
        let pad = INDENT.repeat(depth);
        match self {
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                out.push_str(&format!("{}<{}{}>\n", pad, tag, render_attrs(attrs)));
                for child in children {
                    child.write(out, depth + 1);
                }
                out.push_str(&format!("{}</{}>\n", pad, tag));
            }
            Node::Void { tag, attrs } => {
                out.push_str(&format!("{}<{}{}/>\n", pad, tag, render_attrs(attrs)));
            }
            Node::Text(t) => out.push_str(&format!("{}{}\n", pad, html_escape(t))),
            Node::Marked(t) => out.push_str(&format!("{}{}\n", pad, emphasize(&html_escape(t)))),
        }
    }
}

fn render_attrs(attrs: &[(&'static str, String)]) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(" {}=\"{}\"", k, html_escape(v)))
        .collect()
}

pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Swap highlight markers for markup. Runs on already-escaped text.
fn emphasize(escaped: &str) -> String {
    escaped
        .replace(MARK_OPEN, "<u><b>")
        .replace(MARK_CLOSE, "</b></u>")
}

/// Render the aggregation as an indented HTML fragment.
pub fn render(agg: &Aggregation, timestamp: &DateTime<FixedOffset>) -> String {
    let mut children = vec![summary(agg.total(), timestamp)];
    for group in &agg.years {
        children.extend(year_section(group));
    }
    let root = el_with("div", vec![("class", "publications".into())], children);

    let mut out = String::new();
    root.write(&mut out, 0);
    out
}

fn summary(total: usize, timestamp: &DateTime<FixedOffset>) -> Node {
    el_with(
        "div",
        vec![("class", "summary".into())],
        vec![
            el("h3", vec![text(format!("Total papers: {}", total))]),
            el(
                "span",
                vec![text(format!(
                    "(Last updated: {})",
                    timestamp.format(TIMESTAMP_FORMAT)
                ))],
            ),
        ],
    )
}

fn year_section(group: &YearGroup) -> [Node; 2] {
    let heading = el(
        "h3",
        vec![text(format!("{} ({})", group.year, group.records.len()))],
    );
    let items = group.records.iter().map(item).collect();
    [heading, el("ol", items)]
}

fn item(r: &Record) -> Node {
    let mut children = vec![
        el_with(
            "div",
            vec![("class", "title".into())],
            vec![el("b", vec![text(r.title.as_str())])],
        ),
        el_with(
            "div",
            vec![("class", "authors".into())],
            vec![Node::Marked(r.authors.clone())],
        ),
        el_with(
            "div",
            vec![("class", "source".into())],
            vec![
                el("i", vec![el("b", vec![text(r.venue.as_str())])]),
                text(format!("{}; {}.", r.year, r.issue)),
            ],
        ),
    ];

    let icons: Vec<Node> = [&r.links.full_text, &r.links.entry]
        .into_iter()
        .flatten()
        .map(icon)
        .collect();
    if !icons.is_empty() {
        children.push(el_with("div", vec![("class", "links".into())], icons));
    }

    el_with("li", vec![("value", r.index.to_string())], children)
}

fn icon(link: &Link) -> Node {
    el_with(
        "a",
        vec![("href", link.href.clone())],
        vec![Node::Void {
            tag: "img",
            attrs: vec![("src", link.icon.clone()), ("style", "height:16px".into())],
        }],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::YearAggregator;
    use crate::record::Links;

    fn ts() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-05T14:07:09+00:00").unwrap()
    }

    fn rec(index: usize, year: u16) -> Record {
        Record {
            index,
            title: format!("Paper {}", index),
            authors: "Smith J, ==^Doe A$==".into(),
            venue: "Nature".into(),
            year,
            issue: "565(7740):100-105".into(),
            links: Links::default(),
        }
    }

    fn aggregated(records: Vec<Record>) -> Aggregation {
        let mut agg = YearAggregator::new();
        for r in records {
            agg.add(r);
        }
        agg.finalize()
    }

    #[test]
    fn header_carries_total_and_timestamp() {
        let out = render(&aggregated(vec![rec(1, 2019), rec(2, 2020)]), &ts());
        assert!(out.contains("Total papers: 2\n"));
        assert!(out.contains("(Last updated: Tue, 03/05/2024 02:07:09 PM"));
    }

    #[test]
    fn years_descending_with_counts() {
        let out = render(&aggregated(vec![rec(1, 2019), rec(2, 2020), rec(3, 2020)]), &ts());
        let y2020 = out.find("2020 (2)").unwrap();
        let y2019 = out.find("2019 (1)").unwrap();
        assert!(y2020 < y2019);
        let li3 = out.find("<li value=\"3\">").unwrap();
        let li2 = out.find("<li value=\"2\">").unwrap();
        assert!(li3 < li2);
    }

    #[test]
    fn markers_become_markup_only_in_authors() {
        let out = render(&aggregated(vec![rec(1, 2019)]), &ts());
        assert!(out.contains("Smith J, <u><b>Doe A</b></u>"));
        assert!(!out.contains(MARK_OPEN));
        assert!(!out.contains(MARK_CLOSE));
    }

    #[test]
    fn text_is_escaped() {
        let mut r = rec(1, 2019);
        r.title = "CRISPR <in vivo> & \"more\"".into();
        r.authors = "Smith J & ==^Doe A$==".into();
        let out = render(&aggregated(vec![r]), &ts());
        assert!(out.contains("CRISPR &lt;in vivo&gt; &amp; &quot;more&quot;"));
        assert!(out.contains("Smith J &amp; <u><b>Doe A</b></u>"));
    }

    #[test]
    fn link_icons_rendered_in_order() {
        let mut r = rec(1, 2019);
        r.links = Links {
            full_text: Some(Link {
                href: "https://doi.org/x".into(),
                icon: "https://img/x.gif".into(),
            }),
            entry: Some(Link {
                href: "https://pubmed.ncbi.nlm.nih.gov/1".into(),
                icon: "imgs/pubmed.png".into(),
            }),
        };
        let out = render(&aggregated(vec![r]), &ts());
        let doi = out.find("href=\"https://doi.org/x\"").unwrap();
        let pubmed = out.find("href=\"https://pubmed.ncbi.nlm.nih.gov/1\"").unwrap();
        assert!(doi < pubmed);
        assert!(out.contains("<img src=\"imgs/pubmed.png\" style=\"height:16px\"/>"));
    }

    #[test]
    fn no_links_no_link_block() {
        let out = render(&aggregated(vec![rec(1, 2019)]), &ts());
        assert!(!out.contains("class=\"links\""));
    }

    #[test]
    fn tree_is_balanced_and_indented() {
        let out = render(&aggregated(vec![rec(1, 2019), rec(2, 2018)]), &ts());
        let mut stack: Vec<(usize, String)> = Vec::new();
        for line in out.lines() {
            let depth = line.len() - line.trim_start().len();
            let body = line.trim_start();
            if let Some(rest) = body.strip_prefix("</") {
                let (open_depth, tag) = stack.pop().expect("close without open");
                assert_eq!(rest.trim_end_matches('>'), tag);
                assert_eq!(depth, open_depth);
            } else if body.starts_with('<') && !body.ends_with("/>") && !body.starts_with("<u>") {
                let tag: String = body[1..].chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
                stack.push((depth, tag));
            }
        }
        assert!(stack.is_empty());
        assert!(out.starts_with("<div class=\"publications\">\n"));
        assert!(out.ends_with("</div>\n"));
    }
}
