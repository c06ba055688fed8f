/// Issue text used when the citation carries no volume/issue part.
pub const EPUB_SENTINEL: &str = "[Epub ahead of print]";

/// One normalized bibliography entry, ready for aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub index: usize,
    pub title: String,
    pub authors: String,
    pub venue: String,
    pub year: u16,
    pub issue: String,
    pub links: Links,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    /// Publisher / full-text link offered by the article page.
    pub full_text: Option<Link>,
    /// The article page itself.
    pub entry: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub icon: String,
}

/// Year from the first four characters of `s`, if they are all digits.
pub fn leading_year(s: &str) -> Option<u16> {
    let head = s.get(..4)?;
    if head.bytes().all(|b| b.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}
