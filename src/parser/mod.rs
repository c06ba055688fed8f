pub mod classify;
pub mod highlight;
pub mod resolve;
pub mod walker;

pub use classify::{classify, Classified, Shape};
pub use highlight::Highlighter;
pub use resolve::SecondaryResolver;
pub use walker::{walk, ListingSelectors, RawBlock};
