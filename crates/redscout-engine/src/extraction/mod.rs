//! Field extraction built on `StrategyChain`.

pub mod note;
pub mod search;

pub use note::{
    author_chain, body_chain, extract_note, mark_comment_regions, published_at_chain, title_chain,
};
pub use search::{
    CARD_LINK, CARD_SELECTORS, card_title_chain, collect_hits, find_cards, search_url,
    sort_by_latest,
};
