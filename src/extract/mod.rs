//! Bibliographic extraction: title, author, description and cover.
//!
//! Every accessor runs an ordered table of named strategies and returns the
//! first hit. The tables are public so the precedence can be inspected.

mod cover;
mod text;

use tracing::trace;

use crate::view::ResolvedView;

pub use cover::COVER_STRATEGIES;
pub use text::{AUTHOR_STRATEGIES, DESCRIPTION_STRATEGIES, TITLE_STRATEGIES, UNKNOWN_AUTHOR};

/// A single fallback source.
pub type Strategy<T> = fn(&ResolvedView<'_>) -> Option<T>;

/// A named, ordered fallback chain.
pub type Chain<T> = [(&'static str, Strategy<T>)];

/// Run `chain` in order and return the first hit with the name of the
/// strategy that produced it.
pub fn run_chain<T>(
    view: &ResolvedView<'_>,
    field: &'static str,
    chain: &Chain<T>,
) -> Option<(&'static str, T)> {
    for &(name, strategy) in chain {
        match strategy(view) {
            Some(value) => {
                trace!(field, strategy = name, "hit");
                return Some((name, value));
            }
            None => trace!(field, strategy = name, "miss"),
        }
    }
    None
}

/// Non-empty text, trimmed.
fn non_empty(text: impl AsRef<str>) -> Option<String> {
    let text = text.as_ref().trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Case-insensitive substring match.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
