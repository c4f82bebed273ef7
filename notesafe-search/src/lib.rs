//! In-memory ranked fuzzy search over the decrypted vault.
//!
//! Pure function of `(documents, query)` — no I/O, no mutation, operates on
//! the plaintext snapshot the store holds while unlocked.
//!
//! Two modes:
//! - **Tag filter**: a query shaped `tag:<key>` returns documents whose tag
//!   set contains a case-insensitive match, newest first. An empty key is
//!   a filter for nothing, not the absence of a filter.
//! - **Free text** (default): tokens must *all* match somewhere (AND across
//!   tokens), each on its best-scoring field (OR across fields). Title
//!   matches outrank tag matches outrank body matches.

mod extract;
mod score;

pub use extract::extract_text;
pub use score::fuzzy_score;

use notesafe_types::{normalize_tag, Document};

/// Field weights: title, joined tags, extracted body text.
const TITLE_WEIGHT: i64 = 3;
const TAGS_WEIGHT: i64 = 2;
const BODY_WEIGHT: i64 = 1;

/// Searches `documents`, returning matches ordered by relevance
/// (score descending, ties broken newest first).
pub fn search<'a>(documents: &'a [Document], query: &str) -> Vec<&'a Document> {
    let trimmed = query.trim();

    if let Some(rest) = strip_tag_prefix(trimmed) {
        return tag_filter(documents, rest);
    }

    let lowered = trimmed.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.is_empty() {
        return newest_first(documents.iter().collect());
    }

    let mut scored: Vec<(i64, &Document)> = documents
        .iter()
        .filter_map(|doc| score_document(doc, &tokens).map(|s| (s, doc)))
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.created_at.cmp(&a.1.created_at)));
    scored.into_iter().map(|(_, doc)| doc).collect()
}

/// Splits off the `tag:` prefix, case-insensitively.
fn strip_tag_prefix(query: &str) -> Option<&str> {
    // `get` returns None when byte 4 falls inside a multibyte char, and such
    // a query cannot start with the ASCII prefix anyway
    match query.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("tag:") => Some(&query[4..]),
        _ => None,
    }
}

fn tag_filter<'a>(documents: &'a [Document], raw_key: &str) -> Vec<&'a Document> {
    let key = normalize_tag(raw_key);
    if key.is_empty() {
        return Vec::new();
    }
    newest_first(documents.iter().filter(|d| d.has_tag(&key)).collect())
}

fn newest_first(mut docs: Vec<&Document>) -> Vec<&Document> {
    docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    docs
}

/// Scores one document against all tokens, or `None` if any token fails to
/// match every field (AND semantics across tokens).
fn score_document(doc: &Document, tokens: &[&str]) -> Option<i64> {
    let title = doc.title.to_lowercase();
    let tags = doc.tags.join(" ").to_lowercase();
    let body = doc
        .content
        .as_ref()
        .map(|c| extract_text(c).to_lowercase())
        .unwrap_or_default();

    let mut total = 0i64;
    for token in tokens {
        let best = [
            (&title, TITLE_WEIGHT),
            (&tags, TAGS_WEIGHT),
            (&body, BODY_WEIGHT),
        ]
        .iter()
        .map(|(field, weight)| fuzzy_score(field, token) * weight)
        .max()
        .unwrap_or(0);

        if best == 0 {
            return None;
        }
        total += best;
    }
    Some(total)
}
