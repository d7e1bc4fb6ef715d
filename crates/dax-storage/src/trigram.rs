//! Trigram similarity, compatible with PostgreSQL's `pg_trgm`.
//!
//! A string is split into words (runs of alphanumeric characters), each word
//! is lowercased and padded with two leading spaces and one trailing space,
//! and every 3-character window of the padded word is a trigram. Similarity
//! is the Jaccard index of the two trigram sets.
//!
//! `register_functions` exposes `similarity(a, b)` and `fold(text)` to SQL so
//! that queries can filter and rank on them directly.

use std::collections::BTreeSet;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use dax_core::error::DaxError;

/// A single trigram.
pub type Trigram = [char; 3];

/// Extract the deduplicated trigram set of `text`.
pub fn trigrams(text: &str) -> BTreeSet<Trigram> {
    let mut set = BTreeSet::new();

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut padded: Vec<char> = Vec::with_capacity(word.len() + 3);
        padded.extend([' ', ' ']);
        padded.extend(fold(word).chars());
        padded.push(' ');

        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

/// Trigrams of `text` rendered as strings, like `pg_trgm`'s `show_trgm`.
pub fn show_trigrams(text: &str) -> Vec<String> {
    trigrams(text)
        .into_iter()
        .map(|t| t.iter().collect())
        .collect()
}

/// Unicode lowercase, the same folding trigram extraction applies.
pub fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Similarity of two strings in `[0.0, 1.0]`.
///
/// Returns 0.0 when either side has no trigrams.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    set_similarity(&left, &right)
}

/// Similarity of two precomputed trigram sets.
pub fn set_similarity(left: &BTreeSet<Trigram>, right: &BTreeSet<Trigram>) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let common = left.intersection(right).count();
    let union = left.len() + right.len() - common;
    common as f64 / union as f64
}

/// Install the trigram SQL functions on a connection.
///
/// Both are deterministic. `similarity` yields 0.0 for NULL arguments and
/// `fold` passes NULL through.
pub fn register_functions(conn: &Connection) -> Result<(), DaxError> {
    conn.create_scalar_function(
        "similarity",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let a = ctx.get::<Option<String>>(0)?;
            let b = ctx.get::<Option<String>>(1)?;
            Ok(match (a, b) {
                (Some(a), Some(b)) => similarity(&a, &b),
                _ => 0.0,
            })
        },
    )
    .map_err(|e| DaxError::Storage(format!("Failed to register similarity(): {}", e)))?;

    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|t| fold(&t))),
    )
    .map_err(|e| DaxError::Storage(format!("Failed to register fold(): {}", e)))
}
