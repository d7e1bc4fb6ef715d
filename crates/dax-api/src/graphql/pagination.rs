//! Relay cursor connections over offset-paged repository queries.
//!
//! Cursors are row offsets into the filtered, ordered result set.

use async_graphql::connection::{query, Connection, Edge, EmptyFields};
use async_graphql::{OutputType, SimpleObject};

use dax_core::config::SearchConfig;
use dax_core::error::DaxError;
use dax_core::types::{Page, PageRequest};

use crate::error::GqlResultExt;

/// Extra fields on every connection.
#[derive(SimpleObject)]
pub struct ConnectionTotals {
    /// Number of nodes matching the filter, ignoring pagination.
    pub total_count: u64,
}

pub type DaxConnection<T> = Connection<usize, T, ConnectionTotals, EmptyFields>;

/// Resolve Relay arguments to a half-open `[start, end)` window over
/// `total` rows.
///
/// `after`/`before` are exclusive offsets; `first` trims from the start of
/// the window and `last` from its end.
pub fn resolve_window(
    after: Option<usize>,
    before: Option<usize>,
    first: Option<usize>,
    last: Option<usize>,
    total: usize,
) -> (usize, usize) {
    let mut start = after.map(|a| a.saturating_add(1)).unwrap_or(0).min(total);
    let mut end = before.unwrap_or(total).min(total).max(start);

    if let Some(first) = first {
        end = start.saturating_add(first).min(end);
    }
    if let Some(last) = last {
        start = end.saturating_sub(last).max(start);
    }

    (start, end)
}

/// Run a Relay query against `fetch`.
///
/// `fetch` receives a window function mapping the total row count to the
/// page to load, and must count and load in one consistent read so that
/// `totalCount`, the page info and the edges agree.
///
/// Without `first` or `last` the page holds `limits.default_limit` rows;
/// explicit sizes are capped at `limits.max_limit`.
pub async fn paginate<T, F>(
    after: Option<String>,
    before: Option<String>,
    first: Option<i32>,
    last: Option<i32>,
    limits: &SearchConfig,
    fetch: F,
) -> async_graphql::Result<DaxConnection<T>>
where
    T: OutputType,
    F: FnOnce(&dyn Fn(u64) -> PageRequest) -> Result<Page<T>, DaxError>,
{
    let cap = usize::try_from(limits.max_limit).unwrap_or(usize::MAX);
    let default = usize::try_from(limits.default_limit).unwrap_or(cap);

    query(
        after,
        before,
        first,
        last,
        |after: Option<usize>, before: Option<usize>, first: Option<usize>, last: Option<usize>| async move {
            let first = match (first, last) {
                (None, None) => Some(default.min(cap)),
                (first, _) => first.map(|n| n.min(cap)),
            };
            let last = last.map(|n| n.min(cap));
            let window_over = |total: u64| {
                resolve_window(after, before, first, last, usize::try_from(total).unwrap_or(usize::MAX))
            };

            let page = fetch(&|total| {
                let (start, end) = window_over(total);
                PageRequest::new(start as u64, (end - start) as u64)
            })
            .gql()?;

            let (start, end) = window_over(page.total);
            let mut connection = Connection::with_additional_fields(
                start > 0,
                (end as u64) < page.total,
                ConnectionTotals {
                    total_count: page.total,
                },
            );
            connection.edges.extend(
                page.items
                    .into_iter()
                    .enumerate()
                    .map(|(i, node)| Edge::new(start + i, node)),
            );
            Ok::<_, async_graphql::Error>(connection)
        },
    )
    .await
}
