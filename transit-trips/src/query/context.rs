//! Continuation state for "earlier"/"later" trip pages.

use serde::{Deserialize, Serialize};

use super::{TripOptions, TripQuery};

/// The original query plus backend cursors for the adjacent pages.
///
/// Owned by the caller and mutated in place by each follow-up query. One
/// context must not be used by two follow-up queries at the same time.
///
/// A direction whose cursor is absent is exhausted. Asking for it anyway is
/// not rejected, it is just futile.
///
/// # Examples
///
/// ```
/// use transit_trips::domain::{Location, TemporalValue};
/// use transit_trips::query::{Direction, PaginationContext, TripOptions, TripQuery};
///
/// let query = TripQuery::new(
///     Location::station("A", "A"),
///     Location::station("B", "B"),
///     TemporalValue::new(1_710_489_600_000, 60),
///     Direction::DepartAfter,
/// );
///
/// let mut ctx = PaginationContext::new(query, TripOptions::default(), Some("page:-1".into()), None);
/// assert!(ctx.can_query_earlier());
/// assert!(!ctx.can_query_later());
///
/// ctx.advance(true, Some("page:1".into()));
/// assert!(ctx.can_query_later());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationContext {
    query: TripQuery,
    #[serde(default)]
    options: TripOptions,
    #[serde(default)]
    earlier_cursor: Option<String>,
    #[serde(default)]
    later_cursor: Option<String>,
}

impl PaginationContext {
    pub fn new(
        query: TripQuery,
        options: TripOptions,
        earlier_cursor: Option<String>,
        later_cursor: Option<String>,
    ) -> Self {
        Self {
            query,
            options,
            earlier_cursor,
            later_cursor,
        }
    }

    pub fn query(&self) -> &TripQuery {
        &self.query
    }

    pub fn options(&self) -> &TripOptions {
        &self.options
    }

    pub fn earlier_cursor(&self) -> Option<&str> {
        self.earlier_cursor.as_deref()
    }

    pub fn later_cursor(&self) -> Option<&str> {
        self.later_cursor.as_deref()
    }

    /// Cursor for the given direction.
    pub fn cursor(&self, later: bool) -> Option<&str> {
        if later {
            self.later_cursor()
        } else {
            self.earlier_cursor()
        }
    }

    pub fn can_query_earlier(&self) -> bool {
        self.earlier_cursor.is_some()
    }

    pub fn can_query_later(&self) -> bool {
        self.later_cursor.is_some()
    }

    /// Replace the cursor for the direction just fetched.
    ///
    /// The other direction's cursor still points past the pages already
    /// seen, so it is left alone.
    pub fn advance(&mut self, later: bool, cursor: Option<String>) {
        if later {
            self.later_cursor = cursor;
        } else {
            self.earlier_cursor = cursor;
        }
    }
}
