//! Collection filtering and pagination
//!
//! All GET collection routes share one contract: date-range filter first
//! (`date_from` exclusive, `date_to` inclusive, compared against each
//! entity's `last_updated`), then the offset/limit window. `X-Total-Count`
//! reports the filtered, pre-pagination size.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::LastUpdated;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Exclusive lower bound on `last_updated`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `last_updated`.
    pub date_to: Option<DateTime<Utc>>,
    /// Number of filtered entries to skip.
    pub offset: Option<usize>,
    /// Maximum number of entries to return.
    pub limit: Option<usize>,
}

#[derive(Debug)]
pub struct Window<T> {
    pub items: Vec<T>,
    /// Filtered size before offset/limit.
    pub total: usize,
}

pub fn window<T: LastUpdated>(items: Vec<T>, query: &ListQuery) -> Window<T> {
    let filtered: Vec<T> = items
        .into_iter()
        .filter(|item| {
            let stamp = item.last_updated();
            query.date_from.map_or(true, |from| stamp > from)
                && query.date_to.map_or(true, |to| stamp <= to)
        })
        .collect();
    let total = filtered.len();
    let items = filtered
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();
    Window { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Stamped(DateTime<Utc>);

    impl LastUpdated for Stamped {
        fn last_updated(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn items() -> Vec<Stamped> {
        (0..5).map(|h| Stamped(at(h))).collect()
    }

    #[test]
    fn date_from_is_exclusive_date_to_inclusive() {
        let query = ListQuery {
            date_from: Some(at(1)),
            date_to: Some(at(3)),
            ..Default::default()
        };
        let w = window(items(), &query);
        assert_eq!(w.total, 2); // hours 2 and 3
        assert_eq!(w.items[0].0, at(2));
        assert_eq!(w.items[1].0, at(3));
    }

    #[test]
    fn total_ignores_pagination() {
        let query = ListQuery {
            offset: Some(1),
            limit: Some(2),
            ..Default::default()
        };
        let w = window(items(), &query);
        assert_eq!(w.total, 5);
        assert_eq!(w.items.len(), 2);
        assert_eq!(w.items[0].0, at(1));
    }

    #[test]
    fn window_clamps_past_the_end() {
        let query = ListQuery {
            offset: Some(4),
            limit: Some(10),
            ..Default::default()
        };
        let w = window(items(), &query);
        assert_eq!(w.items.len(), 1);

        let query = ListQuery {
            offset: Some(99),
            limit: Some(10),
            ..Default::default()
        };
        assert!(window(items(), &query).items.is_empty());
    }
}
