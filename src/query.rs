use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};

use crate::models::Submission;

pub const PAGE_SIZE: u32 = 20;
const MAX_PAGE_LINKS: u32 = 5;

/// The triple that narrows a submissions query. Empty means "no constraint".
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    #[serde(default)]
    pub search: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

/// Identifies one result set: a filter plus a 1-based page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub filter: FilterState,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

/// A filter resolved against the site offset: UTC bounds and a trimmed search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bounds {
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.date_from.is_none() && self.date_to.is_none()
    }

    pub fn bounds(&self, offset: FixedOffset) -> Bounds {
        let search = self.search.trim();
        Bounds {
            search: (!search.is_empty()).then(|| search.to_string()),
            from: self
                .date_from
                .and_then(|d| local_to_utc(d.and_time(NaiveTime::MIN), offset)),
            to: self.date_to.and_then(|d| {
                NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
                    .and_then(|end| local_to_utc(d.and_time(end), offset))
            }),
        }
    }
}

fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

impl Bounds {
    pub fn matches(&self, s: &Submission) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = [&s.first_name, &s.last_name, &s.email]
                .into_iter()
                .any(|v| v.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if self.from.is_some_and(|from| s.submitted_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| s.submitted_at > to) {
            return false;
        }
        true
    }

    /// `%term%` for ILIKE, with LIKE metacharacters escaped so the term matches literally.
    pub fn like_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for c in term.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

impl PageKey {
    pub fn new(filter: FilterState, page: u32) -> Self {
        PageKey {
            filter,
            page: page.max(1),
        }
    }

    pub fn window(&self) -> Window {
        let page = i64::from(self.page.max(1));
        let size = i64::from(PAGE_SIZE);
        Window {
            offset: size * (page - 1),
            limit: size,
        }
    }
}

pub fn total_pages(total: u64) -> u32 {
    let pages = total.div_ceil(u64::from(PAGE_SIZE));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Page numbers to show in the pager: at most five, kept around `current`.
pub fn page_links(current: u32, total_pages: u32) -> Vec<u32> {
    if total_pages <= MAX_PAGE_LINKS {
        return (1..=total_pages).collect();
    }
    let first = if current <= 3 {
        1
    } else if current >= total_pages - 2 {
        total_pages - (MAX_PAGE_LINKS - 1)
    } else {
        current - 2
    };
    (first..first + MAX_PAGE_LINKS).collect()
}

/// Orders newest first, ties broken by id so pages never overlap.
pub fn sort_newest_first(rows: &mut [Submission]) {
    rows.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn msk() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn record(first: &str, last: &str, email: &str, at: DateTime<Utc>) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            telegram: "@x".into(),
            phone: "1".into(),
            feedback: None,
            submitted_at: at,
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn window_follows_page() {
        let key = PageKey::new(FilterState::default(), 3);
        assert_eq!(key.window(), Window { offset: 40, limit: 20 });
        assert_eq!(PageKey::new(FilterState::default(), 0).page, 1);
    }

    #[test]
    fn totals() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(20), 1);
        assert_eq!(total_pages(45), 3);
    }

    #[test]
    fn page_links_window() {
        assert_eq!(page_links(1, 3), vec![1, 2, 3]);
        assert_eq!(page_links(2, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_links(6, 10), vec![4, 5, 6, 7, 8]);
        assert_eq!(page_links(9, 10), vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn date_bounds_use_local_day() {
        let filter = FilterState {
            date_from: NaiveDate::from_ymd_opt(2026, 3, 2),
            date_to: NaiveDate::from_ymd_opt(2026, 3, 2),
            ..Default::default()
        };
        let b = filter.bounds(msk());
        assert_eq!(b.from, Some(utc("2026-03-01T21:00:00Z")));
        assert_eq!(b.to, Some(utc("2026-03-02T20:59:59.999999Z")));

        assert!(b.matches(&record("a", "b", "c@d.e", utc("2026-03-01T21:00:00Z"))));
        assert!(b.matches(&record("a", "b", "c@d.e", utc("2026-03-02T20:59:59Z"))));
        assert!(!b.matches(&record("a", "b", "c@d.e", utc("2026-03-01T20:59:59Z"))));
        assert!(!b.matches(&record("a", "b", "c@d.e", utc("2026-03-02T21:00:00Z"))));
    }

    #[test]
    fn search_is_case_insensitive_substring_over_three_fields() {
        let b = FilterState {
            search: " PETR ".into(),
            ..Default::default()
        }
        .bounds(msk());
        let at = utc("2026-03-01T10:00:00Z");
        assert!(b.matches(&record("Petr", "Ivanov", "x@y.z", at)));
        assert!(b.matches(&record("Anna", "Petrova", "x@y.z", at)));
        assert!(b.matches(&record("Anna", "Ivanova", "apetrov@y.z", at)));
        assert!(!b.matches(&record("Anna", "Ivanova", "anna@y.z", at)));
    }

    #[test]
    fn blank_search_imposes_nothing() {
        let filter = FilterState {
            search: "   ".into(),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter.bounds(msk()), Bounds::default());
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        let b = FilterState {
            search: "50%_off".into(),
            ..Default::default()
        }
        .bounds(msk());
        assert_eq!(b.like_pattern().as_deref(), Some(r"%50\%\_off%"));
    }

    #[test]
    fn empty_dates_deserialize_as_none() {
        let f: FilterState =
            serde_json::from_str(r#"{"search":"","date_from":"","date_to":"2026-03-02"}"#).unwrap();
        assert_eq!(f.date_from, None);
        assert_eq!(f.date_to, NaiveDate::from_ymd_opt(2026, 3, 2));
    }
}
