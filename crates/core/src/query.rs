//! List query variants and filters.

use chrono::NaiveDate;
use clinic_types::NonEmptyText;

/// Optional inclusive date range filter.
///
/// Ranges are **both-or-neither**: a range with only one bound contributes no query
/// parameters, so the request behaves exactly like an unfiltered one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn between(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self::new(Some(start_date), Some(end_date))
    }

    /// Both bounds, if and only if both are set.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_filtering(&self) -> bool {
        self.bounds().is_some()
    }

    /// `startDate`/`endDate` query parameters as ISO dates, or nothing.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self.bounds() {
            Some((start, end)) => vec![
                ("startDate".to_string(), start.format("%Y-%m-%d").to_string()),
                ("endDate".to_string(), end.format("%Y-%m-%d").to_string()),
            ],
            None => Vec::new(),
        }
    }
}

/// Exactly one way of selecting the records of a list request.
///
/// Variants do not compose: a search is never also filtered to active records, and a date
/// range is never also a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListQuery<S> {
    All,
    Active,
    ByStatus(S),
    Range(DateRange),
    Search(NonEmptyText),
}

impl<S> ListQuery<S> {
    /// Query for the contents of a search box: a search when there is text, otherwise the
    /// plain list.
    pub fn from_search_input(input: &str) -> Self {
        NonEmptyText::new(input)
            .map(ListQuery::Search)
            .unwrap_or(ListQuery::All)
    }

    /// Short name used in log lines and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ListQuery::All => "list",
            ListQuery::Active => "active list",
            ListQuery::ByStatus(_) => "status filter",
            ListQuery::Range(_) => "date range",
            ListQuery::Search(_) => "search",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn full_range_emits_both_parameters() {
        let range = DateRange::between(date("2026-01-01"), date("2026-01-31"));
        assert_eq!(
            range.query_pairs(),
            vec![
                ("startDate".to_string(), "2026-01-01".to_string()),
                ("endDate".to_string(), "2026-01-31".to_string()),
            ]
        );
    }

    #[test]
    fn start_only_range_is_no_filter() {
        let range = DateRange::new(Some(date("2026-01-01")), None);
        assert!(!range.is_filtering());
        assert!(range.query_pairs().is_empty());
    }

    #[test]
    fn end_only_range_is_no_filter() {
        let range = DateRange::new(None, Some(date("2026-01-31")));
        assert!(range.bounds().is_none());
        assert!(range.query_pairs().is_empty());
    }

    #[test]
    fn blank_search_input_is_plain_list() {
        assert_eq!(ListQuery::<()>::from_search_input("   "), ListQuery::All);
        assert_eq!(
            ListQuery::<()>::from_search_input(" xray "),
            ListQuery::Search(NonEmptyText::new("xray").unwrap())
        );
    }
}
