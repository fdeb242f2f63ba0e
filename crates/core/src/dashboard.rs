//! Visit counts per status for the dashboard header.

use crate::entities::visit::{VisitStatus, VisitStore};
use crate::query::DateRange;
use crate::store::LifecycleStatus;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

pub type VisitCounts = BTreeMap<VisitStatus, u64>;

pub struct VisitDashboard {
    visits: Arc<VisitStore>,
    counts: watch::Sender<VisitCounts>,
}

impl VisitDashboard {
    pub fn new(visits: Arc<VisitStore>) -> Self {
        let initial = VisitStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let (counts, _) = watch::channel(initial);
        Self { visits, counts }
    }

    /// Re-count every status for `range`. A status whose count fails keeps its previous value.
    pub async fn refresh(&self, range: DateRange) -> VisitCounts {
        let requests = VisitStatus::ALL
            .iter()
            .map(|status| self.visits.count(Some(*status), &range));
        let results = join_all(requests).await;

        self.counts.send_modify(|counts| {
            for (status, envelope) in VisitStatus::ALL.iter().zip(results) {
                if envelope.has_status(&[200]) {
                    if let Some(count) = envelope.data {
                        counts.insert(*status, count);
                    }
                } else {
                    tracing::warn!(
                        status = status.as_wire(),
                        message = %envelope.message,
                        "visit count failed; keeping previous value"
                    );
                }
            }
        });

        self.current()
    }

    pub fn current(&self) -> VisitCounts {
        self.counts.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<VisitCounts> {
        self.counts.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use chrono::NaiveDate;
    use serde_json::json;

    #[tokio::test]
    async fn refresh_counts_each_status_in_range() {
        let transport = ScriptedTransport::new();
        let visits = Arc::new(VisitStore::new(transport.client()));
        for n in [5, 2, 1, 9, 3] {
            transport.push_ok(json!({ "status": 200, "data": n }));
        }

        let dashboard = VisitDashboard::new(visits);
        let range = DateRange::between(
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        );
        let counts = dashboard.refresh(range).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 5);
        let mut total = 0;
        for request in &requests {
            assert_eq!(request.path, "visit/count");
            assert_eq!(request.query_value("startDate"), Some("2026-10-01"));
            assert_eq!(request.query_value("endDate"), Some("2026-10-18"));
            let status = VisitStatus::parse_wire(request.query_value("status").unwrap()).unwrap();
            total += counts[&status];
        }
        assert_eq!(total, 20);
    }

    #[tokio::test]
    async fn failed_count_keeps_previous_value() {
        let transport = ScriptedTransport::new();
        let visits = Arc::new(VisitStore::new(transport.client()));
        let dashboard = VisitDashboard::new(visits);

        for _ in 0..5 {
            transport.push_ok(json!({ "status": 200, "data": 4 }));
        }
        dashboard.refresh(DateRange::default()).await;

        for _ in 0..5 {
            transport.push_err(None, "timeout", None);
        }
        let counts = dashboard.refresh(DateRange::default()).await;

        assert!(counts.values().all(|count| *count == 4));
        assert_eq!(dashboard.current(), counts);
    }
}
