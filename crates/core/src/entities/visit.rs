//! Patient visits and their lifecycle.
//!
//! ```text
//! SCHEDULED ──> ONGOING ──> COMPLETED
//!     │    └──> PENDING ──┘
//!     └─────────┴───────────> CANCELLED
//! ```
//!
//! `COMPLETED` and `CANCELLED` are terminal. The server is authoritative: the client only
//! warns when a requested transition looks invalid for the cached status, it never blocks it.

use super::default_active;
use crate::envelope::Reply;
use crate::store::{lenient_status, Endpoints, LifecycleStatus, ListStore, Resource, Route};
use crate::transport::HttpMethod;
use chrono::NaiveDate;
use clinic_types::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Scheduled,
    Ongoing,
    Pending,
    Completed,
    Cancelled,
}

impl VisitStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, VisitStatus::Completed | VisitStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: VisitStatus) -> bool {
        use VisitStatus::*;
        match (self, next) {
            (Scheduled, Ongoing | Pending) => true,
            (Ongoing | Pending, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl LifecycleStatus for VisitStatus {
    const ALL: &'static [Self] = &[
        VisitStatus::Scheduled,
        VisitStatus::Ongoing,
        VisitStatus::Pending,
        VisitStatus::Completed,
        VisitStatus::Cancelled,
    ];

    fn as_wire(self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "SCHEDULED",
            VisitStatus::Ongoing => "ONGOING",
            VisitStatus::Pending => "PENDING",
            VisitStatus::Completed => "COMPLETED",
            VisitStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: RecordId,
    pub patient_id: RecordId,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub episode_id: Option<RecordId>,
    #[serde(default)]
    pub staff_id: Option<RecordId>,
    #[serde(default)]
    pub visit_date: Option<NaiveDate>,
    #[serde(default)]
    pub visit_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<VisitStatus>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisit {
    pub patient_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<RecordId>,
    pub visit_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const START: Route = Route::new(HttpMethod::Put, "visit/start/{id}");
const COMPLETE: Route = Route::new(HttpMethod::Put, "visit/complete/{id}");
const CANCEL: Route = Route::new(HttpMethod::Put, "visit/cancel/{id}");

impl Resource for Visit {
    type Status = VisitStatus;
    type Payload = NewVisit;

    const ENDPOINTS: Endpoints = Endpoints {
        name: "visits",
        list: "visit",
        active: None,
        by_status: Some("visit/status"),
        range: Some("visit"),
        search: Some("visit/search"),
        search_param: "query",
        count: Some("visit/count"),
        create: Route::new(HttpMethod::Post, "visit"),
        update: Route::new(HttpMethod::Put, "visit/update/{id}"),
        enable: None,
        disable: None,
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn status(&self) -> Option<VisitStatus> {
        self.status
    }

    fn label(&self) -> String {
        let who = self
            .patient_name
            .clone()
            .unwrap_or_else(|| format!("patient {}", self.patient_id));
        match self.visit_date {
            Some(date) => format!("{who} on {date}"),
            None => who,
        }
    }
}

pub type VisitStore = ListStore<Visit>;

impl ListStore<Visit> {
    /// Move a scheduled visit to `ONGOING`.
    pub async fn start(&self, id: &RecordId) -> Reply {
        self.warn_if_invalid(id, VisitStatus::Ongoing);
        self.action(START, id, None).await
    }

    pub async fn complete(&self, id: &RecordId) -> Reply {
        self.warn_if_invalid(id, VisitStatus::Completed);
        self.action(COMPLETE, id, None).await
    }

    pub async fn cancel(&self, id: &RecordId) -> Reply {
        self.warn_if_invalid(id, VisitStatus::Cancelled);
        self.action(CANCEL, id, None).await
    }

    fn warn_if_invalid(&self, id: &RecordId, next: VisitStatus) {
        let current = self.find(id).and_then(|visit| visit.status);
        if let Some(current) = current {
            if !current.can_transition_to(next) {
                tracing::warn!(
                    visit = %id,
                    from = current.as_wire(),
                    to = next.as_wire(),
                    "visit transition looks invalid for cached status; sending anyway"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageRequest;
    use crate::query::DateRange;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;

    #[test]
    fn lifecycle_allows_documented_transitions() {
        use VisitStatus::*;
        assert!(Scheduled.can_transition_to(Ongoing));
        assert!(Scheduled.can_transition_to(Pending));
        assert!(Ongoing.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(Ongoing.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(Cancelled));
    }

    #[test]
    fn lifecycle_rejects_leaving_terminal_states() {
        use VisitStatus::*;
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Ongoing));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(!Ongoing.can_transition_to(Scheduled));
    }

    fn visit(id: &str, status: &str) -> serde_json::Value {
        json!({ "id": id, "patientId": "p1", "status": status, "visitDate": "2026-03-01" })
    }

    #[tokio::test]
    async fn transitions_hit_their_routes_and_leave_items_alone() {
        let transport = ScriptedTransport::new();
        let store = VisitStore::new(transport.client());
        transport.push_ok(json!({ "status": 200, "data": [visit("v1", "SCHEDULED")] }));
        store.fetch_all(PageRequest::new(0, 10)).await;

        let id = RecordId::parse("v1").unwrap();
        transport.push_ok(json!({ "status": 200, "message": "Visit started" }));
        transport.push_ok(json!({ "status": 200, "message": "Visit completed" }));
        transport.push_ok(json!({ "status": 200, "message": "Visit cancelled" }));

        assert_eq!(store.start(&id).await.message, "Visit started");
        assert_eq!(store.complete(&id).await.message, "Visit completed");
        assert_eq!(store.cancel(&id).await.message, "Visit cancelled");

        let paths: Vec<String> = transport.requests()[1..]
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect();
        assert_eq!(
            paths,
            vec![
                "PUT visit/start/v1",
                "PUT visit/complete/v1",
                "PUT visit/cancel/v1",
            ]
        );
        assert_eq!(
            store.snapshot().items[0].status,
            Some(VisitStatus::Scheduled)
        );
    }

    #[tokio::test]
    async fn status_filter_and_range_use_visit_paths() {
        let transport = ScriptedTransport::new();
        let store = VisitStore::new(transport.client());
        transport.push_ok(json!({ "status": 200, "data": [visit("v2", "PENDING")] }));
        transport.push_ok(json!({ "status": 200, "data": [] }));

        store
            .fetch_by_status(VisitStatus::Pending, PageRequest::new(0, 10))
            .await;
        let range = DateRange::between(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        );
        store.fetch_by_range(range, PageRequest::new(0, 10)).await;

        let requests = transport.requests();
        assert_eq!(requests[0].path, "visit/status");
        assert_eq!(requests[0].query_value("status"), Some("PENDING"));
        assert_eq!(requests[1].path, "visit");
        assert_eq!(requests[1].query_value("startDate"), Some("2026-03-01"));
        assert_eq!(requests[1].query_value("endDate"), Some("2026-03-31"));
    }

    #[tokio::test]
    async fn half_open_range_sends_no_date_parameters() {
        let transport = ScriptedTransport::new();
        let store = VisitStore::new(transport.client());
        transport.push_ok(json!({ "status": 200, "data": [] }));
        transport.push_ok(json!({ "status": 200, "data": 4 }));

        let range = DateRange::new(NaiveDate::from_ymd_opt(2026, 3, 1), None);
        store.fetch_by_range(range, PageRequest::new(0, 10)).await;
        store.count(Some(VisitStatus::Scheduled), &range).await;

        let requests = transport.requests();
        for request in &requests {
            assert_eq!(request.query_value("startDate"), None);
            assert_eq!(request.query_value("endDate"), None);
        }
        assert_eq!(requests[1].path, "visit/count");
        assert_eq!(requests[1].query_value("status"), Some("SCHEDULED"));
    }

    #[tokio::test]
    async fn visits_cannot_be_disabled() {
        let transport = ScriptedTransport::new();
        let store = VisitStore::new(transport.client());

        let env = store.disable(&RecordId::parse("v1").unwrap()).await;
        assert_eq!(env.status, 405);
        assert_eq!(transport.request_count(), 0);
    }
}
