//! Billable clinic services (X-ray, consultation, dressing, ...).

use super::default_active;
use crate::store::{lenient_status, Endpoints, LifecycleStatus, ListStore, Resource, Route};
use crate::transport::HttpMethod;
use clinic_types::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Available,
    Retired,
}

impl LifecycleStatus for ServiceStatus {
    const ALL: &'static [Self] = &[ServiceStatus::Available, ServiceStatus::Retired];

    fn as_wire(self) -> &'static str {
        match self {
            ServiceStatus::Available => "AVAILABLE",
            ServiceStatus::Retired => "RETIRED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub charge: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<ServiceStatus>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Body of create and update requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewService {
    pub name: String,
    pub charge: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for Service {
    type Status = ServiceStatus;
    type Payload = NewService;

    const ENDPOINTS: Endpoints = Endpoints {
        name: "services",
        list: "services",
        active: Some("services/active"),
        by_status: None,
        range: None,
        search: Some("services/search"),
        search_param: "name",
        count: Some("services/count"),
        create: Route::new(HttpMethod::Post, "services"),
        update: Route::new(HttpMethod::Put, "services/{id}"),
        enable: Some(Route::new(HttpMethod::Patch, "services/{id}/enable")),
        disable: Some(Route::new(HttpMethod::Patch, "services/{id}/disable")),
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn status(&self) -> Option<ServiceStatus> {
        self.status
    }

    fn label(&self) -> String {
        format!("{} ({:.2})", self.name, self.charge)
    }
}

pub type ServiceStore = ListStore<Service>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_minimal_wire_record() {
        let service: Service = serde_json::from_value(json!({
            "id": "s1",
            "name": "X-Ray",
            "charge": 500,
        }))
        .expect("service decodes");

        assert_eq!(service.charge, 500.0);
        assert!(service.is_active);
        assert!(service.status.is_none());
        assert_eq!(service.label(), "X-Ray (500.00)");
    }

    #[test]
    fn status_parses_any_case() {
        assert_eq!(
            ServiceStatus::parse_wire("retired"),
            Some(ServiceStatus::Retired)
        );
        assert_eq!(ServiceStatus::parse_wire("gone"), None);
    }
}
