//! Patients registered with the clinic.

use super::default_active;
use crate::store::{lenient_status, Endpoints, LifecycleStatus, ListStore, Resource, Route};
use crate::transport::HttpMethod;
use chrono::NaiveDate;
use clinic_types::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientStatus {
    Active,
    Inactive,
    Deceased,
}

impl LifecycleStatus for PatientStatus {
    const ALL: &'static [Self] = &[
        PatientStatus::Active,
        PatientStatus::Inactive,
        PatientStatus::Deceased,
    ];

    fn as_wire(self) -> &'static str {
        match self {
            PatientStatus::Active => "ACTIVE",
            PatientStatus::Inactive => "INACTIVE",
            PatientStatus::Deceased => "DECEASED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<PatientStatus>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Resource for Patient {
    type Status = PatientStatus;
    type Payload = NewPatient;

    const ENDPOINTS: Endpoints = Endpoints {
        name: "patients",
        list: "patients",
        active: Some("patients/active"),
        by_status: None,
        range: None,
        search: Some("patients/search"),
        search_param: "name",
        count: Some("patients/count"),
        create: Route::new(HttpMethod::Post, "patients"),
        update: Route::new(HttpMethod::Put, "patients/{id}"),
        enable: Some(Route::new(HttpMethod::Patch, "patients/{id}/enable")),
        disable: Some(Route::new(HttpMethod::Patch, "patients/{id}/disable")),
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn status(&self) -> Option<PatientStatus> {
        self.status
    }

    fn label(&self) -> String {
        match &self.phone {
            Some(phone) => format!("{} ({phone})", self.full_name()),
            None => self.full_name(),
        }
    }
}

pub type PatientStore = ListStore<Patient>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageRequest;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;

    #[test]
    fn payload_omits_unset_fields() {
        let payload = NewPatient {
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            gender: None,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 2),
            phone: None,
            email: None,
            address: None,
        };

        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            body,
            json!({ "firstName": "Ada", "lastName": "Obi", "dateOfBirth": "1990-04-02" })
        );
    }

    #[tokio::test]
    async fn search_uses_name_parameter() {
        let transport = ScriptedTransport::new();
        let store = PatientStore::new(transport.client());
        transport.push_ok(json!({
            "status": 200,
            "data": [{ "id": 7, "firstName": "Ada", "lastName": "Obi", "status": "ACTIVE" }],
        }));

        store.search("ada", PageRequest::new(0, 10)).await;

        let request = &transport.requests()[0];
        assert_eq!(request.path, "patients/search");
        assert_eq!(request.query_value("name"), Some("ada"));

        let patient = &store.snapshot().items[0];
        assert_eq!(patient.id.as_str(), "7");
        assert_eq!(patient.full_name(), "Ada Obi");
        assert_eq!(patient.status, Some(PatientStatus::Active));
    }
}
