//! Clinic staff: doctors, nurses, reception.

use super::default_active;
use crate::store::{lenient_status, Endpoints, LifecycleStatus, ListStore, Resource, Route};
use crate::transport::HttpMethod;
use clinic_types::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffStatus {
    OnDuty,
    OffDuty,
    OnLeave,
}

impl LifecycleStatus for StaffStatus {
    const ALL: &'static [Self] = &[
        StaffStatus::OnDuty,
        StaffStatus::OffDuty,
        StaffStatus::OnLeave,
    ];

    fn as_wire(self) -> &'static str {
        match self {
            StaffStatus::OnDuty => "ON_DUTY",
            StaffStatus::OffDuty => "OFF_DUTY",
            StaffStatus::OnLeave => "ON_LEAVE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<StaffStatus>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}

impl Resource for Staff {
    type Status = StaffStatus;
    type Payload = NewStaff;

    const ENDPOINTS: Endpoints = Endpoints {
        name: "staff",
        list: "staff",
        active: Some("staff/active"),
        by_status: None,
        range: None,
        search: Some("staff/search"),
        search_param: "name",
        count: Some("staff/count"),
        create: Route::new(HttpMethod::Post, "staff"),
        update: Route::new(HttpMethod::Put, "staff/{id}"),
        enable: Some(Route::new(HttpMethod::Patch, "staff/{id}/enable")),
        disable: Some(Route::new(HttpMethod::Patch, "staff/{id}/disable")),
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn status(&self) -> Option<StaffStatus> {
        self.status
    }

    fn label(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        match &self.role {
            Some(role) => format!("{name}, {role}"),
            None => name,
        }
    }
}

pub type StaffStore = ListStore<Staff>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_uses_screaming_snake_case() {
        let staff: Staff = serde_json::from_value(json!({
            "id": "st1",
            "firstName": "Grace",
            "lastName": "Hopper",
            "role": "DOCTOR",
            "status": "ON_LEAVE",
            "isActive": false,
        }))
        .unwrap();

        assert_eq!(staff.status, Some(StaffStatus::OnLeave));
        assert!(!staff.is_active);
        assert_eq!(staff.label(), "Grace Hopper, DOCTOR");
        assert_eq!(StaffStatus::OnDuty.as_wire(), "ON_DUTY");
    }
}
