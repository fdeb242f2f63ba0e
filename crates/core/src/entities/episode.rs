//! Episodes of care: a course of treatment grouping several visits under one billing mode.

use super::default_active;
use crate::envelope::Reply;
use crate::store::{
    lenient_status, lenient_wire, Endpoints, LifecycleStatus, ListStore, Resource, Route,
};
use crate::transport::HttpMethod;
use chrono::NaiveDate;
use clinic_types::{NonEmptyText, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EpisodeStatus {
    Open,
    OnHold,
    Closed,
    Cancelled,
}

impl LifecycleStatus for EpisodeStatus {
    const ALL: &'static [Self] = &[
        EpisodeStatus::Open,
        EpisodeStatus::OnHold,
        EpisodeStatus::Closed,
        EpisodeStatus::Cancelled,
    ];

    fn as_wire(self) -> &'static str {
        match self {
            EpisodeStatus::Open => "OPEN",
            EpisodeStatus::OnHold => "ON_HOLD",
            EpisodeStatus::Closed => "CLOSED",
            EpisodeStatus::Cancelled => "CANCELLED",
        }
    }
}

/// How an episode is charged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    PerVisit,
    Package,
    Insurance,
}

impl BillingMode {
    pub const ALL: &'static [BillingMode] =
        &[BillingMode::PerVisit, BillingMode::Package, BillingMode::Insurance];

    pub fn as_wire(self) -> &'static str {
        match self {
            BillingMode::PerVisit => "PER_VISIT",
            BillingMode::Package => "PACKAGE",
            BillingMode::Insurance => "INSURANCE",
        }
    }

    pub fn parse_wire(raw: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_wire().eq_ignore_ascii_case(raw.trim()))
    }
}

fn lenient_billing_mode<'de, D>(deserializer: D) -> Result<Option<BillingMode>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient_wire(deserializer, BillingMode::parse_wire)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: RecordId,
    pub patient_id: RecordId,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub episode_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_billing_mode")]
    pub billing_mode: Option<BillingMode>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<EpisodeStatus>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEpisode {
    pub patient_id: RecordId,
    pub episode_type: String,
    pub billing_mode: BillingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const CHANGE_STATUS: Route = Route::new(HttpMethod::Patch, "episodes/{id}/status");
const CHANGE_TYPE: Route = Route::new(HttpMethod::Patch, "episodes/{id}/type");
const CHANGE_BILLING_MODE: Route = Route::new(HttpMethod::Patch, "episodes/{id}/billing-mode");
const DELETE: Route = Route::new(HttpMethod::Delete, "episodes/{id}/delete");

impl Resource for Episode {
    type Status = EpisodeStatus;
    type Payload = NewEpisode;

    const ENDPOINTS: Endpoints = Endpoints {
        name: "episodes",
        list: "episodes",
        active: Some("episodes/active"),
        by_status: None,
        range: None,
        search: Some("episodes/search"),
        search_param: "query",
        count: Some("episodes/count"),
        create: Route::new(HttpMethod::Post, "episodes"),
        update: Route::new(HttpMethod::Put, "episodes/{id}"),
        enable: None,
        disable: None,
    };

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn status(&self) -> Option<EpisodeStatus> {
        self.status
    }

    fn label(&self) -> String {
        let kind = self.episode_type.as_deref().unwrap_or("episode");
        match &self.patient_name {
            Some(name) => format!("{kind} for {name}"),
            None => format!("{kind} for patient {}", self.patient_id),
        }
    }
}

pub type EpisodeStore = ListStore<Episode>;

impl ListStore<Episode> {
    pub async fn change_status(&self, id: &RecordId, status: EpisodeStatus) -> Reply {
        self.action(CHANGE_STATUS, id, Some(json!({ "status": status.as_wire() })))
            .await
    }

    pub async fn change_type(&self, id: &RecordId, episode_type: &NonEmptyText) -> Reply {
        self.action(
            CHANGE_TYPE,
            id,
            Some(json!({ "episodeType": episode_type.as_str() })),
        )
        .await
    }

    pub async fn change_billing_mode(&self, id: &RecordId, mode: BillingMode) -> Reply {
        self.action(
            CHANGE_BILLING_MODE,
            id,
            Some(json!({ "billingMode": mode.as_wire() })),
        )
        .await
    }

    /// Soft-delete an episode. Like the other transitions, the cached list is not patched.
    pub async fn delete(&self, id: &RecordId) -> Reply {
        self.action(DELETE, id, None).await
    }
}
