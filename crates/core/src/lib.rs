//! # Clinic Core
//!
//! Client-side data layer for the clinic management REST API.
//!
//! This crate owns everything between a user action and the backend:
//! - A transport abstraction with a `reqwest` implementation
//! - Response normalisation into a uniform [`Envelope`]
//! - Session token storage and claim decoding
//! - One generic [`ListStore`] instantiated per entity (patients, episodes, visits,
//!   services, staff), holding the cached page and pagination counters
//! - Toast notifications, debounced search and the visit dashboard
//!
//! **No rendering**: presentation belongs to the binaries that consume this crate.

pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod debounce;
pub mod entities;
pub mod envelope;
pub mod error;
pub mod page;
pub mod query;
pub mod session;
pub mod store;
pub mod toast;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use auth::{AuthApi, LoginData};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use dashboard::{VisitCounts, VisitDashboard};
pub use debounce::SearchDebouncer;
pub use envelope::{Envelope, Reply, Severity};
pub use error::{ClinicError, ClinicResult};
pub use page::{Page, PageRequest};
pub use query::{DateRange, ListQuery};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use store::{Endpoints, LifecycleStatus, ListState, ListStore, Resource, Route};
pub use toast::{ToastState, Toaster};
pub use transport::{ApiRequest, HttpMethod, HttpTransport, Transport, TransportError};

use entities::{EpisodeStore, PatientStore, ServiceStore, StaffStore, VisitStore};
use std::sync::Arc;

/// One store per entity, sharing a single client (and so a single session and toaster).
///
/// Built once at startup and handed to whatever needs the data.
#[derive(Clone)]
pub struct ClinicStores {
    pub patients: Arc<PatientStore>,
    pub episodes: Arc<EpisodeStore>,
    pub visits: Arc<VisitStore>,
    pub services: Arc<ServiceStore>,
    pub staff: Arc<StaffStore>,
}

impl ClinicStores {
    /// `page_size` is the size [`ListStore::refresh`] uses before a store has been fetched.
    pub fn new(client: ApiClient, page_size: u32) -> Self {
        Self {
            patients: Arc::new(PatientStore::new(client.clone()).with_page_size(page_size)),
            episodes: Arc::new(EpisodeStore::new(client.clone()).with_page_size(page_size)),
            visits: Arc::new(VisitStore::new(client.clone()).with_page_size(page_size)),
            services: Arc::new(ServiceStore::new(client.clone()).with_page_size(page_size)),
            staff: Arc::new(StaffStore::new(client).with_page_size(page_size)),
        }
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.patients.client().clone())
    }

    pub fn dashboard(&self) -> VisitDashboard {
        VisitDashboard::new(Arc::clone(&self.visits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;

    #[tokio::test]
    async fn stores_share_one_session() {
        let transport = ScriptedTransport::new();
        let stores = ClinicStores::new(transport.client(), 10);
        transport.push_ok(json!({ "status": 200, "data": [] }));

        stores.patients.client().session().set_token("abc").unwrap();
        stores.staff.fetch_all(PageRequest::first(10)).await;

        assert_eq!(transport.requests()[0].bearer.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn stores_refresh_with_the_configured_page_size() {
        let transport = ScriptedTransport::new();
        let stores = ClinicStores::new(transport.client(), 40);
        transport.push_ok(json!({ "status": 200, "data": [] }));

        stores.visits.refresh().await;

        assert_eq!(transport.requests()[0].query_value("size"), Some("40"));
    }
}
