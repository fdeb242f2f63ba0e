//! Entity definitions: wire records, status enums, write payloads and endpoint tables.
//!
//! Each entity instantiates the generic [`crate::store::ListStore`]; entity-specific
//! transitions are added as inherent methods on that instantiation.

pub mod episode;
pub mod patient;
pub mod service;
pub mod staff;
pub mod visit;

pub use episode::{BillingMode, Episode, EpisodeStatus, EpisodeStore, NewEpisode};
pub use patient::{NewPatient, Patient, PatientStatus, PatientStore};
pub use service::{NewService, Service, ServiceStatus, ServiceStore};
pub use staff::{NewStaff, Staff, StaffStatus, StaffStore};
pub use visit::{NewVisit, Visit, VisitStatus, VisitStore};

/// Records without an `isActive` flag on the wire are active.
pub(crate) fn default_active() -> bool {
    true
}
