//! Constants used throughout the clinic core crate.
//!
//! Timing windows and wire keys are fixed by the dashboard's behaviour and are not
//! configurable at runtime.

use std::time::Duration;

/// Default API base URL when `CLINIC_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/";

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Cookie key under which the signed session token is persisted.
pub const AUTH_COOKIE_NAME: &str = "AUTH_TOKEN";

/// Message used when neither the server nor the transport supplied one.
pub const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

/// Message used for successful responses that carry no message.
pub const FALLBACK_SUCCESS_MESSAGE: &str = "OK";

/// Status assumed when a response envelope carries none.
pub const FALLBACK_STATUS: u16 = 500;

/// How long a toast stays open before it dismisses itself.
pub const TOAST_DURATION: Duration = Duration::from_secs(5);

/// Quiescence window between the last keystroke and the search request.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Placeholder substituted with a record id in endpoint templates.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
