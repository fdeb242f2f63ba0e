//! Remote resource client.
//!
//! [`ApiClient`] turns one logical operation into exactly one transport call and always
//! resolves to an [`Envelope`]. Cross-cutting response handling lives here rather than in
//! the stores:
//! - a 401 response clears the session token
//! - every completed call raises exactly one toast

use crate::config::ClientConfig;
use crate::constants::ID_PLACEHOLDER;
use crate::envelope::{Envelope, Reply, Severity};
use crate::session::Session;
use crate::toast::Toaster;
use crate::transport::{ApiRequest, HttpTransport, Transport};
use crate::ClinicResult;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Substitute `id` for the `{id}` placeholder in an endpoint template.
///
/// The id is inserted verbatim; callers pass a [`clinic_types::RecordId`], which cannot
/// contain a path separator.
pub fn fill_path(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Session,
    toaster: Toaster,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Session, toaster: Toaster) -> Self {
        Self {
            transport,
            session,
            toaster,
        }
    }

    /// Client over HTTP with the session store chosen by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> ClinicResult<Self> {
        let transport = HttpTransport::new(config.base_url().clone())?;
        Ok(Self::new(
            Arc::new(transport),
            Session::for_token_file(config.token_file()),
            Toaster::new(),
        ))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn toaster(&self) -> &Toaster {
        &self.toaster
    }

    /// Send one request and normalise whatever comes back.
    ///
    /// The session token is read now, not when the request was built.
    pub async fn send(&self, request: ApiRequest) -> Reply {
        let envelope = self.exchange(request).await;
        self.notify(&envelope);
        envelope
    }

    /// Like [`ApiClient::send`], but decodes the payload into `T` before the toast is raised,
    /// so a payload that fails to decode is reported as the error it becomes.
    pub async fn send_decoded<T: DeserializeOwned>(&self, request: ApiRequest) -> Envelope<T> {
        let envelope = self.exchange(request).await.decode();
        self.notify(&envelope);
        envelope
    }

    /// One transport round trip, normalised, with the 401 side effect applied but no toast.
    pub(crate) async fn exchange(&self, request: ApiRequest) -> Reply {
        let request = request.bearer(self.session.token());
        let request_id = request.request_id;
        let method = request.method;
        let path = request.path.clone();

        tracing::debug!(%request_id, %method, %path, "sending request");

        let envelope = match self.transport.send(request).await {
            Ok(raw) => Envelope::from_response(raw.body),
            Err(err) => Envelope::from_transport_error(err),
        };

        if envelope.status == 401 {
            tracing::warn!(%request_id, %path, "unauthorised response; clearing session token");
            self.session.clear();
        }

        if envelope.severity == Severity::Error {
            tracing::warn!(
                %request_id,
                %method,
                %path,
                status = envelope.status,
                message = %envelope.message,
                "request failed"
            );
        } else {
            tracing::debug!(%request_id, status = envelope.status, "request completed");
        }

        envelope
    }

    /// Raise the toast for an envelope produced locally, without a network call.
    pub(crate) fn reject<T>(&self, status: u16, message: impl Into<String>) -> Envelope<T> {
        let envelope = Envelope::failure(status, message);
        tracing::warn!(status, message = %envelope.message, "request rejected before sending");
        self.notify(&envelope);
        envelope
    }

    pub(crate) fn notify<T>(&self, envelope: &Envelope<T>) {
        self.toaster
            .show(envelope.message.clone(), envelope.severity);
    }
}
