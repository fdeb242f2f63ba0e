//! Response envelope normalisation.
//!
//! Every API response, successful or not, is normalised into an [`Envelope`] at the client
//! boundary:
//! - `severity` is matched case-insensitively and stored lowercase; unknown values become
//!   [`Severity::Info`]
//! - a missing `status` becomes 500
//! - a missing `message` becomes a fixed fallback
//! - transport failures become error envelopes instead of `Err` values
//!
//! Callers therefore never handle transport errors directly; they inspect the envelope.

use crate::constants::{FALLBACK_ERROR_MESSAGE, FALLBACK_STATUS, FALLBACK_SUCCESS_MESSAGE};
use crate::transport::TransportError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Toast severity attached to every envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    /// Parse a wire severity, ignoring case and surrounding whitespace.
    ///
    /// Unrecognised values map to [`Severity::Info`].
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Severity::Success,
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform result of every API operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope<T> {
    pub status: u16,
    pub severity: Severity,
    pub message: String,
    pub data: Option<T>,
}

/// Envelope whose payload has not been decoded into a typed record.
pub type Reply = Envelope<Value>;

impl<T> Envelope<T> {
    /// Build an error envelope that did not come from the server.
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            severity: Severity::Error,
            message: message.into(),
            data: None,
        }
    }

    /// True if `status` is one of `accepted`.
    ///
    /// Stores use this rather than a blanket 2xx check because the accepted codes differ per
    /// operation (a fetch accepts 200, a create accepts 200 or 201).
    pub fn has_status(&self, accepted: &[u16]) -> bool {
        accepted.contains(&self.status)
    }

    /// True for a 2xx status that the server did not flag as an error.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.severity != Severity::Error
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            status: self.status,
            severity: self.severity,
            message: self.message,
            data: self.data.map(f),
        }
    }

    /// Keep status, severity and message but drop the payload.
    pub fn without_data<U>(self) -> Envelope<U> {
        Envelope {
            status: self.status,
            severity: self.severity,
            message: self.message,
            data: None,
        }
    }
}

/// Envelope as it appears on the wire; every field is optional.
#[derive(Debug, Default, Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl WireEnvelope {
    fn parse(body: Option<&Value>) -> Self {
        body.cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

/// Pull a non-blank `message` string out of an arbitrary JSON body.
fn body_message(body: Option<&Value>) -> Option<String> {
    body.and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

impl Envelope<Value> {
    /// Normalise a response the transport accepted (2xx).
    ///
    /// The envelope status comes from the body, not the HTTP status line, so a 2xx response
    /// carrying an application-level error status is still reported as a failure.
    pub fn from_response(body: Option<Value>) -> Self {
        let wire = WireEnvelope::parse(body.as_ref());
        let status = wire.status.unwrap_or(FALLBACK_STATUS);
        let ok = (200..300).contains(&status);

        let severity = match wire.severity.as_deref() {
            Some(raw) => Severity::from_wire(raw),
            None if ok => Severity::Success,
            None => Severity::Error,
        };

        let message = wire
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if ok {
                    FALLBACK_SUCCESS_MESSAGE.into()
                } else {
                    FALLBACK_ERROR_MESSAGE.into()
                }
            });

        Self {
            status,
            severity,
            message,
            data: wire.data.filter(|d| !d.is_null()),
        }
    }

    /// Normalise a transport failure.
    ///
    /// Status comes from the transport (500 when absent). Message precedence: server body
    /// `message`, then the transport's own message, then the fixed fallback.
    pub fn from_transport_error(err: TransportError) -> Self {
        let message = body_message(err.body.as_ref())
            .or_else(|| Some(err.message.trim().to_string()).filter(|m| !m.is_empty()))
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.into());

        Self::failure(err.status.unwrap_or(FALLBACK_STATUS), message)
    }

    /// Decode the JSON payload into `T`.
    ///
    /// A payload that does not decode yields an error envelope with status 500; the original
    /// status and message are logged, not returned.
    pub fn decode<T: DeserializeOwned>(self) -> Envelope<T> {
        let Some(data) = self.data.clone() else {
            return self.without_data();
        };

        match serde_json::from_value::<T>(data) {
            Ok(decoded) => Envelope {
                status: self.status,
                severity: self.severity,
                message: self.message,
                data: Some(decoded),
            },
            Err(e) => {
                tracing::warn!(
                    status = self.status,
                    message = %self.message,
                    "response payload did not decode: {e}"
                );
                Envelope::failure(FALLBACK_STATUS, format!("Malformed response: {e}"))
            }
        }
    }
}
