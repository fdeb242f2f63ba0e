//! Login and logout.

use crate::client::ApiClient;
use crate::envelope::Envelope;
use crate::transport::ApiRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const LOGIN_PATH: &str = "auth/login";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Payload of a successful login: the session token plus whatever user fields the server
/// sends alongside it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LoginData {
    pub token: String,
    #[serde(flatten)]
    pub user: Map<String, Value>,
}

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a session token and store it.
    ///
    /// The token is stored only for a status 200 envelope that carries one. A token that
    /// cannot be persisted turns the result into an error envelope. One toast is raised, for
    /// the final result.
    pub async fn login(&self, email: &str, password: &str) -> Envelope<LoginData> {
        let body = match serde_json::to_value(LoginRequest { email, password }) {
            Ok(body) => body,
            Err(e) => return self.client.reject(400, format!("Invalid credentials: {e}")),
        };

        let mut envelope: Envelope<LoginData> = self
            .client
            .exchange(ApiRequest::post(LOGIN_PATH).json(body))
            .await
            .decode();

        let stored = match envelope.data.as_ref() {
            Some(login) if envelope.has_status(&[200]) => {
                Some(self.client.session().set_token(&login.token))
            }
            _ => None,
        };
        match stored {
            Some(Ok(())) => tracing::info!(
                user = self.client.session().username().as_deref().unwrap_or("unknown"),
                "logged in"
            ),
            Some(Err(e)) => {
                envelope = Envelope::failure(500, format!("Could not store session: {e}"));
                tracing::warn!(message = %envelope.message, "login token not stored");
            }
            None => {}
        }

        self.client.notify(&envelope);
        envelope
    }

    /// Forget the session token locally.
    pub fn logout(&self) {
        self.client.session().clear();
        tracing::info!("logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Severity;
    use crate::session::{token_with_claims, FileTokenStore, Session};
    use crate::test_support::ScriptedTransport;
    use crate::toast::Toaster;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn login_stores_token_and_exposes_claims() {
        let transport = ScriptedTransport::new();
        let client = transport.client();
        let token = token_with_claims(json!({ "sub": "dr.ada", "role": "DOCTOR" }));
        transport.push_ok(json!({
            "status": 200,
            "severity": "Success",
            "message": "Welcome back",
            "data": { "token": token, "name": "Ada", "email": "ada@clinic.test" },
        }));

        let auth = AuthApi::new(client.clone());
        let env = auth.login("ada@clinic.test", "secret").await;

        assert_eq!(env.severity, Severity::Success);
        let data = env.data.expect("login data");
        assert_eq!(data.user.get("name"), Some(&json!("Ada")));
        assert!(client.session().is_authenticated());
        assert_eq!(client.session().username().as_deref(), Some("dr.ada"));
        assert_eq!(client.session().role().as_deref(), Some("DOCTOR"));

        let request = &transport.requests()[0];
        assert_eq!(request.path, "auth/login");
        assert_eq!(
            request.body,
            Some(json!({ "email": "ada@clinic.test", "password": "secret" }))
        );

        auth.logout();
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn failed_login_stores_nothing() {
        let transport = ScriptedTransport::new();
        let client = transport.client();
        transport.push_err(
            Some(401),
            "Request failed with status code 401",
            Some(json!({ "message": "Invalid email or password" })),
        );

        let env = AuthApi::new(client.clone()).login("x@y.z", "nope").await;

        assert_eq!(env.status, 401);
        assert_eq!(env.message, "Invalid email or password");
        assert!(client.session().token().is_none());
    }

    #[tokio::test]
    async fn unstorable_token_toasts_the_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = FileTokenStore::new(blocker.join("token"));

        let transport = ScriptedTransport::new();
        let client = ApiClient::new(
            transport.clone(),
            Session::new(Arc::new(store)),
            Toaster::new(),
        );
        transport.push_ok(json!({
            "status": 200,
            "severity": "success",
            "message": "Welcome back",
            "data": { "token": token_with_claims(json!({ "sub": "ada" })) },
        }));

        let env = AuthApi::new(client.clone()).login("ada@clinic.test", "secret").await;

        assert_eq!(env.status, 500);
        assert_eq!(env.severity, Severity::Error);
        assert!(env.message.starts_with("Could not store session"));
        assert!(env.data.is_none());
        let toast = client.toaster().current();
        assert_eq!(toast.message, env.message);
        assert_eq!(toast.severity, Severity::Error);
    }
}
