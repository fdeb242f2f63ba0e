//! Session token storage and claim decoding.
//!
//! The server issues a signed token at login. The client persists it under the
//! `AUTH_TOKEN` key and reads three claims from it: `sub` (username), `role` and `exp`.
//! Claims are decoded, never verified. Signature checks are the server's job; the client
//! only needs to know who it is showing and whether to bother sending the token.
//!
//! The token is shared process-wide through [`Session`] and read at call time, so a token
//! cleared by a 401 response takes effect on the very next request.

use crate::constants::AUTH_COOKIE_NAME;
use crate::{ClinicError, ClinicResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Somewhere to keep the session token between requests.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> ClinicResult<Option<String>>;
    fn save(&self, token: &str) -> ClinicResult<()>;
    fn clear(&self) -> ClinicResult<()>;
}

/// Token kept only for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClinicResult<Option<String>> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> ClinicResult<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ClinicResult<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Token persisted to a small cookie file as a single `AUTH_TOKEN=<token>` line.
///
/// This is what lets successive CLI invocations share one login.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClinicResult<Option<String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClinicError::TokenRead(e)),
        };

        let prefix = format!("{AUTH_COOKIE_NAME}=");
        Ok(contents
            .lines()
            .filter_map(|line| line.trim().strip_prefix(prefix.as_str()))
            .map(str::trim)
            .find(|token| !token.is_empty())
            .map(str::to_string))
    }

    fn save(&self, token: &str) -> ClinicResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ClinicError::TokenWrite)?;
        }
        std::fs::write(&self.path, format!("{AUTH_COOKIE_NAME}={token}\n"))
            .map_err(ClinicError::TokenWrite)
    }

    fn clear(&self) -> ClinicResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClinicError::TokenRemove(e)),
        }
    }
}

/// Claims the client reads from the session token.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Tokens without an `exp` claim never expire client-side.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// Decode the claims of a compact JWS token without verifying its signature.
///
/// # Errors
///
/// - [`ClinicError::TokenFormat`] if the token does not have three dot-separated segments
/// - [`ClinicError::TokenDecode`] if the payload segment is not base64url
/// - [`ClinicError::TokenClaims`] if the payload is not a JSON object with a `sub` claim
pub fn decode_claims(token: &str) -> ClinicResult<Claims> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 || segments[1].is_empty() {
        return Err(ClinicError::TokenFormat(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(ClinicError::TokenDecode)?;
    serde_json::from_slice(&payload).map_err(ClinicError::TokenClaims)
}

/// Shared handle on the current session token.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Session backed by a cookie file when a path is given, otherwise in memory.
    pub fn for_token_file(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::new(Arc::new(FileTokenStore::new(path))),
            None => Self::in_memory(),
        }
    }

    /// Current token. A store that cannot be read counts as "no token".
    pub fn token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("could not read session token: {e}");
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) -> ClinicResult<()> {
        self.store.save(token)
    }

    /// Forget the token. Failures are logged; the caller has nothing useful to do with them.
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("could not clear session token: {e}");
        }
    }

    /// Claims of the current token, if there is one and it decodes.
    pub fn claims(&self) -> Option<Claims> {
        let token = self.token()?;
        match decode_claims(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("session token did not decode: {e}");
                None
            }
        }
    }

    /// True when a decodable, unexpired token is present.
    pub fn is_authenticated(&self) -> bool {
        self.claims()
            .is_some_and(|claims| !claims.is_expired_at(Utc::now()))
    }

    pub fn username(&self) -> Option<String> {
        self.claims().map(|c| c.sub)
    }

    pub fn role(&self) -> Option<String> {
        self.claims().and_then(|c| c.role)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn token_with_claims(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
