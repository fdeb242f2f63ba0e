//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the client and
//! stores. Nothing below the binaries reads environment variables during request handling.

use crate::constants::{DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE};
use crate::{ClinicError, ClinicResult};
use reqwest::Url;
use std::path::{Path, PathBuf};

/// Environment variable naming the API base URL.
pub const ENV_API_BASE_URL: &str = "CLINIC_API_BASE_URL";
/// Environment variable naming the persisted token file.
pub const ENV_TOKEN_FILE: &str = "CLINIC_TOKEN_FILE";
/// Environment variable overriding the default page size.
pub const ENV_PAGE_SIZE: &str = "CLINIC_PAGE_SIZE";

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: Url,
    token_file: Option<PathBuf>,
    page_size: u32,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// The base URL must be an absolute `http` or `https` URL. A trailing `/` is appended when
    /// missing so that relative endpoint paths such as `patients/active` resolve underneath it
    /// rather than replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidConfig`] if the URL does not parse, uses another scheme,
    /// or `page_size` is zero.
    pub fn new(base_url: &str, token_file: Option<PathBuf>, page_size: u32) -> ClinicResult<Self> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let base_url = Url::parse(&raw)
            .map_err(|e| ClinicError::InvalidConfig(format!("base URL '{raw}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClinicError::InvalidConfig(format!(
                "base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }

        if page_size == 0 {
            return Err(ClinicError::InvalidConfig(
                "page size must be greater than zero".into(),
            ));
        }

        Ok(Self {
            base_url,
            token_file,
            page_size,
        })
    }

    /// Resolve configuration from the process environment.
    ///
    /// Reads `CLINIC_API_BASE_URL`, `CLINIC_TOKEN_FILE` and `CLINIC_PAGE_SIZE`. Intended to be
    /// called once from a binary's `main`, after `dotenvy` has loaded any `.env` file.
    pub fn from_env() -> ClinicResult<Self> {
        Self::from_env_values(
            std::env::var(ENV_API_BASE_URL).ok(),
            std::env::var(ENV_TOKEN_FILE).ok(),
            std::env::var(ENV_PAGE_SIZE).ok(),
        )
    }

    /// Build configuration from optional raw values.
    ///
    /// Empty or whitespace-only values are treated as unset.
    pub fn from_env_values(
        base_url: Option<String>,
        token_file: Option<String>,
        page_size: Option<String>,
    ) -> ClinicResult<Self> {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let base_url = non_blank(base_url).unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let token_file = non_blank(token_file).map(PathBuf::from);
        let page_size = match non_blank(page_size) {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                ClinicError::InvalidConfig(format!("{ENV_PAGE_SIZE} '{raw}': {e}"))
            })?,
            None => DEFAULT_PAGE_SIZE,
        };

        Self::new(&base_url, token_file, page_size)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_values_are_missing() {
        let cfg = ClientConfig::from_env_values(None, None, None).expect("default config");
        assert_eq!(cfg.base_url().as_str(), DEFAULT_API_BASE_URL);
        assert_eq!(cfg.page_size(), DEFAULT_PAGE_SIZE);
        assert!(cfg.token_file().is_none());
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let cfg = ClientConfig::new("https://clinic.example/api", None, 25).expect("valid config");
        assert_eq!(cfg.base_url().as_str(), "https://clinic.example/api/");
        assert_eq!(
            cfg.base_url().join("patients/active").unwrap().as_str(),
            "https://clinic.example/api/patients/active"
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = ClientConfig::new("ftp://clinic.example", None, 10).expect_err("ftp rejected");
        assert!(matches!(err, ClinicError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = ClientConfig::from_env_values(None, None, Some("0".into()))
            .expect_err("zero page size rejected");
        assert!(matches!(err, ClinicError::InvalidConfig(_)));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = ClientConfig::from_env_values(Some("  ".into()), Some("".into()), Some(" ".into()))
            .expect("blank values ignored");
        assert_eq!(cfg.base_url().as_str(), DEFAULT_API_BASE_URL);
        assert!(cfg.token_file().is_none());
    }
}
