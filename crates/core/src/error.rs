#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error("failed to read token file: {0}")]
    TokenRead(std::io::Error),
    #[error("failed to write token file: {0}")]
    TokenWrite(std::io::Error),
    #[error("failed to remove token file: {0}")]
    TokenRemove(std::io::Error),
    #[error("malformed token: {0}")]
    TokenFormat(String),
    #[error("failed to decode token payload: {0}")]
    TokenDecode(base64::DecodeError),
    #[error("failed to parse token claims: {0}")]
    TokenClaims(serde_json::Error),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
