//! Service-account authentication for the Admin SDK.
//!
//! Loads a Google service-account key file, signs an RS256 JWT assertion
//! that impersonates an admin (domain-wide delegation), and exchanges it at
//! the key's `token_uri` for a bearer token using the
//! `urn:ietf:params:oauth:grant-type:jwt-bearer` grant.
//!
//! The token is fetched once at startup. A CLI run finishes well inside the
//! one-hour token lifetime, so there is no refresh-on-expiry path.
//!
//! Failure modes, in the order they are checked:
//! - the file does not exist → [`CbcmError::CredentialsMissing`]
//! - the file is not JSON, lacks `client_id`, `client_email` or
//!   `private_key`, or the key is not an RSA PEM →
//!   [`CbcmError::CredentialsInvalid`]
//! - the token endpoint answers non-2xx → [`CbcmError::RefreshRejected`]

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::{CbcmError, Result};

/// OAuth scope for Chrome browser device management.
pub const SCOPES: &[&str] =
    &["https://www.googleapis.com/auth/admin.directory.device.chromebrowsers"];

/// Used when the key file does not carry its own `token_uri`.
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Maximum lifetime Google accepts for a signed assertion.
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Token requests are small; keep their timeout short.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// On-disk layout of a service-account key. Every field is optional here so
/// validation can report which one is missing.
#[derive(Deserialize)]
struct KeyFile {
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

/// A validated service-account key.
#[derive(Clone)]
pub struct ServiceAccountKey {
    /// Numeric OAuth client ID; this is what the admin console asks for
    /// when granting delegation.
    pub client_id: String,
    /// Service account email, used as the assertion issuer.
    pub client_email: String,
    /// Identifies the signing key; sent as the JWT `kid` header.
    pub private_key_id: Option<String>,
    /// Token endpoint the assertion is exchanged at.
    pub token_uri: String,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_id", &self.client_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Reads and validates a key file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CbcmError::CredentialsMissing {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read(path).map_err(|err| invalid(path, err.to_string()))?;
        Self::from_json(path, &content)
    }

    /// Validates key material already read from `path`. `path` is only used
    /// in error messages.
    pub fn from_json(path: &Path, content: &[u8]) -> Result<Self> {
        let file: KeyFile =
            serde_json::from_slice(content).map_err(|err| invalid(path, format!("{err}")))?;

        let client_id = require(path, file.client_id, "client_id")?;
        let client_email = require(path, file.client_email, "client_email")?;
        let private_key = require(path, file.private_key, "private_key")?;
        let encoding_key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|err| invalid(path, format!("private_key is not an RSA key: {err}")))?;

        Ok(ServiceAccountKey {
            client_id,
            client_email,
            private_key_id: file.private_key_id.filter(|id| !id.is_empty()),
            token_uri: file
                .token_uri
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            encoding_key,
        })
    }
}

fn invalid(path: &Path, reason: String) -> CbcmError {
    CbcmError::CredentialsInvalid {
        path: PathBuf::from(path),
        reason,
    }
}

fn require(path: &Path, value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(invalid(path, format!("no {field} present"))),
    }
}

/// Claims of the signed assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Service account email.
    pub iss: String,
    /// Admin being impersonated.
    pub sub: String,
    /// Space-separated scopes.
    pub scope: String,
    /// Token endpoint.
    pub aud: String,
    /// Issued-at, seconds since the epoch.
    pub iat: u64,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
}

/// Form body sent to the token endpoint.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    grant_type: &'a str,
    assertion: &'a str,
}

/// Subset of the token response that we need.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Always `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Acquires access tokens for one service account acting as one admin.
pub struct TokenProvider {
    client: reqwest::Client,
    key: ServiceAccountKey,
    subject: String,
    scopes: Vec<String>,
}

impl TokenProvider {
    /// `subject` is the admin email to impersonate.
    pub fn new(key: ServiceAccountKey, subject: &str, scopes: &[&str]) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()?;
        Ok(TokenProvider {
            client,
            key,
            subject: subject.to_string(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Builds the signed JWT assertion issued at `issued_at` (epoch seconds).
    pub fn assertion(&self, issued_at: u64) -> Result<String> {
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            sub: self.subject.clone(),
            scope: self.scopes.join(" "),
            aud: self.key.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.key.encoding_key).map_err(|err| {
            CbcmError::Auth {
                message: "failed to sign token assertion".to_string(),
                source: Some(Box::new(err)),
            }
        })
    }

    /// Exchanges a fresh assertion for an access token.
    ///
    /// The body is read as text before the status check so the endpoint's
    /// `error_description` survives into [`CbcmError::RefreshRejected`].
    pub async fn fetch_token(&self) -> Result<TokenResponse> {
        let assertion = self.assertion(unix_now())?;
        let form = TokenRequest {
            grant_type: JWT_BEARER_GRANT,
            assertion: &assertion,
        };

        tracing::debug!(
            token_uri = %self.key.token_uri,
            subject = %self.subject,
            "requesting access token"
        );
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CbcmError::RefreshRejected {
                status,
                body,
                client_id: self.key.client_id.clone(),
                scopes: self.scopes.clone(),
            });
        }

        serde_json::from_str(&body).map_err(|err| CbcmError::Auth {
            message: "token endpoint returned an unexpected body".to_string(),
            source: Some(Box::new(err)),
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
