//! Typed error hierarchy for the cbcm crate.
//!
//! Variants follow the boundaries the tool crosses:
//! - Local preconditions (`CredentialsMissing`, `CredentialsInvalid`,
//!   `Usage`, `InputFile`) are raised before any network call.
//! - `RefreshRejected` covers the token endpoint refusing the signed
//!   assertion, which almost always means domain-wide delegation has not
//!   been granted yet. [`CbcmError::remediation`] builds the admin-console
//!   URL that fixes it.
//! - `Api` and `RetriesExhausted` preserve the response body so the
//!   server's diagnostic text reaches the user.
//! - `PartialFailure` is returned after a batched move in which at least
//!   one chunk was rejected; every chunk has already been reported.
//!
//! [`CbcmError::exit_code`] maps each variant to the process exit status.

use std::path::PathBuf;

use reqwest::StatusCode;

/// Exit status for a successful run.
pub const EXIT_OK: i32 = 0;
/// Runtime failure: API error, refresh rejection, network failure.
pub const EXIT_FAILURE: i32 = 1;
/// The credentials file does not exist.
pub const EXIT_CREDENTIALS_MISSING: i32 = 2;
/// The credentials file exists but is not a usable service-account key.
pub const EXIT_CREDENTIALS_INVALID: i32 = 3;
/// Command line usage error (sysexits `EX_USAGE`).
pub const EXIT_USAGE: i32 = 64;
/// An input file could not be opened (sysexits `EX_NOINPUT`).
pub const EXIT_NO_INPUT: i32 = 66;

/// Unified error type for all cbcm operations.
#[derive(Debug, thiserror::Error)]
pub enum CbcmError {
    /// The service-account credentials file was not found.
    #[error("{} does not exist", path.display())]
    CredentialsMissing {
        /// Path given via `--credentials-file`.
        path: PathBuf,
    },

    /// The credentials file could not be used as a service-account key.
    #[error("{} is not valid, {reason}", path.display())]
    CredentialsInvalid {
        /// Path given via `--credentials-file`.
        path: PathBuf,
        /// What is wrong with the file (e.g. "no client_id present").
        reason: String,
    },

    /// The token endpoint rejected the signed assertion.
    ///
    /// `client_id` and `scopes` are carried so the caller can print the
    /// delegation URL via [`CbcmError::remediation`].
    #[error("token refresh rejected ({status}): {body}")]
    RefreshRejected {
        /// HTTP status returned by the token endpoint.
        status: StatusCode,
        /// Raw error body (`{"error": "unauthorized_client", ...}`).
        body: String,
        /// OAuth client ID of the service account.
        client_id: String,
        /// Scopes that were requested.
        scopes: Vec<String>,
    },

    /// Any other failure while obtaining an access token (signing, a
    /// malformed token response).
    #[error("authentication failed: {message}")]
    Auth {
        /// Human-readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The API returned a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: StatusCode,
        /// Raw response body, empty if unreadable.
        body: String,
    },

    /// A transient status (429/5xx) persisted through every retry.
    #[error("giving up after {attempts} attempts, last status {status}: {body}")]
    RetriesExhausted {
        /// Total requests sent, including the first.
        attempts: u32,
        /// Status of the final attempt.
        status: StatusCode,
        /// Body of the final attempt.
        body: String,
    },

    /// At least one chunk of a batched move was rejected.
    #[error("{failed} of {total} move requests failed")]
    PartialFailure {
        /// Number of rejected chunks.
        failed: usize,
        /// Number of chunks sent.
        total: usize,
    },

    /// Invalid combination of command-line inputs.
    #[error("{0}")]
    Usage(String),

    /// An input file named on the command line could not be read.
    #[error("cannot read {}: {source}", path.display())]
    InputFile {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Transport-level failure (DNS, TCP, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Writing command output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, CbcmError>;

/// Admin-console page where a super admin grants domain-wide delegation.
const DELEGATION_URL: &str = "https://admin.google.com/ac/owl/domainwidedelegation";

impl CbcmError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CbcmError::CredentialsMissing { .. } => EXIT_CREDENTIALS_MISSING,
            CbcmError::CredentialsInvalid { .. } => EXIT_CREDENTIALS_INVALID,
            CbcmError::Usage(_) => EXIT_USAGE,
            CbcmError::InputFile { .. } => EXIT_NO_INPUT,
            CbcmError::RefreshRejected { .. }
            | CbcmError::Auth { .. }
            | CbcmError::Api { .. }
            | CbcmError::RetriesExhausted { .. }
            | CbcmError::PartialFailure { .. }
            | CbcmError::Parse(_)
            | CbcmError::Network(_)
            | CbcmError::Io(_) => EXIT_FAILURE,
        }
    }

    /// Corrective action for errors the user can fix in the admin console.
    ///
    /// Only `RefreshRejected` has one: the delegation page pre-filled with
    /// the service account's client ID and the scopes this tool needs.
    pub fn remediation(&self) -> Option<String> {
        match self {
            CbcmError::RefreshRejected {
                client_id, scopes, ..
            } => {
                let url = format!(
                    "{DELEGATION_URL}?clientIdToAdd={client_id}&clientScopeToAdd={}&overwriteClientId=true",
                    scopes.join(",")
                );
                Some(format!("Please go to:\n\n{url}\n\nto authorize access."))
            }
            _ => None,
        }
    }
}
