//! Chrome enrollment token endpoints.

use serde::Serialize;
use serde_json::Value;

use crate::client::{ApiResponse, CbcmClient, Params};
use crate::error::Result;
use crate::pagination::list_all;

/// Collection path, relative to the customer base URL.
pub const TOKENS_PATH: &str = "chrome/enrollmentTokens";

/// Array holding tokens in a list response.
pub const TOKENS_FIELD: &str = "chromeEnrollmentTokens";

/// The only token type this API issues.
const TOKEN_TYPE_BROWSER: &str = "chromeBrowser";

/// Filters for [`list_tokens`]. `None` fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct ListTokensQuery {
    /// Restrict to tokens for this org unit path.
    pub org_unit: Option<String>,
    /// Search query.
    pub query: Option<String>,
    /// Partial response selector.
    pub fields: Option<String>,
}

impl ListTokensQuery {
    /// Query parameters for the first page.
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(v) = &self.org_unit {
            params.insert("orgUnitPath", v.clone());
        }
        if let Some(v) = &self.query {
            params.insert("query", v.clone());
        }
        if let Some(v) = &self.fields {
            params.insert("fields", v.clone());
        }
        params
    }
}

/// Body of a token creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTokenRequest {
    token_type: &'static str,
    /// Absolute expiry, `yyyy-MM-ddThh:mm:ssZ`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<String>,
    /// Org unit the token enrolls into; root when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_unit_path: Option<String>,
    /// Relative lifetime in seconds with an `s` suffix, e.g. `3600s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

impl Default for CreateTokenRequest {
    fn default() -> Self {
        CreateTokenRequest {
            token_type: TOKEN_TYPE_BROWSER,
            expire_time: None,
            org_unit_path: None,
            ttl: None,
        }
    }
}

/// Lists every enrollment token matching `query`, draining all pages.
pub async fn list_tokens(client: &CbcmClient, query: &ListTokensQuery) -> Result<Vec<Value>> {
    list_all(client, TOKENS_PATH, query.params(), TOKENS_FIELD).await
}

/// Creates a browser enrollment token and returns it.
pub async fn create_token(
    client: &CbcmClient,
    request: &CreateTokenRequest,
    fields: Option<&str>,
) -> Result<Value> {
    let mut params = Params::new();
    if let Some(f) = fields {
        params.insert("fields", f.to_string());
    }
    client
        .post(TOKENS_PATH, &params, Some(request))
        .await?
        .json()
}

/// Revokes the token with permanent ID `token_id`.
///
/// The response is returned whatever its status so the caller can report
/// it before deciding whether it failed.
pub async fn revoke_token(client: &CbcmClient, token_id: &str) -> Result<ApiResponse> {
    let path = format!("{TOKENS_PATH}/{}:revoke", urlencoding::encode(token_id));
    client.post::<()>(&path, &Params::new(), None).await
}
