//! Managed Chrome browser endpoints.
//!
//! - [`list_browsers`]: every browser matching the optional filters.
//! - [`get_browser`]: one browser by `deviceId`.
//! - [`update_browser`]: replace the annotated fields of one browser.
//! - [`delete_browser`]: remove one browser.
//! - [`move_browsers`]: move many browsers to an org unit, 600 per request.
//!
//! Browser records are passed through as `serde_json::Value`; the client
//! never validates the server's schema.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use crate::client::{ApiResponse, CbcmClient, Params};
use crate::error::Result;
use crate::pagination::{MOVE_BATCH_SIZE, batches, list_all};

/// Collection path, relative to the customer base URL.
pub const BROWSERS_PATH: &str = "devices/chromebrowsers";

/// Array holding browsers in a list response.
pub const BROWSERS_FIELD: &str = "browsers";

const MOVE_PATH: &str = "devices/chromebrowsers/moveChromeBrowsersToOu";

/// How much of each browser record the server returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Projection {
    /// Core identification fields only.
    #[value(name = "BASIC")]
    Basic,
    /// Everything, including extensions and policies.
    #[value(name = "FULL")]
    Full,
}

impl Projection {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Projection::Basic => "BASIC",
            Projection::Full => "FULL",
        }
    }
}

/// Sort direction for `--orderby`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// A to Z.
    #[value(name = "ASCENDING")]
    Ascending,
    /// Z to A.
    #[value(name = "DESCENDING")]
    Descending,
}

impl SortOrder {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASCENDING",
            SortOrder::Descending => "DESCENDING",
        }
    }
}

/// Filters for [`list_browsers`]. `None` fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct ListBrowsersQuery {
    /// Restrict to this org unit path.
    pub org_unit: Option<String>,
    /// Property to sort by.
    pub order_by: Option<String>,
    /// Level of detail per record.
    pub projection: Option<Projection>,
    /// Search query.
    pub query: Option<String>,
    /// Sort direction.
    pub sort_order: Option<SortOrder>,
    /// Partial response selector.
    pub fields: Option<String>,
}

impl ListBrowsersQuery {
    /// Query parameters for the first page.
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(v) = &self.order_by {
            params.insert("orderBy", v.clone());
        }
        if let Some(v) = &self.org_unit {
            params.insert("orgUnitPath", v.clone());
        }
        if let Some(v) = self.projection {
            params.insert("projection", v.as_str().to_string());
        }
        if let Some(v) = &self.query {
            params.insert("query", v.clone());
        }
        if let Some(v) = self.sort_order {
            params.insert("sortOrder", v.as_str().to_string());
        }
        if let Some(v) = &self.fields {
            params.insert("fields", v.clone());
        }
        params
    }
}

/// Body of the PUT that updates a browser's annotations.
///
/// Annotations left as `None` are omitted from the body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrowserRequest {
    /// Browser being updated; also the path segment.
    pub device_id: String,
    /// User the browser is assigned to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_user: Option<String>,
    /// Physical location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_location: Option<String>,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_notes: Option<String>,
    /// Asset tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_asset_id: Option<String>,
}

/// Body of one move request.
#[derive(Debug, Serialize)]
pub struct MoveBrowsersRequest<'a> {
    /// Destination org unit path.
    pub org_unit_path: &'a str,
    /// Browsers to move in this request.
    pub resource_ids: &'a [String],
}

/// Outcome of [`move_browsers`] across all chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveSummary {
    /// Requests sent.
    pub requests: usize,
    /// Requests answered with a non-2xx status.
    pub failed: usize,
}

/// Item path for one browser. The ID is escaped so `/`, `?` or `#` cannot
/// change which resource is addressed.
fn browser_path(device_id: &str) -> String {
    format!("{BROWSERS_PATH}/{}", urlencoding::encode(device_id))
}

fn fields_param(fields: Option<&str>) -> Params {
    let mut params = Params::new();
    if let Some(f) = fields {
        params.insert("fields", f.to_string());
    }
    params
}

/// Lists every browser matching `query`, draining all pages.
pub async fn list_browsers(client: &CbcmClient, query: &ListBrowsersQuery) -> Result<Vec<Value>> {
    list_all(client, BROWSERS_PATH, query.params(), BROWSERS_FIELD).await
}

/// Retrieves one browser.
pub async fn get_browser(
    client: &CbcmClient,
    device_id: &str,
    projection: Option<Projection>,
    fields: Option<&str>,
) -> Result<Value> {
    let mut params = fields_param(fields);
    if let Some(p) = projection {
        params.insert("projection", p.as_str().to_string());
    }
    client
        .get(&browser_path(device_id), &params)
        .await?
        .json()
}

/// Updates a browser's annotations and returns the stored record.
pub async fn update_browser(
    client: &CbcmClient,
    update: &UpdateBrowserRequest,
    fields: Option<&str>,
) -> Result<Value> {
    client
        .put(&browser_path(&update.device_id), &fields_param(fields), update)
        .await?
        .json()
}

/// Deletes a browser. Non-2xx statuses are errors.
pub async fn delete_browser(client: &CbcmClient, device_id: &str) -> Result<ApiResponse> {
    client
        .delete(&browser_path(device_id))
        .await?
        .error_for_status()
}

/// Moves `ids` to `org_unit` in chunks of [`MOVE_BATCH_SIZE`].
///
/// `report` is called with every chunk's response, success or not, before
/// the next chunk is sent. A rejected chunk does not stop the remaining
/// ones; transport errors and the `report` callback's errors do.
pub async fn move_browsers<F>(
    client: &CbcmClient,
    org_unit: &str,
    ids: &[String],
    mut report: F,
) -> Result<MoveSummary>
where
    F: FnMut(&ApiResponse) -> Result<()>,
{
    let mut summary = MoveSummary::default();
    for (index, chunk) in batches(ids, MOVE_BATCH_SIZE).enumerate() {
        let body = MoveBrowsersRequest {
            org_unit_path: org_unit,
            resource_ids: chunk,
        };
        tracing::debug!(chunk = index, size = chunk.len(), org_unit, "moving browsers");
        let resp = client.post(MOVE_PATH, &Params::new(), Some(&body)).await?;
        summary.requests += 1;
        if !resp.is_success() {
            summary.failed += 1;
            tracing::warn!(
                chunk = index,
                status = %resp.status,
                body = %resp.body,
                "move request rejected"
            );
        }
        report(&resp)?;
    }
    Ok(summary)
}
