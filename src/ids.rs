//! Device-ID resolution for bulk moves.
//!
//! A move targets exactly one of:
//! - an explicit comma-separated list (`--ids`),
//! - a server-side browser query (`--query`), drained through
//!   [`crate::pagination::list_all`] asking only for `deviceId`,
//! - a file with one ID per line (`--file-of-ids`).
//!
//! Everything that can fail locally (mode selection, reading the file)
//! fails before the first request is sent.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::browsers::{BROWSERS_FIELD, BROWSERS_PATH};
use crate::client::{CbcmClient, Params};
use crate::error::{CbcmError, Result};
use crate::pagination::list_all;

/// Partial response selector that keeps pages small and the cursor intact.
const DEVICE_ID_FIELDS: &str = "nextPageToken,browsers(deviceId)";

/// Where the IDs for a move come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdSource {
    /// Comma-separated device IDs.
    List(String),
    /// Browser search query, optionally scoped to an org unit.
    Query {
        /// Query string in the browser search syntax.
        query: String,
        /// Restricts the search to this org unit path.
        org_unit: Option<String>,
    },
    /// File with one device ID per line.
    File(PathBuf),
}

impl DeviceIdSource {
    /// Picks the single supplied input mode.
    ///
    /// Zero or several modes is a usage error, as is an org unit filter
    /// without a query.
    pub fn from_flags(
        ids: Option<String>,
        query: Option<String>,
        file: Option<PathBuf>,
        org_unit: Option<String>,
    ) -> Result<Self> {
        if org_unit.is_some() && query.is_none() {
            return Err(CbcmError::Usage(
                "--orgunit-filter can only be used with --query".to_string(),
            ));
        }
        match (ids, query, file) {
            (Some(list), None, None) => Ok(DeviceIdSource::List(list)),
            (None, Some(query), None) => Ok(DeviceIdSource::Query { query, org_unit }),
            (None, None, Some(path)) => Ok(DeviceIdSource::File(path)),
            (None, None, None) => Err(CbcmError::Usage(
                "one of --ids, --query or --file-of-ids is required".to_string(),
            )),
            _ => Err(CbcmError::Usage(
                "--ids, --query and --file-of-ids are mutually exclusive".to_string(),
            )),
        }
    }
}

/// Splits a comma-separated list, trimming entries and dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// One ID per line; surrounding whitespace is trimmed and blank lines skipped.
pub fn parse_id_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads an ID file.
pub fn read_id_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|source| CbcmError::InputFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_id_lines(&content))
}

/// Resolves `source` to a flat, ordered ID list.
pub async fn resolve(client: &CbcmClient, source: &DeviceIdSource) -> Result<Vec<String>> {
    match source {
        DeviceIdSource::List(raw) => Ok(parse_id_list(raw)),
        DeviceIdSource::File(path) => read_id_file(path),
        DeviceIdSource::Query { query, org_unit } => {
            let mut params = Params::new();
            params.insert("query", query.clone());
            params.insert("fields", DEVICE_ID_FIELDS.to_string());
            if let Some(ou) = org_unit {
                params.insert("orgUnitPath", ou.clone());
            }
            let browsers = list_all(client, BROWSERS_PATH, params, BROWSERS_FIELD).await?;
            let ids: Vec<String> = browsers
                .iter()
                .filter_map(|b| b.get("deviceId").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            tracing::info!(%query, count = ids.len(), "resolved device IDs from query");
            Ok(ids)
        }
    }
}
