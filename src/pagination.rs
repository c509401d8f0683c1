//! Pagination and batching harness.
//!
//! - [`list_all`] drains a `nextPageToken`-paginated list endpoint.
//! - [`batches`] splits an ID list into request-sized chunks.
//!
//! Both are strictly sequential: a page or chunk request completes before
//! the next one starts.

use serde_json::Value;

use crate::client::{CbcmClient, Params};
use crate::error::Result;

/// Response field carrying the continuation cursor.
pub const NEXT_PAGE_TOKEN: &str = "nextPageToken";

/// Query parameter the cursor is echoed back in.
pub const PAGE_TOKEN: &str = "pageToken";

/// Largest number of device IDs the move endpoint accepts per request.
pub const MOVE_BATCH_SIZE: usize = 600;

/// GETs `path` until a page omits the cursor, accumulating the array named
/// `items_field` from every page in server order.
///
/// A page without `items_field` contributes nothing. A non-2xx page aborts
/// with [`crate::error::CbcmError::Api`].
pub async fn list_all(
    client: &CbcmClient,
    path: &str,
    mut params: Params,
    items_field: &str,
) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    let mut pages = 0usize;

    loop {
        let mut page = client.get(path, &params).await?.json()?;
        pages += 1;

        if let Some(Value::Array(batch)) = page.get_mut(items_field).map(Value::take) {
            tracing::debug!(page = pages, count = batch.len(), "received page");
            items.extend(batch);
        }

        match page.get(NEXT_PAGE_TOKEN).and_then(Value::as_str) {
            Some(cursor) if !cursor.is_empty() => {
                params.insert(PAGE_TOKEN, cursor.to_string());
            }
            _ => break,
        }
    }

    tracing::info!(path, pages, total = items.len(), "listing complete");
    Ok(items)
}

/// Splits `ids` into contiguous chunks of at most `size`, preserving order.
///
/// `size` of zero is treated as one.
pub fn batches<T>(ids: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    ids.chunks(size.max(1))
}
