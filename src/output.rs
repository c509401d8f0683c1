//! Output renderers.
//!
//! Data-returning commands print JSON with two-space indentation and object
//! keys sorted at every level. `serde_json::Map` is backed by a `BTreeMap`
//! (the `preserve_order` feature is not enabled), so serializing a `Value`
//! yields sorted keys without a separate pass.
//!
//! Side-effect-only commands print one `{status_code} {reason}` line per
//! request.

use std::io::Write;

use serde::Serialize;

use crate::client::ApiResponse;
use crate::error::Result;

/// Writes `value` as sorted, two-space-indented JSON followed by a newline.
pub fn render_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    // Round-trip through `Value` so struct field order cannot leak through.
    let value = serde_json::to_value(value)?;
    let text = serde_json::to_string_pretty(&value)?;
    writeln!(out, "{text}")?;
    Ok(())
}

/// Writes `{status_code} {reason}` for `response`.
pub fn render_status<W: Write>(out: &mut W, response: &ApiResponse) -> Result<()> {
    writeln!(out, "{} {}", response.status.as_u16(), response.reason())?;
    Ok(())
}
