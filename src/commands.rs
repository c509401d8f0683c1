//! Dispatch from a parsed [`Command`] to its handler.
//!
//! Handlers receive an explicit [`Context`] holding the authenticated
//! client and write their output to a caller-supplied writer, so the same
//! code path serves the binary (stdout) and the tests (a buffer).

use std::io::Write;

use serde_json::Value;

use crate::browsers::{delete_browser, get_browser, list_browsers, move_browsers, update_browser};
use crate::cli::{Command, MoveBrowsersArgs};
use crate::client::CbcmClient;
use crate::error::{CbcmError, Result};
use crate::ids::{DeviceIdSource, resolve};
use crate::output::{render_json, render_status};
use crate::tokens::{create_token, list_tokens, revoke_token};

/// Process-wide state, built once at startup and read-only afterwards.
pub struct Context {
    client: CbcmClient,
}

impl Context {
    pub fn new(client: CbcmClient) -> Self {
        Context { client }
    }

    pub fn client(&self) -> &CbcmClient {
        &self.client
    }
}

/// Checks everything about `command` that can be checked without the
/// network: mutually exclusive inputs and the presence of input files.
///
/// Run this before acquiring credentials so usage mistakes are reported
/// without a token round-trip.
pub fn preflight(command: &Command) -> Result<()> {
    if let Command::MoveBrowsers(args) = command {
        if let DeviceIdSource::File(path) = args.source()? {
            std::fs::File::open(&path)
                .map_err(|source| CbcmError::InputFile { path, source })?;
        }
    }
    Ok(())
}

/// Runs `command` against the API, writing its output to `out`.
pub async fn execute<W: Write>(ctx: &Context, command: &Command, out: &mut W) -> Result<()> {
    let client = ctx.client();
    tracing::debug!(command = command.name(), "executing");

    match command {
        Command::ListBrowsers(args) => {
            let browsers = list_browsers(client, &args.to_query()).await?;
            render_json(out, &browsers)
        }
        Command::GetBrowser(args) => {
            let browser =
                get_browser(client, &args.id, args.projection, args.fields.as_deref()).await?;
            render_json(out, &browser)
        }
        Command::UpdateBrowser(args) => {
            let browser =
                update_browser(client, &args.to_request(), args.fields.as_deref()).await?;
            render_json(out, &browser)
        }
        Command::DeleteBrowser(args) => {
            let resp = delete_browser(client, &args.id).await?;
            if resp.body.trim().is_empty() {
                render_status(out, &resp)
            } else {
                let body: Value = serde_json::from_str(&resp.body)?;
                render_json(out, &body)
            }
        }
        Command::MoveBrowsers(args) => execute_move(client, args, out).await,
        Command::ListTokens(args) => {
            let tokens = list_tokens(client, &args.to_query()).await?;
            render_json(out, &tokens)
        }
        Command::CreateToken(args) => {
            let token = create_token(client, &args.to_request(), args.fields.as_deref()).await?;
            render_json(out, &token)
        }
        Command::RevokeToken(args) => {
            let resp = revoke_token(client, &args.id).await?;
            render_status(out, &resp)?;
            resp.error_for_status().map(|_| ())
        }
    }
}

async fn execute_move<W: Write>(
    client: &CbcmClient,
    args: &MoveBrowsersArgs,
    out: &mut W,
) -> Result<()> {
    let source = args.source()?;
    let ids = resolve(client, &source).await?;
    if ids.is_empty() {
        tracing::warn!(?source, "no browsers to move");
        return Ok(());
    }

    let summary =
        move_browsers(client, &args.orgunit, &ids, |resp| render_status(&mut *out, resp)).await?;
    tracing::info!(
        moved = ids.len(),
        requests = summary.requests,
        failed = summary.failed,
        org_unit = %args.orgunit,
        "move complete"
    );

    if summary.failed > 0 {
        return Err(CbcmError::PartialFailure {
            failed: summary.failed,
            total: summary.requests,
        });
    }
    Ok(())
}
