//! Command-line grammar.
//!
//! Global flags come before the subcommand:
//!
//! ```text
//! cbcm --credentials-file sa.json --admin admin@example.com list-browsers --orgunit /Sales
//! ```
//!
//! Every optional per-command flag maps 1:1 to a query parameter or a body
//! field; a flag the caller leaves out is never sent.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::browsers::{ListBrowsersQuery, Projection, SortOrder, UpdateBrowserRequest};
use crate::error::Result;
use crate::ids::DeviceIdSource;
use crate::tokens::{CreateTokenRequest, ListTokensQuery};

/// Chrome Browser Cloud Management command line tool.
#[derive(Debug, Parser)]
#[command(name = "cbcm", version, about, long_about = None)]
pub struct Cli {
    /// Location of the service account credentials (JSON key file).
    #[arg(long, env = "CBCM_CREDENTIALS_FILE", value_name = "FILE")]
    pub credentials_file: PathBuf,

    /// Customer ID from admin.google.com > Account > Account settings > Profile.
    #[arg(long, env = "CBCM_CUSTOMER", default_value = "my_customer")]
    pub customer: String,

    /// Email address of the admin user to act as.
    #[arg(long, env = "CBCM_ADMIN")]
    pub admin: String,

    /// Log HTTP requests and responses to stderr.
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// One variant per API operation.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List browsers.
    ListBrowsers(ListBrowsersArgs),
    /// Get browser.
    GetBrowser(GetBrowserArgs),
    /// Update browser annotations.
    UpdateBrowser(UpdateBrowserArgs),
    /// Delete browser.
    DeleteBrowser(DeleteBrowserArgs),
    /// Move browsers to an org unit.
    MoveBrowsers(MoveBrowsersArgs),
    /// List enrollment tokens.
    ListTokens(ListTokensArgs),
    /// Create enrollment token.
    CreateToken(CreateTokenArgs),
    /// Revoke enrollment token.
    RevokeToken(RevokeTokenArgs),
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ListBrowsers(_) => "list-browsers",
            Command::GetBrowser(_) => "get-browser",
            Command::UpdateBrowser(_) => "update-browser",
            Command::DeleteBrowser(_) => "delete-browser",
            Command::MoveBrowsers(_) => "move-browsers",
            Command::ListTokens(_) => "list-tokens",
            Command::CreateToken(_) => "create-token",
            Command::RevokeToken(_) => "revoke-token",
        }
    }
}

#[derive(Debug, Args)]
pub struct ListBrowsersArgs {
    /// OrgUnit to scope results.
    #[arg(long)]
    pub orgunit: Option<String>,
    /// Sort results by property.
    #[arg(long)]
    pub orderby: Option<String>,
    /// Retrieve basic or full browser details.
    #[arg(long, value_enum, default_value = "BASIC")]
    pub projection: Projection,
    /// Query to scope results.
    #[arg(long)]
    pub query: Option<String>,
    /// Sort order.
    #[arg(long, value_enum, default_value = "ASCENDING")]
    pub sortorder: SortOrder,
    /// Limit fields retrieved and output.
    #[arg(long)]
    pub fields: Option<String>,
}

impl ListBrowsersArgs {
    pub fn to_query(&self) -> ListBrowsersQuery {
        ListBrowsersQuery {
            org_unit: self.orgunit.clone(),
            order_by: self.orderby.clone(),
            projection: Some(self.projection),
            query: self.query.clone(),
            sort_order: Some(self.sortorder),
            fields: self.fields.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct GetBrowserArgs {
    /// deviceId of the browser to get.
    #[arg(long)]
    pub id: String,
    /// Retrieve basic or full browser details.
    #[arg(long, value_enum)]
    pub projection: Option<Projection>,
    /// Limit fields retrieved and output.
    #[arg(long)]
    pub fields: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateBrowserArgs {
    /// deviceId of the browser to update.
    #[arg(long)]
    pub id: String,
    /// User of the browser.
    #[arg(long)]
    pub user: Option<String>,
    /// Location of the browser.
    #[arg(long)]
    pub location: Option<String>,
    /// Notes of the browser.
    #[arg(long)]
    pub notes: Option<String>,
    /// Asset tag id of the browser.
    #[arg(long)]
    pub assetid: Option<String>,
    /// Limit fields retrieved and output.
    #[arg(long)]
    pub fields: Option<String>,
}

impl UpdateBrowserArgs {
    pub fn to_request(&self) -> UpdateBrowserRequest {
        UpdateBrowserRequest {
            device_id: self.id.clone(),
            annotated_user: self.user.clone(),
            annotated_location: self.location.clone(),
            annotated_notes: self.notes.clone(),
            annotated_asset_id: self.assetid.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct DeleteBrowserArgs {
    /// deviceId of the browser to delete.
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct MoveBrowsersArgs {
    #[command(flatten)]
    pub source: MoveSourceArgs,

    /// Org Unit to move the browsers to.
    #[arg(long)]
    pub orgunit: String,

    /// Only match browsers in this OrgUnit when resolving --query.
    #[arg(long, conflicts_with_all = ["ids", "file_of_ids"])]
    pub orgunit_filter: Option<String>,
}

/// Where the browsers to move come from. Exactly one must be given;
/// clap rejects zero or several at parse time.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct MoveSourceArgs {
    /// Comma-separated deviceIds of the browsers to move.
    #[arg(long)]
    pub ids: Option<String>,
    /// Move every browser matching this query.
    #[arg(long)]
    pub query: Option<String>,
    /// File with one deviceId per line.
    #[arg(long, value_name = "FILE")]
    pub file_of_ids: Option<PathBuf>,
}

impl MoveBrowsersArgs {
    pub fn source(&self) -> Result<DeviceIdSource> {
        DeviceIdSource::from_flags(
            self.source.ids.clone(),
            self.source.query.clone(),
            self.source.file_of_ids.clone(),
            self.orgunit_filter.clone(),
        )
    }
}

#[derive(Debug, Args)]
pub struct ListTokensArgs {
    /// OrgUnit to scope results.
    #[arg(long)]
    pub orgunit: Option<String>,
    /// Query to scope results.
    #[arg(long)]
    pub query: Option<String>,
    /// Limit fields retrieved and output.
    #[arg(long)]
    pub fields: Option<String>,
}

impl ListTokensArgs {
    pub fn to_query(&self) -> ListTokensQuery {
        ListTokensQuery {
            org_unit: self.orgunit.clone(),
            query: self.query.clone(),
            fields: self.fields.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateTokenArgs {
    /// Expire time of the created token, in "yyyy-MM-ddThh:mm:ssZ" format.
    #[arg(long)]
    pub expire: Option<String>,
    /// OrgUnit to create the token for. Defaults to the root OrgUnit.
    #[arg(long)]
    pub orgunit: Option<String>,
    /// Life of the created token in seconds with an "s" suffix, e.g. "3600s".
    #[arg(long)]
    pub ttl: Option<String>,
    /// Limit fields retrieved and output.
    #[arg(long)]
    pub fields: Option<String>,
}

impl CreateTokenArgs {
    pub fn to_request(&self) -> CreateTokenRequest {
        let mut req = CreateTokenRequest::default();
        req.expire_time = self.expire.clone();
        req.org_unit_path = self.orgunit.clone();
        req.ttl = self.ttl.clone();
        req
    }
}

#[derive(Debug, Args)]
pub struct RevokeTokenArgs {
    /// Permanent ID of the token to revoke.
    #[arg(long)]
    pub id: String,
}
