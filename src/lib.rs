//! Async Rust client for Chrome Browser Cloud Management (CBCM).
//!
//! Wraps the managed-browser and enrollment-token endpoints of the Admin SDK
//! Directory API (`v1.1beta1`) behind a small command-line tool. Every
//! command is one request, or a sequential run of paginated or batched
//! requests, against `…/customer/{customer}/`.
//!
//! # Modules
//!
//! - [`auth`]: service-account key loading and JWT-bearer token exchange.
//! - [`client`]: customer-bound HTTP client with retry on 429/5xx.
//! - [`pagination`]: page draining and ID batching.
//! - [`browsers`]: list, get, update, delete and move browsers.
//! - [`tokens`]: list, create and revoke enrollment tokens.
//! - [`ids`]: resolving the device IDs a move applies to.
//! - [`output`]: sorted JSON and status-line rendering.
//! - [`cli`]: `clap` grammar.
//! - [`commands`]: dispatch from a parsed command to its handler.
//! - [`error`]: `CbcmError` and exit codes.
//!
//! # Quick Start
//!
//! ```ignore
//! use cbcm::auth::{SCOPES, ServiceAccountKey, TokenProvider};
//! use cbcm::browsers::{ListBrowsersQuery, list_browsers};
//! use cbcm::client::CbcmClient;
//!
//! let key = ServiceAccountKey::load("sa.json".as_ref())?;
//! let token = TokenProvider::new(key, "admin@example.com", SCOPES)?.fetch_token().await?;
//! let client = CbcmClient::new("my_customer", &token.access_token)?;
//! let browsers = list_browsers(&client, &ListBrowsersQuery::default()).await?;
//! ```

pub mod auth;
pub mod browsers;
pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod ids;
pub mod output;
pub mod pagination;
pub mod tokens;
