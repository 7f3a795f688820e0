//! AWS API interaction module
//!
//! This module provides the plumbing for talking to AWS service APIs:
//! credential resolution, request signing, the HTTP client, and the
//! per-(service, profile, region) client pool.
//!
//! # Module Structure
//!
//! - [`auth`] - Credential resolution through the AWS profile chain
//! - [`client`] - Client bound to one service, profile and region
//! - [`http`] - HTTP utilities for signed API calls
//! - [`pool`] - Process-lifetime cache of clients
//! - [`services`] - Endpoint, signing and protocol table per service
//! - [`signing`] - Signature Version 4
//! - [`xml`] - XML response bodies decoded into JSON values
//!
//! # Example
//!
//! ```ignore
//! use aws_names::aws::pool::ClientPool;
//! use aws_names::resource::ExecutionContext;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let pool = ClientPool::new(None)?;
//!     let ctx = ExecutionContext::new("default", "eu-west-1");
//!     let client = pool.client("lambda", &ctx).await?;
//!     let page = client.get("/2015-03-31/functions/", &[]).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod pool;
pub mod services;
pub mod signing;
pub mod xml;
