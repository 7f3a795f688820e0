//! Resource abstraction layer
//!
//! This module provides a data-driven approach to listing AWS resources.
//! Resource descriptors are loaded from JSON files at compile time, so a
//! new resource type is one JSON entry and no code.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource descriptors from embedded JSON
//! - [`fetcher`] - Walks a listing operation page by page
//! - [`sdk_dispatch`] - Maps operations to concrete AWS protocol requests
//! - [`api`] - The seam between the fetcher and the API layer
//!
//! # Resource Definitions
//!
//! Descriptors live in JSON files under `src/resources/`:
//! - `serverless.json` - Lambda, SQS, SNS, API Gateway, EventBridge
//! - `data.json` - Logs, Secrets Manager, S3, DynamoDB, RDS
//! - `compute.json` - EC2 instances, security groups, subnets, load balancers
//! - `devtools.json` - CodeBuild, CodePipeline
//! - `security.json` - WAF, IAM
//!
//! # Example
//!
//! ```ignore
//! use aws_names::resource::{get_resource, walk_names, AwsApi, ExecutionContext};
//! use futures::TryStreamExt;
//!
//! async fn list_lambdas(api: &AwsApi) -> anyhow::Result<Vec<String>> {
//!     let descriptor = get_resource("lambda").unwrap();
//!     let ctx = ExecutionContext::new("default", "eu-west-1");
//!     let records: Vec<_> = walk_names(api, descriptor, &ctx).try_collect().await?;
//!     Ok(records.into_iter().map(|r| r.name).collect())
//! }
//! ```

pub mod api;
pub mod fetcher;
mod record;
mod registry;
pub mod sdk_dispatch;

pub use api::{AwsApi, ResourceApi};
pub use fetcher::{build_args, extract_items, fetch_page, next_token, walk_names, Page};
pub use record::{ExecutionContext, ResourceRecord};
pub use registry::*;
