//! Listing API seam
//!
//! The fetcher only needs "call this operation with these arguments and
//! give me the response map". [`AwsApi`] answers that against real AWS
//! endpoints; tests plug in scripted implementations.

use super::record::ExecutionContext;
use super::sdk_dispatch;
use crate::aws::pool::ClientPool;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A callable listing API
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Invoke `operation` of `service` in `ctx` with a key/value argument map
    async fn invoke(
        &self,
        ctx: &ExecutionContext,
        service: &str,
        operation: &str,
        args: &Map<String, Value>,
    ) -> Result<Value>;
}

/// [`ResourceApi`] backed by signed HTTP calls to AWS
pub struct AwsApi {
    pool: ClientPool,
}

impl AwsApi {
    pub fn new(pool: ClientPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }
}

#[async_trait]
impl ResourceApi for AwsApi {
    async fn invoke(
        &self,
        ctx: &ExecutionContext,
        service: &str,
        operation: &str,
        args: &Map<String, Value>,
    ) -> Result<Value> {
        let client = self.pool.client(service, ctx)?;
        sdk_dispatch::invoke_sdk(&client, operation, args).await
    }
}
