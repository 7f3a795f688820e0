//! Client Pool
//!
//! Clients are a pure function of (service, profile, region), so one client
//! per triple is built on first use and shared for the rest of the process.

use super::auth::CredentialStore;
use super::client::AwsClient;
use super::http::AwsHttpClient;
use crate::resource::ExecutionContext;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

type PoolKey = (String, String, String);

/// Process-lifetime cache of [`AwsClient`]s, no eviction
pub struct ClientPool {
    credentials: CredentialStore,
    http: AwsHttpClient,
    endpoint_override: Option<Url>,
    clients: Mutex<HashMap<PoolKey, Arc<AwsClient>>>,
}

impl ClientPool {
    /// Pool resolving credentials through the AWS profile chain
    pub fn new(endpoint_override: Option<&str>) -> Result<Self> {
        Self::with_credentials(CredentialStore::from_profiles(), endpoint_override)
    }

    /// Pool with an explicit credential store
    pub fn with_credentials(
        credentials: CredentialStore,
        endpoint_override: Option<&str>,
    ) -> Result<Self> {
        let endpoint_override = endpoint_override
            .map(|e| Url::parse(e).with_context(|| format!("Invalid endpoint URL: {}", e)))
            .transpose()?;

        Ok(Self {
            credentials,
            http: AwsHttpClient::new()?,
            endpoint_override,
            clients: Mutex::new(HashMap::new()),
        })
    }

    /// Get (or build) the client for `service` in `ctx`
    pub fn client(&self, service: &str, ctx: &ExecutionContext) -> Result<Arc<AwsClient>> {
        let key = (service.to_string(), ctx.profile.clone(), ctx.region.clone());

        let mut clients = self
            .clients
            .lock()
            .map_err(|_| anyhow::anyhow!("Client pool lock poisoned"))?;

        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        tracing::debug!(
            "Creating client: service={}, profile={}, region={}",
            service,
            ctx.profile,
            ctx.region
        );
        let client = Arc::new(AwsClient::new(
            service,
            ctx,
            self.credentials.clone(),
            self.http.clone(),
            self.endpoint_override.clone(),
        )?);
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    /// Number of distinct clients built so far
    pub fn len(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::auth::Credentials;

    fn pool() -> ClientPool {
        ClientPool::with_credentials(
            CredentialStore::fixed(Credentials::new("AKID", "secret", None)),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_same_triple_reuses_client() {
        let pool = pool();
        let ctx = ExecutionContext::new("dev", "us-east-1");
        let a = pool.client("rds", &ctx).unwrap();
        let b = pool.client("rds", &ctx).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_distinct_triples_get_distinct_clients() {
        let pool = pool();
        pool.client("rds", &ExecutionContext::new("dev", "us-east-1")).unwrap();
        pool.client("rds", &ExecutionContext::new("dev", "us-west-2")).unwrap();
        pool.client("ec2", &ExecutionContext::new("dev", "us-east-1")).unwrap();
        pool.client("rds", &ExecutionContext::new("prod", "us-east-1")).unwrap();
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let result = ClientPool::with_credentials(
            CredentialStore::fixed(Credentials::new("AKID", "secret", None)),
            Some("not a url"),
        );
        assert!(result.is_err());
    }
}
