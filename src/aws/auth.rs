//! AWS Authentication
//!
//! Resolves credentials for a named profile through the standard AWS
//! provider chain (shared config/credentials files, SSO, assume-role,
//! environment) and caches them per profile.

use anyhow::{Context, Result};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::Mutex;

/// Refresh credentials this much before they actually expire
const CREDENTIALS_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// How long to trust credentials that carry no expiry (static keys)
const DEFAULT_CREDENTIALS_TTL: Duration = Duration::from_secs(30 * 60);

/// Resolved signing credentials
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str, session_token: Option<String>) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token,
        }
    }
}

// Security: never print the secret or the session token
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

#[derive(Clone)]
enum CredentialSource {
    /// Resolve through the AWS profile chain
    ProfileChain,
    /// One provider shared by every profile
    Provider(SharedCredentialsProvider),
    /// Same credentials for every profile (tests, endpoint overrides)
    Static(Credentials),
}

#[derive(Clone)]
struct CachedCredentials {
    credentials: Credentials,
    expires_at: Instant,
}

impl CachedCredentials {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// State for one profile; the provider is built once and reused for refreshes
#[derive(Default)]
struct ProfileEntry {
    provider: Option<SharedCredentialsProvider>,
    cached: Option<CachedCredentials>,
}

type ProfileSlot = Arc<Mutex<ProfileEntry>>;

/// Per-profile credential cache
///
/// Each profile has its own lock, held across resolution, so concurrent
/// callers for the same profile wait for one resolution instead of racing.
#[derive(Clone)]
pub struct CredentialStore {
    source: CredentialSource,
    profiles: Arc<Mutex<HashMap<String, ProfileSlot>>>,
}

impl CredentialStore {
    fn with_source(source: CredentialSource) -> Self {
        Self {
            source,
            profiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Credentials come from the AWS profile chain
    pub fn from_profiles() -> Self {
        Self::with_source(CredentialSource::ProfileChain)
    }

    /// Every profile resolves through `provider`
    pub fn from_provider(provider: impl ProvideCredentials + 'static) -> Self {
        Self::with_source(CredentialSource::Provider(SharedCredentialsProvider::new(provider)))
    }

    /// Every profile signs with the same fixed credentials
    pub fn fixed(credentials: Credentials) -> Self {
        Self::with_source(CredentialSource::Static(credentials))
    }

    async fn slot(&self, profile: &str) -> ProfileSlot {
        let mut profiles = self.profiles.lock().await;
        profiles.entry(profile.to_string()).or_default().clone()
    }

    /// Get credentials for a profile, resolving them on first use
    pub async fn get(&self, profile: &str) -> Result<Credentials> {
        if let CredentialSource::Static(credentials) = &self.source {
            return Ok(credentials.clone());
        }

        let slot = self.slot(profile).await;
        let mut entry = slot.lock().await;

        if let Some(cached) = &entry.cached {
            if cached.is_valid() {
                return Ok(cached.credentials.clone());
            }
            tracing::debug!("Cached credentials for profile {} expired", profile);
        }

        let provider = match &entry.provider {
            Some(provider) => provider.clone(),
            None => {
                let provider = match &self.source {
                    CredentialSource::Provider(provider) => provider.clone(),
                    _ => profile_provider(profile).await?,
                };
                entry.provider = Some(provider.clone());
                provider
            },
        };

        let (credentials, expiry) = resolve(&provider, profile).await?;
        let ttl = expiry
            .and_then(|at| at.duration_since(SystemTime::now()).ok())
            .unwrap_or(DEFAULT_CREDENTIALS_TTL)
            .saturating_sub(CREDENTIALS_EXPIRY_BUFFER);

        entry.cached = Some(CachedCredentials {
            credentials: credentials.clone(),
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(
            "Credentials for profile {} cached for ~{} minutes",
            profile,
            ttl.as_secs() / 60
        );

        Ok(credentials)
    }
}

/// Build the provider chain for one profile
async fn profile_provider(profile: &str) -> Result<SharedCredentialsProvider> {
    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .profile_name(profile)
        .load()
        .await;

    sdk_config
        .credentials_provider()
        .with_context(|| format!("No credentials provider for profile '{}'", profile))
}

/// Ask a provider for fresh credentials
async fn resolve(
    provider: &SharedCredentialsProvider,
    profile: &str,
) -> Result<(Credentials, Option<SystemTime>)> {
    let resolved = provider.provide_credentials().await.with_context(|| {
        format!(
            "Failed to load credentials for profile '{}'. Run 'aws configure --profile {}' or 'aws sso login'",
            profile, profile
        )
    })?;

    tracing::info!("Loaded credentials for profile {}", profile);

    let credentials = Credentials {
        access_key_id: resolved.access_key_id().to_string(),
        secret_access_key: resolved.secret_access_key().to_string(),
        session_token: resolved.session_token().map(|s| s.to_string()),
    };
    Ok((credentials, resolved.expiry()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::provider::future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts resolutions; credentials expire after `lifetime`
    #[derive(Debug, Clone)]
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        lifetime: Duration,
    }

    impl CountingProvider {
        fn new(lifetime: Duration) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                lifetime,
            }
        }
    }

    impl ProvideCredentials for CountingProvider {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            future::ProvideCredentials::new(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::task::yield_now().await;
                Ok(aws_credential_types::Credentials::new(
                    format!("AKID{}", n),
                    "secret",
                    None,
                    Some(SystemTime::now() + self.lifetime),
                    "counting",
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_gets_resolve_once() {
        let provider = CountingProvider::new(Duration::from_secs(3600));
        let calls = provider.calls.clone();
        let store = CredentialStore::from_provider(provider);

        let results = futures::future::join_all((0..8).map(|_| store.get("dev"))).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for credentials in results {
            assert_eq!(credentials.unwrap().access_key_id, "AKID1");
        }
    }

    #[tokio::test]
    async fn test_profiles_are_cached_separately() {
        let provider = CountingProvider::new(Duration::from_secs(3600));
        let calls = provider.calls.clone();
        let store = CredentialStore::from_provider(provider);

        store.get("dev").await.unwrap();
        store.get("prod").await.unwrap();
        store.get("dev").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_near_expiry_credentials_are_refreshed() {
        // Inside the expiry buffer, so never served from cache
        let provider = CountingProvider::new(Duration::from_secs(30));
        let calls = provider.calls.clone();
        let store = CredentialStore::from_provider(provider);

        let first = store.get("dev").await.unwrap();
        let second = store.get("dev").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.access_key_id, "AKID1");
        assert_eq!(second.access_key_id, "AKID2");
    }

    #[tokio::test]
    async fn test_fixed_store_serves_any_profile() {
        let store = CredentialStore::fixed(Credentials::new("AKID", "secret", None));
        let a = store.get("dev").await.unwrap();
        let b = store.get("prod").await.unwrap();
        assert_eq!(a.access_key_id, "AKID");
        assert_eq!(b.access_key_id, "AKID");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("AKID", "topsecret", Some("tok".to_string()));
        let printed = format!("{:?}", creds);
        assert!(printed.contains("AKID"));
        assert!(!printed.contains("topsecret"));
        assert!(!printed.contains("tok\""));
    }
}
