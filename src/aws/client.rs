//! AWS Client
//!
//! A client bound to one (service, profile, region) triple, combining
//! credentials, signing and the HTTP transport.

use super::auth::CredentialStore;
use super::http::{AwsHttpClient, HttpRequest};
use super::services::{get_service, ServiceDef};
use super::signing::{canonical_query, sign, SignableRequest, SigningParams};
use crate::resource::ExecutionContext;
use anyhow::{Context, Result};
use reqwest::Method;
use url::Url;

/// Client for one service in one profile and region
#[derive(Clone)]
pub struct AwsClient {
    pub service: &'static ServiceDef,
    pub profile: String,
    pub region: String,
    credentials: CredentialStore,
    http: AwsHttpClient,
    endpoint_override: Option<Url>,
}

impl AwsClient {
    /// Create a client for `service` bound to `ctx`
    pub fn new(
        service: &str,
        ctx: &ExecutionContext,
        credentials: CredentialStore,
        http: AwsHttpClient,
        endpoint_override: Option<Url>,
    ) -> Result<Self> {
        Ok(Self {
            service: get_service(service)?,
            profile: ctx.profile.clone(),
            region: ctx.region.clone(),
            credentials,
            http,
            endpoint_override,
        })
    }

    /// Base URL (scheme and authority) requests are sent to
    pub fn endpoint(&self) -> String {
        match &self.endpoint_override {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => format!("https://{}", self.service.host(&self.region)),
        }
    }

    /// Host header value the signature covers
    fn host(&self) -> String {
        match &self.endpoint_override {
            Some(url) => {
                let host = url.host_str().unwrap_or("localhost");
                match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                }
            },
            None => self.service.host(&self.region),
        }
    }

    /// Sign and send a request, returning the raw response body
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<String> {
        let credentials = self
            .credentials
            .get(&self.profile)
            .await
            .with_context(|| format!("No credentials for profile '{}'", self.profile))?;

        let host = self.host();
        let signable = SignableRequest {
            method: method.as_str(),
            host: &host,
            path,
            query,
            headers: &headers,
            payload: &body,
        };
        let params = SigningParams {
            region: self.service.signing_region(&self.region),
            service: self.service.signing_name,
            time: chrono::Utc::now(),
            payload_hash_header: self.service.name == "s3",
        };
        let signature_headers = sign(&signable, &credentials, &params);

        let query_string = canonical_query(query);
        let url = if query_string.is_empty() {
            format!("{}{}", self.endpoint(), path)
        } else {
            format!("{}{}?{}", self.endpoint(), path, query_string)
        };

        let mut all_headers = headers;
        all_headers.extend(signature_headers);

        self.http
            .send(HttpRequest {
                method,
                url,
                headers: all_headers,
                body,
            })
            .await
    }

    /// Signed GET
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<String> {
        self.send(Method::GET, path, query, Vec::new(), Vec::new()).await
    }

    /// Signed POST to `/`
    pub async fn post(&self, headers: Vec<(String, String)>, body: Vec<u8>) -> Result<String> {
        self.send(Method::POST, "/", &[], headers, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::auth::Credentials;

    fn client(service: &str, endpoint: Option<&str>) -> AwsClient {
        AwsClient::new(
            service,
            &ExecutionContext::new("dev", "eu-central-1"),
            CredentialStore::fixed(Credentials::new("AKID", "secret", None)),
            AwsHttpClient::new().unwrap(),
            endpoint.map(|e| Url::parse(e).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(client("logs", None).endpoint(), "https://logs.eu-central-1.amazonaws.com");
        assert_eq!(client("s3", None).endpoint(), "https://s3.amazonaws.com");
    }

    #[test]
    fn test_endpoint_override_keeps_port_in_host() {
        let c = client("sqs", Some("http://127.0.0.1:4566/"));
        assert_eq!(c.endpoint(), "http://127.0.0.1:4566");
        assert_eq!(c.host(), "127.0.0.1:4566");
    }

    #[test]
    fn test_unknown_service_rejected() {
        let result = AwsClient::new(
            "nope",
            &ExecutionContext::new("dev", "eu-central-1"),
            CredentialStore::fixed(Credentials::new("AKID", "secret", None)),
            AwsHttpClient::new().unwrap(),
            None,
        );
        assert!(result.is_err());
    }
}
