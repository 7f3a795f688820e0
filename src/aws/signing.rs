//! AWS Signature Version 4
//!
//! Computes the `Authorization` header (and the companion `x-amz-*`
//! headers) for a request about to be sent to an AWS endpoint.

use super::auth::Credentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Parts of a request that take part in the signature
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    /// Unencoded query pairs
    pub query: &'a [(String, String)],
    /// Extra headers to sign (name, value); `host` and `x-amz-date` are added
    pub headers: &'a [(String, String)],
    pub payload: &'a [u8],
}

/// Scope of a signature
#[derive(Debug, Clone)]
pub struct SigningParams<'a> {
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
    /// S3 requires the payload hash to be sent as a header
    pub payload_hash_header: bool,
}

/// Sign a request and return the headers to attach to it
pub fn sign(
    request: &SignableRequest<'_>,
    credentials: &Credentials,
    params: &SigningParams<'_>,
) -> Vec<(String, String)> {
    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();
    let payload_hash = hex_sha256(request.payload);

    let mut added = vec![("x-amz-date".to_string(), amz_date.clone())];
    if params.payload_hash_header {
        added.push(("x-amz-content-sha256".to_string(), payload_hash.clone()));
    }
    if let Some(token) = credentials.session_token.as_deref() {
        added.push(("x-amz-security-token".to_string(), token.to_string()));
    }

    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .chain(added.iter())
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    headers.push(("host".to_string(), request.host.to_string()));
    headers.sort();

    let signed_headers = headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical = canonical_request(request, &headers, &signed_headers, &payload_hash);
    let scope = format!("{}/{}/{}/aws4_request", date, params.region, params.service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex_sha256(canonical.as_bytes())
    );

    let key = signing_key(
        &credentials.secret_access_key,
        &date,
        params.region,
        params.service,
    );
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    added.push((
        "authorization".to_string(),
        format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
        ),
    ));
    added
}

/// Build the canonical request string
fn canonical_request(
    request: &SignableRequest<'_>,
    headers: &[(String, String)],
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    let path = if request.path.is_empty() { "/" } else { request.path };

    let mut canonical_headers = String::new();
    for (name, value) in headers {
        canonical_headers.push_str(name);
        canonical_headers.push(':');
        canonical_headers.push_str(value);
        canonical_headers.push('\n');
    }

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method,
        path,
        canonical_query(request.query),
        canonical_headers,
        signed_headers,
        payload_hash
    )
}

/// Encode query pairs sorted by key, then value
///
/// The same string is used on the wire so the signed and sent query agree.
pub fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| (urlencoding::encode(k).into_owned(), urlencoding::encode(v).into_owned()))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Derive the per-day signing key
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn example_credentials() -> Credentials {
        Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            None,
        )
    }

    #[test]
    fn test_signing_key_matches_published_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_get_vanilla_signature() {
        let request = SignableRequest {
            method: "GET",
            host: "example.amazonaws.com",
            path: "/",
            query: &[],
            headers: &[],
            payload: b"",
        };
        let params = SigningParams {
            region: "us-east-1",
            service: "service",
            time: Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap(),
            payload_hash_header: false,
        };

        let headers = sign(&request, &example_credentials(), &params);
        let auth = headers
            .iter()
            .find(|(k, _)| k == "authorization")
            .map(|(_, v)| v.as_str())
            .unwrap();

        assert_eq!(
            auth,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
        assert!(headers.iter().any(|(k, v)| k == "x-amz-date" && v == "20150830T123600Z"));
    }

    #[test]
    fn test_session_token_is_signed() {
        let creds = Credentials::new("AKID", "secret", Some("session".to_string()));
        let request = SignableRequest {
            method: "POST",
            host: "logs.eu-west-1.amazonaws.com",
            path: "/",
            query: &[],
            headers: &[("X-Amz-Target".to_string(), "Logs_20140328.DescribeLogGroups".to_string())],
            payload: b"{}",
        };
        let params = SigningParams {
            region: "eu-west-1",
            service: "logs",
            time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            payload_hash_header: false,
        };

        let headers = sign(&request, &creds, &params);
        assert!(headers.iter().any(|(k, v)| k == "x-amz-security-token" && v == "session"));
        let auth = &headers.last().unwrap().1;
        assert!(auth.contains("SignedHeaders=host;x-amz-date;x-amz-security-token;x-amz-target"));
    }

    #[test]
    fn test_canonical_query_sorts_and_encodes() {
        let query = vec![
            ("position".to_string(), "a b/c".to_string()),
            ("limit".to_string(), "500".to_string()),
        ];
        assert_eq!(canonical_query(&query), "limit=500&position=a%20b%2Fc");
    }
}
