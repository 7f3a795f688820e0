//! HTTP utilities for AWS API calls

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use std::fmt;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull the AWS error code out of a JSON or XML error body
fn error_code(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let code = value
            .get("__type")
            .or_else(|| value.get("code"))
            .or_else(|| value.get("Code"))
            .and_then(|v| v.as_str())?;
        // "com.amazonaws.foo#ResourceNotFoundException" -> "ResourceNotFoundException"
        return Some(code.rsplit('#').next().unwrap_or(code).to_string());
    }

    let start = body.find("<Code>")? + "<Code>".len();
    let end = body[start..].find("</Code>")? + start;
    Some(body[start..end].trim().to_string())
}

/// A non-2xx answer from an AWS endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    /// AWS error code (`AccessDenied`, `Throttling`, ...) when the body carries one
    pub code: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("");
        write!(f, "API request failed: {} {}", self.status, reason)?;
        if let Some(code) = &self.code {
            write!(f, " ({})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// A fully prepared request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// HTTP client wrapper for AWS API calls
#[derive(Clone)]
pub struct AwsHttpClient {
    client: Client,
}

impl AwsHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("aws-names/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Send a request and return the response body
    pub async fn send(&self, request: HttpRequest) -> Result<String> {
        tracing::debug!("{} {}", request.method, request.url);

        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError {
                status: status.as_u16(),
                code: error_code(&body),
            }
            .into());
        }

        Ok(body)
    }
}

/// User-facing hint for an HTTP failure, chosen from its status and code
pub fn error_hint(error: &ApiError) -> &'static str {
    let code = error.code.as_deref().unwrap_or("");

    let rejected = matches!(code, "InvalidClientTokenId" | "UnrecognizedClientException");
    if error.status == 401 || rejected || code.starts_with("ExpiredToken") {
        return "Credentials rejected or expired. Refresh them (e.g. 'aws sso login').";
    }
    if code.contains("Throttl") || code == "TooManyRequestsException" || error.status == 429 {
        return "Rate limit exceeded. Try a lower --concurrency.";
    }
    if error.status == 403 || code.starts_with("AccessDenied") {
        return "Permission denied. Check the IAM permissions of this profile.";
    }
    match error.status {
        404 => "Endpoint or resource not found. Is the service available in this region?",
        400..=499 => "Invalid request. Check your parameters.",
        500..=599 => "AWS service temporarily unavailable. Please try again.",
        _ => "Request failed. Check your network connection and try again.",
    }
}

/// Format an error for display: the full cause chain, plus a hint when an
/// AWS endpoint answered with an error status
pub fn format_aws_error(error: &anyhow::Error) -> String {
    let chain = format!("{:#}", error);
    let mut message: String = chain
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();

    let api_error = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>());
    if let Some(api_error) = api_error {
        message.push_str("\nHint: ");
        message.push_str(error_hint(api_error));
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_json_type() {
        let body = r#"{"__type":"com.amazonaws.logs#AccessDeniedException","message":"no"}"#;
        assert_eq!(error_code(body).as_deref(), Some("AccessDeniedException"));
    }

    #[test]
    fn test_error_code_from_xml() {
        let body = "<ErrorResponse><Error><Type>Sender</Type><Code>Throttling</Code></Error></ErrorResponse>";
        assert_eq!(error_code(body).as_deref(), Some("Throttling"));
    }

    #[test]
    fn test_sanitize_truncates() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.starts_with(&"x".repeat(200)));
        assert!(out.contains("500 bytes total"));
    }

    fn api_error(status: u16, code: Option<&str>) -> ApiError {
        ApiError {
            status,
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            api_error(403, Some("AccessDenied")).to_string(),
            "API request failed: 403 Forbidden (AccessDenied)"
        );
        assert_eq!(
            api_error(503, None).to_string(),
            "API request failed: 503 Service Unavailable"
        );
    }

    #[test]
    fn test_hint_from_status_and_code() {
        assert!(error_hint(&api_error(403, Some("AccessDenied"))).starts_with("Permission denied"));
        assert!(error_hint(&api_error(400, Some("ExpiredToken"))).starts_with("Credentials"));
        assert!(error_hint(&api_error(400, Some("Throttling"))).starts_with("Rate limit"));
        assert!(error_hint(&api_error(404, None)).starts_with("Endpoint"));
        assert!(error_hint(&api_error(502, None)).starts_with("AWS service"));
    }

    #[test]
    fn test_format_keeps_chain_and_adds_hint() {
        let err = anyhow::Error::new(api_error(403, Some("AccessDeniedException")))
            .context("logs:DescribeLogGroups failed in profile dev region eu-west-1")
            .context("Listing loggroup in dev/eu-west-1 failed");
        let out = format_aws_error(&err);
        assert!(out.starts_with("Listing loggroup in dev/eu-west-1 failed: logs:DescribeLogGroups"));
        assert!(out.contains("403 Forbidden (AccessDeniedException)"));
        assert!(out.ends_with("Hint: Permission denied. Check the IAM permissions of this profile."));
    }

    #[test]
    fn test_digits_in_non_http_errors_give_no_hint() {
        let err = anyhow::anyhow!("Listing lambda in p1/us-east-1 timed out after 500s");
        assert_eq!(
            format_aws_error(&err),
            "Listing lambda in p1/us-east-1 timed out after 500s"
        );

        let err = anyhow::anyhow!("No credentials for profile 'acct-404'");
        assert!(!format_aws_error(&err).contains("Hint"));
    }
}
