//! SDK Dispatch
//!
//! Maps (service, operation, argument map) to a concrete AWS request for
//! the service's wire protocol and decodes the response into a JSON map.

use crate::aws::client::AwsClient;
use crate::aws::services::Protocol;
use crate::aws::xml;
use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};

/// Invoke an AWS listing operation
pub async fn invoke_sdk(
    client: &AwsClient,
    operation: &str,
    params: &Map<String, Value>,
) -> Result<Value> {
    tracing::debug!(
        "invoke_sdk: service={}, operation={}, profile={}, region={}",
        client.service.name,
        operation,
        client.profile,
        client.region
    );

    let result = match client.service.protocol {
        Protocol::Json {
            version,
            target_prefix,
        } => invoke_json(client, version, target_prefix, operation, params).await,
        Protocol::Query { version } => invoke_query(client, version, operation, params).await,
        Protocol::RestJson => invoke_rest_json(client, operation, params).await,
        Protocol::RestXml => invoke_rest_xml(client, operation, params).await,
    };

    result.with_context(|| {
        format!(
            "{}:{} failed in profile {} region {}",
            client.service.name, operation, client.profile, client.region
        )
    })
}

// =============================================================================
// AWS JSON 1.0 / 1.1
// =============================================================================

async fn invoke_json(
    client: &AwsClient,
    version: &str,
    target_prefix: &str,
    operation: &str,
    params: &Map<String, Value>,
) -> Result<Value> {
    let headers = vec![
        (
            "content-type".to_string(),
            format!("application/x-amz-json-{}", version),
        ),
        (
            "x-amz-target".to_string(),
            format!("{}.{}", target_prefix, operation),
        ),
    ];
    let body = serde_json::to_vec(params).context("Failed to encode request JSON")?;

    let response = client.post(headers, body).await?;
    parse_json_body(&response)
}

// =============================================================================
// Query (EC2, RDS, ELB, SNS, IAM)
// =============================================================================

async fn invoke_query(
    client: &AwsClient,
    version: &str,
    operation: &str,
    params: &Map<String, Value>,
) -> Result<Value> {
    let mut form = vec![
        ("Action".to_string(), operation.to_string()),
        ("Version".to_string(), version.to_string()),
    ];
    let list_style = if client.service.name == "ec2" {
        ListStyle::Ec2
    } else {
        ListStyle::Member
    };
    for (key, value) in params {
        flatten_query_param(key, value, list_style, &mut form);
    }

    let headers = vec![(
        "content-type".to_string(),
        "application/x-www-form-urlencoded; charset=utf-8".to_string(),
    )];
    let body = crate::aws::signing::canonical_query(&form).into_bytes();

    let response = client.post(headers, body).await?;
    let document = xml::to_value(&response)?;
    Ok(xml::unwrap_envelope(document, operation))
}

// =============================================================================
// REST (Lambda, API Gateway, S3)
// =============================================================================

/// Resource path of a REST listing operation
fn rest_route(service: &str, operation: &str) -> Result<&'static str> {
    match (service, operation) {
        ("lambda", "ListFunctions") => Ok("/2015-03-31/functions/"),
        ("apigateway", "GetRestApis") => Ok("/restapis"),
        ("apigatewayv2", "GetApis") => Ok("/v2/apis"),
        ("s3", "ListBuckets") => Ok("/"),
        _ => Err(anyhow!("Unknown {} operation: {}", service, operation)),
    }
}

async fn invoke_rest_json(
    client: &AwsClient,
    operation: &str,
    params: &Map<String, Value>,
) -> Result<Value> {
    let path = rest_route(client.service.name, operation)?;
    let response = client.get(path, &query_pairs(params)).await?;
    parse_json_body(&response)
}

async fn invoke_rest_xml(
    client: &AwsClient,
    operation: &str,
    params: &Map<String, Value>,
) -> Result<Value> {
    let path = rest_route(client.service.name, operation)?;
    let response = client.get(path, &query_pairs(params)).await?;
    let document = xml::to_value(&response)?;
    Ok(xml::unwrap_envelope(document, operation))
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_json_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(body).context("Failed to parse response JSON")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListStyle {
    /// `Key.member.1`
    Member,
    /// `Key.1`
    Ec2,
}

/// Flatten one argument into query-protocol form fields
fn flatten_query_param(key: &str, value: &Value, style: ListStyle, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {},
        Value::String(s) => out.push((key.to_string(), s.clone())),
        Value::Number(n) => out.push((key.to_string(), n.to_string())),
        Value::Bool(b) => out.push((key.to_string(), b.to_string())),
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let item_key = match style {
                    ListStyle::Member => format!("{}.member.{}", key, i + 1),
                    ListStyle::Ec2 => format!("{}.{}", key, i + 1),
                };
                flatten_query_param(&item_key, item, style, out);
            }
        },
        Value::Object(map) => {
            for (sub, item) in map {
                flatten_query_param(&format!("{}.{}", key, sub), item, style, out);
            }
        },
    }
}

/// Scalar and list arguments as REST query pairs
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for (key, value) in params {
        match value {
            Value::String(s) => pairs.push((key.clone(), s.clone())),
            Value::Number(n) => pairs.push((key.clone(), n.to_string())),
            Value::Bool(b) => pairs.push((key.clone(), b.to_string())),
            Value::Array(arr) => {
                for item in arr {
                    if let Value::String(s) = item {
                        pairs.push((key.clone(), s.clone()));
                    }
                }
            },
            _ => {},
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rest_routes() {
        assert_eq!(rest_route("lambda", "ListFunctions").unwrap(), "/2015-03-31/functions/");
        assert_eq!(rest_route("apigatewayv2", "GetApis").unwrap(), "/v2/apis");
        assert!(rest_route("lambda", "DeleteFunction").is_err());
    }

    #[test]
    fn test_flatten_member_lists() {
        let mut out = Vec::new();
        flatten_query_param("Names", &json!(["a", "b"]), ListStyle::Member, &mut out);
        assert_eq!(
            out,
            vec![
                ("Names.member.1".to_string(), "a".to_string()),
                ("Names.member.2".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_flatten_ec2_filters() {
        let mut out = Vec::new();
        let filters = json!([{"Name": "vpc-id", "Value": ["vpc-1"]}]);
        flatten_query_param("Filter", &filters, ListStyle::Ec2, &mut out);
        assert!(out.contains(&("Filter.1.Name".to_string(), "vpc-id".to_string())));
        assert!(out.contains(&("Filter.1.Value.1".to_string(), "vpc-1".to_string())));
    }

    #[test]
    fn test_query_pairs_skip_nested_objects() {
        let params = json!({"position": "abc", "limit": 500, "nested": {"x": 1}});
        let pairs = query_pairs(params.as_object().unwrap());
        assert!(pairs.contains(&("position".to_string(), "abc".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "500".to_string())));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_empty_json_body_is_empty_map() {
        assert_eq!(parse_json_body("").unwrap(), json!({}));
        assert!(parse_json_body("not json").is_err());
    }
}
