//! Service table
//!
//! Endpoint, signing and wire-protocol facts for each AWS service the
//! registry lists resources from.

use anyhow::{anyhow, Result};

/// Wire protocol spoken by a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// AWS JSON 1.0 / 1.1: POST `/` with an `X-Amz-Target` header
    Json {
        version: &'static str,
        target_prefix: &'static str,
    },
    /// Form-encoded `Action`/`Version` POST, XML response
    Query { version: &'static str },
    /// GET on a resource path, JSON response
    RestJson,
    /// GET on a resource path, XML response
    RestXml,
}

/// Static description of one service
#[derive(Debug, Clone, Copy)]
pub struct ServiceDef {
    /// Service key used by resource descriptors
    pub name: &'static str,
    /// Host prefix: `{endpoint_prefix}.{region}.amazonaws.com`
    pub endpoint_prefix: &'static str,
    /// Service name in the SigV4 credential scope
    pub signing_name: &'static str,
    pub protocol: Protocol,
    /// Partition-global host, always signed for `us-east-1`
    pub global_host: Option<&'static str>,
}

/// Region global endpoints are signed for
pub const GLOBAL_SIGNING_REGION: &str = "us-east-1";

const SERVICES: &[ServiceDef] = &[
    ServiceDef {
        name: "lambda",
        endpoint_prefix: "lambda",
        signing_name: "lambda",
        protocol: Protocol::RestJson,
        global_host: None,
    },
    ServiceDef {
        name: "logs",
        endpoint_prefix: "logs",
        signing_name: "logs",
        protocol: Protocol::Json {
            version: "1.1",
            target_prefix: "Logs_20140328",
        },
        global_host: None,
    },
    ServiceDef {
        name: "secretsmanager",
        endpoint_prefix: "secretsmanager",
        signing_name: "secretsmanager",
        protocol: Protocol::Json {
            version: "1.1",
            target_prefix: "secretsmanager",
        },
        global_host: None,
    },
    ServiceDef {
        name: "s3",
        endpoint_prefix: "s3",
        signing_name: "s3",
        protocol: Protocol::RestXml,
        global_host: Some("s3.amazonaws.com"),
    },
    ServiceDef {
        name: "dynamodb",
        endpoint_prefix: "dynamodb",
        signing_name: "dynamodb",
        protocol: Protocol::Json {
            version: "1.0",
            target_prefix: "DynamoDB_20120810",
        },
        global_host: None,
    },
    ServiceDef {
        name: "rds",
        endpoint_prefix: "rds",
        signing_name: "rds",
        protocol: Protocol::Query {
            version: "2014-10-31",
        },
        global_host: None,
    },
    ServiceDef {
        name: "ec2",
        endpoint_prefix: "ec2",
        signing_name: "ec2",
        protocol: Protocol::Query {
            version: "2016-11-15",
        },
        global_host: None,
    },
    ServiceDef {
        name: "elb",
        endpoint_prefix: "elasticloadbalancing",
        signing_name: "elasticloadbalancing",
        protocol: Protocol::Query {
            version: "2012-06-01",
        },
        global_host: None,
    },
    ServiceDef {
        name: "elbv2",
        endpoint_prefix: "elasticloadbalancing",
        signing_name: "elasticloadbalancing",
        protocol: Protocol::Query {
            version: "2015-12-01",
        },
        global_host: None,
    },
    ServiceDef {
        name: "sqs",
        endpoint_prefix: "sqs",
        signing_name: "sqs",
        protocol: Protocol::Json {
            version: "1.0",
            target_prefix: "AmazonSQS",
        },
        global_host: None,
    },
    ServiceDef {
        name: "sns",
        endpoint_prefix: "sns",
        signing_name: "sns",
        protocol: Protocol::Query {
            version: "2010-03-31",
        },
        global_host: None,
    },
    ServiceDef {
        name: "apigateway",
        endpoint_prefix: "apigateway",
        signing_name: "apigateway",
        protocol: Protocol::RestJson,
        global_host: None,
    },
    ServiceDef {
        name: "apigatewayv2",
        endpoint_prefix: "apigateway",
        signing_name: "apigateway",
        protocol: Protocol::RestJson,
        global_host: None,
    },
    ServiceDef {
        name: "events",
        endpoint_prefix: "events",
        signing_name: "events",
        protocol: Protocol::Json {
            version: "1.1",
            target_prefix: "AWSEvents",
        },
        global_host: None,
    },
    ServiceDef {
        name: "codebuild",
        endpoint_prefix: "codebuild",
        signing_name: "codebuild",
        protocol: Protocol::Json {
            version: "1.1",
            target_prefix: "CodeBuild_20161006",
        },
        global_host: None,
    },
    ServiceDef {
        name: "codepipeline",
        endpoint_prefix: "codepipeline",
        signing_name: "codepipeline",
        protocol: Protocol::Json {
            version: "1.1",
            target_prefix: "CodePipeline_20150709",
        },
        global_host: None,
    },
    ServiceDef {
        name: "wafv2",
        endpoint_prefix: "wafv2",
        signing_name: "wafv2",
        protocol: Protocol::Json {
            version: "1.1",
            target_prefix: "AWSWAF_20190729",
        },
        global_host: None,
    },
    ServiceDef {
        name: "iam",
        endpoint_prefix: "iam",
        signing_name: "iam",
        protocol: Protocol::Query {
            version: "2010-05-08",
        },
        global_host: Some("iam.amazonaws.com"),
    },
];

/// Look up a service by key
pub fn get_service(name: &str) -> Result<&'static ServiceDef> {
    SERVICES
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| anyhow!("Unknown service: {}", name))
}

/// All known service keys
pub fn service_names() -> impl Iterator<Item = &'static str> {
    SERVICES.iter().map(|s| s.name)
}

impl ServiceDef {
    /// Host serving this service in `region`
    pub fn host(&self, region: &str) -> String {
        match self.global_host {
            Some(host) => host.to_string(),
            None => format!("{}.{}.amazonaws.com", self.endpoint_prefix, region),
        }
    }

    /// Region the request must be signed for
    pub fn signing_region<'a>(&self, region: &'a str) -> &'a str {
        if self.global_host.is_some() {
            GLOBAL_SIGNING_REGION
        } else {
            region
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_host() {
        let svc = get_service("elbv2").unwrap();
        assert_eq!(svc.host("eu-west-1"), "elasticloadbalancing.eu-west-1.amazonaws.com");
        assert_eq!(svc.signing_region("eu-west-1"), "eu-west-1");
    }

    #[test]
    fn test_global_host_signs_for_us_east_1() {
        let svc = get_service("iam").unwrap();
        assert_eq!(svc.host("ap-south-1"), "iam.amazonaws.com");
        assert_eq!(svc.signing_region("ap-south-1"), "us-east-1");
    }

    #[test]
    fn test_unknown_service() {
        assert!(get_service("mainframe").is_err());
    }

    #[test]
    fn test_service_names_unique() {
        let mut names: Vec<_> = service_names().collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
