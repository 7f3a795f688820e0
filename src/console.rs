//! Console links
//!
//! Deep links into the AWS web console for an output record. Names built
//! by a `join` rule (`id,name`) are split back into their parts.

use crate::resource::ResourceRecord;

/// Part `i` of a comma-joined name
fn name_part(record: &ResourceRecord, i: usize) -> &str {
    record.name.split(',').nth(i).unwrap_or("")
}

/// Console URL for a record, `None` for types without a console page
pub fn console_url(record: &ResourceRecord) -> Option<String> {
    let rg = record.region.as_str();
    let rn = record.name.as_str();
    let base = format!("https://{rg}.console.aws.amazon.com");

    let url = match record.type_id.as_str() {
        "lambda" => format!("{base}/lambda/home?region={rg}#/functions/{rn}"),
        "loggroup" => {
            // The console expects the log group name encoded twice
            let once = urlencoding::encode(rn);
            let twice = urlencoding::encode(&once);
            format!("{base}/cloudwatch/home?region={rg}#logsV2:log-groups/log-group/{twice}")
        },
        "secret" => format!("{base}/secretsmanager/secret?name={rn}&region={rg}"),
        "bucket" => format!("https://s3.console.aws.amazon.com/s3/buckets/{rn}?tab=objects"),
        "dynamodb" => format!(
            "{base}/dynamodbv2/home?region={rg}#item-explorer?initialTagKey=&maximize=true&table={rn}"
        ),
        "rds-cluster" => format!(
            "{base}/rds/home?region={rg}#database:id={rn};is-cluster=true;tab=configuration"
        ),
        "rds-db" => format!(
            "{base}/rds/home?region={rg}#database:id={rn};is-cluster=false;tab=configuration"
        ),
        "security-group" => format!(
            "{base}/ec2/v2/home?region={rg}#SecurityGroup:groupId={}",
            name_part(record, 0)
        ),
        "elb" | "elb-v2" => format!(
            "{base}/ec2/v2/home?region={rg}#LoadBalancers:search={rn};sort=loadBalancerName"
        ),
        "sqs" => format!(
            "{base}/sqs/v2/home?region={rg}#/queues/{}",
            urlencoding::encode(rn)
        ),
        "sns" => format!("{base}/sns/v3/home?region={rg}#/topics"),
        "api" => format!(
            "{base}/apigateway/home?region={rg}#/apis/{}/resources",
            name_part(record, 0)
        ),
        "api-v2" => format!(
            "{base}/apigateway/home?region={rg}#/apis/{}/routes",
            name_part(record, 0)
        ),
        "web-acl" => format!(
            "https://us-east-1.console.aws.amazon.com/wafv2/homev2/web-acl/{}/{}/overview?region={rg}",
            name_part(record, 0),
            name_part(record, 1)
        ),
        "waf-ip-set" => format!(
            "https://us-east-1.console.aws.amazon.com/wafv2/homev2/ip-set/{}/{}?region={rg}",
            name_part(record, 0),
            name_part(record, 1)
        ),
        "codebuild" => {
            format!("{base}/codesuite/codebuild/projects/{rn}/history?region={rg}")
        },
        "codepipeline" => {
            format!("{base}/codesuite/codepipeline/pipelines/{rn}/view?region={rg}")
        },
        "subnet" => format!(
            "{base}/vpc/home?region={rg}#SubnetDetails:subnetId={}",
            name_part(record, 0)
        ),
        "ec2" => format!(
            "{base}/ec2/home?region={rg}#InstanceDetails:instanceId={}",
            name_part(record, 0)
        ),
        "role" => format!(
            "https://us-east-1.console.aws.amazon.com/iamv2/home#/roles/details/{rn}?section=permissions"
        ),
        "event-rule" => format!(
            "{base}/events/home?region={rg}#/eventbus/default/rules/{}",
            name_part(record, 0)
        ),
        _ => return None,
    };

    Some(url)
}
