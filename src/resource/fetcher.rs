//! Resource Fetcher
//!
//! The pagination cursor walk: call the descriptor's listing operation,
//! follow its cursor until the response carries none, and turn every item
//! into a [`ResourceRecord`]. Every resource type is a configuration of
//! this one loop.

use super::api::ResourceApi;
use super::record::{ExecutionContext, ResourceRecord};
use super::registry::{lookup_path, ResourceDescriptor};
use anyhow::{anyhow, bail, Result};
use futures::stream::{self, Stream, TryStreamExt};
use serde_json::{Map, Value};

/// One page of raw items
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_token: Option<Value>,
}

/// Where the walk stands between pages
#[derive(Debug, Clone)]
enum Cursor {
    Start,
    Next(Value),
    Done,
}

/// Call arguments for one page: fixed params plus the cursor when present
pub fn build_args(descriptor: &ResourceDescriptor, token: Option<&Value>) -> Map<String, Value> {
    let mut args = descriptor.params.clone();

    // No key at all on the first call; some APIs reject an empty token
    if let (Some(field), Some(token)) = (descriptor.request_token.as_deref(), token) {
        args.insert(field.to_string(), token.clone());
    }

    args
}

/// Fetch one page of raw items
pub async fn fetch_page<A: ResourceApi + ?Sized>(
    api: &A,
    descriptor: &ResourceDescriptor,
    ctx: &ExecutionContext,
    token: Option<&Value>,
) -> Result<Page> {
    let args = build_args(descriptor, token);

    let response = api
        .invoke(ctx, &descriptor.service, &descriptor.operation, &args)
        .await?;

    let items = extract_items(&response, &descriptor.collection).map_err(|e| {
        anyhow!(
            "Malformed {} response for {}: {}",
            descriptor.operation,
            descriptor.type_id,
            e
        )
    })?;
    let next_token = next_token(&response, descriptor.response_token.as_deref());

    Ok(Page { items, next_token })
}

/// Extract items from the response using the collection path
///
/// A missing or null collection is an empty page. Arrays met before the
/// last path segment are flattened.
pub fn extract_items(response: &Value, path: &str) -> Result<Vec<Value>> {
    let mut current: Vec<&Value> = vec![response];

    if !path.is_empty() {
        for part in path.split('.') {
            let mut next = Vec::new();
            for value in current {
                match value {
                    Value::Array(arr) => {
                        next.extend(arr.iter().filter_map(|v| v.get(part)));
                    },
                    other => next.extend(other.get(part)),
                }
            }
            current = next;
        }
    }

    let mut items = Vec::new();
    for value in current {
        match value {
            Value::Array(arr) => items.extend(arr.iter().cloned()),
            Value::Null => {},
            other => bail!("'{}' is not a list (found {})", path, kind(other)),
        }
    }
    Ok(items)
}

/// Read the next cursor; absent, null, empty and `false` all end the walk
pub fn next_token(response: &Value, field: Option<&str>) -> Option<Value> {
    let token = lookup_path(response, field?)?;
    let present = match token {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Number(_) | Value::Bool(true) => true,
    };
    present.then(|| token.clone())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Turn one raw item into a record
fn to_record(
    descriptor: &ResourceDescriptor,
    ctx: &ExecutionContext,
    item: &Value,
) -> Result<ResourceRecord> {
    let name = descriptor.name.extract(item).ok_or_else(|| {
        anyhow!(
            "Cannot extract {} name with {:?} from item {}",
            descriptor.type_id,
            descriptor.name,
            truncate(&item.to_string(), 120)
        )
    })?;
    Ok(ResourceRecord::new(ctx, &descriptor.type_id, name))
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

async fn next_page<A: ResourceApi + ?Sized>(
    api: &A,
    descriptor: &ResourceDescriptor,
    ctx: &ExecutionContext,
    cursor: Cursor,
) -> Result<Option<(Vec<ResourceRecord>, Cursor)>> {
    let token = match cursor {
        Cursor::Done => return Ok(None),
        Cursor::Start => None,
        Cursor::Next(token) => Some(token),
    };

    let page = fetch_page(api, descriptor, ctx, token.as_ref()).await?;
    let records = page
        .items
        .iter()
        .map(|item| to_record(descriptor, ctx, item))
        .collect::<Result<Vec<_>>>()?;

    let cursor = match page.next_token {
        Some(token) => Cursor::Next(token),
        None => Cursor::Done,
    };
    Ok(Some((records, cursor)))
}

/// Walk every page of `descriptor` in `ctx`, lazily yielding records
///
/// Pages are requested only as the stream is polled. There is no page
/// bound: the walk ends when a response carries no cursor.
pub fn walk_names<'a, A: ResourceApi + ?Sized>(
    api: &'a A,
    descriptor: &'a ResourceDescriptor,
    ctx: &'a ExecutionContext,
) -> impl Stream<Item = Result<ResourceRecord>> + 'a {
    stream::try_unfold(Cursor::Start, move |cursor| next_page(api, descriptor, ctx, cursor))
        .map_ok(|records| stream::iter(records.into_iter().map(Ok::<_, anyhow::Error>)))
        .try_flatten()
}
