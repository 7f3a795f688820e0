//! Scripted listing API shared by the integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_names::resource::{ExecutionContext, NameExtractor, ResourceApi, ResourceDescriptor};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub profile: String,
    pub region: String,
    pub operation: String,
    pub args: Map<String, Value>,
}

/// Serves fixed pages per operation; the cursor is the next page index
#[derive(Default)]
pub struct ScriptedApi {
    pages: HashMap<String, Vec<Vec<Value>>>,
    failing: HashSet<(String, String)>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `pages` for `operation` in every context
    pub fn pages(mut self, operation: &str, pages: Vec<Vec<Value>>) -> Self {
        self.pages.insert(operation.to_string(), pages);
        self
    }

    /// Fail `operation` in `region`
    pub fn failing(mut self, operation: &str, region: &str) -> Self {
        self.failing
            .insert((operation.to_string(), region.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }
}

#[async_trait]
impl ResourceApi for ScriptedApi {
    async fn invoke(
        &self,
        ctx: &ExecutionContext,
        _service: &str,
        operation: &str,
        args: &Map<String, Value>,
    ) -> Result<Value> {
        self.calls.lock().unwrap().push(Call {
            profile: ctx.profile.clone(),
            region: ctx.region.clone(),
            operation: operation.to_string(),
            args: args.clone(),
        });

        if self
            .failing
            .contains(&(operation.to_string(), ctx.region.clone()))
        {
            return Err(anyhow!("API request failed: 403 Forbidden (AccessDenied)"));
        }

        let pages = self
            .pages
            .get(operation)
            .ok_or_else(|| anyhow!("Unknown operation: {}", operation))?;
        let index = args
            .get("Token")
            .and_then(Value::as_str)
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0);

        let items = pages.get(index).cloned().unwrap_or_default();
        let mut response = json!({ "Items": items });
        if index + 1 < pages.len() {
            response["Next"] = json!((index + 1).to_string());
        }
        Ok(response)
    }
}

/// Paginated descriptor reading `Items[].Name`
pub fn descriptor(type_id: &str, operation: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(type_id, "svc", operation)
        .paginated("Token", "Next")
        .collection("Items")
        .name(NameExtractor::field("Name"))
}

/// Items named `{prefix}-{i}`
pub fn named(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({ "Name": format!("{}-{}", prefix, i) }))
        .collect()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
