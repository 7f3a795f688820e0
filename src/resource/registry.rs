//! Resource Registry - Load resource descriptors from JSON
//!
//! Every supported resource type is one descriptor entry in the embedded
//! JSON files. A descriptor holds everything the fetcher needs to page
//! through that type's listing operation.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/serverless.json"),
    include_str!("../resources/data.json"),
    include_str!("../resources/compute.json"),
    include_str!("../resources/devtools.json"),
    include_str!("../resources/security.json"),
];

/// Programmatic name extraction function
pub type NameFn = fn(&Value) -> Option<String>;

/// How a display name is derived from one raw item
#[derive(Clone, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum NameExtractor {
    /// Value at a dot path inside the item
    Field { path: String },
    /// The item itself is the name (lists of plain strings)
    Item,
    /// Several fields joined by a separator, no added whitespace
    Join {
        fields: Vec<String>,
        #[serde(default = "default_separator")]
        separator: String,
    },
    /// Text after the last `delimiter` of a field (or of the item itself)
    Suffix {
        #[serde(default)]
        path: Option<String>,
        delimiter: String,
    },
    /// Arbitrary function, for descriptors built in code
    #[serde(skip)]
    Custom(NameFn),
}

fn default_separator() -> String {
    ",".to_string()
}

impl fmt::Debug for NameExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { path } => write!(f, "Field({})", path),
            Self::Item => write!(f, "Item"),
            Self::Join { fields, separator } => write!(f, "Join({:?}, {:?})", fields, separator),
            Self::Suffix { path, delimiter } => write!(f, "Suffix({:?}, {:?})", path, delimiter),
            Self::Custom(_) => write!(f, "Custom(fn)"),
        }
    }
}

impl NameExtractor {
    pub fn field(path: &str) -> Self {
        Self::Field {
            path: path.to_string(),
        }
    }

    pub fn join(fields: &[&str], separator: &str) -> Self {
        Self::Join {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            separator: separator.to_string(),
        }
    }

    pub fn suffix(path: Option<&str>, delimiter: &str) -> Self {
        Self::Suffix {
            path: path.map(|p| p.to_string()),
            delimiter: delimiter.to_string(),
        }
    }

    /// Apply the rule; `None` when the item lacks what the rule needs
    pub fn extract(&self, item: &Value) -> Option<String> {
        match self {
            Self::Field { path } => lookup_path(item, path).and_then(scalar_to_string),
            Self::Item => scalar_to_string(item),
            Self::Join { fields, separator } => {
                let parts = fields
                    .iter()
                    .map(|f| lookup_path(item, f).and_then(scalar_to_string))
                    .collect::<Option<Vec<_>>>()?;
                Some(parts.join(separator))
            },
            Self::Suffix { path, delimiter } => {
                let source = match path {
                    Some(p) => lookup_path(item, p)?,
                    None => item,
                };
                let text = scalar_to_string(source)?;
                let start = text.rfind(delimiter.as_str()).map(|i| i + delimiter.len()).unwrap_or(0);
                Some(text[start..].to_string())
            },
            Self::Custom(f) => f(item),
        }
    }
}

/// Follow a dot path (numeric segments index arrays)
pub fn lookup_path<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(idx) if current.is_array() => current.get(idx)?,
            _ => current.get(part)?,
        };
    }
    Some(current)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resource type descriptor from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDescriptor {
    pub type_id: String,
    #[serde(default)]
    pub display_name: String,
    /// Owning service, selects the API client
    pub service: String,
    /// Listing operation (wire name)
    pub operation: String,
    /// Cursor field in the request
    #[serde(default)]
    pub request_token: Option<String>,
    /// Cursor field in the response
    #[serde(default)]
    pub response_token: Option<String>,
    /// Dot path to the page's items
    pub collection: String,
    pub name: NameExtractor,
    /// Fixed arguments merged into every call
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub is_global: bool,
}

impl ResourceDescriptor {
    /// Start a descriptor in code; defaults to a single-page regional listing
    pub fn new(type_id: &str, service: &str, operation: &str) -> Self {
        Self {
            type_id: type_id.to_string(),
            display_name: String::new(),
            service: service.to_string(),
            operation: operation.to_string(),
            request_token: None,
            response_token: None,
            collection: String::new(),
            name: NameExtractor::Item,
            params: Map::new(),
            is_global: false,
        }
    }

    pub fn paginated(mut self, request_token: &str, response_token: &str) -> Self {
        self.request_token = Some(request_token.to_string());
        self.response_token = Some(response_token.to_string());
        self
    }

    pub fn collection(mut self, path: &str) -> Self {
        self.collection = path.to_string();
        self
    }

    pub fn name(mut self, extractor: NameExtractor) -> Self {
        self.name = extractor;
        self
    }

    pub fn param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
struct ResourceFile {
    #[serde(default)]
    resources: Vec<ResourceDescriptor>,
}

/// Ordered, duplicate-free set of descriptors
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: Vec<ResourceDescriptor>,
}

impl Registry {
    /// Build a registry; type ids must be unique
    pub fn new(descriptors: Vec<ResourceDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.type_id.as_str()) {
                return Err(anyhow!("Duplicate resource type: {}", d.type_id));
            }
        }
        Ok(Self { descriptors })
    }

    /// Descriptor for `type_id`
    pub fn describe(&self, type_id: &str) -> Option<&ResourceDescriptor> {
        self.descriptors.iter().find(|d| d.type_id == type_id)
    }

    /// All descriptors in declaration order
    pub fn all(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    pub fn type_ids(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.type_id.as_str()).collect()
    }
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let mut descriptors = Vec::new();

        for content in RESOURCE_FILES {
            let partial: ResourceFile = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            descriptors.extend(partial.resources);
        }

        Registry::new(descriptors)
            .unwrap_or_else(|e| panic!("Invalid embedded resource registry: {}", e))
    })
}

/// Get a resource descriptor by type id
pub fn get_resource(type_id: &str) -> Option<&'static ResourceDescriptor> {
    get_registry().describe(type_id)
}

/// Get all resource type ids (for CLI validation)
pub fn get_all_resource_keys() -> Vec<&'static str> {
    get_registry().type_ids()
}
