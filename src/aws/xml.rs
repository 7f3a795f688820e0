//! XML response decoding
//!
//! Query-protocol services (EC2, RDS, ELB, SNS, IAM) and S3 answer in XML.
//! Bodies are decoded into the same `serde_json::Value` shape the JSON
//! services return, so the fetcher reads every response the same way.
//!
//! Rules:
//! - a leaf element becomes its untrimmed text, or `null` when it is empty
//!   or holds only whitespace
//! - an element whose children all carry the list tag (`member`, `item`,
//!   or the singular of the element's own name) becomes an array
//! - otherwise an element becomes an object; repeated child names collapse
//!   into an array

use anyhow::{anyhow, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

struct Frame {
    name: String,
    children: Vec<(String, Value)>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> (String, Value) {
        if self.children.is_empty() {
            // Leaf text is kept verbatim; whitespace-only content is an empty element
            let value = if self.text.trim().is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            };
            return (self.name, value);
        }

        if is_list(&self.name, &self.children) {
            let items = self.children.into_iter().map(|(_, v)| v).collect();
            return (self.name, Value::Array(items));
        }

        let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
        for (key, value) in self.children {
            match grouped.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value),
                None => grouped.push((key, vec![value])),
            }
        }

        let mut map = Map::new();
        for (key, mut values) in grouped {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            map.insert(key, value);
        }
        (self.name, Value::Object(map))
    }
}

/// Does `name` wrap a list of `children`?
fn is_list(name: &str, children: &[(String, Value)]) -> bool {
    let Some((tag, _)) = children.first() else {
        return false;
    };
    if !children.iter().all(|(t, _)| t == tag) {
        return false;
    }

    tag == "member" || tag == "item" || is_plural_of(name, tag)
}

/// `Buckets`/`Bucket`, `Aliases`/`Alias`, `Policies`/`Policy`
fn is_plural_of(plural: &str, singular: &str) -> bool {
    if plural.strip_suffix('s') == Some(singular) || plural.strip_suffix("es") == Some(singular) {
        return true;
    }
    match (plural.strip_suffix("ies"), singular.strip_suffix('y')) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Decode an XML document into `{ root_name: value }`
pub fn to_value(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);

    let mut stack = vec![Frame::new(String::new())];

    loop {
        match reader.read_event().context("Failed to parse response XML")? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            },
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push((name, Value::Null));
                }
            },
            Event::Text(t) => {
                let text = t.unescape().context("Invalid XML text")?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            },
            Event::CData(c) => {
                let raw = c.into_inner();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&raw));
                }
            },
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(anyhow!("Unbalanced XML end tag"));
                }
                let (name, value) = stack.pop().map(Frame::into_value).unwrap_or_default();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push((name, value));
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if stack.len() != 1 {
        return Err(anyhow!("Truncated XML document"));
    }

    let mut map = Map::new();
    if let Some(root) = stack.pop() {
        for (name, value) in root.children {
            map.insert(name, value);
        }
    }
    Ok(Value::Object(map))
}

/// Strip the `<OpResponse>` / `<OpResult>` envelope of a query-protocol body
pub fn unwrap_envelope(document: Value, operation: &str) -> Value {
    let response_key = format!("{}Response", operation);
    let result_key = format!("{}Result", operation);

    let inner = match document {
        Value::Object(mut map) => match map.remove(&response_key) {
            Some(inner) => inner,
            None if map.len() == 1 => map.into_iter().next().map(|(_, v)| v).unwrap_or_default(),
            None => Value::Object(map),
        },
        other => other,
    };

    match inner {
        Value::Object(mut map) => match map.remove(&result_key) {
            Some(result) => result,
            None => Value::Object(map),
        },
        other => other,
    }
}
