//! lshw Tree Model
//!
//! Typed view of the hardware-lister JSON tree. Each node carries a class
//! discriminator and its children; field values of the wrong JSON type are
//! dropped with a [`ParseWarning`] instead of failing the whole tree.
//!
//! Accepted root shapes:
//!
//! - an object (classic `lshw -json`)
//! - a one-element array holding that object (newer lshw releases)
//! - a JSON string containing either of the above

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{HardwareCategory, ParseWarning};
use crate::error::{Error, Result};

/// Class discriminator of an lshw node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeClass {
    System,
    Bus,
    Bridge,
    Chassis,
    Motherboard,
    Processor,
    Memory,
    Bank,
    Disk,
    Storage,
    Display,
    Network,
    Power,
    Multimedia,
    /// Any class the extractor ignores (input, volume, generic, ...)
    Other(String),
}

impl NodeClass {
    pub fn parse(class: &str) -> Self {
        match class.trim().to_ascii_lowercase().as_str() {
            "system" => NodeClass::System,
            "bus" => NodeClass::Bus,
            "bridge" => NodeClass::Bridge,
            "chassis" => NodeClass::Chassis,
            "motherboard" => NodeClass::Motherboard,
            "processor" => NodeClass::Processor,
            "memory" => NodeClass::Memory,
            "bank" => NodeClass::Bank,
            "disk" => NodeClass::Disk,
            "storage" => NodeClass::Storage,
            "display" => NodeClass::Display,
            "network" => NodeClass::Network,
            "power" => NodeClass::Power,
            "multimedia" => NodeClass::Multimedia,
            other => NodeClass::Other(other.to_string()),
        }
    }

    /// Fact category a node of this class feeds.
    pub fn category(&self) -> HardwareCategory {
        match self {
            NodeClass::System
            | NodeClass::Bus
            | NodeClass::Bridge
            | NodeClass::Chassis
            | NodeClass::Motherboard => HardwareCategory::System,
            NodeClass::Processor => HardwareCategory::Processor,
            NodeClass::Memory | NodeClass::Bank => HardwareCategory::Memory,
            NodeClass::Disk | NodeClass::Storage => HardwareCategory::Storage,
            NodeClass::Display => HardwareCategory::Display,
            NodeClass::Network => HardwareCategory::Network,
            NodeClass::Power => HardwareCategory::Power,
            NodeClass::Multimedia => HardwareCategory::Multimedia,
            NodeClass::Other(_) => HardwareCategory::Tree,
        }
    }
}

/// One node of the lshw tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LshwNode {
    /// Slash-separated id chain from the root, e.g. `/computer/core/memory`
    pub path: String,
    pub depth: usize,
    pub class: NodeClass,
    pub id: Option<String>,
    pub description: Option<String>,
    pub product: Option<String>,
    pub vendor: Option<String>,
    pub serial: Option<String>,
    pub slot: Option<String>,
    pub uuid: Option<String>,
    /// Every `logicalname` entry; lshw emits a string or a list
    pub logical_names: Vec<String>,
    pub size: Option<u64>,
    pub capacity: Option<u64>,
    pub units: Option<String>,
    pub configuration: BTreeMap<String, String>,
    pub children: Vec<LshwNode>,
}

impl LshwNode {
    /// Parse the `lshw` source payload into a tree.
    ///
    /// Only an unusable root is an error; everything below the root degrades
    /// to warnings.
    pub fn parse_root(source: &Value, max_depth: usize) -> Result<(LshwNode, Vec<ParseWarning>)> {
        let owned;
        let root = match source {
            Value::String(text) => {
                owned = serde_json::from_str::<Value>(text).map_err(|e| {
                    Error::MalformedTree(format!("lshw source is not JSON text: {}", e))
                })?;
                unwrap_root(&owned)?
            }
            other => unwrap_root(other)?,
        };

        let mut warnings = Vec::new();
        let node = LshwNode::from_object(root, "", 0, 0, max_depth, &mut warnings);
        Ok((node, warnings))
    }

    fn from_object(
        obj: &Map<String, Value>,
        parent_path: &str,
        index: usize,
        depth: usize,
        max_depth: usize,
        warnings: &mut Vec<ParseWarning>,
    ) -> LshwNode {
        let class = match obj.get("class") {
            Some(Value::String(s)) => NodeClass::parse(s),
            _ => NodeClass::Other(String::new()),
        };
        let category = class.category();

        let id = obj.get("id").and_then(Value::as_str).map(str::to_string);
        let segment = match &id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("node[{}]", index),
        };
        let path = format!("{}/{}", parent_path, segment);

        let mut fields = FieldReader {
            obj,
            path: &path,
            category,
            warnings: &mut *warnings,
        };

        let description = fields.text("description");
        let product = fields.text("product");
        let vendor = fields.text("vendor");
        let serial = fields.text("serial").or_else(|| fields.text("serial-number"));
        let slot = fields.text("slot");
        let uuid = fields.text("uuid");
        let logical_names = fields.logical_names();
        let size = fields.unsigned("size");
        let capacity = fields.unsigned("capacity");
        let units = fields.text("units");
        let configuration = fields.configuration();

        let mut children = Vec::new();
        match obj.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let Some(child) = item.as_object() else {
                        warnings.push(ParseWarning::new(
                            category,
                            &path,
                            format!("child {} is not an object", i),
                        ));
                        continue;
                    };
                    if depth + 1 > max_depth {
                        warnings.push(ParseWarning::new(
                            HardwareCategory::Tree,
                            &path,
                            format!("subtree deeper than {} levels dropped", max_depth),
                        ));
                        break;
                    }
                    children.push(LshwNode::from_object(
                        child,
                        &path,
                        i,
                        depth + 1,
                        max_depth,
                        warnings,
                    ));
                }
            }
            Some(_) => warnings.push(ParseWarning::new(category, &path, "children is not a list")),
        }

        LshwNode {
            path,
            depth,
            class,
            id,
            description,
            product,
            vendor,
            serial,
            slot,
            uuid,
            logical_names,
            size,
            capacity,
            units,
            configuration,
            children,
        }
    }

    /// First logical name, e.g. `/dev/sda`.
    pub fn logical_name(&self) -> Option<&str> {
        self.logical_names.first().map(String::as_str)
    }

    /// Configuration value by key.
    pub fn config(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).map(String::as_str)
    }

    /// Size in bytes, if the node reports its size in bytes.
    pub fn size_in_bytes(&self) -> std::result::Result<Option<u64>, String> {
        match self.units.as_deref() {
            None => Ok(self.size),
            Some(u) if u.eq_ignore_ascii_case("bytes") => Ok(self.size),
            Some(other) if self.size.is_some() => {
                Err(format!("size reported in '{}', not bytes", other))
            }
            Some(_) => Ok(None),
        }
    }

    /// True when `needle` (lowercase) occurs in the id or description.
    pub fn mentions(&self, needle: &str) -> bool {
        [self.id.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .any(|text| text.to_ascii_lowercase().contains(needle))
    }

    /// Depth-first, pre-order iteration over this node and its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &LshwNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

fn unwrap_root(value: &Value) -> Result<&Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(items) => match items.as_slice() {
            [Value::Object(map)] => Ok(map),
            _ => Err(Error::MalformedTree(format!(
                "expected a single root node, found an array of {} items",
                items.len()
            ))),
        },
        Value::String(_) => Err(Error::MalformedTree(
            "lshw source is doubly encoded".into(),
        )),
        other => Err(Error::MalformedTree(format!(
            "expected an object, found {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads typed fields off one node, recording a warning per bad field.
struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    path: &'a str,
    category: HardwareCategory,
    warnings: &'a mut Vec<ParseWarning>,
}

impl FieldReader<'_> {
    fn warn(&mut self, key: &str, value: &Value) {
        self.warnings.push(ParseWarning::new(
            self.category,
            self.path,
            format!("field '{}' has unexpected type {}", key, json_type(value)),
        ));
    }

    fn text(&mut self, key: &str) -> Option<String> {
        match self.obj.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            other => {
                self.warn(key, other);
                None
            }
        }
    }

    fn unsigned(&mut self, key: &str) -> Option<u64> {
        let value = self.obj.get(key)?;
        let parsed = match value {
            Value::Null => return None,
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && *f < u64::MAX as f64)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.warn(key, value);
        }
        parsed
    }

    fn logical_names(&mut self) -> Vec<String> {
        match self.obj.get("logicalname") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(other) => {
                self.warn("logicalname", other);
                Vec::new()
            }
        }
    }

    fn configuration(&mut self) -> BTreeMap<String, String> {
        match self.obj.get("configuration") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((k.clone(), text))
                })
                .collect(),
            Some(other) => {
                self.warn("configuration", other);
                BTreeMap::new()
            }
        }
    }
}
