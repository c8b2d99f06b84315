//! Plain-value binding layer.
//!
//! [`Value`] is the untyped bridge between node trees and host data: scalars
//! resolve to null/bool/integer/float/string following the node's tag (or
//! type sniffing when untagged), and collections become vectors and maps.
//! The [`ToYaml`] / [`FromYaml`] traits are the capabilities host types
//! implement to take part in `marshal` / `unmarshal`.

use std::collections::HashMap;

use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::node::{Entry, Node, NodeBody, ScalarStyle};

/// An untyped YAML value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Arbitrary-precision integer.
    Integer(BigInt),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(HashMap<String, Value>),
}

impl Value {
    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a reference to the integer if this is an `Integer`.
    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the float value if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the items if this is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a reference to the map if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Decodes a node tree into a plain value. A document decodes to its
    /// first content node; duplicate mapping keys resolve last-wins.
    pub fn from_node(node: &Node) -> Value {
        match &node.body {
            NodeBody::Document { content } => content
                .first()
                .map(Value::from_node)
                .unwrap_or(Value::Null),
            NodeBody::Scalar { value, .. } => parse_scalar_value(value, &node.tag),
            NodeBody::Mapping { entries, .. } => Value::Mapping(
                entries
                    .iter()
                    .map(|e| (e.key.key_string(), Value::from_node(&e.value)))
                    .collect(),
            ),
            NodeBody::Sequence { items, .. } => {
                Value::Sequence(items.iter().map(Value::from_node).collect())
            }
            NodeBody::Alias { .. } => Value::Null,
        }
    }

    /// Encodes a plain value into a node tree. Mapping keys are emitted in
    /// sorted order; strings pick a style that survives re-parsing.
    pub fn to_node(&self) -> Node {
        match self {
            Value::Null => {
                let mut node = Node::scalar("null");
                node.tag = "!!null".to_string();
                node
            }
            Value::Bool(b) => {
                let mut node = Node::scalar(b.to_string());
                node.tag = "!!bool".to_string();
                node
            }
            Value::Integer(n) => {
                let mut node = Node::scalar(n.to_string());
                node.tag = "!!int".to_string();
                node
            }
            Value::Float(f) => {
                let mut node = Node::scalar(format_float(*f));
                node.tag = "!!float".to_string();
                node
            }
            Value::String(s) => string_node(s),
            Value::Sequence(values) => {
                let mut node = Node::sequence();
                if let NodeBody::Sequence { items, .. } = &mut node.body {
                    *items = values.iter().map(Value::to_node).collect();
                }
                node
            }
            Value::Mapping(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut node = Node::mapping();
                if let NodeBody::Mapping { entries, .. } = &mut node.body {
                    for key in keys {
                        entries.push(Entry::new(Node::scalar(key.clone()), map[key].to_node()));
                    }
                }
                node
            }
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

/// Picks a node representation for a string: literal blocks for multiline
/// text with significant spacing, folded blocks for other multiline text,
/// and plain scalars otherwise (the emitter quotes ambiguous ones).
fn string_node(s: &str) -> Node {
    let mut node = if s.contains('\n') {
        if s.contains("  ") || s.starts_with(' ') || s.ends_with(' ') {
            Node::styled_scalar(s, ScalarStyle::Literal)
        } else {
            Node::styled_scalar(s, ScalarStyle::Folded)
        }
    } else {
        Node::scalar(s)
    };
    node.tag = "!!str".to_string();
    node
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { ".inf" } else { "-.inf" };
        text.to_string()
    } else {
        // {:?} keeps a decimal point or exponent, so the text re-reads as a
        // float rather than an integer.
        format!("{:?}", f)
    }
}

/// Resolves scalar text using the tag, falling back to sniffing
/// bool → int → float → string.
fn parse_scalar_value(value: &str, tag: &str) -> Value {
    if tag == "!!null" || value.is_empty() || value == "null" || value == "~" {
        return Value::Null;
    }

    if tag == "!!bool" {
        if let Some(b) = parse_bool(value) {
            return Value::Bool(b);
        }
    }
    if tag == "!!int" {
        if let Some(n) = parse_int(value) {
            return Value::Integer(n);
        }
    }
    if tag == "!!float" {
        if let Some(f) = parse_float(value) {
            return Value::Float(f);
        }
    }
    if tag == "!!str" {
        return Value::String(value.to_string());
    }

    if let Some(b) = parse_bool(value) {
        return Value::Bool(b);
    }
    if let Some(n) = parse_int(value) {
        return Value::Integer(n);
    }
    if let Some(f) = parse_float(value) {
        return Value::Float(f);
    }
    Value::String(value.to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
    {
        return Some(true);
    }
    if value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")
        || value.eq_ignore_ascii_case("off")
    {
        return Some(false);
    }
    None
}

fn parse_int(value: &str) -> Option<BigInt> {
    let cleaned = value.replace('_', "");
    if let Some(hex) = cleaned.strip_prefix("0x") {
        return BigInt::parse_bytes(hex.as_bytes(), 16);
    }
    if let Some(octal) = cleaned.strip_prefix("0o") {
        return BigInt::parse_bytes(octal.as_bytes(), 8);
    }
    if let Some(binary) = cleaned.strip_prefix("0b") {
        return BigInt::parse_bytes(binary.as_bytes(), 2);
    }
    cleaned.parse::<BigInt>().ok()
}

fn parse_float(value: &str) -> Option<f64> {
    let cleaned = value.replace('_', "");
    match cleaned.as_str() {
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        ".nan" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Mapping(map)
    }
}

/// Capability to render a host value as a [`Value`] for marshalling.
pub trait ToYaml {
    fn to_yaml(&self) -> Value;
}

/// Capability to rebuild a host value from a [`Value`] after parsing.
pub trait FromYaml: Sized {
    fn from_yaml(value: &Value) -> Result<Self>;
}

impl ToYaml for Value {
    fn to_yaml(&self) -> Value {
        self.clone()
    }
}

impl FromYaml for Value {
    fn from_yaml(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl ToYaml for bool {
    fn to_yaml(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromYaml for bool {
    fn from_yaml(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| decode_error(value, "bool"))
    }
}

impl ToYaml for i64 {
    fn to_yaml(&self) -> Value {
        Value::Integer(BigInt::from(*self))
    }
}

impl FromYaml for i64 {
    fn from_yaml(value: &Value) -> Result<Self> {
        let n = value.as_integer().ok_or_else(|| decode_error(value, "i64"))?;
        i64::try_from(n).map_err(|_| decode_error(value, "i64"))
    }
}

impl ToYaml for BigInt {
    fn to_yaml(&self) -> Value {
        Value::Integer(self.clone())
    }
}

impl FromYaml for BigInt {
    fn from_yaml(value: &Value) -> Result<Self> {
        value
            .as_integer()
            .cloned()
            .ok_or_else(|| decode_error(value, "integer"))
    }
}

impl ToYaml for f64 {
    fn to_yaml(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromYaml for f64 {
    fn from_yaml(value: &Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Integer(n) => i64::try_from(n)
                .map(|i| i as f64)
                .map_err(|_| decode_error(value, "f64")),
            _ => Err(decode_error(value, "f64")),
        }
    }
}

impl ToYaml for String {
    fn to_yaml(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromYaml for String {
    fn from_yaml(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| decode_error(value, "string"))
    }
}

impl ToYaml for str {
    fn to_yaml(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: ToYaml> ToYaml for Vec<T> {
    fn to_yaml(&self) -> Value {
        Value::Sequence(self.iter().map(ToYaml::to_yaml).collect())
    }
}

impl<T: FromYaml> FromYaml for Vec<T> {
    fn from_yaml(value: &Value) -> Result<Self> {
        let items = value
            .as_sequence()
            .ok_or_else(|| decode_error(value, "sequence"))?;
        items.iter().map(T::from_yaml).collect()
    }
}

impl<T: ToYaml> ToYaml for HashMap<String, T> {
    fn to_yaml(&self) -> Value {
        Value::Mapping(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_yaml()))
                .collect(),
        )
    }
}

impl<T: FromYaml> FromYaml for HashMap<String, T> {
    fn from_yaml(value: &Value) -> Result<Self> {
        let map = value
            .as_mapping()
            .ok_or_else(|| decode_error(value, "mapping"))?;
        map.iter()
            .map(|(k, v)| T::from_yaml(v).map(|v| (k.clone(), v)))
            .collect()
    }
}

impl<T: ToYaml> ToYaml for Option<T> {
    fn to_yaml(&self) -> Value {
        match self {
            Some(inner) => inner.to_yaml(),
            None => Value::Null,
        }
    }
}

impl<T: FromYaml> FromYaml for Option<T> {
    fn from_yaml(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_yaml(other).map(Some),
        }
    }
}

fn decode_error(value: &Value, target: &'static str) -> Error {
    Error::Decode {
        found: value.kind_name().to_string(),
        target,
    }
}
