//! Core types for validation failure normalization.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Constraint-map entry used when no entry matches the failing constraint.
pub const DEFAULT_CONSTRAINT: &str = "default";

/// Returns the JSON type name for a value.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One segment of the path to a failing field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array position.
    Index(u64),
    /// Object key.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<u64> for PathSegment {
    fn from(index: u64) -> Self {
        PathSegment::Index(index)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index as u64)
    }
}

/// Validator context attached to a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Bare name of the failing field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Human display name, when the schema declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A single raw failure as reported by a schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Path to the failing field. Deserializes from an array of segments
    /// or from a dotted string.
    #[serde(deserialize_with = "deserialize_path")]
    pub path: Vec<PathSegment>,
    /// Failure kind in `<category>.<constraint>` form (e.g. `string.email`).
    #[serde(alias = "type")]
    pub kind: String,
    /// Validator-generated message.
    pub message: String,
    #[serde(default)]
    pub context: FailureContext,
}

impl FailureDetail {
    pub fn new<I, S>(path: I, kind: impl Into<String>, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            kind: kind.into(),
            message: message.into(),
            context: FailureContext::default(),
        }
    }

    /// Set the validator-supplied field key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.context.key = Some(key.into());
        self
    }

    /// Set the validator-supplied display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.context.label = Some(label.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPath {
    Dotted(String),
    Segments(Vec<PathSegment>),
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<Vec<PathSegment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawPath::deserialize(deserializer)? {
        RawPath::Dotted(s) if s.is_empty() => Vec::new(),
        RawPath::Dotted(s) => s.split('.').map(PathSegment::from).collect(),
        RawPath::Segments(segments) => segments,
    })
}

/// Normalized, user-facing description of one failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub key: String,
    /// Dotted path to the field (e.g. `data.email`, `items.0.name`).
    pub path: String,
    pub message: String,
    /// Category portion of the failure kind (`string` in `string.email`).
    #[serde(rename = "type")]
    pub error_type: String,
    /// Rule portion of the failure kind (`email` in `string.email`).
    pub constraint: String,
    /// Display label, present only when it differs from `key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Raw failure kind the type and constraint were split from.
    #[serde(skip)]
    pub kind: String,
}

impl From<FieldError> for Value {
    fn from(error: FieldError) -> Self {
        let mut map = Map::new();
        map.insert("key".into(), Value::String(error.key));
        map.insert("path".into(), Value::String(error.path));
        map.insert("message".into(), Value::String(error.message));
        map.insert("type".into(), Value::String(error.error_type));
        map.insert("constraint".into(), Value::String(error.constraint));
        if let Some(label) = error.label {
            map.insert("label".into(), Value::String(label));
        }
        Value::Object(map)
    }
}

/// Replacement message configured for an override key.
///
/// Either shorthand text applied to every constraint:
/// ```json
/// { "email": "Please check your email" }
/// ```
///
/// Or keyed by constraint, with an optional `default`:
/// ```json
/// { "email": { "email": "Not an email", "default": "Email is invalid" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideMessage {
    Text(String),
    ByConstraint(BTreeMap<String, String>),
}

impl OverrideMessage {
    /// Build a constraint-keyed override.
    pub fn by_constraint<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        OverrideMessage::ByConstraint(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Pick the message for a constraint.
    ///
    /// Falls back to the `default` entry. Returns `None` when neither exists.
    pub fn select(&self, constraint: &str) -> Option<&str> {
        match self {
            OverrideMessage::Text(text) => Some(text.as_str()),
            OverrideMessage::ByConstraint(map) => map
                .get(constraint)
                .or_else(|| map.get(DEFAULT_CONSTRAINT))
                .map(String::as_str),
        }
    }
}

impl From<&str> for OverrideMessage {
    fn from(text: &str) -> Self {
        OverrideMessage::Text(text.to_string())
    }
}

impl From<String> for OverrideMessage {
    fn from(text: String) -> Self {
        OverrideMessage::Text(text)
    }
}

/// Override messages in insertion order.
///
/// Inserting an existing key replaces its message in place, keeping the
/// position of the first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    entries: Vec<(String, OverrideMessage)>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<OverrideMessage>) {
        let key = key.into();
        let message = message.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = message,
            None => self.entries.push((key, message)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OverrideMessage> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideMessage)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` over these messages, last write wins per key.
    pub fn merge(&mut self, other: &Messages) {
        for (key, message) in &other.entries {
            self.insert(key.clone(), message.clone());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Messages
where
    K: Into<String>,
    V: Into<OverrideMessage>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut messages = Messages::new();
        for (key, message) in iter {
            messages.insert(key, message);
        }
        messages
    }
}

impl Serialize for Messages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, message) in &self.entries {
            map.serialize_entry(key, message)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Messages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // serde_json's map keeps document order (preserve_order).
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut messages = Messages::new();
        for (key, value) in raw {
            let message: OverrideMessage = serde_json::from_value(value).map_err(|_| {
                D::Error::custom(format!(
                    "invalid message for \"{}\": expected string or object of strings",
                    key
                ))
            })?;
            messages.insert(key, message);
        }
        Ok(messages)
    }
}

/// Options controlling message resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Remove every `"` from resolved messages. Defaults to false.
    pub strip_quotes: bool,
    /// Override messages keyed by path, key, failure kind, or path pattern.
    pub messages: Messages,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set quote stripping.
    pub fn strip_quotes(mut self, strip_quotes: bool) -> Self {
        self.strip_quotes = strip_quotes;
        self
    }

    /// Add or replace an override message.
    pub fn message(mut self, key: impl Into<String>, message: impl Into<OverrideMessage>) -> Self {
        self.messages.insert(key, message);
        self
    }

    /// Return these options with `partial` applied over them.
    pub fn merged(&self, partial: &PartialOptions) -> Options {
        let mut merged = self.clone();
        if let Some(strip_quotes) = partial.strip_quotes {
            merged.strip_quotes = strip_quotes;
        }
        if let Some(messages) = &partial.messages {
            merged.messages.merge(messages);
        }
        merged
    }
}

/// A partial options update; unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_quotes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Messages>,
}

impl PartialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strip_quotes(mut self, strip_quotes: bool) -> Self {
        self.strip_quotes = Some(strip_quotes);
        self
    }

    pub fn message(mut self, key: impl Into<String>, message: impl Into<OverrideMessage>) -> Self {
        self.messages
            .get_or_insert_with(Messages::new)
            .insert(key, message);
        self
    }
}

impl From<Options> for PartialOptions {
    fn from(options: Options) -> Self {
        Self {
            strip_quotes: Some(options.strip_quotes),
            messages: Some(options.messages),
        }
    }
}

/// A validation failure handed over by the request framework.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Request part that failed (`payload`, `query`, `headers`, `params`, ...).
    ///
    /// When empty, `output.validation.source` is used instead.
    #[serde(default)]
    pub source: String,
    pub details: Vec<FailureDetail>,
    /// Enclosing field path prepended to every detail path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// The framework's error payload; fields other than `message` and
    /// `validation` pass through untouched.
    #[serde(default)]
    pub output: Map<String, Value>,
}

impl ValidationFailure {
    pub fn new(source: impl Into<String>, details: Vec<FailureDetail>) -> Self {
        Self {
            source: source.into(),
            details,
            parent: None,
            output: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_output(mut self, output: Map<String, Value>) -> Self {
        self.output = output;
        self
    }

    /// The failing request part, falling back to the framework payload.
    pub fn effective_source(&self) -> String {
        if !self.source.is_empty() {
            return self.source.clone();
        }
        self.output
            .get("validation")
            .and_then(|v| v.get("source"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}
