//! Assembly of the error envelope returned to the request framework.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::FieldError;

/// Separator between field messages in the aggregate message.
pub const MESSAGE_SEPARATOR: &str = ", ";

/// Per-field detail attached to the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub source: String,
    pub errors: Vec<FieldError>,
}

/// The framework's error payload augmented with the aggregate message and
/// field errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Untouched fields of the original payload (status code, error name, ...).
    #[serde(flatten)]
    pub output: Map<String, Value>,
    pub message: String,
    pub validation: Validation,
}

impl Envelope {
    /// Build the envelope. `message` and `validation` in `output` are replaced.
    pub fn assemble(
        mut output: Map<String, Value>,
        source: impl Into<String>,
        errors: Vec<FieldError>,
    ) -> Self {
        output.remove("message");
        output.remove("validation");

        Self {
            output,
            message: join_messages(&errors),
            validation: Validation {
                source: source.into(),
                errors,
            },
        }
    }

    /// Convert into a JSON object for the framework to serialize.
    pub fn into_value(self) -> Value {
        let mut map = self.output;
        map.insert("message".into(), Value::String(self.message));

        let mut validation = Map::new();
        validation.insert("source".into(), Value::String(self.validation.source));
        validation.insert(
            "errors".into(),
            Value::Array(self.validation.errors.into_iter().map(Value::from).collect()),
        );
        map.insert("validation".into(), Value::Object(validation));

        Value::Object(map)
    }
}

/// Join field messages in order with `", "`.
pub fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}
