//! Example validator adapter: runs `jsonschema` and reports raw failure details.
//!
//! Validation itself belongs to the caller's validator. This module stands in
//! for it so the CLI and tests can produce realistic failures; the
//! normalizer and resolver never call it.

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;

use crate::error::ValidateError;
use crate::types::{json_type_name, FailureDetail, PathSegment};

/// Key used for failures at the document root.
pub const ROOT_KEY: &str = "value";

/// Validate a payload against a JSON Schema.
///
/// Every schema violation becomes one `FailureDetail`, in the order the
/// validator reports them, ready for [`crate::Relish::parse_error`].
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if the schema doesn't compile,
/// or `ValidateError::Invalid` if the payload doesn't match it.
pub fn validate(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator =
        jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })?;

    let details: Vec<FailureDetail> = validator
        .iter_errors(payload)
        .map(|e| to_failure_detail(&e))
        .collect();

    if details.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { details })
    }
}

fn to_failure_detail(error: &jsonschema::ValidationError<'_>) -> FailureDetail {
    let mut path = pointer_segments(&error.instance_path.to_string());
    let category = json_type_name(&error.instance);

    let kind = match &error.kind {
        ValidationErrorKind::Required { property } => {
            // Reported against the parent object; point at the missing field
            if let Some(name) = property.as_str() {
                path.push(PathSegment::from(name));
            }
            "any.required".to_string()
        }
        ValidationErrorKind::Type { .. } => "any.type".to_string(),
        ValidationErrorKind::Enum { .. } | ValidationErrorKind::Constant { .. } => {
            "any.only".to_string()
        }
        ValidationErrorKind::AdditionalProperties { .. } => "object.unknown".to_string(),
        ValidationErrorKind::Format { format } => format!("{}.{}", category, format),
        ValidationErrorKind::Pattern { .. } => format!("{}.pattern", category),
        ValidationErrorKind::MinLength { .. }
        | ValidationErrorKind::MinItems { .. }
        | ValidationErrorKind::MinProperties { .. }
        | ValidationErrorKind::Minimum { .. }
        | ValidationErrorKind::ExclusiveMinimum { .. } => format!("{}.min", category),
        ValidationErrorKind::MaxLength { .. }
        | ValidationErrorKind::MaxItems { .. }
        | ValidationErrorKind::MaxProperties { .. }
        | ValidationErrorKind::Maximum { .. }
        | ValidationErrorKind::ExclusiveMaximum { .. } => format!("{}.max", category),
        _ => "any.invalid".to_string(),
    };

    if path.is_empty() {
        path.push(PathSegment::from(ROOT_KEY));
    }

    let key = path
        .last()
        .map(ToString::to_string)
        .unwrap_or_else(|| ROOT_KEY.to_string());

    FailureDetail::new(path, kind, error.to_string()).with_key(key)
}

/// Split a JSON Pointer (RFC 6901) into path segments.
///
/// Numeric segments become indexes; `~1` and `~0` are unescaped.
pub fn pointer_segments(pointer: &str) -> Vec<PathSegment> {
    pointer
        .split('/')
        .skip(1)
        .map(|part| {
            let key = part.replace("~1", "/").replace("~0", "~");
            match key.parse::<u64>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(key),
            }
        })
        .collect()
}
