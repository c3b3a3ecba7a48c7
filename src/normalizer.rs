//! Flattening raw validator failures into field errors.

use tracing::trace;

use crate::error::NormalizeError;
use crate::types::{FailureDetail, FieldError, PathSegment};

/// Normalize raw failure details into field errors, one per detail, in order.
///
/// When `parent` is given (and non-empty), it is prepended to every path
/// with a `.` separator.
///
/// Messages are copied verbatim; overrides are applied by the resolver.
///
/// # Errors
///
/// Returns `NormalizeError` for a detail with an empty path or kind.
pub fn normalize(
    details: &[FailureDetail],
    parent: Option<&str>,
) -> Result<Vec<FieldError>, NormalizeError> {
    details
        .iter()
        .enumerate()
        .map(|(index, detail)| normalize_detail(index, detail, parent))
        .collect()
}

/// Normalize a single failure detail. `index` is used for error reporting.
pub fn normalize_detail(
    index: usize,
    detail: &FailureDetail,
    parent: Option<&str>,
) -> Result<FieldError, NormalizeError> {
    let Some(last) = detail.path.last() else {
        return Err(NormalizeError::EmptyPath { index });
    };

    let path = compose_path(parent, &detail.path);
    if path.is_empty() {
        return Err(NormalizeError::EmptyPath { index });
    }
    if detail.kind.is_empty() {
        return Err(NormalizeError::EmptyKind { index, path });
    }

    let key = match detail.context.key.as_deref() {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => last.to_string(),
    };

    let (error_type, constraint) = split_kind(&detail.kind);

    // Only surface a label that says something the key doesn't
    let label = detail
        .context
        .label
        .as_ref()
        .filter(|label| **label != key)
        .cloned();

    trace!(%path, kind = %detail.kind, "normalized failure detail");

    Ok(FieldError {
        key,
        path,
        message: detail.message.clone(),
        error_type: error_type.to_string(),
        constraint: constraint.to_string(),
        label,
        kind: detail.kind.clone(),
    })
}

/// Join path segments with `.`, prefixed by `parent` when present.
pub fn compose_path(parent: Option<&str>, segments: &[PathSegment]) -> String {
    let local = segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".");

    match parent {
        Some(parent) if !parent.is_empty() => format!("{}.{}", parent, local),
        _ => local,
    }
}

/// Split a failure kind into `(type, constraint)`.
///
/// The type is everything before the first dot, the constraint everything
/// after the last dot. A kind without a dot yields the whole string for both.
pub fn split_kind(kind: &str) -> (&str, &str) {
    let error_type = kind.split('.').next().unwrap_or(kind);
    let constraint = kind.rsplit('.').next().unwrap_or(kind);
    (error_type, constraint)
}
