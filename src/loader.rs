//! Loading options and validation failures from files and strings.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LoadError;
use crate::types::{Options, ValidationFailure};

/// Load options from a JSON file.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if it isn't a valid options document.
pub fn load_options(path: &Path) -> Result<Options, LoadError> {
    load_file(path)
}

/// Load options from a JSON string.
pub fn load_options_str(content: &str) -> Result<Options, LoadError> {
    parse(content)
}

/// Load a validation failure from a JSON file.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if it isn't a valid failure document.
pub fn load_failure(path: &Path) -> Result<ValidationFailure, LoadError> {
    load_file(path)
}

/// Load a validation failure from a JSON string.
pub fn load_failure_str(content: &str) -> Result<ValidationFailure, LoadError> {
    parse(content)
}

/// Load an arbitrary JSON document (schemas, payloads).
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    load_file(path)
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&content)
}

fn parse<T: DeserializeOwned>(content: &str) -> Result<T, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OverrideMessage, PathSegment};
    use std::path::PathBuf;

    #[test]
    fn options_from_str() {
        let options = load_options_str(
            r#"{
                "stripQuotes": true,
                "messages": {
                    "email": "Generic email message",
                    "name": { "min": "Too short", "default": "Bad name" }
                }
            }"#,
        )
        .unwrap();

        assert!(options.strip_quotes);
        assert_eq!(
            options.messages.get("email"),
            Some(&OverrideMessage::from("Generic email message"))
        );
        assert!(matches!(
            options.messages.get("name"),
            Some(OverrideMessage::ByConstraint(_))
        ));
    }

    #[test]
    fn options_invalid_json() {
        let err = load_options_str("{ not json").unwrap_err();
        assert!(matches!(err, LoadError::InvalidJson { .. }));
    }

    #[test]
    fn failure_from_str() {
        let failure = load_failure_str(
            r#"{
                "source": "payload",
                "details": [
                    {
                        "path": ["data", "email"],
                        "type": "string.email",
                        "message": "\"email\" must be a valid email",
                        "context": { "key": "email", "label": "email" }
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(failure.source, "payload");
        assert_eq!(failure.details.len(), 1);
        assert_eq!(failure.details[0].path[1], PathSegment::from("email"));
        assert!(failure.output.is_empty());
    }

    #[test]
    fn missing_file() {
        let err = load_options(&PathBuf::from("/nonexistent/options.json")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
