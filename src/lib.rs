//! Relish
//!
//! Turns schema validation failures into predictable, user-facing error
//! reports with configurable message overrides.
//!
//! A validator reports failures as raw details (path, kind, message,
//! context). Relish flattens them into [`FieldError`]s, resolves each
//! message through the configured overrides, and assembles an
//! [`Envelope`] with an aggregate message for the request framework to
//! send back.
//!
//! # Example
//!
//! ```
//! use relish::{FailureDetail, Options, Relish, ValidationFailure};
//!
//! let relish = Relish::new(Options::new().message("email", "Generic email message"));
//!
//! let failure = ValidationFailure::new(
//!     "payload",
//!     vec![
//!         FailureDetail::new(["data", "email"], "string.email", "\"email\" must be a valid email")
//!             .with_key("email"),
//!         FailureDetail::new(["data", "name"], "any.required", "\"Full Name\" is required")
//!             .with_key("name")
//!             .with_label("Full Name"),
//!     ],
//! );
//!
//! let envelope = relish.fail_action(failure).unwrap();
//!
//! assert_eq!(envelope.message, "Generic email message, \"Full Name\" is required");
//! assert_eq!(envelope.validation.errors[0].path, "data.email");
//! assert_eq!(envelope.validation.errors[1].label.as_deref(), Some("Full Name"));
//! ```
//!
//! # Override Precedence
//!
//! The first match wins:
//!
//! | Order | Override key | Example |
//! |-------|--------------|---------|
//! | 1 | Exact dotted path | `"data.email"` |
//! | 2 | Bare field key | `"email"` |
//! | 3 | Failure kind | `"string.email"` |
//! | 4 | Failure type | `"string"` |
//! | 5 | Path pattern (anchored regex, insertion order) | `"items\\.\\d+\\.name"` |
//!
//! Keys containing regex metacharacters other than `.` are patterns; all
//! other keys are matched literally.
//!
//! # Message Format
//!
//! Messages can be shorthand (applies to every constraint):
//! ```json
//! { "email": "Generic email message" }
//! ```
//!
//! Or per-constraint, with an optional `default`:
//! ```json
//! { "name": { "min": "Too short", "default": "Please give us your name" } }
//! ```

mod envelope;
mod error;
mod loader;
mod normalizer;
mod overrides;
mod resolver;
mod types;
mod validator;

pub use envelope::{join_messages, Envelope, Validation, MESSAGE_SEPARATOR};
pub use error::{FailActionError, LoadError, NormalizeError, ResolveError, ValidateError};
pub use loader::{load_failure, load_failure_str, load_json, load_options, load_options_str};
pub use normalizer::{compose_path, normalize, normalize_detail, split_kind};
pub use overrides::{anchor, Matcher, OverrideEntry, OverrideTable, PatternCache};
pub use resolver::{strip_quotes, Relish};
pub use types::{
    FailureContext, FailureDetail, FieldError, Messages, Options, OverrideMessage,
    PartialOptions, PathSegment, ValidationFailure,
};
pub use validator::{pointer_segments, validate};
