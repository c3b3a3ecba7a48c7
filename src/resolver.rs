//! Message resolution - applies configured overrides to field errors.

use std::sync::Arc;

use tracing::debug;

use crate::envelope::Envelope;
use crate::error::{FailActionError, ResolveError};
use crate::normalizer::normalize;
use crate::overrides::{OverrideEntry, OverrideTable, PatternCache};
use crate::types::{FailureDetail, FieldError, Options, PartialOptions, ValidationFailure};

/// A configured failure formatter.
///
/// Options are immutable once built; [`Relish::options`] derives a new
/// handle instead of mutating this one, so a `Relish` can be shared across
/// request handlers. Clones share the same compiled pattern cache.
#[derive(Debug, Clone, Default)]
pub struct Relish {
    options: Arc<Options>,
    table: Arc<OverrideTable>,
    patterns: Arc<PatternCache>,
}

impl Relish {
    pub fn new(options: Options) -> Self {
        let table = OverrideTable::build(&options.messages);
        Self {
            options: Arc::new(options),
            table: Arc::new(table),
            patterns: Arc::new(PatternCache::new()),
        }
    }

    /// Derive a handle with `partial` merged over the current options.
    ///
    /// The derived handle starts with an empty pattern cache.
    pub fn options(&self, partial: impl Into<PartialOptions>) -> Self {
        Self::new(self.options.merged(&partial.into()))
    }

    /// The effective options.
    pub fn config(&self) -> &Options {
        &self.options
    }

    /// Normalize raw failure details and resolve their messages.
    ///
    /// # Errors
    ///
    /// Returns `FailActionError` for malformed details or invalid override
    /// patterns.
    pub fn parse_error(
        &self,
        details: &[FailureDetail],
    ) -> Result<Vec<FieldError>, FailActionError> {
        self.parse_error_within(None, details)
    }

    /// Like [`Relish::parse_error`], with every path nested under `parent`.
    pub fn parse_error_within(
        &self,
        parent: Option<&str>,
        details: &[FailureDetail],
    ) -> Result<Vec<FieldError>, FailActionError> {
        let mut errors = normalize(details, parent)?;
        for error in &mut errors {
            self.resolve_message(error)?;
        }
        Ok(errors)
    }

    /// Turn a validation failure into the response envelope.
    ///
    /// # Errors
    ///
    /// Returns `FailActionError` for malformed details or invalid override
    /// patterns.
    pub fn fail_action(&self, failure: ValidationFailure) -> Result<Envelope, FailActionError> {
        let source = failure.effective_source();
        let errors = self.parse_error_within(failure.parent.as_deref(), &failure.details)?;
        debug!(%source, errors = errors.len(), "formatted validation failure");
        Ok(Envelope::assemble(failure.output, source, errors))
    }

    /// Apply the first matching override to `error`, then strip quotes if
    /// enabled.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidPattern` if a pattern key consulted for
    /// this error fails to compile.
    pub fn resolve_message(&self, error: &mut FieldError) -> Result<(), ResolveError> {
        if let Some(entry) = self.find_override(error)? {
            match entry.message.select(&error.constraint) {
                Some(message) if !message.is_empty() => {
                    debug!(path = %error.path, key = %entry.key, "applied message override");
                    error.message = message.to_string();
                }
                _ => {
                    debug!(
                        path = %error.path,
                        key = %entry.key,
                        constraint = %error.constraint,
                        "override has no message for constraint"
                    );
                }
            }
        }

        if self.options.strip_quotes {
            error.message = strip_quotes(&error.message);
        }

        Ok(())
    }

    /// Find the override for `error`: path, key, kind, type, then patterns.
    fn find_override(&self, error: &FieldError) -> Result<Option<&OverrideEntry>, ResolveError> {
        let table = &self.table;
        if table.is_empty() {
            return Ok(None);
        }

        let literal = table
            .literal(&error.path)
            .or_else(|| table.literal(&error.key))
            .or_else(|| {
                // A dotless kind is looked up as a type only
                if !error.kind.contains('.') {
                    return None;
                }
                table.literal(&error.kind)
            })
            .or_else(|| table.literal(&error.error_type));
        if literal.is_some() {
            return Ok(literal);
        }

        for entry in table.patterns() {
            let regex = self.patterns.get_or_compile(&entry.key)?;
            if regex.is_match(&error.path) {
                return Ok(Some(entry));
            }
        }

        Ok(None)
    }
}

/// Remove every double-quote character.
pub fn strip_quotes(message: &str) -> String {
    message.replace('"', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OverrideMessage;

    fn error(path: &str, key: &str, kind: (&str, &str)) -> FieldError {
        FieldError {
            key: key.into(),
            path: path.into(),
            message: format!("\"{}\" is invalid", key),
            error_type: kind.0.into(),
            constraint: kind.1.into(),
            label: None,
            kind: format!("{}.{}", kind.0, kind.1),
        }
    }

    fn resolved(relish: &Relish, mut error: FieldError) -> String {
        relish.resolve_message(&mut error).unwrap();
        error.message
    }

    #[test]
    fn no_overrides_keeps_message() {
        let relish = Relish::default();
        let msg = resolved(&relish, error("data.email", "email", ("string", "email")));
        assert_eq!(msg, "\"email\" is invalid");
    }

    #[test]
    fn path_beats_key() {
        let relish = Relish::new(
            Options::new()
                .message("email", "Bare key loses")
                .message("data.email", "Exact path wins"),
        );
        let msg = resolved(&relish, error("data.email", "email", ("string", "email")));
        assert_eq!(msg, "Exact path wins");
    }

    #[test]
    fn key_beats_kind_and_type() {
        let relish = Relish::new(
            Options::new()
                .message("string", "type")
                .message("string.email", "kind")
                .message("email", "key"),
        );
        let msg = resolved(&relish, error("data.email", "email", ("string", "email")));
        assert_eq!(msg, "key");
    }

    #[test]
    fn kind_beats_type() {
        let relish = Relish::new(
            Options::new()
                .message("string", "type")
                .message("string.min", "kind"),
        );
        let msg = resolved(&relish, error("data.name", "name", ("string", "min")));
        assert_eq!(msg, "kind");

        let msg = resolved(&relish, error("data.name", "name", ("string", "max")));
        assert_eq!(msg, "type");
    }

    #[test]
    fn kind_with_equal_halves_matches() {
        let relish = Relish::new(
            Options::new().message("alternatives.alternatives", "kind override"),
        );
        let msg = resolved(
            &relish,
            error("choice", "choice", ("alternatives", "alternatives")),
        );
        assert_eq!(msg, "kind override");
    }

    #[test]
    fn dotless_kind_skips_kind_lookup() {
        let relish = Relish::new(Options::new().message("custom.custom", "invented kind"));
        let mut err = error("choice", "choice", ("custom", "custom"));
        err.kind = "custom".into();
        relish.resolve_message(&mut err).unwrap();
        assert_eq!(err.message, "\"choice\" is invalid");
    }

    #[test]
    fn literal_beats_pattern() {
        let relish = Relish::new(
            Options::new()
                .message("data\\..*", "pattern")
                .message("string", "type"),
        );
        let msg = resolved(&relish, error("data.name", "name", ("string", "min")));
        assert_eq!(msg, "type");
    }

    #[test]
    fn first_matching_pattern_wins() {
        let relish = Relish::new(
            Options::new()
                .message("other\\..*", "no")
                .message("items\\.\\d+\\.name", "item name")
                .message("items\\..*", "any item"),
        );
        let msg = resolved(&relish, error("items.2.name", "name", ("any", "required")));
        assert_eq!(msg, "item name");

        let msg = resolved(&relish, error("items.2.qty", "qty", ("number", "min")));
        assert_eq!(msg, "any item");
    }

    #[test]
    fn pattern_is_anchored() {
        let relish = Relish::new(Options::new().message("data\\.(name|email)", "anchored"));
        let msg = resolved(&relish, error("meta.data.name", "name", ("any", "required")));
        assert_eq!(msg, "\"name\" is invalid");
    }

    #[test]
    fn invalid_pattern_fails() {
        let relish = Relish::new(Options::new().message("items[", "broken"));
        let mut err = error("data.email", "email", ("string", "email"));
        assert!(matches!(
            relish.resolve_message(&mut err),
            Err(ResolveError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn invalid_pattern_not_reached_after_literal_match() {
        let relish = Relish::new(
            Options::new()
                .message("items[", "broken")
                .message("email", "ok"),
        );
        let msg = resolved(&relish, error("data.email", "email", ("string", "email")));
        assert_eq!(msg, "ok");
    }

    #[test]
    fn constraint_map_selects_constraint_then_default() {
        let relish = Relish::new(Options::new().message(
            "name",
            OverrideMessage::by_constraint([("min", "Too short"), ("default", "Bad name")]),
        ));
        let msg = resolved(&relish, error("name", "name", ("string", "min")));
        assert_eq!(msg, "Too short");

        let msg = resolved(&relish, error("name", "name", ("string", "max")));
        assert_eq!(msg, "Bad name");
    }

    #[test]
    fn constraint_map_without_match_keeps_message() {
        let relish = Relish::new(
            Options::new()
                .message(
                    "name",
                    OverrideMessage::by_constraint([("min", "Too short")]),
                )
                .message("string", "type fallback"),
        );
        let msg = resolved(&relish, error("name", "name", ("string", "max")));
        assert_eq!(msg, "\"name\" is invalid");
    }

    #[test]
    fn empty_override_keeps_message() {
        let relish = Relish::new(Options::new().message("name", ""));
        let msg = resolved(&relish, error("name", "name", ("string", "max")));
        assert_eq!(msg, "\"name\" is invalid");
    }

    #[test]
    fn strip_quotes_applies_after_override() {
        let relish = Relish::new(
            Options::new()
                .strip_quotes(true)
                .message("email", "\"Email\" is wrong"),
        );
        let msg = resolved(&relish, error("data.email", "email", ("string", "email")));
        assert_eq!(msg, "Email is wrong");

        let msg = resolved(&relish, error("data.name", "name", ("string", "min")));
        assert_eq!(msg, "name is invalid");
    }

    #[test]
    fn options_derives_new_handle() {
        let base = Relish::new(Options::new().message("email", "one"));
        let derived = base.options(PartialOptions::new().message("email", "two"));

        assert_eq!(
            resolved(&base, error("data.email", "email", ("string", "email"))),
            "one"
        );
        assert_eq!(
            resolved(&derived, error("data.email", "email", ("string", "email"))),
            "two"
        );
    }

    #[test]
    fn options_merge_is_idempotent() {
        let partial = PartialOptions::new().strip_quotes(true).message("a", "b");
        let once = Relish::default().options(partial.clone());
        let twice = once.options(partial);
        assert_eq!(once.config(), twice.config());
    }

    #[test]
    fn options_merge_gets_fresh_pattern_cache() {
        let base = Relish::new(Options::new().message("data\\..*", "old"));
        resolved(&base, error("data.x", "x", ("any", "required")));
        assert_eq!(base.patterns.len(), 1);

        let derived = base.options(PartialOptions::new().message("data\\..*", "new"));
        assert!(derived.patterns.is_empty());
        assert_eq!(
            resolved(&derived, error("data.x", "x", ("any", "required"))),
            "new"
        );
    }
}
