use thiserror::Error;

/// Errors that can occur while compiling a glob pattern.
#[derive(Debug, Error)]
pub enum GlobError {
    /// The pattern was an empty string.
    #[error("expected pattern to be a non-empty string")]
    EmptyPattern,

    /// The pattern is longer than the configured maximum length.
    #[error("input length: {length}, exceeds maximum allowed length: {max}")]
    InputTooLong {
        /// The length of the pattern in characters.
        length: usize,
        /// The maximum allowed length.
        max: usize,
    },

    /// A closing construct was found without a matching opener (strict mode only).
    #[error("missing opening \"{construct}\" at position {position} - use \"\\\\{construct}\" to match literal characters")]
    MissingOpening {
        /// The opening character that is missing, e.g. `(`.
        construct: char,
        /// Character offset in the pattern at which the problem was detected.
        position: usize,
    },

    /// An opening construct was never closed (strict mode only).
    #[error("missing closing \"{construct}\" at position {position} - use \"\\\\{construct}\" to match literal characters")]
    MissingClosing {
        /// The closing character that is missing, e.g. `]`.
        construct: char,
        /// Character offset of the unterminated opener.
        position: usize,
    },

    /// The synthesized expression was rejected by the regular expression engine. Only reported
    /// when the `debug` option is set, otherwise the pattern degrades to a matcher that never
    /// matches.
    #[error("failed to compile the expression `{source_text}`")]
    InvalidExpression {
        /// The expression source that failed to compile.
        source_text: String,
        /// The engine error.
        #[source]
        source: Box<fancy_regex::Error>,
    },
}

impl GlobError {
    /// Returns true if this error describes malformed pattern syntax (strict mode violations or
    /// an over-long pattern).
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            GlobError::InputTooLong { .. }
                | GlobError::MissingOpening { .. }
                | GlobError::MissingClosing { .. }
        )
    }

    /// Returns true if the caller violated the input contract, independent of any option.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, GlobError::EmptyPattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_message_names_construct() {
        let err = GlobError::MissingClosing {
            construct: ']',
            position: 0,
        };
        assert_eq!(
            err.to_string(),
            r#"missing closing "]" at position 0 - use "\\]" to match literal characters"#
        );
        assert!(err.is_syntax_error());
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_classification() {
        assert!(GlobError::EmptyPattern.is_contract_violation());
        assert!(GlobError::InputTooLong { length: 3, max: 2 }.is_syntax_error());
    }
}
