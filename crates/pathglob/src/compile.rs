//! Turns a scanned pattern into an anchored, compiled expression.

use fancy_regex::Regex;

use crate::error::GlobError;
use crate::fast_path::fast_path;
use crate::options::GlobOptions;
use crate::parse::{parse, ParseState};

/// The compiled form of a pattern's expression.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A regular expression compiled by the engine.
    Regex(Regex),
    /// Stands in for an expression the engine rejected. Never matches.
    Never,
}

/// A compiled pattern that can be tested against any number of inputs.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    expression: Expression,
    source: String,
    state: ParseState,
    posix: bool,
}

impl CompiledMatcher {
    /// The anchored expression source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The scan result this matcher was built from.
    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// True if `/` is the only path separator that was assumed.
    pub fn is_posix(&self) -> bool {
        self.posix
    }

    /// The compiled expression.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// True if the engine rejected the expression and this matcher never matches.
    pub fn never_matches(&self) -> bool {
        matches!(self.expression, Expression::Never)
    }

    /// Tests the expression against `input`.
    pub fn is_match(&self, input: &str) -> bool {
        let Expression::Regex(regex) = &self.expression else {
            return false;
        };
        match regex.is_match(input) {
            Ok(is_match) => is_match,
            Err(err) => {
                tracing::warn!(
                    pattern = %self.state.input,
                    input,
                    error = %err,
                    "failed to run the expression, treating the input as not matching"
                );
                false
            }
        }
    }

    /// Runs the expression against `input` and returns the capture groups on success.
    pub fn captures(&self, input: &str) -> Option<Vec<Option<String>>> {
        let Expression::Regex(regex) = &self.expression else {
            return None;
        };
        match regex.captures(input) {
            Ok(captures) => captures.map(|captures| {
                captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()))
                    .collect()
            }),
            Err(err) => {
                tracing::warn!(
                    pattern = %self.state.input,
                    input,
                    error = %err,
                    "failed to run the expression, treating the input as not matching"
                );
                None
            }
        }
    }
}

/// Scans `pattern`, consulting the fast path first.
pub fn scan_pattern(pattern: &str, options: &GlobOptions) -> Result<ParseState, GlobError> {
    match fast_path(pattern, options)? {
        Some(state) => Ok(state),
        None => parse(pattern, options),
    }
}

/// Wraps the fragment of a scan result in anchors, negation and case folding.
pub fn expression_source(state: &ParseState, options: &GlobOptions) -> String {
    let (start, end) = if options.contains { ("", "") } else { ("^", "$") };
    let mut source = format!("{start}(?:{}){end}", state.output);
    if state.negated {
        source = format!("^(?!{source}).*$");
    }
    if options.nocase {
        source = format!("(?i){source}");
    }
    source
}

/// Compiles a pattern into a [`CompiledMatcher`].
///
/// If the engine rejects the synthesized expression the result never matches, unless
/// [`GlobOptions::debug`] is set in which case the engine error is returned.
pub fn compile(pattern: &str, options: &GlobOptions) -> Result<CompiledMatcher, GlobError> {
    compile_state(scan_pattern(pattern, options)?, options)
}

/// Compiles every pattern independently.
pub fn compile_many<S: AsRef<str>>(
    patterns: &[S],
    options: &GlobOptions,
) -> Result<Vec<CompiledMatcher>, GlobError> {
    patterns
        .iter()
        .map(|pattern| compile(pattern.as_ref(), options))
        .collect()
}

/// Compiles a previously obtained scan result.
pub fn compile_state(state: ParseState, options: &GlobOptions) -> Result<CompiledMatcher, GlobError> {
    let source = expression_source(&state, options);
    let expression = match Regex::new(&source) {
        Ok(regex) => Expression::Regex(regex),
        Err(err) if options.debug => {
            return Err(GlobError::InvalidExpression {
                source_text: source,
                source: Box::new(err),
            })
        }
        Err(err) => {
            tracing::warn!(
                pattern = %state.input,
                source = %source,
                error = %err,
                "failed to compile the expression, the pattern will never match"
            );
            Expression::Never
        }
    };

    tracing::trace!(pattern = %state.input, source = %source, "compiled pattern");

    Ok(CompiledMatcher {
        expression,
        source,
        state,
        posix: !options.windows,
    })
}

/// Compiles a pattern straight into an engine expression. Unlike [`compile`], an expression the
/// engine rejects is always an error.
pub fn make_regex(pattern: &str, options: &GlobOptions) -> Result<Regex, GlobError> {
    let state = scan_pattern(pattern, options)?;
    let source = expression_source(&state, options);
    Regex::new(&source).map_err(|err| GlobError::InvalidExpression {
        source_text: source,
        source: Box::new(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_anchoring() {
        let compiled = compile("a/*", &GlobOptions::default()).unwrap();
        assert_eq!(compiled.source(), r"^(?:a/(?!\.)(?=.)[^/]*?/?)$");
        assert!(compiled.is_match("a/b"));
        assert!(!compiled.is_match("x/a/b"));
        assert!(compiled.is_posix());
    }

    #[test]
    fn test_contains() {
        let options = GlobOptions {
            contains: true,
            ..GlobOptions::default()
        };
        let compiled = compile("b", &options).unwrap();
        assert_eq!(compiled.source(), "(?:b)");
        assert!(compiled.is_match("abc"));
    }

    #[test]
    fn test_negation() {
        let compiled = compile("!*.js", &GlobOptions::default()).unwrap();
        assert!(compiled.source().starts_with("^(?!^(?:"));
        assert!(compiled.is_match("a.md"));
        assert!(!compiled.is_match("a.js"));
    }

    #[test]
    fn test_nocase() {
        let options = GlobOptions::default().with_nocase(true);
        let compiled = compile("*.JS", &options).unwrap();
        assert!(compiled.source().starts_with("(?i)"));
        assert!(compiled.is_match("index.js"));
    }

    #[test]
    fn test_engine_failure_never_matches() {
        // A quantifier without a target is passed through by the scanner but rejected by the
        // engine.
        let compiled = compile("(a|+)", &GlobOptions::default()).unwrap();
        assert!(compiled.never_matches());
        assert!(!compiled.is_match("a"));
        assert!(!compiled.is_match("(a|+)"));
    }

    #[test]
    fn test_engine_failure_in_debug_mode() {
        let options = GlobOptions::default().with_debug(true);
        assert_matches!(
            compile("(a|+)", &options),
            Err(GlobError::InvalidExpression { .. })
        );
        assert_matches!(
            make_regex("(a|+)", &GlobOptions::default()),
            Err(GlobError::InvalidExpression { .. })
        );
    }

    #[test]
    fn test_compile_many() {
        let compiled = compile_many(&["*.js", "*.ts"], &GlobOptions::default()).unwrap();
        assert_eq!(compiled.len(), 2);
        assert!(compiled[1].is_match("a.ts"));
    }

    #[test]
    fn test_captures() {
        let options = GlobOptions {
            capture: true,
            ..GlobOptions::default()
        };
        let compiled = compile("*.{js,ts}", &options).unwrap();
        let captures = compiled.captures("index.ts").unwrap();
        assert_eq!(
            captures,
            vec![Some("index".to_string()), Some("ts".to_string())]
        );
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let compiled = compile("src/**/*.rs", &GlobOptions::default()).unwrap();
        let json = serde_json::to_string(compiled.state()).unwrap();
        let state: ParseState = serde_json::from_str(&json).unwrap();
        let recompiled = compile_state(state, &GlobOptions::default()).unwrap();
        assert_eq!(recompiled.source(), compiled.source());
    }
}
