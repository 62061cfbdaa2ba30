//! The public matcher factory.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::compile::{compile, compile_state, CompiledMatcher};
use crate::error::GlobError;
use crate::options::GlobOptions;
use crate::parse::ParseState;
use crate::utils::{basename, to_posix_slashes};

/// What a [`Matcher`] is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobInput {
    /// A single pattern.
    Pattern(String),
    /// Several patterns, an input matches if any of them matches.
    Patterns(Vec<String>),
    /// A previously obtained scan result.
    State(Box<ParseState>),
}

impl From<&str> for GlobInput {
    fn from(pattern: &str) -> Self {
        GlobInput::Pattern(pattern.to_string())
    }
}

impl From<String> for GlobInput {
    fn from(pattern: String) -> Self {
        GlobInput::Pattern(pattern)
    }
}

impl From<Vec<String>> for GlobInput {
    fn from(patterns: Vec<String>) -> Self {
        GlobInput::Patterns(patterns)
    }
}

impl From<&[&str]> for GlobInput {
    fn from(patterns: &[&str]) -> Self {
        GlobInput::Patterns(patterns.iter().map(ToString::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for GlobInput {
    fn from(patterns: [&str; N]) -> Self {
        GlobInput::Patterns(patterns.iter().map(ToString::to_string).collect())
    }
}

impl From<ParseState> for GlobInput {
    fn from(state: ParseState) -> Self {
        GlobInput::State(Box::new(state))
    }
}

/// The pattern or patterns a [`MatchResult`] refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PatternSource {
    /// The single pattern that was tested.
    One(String),
    /// Every pattern of an array, when none of them matched.
    Many(Vec<String>),
}

/// The detailed outcome of testing one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// True if the input matched and was not ignored.
    pub is_match: bool,
    /// The input as given.
    pub input: String,
    /// The input after formatting, this is what the expression was tested against.
    pub output: String,
    /// The pattern that produced this result.
    pub pattern: PatternSource,
    /// True if the pattern was negated with a leading `!`.
    pub negated: bool,
    /// The anchored expression source.
    pub regex_source: String,
    /// The capture groups of the expression, only collected with [`GlobOptions::capture`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub captures: Vec<Option<String>>,
}

#[derive(Debug, Clone)]
struct PatternMatcher {
    glob: String,
    compiled: CompiledMatcher,
}

/// Tests inputs against one or more compiled patterns.
///
/// ```
/// # use pathglob::{GlobOptions, Matcher};
/// let matcher = Matcher::new("*.{js,ts}", &GlobOptions::default()).unwrap();
/// assert!(matcher.is_match("index.ts"));
/// assert!(!matcher.is_match("index.md"));
/// ```
#[derive(Debug, Clone)]
pub struct Matcher {
    patterns: Vec<PatternMatcher>,
    many: bool,
    ignore: Option<Box<Matcher>>,
    options: GlobOptions,
}

impl Matcher {
    /// Compiles the input into a matcher.
    ///
    /// Every pattern of an array is compiled independently. The `ignore` patterns of the options
    /// are compiled into a sub-matcher that vetoes otherwise successful matches.
    pub fn new(input: impl Into<GlobInput>, options: &GlobOptions) -> Result<Self, GlobError> {
        let (patterns, many) = match input.into() {
            GlobInput::Pattern(pattern) => (vec![Self::compile_pattern(pattern, options)?], false),
            GlobInput::Patterns(patterns) => (
                patterns
                    .into_iter()
                    .map(|pattern| Self::compile_pattern(pattern, options))
                    .collect::<Result<Vec<_>, _>>()?,
                true,
            ),
            GlobInput::State(state) => {
                let glob = state.input.clone();
                let compiled = compile_state(*state, options)?;
                (vec![PatternMatcher { glob, compiled }], false)
            }
        };

        let ignore = if options.ignore.is_empty() {
            None
        } else {
            let ignore_options = GlobOptions {
                ignore: Vec::new(),
                on_match: None,
                on_result: None,
                ..options.clone()
            };
            let ignore = Matcher::new(GlobInput::Patterns(options.ignore.clone()), &ignore_options)?;
            Some(Box::new(ignore))
        };

        Ok(Self {
            patterns,
            many,
            ignore,
            options: options.clone(),
        })
    }

    fn compile_pattern(glob: String, options: &GlobOptions) -> Result<PatternMatcher, GlobError> {
        if glob.is_empty() {
            return Err(GlobError::EmptyPattern);
        }
        let compiled = compile(&glob, options)?;
        Ok(PatternMatcher { glob, compiled })
    }

    /// The compiled patterns, in the order they were given.
    pub fn compiled(&self) -> impl Iterator<Item = &CompiledMatcher> + '_ {
        self.patterns.iter().map(|p| &p.compiled)
    }

    /// The scan result of a matcher built from a single pattern.
    pub fn state(&self) -> Option<&ParseState> {
        match self.patterns.as_slice() {
            [single] if !self.many => Some(single.compiled.state()),
            _ => None,
        }
    }

    /// Returns true if `input` matches.
    pub fn is_match(&self, input: &str) -> bool {
        self.match_details(input).is_match
    }

    /// Tests `input` and returns the detailed result.
    ///
    /// For an array of patterns this is the result of the first pattern that accepts the input.
    /// If none does, the result refers to every pattern and its expression source is the
    /// alternation of all sources.
    pub fn match_details(&self, input: &str) -> MatchResult {
        let mut last = None;
        for pattern in &self.patterns {
            let mut result = self.test(pattern, input);
            if let Some(on_result) = &self.options.on_result {
                on_result(&result);
            }
            if !result.is_match {
                last = Some(result);
                continue;
            }

            if self.ignore.as_ref().is_some_and(|ignore| ignore.is_match(input)) {
                if let Some(on_ignore) = &self.options.on_ignore {
                    on_ignore(&result);
                }
                result.is_match = false;
                return result;
            }

            if let Some(on_match) = &self.options.on_match {
                on_match(&result);
            }
            return result;
        }

        match (last, self.many) {
            (Some(result), false) => result,
            (last, _) => {
                let output = last.map(|r| r.output).unwrap_or_else(|| self.format(input));
                MatchResult {
                    is_match: false,
                    input: input.to_string(),
                    output,
                    pattern: PatternSource::Many(self.patterns.iter().map(|p| p.glob.clone()).collect()),
                    negated: false,
                    regex_source: self.patterns.iter().map(|p| p.compiled.source()).join("|"),
                    captures: Vec::new(),
                }
            }
        }
    }

    fn format(&self, input: &str) -> String {
        match &self.options.format {
            Some(format) => format(input),
            None if self.options.windows => to_posix_slashes(input),
            None => input.to_string(),
        }
    }

    fn test(&self, pattern: &PatternMatcher, input: &str) -> MatchResult {
        let compiled = &pattern.compiled;
        let mut result = MatchResult {
            is_match: false,
            input: input.to_string(),
            output: String::new(),
            pattern: PatternSource::One(pattern.glob.clone()),
            negated: compiled.state().negated,
            regex_source: compiled.source().to_string(),
            captures: Vec::new(),
        };
        if input.is_empty() {
            return result;
        }

        result.output = self.format(input);
        result.is_match = input == pattern.glob || result.output == pattern.glob;

        if !result.is_match || self.options.capture {
            if self.options.match_base.resolve(input) {
                result.is_match = compiled.is_match(basename(&result.output, self.options.windows));
            } else if self.options.capture {
                match compiled.captures(&result.output) {
                    Some(captures) => {
                        result.is_match = true;
                        result.captures = captures;
                    }
                    None => result.is_match = false,
                }
            } else {
                result.is_match = compiled.is_match(&result.output);
            }
        }
        result
    }
}

/// Returns true if `input` matches any of the patterns.
pub fn is_match(
    input: &str,
    patterns: impl Into<GlobInput>,
    options: &GlobOptions,
) -> Result<bool, GlobError> {
    Ok(Matcher::new(patterns, options)?.is_match(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_single_pattern() {
        let matcher = Matcher::new("*.{js,ts}", &GlobOptions::default()).unwrap();
        assert!(matcher.is_match("index.ts"));
        assert!(!matcher.is_match("index.md"));
        assert!(!matcher.is_match(""));
        assert!(matcher.state().is_some());
    }

    #[test]
    fn test_array_first_match_wins() {
        let matcher = Matcher::new(["*.md", "*.js"], &GlobOptions::default()).unwrap();
        let result = matcher.match_details("a.js");
        assert!(result.is_match);
        assert_eq!(result.pattern, PatternSource::One("*.js".to_string()));
        assert!(matcher.state().is_none());
    }

    #[test]
    fn test_array_without_match() {
        let matcher = Matcher::new(["*.md", "*.js"], &GlobOptions::default()).unwrap();
        let result = matcher.match_details("a.rs");
        assert!(!result.is_match);
        assert_eq!(
            result.pattern,
            PatternSource::Many(vec!["*.md".to_string(), "*.js".to_string()])
        );
        let sources = matcher.compiled().map(|c| c.source().to_string()).collect::<Vec<_>>();
        assert_eq!(result.regex_source, sources.join("|"));
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        assert_matches!(
            Matcher::new("", &GlobOptions::default()),
            Err(GlobError::EmptyPattern)
        );
        assert_matches!(
            Matcher::new(["*.js", ""], &GlobOptions::default()),
            Err(GlobError::EmptyPattern)
        );
    }

    #[test]
    fn test_literal_equality_shortcut() {
        // The pattern text itself always matches, even though `[` is unterminated.
        let matcher = Matcher::new("[abc", &GlobOptions::default()).unwrap();
        assert!(matcher.is_match("[abc"));
        assert!(!matcher.is_match("abc"));
    }

    #[test]
    fn test_ignore() {
        let options = GlobOptions::default().with_ignore(["**/test.js"]);
        let matcher = Matcher::new("**/*.js", &options).unwrap();
        assert!(matcher.is_match("src/app.js"));
        assert!(!matcher.is_match("src/test.js"));
    }

    #[test]
    fn test_hooks() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (on_result, on_ignore, on_match) = (events.clone(), events.clone(), events.clone());
        let options = GlobOptions::default()
            .with_ignore(["b.js"])
            .with_on_result(move |r| on_result.lock().unwrap().push(format!("result {}", r.input)))
            .with_on_ignore(move |r| on_ignore.lock().unwrap().push(format!("ignore {}", r.input)))
            .with_on_match(move |r| on_match.lock().unwrap().push(format!("match {}", r.input)));
        let matcher = Matcher::new("*.js", &options).unwrap();

        assert!(matcher.is_match("a.js"));
        assert!(!matcher.is_match("b.js"));
        assert!(!matcher.is_match("c.md"));

        insta::assert_yaml_snapshot!(events.lock().unwrap().clone(), @r###"
        - result a.js
        - match a.js
        - result b.js
        - ignore b.js
        - result c.md
        "###);
    }

    #[test]
    fn test_match_base() {
        let options = GlobOptions::default().with_match_base(true);
        let matcher = Matcher::new("*.txt", &options).unwrap();
        assert!(matcher.is_match("deeply/nested/file.txt"));
        assert!(!matcher.is_match("deeply/nested/file.md"));
    }

    #[test]
    fn test_match_base_provider() {
        let options =
            GlobOptions::default().with_match_base(crate::Resolvable::<bool>::Provider(Arc::new(|input: &str| {
                input.starts_with("deep")
            })));
        let matcher = Matcher::new("*.txt", &options).unwrap();
        assert!(matcher.is_match("deeply/nested/file.txt"));
        assert!(!matcher.is_match("shallow/file.txt"));
    }

    #[test]
    fn test_windows_inputs_are_normalized() {
        let options = GlobOptions::default().with_windows(true);
        let matcher = Matcher::new("src/*.rs", &options).unwrap();
        let result = matcher.match_details(r"src\lib.rs");
        assert!(result.is_match);
        assert_eq!(result.input, r"src\lib.rs");
        assert_eq!(result.output, "src/lib.rs");
    }

    #[test]
    fn test_custom_format() {
        let options = GlobOptions::default().with_format(|input| input.trim_start_matches("./").to_string());
        let matcher = Matcher::new("a/*.js", &options).unwrap();
        assert!(matcher.is_match("./a/b.js"));
    }

    #[test]
    fn test_captures() {
        let options = GlobOptions {
            capture: true,
            ..GlobOptions::default()
        };
        let matcher = Matcher::new("src/*.rs", &options).unwrap();
        let result = matcher.match_details("src/lib.rs");
        assert!(result.is_match);
        assert_eq!(result.captures, vec![Some("lib".to_string())]);
    }

    #[test]
    fn test_from_state() {
        let state = crate::parse("*.rs", &GlobOptions::default()).unwrap();
        let matcher = Matcher::new(state, &GlobOptions::default()).unwrap();
        assert!(matcher.is_match("lib.rs"));
    }

    #[test]
    fn test_result_serialization() {
        let matcher = Matcher::new("*.rs", &GlobOptions::default()).unwrap();
        let json = serde_json::to_value(matcher.match_details("lib.rs")).unwrap();
        assert_eq!(json["is_match"], true);
        assert_eq!(json["pattern"], "*.rs");
        assert!(json.get("captures").is_none());
    }

    #[test]
    fn test_is_match() {
        assert!(is_match("a/b.js", "**/*.js", &GlobOptions::default()).unwrap());
        assert!(!is_match("a/.b.js", "**/*.js", &GlobOptions::default()).unwrap());
    }
}
