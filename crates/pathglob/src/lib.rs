#![deny(missing_docs)]
//! Compiles shell-style glob patterns into matchers for path strings.
//!
//! Patterns are translated into a regular expression and tested against inputs. The supported
//! syntax covers:
//!
//! - `*` and `?` within a single path segment, and `**` spanning any number of segments
//! - bracket expressions such as `[a-z]`, `[!abc]` and POSIX classes like `[[:digit:]]`
//! - brace alternatives `{a,b}` and ranges `{1..10}` or `{a..e}`
//! - extended globs `!(a|b)`, `?(a)`, `+(a)`, `*(a)` and `@(a)`
//! - a leading `!` to negate the whole pattern
//!
//! # Dotfiles
//!
//! Wildcards never match a segment that starts with a `.` unless the pattern itself has a
//! literal dot there or [`GlobOptions::dot`] is set. `.` and `..` are never matched by a
//! wildcard.
//!
//! # Example
//!
//! ```
//! use pathglob::{GlobOptions, Matcher};
//!
//! let matcher = Matcher::new("src/**/*.rs", &GlobOptions::default()).unwrap();
//! assert!(matcher.is_match("src/parse/mod.rs"));
//! assert!(!matcher.is_match("src/.hidden.rs"));
//! ```
//!
//! Malformed patterns are not an error by default. An unterminated bracket, brace or paren is
//! matched literally. Set [`GlobOptions::strict_brackets`] to get an error instead.

mod compile;
mod constants;
mod error;
mod fast_path;
mod matcher;
mod options;
mod parse;
mod scan;
mod utils;

pub use compile::{
    compile, compile_many, compile_state, expression_source, make_regex, scan_pattern,
    CompiledMatcher, Expression,
};
pub use constants::MAX_LENGTH;
pub use error::GlobError;
pub use fast_path::fast_path;
pub use matcher::{is_match, GlobInput, MatchResult, Matcher, PatternSource};
pub use options::{GlobOptions, InputFormatter, MatchHook, RangeExpander, Resolvable};
pub use parse::{default_expand_range, parse, ParseState, Token, TokenKind};
pub use scan::{scan, Depth, ScanOptions, ScanState, ScanToken};
