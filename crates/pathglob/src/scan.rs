//! Splits a pattern into its literal base directory and its glob portion without compiling it.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize, Serializer};

use crate::utils::remove_backslashes;

/// Options that control [`scan`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScanOptions {
    /// Split the pattern into its path segments. Implies `scan_to_end`.
    pub parts: bool,
    /// Record one [`ScanToken`] per path segment.
    pub tokens: bool,
    /// Keep scanning after the first glob character instead of stopping there.
    pub scan_to_end: bool,
    /// Do not treat `+(`, `@(`, `*(`, `?(` and `!(` as extended globs.
    #[serde(alias = "noextglob")]
    pub noext: bool,
    /// Do not treat a leading `!` as negation.
    pub nonegate: bool,
    /// Do not treat `(` as a glob character.
    pub noparen: bool,
    /// Remove escaping backslashes from the base and the glob.
    pub unescape: bool,
}

impl ScanOptions {
    /// Splits the pattern into parts.
    pub fn with_parts(mut self, parts: bool) -> Self {
        self.parts = parts;
        self
    }

    /// Records per-segment tokens.
    pub fn with_tokens(mut self, tokens: bool) -> Self {
        self.tokens = tokens;
        self
    }

    /// Scans the whole pattern.
    pub fn with_scan_to_end(mut self, scan_to_end: bool) -> Self {
        self.scan_to_end = scan_to_end;
        self
    }

    /// Removes escaping backslashes from the result.
    pub fn with_unescape(mut self, unescape: bool) -> Self {
        self.unescape = unescape;
        self
    }
}

/// How many directory levels a segment can span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Depth {
    /// A fixed number of levels.
    Finite(usize),
    /// Any number of levels, as spanned by a globstar.
    Unbounded,
}

impl Depth {
    fn zero() -> Self {
        Depth::Finite(0)
    }
}

impl AddAssign for Depth {
    fn add_assign(&mut self, rhs: Self) {
        *self = match (*self, rhs) {
            (Depth::Finite(a), Depth::Finite(b)) => Depth::Finite(a + b),
            _ => Depth::Unbounded,
        };
    }
}

impl Serialize for Depth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Depth::Finite(depth) => serializer.serialize_u64(*depth as u64),
            Depth::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

/// One path segment of a scanned pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanToken {
    /// The text of the segment, or the skipped prefix for a prefix token.
    pub value: String,
    /// The number of directory levels this segment spans.
    pub depth: Depth,
    /// True if the segment contains glob syntax.
    pub is_glob: bool,
    /// True for the token that stands in for the skipped prefix.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_prefix: bool,
    /// True if the segment contains `**`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_globstar: bool,
    /// True if the segment contains an extended glob.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_extglob: bool,
    /// True if the segment contains a brace group.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_brace: bool,
    /// True if the segment contains a bracket expression.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_bracket: bool,
    /// True if the segment carried the negation `!`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub negated: bool,
    /// True if the segment contains escaping backslashes.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub backslashes: bool,
}

impl Default for ScanToken {
    fn default() -> Self {
        Self {
            value: String::new(),
            depth: Depth::zero(),
            is_glob: false,
            is_prefix: false,
            is_globstar: false,
            is_extglob: false,
            is_brace: false,
            is_bracket: false,
            negated: false,
            backslashes: false,
        }
    }
}

/// The result of [`scan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanState {
    /// The leading `!` and `./` sequences that were skipped.
    pub prefix: String,
    /// The pattern as given.
    pub input: String,
    /// The byte offset at which the base starts.
    pub start: usize,
    /// The literal directory portion before the first glob segment.
    pub base: String,
    /// Everything from the first glob segment on.
    pub glob: String,
    /// True if a brace group was found.
    pub is_brace: bool,
    /// True if a bracket expression was found.
    pub is_bracket: bool,
    /// True if the pattern contains any glob syntax.
    pub is_glob: bool,
    /// True if an extended glob was found.
    pub is_extglob: bool,
    /// True if a `**` was found.
    pub is_globstar: bool,
    /// True if the pattern starts with `!`.
    pub negated: bool,
    /// True if the pattern starts with a `!(...)` group.
    pub negated_extglob: bool,
    /// The sum of the depths of all tokens. Only set with [`ScanOptions::tokens`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<Depth>,
    /// One token per path segment. Only set with [`ScanOptions::tokens`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<ScanToken>>,
    /// Byte offsets of the separators. Only set with parts or tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slashes: Option<Vec<usize>>,
    /// The path segments. Only set with parts or tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<String>>,
}

fn is_path_separator(byte: u8) -> bool {
    byte == b'/' || byte == b'\\'
}

fn is_extglob_char(byte: u8) -> bool {
    matches!(byte, b'+' | b'@' | b'*' | b'?' | b'!')
}

struct Scanner<'a> {
    bytes: &'a [u8],
    /// Index of the byte in `code`.
    index: Option<usize>,
    code: Option<u8>,
    prev: Option<u8>,
}

impl<'a> Scanner<'a> {
    fn position(&self) -> usize {
        self.index.unwrap_or_default()
    }

    fn eos(&self) -> bool {
        self.index.map_or(self.bytes.is_empty(), |i| i + 1 >= self.bytes.len())
    }

    fn peek(&self) -> Option<u8> {
        let next = self.index.map_or(0, |i| i + 1);
        self.bytes.get(next).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        self.prev = self.code;
        let next = self.index.map_or(0, |i| i + 1);
        self.index = Some(next);
        self.code = self.bytes.get(next).copied();
        self.code
    }
}

/// Scans `input` for its base directory, glob portion and the kinds of glob syntax it uses.
///
/// ```
/// # use pathglob::{scan, ScanOptions};
/// let state = scan("!./foo/*.js", &ScanOptions::default());
/// assert_eq!(state.prefix, "!./");
/// assert_eq!(state.base, "foo");
/// assert_eq!(state.glob, "*.js");
/// assert!(state.negated);
/// ```
pub fn scan(input: &str, options: &ScanOptions) -> ScanState {
    let scan_to_end = options.parts || options.scan_to_end;
    let mut slashes = Vec::new();
    let mut tokens = Vec::new();
    let mut parts = Vec::new();

    let mut s = Scanner {
        bytes: input.as_bytes(),
        index: None,
        code: None,
        prev: None,
    };

    let mut start = 0;
    let mut last_index = 0;
    let mut is_brace = false;
    let mut is_bracket = false;
    let mut is_glob = false;
    let mut is_extglob = false;
    let mut is_globstar = false;
    let mut brace_escaped = false;
    let mut backslashes = false;
    let mut negated = false;
    let mut negated_extglob = false;
    let mut finished = false;
    let mut braces = 0usize;
    let mut token = ScanToken::default();

    while !s.eos() {
        let Some(code) = s.advance() else {
            break;
        };

        if code == b'\\' {
            backslashes = true;
            token.backslashes = true;
            if s.advance() == Some(b'{') {
                brace_escaped = true;
            }
            continue;
        }

        if brace_escaped || code == b'{' {
            braces += 1;

            while !s.eos() {
                let Some(next) = s.advance() else {
                    break;
                };
                match next {
                    b'\\' => {
                        backslashes = true;
                        token.backslashes = true;
                        s.advance();
                    }
                    b'{' => braces += 1,
                    b'.' if !brace_escaped => {
                        if s.advance() == Some(b'.') {
                            is_brace = true;
                            token.is_brace = true;
                            is_glob = true;
                            token.is_glob = true;
                            finished = true;
                            if !scan_to_end {
                                break;
                            }
                        }
                    }
                    b',' if !brace_escaped => {
                        is_brace = true;
                        token.is_brace = true;
                        is_glob = true;
                        token.is_glob = true;
                        finished = true;
                        if !scan_to_end {
                            break;
                        }
                    }
                    b'}' => {
                        braces = braces.saturating_sub(1);
                        if braces == 0 {
                            brace_escaped = false;
                            is_brace = true;
                            token.is_brace = true;
                            finished = true;
                            break;
                        }
                    }
                    _ => {}
                }
            }

            if scan_to_end {
                continue;
            }
            break;
        }

        if code == b'/' {
            let index = s.position();
            slashes.push(index);
            tokens.push(std::mem::take(&mut token));

            if finished {
                continue;
            }
            if s.prev == Some(b'.') && index == start + 1 {
                start += 2;
                continue;
            }
            last_index = index + 1;
            continue;
        }

        if !options.noext && is_extglob_char(code) && s.peek() == Some(b'(') {
            is_glob = true;
            token.is_glob = true;
            is_extglob = true;
            token.is_extglob = true;
            finished = true;
            if code == b'!' && s.position() == start {
                negated_extglob = true;
            }

            if scan_to_end {
                while !s.eos() {
                    let Some(next) = s.advance() else {
                        break;
                    };
                    if next == b'\\' {
                        backslashes = true;
                        token.backslashes = true;
                        s.advance();
                        continue;
                    }
                    if next == b')' {
                        is_glob = true;
                        token.is_glob = true;
                        finished = true;
                        break;
                    }
                }
                continue;
            }
            break;
        }

        if code == b'*' {
            if s.prev == Some(b'*') {
                is_globstar = true;
                token.is_globstar = true;
            }
            is_glob = true;
            token.is_glob = true;
            finished = true;
            if scan_to_end {
                continue;
            }
            break;
        }

        if code == b'?' {
            is_glob = true;
            token.is_glob = true;
            finished = true;
            if scan_to_end {
                continue;
            }
            break;
        }

        if code == b'[' {
            while !s.eos() {
                let Some(next) = s.advance() else {
                    break;
                };
                if next == b'\\' {
                    backslashes = true;
                    token.backslashes = true;
                    s.advance();
                    continue;
                }
                if next == b']' {
                    is_bracket = true;
                    token.is_bracket = true;
                    is_glob = true;
                    token.is_glob = true;
                    finished = true;
                    break;
                }
            }
            if scan_to_end {
                continue;
            }
            break;
        }

        if !options.nonegate && code == b'!' && s.position() == start {
            negated = true;
            token.negated = true;
            start += 1;
            continue;
        }

        if !options.noparen && code == b'(' {
            is_glob = true;
            token.is_glob = true;

            if scan_to_end {
                while !s.eos() {
                    let Some(next) = s.advance() else {
                        break;
                    };
                    if next == b'\\' {
                        backslashes = true;
                        token.backslashes = true;
                        s.advance();
                        continue;
                    }
                    if next == b')' {
                        finished = true;
                        break;
                    }
                }
                continue;
            }
            break;
        }

        if is_glob {
            finished = true;
            if scan_to_end {
                continue;
            }
            break;
        }
    }

    if options.noext {
        is_extglob = false;
        is_glob = false;
    }

    let (prefix, rest) = input.split_at(start.min(input.len()));
    let last_index = last_index.saturating_sub(start);

    let mut base;
    let mut glob = String::new();
    if !input.is_empty() && is_glob && last_index > 0 {
        base = rest[..last_index].to_string();
        glob = rest[last_index..].to_string();
    } else if is_glob {
        base = String::new();
        glob = rest.to_string();
    } else {
        base = rest.to_string();
    }

    if !base.is_empty() && base != "/" && base != rest && base.bytes().last().is_some_and(is_path_separator) {
        base.pop();
    }

    if options.unescape {
        if !glob.is_empty() {
            glob = remove_backslashes(&glob);
        }
        if !base.is_empty() && backslashes {
            base = remove_backslashes(&base);
        }
    }

    let mut state = ScanState {
        prefix: prefix.to_string(),
        input: input.to_string(),
        start,
        base,
        glob,
        is_brace,
        is_bracket,
        is_glob,
        is_extglob,
        is_globstar,
        negated,
        negated_extglob,
        max_depth: None,
        tokens: None,
        slashes: None,
        parts: None,
    };

    if !(options.parts || options.tokens) {
        return state;
    }

    if options.tokens && !s.code.is_some_and(is_path_separator) {
        tokens.push(token);
    }

    let mut max_depth = Depth::zero();
    let mut prev_index: Option<usize> = None;
    for (idx, &slash) in slashes.iter().enumerate() {
        let from = prev_index.map_or(start, |i| i + 1);
        let value = input.get(from..slash).unwrap_or_default();
        if options.tokens {
            if let Some(token) = tokens.get_mut(idx) {
                if idx == 0 && start != 0 {
                    token.is_prefix = true;
                    token.value = state.prefix.clone();
                } else {
                    token.value = value.to_string();
                    token.depth = segment_depth(token);
                }
                max_depth += token.depth;
            }
        }
        if idx != 0 || !value.is_empty() {
            parts.push(value.to_string());
        }
        prev_index = Some(slash);
    }

    if let Some(prev_index) = prev_index {
        if prev_index + 1 < input.len() {
            let value = &input[prev_index + 1..];
            parts.push(value.to_string());
            if options.tokens {
                if let Some(token) = tokens.last_mut() {
                    token.value = value.to_string();
                    token.depth = segment_depth(token);
                    max_depth += token.depth;
                }
            }
        }
    }

    if options.tokens {
        state.max_depth = Some(max_depth);
        state.tokens = Some(tokens);
    }
    state.slashes = Some(slashes);
    state.parts = Some(parts);
    state
}

fn segment_depth(token: &ScanToken) -> Depth {
    if token.is_globstar {
        Depth::Unbounded
    } else {
        Depth::Finite(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::negated_relative("!./foo/*.js", "!./", "foo", "*.js")]
    #[case::relative("./foo/bar/*.js", "./", "foo/bar", "*.js")]
    #[case::literal("foo/bar/baz.js", "", "foo/bar/baz.js", "")]
    #[case::glob_first("*.js", "", "", "*.js")]
    #[case::globstar("foo/**/bar.js", "", "foo", "**/bar.js")]
    #[case::brace("foo/{a,b}/c.js", "", "foo", "{a,b}/c.js")]
    #[case::bracket("foo/[abc].js", "", "foo", "[abc].js")]
    #[case::extglob("foo/@(a|b).js", "", "foo", "@(a|b).js")]
    #[case::escaped_star(r"foo/\*.js", "", r"foo/\*.js", "")]
    #[case::root_glob("/*.js", "", "/", "*.js")]
    fn test_base_and_glob(
        #[case] input: &str,
        #[case] prefix: &str,
        #[case] base: &str,
        #[case] glob: &str,
    ) {
        let state = scan(input, &ScanOptions::default());
        assert_eq!(state.prefix, prefix);
        assert_eq!(state.base, base);
        assert_eq!(state.glob, glob);
    }

    #[test]
    fn test_flags() {
        let state = scan("!./foo/*.js", &ScanOptions::default());
        assert!(state.negated);
        assert!(state.is_glob);
        assert!(!state.is_globstar);
        assert_eq!(state.start, 3);

        let state = scan("a/**/b", &ScanOptions::default());
        assert!(!state.is_globstar);
        let state = scan("a/**/b", &ScanOptions::default().with_scan_to_end(true));
        assert!(state.is_globstar);

        let state = scan("!(foo)*.js", &ScanOptions::default());
        assert!(state.negated_extglob);
        assert!(state.is_extglob);
        assert!(!state.negated);
    }

    #[test]
    fn test_noext() {
        let options = ScanOptions {
            noext: true,
            ..ScanOptions::default()
        };
        let state = scan("foo/+(a)", &options);
        assert!(!state.is_extglob);
        assert!(!state.is_glob);
    }

    #[test]
    fn test_nonegate() {
        let options = ScanOptions {
            nonegate: true,
            ..ScanOptions::default()
        };
        let state = scan("!foo/*.js", &options);
        assert!(!state.negated);
        assert_eq!(state.prefix, "");
        assert_eq!(state.base, "!foo");
    }

    #[test]
    fn test_unescape() {
        let options = ScanOptions::default().with_unescape(true);
        let state = scan(r"foo/\[bar\]/*.js", &options);
        assert_eq!(state.base, "foo/[bar]");
        assert_eq!(state.glob, "*.js");
    }

    #[test]
    fn test_parts() {
        let state = scan("./foo/bar/*.js", &ScanOptions::default().with_parts(true));
        assert_eq!(
            state.parts.unwrap(),
            vec!["foo".to_string(), "bar".to_string(), "*.js".to_string()]
        );
        assert_eq!(state.slashes.unwrap(), vec![1, 5, 9]);
    }

    #[test]
    fn test_parts_keep_last_segment_after_root() {
        let state = scan("/a", &ScanOptions::default().with_parts(true));
        assert_eq!(state.parts.unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_tokens() {
        let state = scan("foo/**/*.js", &ScanOptions::default().with_tokens(true).with_scan_to_end(true));
        insta::assert_yaml_snapshot!(state, @r###"
        prefix: ""
        input: foo/**/*.js
        start: 0
        base: foo
        glob: "**/*.js"
        is_brace: false
        is_bracket: false
        is_glob: true
        is_extglob: false
        is_globstar: true
        negated: false
        negated_extglob: false
        max_depth: unbounded
        tokens:
          - value: foo
            depth: 1
            is_glob: false
          - value: "**"
            depth: unbounded
            is_glob: true
            is_globstar: true
          - value: "*.js"
            depth: 1
            is_glob: true
        slashes:
          - 3
          - 6
        parts:
          - foo
          - "**"
          - "*.js"
        "###);
    }

    #[test]
    fn test_prefix_token() {
        let state = scan("./a/b", &ScanOptions::default().with_tokens(true));
        let tokens = state.tokens.unwrap();
        assert!(tokens[0].is_prefix);
        assert_eq!(tokens[0].value, "./");
        assert_eq!(tokens[0].depth, Depth::Finite(0));
        assert_eq!(state.max_depth, Some(Depth::Finite(2)));
    }
}
