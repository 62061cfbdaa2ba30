//! Expression fragments used while translating glob patterns.
//!
//! The tables are read-only and come in two flavours: [`POSIX_CHARS`] where `/` is the only path
//! separator and [`WINDOWS_CHARS`] where both `\` and `/` separate path segments.

/// Hard upper bound on the length of a pattern, in characters.
pub const MAX_LENGTH: usize = 1024 * 64;

/// Fragment that asserts that at least one character follows.
pub const ONE_CHAR: &str = "(?=.)";

/// Escaped `.` as it appears in an expression.
pub const DOT_LITERAL: &str = r"\.";

/// Escaped `+` as it appears in an expression.
pub const PLUS_LITERAL: &str = r"\+";

/// Escaped `?` as it appears in an expression.
pub const QMARK_LITERAL: &str = r"\?";

/// Platform dependent fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformChars {
    /// Matches a single path separator.
    pub slash_literal: &'static str,
    /// The separator characters as they appear inside a character class.
    pub slash_class: &'static str,
    /// Matches any single character that is not a separator.
    pub qmark: &'static str,
    /// Matches a single character that is neither a separator nor a dot.
    pub qmark_no_dot: &'static str,
    /// Lazily matches a run of non-separator characters.
    pub star: &'static str,
    /// Matches the start of the input or a separator.
    pub start_anchor: &'static str,
    /// Matches a `.` or `..` segment.
    pub dots_slash: &'static str,
    /// Rejects a leading dot.
    pub no_dot: &'static str,
    /// Rejects an empty or `.` segment.
    pub no_dot_slash: &'static str,
    /// Rejects a `.` or `..` segment.
    pub no_dots_slash: &'static str,
}

/// Fragments for posix style paths.
pub const POSIX_CHARS: PlatformChars = PlatformChars {
    slash_literal: "/",
    slash_class: "/",
    qmark: "[^/]",
    qmark_no_dot: "[^./]",
    star: "[^/]*?",
    start_anchor: "(?:^|/)",
    dots_slash: r"\.{1,2}(?:/|$)",
    no_dot: r"(?!\.)",
    no_dot_slash: r"(?!\.{0,1}(?:/|$))",
    no_dots_slash: r"(?!\.{1,2}(?:/|$))",
};

/// Fragments for windows style paths.
pub const WINDOWS_CHARS: PlatformChars = PlatformChars {
    slash_literal: r"[\\/]",
    slash_class: r"\\/",
    qmark: r"[^\\/]",
    qmark_no_dot: r"[^.\\/]",
    star: r"[^\\/]*?",
    start_anchor: r"(?:^|[\\/])",
    dots_slash: r"\.{1,2}(?:[\\/]|$)",
    no_dot: r"(?!\.)",
    no_dot_slash: r"(?!\.{0,1}(?:[\\/]|$))",
    no_dots_slash: r"(?!\.{1,2}(?:[\\/]|$))",
};

/// Returns the fragment table for the requested separator convention.
pub fn platform_chars(windows: bool) -> &'static PlatformChars {
    if windows {
        &WINDOWS_CHARS
    } else {
        &POSIX_CHARS
    }
}

/// Returns the character class source for a POSIX bracket class name such as `alpha`.
pub fn posix_class_source(name: &str) -> Option<&'static str> {
    Some(match name {
        "alnum" => "a-zA-Z0-9",
        "alpha" => "a-zA-Z",
        "ascii" => r"\x00-\x7F",
        "blank" => r" \t",
        "cntrl" => r"\x00-\x1F\x7F",
        "digit" => "0-9",
        "graph" => r"\x21-\x7E",
        "lower" => "a-z",
        "print" => r"\x20-\x7E ",
        "punct" => r##"\-!"#$%\&'()*+,./:;<=>?@\[\\\]^_`{|}\~"##,
        "space" => r" \t\r\n\x0B\x0C",
        "upper" => "A-Z",
        "word" => "A-Za-z0-9_",
        "xdigit" => "A-Fa-f0-9",
        _ => return None,
    })
}

/// Patterns that are equivalent to a shorter spelling.
pub fn replacement(pattern: &str) -> Option<&'static str> {
    match pattern {
        "***" => Some("*"),
        "**/**" | "**/**/**" => Some("**"),
        _ => None,
    }
}

/// The kinds of extended glob groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtglobKind {
    /// `!(...)`, matches anything except the alternatives.
    Negate,
    /// `?(...)`, matches zero or one occurrence.
    Qmark,
    /// `+(...)`, matches one or more occurrences.
    Plus,
    /// `*(...)`, matches zero or more occurrences.
    Star,
    /// `@(...)`, matches exactly one occurrence.
    At,
}

impl ExtglobKind {
    /// The prefix character of the group.
    pub fn prefix(self) -> char {
        match self {
            ExtglobKind::Negate => '!',
            ExtglobKind::Qmark => '?',
            ExtglobKind::Plus => '+',
            ExtglobKind::Star => '*',
            ExtglobKind::At => '@',
        }
    }

    /// The fragment that opens the group.
    pub fn open(self) -> &'static str {
        match self {
            ExtglobKind::Negate => "(?:(?!(?:",
            _ => "(?:",
        }
    }

    /// The fragment that closes the group, `star` is the platform star fragment.
    pub fn close(self, star: &str) -> String {
        match self {
            ExtglobKind::Negate => format!(")){star})"),
            ExtglobKind::Qmark => ")?".to_string(),
            ExtglobKind::Plus => ")+".to_string(),
            ExtglobKind::Star => ")*".to_string(),
            ExtglobKind::At => ")".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::posix(false)]
    #[case::windows(true)]
    fn test_fragments_compile(#[case] windows: bool) {
        let chars = platform_chars(windows);
        for fragment in [
            chars.slash_literal,
            chars.qmark,
            chars.qmark_no_dot,
            chars.star,
            chars.start_anchor,
            chars.dots_slash,
            chars.no_dot,
            chars.no_dot_slash,
            chars.no_dots_slash,
        ] {
            assert!(
                fancy_regex::Regex::new(fragment).is_ok(),
                "fragment {fragment} does not compile"
            );
        }
    }

    #[test]
    fn test_posix_classes_compile() {
        for name in [
            "alnum", "alpha", "ascii", "blank", "cntrl", "digit", "graph", "lower", "print",
            "punct", "space", "upper", "word", "xdigit",
        ] {
            let source = format!("[{}]", posix_class_source(name).unwrap());
            assert!(
                fancy_regex::Regex::new(&source).is_ok(),
                "class {name} does not compile"
            );
        }
        assert_eq!(posix_class_source("nope"), None);
    }

    #[rstest]
    #[case::negate(ExtglobKind::Negate, "(?:(?!(?:a)){star})")]
    #[case::at(ExtglobKind::At, "(?:a)")]
    #[case::plus(ExtglobKind::Plus, "(?:a)+")]
    fn test_extglob_fragments(#[case] kind: ExtglobKind, #[case] expected: &str) {
        let star = POSIX_CHARS.star;
        let fragment = format!("{}a{}", kind.open(), kind.close(star));
        assert_eq!(fragment, expected.replace("{star}", star));
    }

    #[test]
    fn test_punct_matches_punctuation_only() {
        let re = fancy_regex::Regex::new(&format!("^[{}]$", posix_class_source("punct").unwrap()))
            .unwrap();
        for c in "-!\"#$%&'()*+,./:;<=>?@[\\]^_`{|}~".chars() {
            assert!(re.is_match(&c.to_string()).unwrap(), "{c} should match");
        }
        assert!(!re.is_match("a").unwrap());
        assert!(!re.is_match("0").unwrap());
    }
}
