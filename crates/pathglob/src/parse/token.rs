use serde::{Deserialize, Serialize};

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// The beginning of the pattern. Always the first token.
    Bos,
    /// Literal text, including constructs that were escaped because they were never closed.
    Text,
    /// A `*` within a single path segment.
    Star,
    /// A `**` that spans any number of path segments.
    Globstar,
    /// A `?` matching one character.
    Qmark,
    /// A literal `.`.
    Dot,
    /// The `..` of a brace range.
    Dots,
    /// A path separator.
    Slash,
    /// The optional trailing separator appended after a trailing wildcard.
    MaybeSlash,
    /// The `{` that opens a brace group.
    BraceOpen,
    /// The `}` that closes a brace group.
    BraceClose,
    /// A `,` separating brace alternatives.
    Comma,
    /// A bracket expression such as `[a-z]`.
    Bracket,
    /// A plain parenthesis.
    Paren,
    /// A literal `+`.
    Plus,
    /// The `@` of an `@(...)` group.
    At,
    /// The `!` of a `!(...)` group.
    NegateExtglob,
    /// The `?` of a `?(...)` group.
    QmarkExtglob,
    /// The `+` of a `+(...)` group.
    PlusExtglob,
    /// The `*` of a `*(...)` group.
    StarExtglob,
    /// A `|` separating alternatives.
    Pipe,
}

/// A unit emitted while scanning a pattern.
///
/// Tokens live in a single list in emission order. A token refers to its predecessor only
/// through its position in that list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// What kind of construct this token represents.
    pub kind: TokenKind,

    /// The source text consumed for this token.
    pub value: String,

    /// The expression fragment contributed by this token, if it differs from `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Set when a run of stars was collapsed into this token.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub star: bool,

    /// Set on bracket tokens that contain a POSIX class.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub posix: bool,

    /// Set on the parentheses that open and close an extended glob group.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub extglob: bool,
}

impl Token {
    /// Creates a token whose fragment is its source text.
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            output: None,
            star: false,
            posix: false,
            extglob: false,
        }
    }

    /// Creates a token with an explicit fragment.
    pub fn with_output(kind: TokenKind, value: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Self::new(kind, value)
        }
    }

    pub(crate) fn extglob(mut self) -> Self {
        self.extglob = true;
        self
    }

    /// The fragment this token contributes to the expression.
    pub fn emitted(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.value)
    }

    /// Appends `fragment` to the emitted fragment of this token.
    pub(crate) fn append_output(&mut self, fragment: &str) {
        let mut output = self.emitted().to_string();
        output.push_str(fragment);
        self.output = Some(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitted_falls_back_to_value() {
        let mut token = Token::new(TokenKind::Text, "abc");
        assert_eq!(token.emitted(), "abc");
        token.append_output("def");
        assert_eq!(token.emitted(), "abcdef");
        assert_eq!(token.value, "abc");
    }

    #[test]
    fn test_serialize_skips_defaults() {
        let token = Token::with_output(TokenKind::Slash, "/", "");
        insta::assert_yaml_snapshot!(token, @r###"
        kind: slash
        value: /
        output: ""
        "###);
    }
}
