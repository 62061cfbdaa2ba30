//! The scanner that turns a glob pattern into an expression fragment.
//!
//! The pattern is read in a single left-to-right pass. Every construct pushes a [`Token`] that
//! records the source text it consumed and the fragment it contributes. Constructs that are only
//! understood later (a `**` that turns out to be a whole path segment, a brace group without
//! alternatives, an unterminated bracket) rewrite the fragments of earlier tokens, and the final
//! expression is the concatenation of every token's fragment.

mod range;
mod token;

use serde::{Deserialize, Serialize};

use crate::constants::{
    platform_chars, posix_class_source, replacement, ExtglobKind, PlatformChars, DOT_LITERAL,
    ONE_CHAR, PLUS_LITERAL, QMARK_LITERAL,
};
use crate::error::GlobError;
use crate::options::GlobOptions;
use crate::utils::{escape_regex, has_regex_chars, remove_prefix};

pub use range::default_expand_range;
pub use token::{Token, TokenKind};

/// The result of scanning a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseState {
    /// The pattern that was scanned, after whole-pattern replacements.
    pub input: String,

    /// The expression fragment, not yet anchored.
    pub output: String,

    /// The literal prefix that was stripped before scanning, e.g. `./`.
    #[serde(default)]
    pub prefix: String,

    /// True if the pattern starts with an odd number of `!`.
    #[serde(default)]
    pub negated: bool,

    /// True if the pattern starts with a `!(...)` group.
    #[serde(default)]
    pub negated_extglob: bool,

    /// True if a construct rewrote the fragment of an earlier token.
    #[serde(default)]
    pub backtrack: bool,

    /// True if the pattern contains a `**` path segment.
    #[serde(default)]
    pub globstar: bool,

    /// True if the fragment was produced by the fast path instead of the scanner.
    #[serde(default)]
    pub fast_path: bool,

    /// The tokens in emission order, starting with the [`TokenKind::Bos`] token. Empty when the
    /// fragment was produced by the fast path.
    #[serde(default)]
    pub tokens: Vec<Token>,
}

/// Scans `pattern` into a [`ParseState`] without consulting the fast path.
pub fn parse(pattern: &str, options: &GlobOptions) -> Result<ParseState, GlobError> {
    if pattern.is_empty() {
        return Err(GlobError::EmptyPattern);
    }

    let input = replacement(pattern).unwrap_or(pattern);
    let length = input.chars().count();
    let max = options.max_length();
    if length > max {
        return Err(GlobError::InputTooLong { length, max });
    }

    Parser::new(input, options).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Paren,
    Brace,
    Bracket,
}

impl Group {
    fn opening(self) -> char {
        match self {
            Group::Paren => '(',
            Group::Brace => '{',
            Group::Bracket => '[',
        }
    }

    fn closing(self) -> char {
        match self {
            Group::Paren => ')',
            Group::Brace => '}',
            Group::Bracket => ']',
        }
    }

    fn token_kind(self) -> TokenKind {
        match self {
            Group::Paren => TokenKind::Paren,
            Group::Brace => TokenKind::BraceOpen,
            Group::Bracket => TokenKind::Bracket,
        }
    }
}

/// A construct that has been opened but not yet closed.
#[derive(Debug)]
struct OpenGroup {
    group: Group,
    /// Character offset of the opener.
    position: usize,
    /// Index of the opening token.
    token_index: usize,
}

#[derive(Debug)]
struct ExtglobGroup {
    kind: ExtglobKind,
    /// The raw text between the parentheses.
    inner: String,
    /// The paren depth outside of the group.
    paren_depth: usize,
    /// True if the group is the first construct of the pattern.
    after_bos: bool,
    /// Index of the prefix token, the opening paren follows it.
    token_index: usize,
    /// Indices of the alternation pipes of the group.
    pipes: Vec<usize>,
}

#[derive(Debug)]
struct BraceGroup {
    token_index: usize,
    commas: Vec<usize>,
    dots: bool,
}

struct Parser<'a> {
    opts: &'a GlobOptions,
    chars: &'static PlatformChars,
    input: Vec<char>,
    original: String,
    prefix: &'static str,

    /// Number of characters consumed. The character being processed is at `cursor - 1`.
    cursor: usize,
    /// Offset at which the glob proper starts, after negation and `./` prefixes.
    start: usize,

    bos: Token,
    tokens: Vec<Token>,

    parens: usize,
    braces: usize,
    brackets: usize,
    stack: Vec<OpenGroup>,
    extglobs: Vec<ExtglobGroup>,
    brace_groups: Vec<BraceGroup>,

    quoted: bool,
    negated: bool,
    negated_extglob: bool,
    globstar: bool,
    backtrack: bool,

    star: String,
    capture: &'static str,
}

impl<'a> Parser<'a> {
    fn new(input: &str, opts: &'a GlobOptions) -> Self {
        let chars = platform_chars(opts.windows);
        let (rest, prefix) = remove_prefix(input);

        let mut parser = Self {
            opts,
            chars,
            input: rest.chars().collect(),
            original: input.to_string(),
            prefix,
            cursor: 0,
            start: 0,
            bos: Token::with_output(TokenKind::Bos, "", opts.prepend.clone().unwrap_or_default()),
            tokens: Vec::new(),
            parens: 0,
            braces: 0,
            brackets: 0,
            stack: Vec::new(),
            extglobs: Vec::new(),
            brace_groups: Vec::new(),
            quoted: false,
            negated: false,
            negated_extglob: false,
            globstar: false,
            backtrack: false,
            star: String::new(),
            capture: if opts.capture { "" } else { "?:" },
        };

        let star = if opts.bash {
            parser.globstar_fragment()
        } else {
            chars.star.to_string()
        };
        parser.star = if opts.capture { format!("({star})") } else { star };
        parser
    }

    fn globstar_fragment(&self) -> String {
        let guard = if self.opts.dot {
            self.chars.dots_slash
        } else {
            DOT_LITERAL
        };
        format!(
            "({}(?:(?!{}{guard}).)*?)",
            self.capture, self.chars.start_anchor
        )
    }

    fn eos(&self) -> bool {
        self.cursor >= self.input.len()
    }

    /// Returns the character `n` positions after the current one.
    fn peek(&self, n: usize) -> Option<char> {
        (self.cursor + n)
            .checked_sub(1)
            .and_then(|idx| self.input.get(idx))
            .copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.input.get(self.cursor).copied();
        if c.is_some() {
            self.cursor += 1;
        }
        c
    }

    fn remaining(&self) -> &[char] {
        &self.input[self.cursor.min(self.input.len())..]
    }

    fn position(&self) -> usize {
        self.cursor.saturating_sub(1)
    }

    fn prev(&self) -> &Token {
        self.tokens.last().unwrap_or(&self.bos)
    }

    fn prev_mut(&mut self) -> &mut Token {
        match self.tokens.last_mut() {
            Some(token) => token,
            None => &mut self.bos,
        }
    }

    /// Returns the token `k` positions before the last one, counting the beginning of the pattern.
    fn back(&self, k: usize) -> Option<&Token> {
        let n = self.tokens.len();
        match k.cmp(&n) {
            std::cmp::Ordering::Less => self.tokens.get(n - 1 - k),
            std::cmp::Ordering::Equal => Some(&self.bos),
            std::cmp::Ordering::Greater => None,
        }
    }

    fn back_mut(&mut self, k: usize) -> Option<&mut Token> {
        let n = self.tokens.len();
        match k.cmp(&n) {
            std::cmp::Ordering::Less => self.tokens.get_mut(n - 1 - k),
            std::cmp::Ordering::Equal => Some(&mut self.bos),
            std::cmp::Ordering::Greater => None,
        }
    }

    fn output_is_empty(&self) -> bool {
        self.bos.emitted().is_empty() && self.tokens.iter().all(|t| t.emitted().is_empty())
    }

    fn counter_mut(&mut self, group: Group) -> &mut usize {
        match group {
            Group::Paren => &mut self.parens,
            Group::Brace => &mut self.braces,
            Group::Bracket => &mut self.brackets,
        }
    }

    fn increment(&mut self, group: Group, token_index: usize) {
        *self.counter_mut(group) += 1;
        let position = self.position();
        self.stack.push(OpenGroup {
            group,
            position,
            token_index,
        });
    }

    fn decrement(&mut self, group: Group) {
        let counter = self.counter_mut(group);
        *counter = counter.saturating_sub(1);
        if let Some(idx) = self.stack.iter().rposition(|open| open.group == group) {
            self.stack.remove(idx);
        }
    }

    fn push(&mut self, token: Token) {
        let brace_depth = self.braces;
        let in_extglob = !self.extglobs.is_empty();
        let star = &self.star;
        let prev = match self.tokens.last_mut() {
            Some(token) => token,
            None => &mut self.bos,
        };

        // A globstar that is not followed by a path boundary is an ordinary star.
        if prev.kind == TokenKind::Globstar {
            let is_brace = brace_depth > 0
                && matches!(
                    token.kind,
                    TokenKind::Comma | TokenKind::BraceOpen | TokenKind::BraceClose
                );
            let is_extglob =
                token.extglob || (in_extglob && matches!(token.kind, TokenKind::Pipe | TokenKind::Paren));
            if !matches!(token.kind, TokenKind::Slash | TokenKind::Paren) && !is_brace && !is_extglob {
                prev.kind = TokenKind::Star;
                prev.value = "*".to_string();
                prev.output = Some(star.clone());
            }
        }

        if token.kind != TokenKind::Paren {
            if let Some(extglob) = self.extglobs.last_mut() {
                extglob.inner.push_str(&token.value);
            }
        }

        if prev.kind == TokenKind::Text && token.kind == TokenKind::Text {
            prev.append_output(token.emitted());
            prev.value.push_str(&token.value);
            return;
        }

        self.tokens.push(token);
    }

    fn run(mut self) -> Result<ParseState, GlobError> {
        while let Some(c) = self.advance() {
            match c {
                '\0' => {}
                '\\' => self.parse_escape()?,
                _ if self.brackets > 0 => self.parse_bracket_content(c.to_string())?,
                '"' => {
                    self.quoted = !self.quoted;
                    if self.opts.keep_quotes {
                        self.push(Token::new(TokenKind::Text, "\""));
                    }
                }
                _ if self.quoted => {
                    self.push(Token::with_output(
                        TokenKind::Text,
                        c.to_string(),
                        escape_regex(&c.to_string()),
                    ));
                }
                '(' => {
                    self.increment(Group::Paren, self.tokens.len());
                    self.push(Token::new(TokenKind::Paren, "("));
                }
                ')' => self.parse_close_paren()?,
                '[' => self.parse_open_bracket()?,
                ']' => self.parse_stray_close_bracket()?,
                '{' if !self.opts.nobrace => {
                    self.increment(Group::Brace, self.tokens.len());
                    self.brace_groups.push(BraceGroup {
                        token_index: self.tokens.len(),
                        commas: Vec::new(),
                        dots: false,
                    });
                    let open = if self.opts.capture { "(" } else { "(?:" };
                    self.push(Token::with_output(TokenKind::BraceOpen, "{", open));
                }
                '}' => self.parse_close_brace()?,
                '|' => {
                    let index = self.tokens.len();
                    if let Some(extglob) = self.extglobs.last_mut() {
                        extglob.pipes.push(index);
                    }
                    self.push(Token::new(TokenKind::Pipe, "|"));
                }
                ',' => {
                    let mut output = ",";
                    let index = self.tokens.len();
                    let in_brace = self.stack.last().is_some_and(|open| open.group == Group::Brace);
                    if let (true, Some(brace)) = (in_brace, self.brace_groups.last_mut()) {
                        brace.commas.push(index);
                        output = "|";
                    }
                    self.push(Token::with_output(TokenKind::Comma, ",", output));
                }
                '/' => self.parse_slash(),
                '.' => self.parse_dot(),
                '?' => self.parse_qmark(),
                '!' => self.parse_bang(),
                '+' => self.parse_plus(),
                '@' => self.parse_at(),
                '*' => self.parse_star(),
                _ => self.parse_text(c),
            }
        }

        self.close_unterminated()?;

        if !self.opts.strict_slashes && matches!(self.prev().kind, TokenKind::Star | TokenKind::Bracket) {
            let maybe_slash = format!("{}?", self.chars.slash_literal);
            self.push(Token::with_output(TokenKind::MaybeSlash, "", maybe_slash));
        }

        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.push(self.bos);
        tokens.extend(self.tokens);
        let output = tokens.iter().map(Token::emitted).collect();

        Ok(ParseState {
            input: self.original,
            output,
            prefix: self.prefix.to_string(),
            negated: self.negated,
            negated_extglob: self.negated_extglob,
            backtrack: self.backtrack,
            globstar: self.globstar,
            fast_path: false,
            tokens,
        })
    }

    fn parse_escape(&mut self) -> Result<(), GlobError> {
        let next = self.peek(1);
        if next == Some('/') && !self.opts.bash {
            return Ok(());
        }
        if matches!(next, Some('.') | Some(';')) {
            return Ok(());
        }
        if next.is_none() {
            self.push(Token::with_output(TokenKind::Text, "\\", r"\\"));
            return Ok(());
        }

        // Collapse long runs of backslashes.
        let mut source = String::from("\\");
        let mut fragment = String::new();
        let run = self.remaining().iter().take_while(|&&c| c == '\\').count();
        if run > 2 {
            self.cursor += run;
            if run % 2 != 0 {
                source.push('\\');
                fragment.push_str(r"\\");
            }
        }

        let Some(escaped) = self.advance() else {
            self.push(Token::with_output(TokenKind::Text, source, fragment));
            return Ok(());
        };
        if self.opts.unescape {
            source.pop();
        }
        source.push(escaped);
        fragment.push_str(&escape_literal(escaped));

        if self.brackets == 0 {
            self.push(Token::with_output(TokenKind::Text, source, fragment));
            return Ok(());
        }
        self.parse_bracket_content(fragment)
    }

    fn parse_bracket_content(&mut self, value: String) -> Result<(), GlobError> {
        let prev_value = self.prev().value.as_str();
        let at_class_start = matches!(prev_value, "[" | "[^");

        if value == "]" && !at_class_start {
            return self.parse_close_bracket();
        }

        if self.opts.posix != Some(false) && value == ":" && self.substitute_posix_class() {
            return Ok(());
        }

        let prev_value = self.prev().value.as_str();
        let next = self.peek(1);
        let replaced = match value.as_str() {
            "[" if next != Some(':') => Some(r"\["),
            "-" if next == Some(']') => Some(r"\-"),
            "-" if prev_value.ends_with('-') && !prev_value.ends_with(r"\-") => Some(r"\-"),
            "&" => Some(r"\&"),
            "~" => Some(r"\~"),
            "]" => Some(r"\]"),
            "!" if self.opts.posix != Some(false) && prev_value == "[" => Some("^"),
            _ => None,
        };
        let value = replaced.map_or(value, str::to_string);
        self.prev_mut().value.push_str(&value);
        Ok(())
    }

    /// Replaces a `[:name:` sequence at the end of the current bracket with the class source.
    /// Returns false if the bracket does not end in a known class name.
    fn substitute_posix_class(&mut self) -> bool {
        let prev = self.prev();
        let inner = prev.value.get(1..).unwrap_or_default();
        if !inner.contains('[') {
            return false;
        }
        let has_colon = inner.contains(':');
        let replaced = prev.value.rfind('[').and_then(|idx| {
            let name = prev.value.get(idx + 2..)?;
            let source = posix_class_source(name)?;
            Some(format!("{}{source}", &prev.value[..idx]))
        });

        let token_count = self.tokens.len();
        let prev = self.prev_mut();
        prev.posix = true;
        let Some(value) = replaced.filter(|_| has_colon) else {
            return false;
        };
        prev.value = value;
        self.backtrack = true;
        // Skip the `]` that closes the class name.
        self.advance();
        if token_count == 1 && self.bos.emitted().is_empty() {
            self.bos.output = Some(ONE_CHAR.to_string());
        }
        true
    }

    fn parse_open_bracket(&mut self) -> Result<(), GlobError> {
        if self.opts.nobracket || !self.remaining().contains(&']') {
            if !self.opts.nobracket && self.opts.strict_brackets {
                return Err(GlobError::MissingClosing {
                    construct: ']',
                    position: self.position(),
                });
            }
            self.push(Token::with_output(TokenKind::Text, "[", r"\["));
            return Ok(());
        }
        self.increment(Group::Bracket, self.tokens.len());
        self.push(Token::new(TokenKind::Bracket, "["));
        Ok(())
    }

    fn parse_stray_close_bracket(&mut self) -> Result<(), GlobError> {
        if !self.opts.nobracket && self.opts.strict_brackets {
            return Err(GlobError::MissingOpening {
                construct: '[',
                position: self.position(),
            });
        }
        self.push(Token::with_output(TokenKind::Text, "]", r"\]"));
        Ok(())
    }

    fn parse_close_bracket(&mut self) -> Result<(), GlobError> {
        self.decrement(Group::Bracket);

        let slash_class = self.chars.slash_class;
        let literal_brackets = self.opts.literal_brackets;
        let capture = self.capture;
        let prev = self.prev_mut();
        let content = prev.value.get(1..).unwrap_or_default().to_string();

        // A negated class never matches a path separator.
        if !prev.posix && content.starts_with('^') && !content.contains('/') {
            prev.value.push_str(slash_class);
        }
        prev.value.push(']');

        if literal_brackets == Some(false) || has_regex_chars(&content) {
            return Ok(());
        }

        let escaped = escape_regex(&prev.value);
        if literal_brackets == Some(true) {
            prev.output = Some(escaped);
        } else {
            prev.output = Some(format!("({capture}{escaped}|{})", prev.value));
        }
        Ok(())
    }

    fn parse_close_paren(&mut self) -> Result<(), GlobError> {
        if self.parens == 0 && self.opts.strict_brackets {
            return Err(GlobError::MissingOpening {
                construct: '(',
                position: self.position(),
            });
        }

        if self
            .extglobs
            .last()
            .is_some_and(|extglob| self.parens == extglob.paren_depth + 1)
        {
            if let Some(extglob) = self.extglobs.pop() {
                return self.extglob_close(extglob);
            }
        }

        let output = if self.parens > 0 { ")" } else { r"\)" };
        self.push(Token::with_output(TokenKind::Paren, ")", output));
        self.decrement(Group::Paren);
        Ok(())
    }

    fn parse_close_brace(&mut self) -> Result<(), GlobError> {
        if self.opts.nobrace || self.brace_groups.is_empty() {
            if !self.opts.nobrace && self.opts.strict_brackets {
                return Err(GlobError::MissingOpening {
                    construct: '{',
                    position: self.position(),
                });
            }
            self.push(Token::with_output(TokenKind::Text, "}", r"\}"));
            return Ok(());
        }
        let Some(brace) = self.brace_groups.pop() else {
            return Ok(());
        };

        let mut output = ")".to_string();
        if brace.dots {
            let endpoints: Vec<String> = self.tokens[brace.token_index.min(self.tokens.len())..]
                .iter()
                .skip(1)
                .filter(|t| !matches!(t.kind, TokenKind::Dots | TokenKind::Comma))
                .map(|t| t.value.clone())
                .collect();
            self.discard_groups_after(brace.token_index);
            self.tokens.truncate(brace.token_index);
            output = range::expand_range(&endpoints, self.opts);
            self.backtrack = true;
        } else if brace.commas.is_empty() {
            // Without alternatives the braces are literal characters.
            if let Some(open) = self.tokens.get_mut(brace.token_index) {
                open.output = Some(r"\{".to_string());
            }
            output = r"\}".to_string();
        }

        self.push(Token::with_output(TokenKind::BraceClose, "}", output));
        self.decrement(Group::Brace);
        Ok(())
    }

    /// Forgets every construct opened after the token at `index`, the tokens they refer to are
    /// about to be replaced.
    fn discard_groups_after(&mut self, index: usize) {
        let mut kept = Vec::with_capacity(self.stack.len());
        for open in std::mem::take(&mut self.stack) {
            if open.token_index > index {
                let counter = self.counter_mut(open.group);
                *counter = counter.saturating_sub(1);
            } else {
                kept.push(open);
            }
        }
        self.stack = kept;
        self.extglobs.retain(|extglob| extglob.token_index <= index);
        for extglob in &mut self.extglobs {
            extglob.pipes.retain(|&pipe| pipe < index);
        }
    }

    fn parse_slash(&mut self) {
        // A `./` at the start of the glob is dropped.
        if self.prev().kind == TokenKind::Dot && self.position() == self.start + 1 {
            self.start = self.cursor;
            self.tokens.pop();
            return;
        }
        self.push(Token::with_output(
            TokenKind::Slash,
            "/",
            self.chars.slash_literal,
        ));
    }

    fn parse_dot(&mut self) {
        if self.braces > 0 && self.prev().kind == TokenKind::Dot {
            let prev = self.prev_mut();
            prev.kind = TokenKind::Dots;
            prev.value.push('.');
            prev.output = Some(format!("{DOT_LITERAL}{DOT_LITERAL}"));
            if let Some(brace) = self.brace_groups.last_mut() {
                brace.dots = true;
            }
            return;
        }

        let kind = if self.braces + self.parens == 0
            && !matches!(self.prev().kind, TokenKind::Bos | TokenKind::Slash)
        {
            TokenKind::Text
        } else {
            TokenKind::Dot
        };
        self.push(Token::with_output(kind, ".", DOT_LITERAL));
    }

    fn parse_qmark(&mut self) {
        let is_group = self.prev().value == "(";
        if !is_group && !self.opts.noextglob && self.peek(1) == Some('(') && self.peek(2) != Some('?') {
            self.extglob_open(ExtglobKind::Qmark);
            return;
        }

        if self.prev().kind == TokenKind::Paren {
            let next = self.peek(1);
            let passes_through = if next == Some('<') {
                is_lookbehind_or_named_group(self.remaining())
            } else {
                !is_group || matches!(next, Some('!' | '=' | ':'))
            };
            let output = if passes_through { "?" } else { QMARK_LITERAL };
            self.push(Token::with_output(TokenKind::Text, "?", output));
            return;
        }

        let output = if !self.opts.dot && matches!(self.prev().kind, TokenKind::Slash | TokenKind::Bos) {
            self.chars.qmark_no_dot
        } else {
            self.chars.qmark
        };
        self.push(Token::with_output(TokenKind::Qmark, "?", output));
    }

    fn parse_bang(&mut self) {
        if !self.opts.noextglob
            && self.peek(1) == Some('(')
            && (self.peek(2) != Some('?') || !matches!(self.peek(3), Some('!' | '=' | '<' | ':')))
        {
            self.extglob_open(ExtglobKind::Negate);
            return;
        }

        if !self.opts.nonegate && self.position() == 0 {
            self.negate();
            return;
        }

        self.parse_text('!');
    }

    /// Consumes a run of leading `!`. An odd number negates the pattern.
    fn negate(&mut self) {
        let mut count = 1;
        while self.peek(1) == Some('!') && (self.peek(2) != Some('(') || self.peek(3) == Some('?')) {
            self.cursor += 1;
            count += 1;
        }
        self.start = self.cursor;
        if count % 2 == 1 {
            self.negated = true;
        }
    }

    fn parse_plus(&mut self) {
        if !self.opts.noextglob && self.peek(1) == Some('(') && self.peek(2) != Some('?') {
            self.extglob_open(ExtglobKind::Plus);
            return;
        }

        let prev = self.prev();
        let token = if prev.value == "(" || self.opts.regex == Some(false) {
            Token::with_output(TokenKind::Plus, "+", PLUS_LITERAL)
        } else if matches!(
            prev.kind,
            TokenKind::Bracket | TokenKind::Paren | TokenKind::BraceOpen | TokenKind::BraceClose
        ) || self.parens > 0
        {
            Token::new(TokenKind::Plus, "+")
        } else {
            Token::with_output(TokenKind::Plus, "+", PLUS_LITERAL)
        };
        self.push(token);
    }

    fn parse_at(&mut self) {
        if !self.opts.noextglob && self.peek(1) == Some('(') && self.peek(2) != Some('?') {
            self.extglob_open(ExtglobKind::At);
            return;
        }
        self.push(Token::new(TokenKind::Text, "@"));
    }

    fn parse_text(&mut self, c: char) {
        let mut value = c.to_string();
        let mut output = match c {
            '$' | '^' | '{' | '}' => format!("\\{c}"),
            _ => value.clone(),
        };

        let run: String = self
            .remaining()
            .iter()
            .take_while(|&&c| is_plain_text(c))
            .collect();
        self.cursor += run.chars().count();
        value.push_str(&run);
        output.push_str(&run);

        self.push(Token::with_output(TokenKind::Text, value, output));
    }

    fn parse_star(&mut self) {
        // Stars that follow a run of stars collapse into it.
        let star = self.star.clone();
        let prev = self.prev_mut();
        if prev.kind == TokenKind::Globstar || prev.star {
            prev.kind = TokenKind::Star;
            prev.star = true;
            prev.value.push('*');
            prev.output = Some(star);
            self.backtrack = true;
            self.globstar = true;
            return;
        }

        let rest = self.remaining();
        if !self.opts.noextglob && rest.first() == Some(&'(') && rest.get(1).is_some_and(|&c| c != '?') {
            self.extglob_open(ExtglobKind::Star);
            return;
        }

        if self.prev().kind == TokenKind::Star {
            self.parse_double_star();
            return;
        }

        let prev_kind = self.prev().kind;
        let mut token = Token::with_output(TokenKind::Star, "*", self.star.clone());

        if self.opts.bash {
            let nodot = if self.opts.dot { "" } else { self.chars.no_dot };
            let output = if matches!(prev_kind, TokenKind::Bos | TokenKind::Slash) {
                format!("{nodot}.*?")
            } else {
                ".*?".to_string()
            };
            token.output = Some(output);
            self.push(token);
            return;
        }

        if matches!(prev_kind, TokenKind::Bracket | TokenKind::Paren) && self.opts.regex == Some(true) {
            token.output = Some("*".to_string());
            self.push(token);
            return;
        }

        if self.position() == self.start || matches!(prev_kind, TokenKind::Slash | TokenKind::Dot) {
            let guard = if prev_kind == TokenKind::Dot {
                self.chars.no_dot_slash
            } else if self.opts.dot {
                self.chars.no_dots_slash
            } else {
                self.chars.no_dot
            };
            let needs_char = self.peek(1) != Some('*');
            let prev = self.prev_mut();
            prev.append_output(guard);
            if needs_char {
                prev.append_output(ONE_CHAR);
            }
        }

        self.push(token);
    }

    /// Handles the second star of a `**`.
    fn parse_double_star(&mut self) {
        if self.opts.noglobstar {
            return;
        }

        let prior = self.back(1).map(|t| t.kind).unwrap_or(TokenKind::Bos);
        let before = self.back(2).map(|t| t.kind);
        let is_start = matches!(prior, TokenKind::Slash | TokenKind::Bos);
        let after_star = matches!(before, Some(TokenKind::Star | TokenKind::Globstar));

        if self.opts.bash && (!is_start || self.peek(1).is_some_and(|c| c != '/')) {
            self.push(Token::with_output(TokenKind::Star, "*", ""));
            return;
        }

        let is_brace = self.braces > 0
            && matches!(
                prior,
                TokenKind::Comma | TokenKind::BraceOpen | TokenKind::BraceClose
            );
        let is_extglob = !self.extglobs.is_empty() && matches!(prior, TokenKind::Pipe | TokenKind::Paren);
        if !is_start && prior != TokenKind::Paren && !is_brace && !is_extglob {
            self.push(Token::with_output(TokenKind::Star, "*", ""));
            return;
        }

        // Consecutive `/**` segments are redundant.
        while self.remaining().starts_with(&['/', '*', '*']) {
            if self.input.get(self.cursor + 3).is_some_and(|&c| c != '/') {
                break;
            }
            self.cursor += 3;
        }

        let globstar = self.globstar_fragment();
        let slash = self.chars.slash_literal;
        let prepend = self.opts.prepend.clone().unwrap_or_default();
        self.globstar = true;

        if prior == TokenKind::Bos && self.eos() {
            self.bos.output = Some(prepend);
            self.set_globstar(globstar);
            return;
        }

        if prior == TokenKind::Slash && before != Some(TokenKind::Bos) && !after_star && self.eos() {
            self.open_prior_slash();
            let close = if self.opts.strict_slashes { ")" } else { "|$)" };
            self.set_globstar(format!("{globstar}{close}"));
            return;
        }

        if prior == TokenKind::Slash && before != Some(TokenKind::Bos) && self.peek(1) == Some('/') {
            let end = if self.peek(2).is_some() { "|$" } else { "" };
            self.open_prior_slash();
            self.set_globstar(format!("{globstar}{slash}|{slash}{end})"));
            self.cursor += 1;
            self.push(Token::with_output(TokenKind::Slash, "/", ""));
            return;
        }

        if prior == TokenKind::Bos && self.peek(1) == Some('/') {
            self.bos.output = Some(prepend);
            self.set_globstar(format!("(?:^|{slash}|{globstar}{slash})"));
            self.cursor += 1;
            self.push(Token::with_output(TokenKind::Slash, "/", ""));
            return;
        }

        self.set_globstar(globstar);
    }

    fn set_globstar(&mut self, output: String) {
        let prev = self.prev_mut();
        prev.kind = TokenKind::Globstar;
        prev.value.push('*');
        prev.output = Some(output);
    }

    /// Turns the separator before a trailing globstar into the start of an optional group.
    fn open_prior_slash(&mut self) {
        if let Some(prior) = self.back_mut(1) {
            prior.output = Some(format!("(?:{}", prior.emitted()));
        }
    }

    fn extglob_open(&mut self, kind: ExtglobKind) {
        let token_kind = match kind {
            ExtglobKind::Negate => TokenKind::NegateExtglob,
            ExtglobKind::Qmark => TokenKind::QmarkExtglob,
            ExtglobKind::Plus => TokenKind::PlusExtglob,
            ExtglobKind::Star => TokenKind::StarExtglob,
            ExtglobKind::At => TokenKind::At,
        };
        let paren_depth = self.parens;
        let after_bos = self.prev().kind == TokenKind::Bos;
        let marker = if self.output_is_empty() { ONE_CHAR } else { "" };

        let mut prefix = Token::with_output(token_kind, kind.prefix().to_string(), marker);
        if kind == ExtglobKind::At {
            prefix = prefix.extglob();
        }
        let token_index = self.tokens.len();
        self.increment(Group::Paren, token_index + 1);
        self.push(prefix);

        self.advance();
        let open = format!("{}{}", if self.opts.capture { "(" } else { "" }, kind.open());
        self.push(Token::with_output(TokenKind::Paren, "(", open).extglob());

        self.extglobs.push(ExtglobGroup {
            kind,
            inner: String::new(),
            paren_depth,
            after_bos,
            token_index,
            pipes: Vec::new(),
        });
    }

    fn extglob_close(&mut self, extglob: ExtglobGroup) -> Result<(), GlobError> {
        let capture_close = if self.opts.capture { ")" } else { "" };
        let mut output = extglob.kind.close(&self.star);

        if extglob.kind == ExtglobKind::Negate {
            // A group that spans separators must not match across them with a plain star.
            let extglob_star = if extglob.inner.len() > 1 && extglob.inner.contains('/') {
                self.globstar_fragment()
            } else {
                self.star.clone()
            };

            let rest: String = self.remaining().iter().collect();
            if extglob_star != self.star || self.eos() || rest.chars().all(|c| c == ')') {
                output = format!(")$)){extglob_star}");
            }

            if extglob.inner.contains('*') && is_extension(&rest) {
                let options = GlobOptions {
                    fastpaths: false,
                    prepend: None,
                    ..self.opts.clone()
                };
                let expression = parse(&rest, &options)?.output;
                output = format!("){expression}){extglob_star})");
            }

            if extglob.after_bos {
                self.negated_extglob = true;
            }
        }
        output.push_str(capture_close);

        self.push(Token::with_output(TokenKind::Paren, ")", output).extglob());
        self.decrement(Group::Paren);
        Ok(())
    }

    /// Turns every construct that is still open at the end of the pattern into literal text.
    fn close_unterminated(&mut self) -> Result<(), GlobError> {
        while let Some(open) = self.stack.pop() {
            if self.opts.strict_brackets {
                return Err(GlobError::MissingClosing {
                    construct: open.group.closing(),
                    position: open.position,
                });
            }

            tracing::debug!(
                construct = %open.group.opening(),
                position = open.position,
                "treating unterminated construct as a literal"
            );
            let counter = self.counter_mut(open.group);
            *counter = counter.saturating_sub(1);
            self.backtrack = true;

            let is_extglob = open.group == Group::Paren
                && self
                    .extglobs
                    .last()
                    .is_some_and(|extglob| extglob.token_index + 1 == open.token_index);
            if is_extglob {
                if let Some(extglob) = self.extglobs.pop() {
                    self.literalize_extglob(&extglob);
                }
                continue;
            }

            if open.group == Group::Brace {
                if let Some(brace) = self.brace_groups.pop() {
                    self.literalize_brace(&brace);
                }
                continue;
            }

            let Some(token) = self
                .tokens
                .get_mut(open.token_index)
                .filter(|t| t.kind == open.group.token_kind())
            else {
                continue;
            };
            let content = token.value.strip_prefix(open.group.opening()).unwrap_or("");
            token.output = Some(format!("\\{}{content}", open.group.opening()));
            token.kind = TokenKind::Text;
        }
        Ok(())
    }

    fn literalize_extglob(&mut self, extglob: &ExtglobGroup) {
        if let Some(prefix) = self.tokens.get_mut(extglob.token_index) {
            prefix.output = Some(escape_regex(&extglob.kind.prefix().to_string()));
        }
        if let Some(paren) = self.tokens.get_mut(extglob.token_index + 1) {
            paren.output = Some(r"\(".to_string());
        }
        for &idx in &extglob.pipes {
            if let Some(pipe) = self.tokens.get_mut(idx).filter(|t| t.kind == TokenKind::Pipe) {
                pipe.output = Some(r"\|".to_string());
            }
        }
    }

    fn literalize_brace(&mut self, brace: &BraceGroup) {
        if let Some(open) = self
            .tokens
            .get_mut(brace.token_index)
            .filter(|t| t.kind == TokenKind::BraceOpen)
        {
            open.output = Some(r"\{".to_string());
        }
        for &idx in &brace.commas {
            if let Some(comma) = self.tokens.get_mut(idx).filter(|t| t.kind == TokenKind::Comma) {
                comma.output = Some(",".to_string());
            }
        }
        let start = brace.token_index.min(self.tokens.len());
        for token in &mut self.tokens[start..] {
            if token.kind == TokenKind::Dots {
                token.output = Some(escape_regex(&token.value));
            }
        }
    }
}

/// Characters that can be part of a run of plain text.
fn is_plain_text(c: char) -> bool {
    !matches!(
        c,
        '@' | '!'
            | '['
            | ']'
            | '.'
            | ','
            | '$'
            | '*'
            | '+'
            | '?'
            | '^'
            | '{'
            | '}'
            | '('
            | ')'
            | '|'
            | '\\'
            | '/'
    )
}

/// The fragment for a character that was escaped with a backslash.
fn escape_literal(c: char) -> String {
    if c.is_ascii_punctuation() {
        format!("\\{c}")
    } else {
        c.to_string()
    }
}

/// Matches `<=`, `<!` and `<name>` at the start of `rest`.
fn is_lookbehind_or_named_group(rest: &[char]) -> bool {
    match rest {
        ['<', '=' | '!', ..] => true,
        ['<', tail @ ..] => {
            let name_len = tail
                .iter()
                .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                .count();
            name_len > 0 && tail.get(name_len) == Some(&'>')
        }
        _ => false,
    }
}

/// Matches a single file extension such as `.js`.
fn is_extension(rest: &str) -> bool {
    rest.strip_prefix('.')
        .is_some_and(|ext| !ext.is_empty() && !ext.contains(['\\', '/', '.']))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn output(pattern: &str) -> String {
        parse(pattern, &GlobOptions::default()).unwrap().output
    }

    fn kinds(pattern: &str) -> Vec<TokenKind> {
        parse(pattern, &GlobOptions::default())
            .unwrap()
            .tokens
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[rstest]
    #[case::star("*", r"(?!\.)(?=.)[^/]*?/?")]
    #[case::dot_star(".*", r"\.(?!\.{0,1}(?:/|$))(?=.)[^/]*?/?")]
    #[case::extension("*.js", r"(?!\.)(?=.)[^/]*?\.js")]
    #[case::segments("a/*/b", r"a/(?!\.)(?=.)[^/]*?/b")]
    #[case::qmark("a?", "a[^/]")]
    #[case::leading_qmark("?a", "[^./]a")]
    #[case::braces("a{b,c}d", "a(?:b|c)d")]
    #[case::literal_braces("a{b}", r"a\{b\}")]
    #[case::range("a{1..3}", "a[1-3]")]
    #[case::numeric_range("a{1..10..3}", "a(?:1|4|7|10)")]
    #[case::escaped_star(r"a\*", r"a\*")]
    #[case::escaped_letter(r"\a", "a")]
    #[case::dollar("a$b", r"a\$b")]
    #[case::quoted(r#""*.js""#, r"\*\.js")]
    #[case::globstar("**", r"(?:(?:(?!(?:^|/)\.).)*?)")]
    #[case::trailing_globstar("a/**", r"a(?:/(?!\.)(?:(?:(?!(?:^|/)\.).)*?)|$)")]
    #[case::inner_globstar("a/**/b", r"a(?:/(?!\.)(?:(?:(?!(?:^|/)\.).)*?)/|/|$)b")]
    #[case::leading_globstar("**/a", r"(?:^|/|(?:(?:(?!(?:^|/)\.).)*?)/)a")]
    #[case::stars_in_segment("a**", "a[^/]*?/?")]
    #[case::plus_extglob("+(a|b)", "(?=.)(?:a|b)+")]
    #[case::at_extglob("@(a|b)", "(?=.)(?:a|b)")]
    #[case::negate_extglob("!(a)", r"(?=.)(?:(?!(?:a)$))[^/]*?")]
    #[case::negate_extglob_in_segment("a/!(b)", r"a/(?:(?!(?:b)$))[^/]*?")]
    #[case::negate_extglob_across_slash("!(a/b)", r"(?=.)(?:(?!(?:a/b)$))(?:(?:(?!(?:^|/)\.).)*?)")]
    #[case::negate_extension("!(*.test).js", r"(?=.)(?:(?!(?:[^/]*?\.test)\.js)[^/]*?)\.js")]
    #[case::class("[a-z]", "[a-z]/?")]
    #[case::simple_class("[abc]", r"(?:\[abc\]|[abc])/?")]
    #[case::negated_class("[^a]", "[^a/]/?")]
    #[case::bang_class("[!a]", "[^a/]/?")]
    #[case::posix_class("[[:digit:]]", "(?=.)[0-9]/?")]
    fn test_parse_output(#[case] pattern: &str, #[case] expected: &str) {
        assert_eq!(output(pattern), expected);
    }

    #[test]
    fn test_bos_is_first_and_unique() {
        let kinds = kinds("a/**/b/*.{js,ts}");
        assert_eq!(kinds[0], TokenKind::Bos);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Bos).count(), 1);
    }

    #[test]
    fn test_tokens() {
        insta::assert_yaml_snapshot!(kinds("a/*.{js,ts}"), @r###"
        - bos
        - text
        - slash
        - star
        - text
        - brace_open
        - text
        - comma
        - text
        - brace_close
        "###);
    }

    #[test]
    fn test_negation() {
        let state = parse("!a/*", &GlobOptions::default()).unwrap();
        assert!(state.negated);
        assert_eq!(state.output, r"a/(?!\.)(?=.)[^/]*?/?");

        let state = parse("!!a", &GlobOptions::default()).unwrap();
        assert!(!state.negated);
        assert_eq!(state.output, "a");

        let options = GlobOptions {
            nonegate: true,
            ..GlobOptions::default()
        };
        let state = parse("!a", &options).unwrap();
        assert!(!state.negated);
        assert_eq!(state.output, "!a");
    }

    #[test]
    fn test_negated_extglob_flag() {
        assert!(parse("!(a)", &GlobOptions::default()).unwrap().negated_extglob);
        assert!(!parse("x!(a)", &GlobOptions::default()).unwrap().negated_extglob);
    }

    #[test]
    fn test_prefix_is_removed() {
        let state = parse("./a/*.js", &GlobOptions::default()).unwrap();
        assert_eq!(state.prefix, "./");
        assert_eq!(state.output, output("a/*.js"));
    }

    #[rstest]
    #[case::bracket("[abc", r"\[abc")]
    #[case::bracket_with_close(r"[a\]", r"\[a\]")]
    #[case::paren("(a", r"\(a")]
    #[case::brace("{a,b", r"\{a,b")]
    #[case::extglob("+(a|b", r"\+\(a\|b")]
    #[case::stray_close_paren("a)", r"a\)")]
    #[case::stray_close_bracket("a]", r"a\]")]
    #[case::stray_close_brace("a}", r"a\}")]
    fn test_unterminated_constructs_are_literal(#[case] pattern: &str, #[case] expected: &str) {
        assert_eq!(output(pattern), expected);
    }

    #[rstest]
    #[case::bracket("[abc", ']', 0)]
    #[case::bracket_with_close(r"a[b\]", ']', 1)]
    #[case::paren("a(b", ')', 1)]
    #[case::brace("a{b,c", '}', 1)]
    #[case::extglob("x+(a", ')', 1)]
    fn test_strict_missing_closing(#[case] pattern: &str, #[case] expected: char, #[case] at: usize) {
        let options = GlobOptions::default().with_strict_brackets(true);
        assert_matches!(
            parse(pattern, &options),
            Err(GlobError::MissingClosing { construct, position }) if construct == expected && position == at
        );
    }

    #[rstest]
    #[case::paren("a)", '(')]
    #[case::bracket("a]", '[')]
    #[case::brace("a}", '{')]
    fn test_strict_missing_opening(#[case] pattern: &str, #[case] expected: char) {
        let options = GlobOptions::default().with_strict_brackets(true);
        assert_matches!(
            parse(pattern, &options),
            Err(GlobError::MissingOpening { construct, position: 1 }) if construct == expected
        );
    }

    #[rstest]
    #[case::paren("{a..(b}")]
    #[case::extglob("{a..+(b}")]
    #[case::nested_in_extglob("@(x|{a..(b})")]
    fn test_range_consumes_open_groups(#[case] pattern: &str) {
        let options = GlobOptions::default().with_strict_brackets(true);
        let state = parse(pattern, &options).unwrap();
        assert!(fancy_regex::Regex::new(&format!("^(?:{})$", state.output)).is_ok());
        assert!(parse(pattern, &GlobOptions::default()).is_ok());
    }

    #[test]
    fn test_length_guard() {
        let options = GlobOptions::default().with_max_length(3);
        assert_matches!(
            parse("abcd", &options),
            Err(GlobError::InputTooLong { length: 4, max: 3 })
        );
        assert_matches!(parse("", &options), Err(GlobError::EmptyPattern));
    }

    #[test]
    fn test_replacements() {
        assert_eq!(output("***"), output("*"));
        assert_eq!(output("**/**"), output("**"));
    }

    #[test]
    fn test_options_change_emission() {
        let dot = GlobOptions::default().with_dot(true);
        assert_eq!(
            parse("*", &dot).unwrap().output,
            r"(?!\.{1,2}(?:/|$))(?=.)[^/]*?/?"
        );

        let strict = GlobOptions::default().with_strict_slashes(true);
        assert_eq!(parse("*", &strict).unwrap().output, r"(?!\.)(?=.)[^/]*?");

        let windows = GlobOptions::default().with_windows(true);
        assert_eq!(parse("a/b", &windows).unwrap().output, r"a[\\/]b");

        let nobrace = GlobOptions {
            nobrace: true,
            ..GlobOptions::default()
        };
        assert_eq!(parse("{a,b}", &nobrace).unwrap().output, r"\{a,b\}");

        let noext = GlobOptions {
            noextglob: true,
            ..GlobOptions::default()
        };
        assert_eq!(parse("+(a)", &noext).unwrap().output, r"\+(a)");

        let literal = GlobOptions {
            literal_brackets: Some(true),
            ..GlobOptions::default()
        };
        assert_eq!(parse("[abc]", &literal).unwrap().output, r"\[abc\]/?");

        let keep_quotes = GlobOptions {
            keep_quotes: true,
            ..GlobOptions::default()
        };
        assert_eq!(parse(r#""a""#, &keep_quotes).unwrap().output, r#""a""#);

        let prepend = GlobOptions {
            prepend: Some("x".to_string()),
            ..GlobOptions::default()
        };
        assert_eq!(parse("a", &prepend).unwrap().output, "xa");
    }

    #[test]
    fn test_regex_passthrough() {
        assert_eq!(output("(?:a|b)"), "(?:a|b)");
        assert_eq!(output("(?<=a)b"), "(?<=a)b");
        assert_eq!(output("(?a)"), r"(\?a)");
    }

    #[test]
    fn test_unescape_keeps_expression() {
        let options = GlobOptions {
            unescape: true,
            ..GlobOptions::default()
        };
        let state = parse(r"a\*", &options).unwrap();
        assert_eq!(state.output, r"a\*");
        assert_eq!(state.tokens[1].value, "a*");
    }

    #[test]
    fn test_backslash_runs_collapse() {
        assert_eq!(output(r"a\\\\\*"), r"a\*");
        assert_eq!(output(r"a\\\\b"), r"a\\b");
    }

    #[test]
    fn test_custom_range_expander() {
        let options = GlobOptions::default().with_expand_range(|args, _| format!("(?:{})", args.join("|")));
        assert_eq!(parse("{a..c}", &options).unwrap().output, "(?:a|c)");
    }
}
