//! The option set accepted by the compiler and the matcher factory.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::constants::MAX_LENGTH;
use crate::matcher::MatchResult;

/// A callback that observes match results. Hooks never influence the outcome of a match.
pub type MatchHook = Arc<dyn Fn(&MatchResult) + Send + Sync>;

/// Expands the endpoints of a brace range such as `{a..e}` into an expression fragment.
pub type RangeExpander = Arc<dyn Fn(&[String], &GlobOptions) -> String + Send + Sync>;

/// Normalizes a match input before it is tested.
pub type InputFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// An option value that is either fixed or computed from the input being matched.
#[derive(Clone)]
pub enum Resolvable<T> {
    /// A fixed value.
    Literal(T),
    /// A function that computes the value for a given input.
    Provider(Arc<dyn Fn(&str) -> T + Send + Sync>),
}

impl<T: Clone> Resolvable<T> {
    /// Returns the value for the given input.
    pub fn resolve(&self, input: &str) -> T {
        match self {
            Resolvable::Literal(value) => value.clone(),
            Resolvable::Provider(provider) => provider(input),
        }
    }
}

impl<T: Default> Default for Resolvable<T> {
    fn default() -> Self {
        Resolvable::Literal(T::default())
    }
}

impl<T> From<T> for Resolvable<T> {
    fn from(value: T) -> Self {
        Resolvable::Literal(value)
    }
}

impl<T: Debug> Debug for Resolvable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolvable::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Resolvable::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Resolvable<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Resolvable::Literal)
    }
}

/// Options that control how a glob pattern is compiled and matched.
///
/// The options can be loaded from a configuration document:
///
/// ```
/// # use pathglob::GlobOptions;
/// let options: GlobOptions = toml::from_str(r#"
/// dot = true
/// strict-brackets = true
/// ignore = ["**/node_modules/**"]
/// "#).unwrap();
/// assert!(options.dot);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobOptions {
    /// Allow wildcards to match path segments that start with a dot.
    pub dot: bool,
    /// Match case-insensitively.
    pub nocase: bool,
    /// Treat both `\` and `/` as path separators.
    pub windows: bool,
    /// Treat `**` like `*`.
    pub noglobstar: bool,
    /// Disable extended glob groups such as `+(a|b)`.
    #[serde(alias = "noext")]
    pub noextglob: bool,
    /// Treat braces as literal characters.
    pub nobrace: bool,
    /// Treat square brackets as literal characters.
    pub nobracket: bool,
    /// Do not treat a leading `!` as a negation of the whole pattern.
    pub nonegate: bool,
    /// Raise an error for unbalanced brackets, braces and parentheses.
    pub strict_brackets: bool,
    /// Do not allow a trailing separator after a pattern that ends in a wildcard.
    pub strict_slashes: bool,
    /// Follow bash semantics: a single `*` also matches across separators.
    pub bash: bool,
    /// Match anywhere in the input instead of the whole input.
    pub contains: bool,
    /// Wrap wildcards and groups in capturing groups.
    pub capture: bool,
    /// Only match against the final path segment of the input.
    #[serde(alias = "basename")]
    pub match_base: Resolvable<bool>,
    /// Patterns that veto an otherwise successful match.
    pub ignore: Vec<String>,
    /// Maximum length of a pattern, clamped to [`MAX_LENGTH`].
    pub max_length: Option<usize>,
    /// Report expression compilation failures instead of degrading to a matcher that never
    /// matches.
    pub debug: bool,
    /// Try the table of common pattern shapes before running the full scanner.
    pub fastpaths: bool,
    /// Enables POSIX bracket classes and `[!...]` negation unless set to `false`.
    pub posix: Option<bool>,
    /// `Some(true)` matches simple bracket expressions literally, `Some(false)` only as a class,
    /// `None` accepts either.
    pub literal_brackets: Option<bool>,
    /// Keep double quotes in the pattern instead of dropping them.
    pub keep_quotes: bool,
    /// Remove escaping backslashes instead of emitting escaped characters.
    pub unescape: bool,
    /// `Some(true)` allows `*` after a bracket or paren to act as a quantifier, `Some(false)`
    /// always treats `+` literally.
    pub regex: Option<bool>,
    /// Fragment emitted before the first token of the pattern.
    pub prepend: Option<String>,
    /// Custom expansion of brace ranges.
    #[serde(skip)]
    pub expand_range: Option<RangeExpander>,
    /// Custom normalization of match inputs.
    #[serde(skip)]
    pub format: Option<InputFormatter>,
    /// Called for every input that matches.
    #[serde(skip)]
    pub on_match: Option<MatchHook>,
    /// Called for every input that matched but was vetoed by an ignore pattern.
    #[serde(skip)]
    pub on_ignore: Option<MatchHook>,
    /// Called for every tested input.
    #[serde(skip)]
    pub on_result: Option<MatchHook>,
}

impl Default for GlobOptions {
    fn default() -> Self {
        Self {
            dot: false,
            nocase: false,
            windows: false,
            noglobstar: false,
            noextglob: false,
            nobrace: false,
            nobracket: false,
            nonegate: false,
            strict_brackets: false,
            strict_slashes: false,
            bash: false,
            contains: false,
            capture: false,
            match_base: Resolvable::default(),
            ignore: Vec::new(),
            max_length: None,
            debug: false,
            fastpaths: true,
            posix: None,
            literal_brackets: None,
            keep_quotes: false,
            unescape: false,
            regex: None,
            prepend: None,
            expand_range: None,
            format: None,
            on_match: None,
            on_ignore: None,
            on_result: None,
        }
    }
}

impl Debug for GlobOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobOptions")
            .field("dot", &self.dot)
            .field("nocase", &self.nocase)
            .field("windows", &self.windows)
            .field("noglobstar", &self.noglobstar)
            .field("noextglob", &self.noextglob)
            .field("nobrace", &self.nobrace)
            .field("nobracket", &self.nobracket)
            .field("nonegate", &self.nonegate)
            .field("strict_brackets", &self.strict_brackets)
            .field("strict_slashes", &self.strict_slashes)
            .field("bash", &self.bash)
            .field("contains", &self.contains)
            .field("capture", &self.capture)
            .field("match_base", &self.match_base)
            .field("ignore", &self.ignore)
            .field("max_length", &self.max_length)
            .field("debug", &self.debug)
            .field("fastpaths", &self.fastpaths)
            .field("posix", &self.posix)
            .field("literal_brackets", &self.literal_brackets)
            .field("keep_quotes", &self.keep_quotes)
            .field("unescape", &self.unescape)
            .field("regex", &self.regex)
            .field("prepend", &self.prepend)
            .field("expand_range", &self.expand_range.is_some())
            .field("format", &self.format.is_some())
            .field("on_match", &self.on_match.is_some())
            .field("on_ignore", &self.on_ignore.is_some())
            .field("on_result", &self.on_result.is_some())
            .finish()
    }
}

impl GlobOptions {
    /// The effective maximum pattern length.
    pub fn max_length(&self) -> usize {
        self.max_length.map_or(MAX_LENGTH, |max| max.min(MAX_LENGTH))
    }

    /// Allow wildcards to match dot-files.
    #[must_use]
    pub fn with_dot(mut self, dot: bool) -> Self {
        self.dot = dot;
        self
    }

    /// Match case-insensitively.
    #[must_use]
    pub fn with_nocase(mut self, nocase: bool) -> Self {
        self.nocase = nocase;
        self
    }

    /// Use windows separator semantics.
    #[must_use]
    pub fn with_windows(mut self, windows: bool) -> Self {
        self.windows = windows;
        self
    }

    /// Raise errors for unbalanced constructs.
    #[must_use]
    pub fn with_strict_brackets(mut self, strict: bool) -> Self {
        self.strict_brackets = strict;
        self
    }

    /// Disallow trailing separators after wildcards.
    #[must_use]
    pub fn with_strict_slashes(mut self, strict: bool) -> Self {
        self.strict_slashes = strict;
        self
    }

    /// Match only against the final path segment, either always or per input.
    #[must_use]
    pub fn with_match_base(mut self, match_base: impl Into<Resolvable<bool>>) -> Self {
        self.match_base = match_base.into();
        self
    }

    /// Set the patterns that veto a successful match.
    #[must_use]
    pub fn with_ignore<S: Into<String>>(mut self, ignore: impl IntoIterator<Item = S>) -> Self {
        self.ignore = ignore.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum pattern length.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Report expression compilation failures as errors.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enable or disable the fast path.
    #[must_use]
    pub fn with_fastpaths(mut self, fastpaths: bool) -> Self {
        self.fastpaths = fastpaths;
        self
    }

    /// Use a custom brace range expansion.
    #[must_use]
    pub fn with_expand_range(
        mut self,
        expand: impl Fn(&[String], &GlobOptions) -> String + Send + Sync + 'static,
    ) -> Self {
        self.expand_range = Some(Arc::new(expand));
        self
    }

    /// Use a custom input normalization.
    #[must_use]
    pub fn with_format(mut self, format: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.format = Some(Arc::new(format));
        self
    }

    /// Observe inputs that match.
    #[must_use]
    pub fn with_on_match(mut self, hook: impl Fn(&MatchResult) + Send + Sync + 'static) -> Self {
        self.on_match = Some(Arc::new(hook));
        self
    }

    /// Observe inputs that are vetoed by an ignore pattern.
    #[must_use]
    pub fn with_on_ignore(mut self, hook: impl Fn(&MatchResult) + Send + Sync + 'static) -> Self {
        self.on_ignore = Some(Arc::new(hook));
        self
    }

    /// Observe every tested input.
    #[must_use]
    pub fn with_on_result(mut self, hook: impl Fn(&MatchResult) + Send + Sync + 'static) -> Self {
        self.on_result = Some(Arc::new(hook));
        self
    }
}
