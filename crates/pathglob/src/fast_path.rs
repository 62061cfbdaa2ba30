//! Direct translation of a handful of very common pattern shapes.
//!
//! The fragments produced here are exactly the fragments the scanner produces for the same
//! shapes; the table only avoids running the scanner.

use crate::constants::{platform_chars, replacement, PlatformChars, DOT_LITERAL, ONE_CHAR};
use crate::error::GlobError;
use crate::options::GlobOptions;
use crate::parse::ParseState;
use crate::utils::remove_prefix;

/// Returns true if the options leave star and globstar emission untouched, which is what the
/// shape table assumes.
fn applies(pattern: &str, options: &GlobOptions) -> bool {
    options.fastpaths
        && !options.bash
        && !options.capture
        && !options.noglobstar
        && options.regex.is_none()
        && (pattern.starts_with('.') || pattern.starts_with('*'))
}

/// Translates `pattern` through the shape table. Returns `Ok(None)` if the pattern is not one
/// of the known shapes.
pub fn fast_path(pattern: &str, options: &GlobOptions) -> Result<Option<ParseState>, GlobError> {
    if pattern.is_empty() {
        return Err(GlobError::EmptyPattern);
    }
    if !applies(pattern, options) {
        return Ok(None);
    }

    let input = replacement(pattern).unwrap_or(pattern);
    let length = input.chars().count();
    let max = options.max_length();
    if length > max {
        return Err(GlobError::InputTooLong { length, max });
    }

    let (shape, prefix) = remove_prefix(input);
    let table = ShapeTable::new(options);
    let Some((fragment, trailing_star)) = table.translate(shape) else {
        return Ok(None);
    };

    let mut output = options.prepend.clone().unwrap_or_default();
    output.push_str(&fragment);
    if trailing_star && !options.strict_slashes {
        output.push_str(table.chars.slash_literal);
        output.push('?');
    }

    tracing::trace!(pattern, fragment = %output, "translated pattern through the fast path");

    Ok(Some(ParseState {
        input: input.to_string(),
        output,
        prefix: prefix.to_string(),
        negated: false,
        negated_extglob: false,
        backtrack: false,
        globstar: shape.contains("**"),
        fast_path: true,
        tokens: Vec::new(),
    }))
}

struct ShapeTable {
    chars: &'static PlatformChars,
    /// Guard for a wildcard at the start of a segment.
    no_dot: &'static str,
    star: &'static str,
    globstar: String,
}

impl ShapeTable {
    fn new(options: &GlobOptions) -> Self {
        let chars = platform_chars(options.windows);
        let (no_dot, globstar_guard) = if options.dot {
            (chars.no_dots_slash, chars.dots_slash)
        } else {
            (chars.no_dot, DOT_LITERAL)
        };
        Self {
            chars,
            no_dot,
            star: chars.star,
            globstar: format!(
                "(?:(?:(?!{}{globstar_guard}).)*?)",
                chars.start_anchor
            ),
        }
    }

    /// Returns the fragment for `shape` and whether it ends in a wildcard.
    fn translate(&self, shape: &str) -> Option<(String, bool)> {
        if let Some(fragment) = self.create(shape) {
            return Some((fragment, shape != "**"));
        }

        // Peel a trailing extension off and translate the rest.
        let (core, ext) = shape.rsplit_once('.')?;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        let core = if core == "**" {
            format!("{}{}", self.no_dot, self.star)
        } else {
            self.translate(core)?.0
        };
        Some((format!("{core}{DOT_LITERAL}{ext}"), false))
    }

    fn create(&self, shape: &str) -> Option<String> {
        let Self {
            chars,
            no_dot,
            star,
            globstar,
        } = self;
        let slash = chars.slash_literal;
        let no_dot_slash = chars.no_dot_slash;
        let any_depth = format!("(?:^|{slash}|{globstar}{slash})");

        let fragment = match shape {
            "*" => format!("{no_dot}{ONE_CHAR}{star}"),
            ".*" => format!("{DOT_LITERAL}{no_dot_slash}{ONE_CHAR}{star}"),
            "*.*" => format!("{no_dot}{ONE_CHAR}{star}{DOT_LITERAL}{star}"),
            "*/*" => format!("{no_dot}{ONE_CHAR}{star}{slash}{no_dot}{ONE_CHAR}{star}"),
            "**" => globstar.clone(),
            "**/*" => format!("{any_depth}{no_dot}{ONE_CHAR}{star}"),
            "**/*.*" => format!("{any_depth}{no_dot}{ONE_CHAR}{star}{DOT_LITERAL}{star}"),
            "**/.*" => format!("{any_depth}{DOT_LITERAL}{no_dot_slash}{ONE_CHAR}{star}"),
            _ => return None,
        };
        Some(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use rstest::rstest;

    #[rstest]
    #[case("*")]
    #[case(".*")]
    #[case("*.*")]
    #[case("*/*")]
    #[case("**")]
    #[case("**/*")]
    #[case("**/*.*")]
    #[case("**/.*")]
    #[case("*.js")]
    #[case("*.tar.gz")]
    #[case("**.js")]
    #[case("**/*.rs")]
    #[case(".*.swp")]
    #[case("./**/*.md")]
    #[case("***")]
    fn test_same_fragment_as_scanner(
        #[case] pattern: &str,
        #[values(false, true)] dot: bool,
        #[values(false, true)] windows: bool,
        #[values(false, true)] strict_slashes: bool,
    ) {
        let options = GlobOptions::default()
            .with_dot(dot)
            .with_windows(windows)
            .with_strict_slashes(strict_slashes);
        let fast = fast_path(pattern, &options).unwrap().expect("shape should be recognized");
        let scanned = parse(pattern, &options).unwrap();
        assert_eq!(fast.output, scanned.output);
        assert_eq!(fast.prefix, scanned.prefix);
    }

    #[rstest]
    #[case::literal("foo")]
    #[case::braces("*.{js,ts}")]
    #[case::segment("*/a")]
    #[case::extension_with_symbol("*.j-s")]
    #[case::bare_extension(".js")]
    fn test_unknown_shapes(#[case] pattern: &str) {
        assert_eq!(fast_path(pattern, &GlobOptions::default()).unwrap(), None);
    }

    #[test]
    fn test_disabled_by_options() {
        let options = GlobOptions::default().with_fastpaths(false);
        assert_eq!(fast_path("*", &options).unwrap(), None);

        let options = GlobOptions {
            bash: true,
            ..GlobOptions::default()
        };
        assert_eq!(fast_path("*", &options).unwrap(), None);
    }

    #[test]
    fn test_prepend() {
        let options = GlobOptions {
            prepend: Some("x".to_string()),
            ..GlobOptions::default()
        };
        let fast = fast_path("**/*", &options).unwrap().unwrap();
        assert!(fast.output.starts_with("x(?:^|"));
        assert_eq!(fast.output, parse("**/*", &options).unwrap().output);
    }
}
