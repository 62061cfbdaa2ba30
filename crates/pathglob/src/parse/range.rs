//! Expansion of brace ranges such as `{a..e}` and `{01..10..2}`.

use itertools::Itertools;

use crate::options::GlobOptions;
use crate::utils::escape_regex;

/// Ranges that would expand to more values than this are matched by their endpoints only.
const MAX_RANGE_VALUES: usize = 1024;

/// Expands the endpoints of a brace range, using the custom expander from the options when one
/// is configured.
pub(crate) fn expand_range(endpoints: &[String], options: &GlobOptions) -> String {
    match &options.expand_range {
        Some(expand) => expand(endpoints, options),
        None => default_expand_range(endpoints),
    }
}

/// The built-in brace range expansion.
///
/// * two single characters expand to a character class (`{e..a}` gives `[a-e]`),
/// * two integers with an optional step expand to an alternation of every value, keeping the
///   zero padding of the endpoints,
/// * anything else matches one of the endpoints literally.
pub fn default_expand_range(endpoints: &[String]) -> String {
    if let [start, end] = endpoints {
        if let Some(class) = character_class(start, end) {
            return class;
        }
    }

    if let Some(values) = numeric_range(endpoints) {
        return alternation(values.iter().map(String::as_str));
    }

    alternation(endpoints.iter().map(String::as_str))
}

fn alternation<'a>(values: impl Iterator<Item = &'a str>) -> String {
    format!("(?:{})", values.map(escape_regex).join("|"))
}

fn character_class(start: &str, end: &str) -> Option<String> {
    let (Some(a), Some(b)) = (single_char(start), single_char(end)) else {
        return None;
    };
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let class = format!("[{}-{}]", class_char(lo), class_char(hi));
    fancy_regex::Regex::new(&class).is_ok().then_some(class)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn class_char(c: char) -> String {
    if c.is_ascii_punctuation() {
        format!("\\{c}")
    } else {
        c.to_string()
    }
}

fn is_padded(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    digits.len() > 1 && digits.starts_with('0')
}

fn numeric_range(endpoints: &[String]) -> Option<Vec<String>> {
    let (start, end, step) = match endpoints {
        [start, end] => (start, end, None),
        [start, end, step] => (start, end, Some(step)),
        _ => return None,
    };

    let a: i64 = start.parse().ok()?;
    let b: i64 = end.parse().ok()?;
    let step = match step {
        Some(step) => step.parse::<i64>().ok()?.unsigned_abs().max(1),
        None => 1,
    };

    let count = a.abs_diff(b) / step + 1;
    if count > MAX_RANGE_VALUES as u64 {
        return None;
    }

    let width = if is_padded(start) || is_padded(end) {
        start.len().max(end.len())
    } else {
        0
    };

    let values = (0..count)
        .map(|i| {
            let offset = (i * step) as i64;
            let value = if a <= b { a + offset } else { a - offset };
            pad(value, width)
        })
        .collect();
    Some(values)
}

fn pad(value: i64, width: usize) -> String {
    if value < 0 {
        format!("-{:0>w$}", value.unsigned_abs(), w = width.saturating_sub(1))
    } else {
        format!("{value:0>width$}")
    }
}
