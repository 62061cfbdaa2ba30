//! Small string helpers shared by the parser, the scanner and the matcher.

/// Characters that have a meaning in an expression and must be escaped to be matched literally.
const REGEX_SPECIAL_CHARS: &[char] = &[
    '-', '*', '+', '?', '.', '^', '$', '{', '}', '(', '|', ')', '[', ']',
];

/// Returns true if `c` must be escaped to be matched literally.
pub fn is_regex_special(c: char) -> bool {
    REGEX_SPECIAL_CHARS.contains(&c)
}

/// Returns true if the string contains any character with a meaning in an expression.
pub fn has_regex_chars(s: &str) -> bool {
    s.chars().any(is_regex_special)
}

/// Escapes every expression meta character in `s`.
pub fn escape_regex(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if is_regex_special(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Strips a leading `./` from the pattern. Returns the remainder and the stripped prefix.
pub fn remove_prefix(input: &str) -> (&str, &'static str) {
    match input.strip_prefix("./") {
        Some(rest) => (rest, "./"),
        None => (input, ""),
    }
}

/// Converts windows separators to forward slashes.
pub fn to_posix_slashes(input: &str) -> String {
    input.replace('\\', "/")
}

/// Returns the final path segment of `input`, ignoring trailing separators.
pub fn basename(input: &str, windows: bool) -> &str {
    let is_sep = |c: char| c == '/' || (windows && c == '\\');
    let trimmed = input.trim_end_matches(is_sep);
    if trimmed.is_empty() {
        return trimmed;
    }
    match trimmed.rfind(is_sep) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Removes escaping backslashes, leaving the content of bracket expressions untouched.
pub fn remove_backslashes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < chars.len() {
        match chars[idx] {
            '[' => {
                // A bracket expression runs to the first unescaped `]` that is not its first
                // character.
                let close = (idx + 2..chars.len()).find(|&i| chars[i] == ']' && chars[i - 1] != '\\');
                match close {
                    Some(end) => {
                        result.extend(&chars[idx..=end]);
                        idx = end + 1;
                    }
                    None => {
                        result.push('[');
                        idx += 1;
                    }
                }
            }
            '\\' if idx + 1 < chars.len() => idx += 1,
            c => {
                result.push(c);
                idx += 1;
            }
        }
    }
    result
}
