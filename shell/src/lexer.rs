//! Tokenizing and expansion of a raw input line.
//!
//! The grammar is flat: tokens are separated by whitespace and
//! carry no quoting. The only rewriting performed here is the `$$`
//! placeholder, which expands to the interpreter's own process id.

/// Placeholder replaced by the interpreter pid wherever it appears.
pub const PID_PLACEHOLDER: &str = "$$";

/// Prefix that turns a whole line into a comment when found at the start of
/// the first token.
pub const COMMENT_PREFIX: char = '#';

/// Split a line into whitespace-separated tokens.
///
/// Leading, trailing and repeated whitespace (including the newline left by
/// the reader) never produce empty tokens, so a blank line yields an empty
/// vector.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}

/// Returns true when the token sequence is a comment line.
pub fn is_comment(tokens: &[String]) -> bool {
    tokens
        .first()
        .is_some_and(|first| first.starts_with(COMMENT_PREFIX))
}

/// Replace every `$$` inside `token` with `pid`.
///
/// Occurrences are matched left to right without overlap, so `$$$` becomes
/// the pid followed by a single `$`.
pub fn expand_pid(token: &str, pid: &str) -> String {
    token.replace(PID_PLACEHOLDER, pid)
}

/// Expand the placeholder in every token in place.
pub fn expand_all(tokens: &mut [String], pid: u32) {
    let pid = pid.to_string();
    for token in tokens.iter_mut().filter(|t| t.contains(PID_PLACEHOLDER)) {
        *token = expand_pid(token, &pid);
    }
}
