use crate::lexer;

/// Token that, as the last word of a line, requests background execution.
pub const BACKGROUND_MARKER: &str = "&";

/// A parsed, expanded command line ready for dispatch.
///
/// `argv[0]` is the command name. Redirection tokens are still present; they
/// are only interpreted for external commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub argv: Vec<String>,
    pub background: bool,
}

impl CommandLine {
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// Parse one raw line.
///
/// Returns `None` for blank lines and comments. A trailing `&` is always
/// removed; the line is flagged background only when `foreground_only` is
/// off, otherwise the request is silently downgraded.
pub fn parse_line(line: &str, pid: u32, foreground_only: bool) -> Option<CommandLine> {
    let mut argv = lexer::split_into_tokens(line);
    if argv.is_empty() || lexer::is_comment(&argv) {
        return None;
    }
    lexer::expand_all(&mut argv, pid);

    let mut background = false;
    if argv.len() > 1 && argv.last().is_some_and(|t| t == BACKGROUND_MARKER) {
        argv.pop();
        background = !foreground_only;
    }

    Some(CommandLine { argv, background })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_line("", 1, false), None);
        assert_eq!(parse_line("   \n", 1, false), None);
        assert_eq!(parse_line("# sleep 5 &", 1, false), None);
    }

    #[test]
    fn test_foreground_command() {
        let line = parse_line("ls -la\n", 1, false).unwrap();
        assert_eq!(line.argv, argv(&["ls", "-la"]));
        assert!(!line.background);
        assert_eq!(line.name(), "ls");
        assert_eq!(line.args(), &argv(&["-la"])[..]);
    }

    #[test]
    fn test_trailing_marker_requests_background() {
        let line = parse_line("sleep 5 &", 1, false).unwrap();
        assert_eq!(line.argv, argv(&["sleep", "5"]));
        assert!(line.background);
    }

    #[test]
    fn test_foreground_only_downgrades_silently() {
        let line = parse_line("sleep 5 &", 1, true).unwrap();
        assert_eq!(line.argv, argv(&["sleep", "5"]));
        assert!(!line.background);
    }

    #[test]
    fn test_marker_elsewhere_is_an_argument() {
        let line = parse_line("echo & done", 1, false).unwrap();
        assert_eq!(line.argv, argv(&["echo", "&", "done"]));
        assert!(!line.background);

        let line = parse_line("echo a&", 1, false).unwrap();
        assert_eq!(line.argv, argv(&["echo", "a&"]));
        assert!(!line.background);
    }

    #[test]
    fn test_lone_marker_is_the_command() {
        let line = parse_line("&", 1, false).unwrap();
        assert_eq!(line.argv, argv(&["&"]));
        assert!(!line.background);
    }

    #[test]
    fn test_pid_is_expanded_before_dispatch() {
        let line = parse_line("echo out$$.txt $$ &", 77, false).unwrap();
        assert_eq!(line.argv, argv(&["echo", "out77.txt", "77"]));
        assert!(line.background);
    }
}
