//! Separator-level shell command lexing.
//!
//! `split_commands` is the foundation of the shell allowlist: a chained
//! command is only ever auto-approved when every sub-command it splits into
//! is individually allowed. The lexer recognizes quoting and escaping but
//! deliberately does not interpret redirections or expansions.

/// Split a command string into its top-level sub-commands.
///
/// Splits on `&&`, `||`, `|`, and `;` outside single quotes, double quotes,
/// and backtick quotes; a backslash escapes the following character. Empty
/// fragments are discarded and the rest are whitespace-trimmed.
pub fn split_commands(command: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    let chars: Vec<char> = command.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if escaped {
            current.push(c);
            escaped = false;
            i += 1;
            continue;
        }

        if c == '\\' {
            current.push(c);
            escaped = true;
            i += 1;
            continue;
        }

        match quote {
            Some(open) => {
                if c == open {
                    quote = None;
                }
                current.push(c);
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    current.push(c);
                }
                '&' if chars.get(i + 1) == Some(&'&') => {
                    flush(&mut commands, &mut current);
                    i += 2;
                    continue;
                }
                '|' if chars.get(i + 1) == Some(&'|') => {
                    flush(&mut commands, &mut current);
                    i += 2;
                    continue;
                }
                '|' | ';' => {
                    flush(&mut commands, &mut current);
                }
                _ => current.push(c),
            },
        }

        i += 1;
    }

    flush(&mut commands, &mut current);
    commands
}

fn flush(commands: &mut Vec<String>, current: &mut String) {
    let fragment = current.trim();
    if !fragment.is_empty() {
        commands.push(fragment.to_string());
    }
    current.clear();
}

/// The root program of a command: the first whitespace token with any path
/// prefix and surrounding quotes stripped, so `/usr/bin/git status` and
/// `"git" status` both root to `git`.
pub fn command_root(command: &str) -> Option<String> {
    let first = command.trim().split_whitespace().next()?;
    let unquoted = first
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();
    let root = unquoted
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(unquoted);
    if root.is_empty() {
        None
    } else {
        Some(root.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_on_each_separator() {
        assert_eq!(
            split_commands("a && b || c | d ; e"),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn single_command_passes_through() {
        assert_eq!(split_commands("echo hello world"), vec!["echo hello world"]);
    }

    #[test]
    fn separators_inside_quotes_do_not_split() {
        assert_eq!(
            split_commands(r#"echo "a && b" && echo 'c | d'"#),
            vec![r#"echo "a && b""#, "echo 'c | d'"]
        );
        assert_eq!(
            split_commands("echo `date; whoami`"),
            vec!["echo `date; whoami`"]
        );
    }

    #[test]
    fn escaped_separator_does_not_split() {
        assert_eq!(split_commands(r"echo a\;b"), vec![r"echo a\;b"]);
        assert_eq!(split_commands(r"echo a\|b"), vec![r"echo a\|b"]);
    }

    #[test]
    fn escaped_quote_does_not_open_a_string() {
        assert_eq!(split_commands(r#"echo \" ; ls"#), vec![r#"echo \""#, "ls"]);
    }

    #[test]
    fn empty_fragments_are_dropped() {
        assert_eq!(split_commands("a ;; b"), vec!["a", "b"]);
        assert_eq!(split_commands(" ; "), Vec::<String>::new());
        assert_eq!(split_commands(""), Vec::<String>::new());
    }

    #[test]
    fn unterminated_quote_swallows_the_rest() {
        assert_eq!(split_commands("echo 'a && b"), vec!["echo 'a && b"]);
    }

    #[test]
    fn pipe_inside_double_quotes() {
        assert_eq!(
            split_commands(r#"echo foo | echo "evil""#),
            vec!["echo foo", r#"echo "evil""#]
        );
    }

    #[test]
    fn command_root_strips_paths_and_quotes() {
        assert_eq!(command_root("git status"), Some("git".to_string()));
        assert_eq!(command_root("/usr/bin/git status"), Some("git".to_string()));
        assert_eq!(command_root(r#""npm" install"#), Some("npm".to_string()));
        assert_eq!(command_root("  "), None);
        assert_eq!(command_root(""), None);
    }

    // Fragments free of separators, quotes, and escapes: joining with any
    // separator and splitting again must return exactly the fragments.
    proptest! {
        #[test]
        fn split_inverts_join(
            fragments in proptest::collection::vec("[a-z0-9 _./-]{1,12}", 1..6),
            separators in proptest::collection::vec(
                prop_oneof![Just(" && "), Just(" || "), Just(" | "), Just(" ; ")],
                5,
            ),
        ) {
            let trimmed: Vec<String> = fragments
                .iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
            prop_assume!(!trimmed.is_empty());

            let mut joined = String::new();
            for (i, fragment) in trimmed.iter().enumerate() {
                if i > 0 {
                    joined.push_str(separators[(i - 1) % separators.len()]);
                }
                joined.push_str(fragment);
            }

            prop_assert_eq!(split_commands(&joined), trimmed);
        }

        #[test]
        fn quoted_fragment_never_splits(inner in "[a-z0-9 &|;]{0,20}") {
            let command = format!("echo \"{inner}\"");
            prop_assert_eq!(split_commands(&command), vec![command.clone()]);
        }
    }
}
