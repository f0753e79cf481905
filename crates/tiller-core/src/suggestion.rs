//! Nearest-name suggestions for unknown tool references.

const MAX_SUGGESTIONS: usize = 3;

/// Build a `" Did you mean ..."` phrase for an unknown tool reference, or
/// `None` when the registry is empty.
///
/// Candidates are ranked by ascending edit distance, ties broken
/// lexicographically. A dotted reference like `github.list_files` is also
/// matched by its suffix after the last dot, taking the better distance.
pub fn unknown_tool_suggestion(unknown: &str, known_names: &[String]) -> Option<String> {
    if known_names.is_empty() {
        return None;
    }

    let suffix = unknown.rsplit_once('.').map(|(_, suffix)| suffix);

    let mut ranked: Vec<(usize, &str)> = known_names
        .iter()
        .map(|name| {
            let mut distance = strsim::levenshtein(unknown, name);
            if let Some(suffix) = suffix {
                distance = distance.min(strsim::levenshtein(suffix, name));
            }
            (distance, name.as_str())
        })
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    ranked.truncate(MAX_SUGGESTIONS);

    let phrase = if ranked.len() == 1 {
        format!(" Did you mean \"{}\"?", ranked[0].1)
    } else {
        let quoted: Vec<String> = ranked
            .iter()
            .map(|(_, name)| format!("\"{name}\""))
            .collect();
        format!(" Did you mean one of: {}?", quoted.join(", "))
    };
    Some(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn single_known_name() {
        assert_eq!(
            unknown_tool_suggestion("red_file", &names(&["read_file"])),
            Some(" Did you mean \"read_file\"?".to_string())
        );
    }

    #[test]
    fn ranks_by_ascending_distance() {
        let known = names(&["glob", "ready", "read_file"]);
        let suggestion = unknown_tool_suggestion("read_fil", &known).unwrap();
        assert_eq!(
            suggestion,
            " Did you mean one of: \"read_file\", \"ready\", \"glob\"?"
        );
    }

    #[test]
    fn ties_break_lexicographically() {
        let known = names(&["get", "bet"]);
        let suggestion = unknown_tool_suggestion("pet", &known).unwrap();
        assert_eq!(suggestion, " Did you mean one of: \"bet\", \"get\"?");
    }

    #[test]
    fn caps_at_three_suggestions() {
        let known = names(&["aa", "ab", "ac", "ad"]);
        let suggestion = unknown_tool_suggestion("a", &known).unwrap();
        assert_eq!(suggestion, " Did you mean one of: \"aa\", \"ab\", \"ac\"?");
    }

    #[test]
    fn dotted_reference_matches_by_suffix() {
        let known = names(&["list_files", "fetch"]);
        let suggestion = unknown_tool_suggestion("github.list_files", &known).unwrap();
        assert!(suggestion.starts_with(" Did you mean one of: \"list_files\""));
    }

    #[test]
    fn empty_registry_yields_nothing() {
        assert_eq!(unknown_tool_suggestion("anything", &[]), None);
    }
}
