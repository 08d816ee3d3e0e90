#![forbid(unsafe_code)]

//! Removal of common leading whitespace.

/// Strip the leading whitespace shared by every non-empty line of `text`.
///
/// Spaces and tabs both count as one character; a line consisting only of
/// whitespace still takes part. Empty lines are ignored when measuring and
/// left as they are.
///
/// ```
/// use ftui_reflow::dedent::dedent;
///
/// assert_eq!(dedent("  line 1\n\n  line 2\n line 3"), " line 1\n\n line 2\nline 3");
/// ```
#[must_use]
pub fn dedent(text: &str) -> String {
    let shared = text
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(leading_whitespace)
        .min()
        .unwrap_or(0);

    if shared == 0 {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // Every leading character is single-byte ASCII whitespace.
        out.push_str(line.get(shared..).unwrap_or(""));
    }
    out
}

#[inline]
fn leading_whitespace(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ' || b == b'\t').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_indent_removed() {
        assert_eq!(
            dedent("      --help      Show help for command\n      --version   Show version\n"),
            "--help      Show help for command\n--version   Show version\n"
        );
    }

    #[test]
    fn smallest_indent_wins() {
        assert_eq!(
            dedent("      --help              Show help for command\n  -C, --config string   Specify the config file to use\n"),
            "    --help              Show help for command\n-C, --config string   Specify the config file to use\n"
        );
    }

    #[test]
    fn empty_lines_ignored() {
        assert_eq!(dedent("  line 1\n\n  line 2\n line 3"), " line 1\n\n line 2\nline 3");
        assert_eq!(dedent("  line 1\n  line 2\n  line 3\n\n"), "line 1\nline 2\nline 3\n\n");
    }

    #[test]
    fn tabs_count_as_one() {
        assert_eq!(
            dedent(" \tline 1\n\t\tline 2\n\t line 3\n\n"),
            "line 1\nline 2\nline 3\n\n"
        );
        assert_eq!(
            dedent("\t\tline 1\n\n\t\tline 2\n\tline 3"),
            "\tline 1\n\n\tline 2\nline 3"
        );
    }

    #[test]
    fn nothing_to_strip() {
        assert_eq!(dedent("\n\n\n\n\n\n"), "\n\n\n\n\n\n");
        assert_eq!(dedent(""), "");
        assert_eq!(dedent("a\n  b"), "a\n  b");
    }
}
