use super::{
    grammar::GrammarError,
    scanner::{Pattern, Scanner},
    span::TextRange,
};

/// A single source line with its byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRef {
    /// Byte range of the line content, terminator excluded.
    pub range: TextRange,
    /// The line text without its `\n` or `\r\n` terminator.
    pub text: String,
}

/// Splits `text` into lines by scanning for terminators.
///
/// A trailing terminator does not produce an extra empty line.
pub fn lines_with_ranges(text: &str, lookahead: usize) -> Result<Vec<LineRef>, GrammarError> {
    let patterns = [Pattern::new("newline", r"\n")?];
    let mut out = Vec::new();
    let mut start = 0usize;

    for m in Scanner::new(&patterns, text, lookahead)? {
        out.push(line_ref(text, start, m.range.start));
        start = m.range.end;
    }
    if start < text.len() {
        out.push(line_ref(text, start, text.len()));
    }
    Ok(out)
}

fn line_ref(text: &str, start: usize, end: usize) -> LineRef {
    let content = &text[start..end];
    let content = content.strip_suffix('\r').unwrap_or(content);
    LineRef {
        range: TextRange::new(start, start + content.len()),
        text: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", vec![])]
    #[case("one", vec!["one"])]
    #[case("one\n", vec!["one"])]
    #[case("one\ntwo", vec!["one", "two"])]
    #[case("one\r\n\r\ntwo\r\n", vec!["one", "", "two"])]
    #[case("\n\n", vec!["", ""])]
    fn test_line_splitting(#[case] input: &str, #[case] expected: Vec<&str>) {
        let lines = lines_with_ranges(input, 4).unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn test_ranges_point_at_line_content() {
        let text = "ab\r\ncd\n";

        let lines = lines_with_ranges(text, 80).unwrap();

        assert_eq!(lines[0].range, TextRange::new(0, 2));
        assert_eq!(lines[1].range, TextRange::new(4, 6));
        for l in &lines {
            assert_eq!(&text[l.range.start..l.range.end], l.text);
        }
    }
}
