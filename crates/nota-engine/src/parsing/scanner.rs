//! Bounded-lookahead multi-pattern scanner.
//!
//! Every pattern is searched once per window. Matches found in a window are
//! emitted in start order, ties going to the pattern declared first, and the
//! next window starts at the furthest match end. A window without matches
//! slides by the full lookahead.
//!
//! Empty matches never stall the scan: a window holding only empty matches
//! at its start moves on by one character, and a pattern whose empty match
//! ended the previous window resumes one character later.

use std::collections::{BTreeMap, VecDeque};

use regex::{Captures, Regex};

use super::{grammar::GrammarError, span::TextRange};

/// How a scanned pattern is meant to be used by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// A complete span on its own.
    Closed,
    /// Only matches at the start of a line.
    LinePrefix,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub regex: Regex,
    pub kind: Option<Delimiter>,
}

impl Pattern {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, GrammarError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| GrammarError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            regex,
            kind: None,
        })
    }

    #[must_use]
    pub fn with_kind(mut self, kind: Delimiter) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// One pattern occurrence found by the [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch<'p> {
    /// Index of the pattern in the list given to the scanner.
    pub pattern: usize,
    pub name: &'p str,
    pub range: TextRange,
    /// Named captures that took part in the match.
    pub captures: BTreeMap<String, String>,
}

pub struct Scanner<'p, 't> {
    patterns: &'p [Pattern],
    text: &'t str,
    lookahead: usize,
    offset: usize,
    pending: VecDeque<ScanMatch<'p>>,
    /// Patterns whose last match was empty and sits at `offset`.
    resumed: Vec<usize>,
}

impl<'p, 't> Scanner<'p, 't> {
    pub fn new(
        patterns: &'p [Pattern],
        text: &'t str,
        lookahead: usize,
    ) -> Result<Self, GrammarError> {
        if patterns.is_empty() {
            return Err(GrammarError::NoPatterns);
        }
        if lookahead == 0 {
            return Err(GrammarError::ZeroLookahead);
        }
        Ok(Self {
            patterns,
            text,
            lookahead,
            offset: 0,
            pending: VecDeque::new(),
            resumed: vec![],
        })
    }

    fn scan_window(&mut self) {
        let offset = self.offset;
        let end = ceil_char_boundary(self.text, offset.saturating_add(self.lookahead));
        // Truncate instead of slicing from `offset` so anchors keep their meaning
        let haystack = &self.text[..end];

        let mut found: Vec<ScanMatch<'p>> = self
            .patterns
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let from = if self.resumed.contains(&i) {
                    next_char_boundary(haystack, offset)
                } else {
                    offset
                };
                let caps = first_match(p, haystack, from)?;
                let whole = caps.get(0)?;
                Some(ScanMatch {
                    pattern: i,
                    name: &p.name,
                    range: TextRange::new(whole.start(), whole.end()),
                    captures: named_captures(&p.regex, &caps),
                })
            })
            .collect();
        // Stable, so equal starts keep declaration order
        found.sort_by_key(|m| m.range.start);

        self.offset = match found.iter().map(|m| m.range.end).max() {
            Some(furthest) if furthest > offset => furthest,
            Some(_) => next_char_boundary(self.text, offset),
            None => end,
        };
        let next = self.offset;
        self.resumed = found
            .iter()
            .filter(|m| m.range.is_empty() && m.range.start == next)
            .map(|m| m.pattern)
            .collect();
        log::trace!(
            "scanned window {offset}..{end}: {} matches, next at {}",
            found.len(),
            self.offset
        );
        self.pending.extend(found);
    }
}

impl<'p> Iterator for Scanner<'p, '_> {
    type Item = ScanMatch<'p>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() && self.offset < self.text.len() {
            self.scan_window();
        }
        self.pending.pop_front()
    }
}

/// Collects the named groups of `caps` that participated in the match.
pub fn named_captures(regex: &Regex, caps: &Captures<'_>) -> BTreeMap<String, String> {
    regex
        .capture_names()
        .flatten()
        .filter_map(|name| {
            caps.name(name)
                .map(|m| (name.to_string(), m.as_str().to_string()))
        })
        .collect()
}

/// First match of `p` at or after `from`, honouring [`Delimiter::LinePrefix`].
fn first_match<'h>(p: &Pattern, haystack: &'h str, from: usize) -> Option<Captures<'h>> {
    let mut at = from;
    loop {
        let caps = p.regex.captures_at(haystack, at)?;
        let start = caps.get(0)?.start();
        if p.kind != Some(Delimiter::LinePrefix) || at_line_start(haystack, start) {
            return Some(caps);
        }
        if start >= haystack.len() {
            return None;
        }
        at = next_char_boundary(haystack, start);
    }
}

fn at_line_start(text: &str, i: usize) -> bool {
    i == 0 || text[..i].ends_with('\n')
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn next_char_boundary(s: &str, i: usize) -> usize {
    s[i..]
        .chars()
        .next()
        .map_or(s.len(), |c| i + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(patterns: &[Pattern], text: &str, lookahead: usize) -> Vec<(String, usize, usize)> {
        Scanner::new(patterns, text, lookahead)
            .unwrap()
            .map(|m| (m.name.to_string(), m.range.start, m.range.end))
            .collect()
    }

    #[test]
    fn test_matches_come_out_in_start_order() {
        let patterns = vec![
            Pattern::new("word", r"[a-z]+").unwrap(),
            Pattern::new("number", r"[0-9]+").unwrap(),
        ];

        let found = scan(&patterns, "12 ab 34", 80);

        assert_eq!(
            found,
            vec![
                ("number".to_string(), 0, 2),
                ("word".to_string(), 3, 5),
                ("number".to_string(), 6, 8),
            ]
        );
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        let patterns = vec![
            Pattern::new("short", r"a").unwrap(),
            Pattern::new("long", r"ab").unwrap(),
        ];

        let found = scan(&patterns, "ab", 80);

        assert_eq!(
            found,
            vec![("short".to_string(), 0, 1), ("long".to_string(), 0, 2)]
        );
    }

    #[test]
    fn test_window_without_match_slides_by_lookahead() {
        let patterns = vec![Pattern::new("x", r"x").unwrap()];
        let text = format!("{}x", "-".repeat(25));

        assert_eq!(scan(&patterns, &text, 10), vec![("x".to_string(), 25, 26)]);
    }

    #[test]
    fn test_match_cut_by_window_is_not_found_whole() {
        // The word straddles the first window boundary
        let patterns = vec![Pattern::new("word", r"[a-z]+").unwrap()];

        let found = scan(&patterns, "    abcdef", 6);

        assert_eq!(
            found,
            vec![("word".to_string(), 4, 6), ("word".to_string(), 6, 10)]
        );
    }

    #[test]
    fn test_empty_matches_still_terminate() {
        let patterns = vec![Pattern::new("nothing", r"x*").unwrap()];

        let found = scan(&patterns, "abc", 80);

        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|(_, s, e)| s == e));
    }

    #[test]
    fn test_empty_match_ending_a_window_is_emitted_once() {
        let patterns = vec![Pattern::new("edge", r"\b").unwrap()];

        let found = scan(&patterns, "ab cd", 80);

        let edges: Vec<usize> = found.iter().map(|(_, s, _)| *s).collect();
        assert_eq!(edges, vec![0, 2, 3, 5]);
    }

    #[test]
    fn test_resumed_pattern_does_not_hold_back_others() {
        // `gap` matches exactly where the empty `edge` match ended the window
        let patterns = vec![
            Pattern::new("gap", r"[ a]").unwrap(),
            Pattern::new("edge", r"\b").unwrap(),
        ];

        let found = scan(&patterns, "  ab", 80);

        assert_eq!(
            found,
            vec![
                ("gap".to_string(), 0, 1),
                ("edge".to_string(), 2, 2),
                ("gap".to_string(), 2, 3),
                ("edge".to_string(), 4, 4),
            ]
        );
    }

    #[test]
    fn test_line_prefix_only_matches_at_line_start() {
        let bullet = Pattern::new("bullet", r"- ").unwrap();
        let patterns = vec![bullet.with_kind(Delimiter::LinePrefix)];

        let found = scan(&patterns, "- a - b\n- c", 80);

        assert_eq!(
            found,
            vec![("bullet".to_string(), 0, 2), ("bullet".to_string(), 8, 10)]
        );
    }

    #[test]
    fn test_multibyte_window_edges() {
        let patterns = vec![Pattern::new("e", "é").unwrap()];

        let found = scan(&patterns, "ééé", 1);

        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let patterns = vec![Pattern::new("x", "x").unwrap()];

        assert!(matches!(
            Scanner::new(&patterns, "x", 0),
            Err(GrammarError::ZeroLookahead)
        ));
        assert!(matches!(
            Scanner::new(&[], "x", 10),
            Err(GrammarError::NoPatterns)
        ));
        assert!(matches!(
            Pattern::new("bad", "("),
            Err(GrammarError::InvalidPattern { .. })
        ));
    }
}
