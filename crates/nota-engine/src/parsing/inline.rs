//! # Inline spans
//!
//! Resolves delimited spans inside a block's text. Each round every live
//! entry proposes its earliest span starting at or after the cursor; the
//! earliest start wins and ties go to the entry declared first. An entry
//! that cannot close inside the current scope, or whose span would be
//! empty, is dropped for the rest of that scope. Span interiors are resolved recursively with the entries
//! still alive in the enclosing scope.

use std::collections::BTreeMap;

use super::{grammar::InlineDef, scanner::named_captures};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Span(MatchedInline),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedInline {
    pub name: String,
    /// Named captures of the start and end delimiters.
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Inline>,
}

/// A proposed span, in absolute offsets.
#[derive(Debug, Clone)]
struct Candidate {
    start: usize,
    inner_start: usize,
    inner_end: usize,
    end: usize,
    attributes: BTreeMap<String, String>,
}

/// Resolves every inline span in `text`.
pub fn match_inlines(text: &str, defs: &[InlineDef]) -> Vec<Inline> {
    let alive: Vec<usize> = (0..defs.len()).collect();
    match_range(text, defs, 0, text.len(), alive)
}

fn match_range(
    text: &str,
    defs: &[InlineDef],
    start: usize,
    n: usize,
    mut alive: Vec<usize>,
) -> Vec<Inline> {
    let mut out = vec![];
    let mut o = start;
    // Candidates stay valid while they start at or after the cursor
    let mut cache: BTreeMap<usize, Candidate> = BTreeMap::new();

    while o < n && !alive.is_empty() {
        let mut best: Option<(usize, &Candidate)> = None;
        alive.retain(|&i| {
            let stale = cache.get(&i).is_none_or(|c| c.start < o);
            if stale {
                match propose(text, &defs[i], o, n) {
                    // An empty span would never move the cursor
                    Some(c) if c.end > c.start => {
                        cache.insert(i, c);
                    }
                    _ => {
                        cache.remove(&i);
                        return false;
                    }
                }
            }
            true
        });
        for &i in &alive {
            if let Some(c) = cache.get(&i) {
                // Strictly smaller, so the first declared keeps ties
                if best.is_none_or(|(_, b)| c.start < b.start) {
                    best = Some((i, c));
                }
            }
        }
        let Some((i, c)) = best else { break };

        push_text(&mut out, &text[o..c.start]);
        let def = &defs[i];
        let children = if def.end.is_none() {
            vec![]
        } else if def.raw {
            let inner = &text[c.inner_start..c.inner_end];
            if inner.is_empty() {
                vec![]
            } else {
                vec![Inline::Text(inner.to_string())]
            }
        } else {
            match_range(text, defs, c.inner_start, c.inner_end, alive.clone())
        };
        out.push(Inline::Span(MatchedInline {
            name: def.name.clone(),
            attributes: c.attributes.clone(),
            children,
        }));
        o = c.end;
    }

    if o < n {
        push_text(&mut out, &text[o..n]);
    }
    out
}

/// Earliest span of `def` starting at or after `o` and closing by `n`.
fn propose(text: &str, def: &InlineDef, o: usize, n: usize) -> Option<Candidate> {
    let start_caps = def.start.captures_at(text, o)?;
    let start = start_caps.get(0)?;
    let mut attributes = named_captures(&def.start, &start_caps);

    let Some(end_re) = &def.end else {
        return (start.end() <= n).then(|| Candidate {
            start: start.start(),
            inner_start: start.end(),
            inner_end: start.end(),
            end: start.end(),
            attributes,
        });
    };

    let end_caps = end_re.captures_at(text, start.end())?;
    let end = end_caps.get(0)?;
    if end.end() > n {
        return None;
    }
    attributes.extend(named_captures(end_re, &end_caps));
    Some(Candidate {
        start: start.start(),
        inner_start: start.end(),
        inner_end: end.start(),
        end: end.end(),
        attributes,
    })
}

fn push_text(out: &mut Vec<Inline>, s: &str) {
    if !s.is_empty() {
        out.push(Inline::Text(s.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::grammar::Grammar;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn span(name: &str, attrs: &[(&str, &str)], children: Vec<Inline>) -> Inline {
        Inline::Span(MatchedInline {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        })
    }

    fn nota(s: &str) -> Vec<Inline> {
        let grammar = Grammar::nota().unwrap();
        match_inlines(s, grammar.inlines())
    }

    #[test]
    fn test_plain_text_is_one_node() {
        assert_eq!(nota("just words"), vec![text("just words")]);
    }

    #[test]
    fn test_emphasis_and_tag() {
        assert_eq!(
            nota("Some *emphasis* and a #tag."),
            vec![
                text("Some "),
                span("emphasis", &[], vec![text("emphasis")]),
                text(" and a "),
                span("tag", &[("name", "tag")], vec![]),
                text("."),
            ]
        );
    }

    #[test]
    fn test_strong_wins_tie_with_emphasis() {
        assert_eq!(
            nota("**bold *and* more**"),
            vec![span(
                "strong",
                &[],
                vec![
                    text("bold "),
                    span("emphasis", &[], vec![text("and")]),
                    text(" more"),
                ]
            )]
        );
    }

    #[test]
    fn test_code_is_a_raw_zone() {
        assert_eq!(
            nota("see `a *b* #c` here"),
            vec![
                text("see "),
                span("code", &[], vec![text("a *b* #c")]),
                text(" here"),
            ]
        );
    }

    #[test]
    fn test_link_carries_end_captures() {
        assert_eq!(
            nota("[the site](http://example.com) and [anchor]"),
            vec![
                span(
                    "link",
                    &[("target", "http://example.com")],
                    vec![text("the site")]
                ),
                text(" and "),
                span("anchor", &[], vec![text("anchor")]),
            ]
        );
    }

    #[test]
    fn test_unclosed_delimiter_stays_text() {
        assert_eq!(
            nota("a * b and 2024-01-31"),
            vec![
                text("a * b and "),
                span("date", &[("date", "2024-01-31")], vec![]),
            ]
        );
    }

    #[test]
    fn test_span_cannot_close_outside_its_scope() {
        // The inner `_` would only close after the emphasis ends
        assert_eq!(
            nota("*a _b* c_"),
            vec![
                span("emphasis", &[], vec![text("a _b")]),
                text(" c_"),
            ]
        );
    }

    #[test]
    fn test_zero_width_entry_is_dropped() {
        // Built directly, bypassing the grammar's checks
        let defs = vec![
            InlineDef::standalone("edge", r"\b").unwrap(),
            InlineDef::standalone("tag", r"#(?P<name>\w+)").unwrap(),
        ];

        assert_eq!(
            match_inlines("ab #cd", &defs),
            vec![text("ab "), span("tag", &[("name", "cd")], vec![])]
        );
    }

    #[test]
    fn test_microformats() {
        assert_eq!(
            nota("<me@example.org> at 12:30 #{Some Page}"),
            vec![
                span("email", &[("address", "me@example.org")], vec![]),
                text(" at "),
                span("time", &[("time", "12:30")], vec![]),
                text(" "),
                span("ref", &[("name", "Some Page")], vec![]),
            ]
        );
    }
}
