use nota_engine::{parse, snapshot};
use regex::Regex;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.nd",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

#[test]
fn fixture_weekly_review() {
    let tree = parse(&fixture("weekly")).unwrap();
    snapshot::invariants(&tree);

    insta::assert_snapshot!(snapshot::outline(&tree), @r##"
    document
      title
        "Weekly review"
      meta
        "tags: "
        tag name="review"
      heading depth="#"
        "Done"
      todo-list
        list-item state="x"
          "Ship the "
          emphasis
            "parser"
        list-item state=" "
          "Write "
          code
            "docs"
          " for "
          ref name="Query Engine"
          ordered-list
            list-item number="1"
              "axes"
            list-item number="2"
              "groups"
      unordered-list
        list-item bullet="-"
          "plain item\ncontinued here"
      comment
        "private note"
      definition-list
        list-item term="garden"
          "Water the "
          term
            "tomatoes"
          " on "
          date date="2024-06-01"
          "."
      code lang="rust"
        "fn main() {}"
    "##);
}

/// Every word of the source survives as text or as an attribute value
#[test]
fn heading_tree_serializes_with_offsets() {
    let tree = parse("# Hi\n").unwrap();
    let snap = snapshot::normalize(&tree, tree.root());

    insta::assert_yaml_snapshot!("heading_tree", snap);
}

#[test]
fn words_are_preserved() {
    let source = fixture("weekly");
    let tree = parse(&source).unwrap();

    let mut corpus = tree.text_content(tree.root());
    for node in tree.descendants(tree.root()) {
        for value in tree.attributes(node).values() {
            corpus.push(' ');
            corpus.push_str(&value.to_string());
        }
    }

    let word = Regex::new(r"\w+").unwrap();
    for w in word.find_iter(&source) {
        assert!(corpus.contains(w.as_str()), "lost {:?}", w.as_str());
    }
}

/// Text leaves read in order are a subsequence of the source, ignoring whitespace
#[test]
fn text_follows_source_order() {
    let source = fixture("weekly");
    let tree = parse(&source).unwrap();

    let text = tree.text_content(tree.root());
    let mut rest = source.chars().filter(|c| !c.is_whitespace());
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        assert!(rest.any(|s| s == c), "{c:?} out of order");
    }
}

#[test]
fn offsets_point_into_source() {
    let source = fixture("weekly");
    let tree = parse(&source).unwrap();

    for node in tree.descendants(tree.root()) {
        let start = tree.attribute(node, "start").and_then(|v| v.as_int());
        let end = tree.attribute(node, "end").and_then(|v| v.as_int());
        if let (Some(start), Some(end)) = (start, end) {
            assert!(start <= end, "{} has {start}..{end}", tree.name(node));
            assert!(end as usize <= source.len());
        }
    }
}

#[test]
fn empty_input_is_an_empty_document() {
    let tree = parse("").unwrap();

    assert_eq!(snapshot::outline(&tree), "document\n");
}
