//! Stock rules for cleaning up parsed notes.

use crate::query::{Query, QueryError};

use super::{RuleSet, Selection, TransformError};

/// Removes every node named `name`, wherever it sits.
pub fn strip(name: &str) -> Result<Selection, QueryError> {
    Ok(Selection::new(Query::descendants(name)?).remove_matches())
}

/// Replaces each `child` node sitting directly under a `container` node by
/// the child's own children.
pub fn unwrap(container: &str, child: &str) -> Result<Selection, QueryError> {
    let containers = Selection::new(Query::descendants(container)?);
    let wrapped = Selection::new(Query::children(child)?);
    let content = Selection::new(Query::children("*")?);
    let content = {
        let (original, replacement) = (wrapped.id(), content.id());
        content.replace(original, replacement)
    };
    Ok(containers.with_child(wrapped.with_child(content)))
}

/// Drops comments and flattens paragraphs nested in list items.
pub fn normalize() -> Result<RuleSet, TransformError> {
    RuleSet::new(vec![strip("comment")?, unwrap("list-item", "paragraph")?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parsing::parse, snapshot::outline};

    #[test]
    fn test_normalize_flattens_item_paragraphs() {
        // Given a list item with a second paragraph and a comment
        let mut tree = parse("- first\n\n  more *text*\n// hidden\n").unwrap();
        insta::assert_snapshot!(outline(&tree), @r##"
        document
          unordered-list
            list-item bullet="-"
              "first"
              paragraph
                "more "
                emphasis
                  "text"
          comment
            "hidden"
        "##);

        // When normalizing
        normalize().unwrap().apply(&mut tree).unwrap();

        // Then the paragraph content moves into the item and the comment is gone
        insta::assert_snapshot!(outline(&tree), @r##"
        document
          unordered-list
            list-item bullet="-"
              "first"
              "more "
              emphasis
                "text"
        "##);
    }
}
