/*
 * selectors.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * XPath and CSS selection against parsed documents.
 */

use pretty_assertions::assert_eq;
use weft_dom::{Document, NodeId, Tree, parse};
use weft_select::{CssSelector, SelectorError, Selector, XPathSelector, XPathValue};

const PAGE: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml">
<body>
  <h1 id="title">Title</h1>
  <p class="lead intro">First</p>
  <p>Second</p>
  <ul id="list">
    <li id="one">1</li>
    <li id="two" lang="en-GB">2</li>
    <li>3</li>
  </ul>
  <!-- note -->
</body>
</html>"#;

fn page() -> Document {
    parse(PAGE).unwrap()
}

fn texts(tree: &Tree, nodes: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    nodes.into_iter().map(|n| tree.text_content(n)).collect()
}

fn xpath(doc: &Document, query: &str) -> Vec<String> {
    let tree = doc.tree();
    let selection = XPathSelector::new(query).select(tree, tree.root()).unwrap();
    texts(tree, &selection)
}

fn css(doc: &Document, selector: &str) -> Vec<String> {
    let tree = doc.tree();
    let selection = CssSelector::new(selector).select(tree, tree.root()).unwrap();
    texts(tree, &selection)
}

#[test]
fn test_unprefixed_names_do_not_match_xhtml() {
    let doc = page();
    assert!(xpath(&doc, "//p").is_empty());
    assert_eq!(xpath(&doc, "//html:p"), vec!["First", "Second"]);
}

#[test]
fn test_registered_prefix() {
    let doc = page();
    let tree = doc.tree();
    let selector =
        XPathSelector::new("//x:li[2]").with_namespace("x", "http://www.w3.org/1999/xhtml");
    let selection = selector.select(tree, tree.root()).unwrap();
    assert_eq!(texts(tree, &selection), vec!["2"]);
}

#[test]
fn test_id_attribute_query_excludes_context() {
    let doc = page();
    let tree = doc.tree();
    let list = XPathSelector::new("//html:ul")
        .select(tree, tree.root())
        .unwrap()
        .first()
        .unwrap();
    let ids: Vec<_> = XPathSelector::new(".//*[@id]")
        .select(tree, list)
        .unwrap()
        .iter()
        .map(|n| tree.element_id(n).unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["one", "two"]);
}

#[test]
fn test_predicates_and_functions() {
    let doc = page();
    assert_eq!(xpath(&doc, "//html:li[last()]"), vec!["3"]);
    assert_eq!(xpath(&doc, "//html:li[position() > 1]"), vec!["2", "3"]);
    assert_eq!(xpath(&doc, "//html:li[not(@id)]"), vec!["3"]);
    assert_eq!(
        xpath(&doc, "//html:p[contains(@class, 'intro')]"),
        vec!["First"]
    );
    assert_eq!(
        xpath(&doc, "//*[local-name() = 'h1' and starts-with(., 'Ti')]"),
        vec!["Title"]
    );
    assert_eq!(xpath(&doc, "//html:ul[count(html:li) = 3]/html:li[1]"), vec!["1"]);
}

#[test]
fn test_axes() {
    let doc = page();
    assert_eq!(
        xpath(&doc, "//html:h1/following-sibling::html:p"),
        vec!["First", "Second"]
    );
    assert_eq!(
        xpath(&doc, "//html:ul/preceding-sibling::*[1]"),
        vec!["Second"]
    );
    assert_eq!(
        xpath(&doc, "//html:li[@id='two']/ancestor::html:ul/html:li[3]"),
        vec!["3"]
    );
    let tree = doc.tree();
    let owner = XPathSelector::new("//html:li[@id='one']/../@id/..")
        .select(tree, tree.root())
        .unwrap();
    assert_eq!(owner.len(), 1);
    assert_eq!(tree.element_id(owner.as_slice()[0]), Some("list"));
}

#[test]
fn test_union_is_in_document_order() {
    let doc = page();
    assert_eq!(
        xpath(&doc, "//html:li[3] | //html:h1 | //html:li[1]"),
        vec!["Title", "1", "3"]
    );
}

#[test]
fn test_comment_and_text_tests() {
    let doc = page();
    let tree = doc.tree();
    let comments = XPathSelector::new("//comment()")
        .select(tree, tree.root())
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(xpath(&doc, "//html:h1/text()"), vec!["Title"]);
}

#[test]
fn test_scalar_result_is_not_a_node_set() {
    let doc = page();
    let tree = doc.tree();
    let err = XPathSelector::new("count(//html:li)")
        .select(tree, tree.root())
        .unwrap_err();
    assert_eq!(
        err,
        SelectorError::NotANodeSet {
            query: "count(//html:li)".to_string()
        }
    );
    let value = XPathSelector::new("count(//html:li)")
        .evaluate(tree, tree.root())
        .unwrap();
    assert_eq!(value, XPathValue::Number(3.0));
}

#[test]
fn test_attribute_selection_is_not_a_node_set() {
    let doc = page();
    let tree = doc.tree();
    let err = XPathSelector::new("//@id").select(tree, tree.root()).unwrap_err();
    assert!(matches!(err, SelectorError::NotANodeSet { .. }));
}

#[test]
fn test_xpath_error_messages() {
    let doc = page();
    let tree = doc.tree();
    let err = XPathSelector::new("//svg:rect")
        .select(tree, tree.root())
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Unknown namespace prefix 'svg' in \"//svg:rect\"");

    let err = XPathSelector::new("//p[").select(tree, tree.root()).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"Invalid XPath expression \"//p[\" at column 5: unexpected end of expression"
    );
}

#[test]
fn test_css_selectors_on_xhtml() {
    let doc = page();
    assert_eq!(css(&doc, "p"), vec!["First", "Second"]);
    assert_eq!(css(&doc, ".intro"), vec!["First"]);
    assert_eq!(css(&doc, "#list > li:last-child"), vec!["3"]);
    assert_eq!(css(&doc, "li[lang|=en]"), vec!["2"]);
    assert_eq!(css(&doc, "h1 + p"), vec!["First"]);
    assert_eq!(css(&doc, "h1 ~ p"), vec!["First", "Second"]);
    assert_eq!(css(&doc, "li#one, h1"), vec!["Title", "1"]);
}

#[test]
fn test_css_relative_to_context() {
    let doc = page();
    let tree = doc.tree();
    let list = CssSelector::new("ul").select(tree, tree.root()).unwrap();
    let items = CssSelector::new("li").select(tree, list.as_slice()[0]).unwrap();
    assert_eq!(items.len(), 3);
    let none = CssSelector::new("h1").select(tree, list.as_slice()[0]).unwrap();
    assert!(none.is_empty());
}
