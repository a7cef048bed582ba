/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end rendering, merging and snippet tests against fixtures.
 */

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use weft_dom::{Document, NodeId, Tree};
use weft_select::{CssSelector, Selector, XPathSelector};
use weft_template::binding::{ObjectModel, Signal, Value};
use weft_template::{
    FormData, LoadError, MergeError, MergeList, Template, TemplateError, Transformation,
    ViewModelError, loader,
};

fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

fn load_template(name: &str) -> Template {
    Template::load(&fixture_path(name))
        .unwrap_or_else(|e| panic!("Failed to load template {}: {}", name, e))
}

fn select(tree: &Tree, query: &str) -> Vec<NodeId> {
    XPathSelector::new(query)
        .select(tree, tree.root())
        .unwrap()
        .into_vec()
}

fn texts(tree: &Tree, query: &str) -> Vec<String> {
    select(tree, query)
        .into_iter()
        .map(|n| tree.text_content(n))
        .collect()
}

fn render(markup: &str, model: Value) -> Result<String, TemplateError> {
    let mut template = Template::parse(markup)?;
    template.apply_view_model(&model)?;
    Ok(template.render())
}

#[test]
fn test_fixture_page_with_json_model() {
    let mut template = load_template("page.xhtml");
    let model = loader::load_model(&fixture_path("model.json")).unwrap();
    template.apply_view_model(&model).unwrap();

    let tree = template.document().tree();
    assert_eq!(texts(tree, "//html:title"), vec!["Weft"]);
    assert_eq!(texts(tree, "//html:h1"), vec!["Weft"]);
    assert!(select(tree, "//html:p[@property='draft']").is_empty());
    assert_eq!(texts(tree, "//html:p[@property='summary']"), vec!["Summary"]);
    assert_eq!(texts(tree, "//html:li"), vec!["xml", "rust"]);

    let sections = select(tree, "//html:section");
    let types: Vec<_> = sections
        .iter()
        .map(|s| tree.get_attribute(*s, "typeof").unwrap_or_default())
        .collect();
    assert_eq!(types, vec!["Note", "Quote"]);
    assert_eq!(texts(tree, "//html:section"), vec!["First note", "A quote"]);

    let home = select(tree, "//html:a[@property='home']");
    assert_eq!(home.len(), 1);
    assert_eq!(tree.get_attribute(home[0], "href"), Some("/"));
    assert_eq!(tree.text_content(home[0]), "Start");

    assert_eq!(texts(tree, "//html:span[@property='name']"), vec!["Posit"]);
    assert!(template.render().starts_with("<!DOCTYPE html>\n<html"));
}

#[test]
fn test_property_list_expands_template() {
    let model = ObjectModel::new().field("x", vec!["a", "b"]).into_value();
    let out = render(r#"<ul><li property="x">template</li></ul>"#, model).unwrap();
    assert_eq!(
        out,
        r#"<ul><li property="x">a</li><li property="x">b</li></ul>"#
    );
}

#[test]
fn test_typeof_picks_matching_template() {
    let item = ObjectModel::new().with_type("B").field("label", "bound");
    let model = ObjectModel::new()
        .field("p", Value::List(vec![item.into_value()]))
        .into_value();
    let out = render(
        r#"<div><div property="p" typeof="A">a</div><div property="p" typeof="B"><span property="label">b</span></div></div>"#,
        model,
    )
    .unwrap();
    assert_eq!(
        out,
        r#"<div><div property="p" typeof="B"><span property="label">bound</span></div></div>"#
    );
}

#[test]
fn test_signals() {
    let model = ObjectModel::new()
        .field("gone", Signal::Remove)
        .field("kept", Signal::Ignore)
        .into_value();
    let out = render(
        r#"<div><p property="gone">x</p><p property="kept">original <b>content</b></p></div>"#,
        model,
    )
    .unwrap();
    assert_eq!(
        out,
        r#"<div><p property="kept">original <b>content</b></p></div>"#
    );
}

#[test]
fn test_rendering_error_surfaces_through_template() {
    let model = ObjectModel::new().into_value();
    let err = render(r#"<div><p property="missing"/></div>"#, model).unwrap_err();
    assert!(matches!(
        err,
        TemplateError::ViewModel(ViewModelError::ResolvingPropertyFailed { .. })
    ));
}

#[test]
fn test_snippet_directory() {
    let mut template = load_template("page.xhtml");
    let snippets = loader::load_snippet_dir(&fixture_path("snippets")).unwrap();
    let ids: Vec<_> = snippets.ids().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["footer", "head", "nav"]);

    template.apply_snippets(&snippets).unwrap();
    let tree = template.document().tree();
    assert_eq!(texts(tree, "//html:footer/html:p"), vec!["© Posit"]);
    assert_eq!(texts(tree, "//html:ul[@id='nav']/html:li"), vec!["Home", "Docs"]);
    assert!(select(tree, "//html:nav").is_empty());
    let meta = select(tree, "//html:head/html:meta");
    assert_eq!(meta.len(), 1);
    assert_eq!(tree.get_attribute(meta[0], "content"), Some("weft"));
}

#[test]
fn test_merge_fixture_parts() {
    let mut template = load_template("page.xhtml");
    let mut list = MergeList::new();
    for path in loader::markup_files(&fixture_path("parts")).unwrap() {
        list.add(loader::load_mergeable(&path).unwrap()).unwrap();
    }
    assert_eq!(list.len(), 2);
    template.merge(&list).unwrap();

    let tree = template.document().tree();
    assert_eq!(texts(tree, "//html:main/html:article/html:h2"), vec!["Merged"]);
    assert_eq!(
        texts(tree, "//html:main/html:article/html:aside/html:p"),
        vec!["Aside"]
    );
    // The container element itself never reaches the page.
    assert!(!template.render().contains("urn:weft:container"));
}

#[test]
fn test_merge_replace_versus_append() {
    let mut list = MergeList::new();
    list.insert("x", Document::parse(r#"<section id="x" class="new">n</section>"#).unwrap())
        .unwrap();
    list.insert("y", Document::parse("<em>child</em>").unwrap())
        .unwrap();
    let mut template =
        Template::parse(r#"<body><div id="x">old</div><div id="y">kept</div></body>"#).unwrap();
    template.merge(&list).unwrap();
    assert_eq!(
        template.render(),
        r#"<body><section id="x" class="new">n</section><div id="y">kept<em>child</em></div></body>"#
    );
}

#[test]
fn test_duplicate_merge_target_is_fatal() {
    let markup = r#"<body><div id="x"/><div><div id="x"/></div></body>"#;
    let mut template = Template::parse(markup).unwrap();
    let mut list = MergeList::new();
    list.insert("x", Document::parse("<b/>").unwrap()).unwrap();
    let err = template.merge(&list).unwrap_err();
    assert!(matches!(err, TemplateError::Merge(MergeError::DuplicateId { .. })));
    assert_eq!(template.render(), markup);
}

#[test]
fn test_empty_selection_short_circuits_batch() {
    let markup = r#"<div><p>one</p><p>two</p></div>"#;
    let mut template = Template::parse(markup).unwrap();
    let applied = template
        .apply_transformations(&[
            Transformation::remove(CssSelector::new("table")),
            Transformation::set_text(CssSelector::new("p"), "changed"),
        ])
        .unwrap();
    assert_eq!(applied, 0);
    assert_eq!(template.render(), markup);
}

#[test]
fn test_form_fixture() {
    let mut template = load_template("form.xhtml");
    let data: FormData = serde_json::from_str(
        r#"{"q": "weft", "lang[]": ["fr"], "sort": "old", "comment": "Thanks"}"#,
    )
    .unwrap();
    let filled = template.apply_form_data(&data).unwrap();
    assert_eq!(filled, 5);

    let tree = template.document().tree();
    let q = select(tree, "//html:input[@name='q']");
    assert_eq!(tree.get_attribute(q[0], "value"), Some("weft"));
    let checked: Vec<_> = select(tree, "//html:input[@checked]")
        .into_iter()
        .filter_map(|n| tree.get_attribute(n, "value"))
        .collect();
    assert_eq!(checked, vec!["fr"]);
    assert_eq!(texts(tree, "//html:option[@selected]"), vec!["Oldest"]);
    assert_eq!(texts(tree, "//html:textarea"), vec!["Thanks"]);
}

#[test]
fn test_snapshot_restore_through_template() {
    let mut template = Template::parse(r#"<p property="a">x</p>"#).unwrap();
    template.snapshot("clean");
    template
        .apply_transformations(&[Transformation::set_text(XPathSelector::new("/p"), "y")])
        .unwrap();
    assert_eq!(template.render(), r#"<p property="a">y</p>"#);
    template.restore("clean").unwrap();
    assert_eq!(template.render(), r#"<p property="a">x</p>"#);
    assert!(template.restore("missing").is_err());
}

#[test]
fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();

    let bad_json = dir.path().join("model.json");
    std::fs::write(&bad_json, "{ not json").unwrap();
    assert!(matches!(
        loader::load_model(&bad_json).unwrap_err(),
        LoadError::Json { .. }
    ));

    let bad_markup = dir.path().join("page.xhtml");
    std::fs::write(&bad_markup, "<p><b></p>").unwrap();
    assert!(matches!(
        loader::load_document(&bad_markup).unwrap_err(),
        LoadError::Parse { .. }
    ));

    let missing = dir.path().join("missing.xhtml");
    assert!(matches!(
        loader::load_document(&missing).unwrap_err(),
        LoadError::Io { .. }
    ));
}
