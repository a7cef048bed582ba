/*
 * round_trip.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Parse/serialize round trips and parse diagnostics.
 */

use pretty_assertions::assert_eq;
use weft_dom::{Error, SerializeOptions, namespace, parse, parse_fragment, serialize};

fn round_trip(markup: &str) -> String {
    let doc = parse(markup).unwrap();
    serialize(doc.tree(), &SerializeOptions::default())
}

#[test]
fn test_xhtml_page_round_trip() {
    let markup = concat!(
        r#"<html xmlns="http://www.w3.org/1999/xhtml" lang="en">"#,
        "<head><title>Weft &amp; co</title><meta charset=\"utf-8\"/></head>",
        "<body>\n  <p class=\"intro\">Hello <em>there</em></p>\n  <div></div>\n</body>",
        "</html>"
    );
    assert_eq!(round_trip(markup), markup);
}

#[test]
fn test_namespaced_document_round_trip() {
    let markup = concat!(
        r#"<w:document xmlns:w="urn:weft:container" xmlns:x="urn:x">"#,
        r#"<x:item x:kind="a">one</x:item><plain/>"#,
        "</w:document>"
    );
    assert_eq!(round_trip(markup), markup);
}

#[test]
fn test_whitespace_between_top_level_nodes_is_dropped() {
    insta::assert_snapshot!(
        round_trip("<!DOCTYPE html>\n\n<root>\n<a/>\n</root>\n"),
        @r#"
    <!DOCTYPE html>
    <root>
    <a/>
    </root>
    "#
    );
}

#[test]
fn test_cdata_serializes_as_escaped_text() {
    insta::assert_snapshot!(
        round_trip("<script><![CDATA[if (a < b) { go(); }]]></script>"),
        @"<script>if (a &lt; b) { go(); }</script>"
    );
}

#[test]
fn test_fragment_with_default_namespace() {
    let tree = parse_fragment("<p>one</p> <p>two</p>", Some(namespace::XHTML)).unwrap();
    let out = serialize(&tree, &SerializeOptions::default());
    assert_eq!(
        out,
        concat!(
            r#"<p xmlns="http://www.w3.org/1999/xhtml">one</p> "#,
            r#"<p xmlns="http://www.w3.org/1999/xhtml">two</p>"#
        )
    );
}

#[test]
fn test_parse_error_reports_line_and_column() {
    let err = parse("<root>\n  <a x=1/>\n</root>").unwrap_err();
    match err {
        Error::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_parse_error_display_mentions_position() {
    let err = parse("<root/>\n<second/>").unwrap_err();
    assert_eq!(
        err.to_string(),
        "XML syntax error at line 2, column 1: multiple root elements"
    );
}

#[test]
fn test_text_outside_root_is_rejected() {
    let err = parse("<root/>trailing").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}
