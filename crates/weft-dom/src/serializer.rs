/*
 * serializer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tree to markup serialization.
//!
//! Namespace declarations are emitted wherever an element or a prefixed
//! attribute needs a binding that is not in scope at that point. This
//! matters for nodes imported from other trees, which carry resolved
//! namespace URIs but not the declarations of their original ancestors.

use serde::{Deserialize, Serialize};

use crate::namespace;
use crate::tree::{NodeData, NodeId, Tree};

/// Output settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SerializeOptions {
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` first.
    pub xml_declaration: bool,
    /// Write empty XHTML elements the way HTML parsers expect: void
    /// elements as `<br/>`, everything else with an explicit end tag.
    pub html_compatible: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            xml_declaration: false,
            html_compatible: true,
        }
    }
}

/// Serialize a whole tree, starting at its document node.
pub fn serialize(tree: &Tree, options: &SerializeOptions) -> String {
    serialize_node(tree, tree.root(), options)
}

/// Serialize a single node and its subtree.
pub fn serialize_node(tree: &Tree, node: NodeId, options: &SerializeOptions) -> String {
    let mut writer = Writer {
        tree,
        options,
        out: String::new(),
        scopes: Vec::new(),
    };
    if options.xml_declaration {
        writer
            .out
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }
    writer.write(node);
    writer.out
}

struct Writer<'a> {
    tree: &'a Tree,
    options: &'a SerializeOptions,
    out: String,
    /// In-scope bindings per open element, innermost last.
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl Writer<'_> {
    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(namespace::XML);
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    fn write(&mut self, node: NodeId) {
        let tree = self.tree;
        match tree.data(node) {
            NodeData::Document | NodeData::Fragment => {
                for child in tree.children(node) {
                    self.write(child);
                }
            }
            NodeData::Doctype(content) => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(content);
                self.out.push_str(">\n");
            }
            NodeData::Text(text) => escape_into(&mut self.out, text, false),
            NodeData::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(text);
                self.out.push_str("-->");
            }
            NodeData::ProcessingInstruction { target, data } => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if !data.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(data);
                }
                self.out.push_str("?>");
            }
            NodeData::Element(_) => self.write_element(node),
        }
    }

    fn write_element(&mut self, node: NodeId) {
        let tree = self.tree;
        let Some(element) = tree.element(node) else {
            return;
        };

        // Declarations written in the source are in scope for the element
        // itself.
        let mut scope: Vec<(Option<String>, String)> = element
            .attributes
            .iter()
            .filter(|a| a.is_namespace_declaration())
            .map(|a| {
                let prefix = a.name.prefix.as_ref().map(|_| a.name.local.clone());
                (prefix, a.value.clone())
            })
            .collect();
        self.scopes.push(scope.clone());

        let mut missing: Vec<(Option<String>, String)> = Vec::new();
        let name = &element.name;
        let prefix = name.prefix.as_deref();
        match (&name.namespace, self.resolve(prefix)) {
            (Some(ns), bound) if bound != Some(ns.as_str()) => {
                missing.push((name.prefix.clone(), ns.clone()));
            }
            (None, Some(_)) if prefix.is_none() => {
                missing.push((None, String::new()));
            }
            _ => {}
        }
        for attr in &element.attributes {
            if attr.is_namespace_declaration() {
                continue;
            }
            let (Some(p), Some(ns)) = (&attr.name.prefix, &attr.name.namespace) else {
                continue;
            };
            if self.resolve(Some(p)) != Some(ns.as_str())
                && !missing.iter().any(|(mp, _)| mp.as_deref() == Some(p.as_str()))
            {
                missing.push((Some(p.clone()), ns.clone()));
            }
        }

        let qualified = name.qualified();
        self.out.push('<');
        self.out.push_str(&qualified);
        for (p, ns) in &missing {
            match p {
                Some(p) => {
                    self.out.push_str(" xmlns:");
                    self.out.push_str(p);
                }
                None => self.out.push_str(" xmlns"),
            }
            self.out.push_str("=\"");
            escape_into(&mut self.out, ns, true);
            self.out.push('"');
        }
        for attr in &element.attributes {
            self.out.push(' ');
            self.out.push_str(&attr.name.qualified());
            self.out.push_str("=\"");
            escape_into(&mut self.out, &attr.value, true);
            self.out.push('"');
        }
        scope.extend(missing);
        if let Some(top) = self.scopes.last_mut() {
            *top = scope;
        }

        if !tree.has_children(node) {
            let xhtml = name.namespace.as_deref() == Some(namespace::XHTML);
            if self.options.html_compatible && xhtml && !namespace::is_void_element(&name.local)
            {
                self.out.push_str("></");
                self.out.push_str(&qualified);
                self.out.push('>');
            } else {
                self.out.push_str("/>");
            }
        } else {
            self.out.push('>');
            for child in tree.children(node) {
                self.write(child);
            }
            self.out.push_str("</");
            self.out.push_str(&qualified);
            self.out.push('>');
        }
        self.scopes.pop();
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_fragment, parse_tree};
    use pretty_assertions::assert_eq;

    fn round_trip(markup: &str) -> String {
        serialize(&parse_tree(markup).unwrap(), &SerializeOptions::default())
    }

    #[test]
    fn test_serialize_simple() {
        assert_eq!(
            round_trip(r#"<root><a x="1">t</a><b/></root>"#),
            r#"<root><a x="1">t</a><b/></root>"#
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            round_trip(r#"<r a="&quot;&amp;&lt;">1 &lt; 2 &amp; "q"</r>"#),
            r#"<r a="&quot;&amp;&lt;">1 &lt; 2 &amp; "q"</r>"#
        );
    }

    #[test]
    fn test_xhtml_empty_elements() {
        let out = round_trip(r#"<html xmlns="http://www.w3.org/1999/xhtml"><br/><div/></html>"#);
        assert_eq!(
            out,
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><br/><div></div></html>"#
        );

        let strict = SerializeOptions {
            html_compatible: false,
            ..SerializeOptions::default()
        };
        let tree = parse_tree(r#"<html xmlns="http://www.w3.org/1999/xhtml"><div/></html>"#)
            .unwrap();
        assert_eq!(
            serialize(&tree, &strict),
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><div/></html>"#
        );
    }

    #[test]
    fn test_xml_declaration_and_doctype() {
        let tree = parse_tree("<!DOCTYPE html><root/>").unwrap();
        let options = SerializeOptions {
            xml_declaration: true,
            ..SerializeOptions::default()
        };
        assert_eq!(
            serialize(&tree, &options),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n<root/>"
        );
    }

    #[test]
    fn test_imported_node_gets_namespace_declaration() {
        let source = parse_fragment("<p>hi</p>", Some(namespace::XHTML)).unwrap();
        let mut target = parse_tree("<root/>").unwrap();
        let root = target.document_element().unwrap();
        let p = source.children(source.root())[0];
        let imported = target.import_node(&source, p);
        target.append_child(root, imported).unwrap();
        assert_eq!(
            serialize(&target, &SerializeOptions::default()),
            r#"<root><p xmlns="http://www.w3.org/1999/xhtml">hi</p></root>"#
        );
    }

    #[test]
    fn test_unqualified_child_under_default_namespace() {
        let mut tree = parse_tree(r#"<html xmlns="http://www.w3.org/1999/xhtml"/>"#).unwrap();
        let root = tree.document_element().unwrap();
        let plain = tree.create_element("plain");
        tree.append_child(root, plain).unwrap();
        assert_eq!(
            serialize(&tree, &SerializeOptions::default()),
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><plain xmlns=""/></html>"#
        );
    }

    #[test]
    fn test_prefixed_attribute_declaration() {
        let mut tree = parse_tree("<root/>").unwrap();
        let root = tree.document_element().unwrap();
        let el = tree.create_element("item");
        if let Some(e) = tree.element_mut(el) {
            e.attributes.push(crate::tree::Attribute {
                name: crate::tree::QualName::new(Some("urn:x"), "x:flag"),
                value: "1".to_string(),
            });
        }
        tree.append_child(root, el).unwrap();
        assert_eq!(
            serialize(&tree, &SerializeOptions::default()),
            r#"<root><item xmlns:x="urn:x" x:flag="1"/></root>"#
        );
    }

    #[test]
    fn test_serialize_node_subtree() {
        let tree = parse_tree("<root><a><b>x</b></a></root>").unwrap();
        let root = tree.document_element().unwrap();
        let a = tree.child_elements(root)[0];
        assert_eq!(
            serialize_node(&tree, a, &SerializeOptions::default()),
            "<a><b>x</b></a>"
        );
    }

    #[test]
    fn test_comments_and_processing_instructions() {
        assert_eq!(
            round_trip("<r><!-- note --><?php echo 1;?></r>"),
            "<r><!-- note --><?php echo 1;?></r>"
        );
    }
}
