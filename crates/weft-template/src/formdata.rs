/*
 * formdata.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Filling form controls from submitted values.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use weft_dom::{NodeId, Tree};
use weft_select::{CssSelector, Selector};

use crate::error::TemplateResult;

/// Input types that are never filled.
const SKIPPED_INPUT_TYPES: &[&str] = &["password", "file", "submit", "reset", "button", "image"];

/// Submitted values by control name.
///
/// Deserializes from a map whose values are a string or a list of strings:
///
/// ```rust
/// let data: weft_template::FormData =
///     serde_json::from_str(r#"{"q": "rust", "tags[]": ["a", "b"]}"#).unwrap();
/// assert_eq!(data.get("q"), Some("rust"));
/// assert_eq!(data.get_all("tags[]").len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, FieldValue>")]
pub struct FormData {
    values: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl From<BTreeMap<String, FieldValue>> for FormData {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        let values = map
            .into_iter()
            .map(|(name, value)| match value {
                FieldValue::One(v) => (name, vec![v]),
                FieldValue::Many(vs) => (name, vs),
            })
            .collect();
        Self { values }
    }
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single value, replacing earlier ones.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), vec![value.into()]);
    }

    /// Add one more value under `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|vs| vs.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fill the form controls below `context` from `data`. Returns the number
/// of controls changed.
///
/// Text-like inputs receive `value`, checkboxes and radio buttons toggle
/// `checked`, options toggle `selected` and textareas receive their text.
/// A name ending in `[]` takes several values: checkboxes and multi-selects
/// match any of them, repeated text controls take them in order.
pub fn fill(tree: &mut Tree, context: NodeId, data: &FormData) -> TemplateResult<usize> {
    let controls = CssSelector::new("input, select, textarea").select(tree, context)?;
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut filled = 0;

    for control in &controls {
        let Some(name) = tree.get_attribute(control, "name").map(str::to_string) else {
            continue;
        };
        if !data.contains(&name) {
            continue;
        }
        let multi = name.ends_with("[]");
        let all = data.get_all(&name);
        let values = if multi { all } else { &all[..all.len().min(1)] };

        let tag = tree.local_name(control).unwrap_or_default().to_string();
        match tag.as_str() {
            "input" => {
                let kind = tree
                    .get_attribute(control, "type")
                    .unwrap_or("text")
                    .to_ascii_lowercase();
                if SKIPPED_INPUT_TYPES.contains(&kind.as_str()) {
                    continue;
                }
                if kind == "checkbox" || kind == "radio" {
                    let own = tree.get_attribute(control, "value").unwrap_or("on");
                    let checked = values.iter().any(|v| v == own);
                    toggle(tree, control, "checked", checked)?;
                } else {
                    let Some(value) = next_value(&mut positions, &name, values) else {
                        continue;
                    };
                    tree.set_attribute(control, "value", value)?;
                }
            }
            "textarea" => {
                let Some(value) = next_value(&mut positions, &name, values) else {
                    continue;
                };
                tree.set_text_content(control, value);
            }
            "select" => {
                let many = multi || tree.has_attribute(control, "multiple");
                let values = if many { all } else { values };
                let mut matched = false;
                for option in options(tree, control) {
                    let value = tree
                        .get_attribute(option, "value")
                        .map(str::to_string)
                        .unwrap_or_else(|| tree.text_content(option).trim().to_string());
                    let selected = (many || !matched) && values.contains(&value);
                    matched |= selected;
                    toggle(tree, option, "selected", selected)?;
                }
            }
            _ => continue,
        }
        tracing::trace!(name = %name, "Filled form control");
        filled += 1;
    }
    Ok(filled)
}

fn next_value<'a>(
    positions: &mut HashMap<String, usize>,
    name: &str,
    values: &'a [String],
) -> Option<&'a str> {
    let position = positions.entry(name.to_string()).or_default();
    let value = values.get(*position)?;
    *position += 1;
    Some(value)
}

fn options(tree: &Tree, select: NodeId) -> Vec<NodeId> {
    tree.descendants(select)
        .into_iter()
        .filter(|n| tree.local_name(*n) == Some("option"))
        .collect()
}

fn toggle(tree: &mut Tree, element: NodeId, attribute: &str, on: bool) -> weft_dom::Result<()> {
    if on {
        tree.set_attribute(element, attribute, attribute)
    } else {
        tree.remove_attribute(element, attribute);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled(markup: &str, data: &FormData) -> (String, usize) {
        let mut doc = weft_dom::parse(markup).unwrap();
        let root = doc.tree().root();
        let count = fill(doc.tree_mut(), root, data).unwrap();
        (doc.to_xml_string(), count)
    }

    #[test]
    fn test_text_inputs_and_textarea() {
        let mut data = FormData::new();
        data.set("q", "rust");
        data.set("note", "a < b");
        data.set("secret", "hunter2");
        let (out, count) = filled(
            r#"<form><input name="q"/><input type="password" name="secret"/><textarea name="note">old</textarea><input name="other" value="keep"/></form>"#,
            &data,
        );
        assert_eq!(count, 2);
        assert_eq!(
            out,
            r#"<form><input name="q" value="rust"/><input type="password" name="secret"/><textarea name="note">a &lt; b</textarea><input name="other" value="keep"/></form>"#
        );
    }

    #[test]
    fn test_checkboxes_and_radios() {
        let mut data = FormData::new();
        data.append("tags[]", "b");
        data.append("tags[]", "c");
        data.set("size", "m");
        let (out, _) = filled(
            r#"<form><input type="checkbox" name="tags[]" value="a" checked="checked"/><input type="checkbox" name="tags[]" value="b"/><input type="radio" name="size" value="s" checked="checked"/><input type="RADIO" name="size" value="m"/></form>"#,
            &data,
        );
        assert_eq!(
            out,
            r#"<form><input type="checkbox" name="tags[]" value="a"/><input type="checkbox" name="tags[]" value="b" checked="checked"/><input type="radio" name="size" value="s"/><input type="RADIO" name="size" value="m" checked="checked"/></form>"#
        );
    }

    #[test]
    fn test_select() {
        let data: FormData =
            serde_json::from_str(r#"{"color": "green", "pets": ["cat", "dog"]}"#).unwrap();
        let (out, count) = filled(
            r#"<form><select name="color"><option selected="selected">red</option><option>green</option></select><select name="pets" multiple="multiple"><option value="cat"/><option value="dog"/><option value="eel"/></select></form>"#,
            &data,
        );
        assert_eq!(count, 2);
        assert_eq!(
            out,
            r#"<form><select name="color"><option>red</option><option selected="selected">green</option></select><select name="pets" multiple="multiple"><option value="cat" selected="selected"/><option value="dog" selected="selected"/><option value="eel"/></select></form>"#
        );
    }

    #[test]
    fn test_repeated_text_controls_take_values_in_order() {
        let mut data = FormData::new();
        data.append("line[]", "one");
        data.append("line[]", "two");
        let (out, count) = filled(
            r#"<form><input name="line[]"/><input name="line[]"/><input name="line[]" value="x"/></form>"#,
            &data,
        );
        assert_eq!(count, 2);
        assert_eq!(
            out,
            r#"<form><input name="line[]" value="one"/><input name="line[]" value="two"/><input name="line[]" value="x"/></form>"#
        );
    }
}
