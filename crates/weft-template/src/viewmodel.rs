/*
 * viewmodel.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! View model rendering.
//!
//! The renderer walks the element tree and binds values from a view model
//! to elements carrying RDFa-style attributes:
//!
//! - `prefix="name: member"` binds `name` to a member of the root model
//! - `resource="member"` or `resource="name:member"` switches the model for
//!   the element's subtree
//! - `vocab` gates property processing on the element
//! - `property="member"` binds a member to the element: text, repetition,
//!   removal, or a nested object
//! - `typeof` on a property element selects one of several sibling
//!   templates by the runtime type of each bound object
//!
//! Walkers re-check attachment after every mutation: a property may remove
//! or repeat its element, which detaches siblings the parent walk has
//! already captured.

use std::collections::HashMap;
use std::rc::Rc;

use weft_dom::{NodeId, SnapshotNodeList, Tree};

use crate::binding::{
    AttributeAction, Binding, PropertyAction, Signal, Value, camel_case, resolve_member,
};
use crate::error::ViewModelError;
use crate::options::RenderOptions;

/// Result type for view model rendering.
pub type Result<T> = std::result::Result<T, ViewModelError>;

pub const PREFIX: &str = "prefix";
pub const RESOURCE: &str = "resource";
pub const VOCAB: &str = "vocab";
pub const PROPERTY: &str = "property";
pub const TYPEOF: &str = "typeof";

/// Bind `model` into the subtree rooted at `element`.
///
/// Fails on the first resolution error. The tree is not rolled back; take a
/// [`Document`](weft_dom::Document) snapshot first when undo is needed.
///
/// # Example
///
/// ```rust
/// use weft_template::binding::ObjectModel;
/// use weft_template::{RenderOptions, viewmodel};
///
/// let mut doc = weft_dom::parse(r#"<p><b property="name">?</b></p>"#).unwrap();
/// let root = doc.document_element().unwrap();
/// let model = ObjectModel::new().field("name", "Ada").into_value();
///
/// viewmodel::render(doc.tree_mut(), root, &model, &RenderOptions::default()).unwrap();
/// assert_eq!(doc.to_xml_string(), r#"<p><b property="name">Ada</b></p>"#);
/// ```
pub fn render(
    tree: &mut Tree,
    element: NodeId,
    model: &Value,
    options: &RenderOptions,
) -> Result<()> {
    let Value::Object(root) = model else {
        return Err(ViewModelError::ModelNotAnObject { kind: model.kind() });
    };
    tracing::debug!(element = %element, "Rendering view model");
    let marker = tree.create_comment("weft:marker");
    let mut state = RenderState {
        root: root.clone(),
        prefixes: HashMap::new(),
        marker,
        max_depth: options.max_depth,
    };
    state.walk(tree, element, root.clone(), 0)
}

/// Apply an object to a single element.
///
/// The object's text (when it has one) becomes the element content. Then
/// every attribute is looked up on the object under its camel-cased name;
/// attributes without a matching member are left alone.
pub fn object_apply(tree: &mut Tree, element: NodeId, model: &dyn Binding) -> Result<()> {
    if let Some(text) = model.to_text() {
        match text {
            Value::Text(text) => tree.set_text_content(element, &text),
            other => return Err(ViewModelError::StringRequired { kind: other.kind() }),
        }
    }

    let names: Vec<String> = tree
        .attributes(element)
        .iter()
        .filter(|a| !a.is_namespace_declaration())
        .map(|a| a.name.qualified())
        .collect();
    for name in names {
        let value =
            resolve_member(model, &camel_case(&name)).unwrap_or(Value::Signal(Signal::Ignore));
        match AttributeAction::classify(value) {
            AttributeAction::Keep => {}
            AttributeAction::Remove => {
                tracing::trace!(attribute = %name, "Removing bound attribute");
                tree.remove_attribute(element, &name);
            }
            AttributeAction::Set(value) => tree.set_attribute(element, &name, &value)?,
            AttributeAction::Invalid(kind) => {
                return Err(ViewModelError::WrongTypeForAttribute {
                    attribute: name,
                    kind,
                });
            }
        }
    }
    Ok(())
}

/// Vocabulary support check for `vocab` attributes. Every vocabulary is
/// currently accepted.
fn vocab_supported(_vocab: &str) -> bool {
    true
}

/// State threaded through one render call.
struct RenderState {
    root: Rc<dyn Binding>,
    /// Declared prefixes. `None` marks a namespace-only declaration.
    prefixes: HashMap<String, Option<Rc<dyn Binding>>>,
    /// Placeholder anchoring clones during an expansion. Detached between
    /// expansions.
    marker: NodeId,
    max_depth: usize,
}

impl RenderState {
    fn walk(
        &mut self,
        tree: &mut Tree,
        element: NodeId,
        model: Rc<dyn Binding>,
        depth: usize,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(ViewModelError::DepthLimitExceeded {
                max_depth: self.max_depth,
            });
        }
        let parent = tree.parent(element);

        if let Some(declaration) = tree.get_attribute(element, PREFIX) {
            let declaration = declaration.to_string();
            self.declare_prefix(&declaration)?;
        }

        let mut model = model;
        if let Some(resource) = tree.get_attribute(element, RESOURCE) {
            let resource = resource.to_string();
            model = self.resolve_resource(&resource, &model)?;
        }

        let supported = tree.get_attribute(element, VOCAB).is_none_or(vocab_supported);
        if supported {
            if let Some(property) = tree.get_attribute(element, PROPERTY) {
                let property = property.to_string();
                model = self.apply_property(tree, element, &property, model, depth)?;
            }
        }

        if let Some(parent) = parent {
            if !tree.is_ancestor(parent, element) {
                tracing::trace!(element = %element, "Element detached by its property");
                return Ok(());
            }
        }
        self.walk_children(tree, element, model, depth)
    }

    fn walk_children(
        &mut self,
        tree: &mut Tree,
        element: NodeId,
        model: Rc<dyn Binding>,
        depth: usize,
    ) -> Result<()> {
        for child in SnapshotNodeList::from_child_elements(tree, element) {
            if tree.parent(child) != Some(element) {
                continue;
            }
            self.walk(tree, child, model.clone(), depth + 1)?;
        }
        Ok(())
    }

    fn declare_prefix(&mut self, declaration: &str) -> Result<()> {
        let (name, member) = declaration
            .split_once(':')
            .map(|(name, member)| (name.trim(), member.trim()))
            .filter(|(name, member)| {
                !name.is_empty() && !member.is_empty() && !name.contains(char::is_whitespace)
            })
            .ok_or_else(|| ViewModelError::PrefixSyntax {
                value: declaration.to_string(),
            })?;

        if member.contains(':') {
            tracing::trace!(prefix = name, uri = member, "Namespace-only prefix");
            self.prefixes.insert(name.to_string(), None);
            return Ok(());
        }

        match resolve_member(&*self.root, member) {
            Some(Value::Object(bound)) => {
                tracing::trace!(prefix = name, member, "Bound prefix");
                self.prefixes.insert(name.to_string(), Some(bound));
                Ok(())
            }
            Some(other) => Err(ViewModelError::PrefixNotAnObject {
                prefix: name.to_string(),
                member: member.to_string(),
                kind: other.kind(),
            }),
            None => Err(ViewModelError::PrefixResolvingFailed {
                prefix: name.to_string(),
                member: member.to_string(),
            }),
        }
    }

    fn resolve_resource(
        &self,
        resource: &str,
        model: &Rc<dyn Binding>,
    ) -> Result<Rc<dyn Binding>> {
        let (target, name): (&dyn Binding, &str) = match resource.split_once(':') {
            Some((prefix, name)) => match self.prefixes.get(prefix) {
                Some(Some(bound)) => (&**bound, name),
                _ => {
                    return Err(ViewModelError::NoModelForPrefix {
                        prefix: prefix.to_string(),
                    });
                }
            },
            None => (&**model, resource),
        };
        match resolve_member(target, name.trim()) {
            Some(Value::Object(object)) => Ok(object),
            Some(other) => Err(ViewModelError::ResourceNotAnObject {
                resource: resource.to_string(),
                kind: other.kind(),
            }),
            None => Err(ViewModelError::ResourceResolvingFailed {
                resource: resource.to_string(),
            }),
        }
    }

    /// A prefixed property resolves against the prefix's model when the
    /// prefix is bound to one, otherwise against the current model.
    fn resolve_property(&self, property: &str, model: &Rc<dyn Binding>) -> Result<Value> {
        let (target, name): (&dyn Binding, &str) = match property.split_once(':') {
            Some((prefix, name)) => match self.prefixes.get(prefix) {
                Some(Some(bound)) => (&**bound, name),
                _ => (&**model, name),
            },
            None => (&**model, property),
        };
        resolve_member(target, name.trim()).ok_or_else(|| {
            ViewModelError::ResolvingPropertyFailed {
                property: property.to_string(),
            }
        })
    }

    /// Returns the model for the element's descendants.
    fn apply_property(
        &mut self,
        tree: &mut Tree,
        element: NodeId,
        property: &str,
        model: Rc<dyn Binding>,
        depth: usize,
    ) -> Result<Rc<dyn Binding>> {
        let value = self.resolve_property(property, &model)?;

        if tree.has_attribute(element, TYPEOF) {
            self.expand_typed(tree, element, property, value, depth)?;
            return Ok(model);
        }

        match PropertyAction::classify(value) {
            PropertyAction::Text(text) => tree.set_text_content(element, &text),
            PropertyAction::Iterate(items) => {
                self.expand_list(tree, element, property, items, depth)?;
            }
            PropertyAction::Remove => {
                tracing::trace!(property, "Removing element");
                tree.detach(element);
            }
            PropertyAction::Keep => {}
            PropertyAction::Bind(object) => {
                object_apply(tree, element, &*object)?;
                return Ok(object);
            }
            PropertyAction::Unsupported(kind) => {
                return Err(ViewModelError::UnsupportedTypeForProperty {
                    property: property.to_string(),
                    kind,
                });
            }
        }
        Ok(model)
    }

    /// Following siblings of `element` bound to the same property.
    fn same_property_siblings(tree: &Tree, element: NodeId, property: &str) -> Vec<NodeId> {
        tree.following_siblings(element)
            .into_iter()
            .filter(|s| tree.get_attribute(*s, PROPERTY) == Some(property))
            .collect()
    }

    /// Repeat `element` once per item.
    fn expand_list(
        &mut self,
        tree: &mut Tree,
        element: NodeId,
        property: &str,
        items: Vec<Value>,
        depth: usize,
    ) -> Result<()> {
        let parent =
            tree.parent_element(element)
                .ok_or_else(|| ViewModelError::IterableForRootElement {
                    property: property.to_string(),
                })?;
        let strays = Self::same_property_siblings(tree, element, property);
        tracing::trace!(property, items = items.len(), "Expanding list");

        tree.insert_before(parent, self.marker, Some(element))?;
        let mut instances = Vec::with_capacity(items.len());
        for item in items {
            let instance = tree.clone_node(element);
            tree.insert_before(parent, instance, Some(self.marker))?;
            instances.push((instance, item));
        }
        tree.detach(element);
        for stray in strays {
            tree.detach(stray);
        }
        tree.detach(self.marker);

        for (instance, item) in instances {
            match item {
                Value::Text(text) => tree.set_text_content(instance, &text),
                Value::Object(object) => self.bind_object(tree, instance, object, depth)?,
                other => {
                    return Err(ViewModelError::UnsupportedTypeForProperty {
                        property: property.to_string(),
                        kind: other.kind(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Instantiate the sibling template whose `typeof` matches each object.
    fn expand_typed(
        &mut self,
        tree: &mut Tree,
        element: NodeId,
        property: &str,
        value: Value,
        depth: usize,
    ) -> Result<()> {
        let parent =
            tree.parent_element(element)
                .ok_or_else(|| ViewModelError::IterableForRootElement {
                    property: property.to_string(),
                })?;
        let objects = match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(object) => Ok(object),
                    other => Err(ViewModelError::UnsupportedTypeForProperty {
                        property: property.to_string(),
                        kind: other.kind(),
                    }),
                })
                .collect::<Result<Vec<_>>>()?,
            Value::Object(object) => vec![object],
            other => {
                return Err(ViewModelError::UnsupportedTypeForProperty {
                    property: property.to_string(),
                    kind: other.kind(),
                });
            }
        };

        let mut templates = vec![element];
        templates.extend(Self::same_property_siblings(tree, element, property));

        let mut chosen = Vec::with_capacity(objects.len());
        for object in objects {
            let type_name =
                object
                    .type_of()
                    .ok_or_else(|| ViewModelError::MissingTypeOf {
                        property: property.to_string(),
                    })?;
            let template = templates
                .iter()
                .copied()
                .find(|t| tree.get_attribute(*t, TYPEOF) == Some(type_name.as_str()))
                .ok_or_else(|| ViewModelError::NoMatch {
                    property: property.to_string(),
                    type_name: type_name.clone(),
                })?;
            chosen.push((template, object));
        }
        tracing::trace!(property, instances = chosen.len(), "Expanding typed templates");

        tree.insert_before(parent, self.marker, Some(element))?;
        let mut instances = Vec::with_capacity(chosen.len());
        for (template, object) in chosen {
            let instance = tree.clone_node(template);
            tree.insert_before(parent, instance, Some(self.marker))?;
            instances.push((instance, object));
        }
        for template in templates {
            tree.detach(template);
        }
        tree.detach(self.marker);

        for (instance, object) in instances {
            self.bind_object(tree, instance, object, depth)?;
        }
        Ok(())
    }

    fn bind_object(
        &mut self,
        tree: &mut Tree,
        element: NodeId,
        object: Rc<dyn Binding>,
        depth: usize,
    ) -> Result<()> {
        object_apply(tree, element, &*object)?;
        self.walk_children(tree, element, object, depth)
    }
}
