/*
 * binding.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! View model values and member resolution.
//!
//! A view model is anything implementing [`Binding`]. The renderer never
//! inspects a model directly; it asks for members by name through
//! [`resolve_member`], which tries the lookups in a fixed order:
//!
//! 1. a method named exactly `name`
//! 2. a method named `get` + `Name`
//! 3. the catch-all method hook
//! 4. a field named exactly `name`
//! 5. the catch-all field hook
//!
//! Two models are provided: [`ObjectModel`] for view models built in code
//! and [`JsonModel`] for models read from JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Sentinel values that override the default dispatch on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Leave the node or attribute untouched.
    Ignore,
    /// Delete the node or attribute.
    Remove,
}

/// A value produced by a view model.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Object(Rc<dyn Binding>),
    Signal(Signal),
}

impl Value {
    /// Wrap a binding as an object value.
    pub fn object(binding: impl Binding + 'static) -> Self {
        Value::Object(Rc::new(binding))
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Signal(_) => "signal",
        }
    }

    pub fn as_object(&self) -> Option<&Rc<dyn Binding>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(o) => f
                .debug_tuple("Object")
                .field(&o.type_of().unwrap_or_else(|| "?".to_string()))
                .finish(),
            Value::Signal(s) => f.debug_tuple("Signal").field(s).finish(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Signal> for Value {
    fn from(s: Signal) -> Self {
        Value::Signal(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<ObjectModel> for Value {
    fn from(model: ObjectModel) -> Self {
        Value::object(model)
    }
}

impl From<JsonModel> for Value {
    fn from(model: JsonModel) -> Self {
        Value::object(model)
    }
}

/// Capability interface of a view model object.
///
/// Every lookup returns `None` when the object has no such member; the
/// caller then moves on to the next lookup in the resolution order.
pub trait Binding {
    /// Invoke a method named exactly `name`.
    fn method(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Catch-all method invocation for names without a method.
    fn call_dynamic(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Read a field named exactly `name`.
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Catch-all field read for names without a field.
    fn field_dynamic(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Runtime type name, matched against `typeof` attributes.
    fn type_of(&self) -> Option<String> {
        None
    }

    /// Text form of the object, used as element content.
    fn to_text(&self) -> Option<Value> {
        None
    }
}

/// Resolve `name` on `model` in the fixed member order.
pub fn resolve_member(model: &dyn Binding, name: &str) -> Option<Value> {
    model
        .method(name)
        .or_else(|| model.method(&getter_name(name)))
        .or_else(|| model.call_dynamic(name))
        .or_else(|| model.field(name))
        .or_else(|| model.field_dynamic(name))
}

fn getter_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("get{}{}", first.to_uppercase(), chars.as_str()),
        None => "get".to_string(),
    }
}

/// Convert an attribute name to the member name it binds to.
///
/// Words are separated by `-` and `:`; the first word is lowercased, the
/// rest are capitalized.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, word) in name
        .split(['-', ':'])
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(&chars.as_str().to_lowercase());
            }
        }
    }
    out
}

/// What a property result does to its element.
#[derive(Clone)]
pub enum PropertyAction {
    /// Replace the element content with text.
    Text(String),
    /// Repeat the element once per item.
    Iterate(Vec<Value>),
    /// Delete the element.
    Remove,
    /// Leave the element as it is.
    Keep,
    /// Bind the element to a nested object.
    Bind(Rc<dyn Binding>),
    /// Not bindable; holds [`Value::kind`].
    Unsupported(&'static str),
}

impl PropertyAction {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Text(s) => PropertyAction::Text(s),
            Value::List(items) => PropertyAction::Iterate(items),
            Value::Signal(Signal::Remove) | Value::Bool(false) => PropertyAction::Remove,
            Value::Signal(Signal::Ignore) | Value::Bool(true) | Value::Null => {
                PropertyAction::Keep
            }
            Value::Object(o) => PropertyAction::Bind(o),
            other @ Value::Number(_) => PropertyAction::Unsupported(other.kind()),
        }
    }
}

/// What an attribute binding does to its attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeAction {
    Keep,
    Remove,
    Set(String),
    /// Not bindable; holds [`Value::kind`].
    Invalid(&'static str),
}

impl AttributeAction {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Signal(Signal::Ignore) | Value::Bool(true) | Value::Null => {
                AttributeAction::Keep
            }
            Value::Signal(Signal::Remove) | Value::Bool(false) => AttributeAction::Remove,
            Value::Text(s) => AttributeAction::Set(s),
            other => AttributeAction::Invalid(other.kind()),
        }
    }
}

type Thunk = Box<dyn Fn() -> Value>;
type Hook = Box<dyn Fn(&str) -> Option<Value>>;

/// A view model assembled in code.
///
/// # Example
///
/// ```rust
/// use weft_template::binding::{resolve_member, ObjectModel, Value};
///
/// let model = ObjectModel::new()
///     .field("title", "Hello")
///     .method("getCount", || Value::from("3"));
///
/// assert!(matches!(resolve_member(&model, "title"), Some(Value::Text(t)) if t == "Hello"));
/// assert!(matches!(resolve_member(&model, "count"), Some(Value::Text(t)) if t == "3"));
/// ```
#[derive(Default)]
pub struct ObjectModel {
    type_name: Option<String>,
    text: Option<Value>,
    fields: BTreeMap<String, Value>,
    methods: BTreeMap<String, Thunk>,
    call_hook: Option<Hook>,
    field_hook: Option<Hook>,
}

impl ObjectModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type name reported to `typeof` matching.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the text written into the bound element.
    pub fn with_text(mut self, text: impl Into<Value>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn method(mut self, name: impl Into<String>, f: impl Fn() -> Value + 'static) -> Self {
        self.methods.insert(name.into(), Box::new(f));
        self
    }

    /// Catch-all method hook.
    pub fn on_call(mut self, hook: impl Fn(&str) -> Option<Value> + 'static) -> Self {
        self.call_hook = Some(Box::new(hook));
        self
    }

    /// Catch-all field hook.
    pub fn on_field(mut self, hook: impl Fn(&str) -> Option<Value> + 'static) -> Self {
        self.field_hook = Some(Box::new(hook));
        self
    }

    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl Binding for ObjectModel {
    fn method(&self, name: &str) -> Option<Value> {
        self.methods.get(name).map(|f| f())
    }

    fn call_dynamic(&self, name: &str) -> Option<Value> {
        self.call_hook.as_ref().and_then(|hook| hook(name))
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn field_dynamic(&self, name: &str) -> Option<Value> {
        self.field_hook.as_ref().and_then(|hook| hook(name))
    }

    fn type_of(&self) -> Option<String> {
        self.type_name.clone()
    }

    fn to_text(&self) -> Option<Value> {
        self.text.clone()
    }
}

/// Key holding the type name of a JSON object.
pub const JSON_TYPE_KEY: &str = "@type";

/// Key holding the text of a JSON object.
pub const JSON_VALUE_KEY: &str = "@value";

/// A view model backed by a JSON object.
///
/// Members are the object's keys. Nested objects become nested models,
/// arrays become lists and numbers bind as their text form.
#[derive(Debug, Clone, Default)]
pub struct JsonModel {
    map: serde_json::Map<String, serde_json::Value>,
}

impl JsonModel {
    pub fn new(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { map }
    }
}

/// Convert JSON into a view model value.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Text(n.to_string()),
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Array(items) => {
            Value::List(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => Value::object(JsonModel::new(map)),
    }
}

impl Binding for JsonModel {
    fn field(&self, name: &str) -> Option<Value> {
        self.map.get(name).cloned().map(json_to_value)
    }

    fn type_of(&self) -> Option<String> {
        self.map
            .get(JSON_TYPE_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn to_text(&self) -> Option<Value> {
        self.map.get(JSON_VALUE_KEY).cloned().map(json_to_value)
    }
}
