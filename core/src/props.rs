//! Descriptor properties.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::handler::Handler;
use crate::node::VirtualNode;

/// A single property value.
///
/// Floats compare by bit pattern, so `NaN` equals itself and an unchanged value is never
/// re-applied to the host.
#[derive(Debug, Clone)]
pub enum PropValue {
    /// Text value.
    Str(Cow<'static, str>),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Event listener. Only installed as a listener when the property name is an event name.
    Handler(Handler),
}

impl PropValue {
    /// Returns the string slice if this is a [`PropValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`PropValue::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the flag if this is a [`PropValue::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the handler if this is a [`PropValue::Handler`].
    #[must_use]
    pub const fn as_handler(&self) -> Option<&Handler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<&'static str> for PropValue {
    fn from(value: &'static str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl From<Cow<'static, str>> for PropValue {
    fn from(value: Cow<'static, str>) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Handler> for PropValue {
    fn from(value: Handler) -> Self {
        Self::Handler(value)
    }
}

/// Named properties plus the ordered child descriptors of a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    attributes: BTreeMap<Cow<'static, str>, PropValue>,
    children: Vec<VirtualNode>,
}

impl Props {
    /// Creates an empty property set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates a property set with only children.
    #[must_use]
    pub const fn with_children(children: Vec<VirtualNode>) -> Self {
        Self {
            attributes: BTreeMap::new(),
            children,
        }
    }

    /// Sets a property, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Builder-style [`Props::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Appends a child descriptor.
    pub fn push_child(&mut self, child: VirtualNode) {
        self.children.push(child);
    }

    /// Looks up a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    /// Looks up a string property.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    /// Looks up an integer property.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropValue::as_int)
    }

    /// Looks up a boolean property.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropValue::as_bool)
    }

    /// Returns `true` if the property is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Iterates over named properties in name order. Children are not included.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_ref(), value))
    }

    /// Returns the number of named properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if there are no named properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Returns the child descriptors.
    #[must_use]
    pub fn children(&self) -> &[VirtualNode] {
        &self.children
    }

    /// Fills every property missing from `self` with the value from `defaults`.
    ///
    /// Existing values win, including explicit ones that happen to equal a default.
    pub fn merge_defaults(&mut self, defaults: &Self) {
        for (name, value) in &defaults.attributes {
            self.attributes
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
