//! Immutable node descriptors.
//!
//! A [`VirtualNode`] describes what a piece of UI should look like for one render.
//! Descriptors are cheap to clone (their props are shared) and never mutated after
//! they are built; the reconciler compares a fresh descriptor tree against the
//! previously committed work-unit tree to decide which host mutations to perform.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::component::{ClassComponent, FunctionComponent};
use crate::error::RenderError;
use crate::handler::{Handler, LISTENER_PREFIX};
use crate::key::Key;
use crate::props::{PropValue, Props};

/// Property carrying the content of a text node.
pub const TEXT_VALUE: &str = "nodeValue";

/// What a descriptor renders to, resolved once when the descriptor is built.
#[derive(Clone)]
pub enum NodeType {
    /// A host element identified by its tag, such as `div` or `li`.
    Host(Cow<'static, str>),
    /// A host text node. Its content lives in the [`TEXT_VALUE`] property.
    Text,
    /// A non-rendering group whose children attach to the nearest host ancestor.
    Fragment,
    /// A stateless render function that may use hooks.
    Function(FunctionComponent),
    /// A component constructed from props and asked to render.
    Class(ClassComponent),
}

impl NodeType {
    /// Returns `true` if a work unit of type `self` may be reused for `other`.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Host(a), Self::Host(b)) => a == b,
            (Self::Text, Self::Text) | (Self::Fragment, Self::Fragment) => true,
            (Self::Function(a), Self::Function(b)) => a.same_component(b),
            (Self::Class(a), Self::Class(b)) => a.same_component(b),
            _ => false,
        }
    }

    /// Human readable label used in logs and reports.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Host(tag) => tag,
            Self::Text => "#text",
            Self::Fragment => "#fragment",
            Self::Function(component) => component.name(),
            Self::Class(component) => component.name(),
        }
    }

    /// Returns `true` for types that own a host node.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        matches!(self, Self::Host(_) | Self::Text)
    }

    /// Checks that the type can be rendered.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidDescriptorType`] for host tags that are empty,
    /// contain whitespace, or start with `#` (reserved for built-in markers).
    pub fn validate(&self) -> Result<(), RenderError> {
        match self {
            Self::Host(tag) => validate_tag(tag),
            _ => Ok(()),
        }
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => f.debug_tuple("Host").field(tag).finish(),
            Self::Text => f.write_str("Text"),
            Self::Fragment => f.write_str("Fragment"),
            Self::Function(component) => f.debug_tuple("Function").field(&component.name()).finish(),
            Self::Class(component) => f.debug_tuple("Class").field(&component.name()).finish(),
        }
    }
}

fn validate_tag(tag: &str) -> Result<(), RenderError> {
    let reason = if tag.is_empty() {
        "host tag is empty"
    } else if tag.chars().any(char::is_whitespace) {
        "host tag contains whitespace"
    } else if tag.starts_with('#') {
        "host tags starting with `#` are reserved"
    } else {
        return Ok(());
    };
    Err(RenderError::InvalidDescriptorType {
        type_name: tag.to_owned(),
        reason,
    })
}

/// Immutable description of one node of the UI.
#[derive(Clone, PartialEq)]
pub struct VirtualNode {
    node_type: NodeType,
    key: Option<Key>,
    props: Rc<Props>,
}

impl VirtualNode {
    /// Creates a descriptor from its parts.
    ///
    /// Text nodes are matched by position only, so a key given to one is dropped.
    #[must_use]
    pub fn new(node_type: NodeType, key: Option<Key>, props: Props) -> Self {
        let key = key.filter(|_| !matches!(node_type, NodeType::Text));
        Self {
            node_type,
            key,
            props: Rc::new(props),
        }
    }

    /// Returns the descriptor type.
    #[must_use]
    pub const fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    /// Returns the explicit key, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Returns the shared props.
    #[must_use]
    pub const fn props(&self) -> &Rc<Props> {
        &self.props
    }

    /// Returns the child descriptors.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        self.props.children()
    }

    /// Returns a copy of this descriptor with the given key.
    ///
    /// Has no effect on text nodes.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        if !matches!(self.node_type, NodeType::Text) {
            self.key = Some(key.into());
        }
        self
    }
}

impl fmt::Debug for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("VirtualNode");
        debug.field("type", &self.node_type);
        if let Some(key) = &self.key {
            debug.field("key", key);
        }
        debug.field("props", &self.props).finish()
    }
}

impl From<&'static str> for VirtualNode {
    fn from(value: &'static str) -> Self {
        text(value)
    }
}

impl From<String> for VirtualNode {
    fn from(value: String) -> Self {
        text(value)
    }
}

impl From<ElementBuilder> for VirtualNode {
    fn from(value: ElementBuilder) -> Self {
        value.build()
    }
}

/// Starts building a host element descriptor.
///
/// The tag is validated when the engine dispatches the node; use
/// [`ElementBuilder::try_new`] to fail early instead.
pub fn element(tag: impl Into<Cow<'static, str>>) -> ElementBuilder {
    ElementBuilder::new(NodeType::Host(tag.into()))
}

/// Creates a text descriptor.
pub fn text(value: impl Into<Cow<'static, str>>) -> VirtualNode {
    VirtualNode::new(
        NodeType::Text,
        None,
        Props::new().with(TEXT_VALUE, PropValue::Str(value.into())),
    )
}

/// Creates a fragment grouping the given children without a host node of its own.
pub fn fragment<I>(children: I) -> VirtualNode
where
    I: IntoIterator,
    I::Item: Into<VirtualNode>,
{
    ElementBuilder::new(NodeType::Fragment).children(children).build()
}

/// Builder for [`VirtualNode`]s of any type.
#[derive(Debug, Clone)]
#[must_use]
pub struct ElementBuilder {
    node_type: NodeType,
    key: Option<Key>,
    props: Props,
}

impl ElementBuilder {
    /// Creates a builder for the given type with empty props.
    pub const fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            key: None,
            props: Props::new(),
        }
    }

    /// Creates a host element builder, validating the tag immediately.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidDescriptorType`] if the tag is not a valid host tag.
    pub fn try_new(tag: impl Into<Cow<'static, str>>) -> Result<Self, RenderError> {
        let node_type = NodeType::Host(tag.into());
        node_type.validate()?;
        Ok(Self::new(node_type))
    }

    /// Sets the identity key.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets a property.
    pub fn prop(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name, value);
        self
    }

    /// Installs a listener for `event`, stored under the `on<event>` property.
    pub fn on(mut self, event: &str, handler: impl Into<Handler>) -> Self {
        self.props
            .insert(format!("{LISTENER_PREFIX}{event}"), PropValue::Handler(handler.into()));
        self
    }

    /// Appends a child.
    pub fn child(mut self, child: impl Into<VirtualNode>) -> Self {
        self.props.push_child(child.into());
        self
    }

    /// Appends a child when present.
    pub fn maybe_child(self, child: Option<impl Into<VirtualNode>>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }

    /// Appends every child of the iterator in order.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VirtualNode>,
    {
        for child in children {
            self.props.push_child(child.into());
        }
        self
    }

    /// Appends a text child.
    pub fn text(self, value: impl Into<Cow<'static, str>>) -> Self {
        self.child(text(value))
    }

    /// Finishes the descriptor, filling in component default props.
    #[must_use]
    pub fn build(self) -> VirtualNode {
        let Self {
            node_type,
            key,
            mut props,
        } = self;
        match &node_type {
            NodeType::Function(component) => props.merge_defaults(component.defaults()),
            NodeType::Class(component) => props.merge_defaults(component.defaults()),
            _ => {}
        }
        VirtualNode::new(node_type, key, props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_children_become_text_nodes() {
        let node = element("p").text("count: ").child(String::from("0")).build();
        assert_eq!(node.children().len(), 2);
        for child in node.children() {
            assert_eq!(child.node_type(), &NodeType::Text);
            assert!(child.key().is_none());
        }
        assert_eq!(node.children()[0].props().get_str(TEXT_VALUE), Some("count: "));
    }

    #[test]
    fn text_nodes_never_carry_keys() {
        assert_eq!(text("a").with_key("k").key(), None);
        let built = ElementBuilder::new(NodeType::Text).key("k").build();
        assert_eq!(built.key(), None);
        assert_eq!(element("li").build().with_key("k").key(), Some(&Key::from("k")));
    }

    #[test]
    fn host_types_compare_by_tag() {
        assert!(NodeType::Host("li".into()).same_type(&NodeType::Host("li".into())));
        assert!(!NodeType::Host("li".into()).same_type(&NodeType::Host("p".into())));
        assert!(!NodeType::Host("li".into()).same_type(&NodeType::Text));
    }

    #[test]
    fn invalid_tags_are_rejected() {
        for tag in ["", "my tag", "#text"] {
            let err = ElementBuilder::try_new(tag).unwrap_err();
            assert!(matches!(err, RenderError::InvalidDescriptorType { .. }), "{tag:?}");
        }
        assert!(ElementBuilder::try_new("section").is_ok());
    }

    #[test]
    fn missing_children_are_skipped() {
        let node = element("div")
            .maybe_child(None::<VirtualNode>)
            .maybe_child(Some("shown"))
            .build();
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn listeners_are_stored_as_props() {
        let node = element("button").on("Click", |_: &crate::Event| {}).build();
        assert!(node.props().get("onClick").and_then(PropValue::as_handler).is_some());
    }
}
