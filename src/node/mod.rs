//! Tree descriptions: host-independent, immutable descriptions of what to display.
//!
//! A component returns a [`Node`] on every render pass. Nodes are plain data and
//! are thrown away once the render pass has materialized them into host nodes.
//!
//! ```ignore
//! let view = element("div")
//!     .class_name("app")
//!     .child(element!("h1", "Hello"))
//!     .child(element!("p", "Count: ", count))
//!     .child(element!("button", "Increment").on("click", move |_| set_count.update(|c| c + 1)));
//! ```

pub mod into_node;

use std::fmt;
use std::rc::Rc;

use crate::host::{Event, EventHandler};

pub use into_node::IntoNode;

/// A description of one node in the display tree.
#[derive(Clone, Debug, Default)]
pub enum Node {
    Element(Element),
    Text(String),
    Int(i64),
    Float(f64),
    /// Booleans render nothing. They exist so `cond && view`-style children can
    /// be expressed as `cond.then(|| view)` or a plain `false`.
    Bool(bool),
    #[default]
    Empty,
    /// A run of children that is flattened into the parent.
    List(Vec<Node>),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// Formats a float the way a browser stringifies numbers for the common cases.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        // Covers -0.0 as well
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Value of an element attribute.
#[derive(Clone)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Style properties, applied one by one to the host node.
    Style(Vec<(String, String)>),
    Handler(EventHandler),
}

impl AttrValue {
    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        AttrValue::Handler(Rc::new(f))
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            AttrValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            AttrValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            AttrValue::Style(entries) => f.debug_tuple("Style").field(entries).finish(),
            AttrValue::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

macro_rules! impl_attr_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttrValue {
                fn from(value: $ty) -> Self {
                    AttrValue::Number(value as f64)
                }
            }
        )*
    };
}

impl_attr_number!(i32, i64, u32, u64, usize, f32, f64);

/// An element description: a tag, attributes in insertion order, and children.
#[derive(Clone, Debug)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, AttrValue)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute. Setting a name twice replaces the earlier value.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set_attr(name.into(), value.into());
        self
    }

    pub fn class_name(self, class: impl Into<String>) -> Self {
        self.attr("className", AttrValue::Text(class.into()))
    }

    /// Add one style property. All properties are collected into a single
    /// `style` attribute.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        let property = property.into();
        let value = value.into();

        match self.attrs.iter_mut().find(|(name, _)| name == "style") {
            Some((_, AttrValue::Style(entries))) => {
                match entries.iter_mut().find(|(existing, _)| *existing == property) {
                    Some(entry) => entry.1 = value,
                    None => entries.push((property, value)),
                }
            }
            Some((_, other)) => *other = AttrValue::Style(vec![(property, value)]),
            None => self
                .attrs
                .push(("style".to_string(), AttrValue::Style(vec![(property, value)]))),
        }

        self
    }

    /// Register an event handler. `on("click", ..)` is stored as `onclick`.
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        self.attr(format!("on{}", event), AttrValue::handler(handler))
    }

    pub fn child(mut self, child: impl IntoNode) -> Self {
        self.children.push(child.into_node());
        self
    }

    /// Append an iterator of children. They are kept as one list and flattened
    /// into this element when it is materialized.
    pub fn children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoNode,
    {
        self.children.push(Node::List(
            children.into_iter().map(IntoNode::into_node).collect(),
        ));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, AttrValue)] {
        &self.attrs
    }

    pub fn attr_value(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn child_nodes(&self) -> &[Node] {
        &self.children
    }

    fn set_attr(&mut self, name: String, value: AttrValue) {
        match self.attrs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name, value)),
        }
    }
}

pub fn element(tag: impl Into<String>) -> Element {
    Element::new(tag)
}

pub fn text(content: impl Into<String>) -> Node {
    Node::Text(content.into())
}
