use super::{Element, Node};

/// Trait for values that can appear as a child in a tree description.
///
/// Strings become text, integers and floats become number nodes, `bool`,
/// `()` and `None` render nothing, and a `Vec` becomes a list that is
/// flattened into its parent.
pub trait IntoNode {
    fn into_node(self) -> Node;
}

impl IntoNode for Node {
    fn into_node(self) -> Node {
        self
    }
}

impl IntoNode for Element {
    fn into_node(self) -> Node {
        Node::Element(self)
    }
}

impl IntoNode for &str {
    fn into_node(self) -> Node {
        Node::Text(self.to_string())
    }
}

impl IntoNode for String {
    fn into_node(self) -> Node {
        Node::Text(self)
    }
}

impl IntoNode for &String {
    fn into_node(self) -> Node {
        Node::Text(self.clone())
    }
}

impl IntoNode for bool {
    fn into_node(self) -> Node {
        Node::Bool(self)
    }
}

impl IntoNode for () {
    fn into_node(self) -> Node {
        Node::Empty
    }
}

impl<T: IntoNode> IntoNode for Option<T> {
    fn into_node(self) -> Node {
        match self {
            Some(value) => value.into_node(),
            None => Node::Empty,
        }
    }
}

impl<T: IntoNode> IntoNode for Vec<T> {
    fn into_node(self) -> Node {
        Node::List(self.into_iter().map(IntoNode::into_node).collect())
    }
}

macro_rules! impl_into_node_int {
    ($($ty:ty),*) => {
        $(
            impl IntoNode for $ty {
                fn into_node(self) -> Node {
                    Node::Int(i64::from(self))
                }
            }
        )*
    };
}

impl_into_node_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_into_node_wide_int {
    ($($ty:ty),*) => {
        $(
            impl IntoNode for $ty {
                fn into_node(self) -> Node {
                    match i64::try_from(self) {
                        Ok(n) => Node::Int(n),
                        Err(_) => Node::Float(self as f64),
                    }
                }
            }
        )*
    };
}

impl_into_node_wide_int!(isize, u64, usize);

impl IntoNode for f32 {
    fn into_node(self) -> Node {
        Node::Float(f64::from(self))
    }
}

impl IntoNode for f64 {
    fn into_node(self) -> Node {
        Node::Float(self)
    }
}
