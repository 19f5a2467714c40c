//! Descriptor Nodes
//!
//! A [`VNode`] describes one node to render: a host element, a text run, a
//! fragment, or a component invocation. Descriptors are immutable and cheap
//! to clone (a shared pointer), so the same descriptor can be handed back
//! from a memoized component and recognised by identity.
//!
//! # Normalization
//!
//! [`create_element`] accepts loosely shaped children through [`Child`] and
//! normalizes them:
//!
//! - empty values (`None`, `()`, booleans) vanish
//! - strings and numbers become text descriptors
//! - nested lists are flattened into the parent's children, at any depth
//! - fragment descriptors are spliced: their children are hoisted into the
//!   parent instead of keeping a wrapper node
//!
//! A descriptor built without children has no `children` prop at all.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::value::{format_number, Value};
use crate::error::ComponentError;

/// Name of the prop that holds child descriptors.
pub const CHILDREN: &str = "children";

/// Name of the prop that holds a text descriptor's content.
pub const NODE_VALUE: &str = "nodeValue";

/// Name of the construction-time prop that becomes [`VNode::key`].
pub const KEY: &str = "key";

/// What a component returns from a render.
pub type RenderResult = Result<Option<VNode>, ComponentError>;

/// Unique identifier for a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A component type: a named render function.
///
/// Two `Component` values are the same type only if one was cloned from the
/// other. Creating a second component from an identical closure yields a
/// distinct type, which the reconciler treats as a type change.
#[derive(Clone)]
pub struct Component {
    id: ComponentId,
    name: Rc<str>,
    render: Rc<dyn Fn(&Props) -> RenderResult>,
    memoized: bool,
}

impl Component {
    /// Create a component type with a display name.
    ///
    /// The name is part of every identity path below this component, so it
    /// should be stable across renders.
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props) -> RenderResult + 'static,
    {
        Self {
            id: ComponentId::new(),
            name: Rc::from(name),
            render: Rc::new(render),
            memoized: false,
        }
    }

    /// A render-skip wrapper: when it hands back the descriptor it returned
    /// last time, the subtree below is kept without re-invoking anything.
    pub(crate) fn memoizing<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props) -> RenderResult + 'static,
    {
        Self {
            memoized: true,
            ..Self::new(name, render)
        }
    }

    pub(crate) fn is_memoizing(&self) -> bool {
        self.memoized
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the render function.
    ///
    /// Hooks called inside bind to whatever path is currently rendering, so
    /// this is only meaningful when called by the reconciler.
    pub(crate) fn render(&self, props: &Props) -> RenderResult {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// The type of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// A host element with the given tag name.
    Host(Rc<str>),
    /// A text run; content lives in the `nodeValue` prop.
    Text,
    /// A grouping node with no document node of its own.
    Fragment,
    /// A component invocation.
    Component(Component),
}

impl NodeType {
    /// The tag used in identity paths. Host tags, component names and the
    /// text/fragment sentinels live in disjoint namespaces so a `div` element
    /// and a component called `div` never share a path.
    pub fn path_tag(&self) -> String {
        match self {
            NodeType::Host(tag) => format!("e{}", tag),
            NodeType::Component(component) => format!("c{}", component.name()),
            NodeType::Text => "stext".to_owned(),
            NodeType::Fragment => "sfragment".to_owned(),
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, NodeType::Component(_))
    }
}

impl From<&str> for NodeType {
    fn from(tag: &str) -> Self {
        NodeType::Host(Rc::from(tag))
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        NodeType::Host(Rc::from(tag))
    }
}

impl From<Component> for NodeType {
    fn from(component: Component) -> Self {
        NodeType::Component(component)
    }
}

impl From<&Component> for NodeType {
    fn from(component: &Component) -> Self {
        NodeType::Component(component.clone())
    }
}

/// Props of a descriptor, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Props(IndexMap<String, Value>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Builder-style key; split out of the props by [`create_element`].
    pub fn key(self, key: impl Into<Value>) -> Self {
        self.with(KEY, key)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Child descriptors, empty if there is no `children` prop.
    pub fn children(&self) -> &[VNode] {
        self.get(CHILDREN)
            .and_then(Value::as_children)
            .unwrap_or(&[])
    }

    pub(crate) fn as_map(&self) -> &IndexMap<String, Value> {
        &self.0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

struct VNodeData {
    ty: NodeType,
    key: Option<Rc<str>>,
    props: Props,
}

/// An immutable descriptor node.
#[derive(Clone)]
pub struct VNode(Rc<VNodeData>);

impl VNode {
    pub(crate) fn from_parts(ty: NodeType, key: Option<Rc<str>>, props: Props) -> Self {
        Self(Rc::new(VNodeData { ty, key, props }))
    }

    pub fn ty(&self) -> &NodeType {
        &self.0.ty
    }

    pub fn key(&self) -> Option<&str> {
        self.0.key.as_deref()
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    pub fn children(&self) -> &[VNode] {
        self.0.props.children()
    }

    /// Content of a text descriptor.
    pub fn text(&self) -> Option<&str> {
        match self.ty() {
            NodeType::Text => self.props().get(NODE_VALUE).and_then(Value::as_str),
            _ => None,
        }
    }

    /// Whether both handles refer to the same descriptor.
    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNode")
            .field("ty", &self.0.ty)
            .field("key", &self.0.key)
            .field("props", &self.0.props)
            .finish()
    }
}

/// A renderable value accepted as a child.
#[derive(Debug, Clone, Default)]
pub enum Child {
    #[default]
    Empty,
    Text(String),
    Node(VNode),
    List(Vec<Child>),
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Empty
    }
}

impl From<bool> for Child {
    fn from(_: bool) -> Self {
        Child::Empty
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Text(s.to_owned())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Text(s)
    }
}

impl From<&String> for Child {
    fn from(s: &String) -> Self {
        Child::Text(s.clone())
    }
}

macro_rules! child_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Child {
                fn from(n: $t) -> Self {
                    Child::Text(format_number(n as f64))
                }
            }
        )*
    };
}

child_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Child::Node(node)
    }
}

impl From<&VNode> for Child {
    fn from(node: &VNode) -> Self {
        Child::Node(node.clone())
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Child::Empty)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Child::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Child>, const N: usize> From<[T; N]> for Child {
    fn from(items: [T; N]) -> Self {
        Child::List(items.into_iter().map(Into::into).collect())
    }
}

/// Build a heterogeneous child list: `children![h("b", ..), "text", 3]`.
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        $crate::Child::List(vec![$($crate::Child::from($child)),*])
    };
}

fn flatten_into(child: Child, out: &mut Vec<VNode>) {
    match child {
        Child::Empty => {}
        Child::Text(text) => out.push(text_node(text)),
        Child::Node(node) => match node.ty() {
            NodeType::Fragment => out.extend(node.children().iter().cloned()),
            _ => out.push(node),
        },
        Child::List(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
    }
}

/// Normalize a child value into a flat descriptor list.
pub fn normalize_children(children: impl Into<Child>) -> Vec<VNode> {
    let mut out = Vec::new();
    flatten_into(children.into(), &mut out);
    out
}

fn text_node(text: String) -> VNode {
    VNode::from_parts(
        NodeType::Text,
        None,
        Props::new().with(NODE_VALUE, text),
    )
}

/// Create a text descriptor.
pub fn text(content: impl Into<String>) -> VNode {
    text_node(content.into())
}

/// Build a descriptor from a type, props and children.
///
/// A `key` entry in `props` is removed and becomes the descriptor's key;
/// a `Null` key counts as no key.
pub fn create_element(
    ty: impl Into<NodeType>,
    mut props: Props,
    children: impl Into<Child>,
) -> VNode {
    let key = props
        .remove(KEY)
        .filter(|k| !k.is_null())
        .map(|k| Rc::from(k.to_attribute_string()));

    let children = normalize_children(children);
    if children.is_empty() {
        props.remove(CHILDREN);
    } else {
        props.insert(CHILDREN, Value::Children(Rc::from(children)));
    }

    VNode::from_parts(ty.into(), key, props)
}

/// Shorthand for [`create_element`].
pub fn h(ty: impl Into<NodeType>, props: Props, children: impl Into<Child>) -> VNode {
    create_element(ty, props, children)
}

/// Create a fragment descriptor.
pub fn fragment(children: impl Into<Child>) -> VNode {
    create_element(NodeType::Fragment, Props::new(), children)
}
