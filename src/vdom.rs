//! Element descriptions: the immutable input that is rebuilt on every render call.
//!
//! Identity matters here. Strings, numbers and booleans compare by value,
//! while [`Handler`]s, [`Style`]s, [`Children`] and opaque objects compare by reference,
//! so cloning a description keeps it "unchanged" while rebuilding an equal-looking one does not.

use crate::{dom::Event, props::format_number};
use core::{any::Any, fmt};
use indexmap::IndexMap;
use std::rc::Rc;

/// A flat property mapping, in insertion order.
pub type Props = IndexMap<String, Value>;

/// A style property mapping, in insertion order.
pub type StyleMap = IndexMap<String, StyleValue>;

/// A node in the description tree.
#[derive(Debug, Clone)]
pub enum Node {
	Element(Element),
	Text(String),
}

impl Node {
	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}
}

impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}

impl From<&str> for Node {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Node {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<f64> for Node {
	fn from(number: f64) -> Self {
		Self::Text(format_number(number))
	}
}

impl From<i32> for Node {
	fn from(number: i32) -> Self {
		Self::Text(number.to_string())
	}
}

/// An element description: a tag name and its properties, including `children`.
#[derive(Debug, Clone)]
pub struct Element {
	tag: Rc<str>,
	props: Props,
}

impl Element {
	#[must_use]
	pub fn new(tag: impl Into<Rc<str>>) -> Self {
		Self::with_props(tag, Props::new())
	}

	#[must_use]
	pub fn with_props(tag: impl Into<Rc<str>>, props: Props) -> Self {
		Self { tag: tag.into(), props }
	}

	/// Sets a property, replacing any previous value under the same name.
	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.props.insert(name.into(), value.into());
		self
	}

	/// Shorthand for `.with("children", children)`.
	#[must_use]
	pub fn children(self, children: impl Into<Value>) -> Self {
		self.with("children", children)
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn props(&self) -> &Props {
		&self.props
	}

	#[must_use]
	pub fn prop(&self, name: &str) -> Option<&Value> {
		self.props.get(name)
	}

	/// The description's child nodes, if `children` holds nodes rather than literal text.
	#[must_use]
	pub fn child_nodes(&self) -> &[Node] {
		match self.props.get("children") {
			Some(Value::Children(children)) => children,
			_ => &[],
		}
	}
}

/// Returns a constructor for elements with the given tag name.
///
/// ```
/// use xml_reconciler::{props, vdom::element};
///
/// let link = element("link");
/// let node = link(props! { "foo" => "bar", "children" => "hello world" });
/// # drop(node);
/// ```
pub fn element(tag: impl Into<Rc<str>>) -> impl Fn(Props) -> Node {
	let tag = tag.into();
	move |props| Node::Element(Element::with_props(Rc::clone(&tag), props))
}

/// Builds a [`Props`] mapping from `name => value` pairs, keeping their order.
#[macro_export]
macro_rules! props {
	($($name:expr => $value:expr),* $(,)?) => {{
		#[allow(unused_mut)]
		let mut props = $crate::vdom::Props::new();
		$(props.insert(::std::string::String::from($name), $crate::vdom::Value::from($value));)*
		props
	}};
}

/// A property value.
#[derive(Clone)]
pub enum Value {
	String(String),
	Number(f64),
	Bool(bool),
	Null,
	Handler(Handler),
	Style(Style),
	Children(Children),
	/// Any other host value. Never valid as an attribute.
	Object(Rc<dyn Any>),
}

impl Value {
	/// JavaScript-style truthiness, which decides between setting and removing attributes on update.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::String(string) => !string.is_empty(),
			Value::Number(number) => *number != 0.0 && !number.is_nan(),
			Value::Bool(bool) => *bool,
			Value::Null => false,
			Value::Handler(_) | Value::Style(_) | Value::Children(_) | Value::Object(_) => true,
		}
	}

	/// The literal text of a string or number, if this is one.
	#[must_use]
	pub fn as_text(&self) -> Option<String> {
		match self {
			Value::String(string) => Some(string.clone()),
			Value::Number(number) => Some(format_number(*number)),
			_ => None,
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::String(string) => fmt::Debug::fmt(string, f),
			Value::Number(number) => fmt::Debug::fmt(number, f),
			Value::Bool(bool) => fmt::Debug::fmt(bool, f),
			Value::Null => f.write_str("null"),
			Value::Handler(handler) => fmt::Debug::fmt(handler, f),
			Value::Style(style) => fmt::Debug::fmt(style, f),
			Value::Children(children) => fmt::Debug::fmt(children, f),
			Value::Object(object) => write!(f, "Object({:p})", Rc::as_ptr(object)),
		}
	}
}

impl From<&str> for Value {
	fn from(string: &str) -> Self {
		Self::String(string.to_owned())
	}
}

impl From<String> for Value {
	fn from(string: String) -> Self {
		Self::String(string)
	}
}

impl From<f64> for Value {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl From<i32> for Value {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

impl From<bool> for Value {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(option: Option<T>) -> Self {
		option.map_or(Self::Null, Into::into)
	}
}

impl From<Handler> for Value {
	fn from(handler: Handler) -> Self {
		Self::Handler(handler)
	}
}

impl From<Style> for Value {
	fn from(style: Style) -> Self {
		Self::Style(style)
	}
}

impl From<Children> for Value {
	fn from(children: Children) -> Self {
		Self::Children(children)
	}
}

impl From<Node> for Value {
	fn from(node: Node) -> Self {
		Self::Children(vec![node].into())
	}
}

impl From<Element> for Value {
	fn from(element: Element) -> Self {
		Node::Element(element).into()
	}
}

impl From<Vec<Node>> for Value {
	fn from(nodes: Vec<Node>) -> Self {
		Self::Children(nodes.into())
	}
}

/// An event callback. Two handlers are the same only if they share one allocation.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
	pub fn new(callback: impl 'static + Fn(&Event)) -> Self {
		Self(Rc::new(callback))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.0).cast::<()>() == Rc::as_ptr(&other.0).cast::<()>()
	}
}

impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Handler({:p})", Rc::as_ptr(&self.0).cast::<()>())
	}
}

/// A shared style declaration map.
#[derive(Debug, Clone, Default)]
pub struct Style(Rc<StyleMap>);

impl Style {
	#[must_use]
	pub fn new(map: StyleMap) -> Self {
		Self(Rc::new(map))
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl core::ops::Deref for Style {
	type Target = StyleMap;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<K: Into<String>, V: Into<StyleValue>> core::iter::FromIterator<(K, V)> for Style {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// A single style declaration value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
	String(String),
	Number(f64),
	Bool(bool),
	Null,
}

impl StyleValue {
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			StyleValue::String(string) => !string.is_empty(),
			StyleValue::Number(number) => *number != 0.0 && !number.is_nan(),
			StyleValue::Bool(bool) => *bool,
			StyleValue::Null => false,
		}
	}
}

impl From<&str> for StyleValue {
	fn from(string: &str) -> Self {
		Self::String(string.to_owned())
	}
}

impl From<String> for StyleValue {
	fn from(string: String) -> Self {
		Self::String(string)
	}
}

impl From<f64> for StyleValue {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl From<i32> for StyleValue {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

impl From<bool> for StyleValue {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}

impl<T: Into<StyleValue>> From<Option<T>> for StyleValue {
	fn from(option: Option<T>) -> Self {
		option.map_or(Self::Null, Into::into)
	}
}

/// A shared list of child descriptions.
#[derive(Debug, Clone)]
pub struct Children(Rc<[Node]>);

impl Children {
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl core::ops::Deref for Children {
	type Target = [Node];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl From<Vec<Node>> for Children {
	fn from(nodes: Vec<Node>) -> Self {
		Self(nodes.into())
	}
}
