//! The host adapter: the hook points the reconciliation driver calls into, and their XML implementation.
//!
//! # Call order
//!
//! - Mounting a subtree: [`create_instance`](`HostConfig::create_instance`) or [`create_text_instance`](`HostConfig::create_text_instance`),
//!   then recursively mounting the children with [`append_initial_child`](`HostConfig::append_initial_child`),
//!   then [`finalize_initial_children`](`HostConfig::finalize_initial_children`).
//!   Only then is the finished subtree attached to its parent,
//!   and only after that does [`commit_mount`](`HostConfig::commit_mount`) run where requested.
//! - Updating: [`prepare_update`](`HostConfig::prepare_update`), then [`commit_update`](`HostConfig::commit_update`) with its payload.
//! - Removing: [`remove_child`](`HostConfig::remove_child`) or [`remove_child_from_container`](`HostConfig::remove_child_from_container`).

use crate::{
	dom::{is_xml_name, Document, NodeId},
	error::Error,
	props::{attribute_name, event_type, shallow_diff, ChangedKeys, TypeCategory, AUTO_FOCUS, CHILDREN, STYLE},
	style::apply_styles,
	vdom::{Props, Style, StyleValue, Value},
};
use core::{fmt::Debug, hash::Hash};
use tracing::{instrument, trace};

/// The named hook points a host tree implements for the reconciliation driver.
pub trait HostConfig {
	type Instance: Copy + Eq + Hash + Debug;

	/// Creates a detached element. Properties are applied later, in [`finalize_initial_children`](`HostConfig::finalize_initial_children`).
	fn create_instance(&mut self, tag: &str, props: &Props) -> Self::Instance;

	/// Creates a detached text node, whose value is later updated in place.
	fn create_text_instance(&mut self, text: &str) -> Self::Instance;

	fn append_initial_child(&mut self, parent: Self::Instance, child: Self::Instance);

	/// Applies the initial properties to a freshly created element.
	///
	/// Returns whether the element needs [`commit_mount`](`HostConfig::commit_mount`) once attached.
	///
	/// # Errors
	///
	/// Iff a property value has a type that is not valid for its name,
	/// or the tag or an attribute name can't be written as markup.
	fn finalize_initial_children(&mut self, instance: Self::Instance, tag: &str, props: &Props) -> Result<bool, Error>;

	/// Whether the element's children are literal text content rather than child nodes.
	fn should_set_text_content(&self, tag: &str, props: &Props) -> bool;

	/// Computes the update payload: the names of changed properties.
	fn prepare_update(&self, instance: Self::Instance, tag: &str, old_props: &Props, new_props: &Props) -> ChangedKeys;

	/// Applies exactly the changes listed in `payload`.
	///
	/// # Errors
	///
	/// Iff a changed property value has a type that is not valid for its name,
	/// or a changed attribute name can't be written as markup.
	fn commit_update(&mut self, instance: Self::Instance, payload: &[String], tag: &str, old_props: &Props, new_props: &Props) -> Result<(), Error>;

	fn commit_mount(&mut self, instance: Self::Instance, tag: &str, props: &Props);

	fn commit_text_update(&mut self, text_instance: Self::Instance, old_text: &str, new_text: &str);

	fn reset_text_content(&mut self, instance: Self::Instance);

	fn append_child(&mut self, parent: Self::Instance, child: Self::Instance);

	fn append_child_to_container(&mut self, container: Self::Instance, child: Self::Instance);

	fn insert_before(&mut self, parent: Self::Instance, child: Self::Instance, before: Self::Instance);

	fn insert_in_container_before(&mut self, container: Self::Instance, child: Self::Instance, before: Self::Instance);

	fn remove_child(&mut self, parent: Self::Instance, child: Self::Instance);

	fn remove_child_from_container(&mut self, container: Self::Instance, child: Self::Instance);

	/// Releases a subtree that failed to materialize and was never attached.
	fn discard_instance(&mut self, instance: Self::Instance);

	/// Creates a node that can serve as a render target.
	fn create_container(&mut self, tag: &str) -> Self::Instance;

	/// Removes all children of a container.
	fn clear_container(&mut self, container: Self::Instance);

	/// Serializes the container's current children.
	fn serialize_container(&self, container: Self::Instance) -> String;
}

/// Elements that can take focus through `autoFocus`.
const FOCUSABLE: &[&str] = &["button", "input", "select", "textarea"];

/// A [`HostConfig`] over a [`Document`].
#[derive(Debug, Default)]
pub struct XmlHost {
	document: Document,
}

impl XmlHost {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	pub fn document_mut(&mut self) -> &mut Document {
		&mut self.document
	}

	fn set_text_if_literal(&mut self, instance: NodeId, children: &Value) {
		if let Some(text) = children.as_text() {
			self.document.set_text_content(instance, &text)
		}
	}
}

fn style_of(value: Option<&Value>) -> Result<Option<&Style>, Error> {
	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Style(style)) => Ok(Some(style)),
		Some(other) => Err(Error::InvalidStyle { category: TypeCategory::of(other) }),
	}
}

fn check_auto_focus(value: &Value) -> Result<(), Error> {
	match value {
		Value::Bool(_) | Value::String(_) | Value::Number(_) | Value::Null => Ok(()),
		other => Err(Error::InvalidPropertyType {
			name: AUTO_FOCUS.to_owned(),
			category: TypeCategory::of(other),
		}),
	}
}

fn check_name(name: &str) -> Result<&str, Error> {
	if is_xml_name(name) {
		Ok(name)
	} else {
		Err(Error::InvalidName { name: name.to_owned() })
	}
}

fn invalid_attribute(name: &str, value: &Value) -> Error {
	Error::InvalidPropertyType {
		name: name.to_owned(),
		category: TypeCategory::of(value),
	}
}

impl HostConfig for XmlHost {
	type Instance = NodeId;

	fn create_instance(&mut self, tag: &str, _props: &Props) -> NodeId {
		self.document.create_element(tag)
	}

	fn create_text_instance(&mut self, text: &str) -> NodeId {
		self.document.create_text_node(text)
	}

	fn append_initial_child(&mut self, parent: NodeId, child: NodeId) {
		self.document.append_child(parent, child)
	}

	#[instrument(skip(self, props))]
	fn finalize_initial_children(&mut self, instance: NodeId, tag: &str, props: &Props) -> Result<bool, Error> {
		check_name(tag)?;
		for (name, value) in props {
			match name.as_str() {
				STYLE => {
					if let Some(style) = style_of(Some(value))? {
						apply_styles(&mut self.document, instance, style.iter().map(|(name, value)| (name.as_str(), value)))
					}
				}
				CHILDREN => self.set_text_if_literal(instance, value),
				AUTO_FOCUS => check_auto_focus(value)?,
				name => {
					if let Some(event_type) = event_type(name) {
						match value {
							Value::Handler(handler) => self.document.add_event_listener(instance, &event_type, handler.clone()),
							Value::Null => (),
							other => {
								return Err(Error::InvalidEventHandler {
									name: name.to_owned(),
									category: TypeCategory::of(other),
								})
							}
						}
					} else {
						let text = value.as_text().ok_or_else(|| invalid_attribute(name, value))?;
						self.document.set_attribute(instance, check_name(attribute_name(name))?, &text)
					}
				}
			}
		}

		Ok(FOCUSABLE.contains(&tag) && props.get(AUTO_FOCUS).map_or(false, Value::is_truthy))
	}

	fn should_set_text_content(&self, tag: &str, props: &Props) -> bool {
		tag == "textarea" || matches!(props.get(CHILDREN), Some(Value::String(_)) | Some(Value::Number(_)))
	}

	fn prepare_update(&self, _instance: NodeId, _tag: &str, old_props: &Props, new_props: &Props) -> ChangedKeys {
		shallow_diff(old_props, new_props)
	}

	#[instrument(skip(self, old_props, new_props))]
	fn commit_update(&mut self, instance: NodeId, payload: &[String], _tag: &str, old_props: &Props, new_props: &Props) -> Result<(), Error> {
		for name in payload {
			let old = old_props.get(name);
			let new = new_props.get(name);
			match name.as_str() {
				// Child nodes are updated through their own hooks.
				CHILDREN => {
					if let Some(new) = new {
						self.set_text_if_literal(instance, new)
					}
				}

				STYLE => {
					let new_style = style_of(new)?;
					let empty = Style::default();
					let old_style = style_of(old).ok().flatten().unwrap_or(&empty);
					let new_style = new_style.unwrap_or(&empty);

					// Falsy values, including `0`, clear the declaration.
					let patch: Vec<(String, StyleValue)> = shallow_diff(&**old_style, &**new_style)
						.into_iter()
						.map(|style_name| {
							let value = match new_style.get(&style_name) {
								Some(value) if value.is_truthy() => value.clone(),
								_ => StyleValue::Null,
							};
							(style_name, value)
						})
						.collect();
					trace!("Style patch: {:?}", patch);
					apply_styles(&mut self.document, instance, patch.iter().map(|(name, value)| (name.as_str(), value)))
				}

				AUTO_FOCUS => {
					if let Some(new) = new {
						check_auto_focus(new)?
					}
				}

				name => {
					if let Some(event_type) = event_type(name) {
						let new_handler = match new {
							Some(Value::Handler(handler)) => Some(handler),
							None | Some(Value::Null) => None,
							Some(other) => {
								return Err(Error::InvalidEventHandler {
									name: name.to_owned(),
									category: TypeCategory::of(other),
								})
							}
						};
						if let Some(Value::Handler(old_handler)) = old {
							self.document.remove_event_listener(instance, &event_type, old_handler)
						}
						if let Some(new_handler) = new_handler {
							self.document.add_event_listener(instance, &event_type, new_handler.clone())
						}
					} else {
						match new {
							Some(value) if value.is_truthy() || matches!(value, Value::Number(_)) => {
								let text = value.as_text().ok_or_else(|| invalid_attribute(name, value))?;
								self.document.set_attribute(instance, check_name(attribute_name(name))?, &text)
							}
							_ => {
								self.document.remove_attribute(instance, attribute_name(name));
							}
						}
					}
				}
			}
		}
		Ok(())
	}

	fn commit_mount(&mut self, instance: NodeId, _tag: &str, _props: &Props) {
		self.document.focus(instance)
	}

	fn commit_text_update(&mut self, text_instance: NodeId, _old_text: &str, new_text: &str) {
		self.document.set_node_value(text_instance, new_text)
	}

	fn reset_text_content(&mut self, instance: NodeId) {
		self.document.set_text_content(instance, "")
	}

	fn append_child(&mut self, parent: NodeId, child: NodeId) {
		self.document.append_child(parent, child)
	}

	fn append_child_to_container(&mut self, container: NodeId, child: NodeId) {
		self.document.append_child(container, child)
	}

	fn insert_before(&mut self, parent: NodeId, child: NodeId, before: NodeId) {
		self.document.insert_before(parent, child, Some(before))
	}

	fn insert_in_container_before(&mut self, container: NodeId, child: NodeId, before: NodeId) {
		self.document.insert_before(container, child, Some(before))
	}

	fn remove_child(&mut self, parent: NodeId, child: NodeId) {
		self.document.remove_child(parent, child)
	}

	fn remove_child_from_container(&mut self, container: NodeId, child: NodeId) {
		self.document.remove_child(container, child)
	}

	fn discard_instance(&mut self, instance: NodeId) {
		self.document.discard(instance)
	}

	fn create_container(&mut self, tag: &str) -> NodeId {
		self.document.create_element(tag)
	}

	#[instrument(skip(self))]
	fn clear_container(&mut self, container: NodeId) {
		while let Some(&last) = self.document.children(container).last() {
			self.document.remove_child(container, last)
		}
	}

	fn serialize_container(&self, container: NodeId) -> String {
		self.document.inner_markup(container)
	}
}
