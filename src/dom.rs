//! The mutable host tree that reconciliation patches, and its XML serialization.
//!
//! Nodes live in a generational arena owned by [`Document`] and are addressed by [`NodeId`].
//! Removing a node from its parent destroys it together with its subtree;
//! afterwards, its id is stale and every operation on it is logged and ignored.

use crate::vdom::Handler;
use core::fmt::{self, Write as _};
use hashbrown::HashMap;
use indexmap::IndexMap;
use tracing::{error, instrument, trace, warn};

/// A handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
	index: u32,
	generation: u32,
}

/// An interaction dispatched to a node's listeners.
#[derive(Debug, Clone)]
pub struct Event {
	kind: String,
	target: NodeId,
}

impl Event {
	#[must_use]
	pub fn kind(&self) -> &str {
		&self.kind
	}

	#[must_use]
	pub fn target(&self) -> NodeId {
		self.target
	}
}

#[derive(Debug)]
enum NodeData {
	Element(ElementData),
	Text(String),
}

#[derive(Debug)]
struct ElementData {
	tag: String,
	attributes: IndexMap<String, String>,
	style: IndexMap<String, String>,
	listeners: HashMap<String, Vec<Handler>>,
}

#[derive(Debug)]
struct Entry {
	data: NodeData,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Slot {
	generation: u32,
	entry: Option<Entry>,
}

/// Owner of all host nodes.
#[derive(Debug, Default)]
pub struct Document {
	slots: Vec<Slot>,
	free: Vec<u32>,
	focused: Option<NodeId>,
	mutation_count: u64,
}

impl Document {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn allocate(&mut self, data: NodeData) -> NodeId {
		let entry = Entry { data, parent: None, children: Vec::new() };
		if let Some(index) = self.free.pop() {
			let slot = &mut self.slots[index as usize];
			slot.entry = Some(entry);
			NodeId { index, generation: slot.generation }
		} else {
			#[allow(clippy::cast_possible_truncation)]
			let index = self.slots.len() as u32;
			self.slots.push(Slot { generation: 0, entry: Some(entry) });
			NodeId { index, generation: 0 }
		}
	}

	fn entry(&self, id: NodeId) -> Option<&Entry> {
		self.slots
			.get(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.entry.as_ref())
	}

	fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
		self.slots
			.get_mut(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.entry.as_mut())
	}

	fn element(&self, id: NodeId) -> Option<&ElementData> {
		match &self.entry(id)?.data {
			NodeData::Element(element) => Some(element),
			NodeData::Text(_) => None,
		}
	}

	fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
		match self.entry_mut(id).map(|entry| &mut entry.data) {
			Some(NodeData::Element(element)) => Some(element),
			Some(NodeData::Text(_)) => {
				error!("Expected element but found text node {:?}. Ignoring.", id);
				None
			}
			None => {
				error!("Stale or unknown node {:?}. Ignoring.", id);
				None
			}
		}
	}

	/// Creates a detached element.
	///
	/// `tag` should be an [XML name](`is_xml_name`). Other tags are logged, but the element is still created.
	#[must_use]
	pub fn create_element(&mut self, tag: &str) -> NodeId {
		if !is_xml_name(tag) {
			error!("{:?} is not a valid XML name. The element won't serialize as well-formed XML.", tag);
		}
		self.allocate(NodeData::Element(ElementData {
			tag: tag.to_owned(),
			attributes: IndexMap::new(),
			style: IndexMap::new(),
			listeners: HashMap::new(),
		}))
	}

	#[must_use]
	pub fn create_text_node(&mut self, text: &str) -> NodeId {
		self.allocate(NodeData::Text(text.to_owned()))
	}

	/// Whether `id` still refers to a live node.
	#[must_use]
	pub fn contains(&self, id: NodeId) -> bool {
		self.entry(id).is_some()
	}

	/// The number of live nodes, attached or not.
	#[must_use]
	pub fn len(&self) -> usize {
		self.slots.iter().filter(|slot| slot.entry.is_some()).count()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Counts every attribute, style, text, listener and structure mutation so far.
	#[must_use]
	pub fn mutation_count(&self) -> u64 {
		self.mutation_count
	}

	#[must_use]
	pub fn tag(&self, id: NodeId) -> Option<&str> {
		self.element(id).map(|element| element.tag.as_str())
	}

	/// The value of a text node.
	#[must_use]
	pub fn node_value(&self, id: NodeId) -> Option<&str> {
		match &self.entry(id)?.data {
			NodeData::Text(text) => Some(text),
			NodeData::Element(_) => None,
		}
	}

	#[must_use]
	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.entry(id)?.parent
	}

	#[must_use]
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		self.entry(id).map_or(&[], |entry| &entry.children)
	}

	#[must_use]
	pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
		self.element(id)?.attributes.get(name).map(String::as_str)
	}

	pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
		self.element(id)
			.into_iter()
			.flat_map(|element| element.attributes.iter().map(|(name, value)| (name.as_str(), value.as_str())))
	}

	#[must_use]
	pub fn style_property(&self, id: NodeId, name: &str) -> Option<&str> {
		self.element(id)?.style.get(name).map(String::as_str)
	}

	#[must_use]
	pub fn focused(&self) -> Option<NodeId> {
		self.focused
	}

	#[must_use]
	pub fn listener_count(&self, id: NodeId, event_type: &str) -> usize {
		self.element(id)
			.and_then(|element| element.listeners.get(event_type))
			.map_or(0, Vec::len)
	}

	fn detach(&mut self, child: NodeId) {
		let parent = match self.entry_mut(child) {
			Some(entry) => entry.parent.take(),
			None => return,
		};
		if let Some(parent) = parent {
			if let Some(parent) = self.entry_mut(parent) {
				parent.children.retain(|&c| c != child);
			}
		}
	}

	fn check_insertable(&self, parent: NodeId, child: NodeId) -> bool {
		if self.element(parent).is_none() {
			error!("Can't insert into {:?}, which is not a live element. Ignoring.", parent);
			return false;
		}
		if !self.contains(child) {
			error!("Can't insert stale or unknown node {:?}. Ignoring.", child);
			return false;
		}
		let mut ancestor = Some(parent);
		while let Some(current) = ancestor {
			if current == child {
				error!("Can't insert {:?} into its own subtree. Ignoring.", child);
				return false;
			}
			ancestor = self.parent(current);
		}
		true
	}

	#[instrument(skip(self))]
	pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
		self.insert_before(parent, child, None)
	}

	/// Inserts `child` into `parent` before `before`, or last if that is [`None`].
	///
	/// `child` is moved if it is attached elsewhere.
	#[instrument(skip(self))]
	pub fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
		if !self.check_insertable(parent, child) {
			return;
		}
		self.detach(child);
		if let Some(entry) = self.entry_mut(child) {
			entry.parent = Some(parent);
		}
		if let Some(entry) = self.entry_mut(parent) {
			let position = before.and_then(|before| entry.children.iter().position(|&c| c == before));
			match (before, position) {
				(Some(_), Some(position)) => entry.children.insert(position, child),
				(Some(before), None) => {
					warn!("Reference node {:?} is not a child of {:?}. Appending instead.", before, parent);
					entry.children.push(child)
				}
				(None, _) => entry.children.push(child),
			}
		}
		self.mutation_count += 1;
	}

	/// Removes `child` from `parent` and destroys it along with its subtree.
	#[instrument(skip(self))]
	pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
		if self.parent(child) != Some(parent) {
			return error!("{:?} is not a child of {:?}. Ignoring.", child, parent);
		}
		self.detach(child);
		self.destroy(child);
		self.mutation_count += 1;
	}

	/// Destroys a detached node and its subtree.
	#[instrument(skip(self))]
	pub fn discard(&mut self, id: NodeId) {
		if self.parent(id).is_some() {
			return error!("Refusing to discard attached node {:?}.", id);
		}
		self.destroy(id)
	}

	fn destroy(&mut self, id: NodeId) {
		let mut pending = vec![id];
		let mut count = 0_usize;
		while let Some(id) = pending.pop() {
			let slot = match self.slots.get_mut(id.index as usize) {
				Some(slot) if slot.generation == id.generation => slot,
				_ => continue,
			};
			if let Some(entry) = slot.entry.take() {
				slot.generation = slot.generation.wrapping_add(1);
				self.free.push(id.index);
				pending.extend(entry.children);
				count += 1;
				if self.focused == Some(id) {
					self.focused = None;
				}
			}
		}
		trace!("Destroyed {} node(s).", count);
	}

	/// Sets an attribute. Names that aren't [XML names](`is_xml_name`) are logged and ignored.
	pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
		if !is_xml_name(name) {
			return error!("{:?} is not a valid XML name. Ignoring.", name);
		}
		if let Some(element) = self.element_mut(id) {
			element.attributes.insert(name.to_owned(), value.to_owned());
			self.mutation_count += 1;
		}
	}

	pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
		let removed = self.element_mut(id)?.attributes.shift_remove(name);
		if removed.is_some() {
			self.mutation_count += 1;
		}
		removed
	}

	pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
		if let Some(element) = self.element_mut(id) {
			element.style.insert(name.to_owned(), value.to_owned());
			reflect_style(element);
			self.mutation_count += 1;
		}
	}

	pub fn remove_style_property(&mut self, id: NodeId, name: &str) -> Option<String> {
		let element = self.element_mut(id)?;
		let removed = element.style.shift_remove(name);
		if removed.is_some() {
			reflect_style(element);
			self.mutation_count += 1;
		}
		removed
	}

	/// Registers `handler` for `event_type`, unless that exact handler is already registered.
	pub fn add_event_listener(&mut self, id: NodeId, event_type: &str, handler: Handler) {
		if let Some(element) = self.element_mut(id) {
			let listeners = element.listeners.entry(event_type.to_owned()).or_insert_with(Vec::new);
			if listeners.iter().any(|listener| listener.ptr_eq(&handler)) {
				return trace!("Listener already registered for {:?}.", event_type);
			}
			listeners.push(handler);
			self.mutation_count += 1;
		}
	}

	pub fn remove_event_listener(&mut self, id: NodeId, event_type: &str, handler: &Handler) {
		let element = match self.element_mut(id) {
			Some(element) => element,
			None => return,
		};
		let listeners = match element.listeners.get_mut(event_type) {
			Some(listeners) => listeners,
			None => return trace!("No listeners registered for {:?}.", event_type),
		};
		let before = listeners.len();
		listeners.retain(|listener| !listener.ptr_eq(handler));
		let removed = before - listeners.len();
		if listeners.is_empty() {
			element.listeners.remove(event_type);
		}
		if removed != 0 {
			self.mutation_count += 1;
		}
	}

	/// Invokes each listener registered on `target` for `event_type`, in registration order.
	///
	/// Returns the number of listeners invoked.
	#[instrument(skip(self))]
	pub fn dispatch(&self, target: NodeId, event_type: &str) -> usize {
		let listeners = match self.element(target).and_then(|element| element.listeners.get(event_type)) {
			Some(listeners) => listeners.clone(),
			None => return 0,
		};
		let event = Event { kind: event_type.to_owned(), target };
		for listener in &listeners {
			listener.call(&event);
		}
		listeners.len()
	}

	/// Replaces all children of an element with a single text node, or none if `text` is empty.
	///
	/// On a text node, this sets its value instead.
	#[instrument(skip(self))]
	pub fn set_text_content(&mut self, id: NodeId, text: &str) {
		let children = match self.entry_mut(id) {
			Some(Entry { data: NodeData::Text(value), .. }) => {
				*value = text.to_owned();
				self.mutation_count += 1;
				return;
			}
			Some(entry) => core::mem::take(&mut entry.children),
			None => return error!("Stale or unknown node {:?}. Ignoring.", id),
		};
		for child in children {
			if let Some(entry) = self.entry_mut(child) {
				entry.parent = None;
			}
			self.destroy(child);
		}
		if !text.is_empty() {
			let text_node = self.create_text_node(text);
			if let Some(entry) = self.entry_mut(text_node) {
				entry.parent = Some(id);
			}
			if let Some(entry) = self.entry_mut(id) {
				entry.children.push(text_node);
			}
		}
		self.mutation_count += 1;
	}

	/// Sets the value of a text node in place.
	pub fn set_node_value(&mut self, id: NodeId, text: &str) {
		match self.entry_mut(id).map(|entry| &mut entry.data) {
			Some(NodeData::Text(value)) => {
				*value = text.to_owned();
				self.mutation_count += 1;
			}
			Some(NodeData::Element(_)) => error!("Expected text node but found element {:?}. Ignoring.", id),
			None => error!("Stale or unknown node {:?}. Ignoring.", id),
		}
	}

	/// The concatenated text of `id` and its descendants.
	#[must_use]
	pub fn text_content(&self, id: NodeId) -> String {
		let mut text = String::new();
		self.collect_text(id, &mut text);
		text
	}

	fn collect_text(&self, id: NodeId, text: &mut String) {
		match self.entry(id) {
			Some(Entry { data: NodeData::Text(value), .. }) => text.push_str(value),
			Some(entry) => {
				for &child in &entry.children {
					self.collect_text(child, text)
				}
			}
			None => (),
		}
	}

	pub fn focus(&mut self, id: NodeId) {
		if self.element(id).is_some() {
			trace!("Focusing {:?}.", id);
			self.focused = Some(id);
		} else {
			error!("Can't focus {:?}, which is not a live element. Ignoring.", id)
		}
	}

	/// Serializes the children of `id` as XML.
	#[must_use]
	pub fn inner_markup(&self, id: NodeId) -> String {
		let mut markup = String::new();
		for &child in self.children(id) {
			let _ = self.write_markup(child, &mut markup);
		}
		markup
	}

	/// Serializes `id` itself as XML.
	#[must_use]
	pub fn outer_markup(&self, id: NodeId) -> String {
		let mut markup = String::new();
		let _ = self.write_markup(id, &mut markup);
		markup
	}

	fn write_markup(&self, id: NodeId, w: &mut impl fmt::Write) -> fmt::Result {
		let entry = match self.entry(id) {
			Some(entry) => entry,
			None => {
				error!("Stale or unknown node {:?} while serializing. Skipping.", id);
				return Ok(());
			}
		};
		match &entry.data {
			NodeData::Text(text) => write_escaped(w, text, false),
			NodeData::Element(element) => {
				write!(w, "<{}", element.tag)?;
				for (name, value) in &element.attributes {
					write!(w, " {}=\"", name)?;
					write_escaped(w, value, true)?;
					w.write_char('"')?;
				}
				if entry.children.is_empty() {
					return w.write_str("/>");
				}
				w.write_char('>')?;
				for &child in &entry.children {
					self.write_markup(child, w)?;
				}
				write!(w, "</{}>", element.tag)
			}
		}
	}
}

/// Whether `name` matches the XML 1.0 `Name` production.
#[must_use]
pub fn is_xml_name(name: &str) -> bool {
	let mut chars = name.chars();
	chars.next().map_or(false, is_name_start_char) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
	matches!(c,
		':' | 'A'..='Z' | '_' | 'a'..='z'
		| '\u{C0}'..='\u{D6}'
		| '\u{D8}'..='\u{F6}'
		| '\u{F8}'..='\u{2FF}'
		| '\u{370}'..='\u{37D}'
		| '\u{37F}'..='\u{1FFF}'
		| '\u{200C}'..='\u{200D}'
		| '\u{2070}'..='\u{218F}'
		| '\u{2C00}'..='\u{2FEF}'
		| '\u{3001}'..='\u{D7FF}'
		| '\u{F900}'..='\u{FDCF}'
		| '\u{FDF0}'..='\u{FFFD}'
		| '\u{10000}'..='\u{EFFFF}'
	)
}

fn is_name_char(c: char) -> bool {
	is_name_start_char(c)
		|| matches!(c,
			'-' | '.' | '0'..='9' | '\u{B7}'
			| '\u{300}'..='\u{36F}'
			| '\u{203F}'..='\u{2040}'
		)
}

fn reflect_style(element: &mut ElementData) {
	if element.style.is_empty() {
		element.attributes.shift_remove("style");
	} else {
		let mut css = String::new();
		for (name, value) in &element.style {
			if !css.is_empty() {
				css.push(' ');
			}
			let _ = write!(css, "{}: {};", name, value);
		}
		element.attributes.insert("style".to_owned(), css);
	}
}

fn write_escaped(w: &mut impl fmt::Write, text: &str, attribute: bool) -> fmt::Result {
	for c in text.chars() {
		match c {
			'&' => w.write_str("&amp;")?,
			'<' => w.write_str("&lt;")?,
			'>' => w.write_str("&gt;")?,
			'"' if attribute => w.write_str("&quot;")?,
			c => w.write_char(c)?,
		}
	}
	Ok(())
}
