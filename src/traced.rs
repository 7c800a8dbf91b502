use crate::{error::Error, host::HostConfig, props::ChangedKeys, vdom::Props};
use tracing::{debug, trace_span};

/// Wraps a [`HostConfig`] and logs each hook call with its arguments.
///
/// Property maps may contain rendered content, so they are only logged with the `dangerous-logging` feature.
#[derive(Debug, Default)]
pub struct Traced<H>(H);

impl<H> Traced<H> {
	pub fn new(inner: H) -> Self {
		Self(inner)
	}

	pub fn inner(&self) -> &H {
		&self.0
	}

	pub fn inner_mut(&mut self) -> &mut H {
		&mut self.0
	}

	pub fn into_inner(self) -> H {
		self.0
	}
}

macro_rules! traced {
	($name:literal, $($field:tt)*) => {
		let span = trace_span!($name, $($field)*);
		let _enter = span.enter();
	};
}

/// Logs property maps in full only with the `dangerous-logging` feature, otherwise just their keys.
struct PropsField<'a>(&'a Props);

impl core::fmt::Debug for PropsField<'_> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			core::fmt::Debug::fmt(self.0, f)
		} else {
			f.debug_list().entries(self.0.keys()).finish()
		}
	}
}

fn props_field(props: &Props) -> PropsField<'_> {
	PropsField(props)
}

impl<H: HostConfig> HostConfig for Traced<H> {
	type Instance = H::Instance;

	fn create_instance(&mut self, tag: &str, props: &Props) -> Self::Instance {
		traced!("create_instance", tag, props = ?props_field(props));
		let instance = self.0.create_instance(tag, props);
		debug!(?instance, "Created instance.");
		instance
	}

	fn create_text_instance(&mut self, text: &str) -> Self::Instance {
		traced!("create_text_instance", text.len = text.len());
		let instance = self.0.create_text_instance(text);
		debug!(?instance, "Created text instance.");
		instance
	}

	fn append_initial_child(&mut self, parent: Self::Instance, child: Self::Instance) {
		traced!("append_initial_child", ?parent, ?child);
		self.0.append_initial_child(parent, child)
	}

	fn finalize_initial_children(&mut self, instance: Self::Instance, tag: &str, props: &Props) -> Result<bool, Error> {
		traced!("finalize_initial_children", ?instance, tag, props = ?props_field(props));
		let result = self.0.finalize_initial_children(instance, tag, props);
		debug!(?result, "Finalized.");
		result
	}

	fn should_set_text_content(&self, tag: &str, props: &Props) -> bool {
		traced!("should_set_text_content", tag);
		self.0.should_set_text_content(tag, props)
	}

	fn prepare_update(&self, instance: Self::Instance, tag: &str, old_props: &Props, new_props: &Props) -> ChangedKeys {
		traced!("prepare_update", ?instance, tag);
		let payload = self.0.prepare_update(instance, tag, old_props, new_props);
		debug!(?payload, "Prepared update.");
		payload
	}

	fn commit_update(&mut self, instance: Self::Instance, payload: &[String], tag: &str, old_props: &Props, new_props: &Props) -> Result<(), Error> {
		traced!("commit_update", ?instance, ?payload, tag);
		let result = self.0.commit_update(instance, payload, tag, old_props, new_props);
		debug!(?result, "Committed update.");
		result
	}

	fn commit_mount(&mut self, instance: Self::Instance, tag: &str, props: &Props) {
		traced!("commit_mount", ?instance, tag);
		self.0.commit_mount(instance, tag, props)
	}

	fn commit_text_update(&mut self, text_instance: Self::Instance, old_text: &str, new_text: &str) {
		traced!("commit_text_update", ?text_instance, old_text.len = old_text.len(), new_text.len = new_text.len());
		self.0.commit_text_update(text_instance, old_text, new_text)
	}

	fn reset_text_content(&mut self, instance: Self::Instance) {
		traced!("reset_text_content", ?instance);
		self.0.reset_text_content(instance)
	}

	fn append_child(&mut self, parent: Self::Instance, child: Self::Instance) {
		traced!("append_child", ?parent, ?child);
		self.0.append_child(parent, child)
	}

	fn append_child_to_container(&mut self, container: Self::Instance, child: Self::Instance) {
		traced!("append_child_to_container", ?container, ?child);
		self.0.append_child_to_container(container, child)
	}

	fn insert_before(&mut self, parent: Self::Instance, child: Self::Instance, before: Self::Instance) {
		traced!("insert_before", ?parent, ?child, ?before);
		self.0.insert_before(parent, child, before)
	}

	fn insert_in_container_before(&mut self, container: Self::Instance, child: Self::Instance, before: Self::Instance) {
		traced!("insert_in_container_before", ?container, ?child, ?before);
		self.0.insert_in_container_before(container, child, before)
	}

	fn remove_child(&mut self, parent: Self::Instance, child: Self::Instance) {
		traced!("remove_child", ?parent, ?child);
		self.0.remove_child(parent, child)
	}

	fn remove_child_from_container(&mut self, container: Self::Instance, child: Self::Instance) {
		traced!("remove_child_from_container", ?container, ?child);
		self.0.remove_child_from_container(container, child)
	}

	fn discard_instance(&mut self, instance: Self::Instance) {
		traced!("discard_instance", ?instance);
		self.0.discard_instance(instance)
	}

	fn create_container(&mut self, tag: &str) -> Self::Instance {
		traced!("create_container", tag);
		self.0.create_container(tag)
	}

	fn clear_container(&mut self, container: Self::Instance) {
		traced!("clear_container", ?container);
		self.0.clear_container(container)
	}

	fn serialize_container(&self, container: Self::Instance) -> String {
		traced!("serialize_container", ?container);
		self.0.serialize_container(container)
	}
}
