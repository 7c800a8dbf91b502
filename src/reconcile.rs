//! A minimal reconciliation driver.
//!
//! Children are matched by position. A pair with the same kind (and, for elements, the same tag) is updated in place,
//! any other pair is replaced. Surplus old nodes are removed, surplus new nodes are appended.
//! There is no keyed matching and no reordering.

use crate::{
	error::Error,
	host::HostConfig,
	vdom::{Element, Node},
};
use tracing::{error, instrument, trace, trace_span};

/// Driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	pub mode: SchedulingMode,
	/// How many levels of nesting are materialized. Deeper content is skipped with an error log.
	pub depth_limit: usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			mode: SchedulingMode::Synchronous,
			depth_limit: 1024,
		}
	}
}

/// When queued updates are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingMode {
	/// Each render call reconciles fully before it returns.
	Synchronous,
	/// Render calls only queue their update. [`Renderer::flush`](`crate::render::Renderer::flush`) applies them in order.
	Batched,
}

/// The retained record of a mounted description node.
#[derive(Debug)]
pub(crate) enum Fiber<I> {
	Element { instance: I, element: Element, children: Vec<Fiber<I>> },
	Text { instance: I, text: String },
}

impl<I: Copy> Fiber<I> {
	fn instance(&self) -> I {
		match *self {
			Fiber::Element { instance, .. } | Fiber::Text { instance, .. } => instance,
		}
	}
}

/// Where a list of children is attached.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Parent<I> {
	Container(I),
	Instance(I),
}

pub(crate) struct Reconciler<'a, H: HostConfig> {
	host: &'a mut H,
}

impl<'a, H: HostConfig> Reconciler<'a, H> {
	pub(crate) fn new(host: &'a mut H) -> Self {
		Self { host }
	}

	/// Brings the children of `parent`, as recorded in `fibers`, in line with `nodes`.
	///
	/// `fibers` always reflects the host tree, including after an error.
	#[instrument(skip(self, fibers, nodes), fields(fibers.len = fibers.len(), nodes.len = nodes.len()))]
	pub(crate) fn reconcile_children(&mut self, parent: Parent<H::Instance>, fibers: &mut Vec<Fiber<H::Instance>>, nodes: &[Node], depth_limit: usize) -> Result<(), Error> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Ok(());
		}

		for (fiber, node) in fibers.iter_mut().zip(nodes) {
			let replace = match (&mut *fiber, node) {
				(Fiber::Text { instance, text }, Node::Text(new_text)) => {
					if text != new_text {
						let span = trace_span!("Updating text node", ?instance);
						let _enter = span.enter();
						self.host.commit_text_update(*instance, text, new_text);
						*text = new_text.clone();
					}
					false
				}
				(Fiber::Element { instance, element, children }, Node::Element(new_element)) if element.tag() == new_element.tag() => {
					self.update_element(*instance, element, children, new_element, depth_limit)?;
					false
				}
				_ => true,
			};

			if replace {
				let span = trace_span!("Replace mismatching");
				let _enter = span.enter();
				let mut mounts = Vec::new();
				let replacement = self.mount(node, depth_limit, &mut mounts)?;
				self.insert_before(parent, replacement.instance(), fiber.instance());
				self.remove(parent, fiber.instance());
				*fiber = replacement;
				self.commit_mounts(mounts);
			}
		}

		let common = fibers.len().min(nodes.len());
		for removed in fibers.drain(common..).rev() {
			let span = trace_span!("Removing surplus node");
			let _enter = span.enter();
			self.remove(parent, removed.instance());
		}

		for node in &nodes[common..] {
			let span = trace_span!("Appending new node");
			let _enter = span.enter();
			let mut mounts = Vec::new();
			let fiber = self.mount(node, depth_limit, &mut mounts)?;
			self.append(parent, fiber.instance());
			fibers.push(fiber);
			self.commit_mounts(mounts);
		}

		Ok(())
	}

	#[instrument(skip(self, element, children, new_element))]
	fn update_element(&mut self, instance: H::Instance, element: &mut Element, children: &mut Vec<Fiber<H::Instance>>, new_element: &Element, depth_limit: usize) -> Result<(), Error> {
		let tag = new_element.tag();
		let payload = self.host.prepare_update(instance, tag, element.props(), new_element.props());

		let was_text = self.host.should_set_text_content(tag, element.props());
		let is_text = self.host.should_set_text_content(tag, new_element.props());
		if was_text && !is_text {
			self.host.reset_text_content(instance);
		}
		if is_text {
			for removed in children.drain(..).rev() {
				self.host.remove_child(instance, removed.instance());
			}
		}

		if payload.is_empty() {
			trace!("No property changes.");
		} else {
			self.host.commit_update(instance, &payload, tag, element.props(), new_element.props())?;
		}
		*element = new_element.clone();

		if is_text {
			Ok(())
		} else {
			self.reconcile_children(Parent::Instance(instance), children, new_element.child_nodes(), depth_limit - 1)
		}
	}

	/// Materializes a detached subtree. Elements needing [`commit_mount`](`HostConfig::commit_mount`) are collected into `mounts`.
	///
	/// On error, nothing that was created remains.
	fn mount<'n>(&mut self, node: &'n Node, depth_limit: usize, mounts: &mut Vec<(H::Instance, &'n Element)>) -> Result<Fiber<H::Instance>, Error> {
		match node {
			Node::Text(text) => {
				let span = trace_span!("Creating text node");
				let _enter = span.enter();
				Ok(Fiber::Text {
					instance: self.host.create_text_instance(text),
					text: text.clone(),
				})
			}
			Node::Element(element) => {
				let span = trace_span!("Creating element", tag = element.tag());
				let _enter = span.enter();
				let instance = self.host.create_instance(element.tag(), element.props());
				match self.mount_element_content(instance, element, depth_limit, mounts) {
					Ok(children) => Ok(Fiber::Element {
						instance,
						element: element.clone(),
						children,
					}),
					Err(error) => {
						self.host.discard_instance(instance);
						Err(error)
					}
				}
			}
		}
	}

	fn mount_element_content<'n>(&mut self, instance: H::Instance, element: &'n Element, depth_limit: usize, mounts: &mut Vec<(H::Instance, &'n Element)>) -> Result<Vec<Fiber<H::Instance>>, Error> {
		let mut children = Vec::new();
		if !self.host.should_set_text_content(element.tag(), element.props()) {
			let child_nodes = element.child_nodes();
			if depth_limit <= 1 && !child_nodes.is_empty() {
				error!("Depth limit reached");
			} else {
				for child in child_nodes {
					let fiber = self.mount(child, depth_limit - 1, mounts)?;
					self.host.append_initial_child(instance, fiber.instance());
					children.push(fiber);
				}
			}
		}

		if self.host.finalize_initial_children(instance, element.tag(), element.props())? {
			mounts.push((instance, element));
		}
		Ok(children)
	}

	fn commit_mounts(&mut self, mounts: Vec<(H::Instance, &Element)>) {
		for (instance, element) in mounts {
			self.host.commit_mount(instance, element.tag(), element.props());
		}
	}

	fn append(&mut self, parent: Parent<H::Instance>, child: H::Instance) {
		match parent {
			Parent::Container(container) => self.host.append_child_to_container(container, child),
			Parent::Instance(parent) => self.host.append_child(parent, child),
		}
	}

	fn insert_before(&mut self, parent: Parent<H::Instance>, child: H::Instance, before: H::Instance) {
		match parent {
			Parent::Container(container) => self.host.insert_in_container_before(container, child, before),
			Parent::Instance(parent) => self.host.insert_before(parent, child, before),
		}
	}

	fn remove(&mut self, parent: Parent<H::Instance>, child: H::Instance) {
		match parent {
			Parent::Container(container) => self.host.remove_child_from_container(container, child),
			Parent::Instance(parent) => self.host.remove_child(parent, child),
		}
	}
}
