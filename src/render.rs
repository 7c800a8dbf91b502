use crate::{
	dom::NodeId,
	error::Error,
	host::{HostConfig, XmlHost},
	reconcile::{Config, Fiber, Parent, Reconciler, SchedulingMode},
	vdom::Node,
};
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use std::collections::VecDeque;
use tracing::{info, instrument, trace, warn};

/// A container node that descriptions are rendered into.
///
/// Roots are cached by target identity, so repeated renders into the same target patch the existing tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTarget<I = NodeId>(I);

impl<I: Copy> RenderTarget<I> {
	/// The container node.
	#[must_use]
	pub fn container(&self) -> I {
		self.0
	}
}

#[derive(Debug)]
struct Root<I> {
	fibers: Vec<Fiber<I>>,
}

struct Update<I> {
	target: I,
	nodes: Vec<Node>,
	on_complete: Box<dyn FnOnce()>,
}

/// Manages one persistent root per render target and serializes targets on demand.
///
/// There is no internal locking. Render calls against one target must be serialized by the caller,
/// which `&mut self` enforces.
pub struct Renderer<H: HostConfig = XmlHost> {
	host: H,
	config: Config,
	targets: HashSet<H::Instance>,
	roots: HashMap<H::Instance, Root<H::Instance>>,
	queue: VecDeque<Update<H::Instance>>,
}

impl Renderer {
	/// A synchronous renderer over a fresh [`XmlHost`].
	#[must_use]
	pub fn new() -> Self {
		Self::with_host(XmlHost::new(), Config::default())
	}
}

impl Default for Renderer {
	fn default() -> Self {
		Self::new()
	}
}

impl<H: HostConfig> Renderer<H> {
	pub fn with_host(host: H, config: Config) -> Self {
		Self {
			host,
			config,
			targets: HashSet::new(),
			roots: HashMap::new(),
			queue: VecDeque::new(),
		}
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	/// Direct access to the host tree, bypassing reconciliation.
	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn config(&self) -> Config {
		self.config
	}

	/// Creates a new, empty render target.
	#[instrument(skip(self))]
	pub fn create_target(&mut self, tag: &str) -> RenderTarget<H::Instance> {
		let container = self.host.create_container(tag);
		self.targets.insert(container);
		RenderTarget(container)
	}

	/// Whether `target` currently has a cached root.
	pub fn has_root(&self, target: RenderTarget<H::Instance>) -> bool {
		self.roots.contains_key(&target.0)
	}

	/// The current markup of `target`'s content.
	pub fn markup(&self, target: RenderTarget<H::Instance>) -> String {
		self.host.serialize_container(target.0)
	}

	/// Renders `node` into `target` and returns the target's markup.
	///
	/// # Errors
	///
	/// - [`Error::UnknownTarget`] iff `target` was not created by this renderer.
	/// - Any property type error raised while materializing or patching nodes.
	pub fn render(&mut self, target: RenderTarget<H::Instance>, node: impl Into<Node>) -> Result<String, Error> {
		self.render_with_callback(target, node, || ())
	}

	/// Like [`render`](`Renderer::render`), but calls `on_complete` once the update has been applied.
	///
	/// In [`SchedulingMode::Batched`], this only queues the update and returns the current, stale markup.
	///
	/// # Errors
	///
	/// See [`render`](`Renderer::render`). `on_complete` is not called on error.
	#[instrument(skip(self, node, on_complete))]
	pub fn render_with_callback(&mut self, target: RenderTarget<H::Instance>, node: impl Into<Node>, on_complete: impl 'static + FnOnce()) -> Result<String, Error> {
		if !self.targets.contains(&target.0) {
			return Err(Error::UnknownTarget);
		}

		let node = node.into();
		match self.config.mode {
			SchedulingMode::Synchronous => {
				self.commit(target.0, &[node])?;
				on_complete();
			}
			SchedulingMode::Batched => {
				trace!("Queueing update.");
				self.queue.push_back(Update {
					target: target.0,
					nodes: vec![node],
					on_complete: Box::new(on_complete),
				})
			}
		}
		Ok(self.markup(target))
	}

	/// Applies all queued updates in order.
	///
	/// # Errors
	///
	/// On the first failing update. That update is dropped, later ones stay queued.
	#[instrument(skip(self), fields(queue.len = self.queue.len()))]
	pub fn flush(&mut self) -> Result<(), Error> {
		while let Some(Update { target, nodes, on_complete }) = self.queue.pop_front() {
			self.commit(target, &nodes)?;
			on_complete();
		}
		Ok(())
	}

	/// The number of updates waiting for [`flush`](`Renderer::flush`).
	pub fn pending(&self) -> usize {
		self.queue.len()
	}

	/// Removes everything rendered into `target` and forgets its root.
	///
	/// Returns whether there was a root.
	///
	/// # Errors
	///
	/// Iff `target` was not created by this renderer.
	#[instrument(skip(self))]
	pub fn unmount(&mut self, target: RenderTarget<H::Instance>) -> Result<bool, Error> {
		if !self.targets.contains(&target.0) {
			return Err(Error::UnknownTarget);
		}
		self.queue.retain(|update| update.target != target.0);
		match self.roots.remove(&target.0) {
			Some(mut root) => {
				Reconciler::new(&mut self.host).reconcile_children(Parent::Container(target.0), &mut root.fibers, &[], self.config.depth_limit)?;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// [Unmounts](`Renderer::unmount`) `target`, then releases its container node.
	///
	/// The target is unknown to this renderer afterwards.
	///
	/// # Errors
	///
	/// Iff `target` was not created by this renderer or was already destroyed.
	#[instrument(skip(self))]
	pub fn destroy_target(&mut self, target: RenderTarget<H::Instance>) -> Result<(), Error> {
		self.unmount(target)?;
		self.targets.remove(&target.0);
		self.host.discard_instance(target.0);
		Ok(())
	}

	fn commit(&mut self, container: H::Instance, nodes: &[Node]) -> Result<(), Error> {
		let root = match self.roots.entry(container) {
			Entry::Occupied(occupied) => occupied.into_mut(),
			Entry::Vacant(vacant) => {
				info!("Creating root for {:?}.", container);
				self.host.clear_container(container);
				vacant.insert(Root { fibers: Vec::new() })
			}
		};

		if self.config.depth_limit == 0 {
			warn!("The depth limit is 0, so nothing will be rendered.");
		}
		Reconciler::new(&mut self.host).reconcile_children(Parent::Container(container), &mut root.fibers, nodes, self.config.depth_limit)
	}
}
