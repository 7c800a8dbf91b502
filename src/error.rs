use crate::props::TypeCategory;
use thiserror::Error;

/// Errors surfaced by [`Renderer::render`](`crate::render::Renderer::render`) and the host hooks.
///
/// None of these are recoverable mid-render. There is no rollback: nodes that failed to materialize were never attached,
/// but siblings patched before the failure keep their new state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("Prop {name:?} had type {category} - all attributes must be string or number!")]
	InvalidPropertyType { name: String, category: TypeCategory },

	#[error("Prop \"style\" had type {category} - styles must be given as a style map!")]
	InvalidStyle { category: TypeCategory },

	#[error("Prop {name:?} had type {category} - event handlers must be callbacks!")]
	InvalidEventHandler { name: String, category: TypeCategory },

	/// A tag or attribute name that would not serialize as a well-formed XML name.
	#[error("{name:?} is not a valid XML name!")]
	InvalidName { name: String },

	#[error("Unknown render target. Targets must be created by the renderer that renders into them.")]
	UnknownTarget,
}
