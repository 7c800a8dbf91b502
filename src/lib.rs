#![doc(html_root_url = "https://docs.rs/xml-reconciler/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod dom;
pub mod error;
pub mod host;
pub mod props;
pub mod reconcile;
pub mod render;
pub mod style;
pub mod traced;
pub mod vdom;

pub use error::Error;
pub use render::{RenderTarget, Renderer};
