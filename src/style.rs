//! Style normalization: turns style declarations into values on a node's style surface.

use crate::{
	dom::{Document, NodeId},
	props::format_number,
	vdom::StyleValue,
};
use std::borrow::Cow;
use tracing::{instrument, trace};

/// CSS properties that take plain numbers. Kebab-case, sorted, without vendor prefixes.
const UNITLESS: &[&str] = &[
	"animation-iteration-count",
	"aspect-ratio",
	"border-image-outset",
	"border-image-slice",
	"border-image-width",
	"box-flex",
	"box-flex-group",
	"box-ordinal-group",
	"column-count",
	"columns",
	"fill-opacity",
	"flex",
	"flex-grow",
	"flex-negative",
	"flex-order",
	"flex-positive",
	"flex-shrink",
	"flood-opacity",
	"font-weight",
	"grid-area",
	"grid-column",
	"grid-column-end",
	"grid-column-span",
	"grid-column-start",
	"grid-row",
	"grid-row-end",
	"grid-row-span",
	"grid-row-start",
	"line-clamp",
	"line-height",
	"opacity",
	"order",
	"orphans",
	"scale",
	"stop-opacity",
	"stroke-dasharray",
	"stroke-dashoffset",
	"stroke-miterlimit",
	"stroke-opacity",
	"stroke-width",
	"tab-size",
	"widows",
	"z-index",
	"zoom",
];

/// Converts a style property name to its CSS spelling.
///
/// `backgroundColor` becomes `background-color`, `WebkitTransition` becomes `-webkit-transition`
/// and `msTransition` becomes `-ms-transition`. Kebab-case names and custom properties (`--x`) are kept.
#[must_use]
pub fn css_name(name: &str) -> Cow<'_, str> {
	if name.starts_with("--") || !name.chars().any(|c| c.is_ascii_uppercase()) {
		return Cow::Borrowed(name);
	}

	let mut css = String::with_capacity(name.len() + 4);
	if name.starts_with("ms") && name[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
		css.push('-');
	}
	for c in name.chars() {
		if c.is_ascii_uppercase() {
			css.push('-');
			css.push(c.to_ascii_lowercase());
		} else {
			css.push(c);
		}
	}
	Cow::Owned(css)
}

/// Whether a numeric value for this (CSS-spelled) property is used as-is rather than in pixels.
///
/// Properties not in the table are unit-requiring.
#[must_use]
pub fn is_unitless(css_name: &str) -> bool {
	if css_name.starts_with("--") {
		return true;
	}
	let unprefixed = ["-webkit-", "-moz-", "-ms-", "-o-"]
		.iter()
		.find_map(|prefix| css_name.strip_prefix(prefix))
		.unwrap_or(css_name);
	UNITLESS.binary_search(&unprefixed).is_ok()
}

/// Applies style declarations to `node`.
///
/// `null`, booleans and empty strings clear the property.
/// Numbers get a `px` suffix unless the property [is unitless](`is_unitless`).
#[instrument(skip(document, styles))]
pub fn apply_styles<'a>(document: &mut Document, node: NodeId, styles: impl IntoIterator<Item = (&'a str, &'a StyleValue)>) {
	for (name, value) in styles {
		let name = css_name(name);
		match value {
			StyleValue::Null | StyleValue::Bool(_) => {
				document.remove_style_property(node, &name);
			}
			StyleValue::String(string) if string.is_empty() => {
				document.remove_style_property(node, &name);
			}
			StyleValue::String(string) => document.set_style_property(node, &name, string),
			StyleValue::Number(number) => {
				let value = if is_unitless(&name) {
					format_number(*number)
				} else {
					format!("{}px", format_number(*number))
				};
				trace!("{} = {}", name, value);
				document.set_style_property(node, &name, &value)
			}
		}
	}
}
