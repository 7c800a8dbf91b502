//! Property classification and the shallow diff between two property sets.

use crate::vdom::{StyleValue, Value};
use core::fmt;
use indexmap::{IndexMap, IndexSet};
use tracing::instrument;

/// Names of properties whose values differ between two property sets, in key-union order.
pub type ChangedKeys = Vec<String>;

/// Strict (value-or-identity) equality.
///
/// Scalars compare by value (`NaN` never equals itself), everything else by reference.
/// There is no deep comparison: a freshly built map with equal contents is *not* equal.
pub trait StrictEq {
	fn strict_eq(&self, other: &Self) -> bool;
}

impl StrictEq for Value {
	#[allow(clippy::float_cmp)]
	fn strict_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Number(a), Value::Number(b)) => a == b,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Null, Value::Null) => true,
			(Value::Handler(a), Value::Handler(b)) => a.ptr_eq(b),
			(Value::Style(a), Value::Style(b)) => a.ptr_eq(b),
			(Value::Children(a), Value::Children(b)) => a.ptr_eq(b),
			(Value::Object(a), Value::Object(b)) => std::rc::Rc::as_ptr(a).cast::<()>() == std::rc::Rc::as_ptr(b).cast::<()>(),
			_ => false,
		}
	}
}

impl StrictEq for StyleValue {
	fn strict_eq(&self, other: &Self) -> bool {
		// `PartialEq` on `f64` already treats `NaN` as unequal.
		self == other
	}
}

/// Computes the keys whose values are not [strictly equal](`StrictEq`) between `old` and `new`.
///
/// A key missing on one side always counts as changed.
/// Keys are reported in the order they first appear in `old`, then `new`.
#[must_use]
#[instrument(skip(old, new), fields(old.len = old.len(), new.len = new.len()))]
pub fn shallow_diff<V: StrictEq>(old: &IndexMap<String, V>, new: &IndexMap<String, V>) -> ChangedKeys {
	let unique: IndexSet<&String> = old.keys().chain(new.keys()).collect();
	unique
		.into_iter()
		.filter(|&name| match (old.get(name), new.get(name)) {
			(Some(a), Some(b)) => !a.strict_eq(b),
			_ => true,
		})
		.cloned()
		.collect()
}

/// Run-time type categories, as reported in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
	String,
	Number,
	Boolean,
	Object,
	Function,
}

impl TypeCategory {
	#[must_use]
	pub fn of(value: &Value) -> Self {
		match value {
			Value::String(_) => Self::String,
			Value::Number(_) => Self::Number,
			Value::Bool(_) => Self::Boolean,
			Value::Handler(_) => Self::Function,
			Value::Null | Value::Style(_) | Value::Children(_) | Value::Object(_) => Self::Object,
		}
	}
}

impl fmt::Display for TypeCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TypeCategory::String => "string",
			TypeCategory::Number => "number",
			TypeCategory::Boolean => "boolean",
			TypeCategory::Object => "object",
			TypeCategory::Function => "function",
		})
	}
}

/// Formats a number the way it is written into attributes and text content.
///
/// This follows script number-to-string conversion: the shortest round-tripping digits,
/// plain decimal notation for magnitudes in `[1e-6, 1e21)` and exponent notation (`1e+21`, `1.5e-7`) outside of it.
/// Integral values carry no fractional part, `-0` prints as `0`.
#[must_use]
pub fn format_number(number: f64) -> String {
	if number.is_nan() {
		return "NaN".to_owned();
	}
	let sign = if number < 0.0 { "-" } else { "" };
	if number.is_infinite() {
		return format!("{}Infinity", sign);
	} else if number == 0.0 {
		return "0".to_owned();
	}

	// `{:e}` yields the shortest digits that round-trip, as `d.ddde<exponent>`.
	let scientific = format!("{:e}", number.abs());
	let mut parts = scientific.splitn(2, 'e');
	let mantissa = parts.next().unwrap_or_default();
	let exponent: i32 = parts.next().and_then(|exponent| exponent.parse().ok()).unwrap_or_default();
	let digits: String = mantissa.chars().filter(|&c| c != '.').collect();

	#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
	let body = {
		let k = digits.len() as i32;
		let n = exponent + 1;
		if k <= n && n <= 21 {
			format!("{}{}", digits, "0".repeat((n - k) as usize))
		} else if 0 < n && n <= 21 {
			let (integral, fraction) = digits.split_at(n as usize);
			format!("{}.{}", integral, fraction)
		} else if -6 < n && n <= 0 {
			format!("0.{}{}", "0".repeat((-n) as usize), digits)
		} else {
			let exponent_sign = if n > 0 { '+' } else { '-' };
			let (first, rest) = digits.split_at(1);
			if rest.is_empty() {
				format!("{}e{}{}", first, exponent_sign, (n - 1).abs())
			} else {
				format!("{}.{}e{}{}", first, rest, exponent_sign, (n - 1).abs())
			}
		}
	};
	format!("{}{}", sign, body)
}

/// Interaction types that `on*` properties may bind to: the global, window and document handler sets. Sorted.
const EVENT_TYPES: &[&str] = &[
	"abort",
	"afterprint",
	"animationcancel",
	"animationend",
	"animationiteration",
	"animationstart",
	"auxclick",
	"beforeinput",
	"beforeprint",
	"beforetoggle",
	"beforeunload",
	"blur",
	"cancel",
	"canplay",
	"canplaythrough",
	"change",
	"click",
	"close",
	"contextlost",
	"contextmenu",
	"contextrestored",
	"copy",
	"cuechange",
	"cut",
	"dblclick",
	"devicemotion",
	"deviceorientation",
	"drag",
	"dragend",
	"dragenter",
	"dragleave",
	"dragover",
	"dragstart",
	"drop",
	"durationchange",
	"emptied",
	"ended",
	"error",
	"focus",
	"focusin",
	"focusout",
	"formdata",
	"gotpointercapture",
	"hashchange",
	"input",
	"invalid",
	"keydown",
	"keypress",
	"keyup",
	"languagechange",
	"load",
	"loadeddata",
	"loadedmetadata",
	"loadend",
	"loadstart",
	"lostpointercapture",
	"message",
	"messageerror",
	"mousedown",
	"mouseenter",
	"mouseleave",
	"mousemove",
	"mouseout",
	"mouseover",
	"mouseup",
	"offline",
	"online",
	"pagehide",
	"pageshow",
	"paste",
	"pause",
	"play",
	"playing",
	"pointercancel",
	"pointerdown",
	"pointerenter",
	"pointerleave",
	"pointermove",
	"pointerout",
	"pointerover",
	"pointerup",
	"popstate",
	"progress",
	"ratechange",
	"rejectionhandled",
	"reset",
	"resize",
	"scroll",
	"scrollend",
	"securitypolicyviolation",
	"seeked",
	"seeking",
	"select",
	"selectionchange",
	"selectstart",
	"slotchange",
	"stalled",
	"storage",
	"submit",
	"suspend",
	"timeupdate",
	"toggle",
	"touchcancel",
	"touchend",
	"touchmove",
	"touchstart",
	"transitioncancel",
	"transitionend",
	"transitionrun",
	"transitionstart",
	"unhandledrejection",
	"unload",
	"volumechange",
	"waiting",
	"wheel",
];

/// If `name` is an event property like `onClick`, returns its canonical event type (`click`).
#[must_use]
pub fn event_type(name: &str) -> Option<String> {
	let rest = name.strip_prefix("on")?;
	let event_type = rest.to_ascii_lowercase();
	EVENT_TYPES.binary_search(&event_type.as_str()).ok().map(|_| event_type)
}

/// The native attribute name for a property, resolving host aliases.
#[must_use]
pub fn attribute_name(name: &str) -> &str {
	match name {
		"className" => "class",
		"htmlFor" => "for",
		name => name,
	}
}

/// Properties that steer the host and are never written as attributes.
pub const CHILDREN: &str = "children";
pub const STYLE: &str = "style";
pub const AUTO_FOCUS: &str = "autoFocus";
