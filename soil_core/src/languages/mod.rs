//! Target language modules. Each module registers its blueprints and hooks
//! through [`BlueprintsBuilder`] only.

use crate::Blueprints;
use crate::BlueprintsBuilder;
use crate::Node;
use crate::RenderContext;
use crate::SoilError;
use crate::SoilResult;
use crate::util::capitalize;
use crate::util::singular;

pub mod kotlin;
pub mod swift;

/// Every language that can be generated.
pub const SUPPORTED: &[&str] = &[swift::LANGUAGE, kotlin::LANGUAGE];

/// Primitive schema types.
pub const PRIMITIVE_TYPES: &[&str] = &["String", "Integer", "Number", "Boolean", "Timestamp", "URL"];

/// Install the blueprints of `language`.
pub fn install(builder: &mut BlueprintsBuilder, language: &str) -> SoilResult<()> {
	match language {
		swift::LANGUAGE => swift::install(builder),
		kotlin::LANGUAGE => kotlin::install(builder),
		other => Err(SoilError::UnsupportedLanguage(other.to_string())),
	}
}

/// Build a registry holding the shared attributes and every requested
/// language.
pub fn blueprints<S: AsRef<str>>(languages: &[S]) -> SoilResult<Blueprints> {
	let mut builder = Blueprints::builder();
	install_shared(&mut builder);

	for language in languages {
		install(&mut builder, language.as_ref())?;
	}

	Ok(builder.build())
}

/// Derived attributes on typed declarations used by every language.
pub fn install_shared(builder: &mut BlueprintsBuilder) {
	builder
		.attribute("is-list", "has(type)", |node| {
			field_type(node)
				.starts_with("List<")
				.then(|| "list".to_string())
		})
		.attribute("is-map", "has(type)", |node| {
			field_type(node)
				.starts_with("Map<")
				.then(|| "map".to_string())
		})
		.attribute("is-optional", "has(type)", |node| {
			field_type(node)
				.ends_with('?')
				.then(|| "optional".to_string())
		})
		.attribute("key", "has(type)", |node| {
			let inner = field_type(node).strip_prefix("Map<")?;
			let (key, _) = inner.split_once(',')?;
			Some(key.trim().to_string())
		})
		.attribute("element", "has(type)", |node| Some(element_type(field_type(node)).to_string()))
		.attribute("primitive", "has(type)", |node| {
			let element = element_type(field_type(node));
			PRIMITIVE_TYPES
				.contains(&element)
				.then(|| element.to_string())
		});
}

fn field_type(node: Node<'_>) -> &str {
	node.get("type").unwrap_or_default().trim()
}

/// The element type of a declared type: `List<Tag>?` becomes `Tag` and
/// `Map<String, Tag>` becomes `Tag`.
pub fn element_type(declared: &str) -> &str {
	let declared = declared.trim();
	let declared = declared.strip_suffix('?').unwrap_or(declared);

	if let Some(inner) = declared
		.strip_prefix("List<")
		.and_then(|inner| inner.strip_suffix('>'))
	{
		return inner.trim();
	}

	if let Some(inner) = declared
		.strip_prefix("Map<")
		.and_then(|inner| inner.strip_suffix('>'))
	{
		return inner.split_once(',').map_or(inner, |(_, value)| value).trim();
	}

	declared
}

/// Whether the focused declaration has fields a client may send, which
/// calls for a nested `Draft` type.
pub fn writable(cx: &RenderContext<'_>) -> bool {
	cx.exists("mutable field") || cx.exists("write-only field")
}

/// The name of a type declared by the focused field: `shipping_address`
/// becomes `ShippingAddress`, singular for lists.
pub fn nested_name(cx: &RenderContext<'_>) -> SoilResult<String> {
	let name = capitalize(&cx.require("name")?, "");
	if cx.get("is-list").is_some() {
		Ok(singular(&name))
	} else {
		Ok(name)
	}
}
