//! Swift models and request descriptions.
//!
//! Every entity becomes `<Entity>.swift` containing a `Codable` struct. When
//! the entity has `mutable` or `write-only` fields, the struct becomes
//! `Decodable` and gains a nested `Draft: Encodable` holding the writable
//! fields. Fields typed `*` declare a nested struct named after the field.
//! Endpoints become nested structs describing the method, path, request and
//! response.

use crate::BlueprintsBuilder;
use crate::PrettyOptions;
use crate::RenderContext;
use crate::SoilResult;
use crate::languages::element_type;
use crate::languages::nested_name;
use crate::languages::writable;
use crate::pretty_print;
use crate::util::camelize;
use crate::util::capitalize;
use crate::util::sentence;

pub const LANGUAGE: &str = "swift";

/// Active while rendering the nested `Draft` struct.
pub const DRAFT_ENV: &str = "draft";
/// Active while rendering a request body.
pub const MUTATING_ENV: &str = "mutating";
/// Drops generated header comments.
pub const STRIP_COMMENT_ENV: &str = "strip-comment";

/// Fields rendered in the current struct. The draft holds the annotated
/// (writable) fields only.
fn field_condition(cx: &RenderContext<'_>) -> &'static str {
	if cx.in_env(DRAFT_ENV) {
		"* field"
	} else {
		"!write-only field"
	}
}

fn swift_type(schema_type: &str) -> &str {
	match schema_type {
		"Integer" => "Int",
		"Number" => "Double",
		"Boolean" => "Bool",
		"Timestamp" => "Date",
		other => other,
	}
}

pub fn install(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	install_entity(builder)?;
	install_field(builder)?;
	install_endpoint(builder)?;
	install_types(builder)?;
	install_hooks(builder)?;

	Ok(())
}

fn install_entity(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.blueprint("swift:file:entity", |cx| {
			let name = cx.require("name")?;
			cx.file(&name, "swift");
			cx.block("content")
		})?
		.blueprint("swift:content:entity", |cx| {
			cx.block("file-header")?;
			cx.block("open")?;
			cx.dig("field", |cx| cx.block("enum"))?;
			cx.dig("field", |cx| cx.block("schema"))?;
			cx.block("init")?;

			if writable(cx) {
				cx.block("draft")?;
			}

			cx.dig("endpoint", |cx| cx.block("declaration"))?;
			cx.block("close")
		})?
		.blueprint("swift:file-header:entity", |cx| {
			if cx.in_env(STRIP_COMMENT_ENV) {
				return Ok(());
			}

			let name = cx.require("name")?;
			cx.write("//\n");
			cx.write(format!("// {name}.swift\n"));
			cx.write("//\n");
			cx.write("// Generated by soil\n");
			cx.write("//\n");
			Ok(())
		})?
		.blueprint("swift:draft", |cx| {
			cx.env(DRAFT_ENV, |cx| {
				cx.block("open")?;
				cx.block("init")?;
				cx.block("close")
			})
		})?
		// Entities and `*` fields share the struct layout.
		.blueprint("swift:open", |cx| {
			let protocol = if cx.in_env(DRAFT_ENV) {
				"Encodable"
			} else if writable(cx) {
				"Decodable"
			} else {
				"Codable"
			};

			let condition = field_condition(cx);
			cx.write("struct ");
			cx.statement("type-name")?;
			cx.write(format!(": {protocol} {{\n"));
			cx.dig(condition, |cx| cx.block("property"))
		})?
		.blueprint("swift:type-name:entity", |cx| {
			let name = if cx.in_env(DRAFT_ENV) {
				"Draft".into()
			} else {
				cx.require("name")?
			};
			cx.write(name);
			Ok(())
		})?
		.blueprint("swift:init", |cx| {
			let condition = field_condition(cx);
			let mut parameters = vec![];
			cx.dig(condition, |cx| {
				parameters.push(cx.capture("signature")?);
				Ok(())
			})?;

			cx.write(format!("init({}) {{\n", parameters.join(", ")));
			cx.dig(condition, |cx| {
				cx.statement("assign")?;
				cx.write("\n");
				Ok(())
			})?;
			cx.write("}");
			Ok(())
		})?
		.blueprint("swift:close", |cx| {
			cx.write("}");
			Ok(())
		})?;

	Ok(())
}

fn install_field(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.blueprint("swift:name:field", |cx| {
			let name = camelize(&cx.require("name")?);
			cx.write(name);
			Ok(())
		})?
		.blueprint("swift:property:field", |cx| {
			cx.write(if cx.in_env(DRAFT_ENV) { "var " } else { "let " });
			cx.statement("name")?;
			cx.write(": ");
			cx.statement("type")
		})?
		.blueprint("swift:signature:field", |cx| {
			cx.statement("name")?;
			cx.write(": ");
			cx.statement("type")
		})?
		.blueprint("swift:assign:field", |cx| {
			cx.write("self.");
			cx.statement("name")?;
			cx.write(" = ");
			cx.statement("name")
		})?
		.blueprint("swift:enum:field", |cx| {
			if cx.capture("raw-type")? != "Enum" {
				return Ok(());
			}

			cx.write("enum ");
			cx.statement("enum-name")?;
			cx.write(": String, Codable {\n");
			cx.dig("case", |cx| {
				cx.statement("member")?;
				cx.write("\n");
				Ok(())
			})?;
			cx.write("}");
			Ok(())
		})?
		.blueprint("swift:enum-name:field", |cx| {
			let name = nested_name(cx)?;
			cx.write(name);
			Ok(())
		})?
		.blueprint("swift:schema:field", |cx| {
			if cx.capture("raw-type")? != "*" {
				return Ok(());
			}

			cx.block("open")?;
			cx.dig("field", |cx| cx.block("enum"))?;
			cx.dig("field", |cx| cx.block("schema"))?;
			cx.block("init")?;

			if writable(cx) {
				cx.block("draft")?;
			}

			cx.block("close")
		})?
		.blueprint("swift:type-name:field", |cx| {
			let name = if cx.in_env(DRAFT_ENV) {
				"Draft".to_string()
			} else {
				nested_name(cx)?
			};
			cx.write(name);
			Ok(())
		})?
		.blueprint("swift:member:case", |cx| {
			let value = cx.require("value")?;
			cx.write(format!("case {} = \"{value}\"", camelize(&value)));
			Ok(())
		})?;

	Ok(())
}

fn install_endpoint(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.blueprint("swift:declaration:endpoint", |cx| {
			cx.write("struct ");
			cx.statement("name")?;
			cx.write(" {\n\n");
			let method = cx.require("method")?;
			let path = cx.require("path")?;
			cx.write(format!("let method: String = \"{method}\"\n"));
			cx.write(format!("let path: String = \"{path}\"\n"));

			cx.env("request", |cx| cx.block("request"))?;
			cx.block("response")?;
			cx.block("close")
		})?
		.blueprint("swift:name:endpoint", |cx| {
			let method = cx.require("method")?;
			let path = cx.require("path")?.replace('$', "");
			let mut name = capitalize(&format!("{method} {}", sentence(&path)), "");

			cx.dig("action-name", |cx| {
				name = capitalize(&cx.require("value")?, "");
				Ok(())
			})?;

			cx.write(format!("{name}Endpoint"));
			Ok(())
		})?
		.blueprint("swift:request:endpoint", |cx| {
			if cx.exists("request") {
				cx.dig("request", |cx| cx.block("declaration"))
			} else {
				cx.write("typealias Request = Void");
				Ok(())
			}
		})?
		.blueprint("swift:response:endpoint", |cx| {
			if cx.exists("success") {
				cx.dig("success", |cx| cx.block("declaration"))
			} else {
				cx.write("typealias Response = Void");
				Ok(())
			}
		})?
		.blueprint("swift:declaration:request", |cx| {
			cx.block("open")?;
			cx.dig("field", |cx| cx.block("enum"))?;
			cx.dig("field", |cx| cx.block("schema"))?;
			cx.env(MUTATING_ENV, |cx| cx.dig("field", |cx| cx.block("property")))?;
			cx.block("close")
		})?
		.blueprint("swift:open:request", |cx| {
			cx.write("struct Request: Encodable {");
			Ok(())
		})?
		.blueprint("swift:declaration:success", |cx| {
			cx.block("open")?;
			cx.dig("field", |cx| cx.block("enum"))?;
			cx.dig("field", |cx| cx.block("schema"))?;
			cx.dig("field", |cx| cx.block("property"))?;
			cx.block("close")
		})?
		.blueprint("swift:open:success", |cx| {
			cx.write("struct Response: Decodable {");
			Ok(())
		})?;

	Ok(())
}

fn install_types(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		// Element type without list, map or optional markers. Meant to be
		// captured.
		.blueprint("swift:raw-type", |cx| {
			let declared = cx.require("type")?;
			cx.write(swift_type(element_type(&declared)));
			Ok(())
		})?
		.blueprint("swift:type:field", |cx| {
			let mut body = cx.capture("raw-type")?;

			if body == "Enum" {
				body = cx.capture("enum-name")?;
			} else if body == "*" {
				body = nested_name(cx)?;
				if cx.in_env(MUTATING_ENV) && writable(cx) {
					body.push_str(".Draft");
				}
			} else if cx.in_env(MUTATING_ENV) {
				let target = cx.node().resolve(&body).filter(|node| node.directive() == "entity");
				if let Some(target) = target {
					let mut drafted = false;
					cx.focus(target, |cx| {
						drafted = writable(cx);
						Ok(())
					})?;
					if drafted {
						body.push_str(".Draft");
					}
				}
			}

			if cx.get("is-list").is_some() {
				body = format!("[{body}]");
			} else if cx.get("is-map").is_some() {
				let key = cx.get("key").unwrap_or_default();
				body = format!("[{}: {body}]", swift_type(&key));
			}

			if cx.get("is-optional").is_some() {
				body.push('?');
			}

			cx.write(body);
			Ok(())
		})?;

	Ok(())
}

fn install_hooks(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.hook("swift:file:entity", |cx, next| {
			if cx.config_flag("strip_comments") {
				cx.env(STRIP_COMMENT_ENV, |cx| next.run(cx))
			} else {
				next.run(cx)
			}
		})?
		.hook("swift:file:entity", |cx, next| {
			next.run(cx)?;
			let options = PrettyOptions::default()
				.indent("    ")
				.strip_comments(cx.in_env(STRIP_COMMENT_ENV));
			cx.replace(|body| pretty_print(body, &options));
			Ok(())
		})?
		.hook("swift:open:entity", |cx, next| {
			if !cx.in_env(DRAFT_ENV) {
				write_description(cx);
			}
			next.run(cx)
		})?
		.hook("swift:property:field", |cx, next| {
			write_description(cx);
			next.run(cx)
		})?
		.hook("swift:declaration:endpoint", |cx, next| {
			write_description(cx);
			next.run(cx)
		})?;

	Ok(())
}

fn write_description(cx: &mut RenderContext<'_>) {
	let Some(description) = cx.node().description() else {
		return;
	};

	for line in description.lines() {
		if line.is_empty() {
			cx.write("///\n");
		} else {
			cx.write(format!("/// {line}\n"));
		}
	}
}
