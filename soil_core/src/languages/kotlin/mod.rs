//! Kotlin data classes and endpoint descriptions.
//!
//! Every entity becomes `<Entity>.kt` in the configured `package`. Fields
//! become constructor properties of a `data class`, writable fields are
//! collected in a nested `Draft` and endpoints become nested classes with a
//! `UrlBuilder` helper. The optional extensions in [`extensions`] are turned
//! on through `use` in `[generate.kotlin]`:
//!
//! ```toml
//! [generate.kotlin]
//! package = "com.example.api"
//! use = ["kotlin-serialization", "okhttp"]
//! import = ["com.example.Endpoint"]
//! indent_length = 2
//! ```

use serde_json::Value;

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

pub mod extensions;

pub const LANGUAGE: &str = "kotlin";

/// Active while rendering a nested `Draft` class.
pub const DRAFT_ENV: &str = "draft";
/// Active while rendering request bodies and query properties.
pub const MUTATING_ENV: &str = "mutating";
/// Drops comments while pretty printing.
pub const STRIP_COMMENT_ENV: &str = "strip-comment";

pub const DEFAULT_PACKAGE: &str = "com.soil";
pub const DEFAULT_INDENT_LENGTH: usize = 4;

/// Alias of `android.net.Uri.Builder` used by endpoint classes.
const URL_BUILDER: &str = "UrlBuilder";

/// Fields declared by the current class. The draft holds the annotated
/// (writable) fields only.
fn member_condition(cx: &RenderContext<'_>) -> &'static str {
	if cx.in_env(DRAFT_ENV) {
		"* field"
	} else {
		"!write-only field"
	}
}

fn kotlin_type(schema_type: &str) -> &str {
	match schema_type {
		"Integer" => "Int",
		"Number" => "Double",
		"Timestamp" => "LocalDateTime",
		"URL" => "Uri",
		other => other,
	}
}

/// Names of the `:id` and `$id` segments of an endpoint path.
fn path_parameters(path: &str) -> impl Iterator<Item = &str> {
	path.split('/')
		.filter_map(|segment| segment.strip_prefix(':').or_else(|| segment.strip_prefix('$')))
}

pub fn install(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	install_entity(builder)?;
	install_imports(builder)?;
	install_field(builder)?;
	install_endpoint(builder)?;
	install_types(builder)?;
	install_hooks(builder)?;
	extensions::install(builder)?;

	Ok(())
}

fn install_entity(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.blueprint("kotlin:file:entity", |cx| {
			let name = cx.require("name")?;
			cx.file(&name, "kt");
			cx.block("content")
		})?
		.blueprint("kotlin:content:entity", |cx| {
			let package = cx.config_str("package").unwrap_or(DEFAULT_PACKAGE);
			cx.write(format!("package {package}\n\n"));
			cx.block("file-header")?;
			cx.block("open")?;
			cx.dig("field", |cx| cx.block("enum"))?;
			cx.dig("field", |cx| cx.block("schema"))?;

			if writable(cx) {
				cx.block("draft")?;
			}

			cx.dig("endpoint", |cx| cx.block("declaration"))?;
			cx.block("close")
		})?
		.blueprint("kotlin:file-header:entity", |cx| cx.block("imports"))?
		.blueprint("kotlin:draft", |cx| {
			cx.env(DRAFT_ENV, |cx| {
				cx.block("open")?;
				cx.block("close")
			})
		})?
		// Entities, `*` fields and drafts share the class layout.
		.blueprint("kotlin:open", |cx| {
			let condition = member_condition(cx);
			cx.write(if cx.exists(condition) { "data class " } else { "class " });
			cx.statement("signature")?;
			cx.statement("init")?;
			cx.write(" {\n");
			Ok(())
		})?
		.blueprint("kotlin:signature:entity", |cx| {
			let name = if cx.in_env(DRAFT_ENV) {
				"Draft".into()
			} else {
				cx.require("name")?
			};
			cx.write(name);
			Ok(())
		})?
		.blueprint("kotlin:init", |cx| {
			let condition = member_condition(cx);
			if !cx.exists(condition) {
				return Ok(());
			}

			cx.write("(\n");
			cx.dig(condition, |cx| {
				cx.statement("member")?;
				cx.write("\n");
				Ok(())
			})?;
			cx.write(")");
			Ok(())
		})?
		.blueprint("kotlin:close", |cx| {
			cx.write("}");
			Ok(())
		})?;

	Ok(())
}

fn install_imports(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.blueprint("kotlin:imports:entity", |cx| {
			if cx.exists("endpoint") {
				cx.write(format!("import android.net.Uri.Builder as {URL_BUILDER}\n"));
			}

			for name in cx.config_strings("import") {
				cx.write(format!("import {name}\n"));
			}

			cx.dig_deep("has(type)", |cx| {
				let imports = cx.capture("imports")?;
				cx.write(imports);
				Ok(())
			})
		})?
		.blueprint("kotlin:imports", |cx| {
			match cx.capture("raw-type")?.as_str() {
				"LocalDateTime" => cx.write("import java.time.LocalDateTime\n"),
				"Uri" => cx.write("import android.net.Uri\n"),
				_ => {}
			}
			Ok(())
		})?;

	Ok(())
}

fn install_field(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.blueprint("kotlin:name", |cx| {
			let name = camelize(&cx.require("name")?);
			cx.write(name);
			Ok(())
		})?
		.blueprint("kotlin:member", |cx| {
			cx.write("val ");
			cx.statement("name")?;
			cx.write(": ");
			cx.statement("type")?;
			cx.write(",");
			Ok(())
		})?
		.blueprint("kotlin:property", |cx| {
			let keyword = if cx.in_env(DRAFT_ENV) || cx.in_env(MUTATING_ENV) {
				"var "
			} else {
				"val "
			};

			cx.write(keyword);
			cx.statement("name")?;
			cx.write(": ");
			cx.statement("type")?;

			let default = cx.capture("default-value")?;
			if !default.is_empty() {
				cx.write(format!(" = {default}"));
			}
			Ok(())
		})?
		.blueprint("kotlin:signature:field", |cx| {
			let name = if cx.in_env(DRAFT_ENV) {
				"Draft".to_string()
			} else {
				nested_name(cx)?
			};
			cx.write(name);
			Ok(())
		})?
		.blueprint("kotlin:schema:field", |cx| {
			if cx.capture("raw-type")? != "*" {
				return Ok(());
			}

			cx.block("open")?;
			cx.dig("field", |cx| cx.block("enum"))?;
			cx.dig("field", |cx| cx.block("schema"))?;

			if writable(cx) {
				cx.block("draft")?;
			}

			cx.block("close")
		})?
		.blueprint("kotlin:enum", |cx| {
			if cx.capture("raw-type")? != "Enum" {
				return Ok(());
			}

			let name = nested_name(cx)?;
			cx.write(format!("enum class {name}(val rawValue: String) {{\n"));
			cx.dig("case", |cx| {
				cx.statement("value")?;
				cx.write(",\n");
				Ok(())
			})?;
			cx.write("}");
			Ok(())
		})?
		.blueprint("kotlin:value:case", |cx| {
			let value = cx.require("value")?;
			let constant = value.to_uppercase().replace('-', "_");
			cx.write(format!("{constant}(\"{value}\")"));
			Ok(())
		})?;

	Ok(())
}

fn install_endpoint(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.blueprint("kotlin:declaration:endpoint", |cx| {
			cx.block("open")?;

			let method = cx.require("method")?;
			cx.write(format!("val method: String = \"{method}\"\n"));
			cx.write("val path: String = \"");
			cx.statement("path")?;
			cx.write("\"\n");

			cx.block("url-builder")?;
			cx.env(MUTATING_ENV, |cx| cx.dig("query", |cx| cx.block("property")))?;

			for schema in ["request", "success"] {
				cx.dig(schema, |cx| {
					cx.dig("field", |cx| cx.block("enum"))?;
					cx.dig("field", |cx| cx.block("schema"))
				})?;
			}

			cx.block("request")?;
			cx.block("response")?;
			cx.block("close")
		})?
		.blueprint("kotlin:path:endpoint", |cx| {
			let path = cx.require("path")?;
			let segments: Vec<String> = path
				.split('/')
				.filter(|segment| !segment.is_empty())
				.map(|segment| {
					match segment.strip_prefix(':').or_else(|| segment.strip_prefix('$')) {
						Some(parameter) => format!("${}", camelize(parameter)),
						None => segment.to_string(),
					}
				})
				.collect();

			cx.write(format!("/{}", segments.join("/")));
			Ok(())
		})?
		.blueprint("kotlin:open:endpoint", |cx| {
			cx.write("class ");
			cx.statement("signature")?;

			let args = cx.capture("args")?;
			if !args.is_empty() {
				cx.write(format!("(\n{args})"));
			}

			cx.write(" {");
			Ok(())
		})?
		// Constructor properties: every path parameter, then the request.
		.blueprint("kotlin:args:endpoint", |cx| {
			let path = cx.require("path")?;
			let endpoint = cx.node();

			for parameter in path_parameters(&path) {
				let target = endpoint
					.resolve(parameter)
					.filter(|node| matches!(node.directive(), "field" | "parameter"));

				match target {
					Some(target) => {
						cx.focus(target, |cx| {
							cx.statement("member")?;
							cx.write("\n");
							Ok(())
						})?;
					}
					None => {
						tracing::debug!(parameter, path = %path, "path parameter declared as string");
						cx.write(format!("val {}: String,\n", camelize(parameter)));
					}
				}
			}

			if cx.exists("request") {
				cx.write("val request: Request,\n");
			}
			Ok(())
		})?
		.blueprint("kotlin:signature:endpoint", |cx| {
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
		.blueprint("kotlin:url-builder:endpoint", |cx| {
			cx.write(format!("fun build(builder: {URL_BUILDER}): {URL_BUILDER} {{\n"));
			cx.write("builder.path(this.path)\n");
			cx.dig("query", |cx| {
				cx.statement("name")?;
				cx.write("?.also { ");
				cx.statement("build")?;
				cx.write(" }\n");
				Ok(())
			})?;
			cx.write("return builder\n");
			cx.write("}");
			Ok(())
		})?
		.blueprint("kotlin:default-value:query", |cx| {
			cx.write("null");
			Ok(())
		})?
		.blueprint("kotlin:build:query", |cx| {
			let name = cx.require("name")?;
			let value = match cx.capture("raw-type")?.as_str() {
				"Enum" => "it.rawValue",
				"Int" | "Double" => "it.toString()",
				"Boolean" => "if (it) \"1\" else \"\"",
				_ if cx.get("is-list").is_some() => "it.joinToString(\"+\")",
				_ => "it",
			};
			cx.write(format!("builder.appendQueryParameter(\"{name}\", {value})"));
			Ok(())
		})?
		.blueprint("kotlin:request:endpoint", |cx| cx.dig("request", |cx| cx.block("declaration")))?
		.blueprint("kotlin:response:endpoint", |cx| cx.dig("success", |cx| cx.block("declaration")))?
		.blueprint("kotlin:declaration:request", |cx| {
			let open = cx.capture("open")?;
			cx.write(format!("{open}\n"));
			cx.env(MUTATING_ENV, |cx| {
				cx.dig("field", |cx| {
					cx.statement("member")?;
					cx.write("\n");
					Ok(())
				})
			})?;
			cx.write(")");
			Ok(())
		})?
		.blueprint("kotlin:open:request", |cx| {
			cx.write("data class Request(");
			Ok(())
		})?
		.blueprint("kotlin:declaration:success", |cx| {
			let open = cx.capture("open")?;
			cx.write(format!("{open}\n"));
			cx.dig("field", |cx| {
				cx.statement("member")?;
				cx.write("\n");
				Ok(())
			})?;
			cx.write(")");
			Ok(())
		})?
		.blueprint("kotlin:open:success", |cx| {
			cx.write("data class Response(");
			Ok(())
		})?;

	Ok(())
}

fn install_types(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		// Element type without list, map or optional markers. Meant to be
		// captured.
		.blueprint("kotlin:raw-type", |cx| {
			let declared = cx.require("type")?;
			cx.write(kotlin_type(element_type(&declared)));
			Ok(())
		})?
		// The element type as referenced from a declaration.
		.blueprint("kotlin:type-name", |cx| {
			let mut body = cx.capture("raw-type")?;

			if body == "Enum" {
				body = nested_name(cx)?;
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

			cx.write(body);
			Ok(())
		})?
		.blueprint("kotlin:type", |cx| {
			let mut body = cx.capture("type-name")?;

			if cx.get("is-list").is_some() {
				body = format!("List<{body}>");
			} else if cx.get("is-map").is_some() {
				let key = cx.get("key").unwrap_or_default();
				body = format!("Map<{}, {body}>", kotlin_type(&key));
			}

			if cx.get("is-optional").is_some() || cx.node().directive() == "query" {
				body.push('?');
			}

			cx.write(body);
			Ok(())
		})?;

	Ok(())
}

fn install_hooks(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder
		.hook("kotlin:file:entity", |cx, next| {
			if cx.config_flag("strip_comments") {
				cx.env(STRIP_COMMENT_ENV, |cx| next.run(cx))
			} else {
				next.run(cx)
			}
		})?
		.hook("kotlin:file:entity", |cx, next| {
			next.run(cx)?;
			let indent = cx
				.config()
				.get("indent_length")
				.and_then(Value::as_u64)
				.and_then(|length| usize::try_from(length).ok())
				.unwrap_or(DEFAULT_INDENT_LENGTH);
			let options = PrettyOptions {
				blocks: vec![('{', '}'), ('(', ')')],
				..PrettyOptions::default()
			}
			.indent(" ".repeat(indent))
			.continuation(".")
			.strip_comments(cx.in_env(STRIP_COMMENT_ENV));
			cx.replace(|body| pretty_print(body, &options));
			Ok(())
		})?
		// Sorted and without duplicates.
		.hook("kotlin:imports", |cx, next| {
			next.run(cx)?;
			cx.replace(|body| {
				let mut lines: Vec<&str> = body.lines().filter(|line| !line.is_empty()).collect();
				lines.sort_unstable();
				lines.dedup();

				let mut sorted = lines.join("\n");
				if !sorted.is_empty() {
					sorted.push('\n');
				}
				sorted
			});
			Ok(())
		})?
		.hook("kotlin:open:entity", |cx, next| {
			next.run(cx)?;
			if !cx.in_env(DRAFT_ENV) {
				prepend_description(cx);
			}
			Ok(())
		})?
		.hook("kotlin:open:endpoint", |cx, next| {
			next.run(cx)?;
			prepend_description(cx);
			Ok(())
		})?
		.hook("kotlin:member", |cx, next| {
			if let Some(description) = cx.node().description() {
				cx.write(kdoc(description));
			}
			next.run(cx)
		})?;

	Ok(())
}

fn kdoc(description: &str) -> String {
	if !description.contains('\n') {
		return format!("/** {description} */\n");
	}

	let mut comment = String::from("/**\n");
	for line in description.lines() {
		if line.is_empty() {
			comment.push_str(" *\n");
		} else {
			comment.push_str(&format!(" * {line}\n"));
		}
	}
	comment.push_str(" */\n");
	comment
}

/// Put the focused node's description in front of the class header already
/// written, above any annotations added by extensions.
fn prepend_description(cx: &mut RenderContext<'_>) {
	if let Some(description) = cx.node().description() {
		let comment = kdoc(description);
		cx.replace(|body| format!("{comment}{body}"));
	}
}
