//! Opt-in layers over the Kotlin blueprints, enabled by name through `use`
//! in `[generate.kotlin]`. Each extension only registers hooks (and the
//! blueprints those hooks call), entering its environment flag around
//! `kotlin:content` and checking it wherever it changes the output.
//!
//! - `kotlin-serialization`: `@Serializable` on data classes and the
//!   `kotlinx.serialization` import.
//! - `okhttp`: a `build(okhttp3.Request.Builder)` function on every endpoint.
//! - `endpoint-interface`: endpoints implement `endpoint_interface`, where
//!   `<Response>` is replaced by the response type, and the members named in
//!   `overridable_members` are marked `override`.

use regex::Regex;

use crate::BlueprintsBuilder;
use crate::RenderContext;
use crate::SoilError;
use crate::SoilResult;
use crate::languages::kotlin::LANGUAGE;

pub const KOTLIN_SERIALIZATION: &str = "kotlin-serialization";
pub const OKHTTP: &str = "okhttp";
pub const ENDPOINT_INTERFACE: &str = "endpoint-interface";

/// Every extension name accepted in `use`.
pub const EXTENSIONS: &[&str] = &[KOTLIN_SERIALIZATION, OKHTTP, ENDPOINT_INTERFACE];

pub fn install(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	builder.hook("kotlin:content", |cx, next| {
		for name in cx.config_strings("use") {
			if !EXTENSIONS.iter().any(|extension| *extension == name) {
				tracing::warn!(extension = name, "ignoring unknown kotlin extension");
			}
		}
		next.run(cx)
	})?;

	install_serialization(builder)?;
	install_okhttp(builder)?;
	install_endpoint_interface(builder)?;

	Ok(())
}

fn uses(cx: &RenderContext<'_>, extension: &str) -> bool {
	cx.config_strings("use").iter().any(|used| *used == extension)
}

/// Wrap `kotlin:content` in the environment of `extension` when it is
/// enabled.
fn enable(builder: &mut BlueprintsBuilder, extension: &'static str) -> SoilResult<()> {
	builder.hook("kotlin:content", move |cx, next| {
		if uses(cx, extension) {
			cx.env(extension, |cx| next.run(cx))
		} else {
			next.run(cx)
		}
	})?;

	Ok(())
}

fn install_serialization(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	enable(builder, KOTLIN_SERIALIZATION)?;

	builder
		.hook("kotlin:file-header:entity", |cx, next| {
			next.run(cx)?;
			if cx.in_env(KOTLIN_SERIALIZATION) {
				cx.write("import kotlinx.serialization.*\n");
			}
			Ok(())
		})?
		.hook("kotlin:open", |cx, next| {
			next.run(cx)?;
			if cx.in_env(KOTLIN_SERIALIZATION) && cx.current_body().starts_with("data class ") {
				cx.replace(|body| format!("@Serializable\n{body}"));
			}
			Ok(())
		})?
		// Platform types have no built in serializer.
		.hook("kotlin:member", |cx, next| {
			if cx.in_env(KOTLIN_SERIALIZATION) && matches!(cx.capture("raw-type")?.as_str(), "Uri" | "LocalDateTime") {
				cx.write("@Contextual\n");
			}
			next.run(cx)
		})?;

	Ok(())
}

fn install_okhttp(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	enable(builder, OKHTTP)?;

	builder
		.hook("kotlin:close:endpoint", |cx, next| {
			if cx.in_env(OKHTTP) {
				cx.block("okhttp-request-builder")?;
			}
			next.run(cx)
		})?
		.blueprint("kotlin:okhttp-request-builder:endpoint", |cx| {
			let method = cx.require("method")?.to_lowercase();
			cx.write("fun build(builder: okhttp3.Request.Builder) {\n");
			cx.write("builder\n");
			cx.write(format!(".{method}()\n"));
			cx.write("}");
			Ok(())
		})?;

	Ok(())
}

fn install_endpoint_interface(builder: &mut BlueprintsBuilder) -> SoilResult<()> {
	enable(builder, ENDPOINT_INTERFACE)?;

	builder
		.hook("kotlin:open:endpoint", |cx, next| {
			next.run(cx)?;
			if !cx.in_env(ENDPOINT_INTERFACE) {
				return Ok(());
			}

			let Some(interface) = cx.config_str("endpoint_interface") else {
				return Err(SoilError::MissingOption {
					language: LANGUAGE.to_string(),
					key: "endpoint_interface".to_string(),
				});
			};

			let response = if cx.exists("success") {
				format!("{}.Response", cx.capture("signature")?)
			} else {
				"Unit".to_string()
			};
			let supertype = interface.replace("<Response>", &format!("<{response}>"));
			cx.replace(|body| body.replacen(" {", &format!(": {supertype} {{"), 1));
			Ok(())
		})?
		.hook("kotlin:declaration:endpoint", |cx, next| {
			next.run(cx)?;
			if !cx.in_env(ENDPOINT_INTERFACE) {
				return Ok(());
			}

			let members = cx
				.config_strings("overridable_members")
				.into_iter()
				.map(overridable_member)
				.collect::<SoilResult<Vec<_>>>()?;

			cx.replace(|body| {
				members.iter().fold(body.to_string(), |text, member| {
					member.replace(&text, "override ${1}").into_owned()
				})
			});
			Ok(())
		})?;

	Ok(())
}

/// Matches the first declaration of `name`, with an optional visibility
/// modifier.
fn overridable_member(name: &str) -> SoilResult<Regex> {
	let pattern = format!(
		r"\b((?:(?:private|protected|public)\s+)?(?:val|var|fun)\s+{})\b",
		regex::escape(name)
	);

	Regex::new(&pattern).map_err(|e| {
		SoilError::InvalidOption {
			key: "overridable_members".to_string(),
			reason: e.to_string(),
		}
	})
}
