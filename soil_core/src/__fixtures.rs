use std::sync::Arc;
use std::sync::Mutex;

use crate::*;

pub const TEST_LANGUAGE: &str = "test";

pub const ACCOUNT_SCHEMA: &str = r"/// A registered user.
entity Account {
  field id: Integer
  mutable field name: String
  write-only field password: String
  field status: Enum {
    case active
    case banned
  }
}
";

pub const POST_SCHEMA: &str = r"entity Post {
  field id: Integer
  field author: Account
  field tags: List<String>
  field meta: Map<String, Integer>
  field summary: String?
}
";

pub const ENDPOINT_SCHEMA: &str = r"entity Account {
  mutable field name: String

  /// Update an account.
  endpoint PATCH /accounts/:id {
    request {
      field account: Account
    }
    success {
      field account: Account
    }
  }

  endpoint DELETE /accounts/:id {
    action-name remove account
  }
}
";

/// A grammar with a `test` directive holding `name` children.
pub fn test_grammar() -> SoilResult<Grammar> {
	Grammar::builder()
		.directive(Directive::new("test")?.pattern(r"^[A-Z]+$")?)
		.directive(Directive::new("name")?.pattern(r"^[a-z]+$")?)
		.structure("test", ["name"])
		.root("test")
		.build()
}

/// A grammar with an annotated `field` directive allowed at the top level.
pub fn annotated_grammar() -> SoilResult<Grammar> {
	Grammar::builder()
		.directive(Directive::declare("mutable|write-only field")?.pattern(r"^(?<name>[a-z]+)$")?)
		.root("field")
		.build()
}

pub fn schema_document(source: &str) -> SoilResult<Ast> {
	parse_source(source, &schema::grammar()?)
}

/// The first top-level node of `ast`.
pub fn first_node(ast: &Ast) -> Node<'_> {
	ast.root()
		.children()
		.next()
		.unwrap_or_else(|| panic!("document has no top-level node"))
}

pub fn empty_config() -> serde_json::Value {
	serde_json::json!({})
}

/// A minimal language: one `<name>.txt` file per entity listing its fields.
pub fn minimal_blueprints() -> SoilResult<Blueprints> {
	let mut builder = Blueprints::builder();
	builder
		.blueprint("test:file:entity", |cx| {
			let name = cx.require("name")?;
			cx.file(&name, "txt");
			cx.dig("field", |cx| cx.statement("line"))
		})?
		.blueprint("test:line:field", |cx| {
			let name = cx.require("name")?;
			let kind = cx.require("type")?;
			cx.write(format!("{name}: {kind}\n"));
			Ok(())
		})?;

	Ok(builder.build())
}

/// Blueprints whose `body` phase is wrapped by two hooks recording the order
/// they run in.
pub fn recording_blueprints(log: Arc<Mutex<Vec<String>>>) -> SoilResult<Blueprints> {
	let mut builder = Blueprints::builder();

	builder.blueprint("test:file", |cx| {
		cx.file("out", "txt");
		let body = cx.capture("body")?;
		cx.write(body);
		Ok(())
	})?;

	let base_log = Arc::clone(&log);
	builder.blueprint("test:body", move |cx| {
		record(&base_log, "base");
		cx.write("base");
		Ok(())
	})?;

	for name in ["h1", "h2"] {
		let hook_log = Arc::clone(&log);
		builder.hook("test:body", move |cx, next| {
			record(&hook_log, &format!("{name}:before"));
			cx.write(format!("<{name}>"));
			next.run(cx)?;
			cx.write(format!("</{name}>"));
			record(&hook_log, &format!("{name}:after"));
			Ok(())
		})?;
	}

	Ok(builder.build())
}

fn record(log: &Mutex<Vec<String>>, entry: &str) {
	log.lock()
		.unwrap_or_else(|e| panic!("poisoned log: {e}"))
		.push(entry.to_string());
}

/// Write `files` relative to `root`, creating parent directories.
pub fn write_files(root: &std::path::Path, files: &[(&str, &str)]) -> SoilResult<()> {
	for (path, content) in files {
		let path = root.join(path);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}
	Ok(())
}
