#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;
use soil_core::AnyEmptyResult;

pub const ACCOUNT_SCHEMA: &str = r"/// A registered user.
entity Account {
  field id: Integer
  mutable field name: String
}
";

pub const POST_SCHEMA: &str = r"entity Post {
  field id: Integer
  field author: Account
}
";

pub const CONFIG: &str = r#"root_dir = "schema"
languages = ["swift"]
export_dir = "out"
"#;

pub fn soil_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("soil"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

/// Write `files` relative to `root`, creating parent directories.
pub fn write_files(root: &Path, files: &[(&str, &str)]) -> AnyEmptyResult {
	for (path, content) in files {
		let path = root.join(path);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}
	Ok(())
}

/// A project with a config file and the account and post schemas.
pub fn project(root: &Path) -> AnyEmptyResult {
	write_files(
		root,
		&[
			("soil.toml", CONFIG),
			("schema/account.soil", ACCOUNT_SCHEMA),
			("schema/post.soil", POST_SCHEMA),
		],
	)
}
