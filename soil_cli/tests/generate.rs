mod common;

use clap::Parser;
use predicates::prelude::PredicateBooleanExt;
use soil_cli::Commands;
use soil_cli::SoilCli;
use soil_core::AnyEmptyResult;

#[test]
fn generate_writes_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path())?;

	common::soil_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Generated 2 file(s)."));

	let account = std::fs::read_to_string(tmp.path().join("out/Account.swift"))?;
	assert!(account.contains("struct Account"));
	assert!(account.contains("var name: String"));
	assert!(tmp.path().join("out/Post.swift").is_file());

	Ok(())
}

#[test]
fn generate_kotlin_with_extensions() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_files(
		tmp.path(),
		&[
			(
				"soil.toml",
				"root_dir = \"schema\"\nlanguages = [\"kotlin\"]\nexport_dir = \"out\"\n\n[generate.kotlin]\npackage = \"com.example.api\"\nuse = [\"kotlin-serialization\"]\n",
			),
			("schema/account.soil", common::ACCOUNT_SCHEMA),
			("schema/post.soil", common::POST_SCHEMA),
		],
	)?;

	common::soil_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Generated 2 file(s)."));

	let account = std::fs::read_to_string(tmp.path().join("out/Account.kt"))?;
	assert!(account.starts_with("package com.example.api\n"));
	assert!(account.contains("@Serializable\ndata class Account("));
	assert!(account.ends_with("}\n"));
	assert!(tmp.path().join("out/Post.kt").is_file());

	Ok(())
}

#[test]
fn generate_dry_run_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path())?;

	common::soil_cmd()
		.args(["generate", "--dry-run", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("would write 2 file(s)")
				.and(predicates::str::contains("Account.swift (swift)")),
		);

	assert!(!tmp.path().join("out").exists());

	Ok(())
}

#[test]
fn generate_check_passes_after_generate() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path())?;

	common::soil_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::soil_cmd()
		.args(["generate", "--check", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("up to date"));

	Ok(())
}

#[test]
fn generate_check_reports_stale_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path())?;

	common::soil_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	std::fs::write(tmp.path().join("out/Post.swift"), "// edited by hand\n")?;

	common::soil_cmd()
		.args(["generate", "--check", "--path"])
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(
			predicates::str::contains("1 generated file(s) are out of date")
				.and(predicates::str::contains("Post.swift"))
				.and(predicates::str::contains("-// edited by hand"))
				.and(predicates::str::contains("Account.swift").not()),
		);

	Ok(())
}

#[test]
fn generate_check_reports_missing_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path())?;

	common::soil_cmd()
		.args(["generate", "--check", "--path"])
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("2 generated file(s) are out of date"));

	Ok(())
}

#[test]
fn generate_continues_past_broken_schema() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path())?;
	common::write_files(tmp.path(), &[("schema/broken.soil", "entity Broken {\n  field id: Integer\n")])?;

	common::soil_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stdout(predicates::str::contains("Generated 2 file(s)."))
		.stderr(predicates::str::contains("broken.soil"));

	assert!(tmp.path().join("out/Account.swift").is_file());
	assert!(!tmp.path().join("out/Broken.swift").exists());

	Ok(())
}

#[test]
fn generate_language_flag_overrides_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path())?;

	common::soil_cmd()
		.args(["generate", "--language", "kotlin", "--path"])
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unsupported language"));

	Ok(())
}

#[test]
fn generate_without_languages_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_files(
		tmp.path(),
		&[
			("soil.toml", "export_dir = \"out\"\n"),
			("account.soil", common::ACCOUNT_SCHEMA),
		],
	)?;

	common::soil_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("no languages to generate"));

	Ok(())
}

#[test]
fn generate_without_export_dir_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_files(tmp.path(), &[("account.soil", common::ACCOUNT_SCHEMA)])?;

	common::soil_cmd()
		.args(["generate", "-l", "swift", "--path"])
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("export_dir"));

	Ok(())
}

#[test]
fn generate_invalid_config_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_files(tmp.path(), &[("soil.toml", "languages = swift\n")])?;

	common::soil_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2);

	Ok(())
}

#[test]
fn generate_verbose_lists_scanned_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path())?;

	common::soil_cmd()
		.args(["generate", "--dry-run", "--verbose", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("2 schema file(s), 2 declaration(s)")
				.and(predicates::str::contains("account.soil")),
		);

	Ok(())
}

#[test]
fn no_subcommand_prints_hint() {
	common::soil_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("soil --help"));
}

#[test]
fn parse_generate_flags() {
	let cli = SoilCli::parse_from(["soil", "generate", "-l", "swift", "--language", "kotlin", "--dry-run"]);

	match cli.command {
		Some(Commands::Generate {
			language,
			dry_run,
			check,
		}) => {
			assert_eq!(language, vec!["swift", "kotlin"]);
			assert!(dry_run);
			assert!(!check);
		}
		_ => panic!("expected the generate command"),
	}
}

#[test]
fn check_conflicts_with_dry_run() {
	let result = SoilCli::try_parse_from(["soil", "generate", "--check", "--dry-run"]);
	assert!(result.is_err());
}
