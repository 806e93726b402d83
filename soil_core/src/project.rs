use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::Ast;
use crate::Blueprints;
use crate::Grammar;
use crate::RenderFailure;
use crate::SoilConfig;
use crate::SoilError;
use crate::SoilResult;
use crate::parse_source;
use crate::schema;

/// File extension of schema sources.
pub const SCHEMA_EXTENSION: &str = "soil";

/// A schema file which could not be read or parsed.
#[derive(Debug)]
pub struct SourceFailure {
	pub file: PathBuf,
	pub error: SoilError,
}

/// A scanned project: its configuration and the merged document of every
/// schema file which parsed successfully.
#[derive(Debug)]
pub struct ProjectContext {
	/// The project root.
	pub root: PathBuf,
	/// The loaded config, or the defaults when no config file exists.
	pub config: SoilConfig,
	/// Every schema file found, sorted.
	pub files: Vec<PathBuf>,
	/// The merged document.
	pub document: Ast,
	/// Files which failed to parse. They are left out of `document`.
	pub failures: Vec<SourceFailure>,
}

impl ProjectContext {
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}

	/// The languages to generate: `requested` when not empty, otherwise the
	/// configured ones. Duplicates are dropped.
	pub fn languages(&self, requested: &[String]) -> Vec<String> {
		let source = if requested.is_empty() {
			self.config.languages.as_slice()
		} else {
			requested
		};

		let mut languages: Vec<String> = Vec::with_capacity(source.len());
		for language in source {
			if !languages.contains(language) {
				languages.push(language.clone());
			}
		}
		languages
	}
}

/// A generated file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
	pub language: String,
	pub path: PathBuf,
	pub body: String,
}

impl GeneratedFile {
	/// Whether the file on disk is missing or differs from `body`.
	pub fn is_stale(&self) -> bool {
		!std::fs::read_to_string(&self.path).is_ok_and(|current| current == self.body)
	}
}

/// The outcome of generating every language for a project.
#[derive(Debug, Default)]
pub struct GenerateResult {
	pub files: Vec<GeneratedFile>,
	pub failures: Vec<RenderFailure>,
}

impl GenerateResult {
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Scan the project at `root` with the standard schema grammar.
pub fn scan_project(root: &Path) -> SoilResult<ProjectContext> {
	scan_project_with_grammar(root, &schema::grammar()?)
}

/// Scan the project at `root`: load the config, collect the schema files and
/// parse each of them. A file which fails to parse is recorded and the scan
/// continues.
pub fn scan_project_with_grammar(root: &Path, grammar: &Grammar) -> SoilResult<ProjectContext> {
	let config = SoilConfig::load(root)?.unwrap_or_default();
	let schema_dir = config.schema_dir(root);
	let files = collect_sources(&schema_dir, &config.exclude.patterns)?;
	let (document, failures) = parse_sources(&files, grammar);

	tracing::debug!(
		files = files.len(),
		failures = failures.len(),
		"scanned project"
	);

	Ok(ProjectContext {
		root: root.to_path_buf(),
		config,
		files,
		document,
		failures,
	})
}

/// Parse every file independently and merge the successful ones.
pub fn parse_sources(files: &[PathBuf], grammar: &Grammar) -> (Ast, Vec<SourceFailure>) {
	let mut document = Ast::new();
	let mut failures = vec![];

	for file in files {
		let parsed = std::fs::read_to_string(file)
			.map_err(SoilError::from)
			.and_then(|source| parse_source(&source, grammar));

		match parsed {
			Ok(ast) => {
				tracing::debug!(file = %file.display(), nodes = ast.len(), "parsed schema");
				document.merge(ast);
			}
			Err(error) => {
				tracing::warn!(file = %file.display(), %error, "failed to parse schema");
				failures.push(SourceFailure {
					file: file.clone(),
					error,
				});
			}
		}
	}

	(document, failures)
}

/// Render every top-level node for every language. A failing render job is
/// recorded and the remaining jobs still run.
pub fn generate(ctx: &ProjectContext, blueprints: &Blueprints, languages: &[String]) -> SoilResult<GenerateResult> {
	let mut result = GenerateResult::default();

	for language in languages {
		if !blueprints.supports(language) {
			return Err(SoilError::UnsupportedLanguage(language.clone()));
		}

		let export_dir = ctx.config.export_dir(&ctx.root, language)?;
		let options = ctx.config.generate_options(language)?;
		let outcome = blueprints.render_document(language, &ctx.document, &options);

		for artifact in outcome.artifacts {
			let mut body = artifact.body;
			if !body.ends_with('\n') {
				body.push('\n');
			}

			result.files.push(GeneratedFile {
				language: language.clone(),
				path: export_dir.join(&artifact.filename),
				body,
			});
		}

		result.failures.extend(outcome.failures);
	}

	Ok(result)
}

/// Write generated files, creating directories as needed.
pub fn write_generated(files: &[GeneratedFile]) -> SoilResult<()> {
	for file in files {
		if let Some(parent) = file.path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&file.path, &file.body)?;
	}
	Ok(())
}

/// Generated files whose on-disk content is missing or different.
pub fn stale_files(files: &[GeneratedFile]) -> Vec<&GeneratedFile> {
	files.iter().filter(|file| file.is_stale()).collect()
}

/// Build a `Gitignore` matcher from exclude patterns specified in
/// `soil.toml` `[exclude]`.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> SoilResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			SoilError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| SoilError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Collect every `*.soil` file below `root`, sorted.
pub fn collect_sources(root: &Path, exclude_patterns: &[String]) -> SoilResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();
	let exclude = build_exclude_matcher(root, exclude_patterns)?;

	walk_dir(root, &mut files, &exclude, &mut visited_dirs)?;
	files.sort();
	Ok(files)
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

fn is_schema_file(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext == SCHEMA_EXTENSION)
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	exclude: &Gitignore,
	visited_dirs: &mut HashSet<PathBuf>,
) -> SoilResult<()> {
	if !dir.is_dir() {
		return Ok(());
	}

	// Symlink cycles show up as an already visited canonical path.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Err(SoilError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
			if is_ignored_directory_name(name) {
				continue;
			}
		}

		let is_dir = path.is_dir();
		if exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(&path, files, exclude, visited_dirs)?;
		} else if is_schema_file(&path) {
			files.push(path);
		}
	}

	Ok(())
}
