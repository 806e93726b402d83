use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::SoilError;
use crate::SoilResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["soil.toml", ".soil.toml", ".config/soil.toml"];

/// Configuration loaded from a `soil.toml` file.
///
/// ```toml
/// root_dir = "schema"
/// languages = ["swift"]
///
/// [export_dir]
/// swift = "ios/Generated"
///
/// [generate.swift]
/// strip_comments = true
///
/// [exclude]
/// patterns = ["drafts/"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SoilConfig {
	/// Directory holding the `*.soil` schema files, relative to the config
	/// file.
	#[serde(default)]
	pub root_dir: Option<PathBuf>,
	/// Where generated files are written, relative to the project root.
	#[serde(default)]
	pub export_dir: Option<ExportDir>,
	/// Languages generated when none are requested explicitly.
	#[serde(default)]
	pub languages: Vec<String>,
	/// Free-form options per language, handed to every render job.
	#[serde(default)]
	pub generate: BTreeMap<String, toml::Table>,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// The file this configuration was read from.
	#[serde(skip)]
	pub source: Option<PathBuf>,
}

/// A single export directory, or one per language.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum ExportDir {
	Path(PathBuf),
	PerLanguage(BTreeMap<String, PathBuf>),
}

impl ExportDir {
	pub fn for_language(&self, language: &str) -> Option<&Path> {
		match self {
			Self::Path(path) => Some(path.as_path()),
			Self::PerLanguage(paths) => paths.get(language).map(PathBuf::as_path),
		}
	}
}

/// Configuration for excluding schema files from scanning.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns relative to the schema directory.
	///
	/// Examples: `"drafts/"`, `"*.wip.soil"`, `"!keep.wip.soil"`.
	#[serde(default)]
	pub patterns: Vec<String>,
}

impl SoilConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> SoilResult<Option<SoilConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let mut config = Self::parse(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");
		config.source = Some(config_path);

		Ok(Some(config))
	}

	pub fn parse(content: &str) -> SoilResult<SoilConfig> {
		toml::from_str(content).map_err(|e| SoilError::ConfigParse(e.to_string()))
	}

	/// The schema directory for a project rooted at `root`.
	pub fn schema_dir(&self, root: &Path) -> PathBuf {
		let base = self
			.source
			.as_deref()
			.and_then(Path::parent)
			.unwrap_or(root);

		match &self.root_dir {
			Some(dir) => base.join(dir),
			None => base.to_path_buf(),
		}
	}

	/// The export directory of `language` for a project rooted at `root`.
	pub fn export_dir(&self, root: &Path, language: &str) -> SoilResult<PathBuf> {
		self.export_dir
			.as_ref()
			.and_then(|dir| dir.for_language(language))
			.map(|dir| root.join(dir))
			.ok_or_else(|| SoilError::MissingExportDir(language.to_string()))
	}

	/// The `[generate.<language>]` table converted into the opaque value
	/// handed to render jobs. Missing tables become an empty object.
	pub fn generate_options(&self, language: &str) -> SoilResult<serde_json::Value> {
		match self.generate.get(language) {
			Some(table) => toml_to_json(toml::Value::Table(table.clone())),
			None => Ok(serde_json::Value::Object(serde_json::Map::new())),
		}
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> SoilResult<serde_json::Value> {
	let json = match value {
		toml::Value::String(s) => serde_json::Value::String(s),
		toml::Value::Integer(i) => serde_json::Value::Number(i.into()),
		toml::Value::Float(f) => {
			serde_json::Value::Number(serde_json::Number::from_f64(f).ok_or_else(|| {
				SoilError::ConfigParse(format!("unsupported float value `{f}`"))
			})?)
		}
		toml::Value::Boolean(b) => serde_json::Value::Bool(b),
		toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: SoilResult<Vec<serde_json::Value>> = arr.into_iter().map(toml_to_json).collect();
			serde_json::Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = serde_json::Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v)?);
			}
			serde_json::Value::Object(map)
		}
	};

	Ok(json)
}
