use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::Artifact;
use crate::Ast;
use crate::Matcher;
use crate::Node;
use crate::RenderContext;
use crate::SoilError;
use crate::SoilResult;

/// The phase every top-level render starts with.
pub const FILE_PHASE: &str = "file";

/// A render procedure registered for one [`BlueprintKey`].
pub type Procedure = Arc<dyn Fn(&mut RenderContext<'_>) -> SoilResult<()> + Send + Sync>;

/// Middleware wrapping the procedure of a [`BlueprintKey`]. A hook which never
/// runs `next` suppresses everything it wraps.
pub type Hook = Arc<dyn Fn(&mut RenderContext<'_>, Next<'_>) -> SoilResult<()> + Send + Sync>;

type Derive = Arc<dyn Fn(Node<'_>) -> Option<String> + Send + Sync>;

/// The structured dispatch key `language:phase[:directive[:annotation]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlueprintKey {
	pub language: String,
	pub phase: String,
	pub directive: Option<String>,
	pub annotation: Option<String>,
}

impl BlueprintKey {
	pub fn new(language: impl Into<String>, phase: impl Into<String>) -> Self {
		Self {
			language: language.into(),
			phase: phase.into(),
			directive: None,
			annotation: None,
		}
	}

	#[must_use]
	pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
		self.directive = Some(directive.into());
		self
	}

	#[must_use]
	pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
		self.annotation = Some(annotation.into());
		self
	}

	/// Keys to try for `node`, most specific first.
	pub fn candidates(language: &str, phase: &str, node: Node<'_>) -> Vec<BlueprintKey> {
		let base = BlueprintKey::new(language, phase);
		let directed = base.clone().with_directive(node.directive());
		let mut keys = Vec::with_capacity(3);

		if let Some(annotation) = node.annotation() {
			keys.push(directed.clone().with_annotation(annotation));
		}

		keys.push(directed);
		keys.push(base);
		keys
	}
}

impl FromStr for BlueprintKey {
	type Err = SoilError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let parts: Vec<&str> = value.split(':').collect();

		if parts.iter().any(|part| part.trim().is_empty() || part.trim() != *part) {
			return Err(SoilError::InvalidBlueprintKey(value.to_string()));
		}

		match parts.as_slice() {
			[language, phase] => Ok(Self::new(*language, *phase)),
			[language, phase, directive] => Ok(Self::new(*language, *phase).with_directive(*directive)),
			[language, phase, directive, annotation] => {
				Ok(Self::new(*language, *phase)
					.with_directive(*directive)
					.with_annotation(*annotation))
			}
			_ => Err(SoilError::InvalidBlueprintKey(value.to_string())),
		}
	}
}

impl Display for BlueprintKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.language, self.phase)?;

		if let Some(directive) = &self.directive {
			write!(f, ":{directive}")?;
		}

		if let Some(annotation) = &self.annotation {
			write!(f, ":{annotation}")?;
		}

		Ok(())
	}
}

/// Anything that can name a blueprint key.
pub trait IntoBlueprintKey {
	fn into_blueprint_key(self) -> SoilResult<BlueprintKey>;
}

impl IntoBlueprintKey for BlueprintKey {
	fn into_blueprint_key(self) -> SoilResult<BlueprintKey> {
		Ok(self)
	}
}

impl IntoBlueprintKey for &str {
	fn into_blueprint_key(self) -> SoilResult<BlueprintKey> {
		self.parse()
	}
}

impl IntoBlueprintKey for String {
	fn into_blueprint_key(self) -> SoilResult<BlueprintKey> {
		self.parse()
	}
}

/// The continuation handed to a [`Hook`].
#[derive(Clone, Copy)]
pub struct Next<'n> {
	hooks: &'n [&'n Hook],
	base: Option<&'n Procedure>,
}

impl<'n> Next<'n> {
	pub(crate) fn new(hooks: &'n [&'n Hook], base: Option<&'n Procedure>) -> Self {
		Self { hooks, base }
	}

	/// Run the next hook, or the base procedure once all hooks have run.
	pub fn run(self, cx: &mut RenderContext<'_>) -> SoilResult<()> {
		if let Some((hook, hooks)) = self.hooks.split_first() {
			return hook(
				cx,
				Next {
					hooks,
					base: self.base,
				},
			);
		}

		match self.base {
			Some(procedure) => procedure(cx),
			None => Ok(()),
		}
	}
}

struct DerivedAttribute {
	name: String,
	matcher: Matcher,
	derive: Derive,
}

/// The immutable registry of procedures, hooks and derived attributes for
/// every installed language.
#[derive(Clone, Default)]
pub struct Blueprints {
	procedures: HashMap<BlueprintKey, Procedure>,
	hooks: Vec<(BlueprintKey, Hook)>,
	attributes: Vec<Arc<DerivedAttribute>>,
}

impl Blueprints {
	pub fn builder() -> BlueprintsBuilder {
		BlueprintsBuilder::default()
	}

	pub fn contains(&self, key: &BlueprintKey) -> bool {
		self.procedures.contains_key(key)
	}

	/// Whether anything is registered for `language`.
	pub fn supports(&self, language: &str) -> bool {
		self.procedures.keys().any(|key| key.language == language)
			|| self.hooks.iter().any(|(key, _)| key.language == language)
	}

	/// The most specific procedure registered for `phase` on `node`.
	pub fn procedure(&self, language: &str, phase: &str, node: Node<'_>) -> Option<&Procedure> {
		BlueprintKey::candidates(language, phase, node)
			.iter()
			.find_map(|key| self.procedures.get(key))
	}

	/// Every hook registered under one of the candidate keys. Hooks of the
	/// most specific key come first; within a key, registration order.
	pub fn hooks(&self, language: &str, phase: &str, node: Node<'_>) -> Vec<&Hook> {
		BlueprintKey::candidates(language, phase, node)
			.iter()
			.flat_map(|key| {
				self.hooks
					.iter()
					.filter(move |(registered, _)| registered == key)
					.map(|(_, hook)| hook)
			})
			.collect()
	}

	/// The first derived attribute named `name` which applies to `node`.
	pub fn derived(&self, name: &str, node: Node<'_>) -> Option<String> {
		self.attributes
			.iter()
			.filter(|attribute| attribute.name == name && attribute.matcher.matches(node))
			.find_map(|attribute| (attribute.derive)(node))
	}

	/// Render one top-level node. Every artifact started with
	/// [`RenderContext::file`] is returned; nodes without a `file` blueprint
	/// produce none.
	pub fn render<'a>(&'a self, language: &'a str, node: Node<'a>, config: &'a Value) -> SoilResult<Vec<Artifact>> {
		let mut cx = RenderContext::new(self, language, node, config);
		cx.statement(FILE_PHASE)?;
		let artifacts = cx.into_artifacts();

		tracing::debug!(
			language,
			node = %node,
			artifacts = artifacts.len(),
			"rendered node"
		);

		Ok(artifacts)
	}

	/// Render every top-level node of `ast`. A failing node is recorded and
	/// the remaining nodes are still rendered.
	pub fn render_document(&self, language: &str, ast: &Ast, config: &Value) -> RenderOutcome {
		let mut outcome = RenderOutcome::default();

		for node in ast.root().children() {
			match self.render(language, node, config) {
				Ok(artifacts) => outcome.artifacts.extend(artifacts),
				Err(error) => {
					tracing::warn!(language, node = %node, %error, "render failed");
					outcome.failures.push(RenderFailure {
						language: language.to_string(),
						node: node.to_string(),
						error,
					});
				}
			}
		}

		outcome
	}
}

impl std::fmt::Debug for Blueprints {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut keys: Vec<String> = self.procedures.keys().map(ToString::to_string).collect();
		keys.sort();

		f.debug_struct("Blueprints")
			.field("procedures", &keys)
			.field("hooks", &self.hooks.len())
			.field("attributes", &self.attributes.len())
			.finish()
	}
}

/// Artifacts and failures of rendering a whole document.
#[derive(Debug, Default)]
pub struct RenderOutcome {
	pub artifacts: Vec<Artifact>,
	pub failures: Vec<RenderFailure>,
}

impl RenderOutcome {
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}
}

/// A render job which failed.
#[derive(Debug, Serialize)]
pub struct RenderFailure {
	pub language: String,
	pub node: String,
	#[serde(serialize_with = "serialize_error")]
	pub error: SoilError,
}

fn serialize_error<S>(error: &SoilError, serializer: S) -> Result<S::Ok, S::Error>
where
	S: serde::Serializer,
{
	serializer.collect_str(error)
}

/// Registration surface for language modules.
#[derive(Default)]
pub struct BlueprintsBuilder {
	procedures: HashMap<BlueprintKey, Procedure>,
	hooks: Vec<(BlueprintKey, Hook)>,
	attributes: Vec<Arc<DerivedAttribute>>,
}

impl BlueprintsBuilder {
	/// Register the base procedure for `key`. Each key can only be registered
	/// once.
	pub fn blueprint<K, F>(&mut self, key: K, procedure: F) -> SoilResult<&mut Self>
	where
		K: IntoBlueprintKey,
		F: Fn(&mut RenderContext<'_>) -> SoilResult<()> + Send + Sync + 'static,
	{
		let key = key.into_blueprint_key()?;

		if self.procedures.contains_key(&key) {
			return Err(SoilError::DuplicateBlueprint(key.to_string()));
		}

		tracing::trace!(%key, "register blueprint");
		self.procedures.insert(key, Arc::new(procedure));
		Ok(self)
	}

	/// Register a hook around `key`. Hooks registered earlier wrap hooks
	/// registered later.
	pub fn hook<K, F>(&mut self, key: K, hook: F) -> SoilResult<&mut Self>
	where
		K: IntoBlueprintKey,
		F: Fn(&mut RenderContext<'_>, Next<'_>) -> SoilResult<()> + Send + Sync + 'static,
	{
		let key = key.into_blueprint_key()?;

		tracing::trace!(%key, "register hook");
		self.hooks.push((key, Arc::new(hook)));
		Ok(self)
	}

	/// Register a computed attribute for nodes matching `condition`.
	pub fn attribute<F>(&mut self, name: impl Into<String>, condition: &str, derive: F) -> &mut Self
	where
		F: Fn(Node<'_>) -> Option<String> + Send + Sync + 'static,
	{
		self.attributes.push(Arc::new(DerivedAttribute {
			name: name.into(),
			matcher: Matcher::new(condition),
			derive: Arc::new(derive),
		}));
		self
	}

	pub fn build(&mut self) -> Blueprints {
		Blueprints {
			procedures: std::mem::take(&mut self.procedures),
			hooks: std::mem::take(&mut self.hooks),
			attributes: std::mem::take(&mut self.attributes),
		}
	}
}
