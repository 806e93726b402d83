use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::Blueprints;
use crate::Matcher;
use crate::Next;
use crate::Node;
use crate::SoilError;
use crate::SoilResult;

/// A generated output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Artifact {
	pub filename: String,
	pub body: String,
}

impl Artifact {
	pub fn new(filename: impl Into<String>) -> Self {
		Self {
			filename: filename.into(),
			body: String::new(),
		}
	}
}

/// State of one render job: a target language and a top-level node.
///
/// Every primitive that temporarily changes the state (`env`, `dig`,
/// `focus`, `block`, `capture`) restores it before returning, whether the
/// body succeeded or failed.
pub struct RenderContext<'a> {
	blueprints: &'a Blueprints,
	language: &'a str,
	root: Node<'a>,
	node_stack: Vec<Node<'a>>,
	env: Vec<String>,
	buffers: Vec<String>,
	file: Option<Artifact>,
	artifacts: Vec<Artifact>,
	config: &'a Value,
}

impl<'a> RenderContext<'a> {
	pub fn new(blueprints: &'a Blueprints, language: &'a str, node: Node<'a>, config: &'a Value) -> Self {
		Self {
			blueprints,
			language,
			root: node,
			node_stack: vec![],
			env: vec![],
			buffers: vec![],
			file: None,
			artifacts: vec![],
			config,
		}
	}

	pub fn language(&self) -> &'a str {
		self.language
	}

	pub fn is_language(&self, language: &str) -> bool {
		self.language == language
	}

	/// The node currently in focus.
	pub fn node(&self) -> Node<'a> {
		self.node_stack.last().copied().unwrap_or(self.root)
	}

	/// The free-form configuration value handed in by the caller.
	pub fn config(&self) -> &'a Value {
		self.config
	}

	/// A boolean entry of the configuration object.
	pub fn config_flag(&self, key: &str) -> bool {
		self.config.get(key).and_then(Value::as_bool).unwrap_or(false)
	}

	/// A string entry of the configuration object.
	pub fn config_str(&self, key: &str) -> Option<&'a str> {
		self.config.get(key).and_then(Value::as_str)
	}

	/// A list of strings in the configuration object. A single string counts
	/// as a list of one.
	pub fn config_strings(&self, key: &str) -> Vec<&'a str> {
		match self.config.get(key) {
			Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
			Some(Value::String(item)) => vec![item.as_str()],
			_ => vec![],
		}
	}

	/// Read an attribute of the focused node. `directive` and `annotation`
	/// are pseudo keys; derived attributes are consulted after the node's own.
	pub fn get(&self, key: &str) -> Option<Cow<'a, str>> {
		let node = self.node();

		match key {
			"directive" => Some(Cow::Borrowed(node.directive())),
			"annotation" => node.annotation().map(Cow::Borrowed),
			_ => {
				node.get(key)
					.map(Cow::Borrowed)
					.or_else(|| self.blueprints.derived(key, node).map(Cow::Owned))
			}
		}
	}

	/// Like [`RenderContext::get`] but a missing attribute is an error.
	pub fn require(&self, key: &str) -> SoilResult<Cow<'a, str>> {
		self.get(key).ok_or_else(|| {
			SoilError::MissingAttribute {
				key: key.to_string(),
				directive: self.node().directive().to_string(),
			}
		})
	}

	pub fn in_env(&self, key: &str) -> bool {
		self.env.iter().any(|active| active == key)
	}

	/// Append text to the innermost open buffer, or to the current file.
	pub fn write(&mut self, text: impl AsRef<str>) {
		let text = text.as_ref();

		if let Some(buffer) = self.buffers.last_mut() {
			buffer.push_str(text);
		} else if let Some(file) = &mut self.file {
			file.body.push_str(text);
		} else if !text.is_empty() {
			tracing::warn!(
				language = self.language,
				node = %self.node(),
				"discarding output written before a file was started"
			);
		}
	}

	/// The text accumulated in the innermost buffer, or in the current file.
	pub fn current_body(&self) -> &str {
		match (self.buffers.last(), &self.file) {
			(Some(buffer), _) => buffer.as_str(),
			(None, Some(file)) => file.body.as_str(),
			(None, None) => "",
		}
	}

	/// Rewrite the text accumulated in the innermost buffer (or file).
	pub fn replace(&mut self, replacement: impl FnOnce(&str) -> String) {
		if let Some(buffer) = self.buffers.last_mut() {
			*buffer = replacement(buffer);
		} else if let Some(file) = &mut self.file {
			file.body = replacement(&file.body);
		}
	}

	/// Start a new output file named `{name}.{ext}`. The previous file, if
	/// any, is finished.
	pub fn file(&mut self, name: &str, ext: &str) {
		if let Some(previous) = self.file.take() {
			self.artifacts.push(previous);
		}

		tracing::trace!(name, ext, "begin file");
		self.file = Some(Artifact::new(format!("{name}.{ext}")));
	}

	pub fn current_file(&self) -> Option<&Artifact> {
		self.file.as_ref()
	}

	/// Run `body` with `key` active.
	pub fn env(&mut self, key: &str, body: impl FnOnce(&mut Self) -> SoilResult<()>) -> SoilResult<()> {
		let depth = self.env.len();
		tracing::trace!(key, "enter env");
		self.env.push(key.to_string());
		let result = body(self);
		self.env.truncate(depth);
		tracing::trace!(key, "exit env");
		result
	}

	/// Run the procedure for `phase` (wrapped by its hooks) in a fresh buffer
	/// and append the result, framed by line breaks, to the enclosing output.
	pub fn block(&mut self, phase: &str) -> SoilResult<()> {
		let content = self.capture(phase)?;
		self.write(format!("\n{content}\n"));
		Ok(())
	}

	/// Run the procedure for `phase` writing straight into the enclosing
	/// output.
	pub fn statement(&mut self, phase: &str) -> SoilResult<()> {
		let blueprints = self.blueprints;
		let node = self.node();
		let base = blueprints.procedure(self.language, phase, node);
		let hooks = blueprints.hooks(self.language, phase, node);

		tracing::trace!(
			language = self.language,
			phase,
			directive = node.directive(),
			resolved = base.is_some(),
			hooks = hooks.len(),
			"dispatch"
		);

		Next::new(&hooks, base).run(self)
	}

	/// Run a statement and return its text instead of writing it.
	pub fn capture(&mut self, phase: &str) -> SoilResult<String> {
		let depth = self.buffers.len();
		self.buffers.push(String::new());
		let result = self.statement(phase);
		let content = self.buffers.pop().unwrap_or_default();
		self.buffers.truncate(depth);
		result.map(|()| content)
	}

	/// Whether any child of the focused node matches `condition`.
	pub fn exists(&self, condition: &str) -> bool {
		let matcher = Matcher::new(condition);
		self.node().children().any(|child| matcher.matches(child))
	}

	/// Visit the children of the focused node matching `condition`.
	pub fn dig(&mut self, condition: &str, body: impl FnMut(&mut Self) -> SoilResult<()>) -> SoilResult<()> {
		let matcher = Matcher::new(condition);
		let targets: Vec<Node<'a>> = self
			.node()
			.children()
			.filter(|child| matcher.matches(*child))
			.collect();

		self.visit(&targets, body)
	}

	/// Visit every descendant of the focused node matching `condition`, in
	/// pre-order.
	pub fn dig_deep(&mut self, condition: &str, body: impl FnMut(&mut Self) -> SoilResult<()>) -> SoilResult<()> {
		let matcher = Matcher::new(condition);
		let targets: Vec<Node<'a>> = self
			.node()
			.descendants()
			.into_iter()
			.filter(|node| matcher.matches(*node))
			.collect();

		self.visit(&targets, body)
	}

	/// Run `body` with `node` in focus.
	pub fn focus(&mut self, node: Node<'a>, body: impl FnOnce(&mut Self) -> SoilResult<()>) -> SoilResult<()> {
		let depth = self.node_stack.len();
		self.node_stack.push(node);
		let result = body(self);
		self.node_stack.truncate(depth);
		result
	}

	fn visit(&mut self, targets: &[Node<'a>], mut body: impl FnMut(&mut Self) -> SoilResult<()>) -> SoilResult<()> {
		let count = targets.len();

		for (index, target) in targets.iter().enumerate() {
			let directive = target.directive();
			let env_depth = self.env.len();
			let node_depth = self.node_stack.len();

			self.node_stack.push(*target);
			if index == 0 {
				self.env.push(format!("first-{directive}"));
			}
			if index + 1 == count {
				self.env.push(format!("last-{directive}"));
			}
			if count == 1 {
				self.env.push(format!("single-{directive}"));
			}

			let result = body(self);
			self.env.truncate(env_depth);
			self.node_stack.truncate(node_depth);
			result?;
		}

		Ok(())
	}

	/// Finish the current file and return every artifact produced.
	pub fn into_artifacts(mut self) -> Vec<Artifact> {
		if let Some(file) = self.file.take() {
			self.artifacts.push(file);
		}
		self.artifacts
	}
}
