use std::collections::BTreeMap;

use regex::Regex;

use crate::Attributes;
use crate::SoilError;
use crate::SoilResult;

/// Lowercase words joined by single hyphens, e.g. `write-only`.
fn is_directive_name(name: &str) -> bool {
	name.starts_with(|ch: char| ch.is_ascii_lowercase())
		&& !name.ends_with('-')
		&& !name.contains("--")
		&& name
			.chars()
			.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

/// A grammar rule: one kind of schema declaration.
///
/// ```rust
/// use soil_core::Directive;
///
/// let field = Directive::declare("mutable|write-only field")?
/// 	.pattern(r"^(?<name>[a-z_]+):\s*(?<type>\S+)$")?
/// 	.children(["case"]);
///
/// assert_eq!(field.name(), "field");
/// assert_eq!(field.annotations(), ["mutable", "write-only"]);
/// # Ok::<(), soil_core::SoilError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Directive {
	name: String,
	annotations: Vec<String>,
	pattern: Option<Regex>,
	children: Vec<String>,
}

impl Directive {
	/// Create a directive with no annotations, no attributes and no children.
	pub fn new(name: impl Into<String>) -> SoilResult<Self> {
		let name = name.into();

		if !is_directive_name(&name) {
			return Err(SoilError::InvalidDirective(name));
		}

		Ok(Self {
			name,
			annotations: vec![],
			pattern: None,
			children: vec![],
		})
	}

	/// Create a directive from the compact `annotation|annotation name` form.
	pub fn declare(declaration: &str) -> SoilResult<Self> {
		let words: Vec<&str> = declaration.split_whitespace().collect();

		match words.as_slice() {
			[name] => Self::new(*name),
			[annotations, name] => {
				let mut directive = Self::new(*name)?;
				for annotation in annotations.split('|') {
					if !is_directive_name(annotation) {
						return Err(SoilError::InvalidDirective(declaration.to_string()));
					}
					directive = directive.annotated(annotation);
				}
				Ok(directive)
			}
			_ => Err(SoilError::InvalidDirective(declaration.to_string())),
		}
	}

	/// Permit an annotation word in front of the directive name.
	#[must_use]
	pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
		let annotation = annotation.into();
		if !self.annotations.contains(&annotation) {
			self.annotations.push(annotation);
		}
		self
	}

	/// Set the attribute pattern. Named capture groups become node attributes.
	pub fn pattern(mut self, pattern: &str) -> SoilResult<Self> {
		let regex = Regex::new(pattern).map_err(|error| {
			SoilError::InvalidPattern {
				directive: self.name.clone(),
				reason: error.to_string(),
			}
		})?;

		self.pattern = Some(regex);
		Ok(self)
	}

	/// Permit the named directives inside this directive's block.
	#[must_use]
	pub fn children<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for name in names {
			let name = name.into();
			if !self.children.contains(&name) {
				self.children.push(name);
			}
		}
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn annotations(&self) -> &[String] {
		&self.annotations
	}

	pub fn child_names(&self) -> &[String] {
		&self.children
	}

	pub fn has_pattern(&self) -> bool {
		self.pattern.is_some()
	}

	/// Match the leading words of a declaration. Returns the recognised
	/// annotation (if any) and the number of words consumed.
	pub fn match_head<'t>(&self, first: &'t str, second: Option<&'t str>) -> Option<(Option<&'t str>, usize)> {
		if first == self.name {
			return Some((None, 1));
		}

		match second {
			Some(second) if second == self.name && self.annotations.iter().any(|a| a == first) => {
				Some((Some(first), 2))
			}
			_ => None,
		}
	}

	/// Match trimmed attribute text against the pattern. A directive without
	/// a pattern only accepts empty text.
	pub fn match_attributes(&self, text: &str) -> Option<Attributes> {
		let Some(pattern) = &self.pattern else {
			return text.is_empty().then(Attributes::default);
		};

		let captures = pattern.captures(text)?;
		let body = captures.get(0).map_or("", |m| m.as_str()).to_string();
		let mut named = BTreeMap::new();

		for name in pattern.capture_names().flatten() {
			if let Some(value) = captures.name(name) {
				named.insert(name.to_string(), value.as_str().to_string());
			}
		}

		Some(Attributes::new(body, named))
	}
}

/// The registered directives and the names allowed at the top level.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
	directives: Vec<Directive>,
	roots: Vec<String>,
}

impl Grammar {
	pub fn builder() -> GrammarBuilder {
		GrammarBuilder::default()
	}

	/// All directives in registration order.
	pub fn directives(&self) -> impl Iterator<Item = &Directive> {
		self.directives.iter()
	}

	pub fn roots(&self) -> &[String] {
		&self.roots
	}

	pub fn contains(&self, name: &str) -> bool {
		self.directives.iter().any(|directive| directive.name == name)
	}

	pub fn is_root(&self, name: &str) -> bool {
		self.roots.iter().any(|root| root == name)
	}

	/// Directives sharing `name`, in registration order.
	pub fn named<'g>(&'g self, name: &'g str) -> impl Iterator<Item = &'g Directive> + 'g {
		self.directives
			.iter()
			.filter(move |directive| directive.name == name)
	}

	/// Candidate directives for a list of permitted names, in the order the
	/// names are listed.
	pub fn candidates<'g>(&'g self, names: &'g [String]) -> impl Iterator<Item = &'g Directive> + 'g {
		names.iter().flat_map(move |name| self.named(name))
	}

	/// Candidate directives permitted at the top level.
	pub fn root_candidates(&self) -> impl Iterator<Item = &Directive> {
		self.candidates(&self.roots)
	}
}

/// Collects directives and structure before validating them into a
/// [`Grammar`].
#[derive(Debug, Default)]
pub struct GrammarBuilder {
	directives: Vec<Directive>,
	structure: Vec<(String, Vec<String>)>,
	roots: Vec<String>,
}

impl GrammarBuilder {
	pub fn directive(&mut self, directive: Directive) -> &mut Self {
		self.directives.push(directive);
		self
	}

	/// Permit `children` inside every directive named `parent`.
	pub fn structure<I, S>(&mut self, parent: impl Into<String>, children: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.structure.push((
			parent.into(),
			children.into_iter().map(Into::into).collect(),
		));
		self
	}

	pub fn root(&mut self, name: impl Into<String>) -> &mut Self {
		let name = name.into();
		if !self.roots.contains(&name) {
			self.roots.push(name);
		}
		self
	}

	pub fn build(&mut self) -> SoilResult<Grammar> {
		let mut directives = std::mem::take(&mut self.directives);

		for (parent, children) in std::mem::take(&mut self.structure) {
			let mut found = false;
			for directive in directives.iter_mut().filter(|d| d.name == parent) {
				*directive = directive.clone().children(children.iter().cloned());
				found = true;
			}

			if !found {
				return Err(SoilError::InvalidDirective(parent));
			}
		}

		for directive in &directives {
			for child in &directive.children {
				if !directives.iter().any(|d| &d.name == child) {
					return Err(SoilError::UnknownChildDirective {
						parent: directive.name.clone(),
						child: child.clone(),
					});
				}
			}
		}

		let roots = std::mem::take(&mut self.roots);
		for root in &roots {
			if !directives.iter().any(|d| &d.name == root) {
				return Err(SoilError::UnknownRootDirective(root.clone()));
			}
		}

		Ok(Grammar { directives, roots })
	}
}
