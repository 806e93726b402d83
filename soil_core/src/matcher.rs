use crate::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
enum DirectiveCondition {
	Any,
	Is(String),
	IsNot(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AnnotationCondition {
	Ignored,
	/// `* directive`
	Annotated,
	/// `!* directive`
	Plain,
	Is(String),
	IsNot(String),
}

/// A node filter parsed from a condition string.
///
/// | condition           | matches                                          |
/// | ------------------- | ------------------------------------------------ |
/// | `*`                 | every node                                       |
/// | `field`             | `field` nodes                                    |
/// | `!field`            | nodes which are not `field`                      |
/// | `mutable field`     | `field` nodes annotated with `mutable`           |
/// | `!write-only field` | `field` nodes not annotated with `write-only`    |
/// | `* field`           | `field` nodes with any annotation                |
/// | `!* field`          | `field` nodes without annotation                 |
/// | `has(type)`         | nodes with a `type` attribute (`!has` negates)   |
///
/// `has(..)` terms combine with any of the other forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
	condition: String,
	directive: DirectiveCondition,
	annotation: AnnotationCondition,
	present: Vec<String>,
	absent: Vec<String>,
}

impl Matcher {
	pub fn new(condition: &str) -> Self {
		let mut present = vec![];
		let mut absent = vec![];
		let mut words = vec![];

		for word in condition.split_whitespace() {
			if let Some(attribute) = attribute_term(word, "!has(") {
				absent.push(attribute.to_string());
			} else if let Some(attribute) = attribute_term(word, "has(") {
				present.push(attribute.to_string());
			} else {
				words.push(word);
			}
		}

		let (annotation, directive) = match words.as_slice() {
			[] => (AnnotationCondition::Ignored, DirectiveCondition::Any),
			[directive] => (AnnotationCondition::Ignored, directive_condition(directive)),
			[annotation, directive, ..] => (annotation_condition(annotation), directive_condition(directive)),
		};

		Self {
			condition: condition.to_string(),
			directive,
			annotation,
			present,
			absent,
		}
	}

	pub fn condition(&self) -> &str {
		&self.condition
	}

	pub fn matches(&self, node: Node<'_>) -> bool {
		let directive = match &self.directive {
			DirectiveCondition::Any => true,
			DirectiveCondition::Is(name) => node.directive() == name,
			DirectiveCondition::IsNot(name) => node.directive() != name,
		};

		let annotation = match &self.annotation {
			AnnotationCondition::Ignored => true,
			AnnotationCondition::Annotated => node.annotation().is_some(),
			AnnotationCondition::Plain => node.annotation().is_none(),
			AnnotationCondition::Is(name) => node.annotation() == Some(name.as_str()),
			AnnotationCondition::IsNot(name) => node.annotation() != Some(name.as_str()),
		};

		directive
			&& annotation
			&& self.present.iter().all(|key| node.attributes().contains(key))
			&& !self.absent.iter().any(|key| node.attributes().contains(key))
	}
}

impl From<&str> for Matcher {
	fn from(condition: &str) -> Self {
		Self::new(condition)
	}
}

fn attribute_term<'w>(word: &'w str, prefix: &str) -> Option<&'w str> {
	word.strip_prefix(prefix)?.strip_suffix(')')
}

fn directive_condition(word: &str) -> DirectiveCondition {
	if word == "*" {
		DirectiveCondition::Any
	} else if let Some(name) = word.strip_prefix('!') {
		DirectiveCondition::IsNot(name.to_string())
	} else {
		DirectiveCondition::Is(word.to_string())
	}
}

fn annotation_condition(word: &str) -> AnnotationCondition {
	match word {
		"*" => AnnotationCondition::Annotated,
		"!*" => AnnotationCondition::Plain,
		_ => {
			if let Some(name) = word.strip_prefix('!') {
				AnnotationCondition::IsNot(name.to_string())
			} else {
				AnnotationCondition::Is(word.to_string())
			}
		}
	}
}
