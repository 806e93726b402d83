use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::Matcher;
use crate::Position;

/// The directive name of the synthetic root node.
pub const ROOT_DIRECTIVE: &str = "root";

/// Captured attribute text of a node: the full matched text (`body`) and
/// the named capture groups of the directive pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
	body: String,
	captures: BTreeMap<String, String>,
}

impl Attributes {
	pub fn new(body: impl Into<String>, captures: BTreeMap<String, String>) -> Self {
		Self {
			body: body.into(),
			captures,
		}
	}

	/// Shorthand for attributes with named captures only.
	pub fn from_pairs<I, K, V>(body: impl Into<String>, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::new(
			body,
			pairs
				.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		)
	}

	pub fn body(&self) -> &str {
		&self.body
	}

	/// Look up a capture. `body` always resolves to the full attribute text.
	pub fn get(&self, key: &str) -> Option<&str> {
		if key == "body" {
			return Some(&self.body);
		}

		self.captures.get(key).map(String::as_str)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	pub fn captures(&self) -> &BTreeMap<String, String> {
		&self.captures
	}
}

/// Index of a node inside an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
	pub const ROOT: NodeId = NodeId(0);

	pub fn index(self) -> usize {
		self.0
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeData {
	pub directive: String,
	pub annotation: Option<String>,
	pub attributes: Attributes,
	pub description: Option<String>,
	pub position: Position,
	/// Non-owning back reference, only used for name resolution.
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
}

impl NodeData {
	pub fn new(directive: impl Into<String>, annotation: Option<String>, attributes: Attributes) -> Self {
		Self {
			directive: directive.into(),
			annotation,
			attributes,
			description: None,
			position: Position::default(),
			parent: None,
			children: vec![],
		}
	}
}

/// A parsed document. Nodes live in an arena; index `0` is the synthetic
/// root which owns every top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ast {
	nodes: Vec<NodeData>,
}

impl Default for Ast {
	fn default() -> Self {
		Self::new()
	}
}

impl Ast {
	pub fn new() -> Self {
		Self {
			nodes: vec![NodeData::new(ROOT_DIRECTIVE, None, Attributes::default())],
		}
	}

	pub fn root(&self) -> Node<'_> {
		Node {
			ast: self,
			id: NodeId::ROOT,
		}
	}

	pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
		(id.0 < self.nodes.len()).then_some(Node { ast: self, id })
	}

	pub fn len(&self) -> usize {
		self.nodes.len() - 1
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.len() == 1
	}

	/// Append `data` as the last child of `parent`.
	pub fn insert(&mut self, parent: NodeId, mut data: NodeData) -> NodeId {
		let id = NodeId(self.nodes.len());
		data.parent = Some(parent);
		data.children.clear();
		self.nodes.push(data);
		self.nodes[parent.0].children.push(id);
		id
	}

	/// Convenience for building trees by hand.
	pub fn push_child(
		&mut self,
		parent: NodeId,
		directive: &str,
		annotation: Option<&str>,
		attributes: Attributes,
	) -> NodeId {
		self.insert(
			parent,
			NodeData::new(directive, annotation.map(ToString::to_string), attributes),
		)
	}

	pub fn set_description(&mut self, id: NodeId, description: impl Into<String>) {
		self.nodes[id.0].description = Some(description.into());
	}

	/// Move every top-level node of `other` into this document.
	pub fn merge(&mut self, other: Ast) {
		let offset = self.nodes.len() - 1;
		let remap = |id: NodeId| {
			if id == NodeId::ROOT {
				NodeId::ROOT
			} else {
				NodeId(id.0 + offset)
			}
		};

		let mut nodes = other.nodes.into_iter();
		let Some(other_root) = nodes.next() else {
			return;
		};

		for mut data in nodes {
			data.parent = data.parent.map(remap);
			data.children = data.children.into_iter().map(remap).collect();
			self.nodes.push(data);
		}

		self.nodes[0]
			.children
			.extend(other_root.children.into_iter().map(remap));
	}

	/// A readable, indented listing of the tree.
	pub fn outline(&self) -> String {
		let mut output = String::new();
		for node in self.root().descendants() {
			let depth = node.depth().saturating_sub(1);
			let _ = writeln!(output, "{}{node}", "  ".repeat(depth));
		}
		output
	}
}

/// A borrowed handle to one node of an [`Ast`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
	ast: &'a Ast,
	id: NodeId,
}

impl<'a> Node<'a> {
	fn data(self) -> &'a NodeData {
		&self.ast.nodes[self.id.0]
	}

	fn handle(self, id: NodeId) -> Node<'a> {
		Node { ast: self.ast, id }
	}

	pub fn id(self) -> NodeId {
		self.id
	}

	pub fn ast(self) -> &'a Ast {
		self.ast
	}

	pub fn directive(self) -> &'a str {
		&self.data().directive
	}

	pub fn annotation(self) -> Option<&'a str> {
		self.data().annotation.as_deref()
	}

	pub fn attributes(self) -> &'a Attributes {
		&self.data().attributes
	}

	pub fn get(self, key: &str) -> Option<&'a str> {
		self.data().attributes.get(key)
	}

	pub fn name(self) -> Option<&'a str> {
		self.get("name")
	}

	pub fn description(self) -> Option<&'a str> {
		self.data().description.as_deref()
	}

	pub fn position(self) -> Position {
		self.data().position
	}

	pub fn is_root(self) -> bool {
		self.id == NodeId::ROOT
	}

	pub fn parent(self) -> Option<Node<'a>> {
		self.data().parent.map(|id| self.handle(id))
	}

	pub fn depth(self) -> usize {
		let mut depth = 0;
		let mut current = self.parent();
		while let Some(node) = current {
			depth += 1;
			current = node.parent();
		}
		depth
	}

	pub fn children(self) -> impl DoubleEndedIterator<Item = Node<'a>> + ExactSizeIterator {
		self.data().children.iter().map(move |id| self.handle(*id))
	}

	/// All transitive descendants in pre-order.
	pub fn descendants(self) -> Vec<Node<'a>> {
		let mut result = vec![];
		let mut stack: Vec<Node<'a>> = self.children().rev().collect();

		while let Some(node) = stack.pop() {
			result.push(node);
			stack.extend(node.children().rev());
		}

		result
	}

	pub fn matches(self, matcher: &Matcher) -> bool {
		matcher.matches(self)
	}

	/// Resolve a dotted name path such as `Account.Draft`. The lookup starts
	/// at this node and retries from each ancestor until the root.
	pub fn resolve(self, path: &str) -> Option<Node<'a>> {
		if path.is_empty() {
			return Some(self);
		}

		let segments: Vec<&str> = path.split('.').collect();
		let mut scope = Some(self);

		while let Some(node) = scope {
			if let Some(found) = node.resolve_within(&segments) {
				return Some(found);
			}
			scope = node.parent();
		}

		None
	}

	fn resolve_within(self, segments: &[&str]) -> Option<Node<'a>> {
		let (first, rest) = segments.split_first()?;

		if !self.is_root() && self.name() == Some(*first) {
			if let Some(found) = self.resolve_path(rest) {
				return Some(found);
			}
		}

		self.children()
			.filter(|child| child.name() == Some(*first))
			.find_map(|child| child.resolve_path(rest))
	}

	fn resolve_path(self, segments: &[&str]) -> Option<Node<'a>> {
		let Some((first, rest)) = segments.split_first() else {
			return Some(self);
		};

		self.children()
			.filter(|child| child.name() == Some(*first))
			.find_map(|child| child.resolve_path(rest))
	}
}

impl PartialEq for Node<'_> {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.ast, other.ast) && self.id == other.id
	}
}

impl Eq for Node<'_> {}

impl std::fmt::Debug for Node<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Node")
			.field("id", &self.id)
			.field("directive", &self.directive())
			.field("annotation", &self.annotation())
			.field("attributes", self.attributes())
			.finish()
	}
}

impl std::fmt::Display for Node<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if let Some(annotation) = self.annotation() {
			write!(f, "{annotation} ")?;
		}

		write!(f, "{}", self.directive())?;

		let body = self.attributes().body();
		if !body.is_empty() {
			write!(f, " {body}")?;
		}

		Ok(())
	}
}
