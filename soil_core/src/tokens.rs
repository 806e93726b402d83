use std::fmt::Display;

use serde::Serialize;

use crate::Position;

/// The lexical categories of the schema language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
	/// A directive name with its attribute text, e.g. `field id: Int`.
	Declaration,
	/// Whitespace, newlines and `;` terminators.
	Separator,
	/// `{`
	BlockOpen,
	/// `}`
	BlockClose,
	/// A `///` documentation comment.
	Description,
	/// A `//` comment.
	Comment,
	/// A single or double quoted string.
	StringLiteral,
}

impl TokenKind {
	/// Short label used when printing token streams.
	pub fn label(self) -> &'static str {
		match self {
			Self::Declaration => "declaration",
			Self::Separator => "separator",
			Self::BlockOpen => "block-open",
			Self::BlockClose => "block-close",
			Self::Description => "description",
			Self::Comment => "comment",
			Self::StringLiteral => "string",
		}
	}
}

/// A token with the exact text it was captured from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
	pub kind: TokenKind,
	pub body: String,
	pub position: Position,
}

impl Token {
	pub fn new(kind: TokenKind, body: impl Into<String>, position: Position) -> Self {
		Self {
			kind,
			body: body.into(),
			position,
		}
	}

	pub fn is(&self, kind: TokenKind) -> bool {
		self.kind == kind
	}

	/// Separators and plain comments never carry meaning for the grammar.
	pub fn is_trivia(&self) -> bool {
		matches!(self.kind, TokenKind::Separator | TokenKind::Comment)
	}

	/// A separator which contains a `;` ends the current statement.
	pub fn is_semicolon(&self) -> bool {
		self.kind == TokenKind::Separator && self.body.contains(';')
	}

	/// A separator which contains a `;` or a line break.
	pub fn is_terminator(&self) -> bool {
		self.kind == TokenKind::Separator && (self.body.contains(';') || self.body.contains('\n'))
	}

	/// The text of a description without its `///` marker.
	pub fn description_text(&self) -> Option<&str> {
		if self.kind != TokenKind::Description {
			return None;
		}

		let text = self.body.trim_start_matches('/');
		Some(text.strip_prefix(' ').unwrap_or(text).trim_end())
	}
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.body)
	}
}

/// Rebuild the source text from a token sequence.
pub fn concat(tokens: &[Token]) -> String {
	tokens.iter().map(|token| token.body.as_str()).collect()
}
