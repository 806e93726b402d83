use crate::Ast;
use crate::Directive;
use crate::Grammar;
use crate::NodeData;
use crate::NodeId;
use crate::Position;
use crate::SoilError;
use crate::SoilResult;
use crate::lexer::tokenize;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// Tokenize and parse schema source.
pub fn parse_source(source: &str, grammar: &Grammar) -> SoilResult<Ast> {
	let tokens = tokenize(source)?;
	parse(&tokens, grammar)
}

/// Parse a token sequence into a document.
///
/// At every position the permitted directives are tried in registration
/// order and the first one that matches wins. Inside a block, declarations
/// that match no permitted child are skipped with a warning.
pub fn parse(tokens: &[Token], grammar: &Grammar) -> SoilResult<Ast> {
	let mut parser = Parser {
		grammar,
		cursor: TokenCursor::new(tokens),
	};

	let nodes = parser.document()?;
	let mut ast = Ast::new();

	for node in nodes {
		attach(&mut ast, NodeId::ROOT, node);
	}

	tracing::debug!(nodes = ast.len(), "parsed document");
	Ok(ast)
}

fn attach(ast: &mut Ast, parent: NodeId, node: ParsedNode) {
	let id = ast.insert(parent, node.data);
	for child in node.children {
		attach(ast, id, child);
	}
}

/// A matched declaration before it is moved into the arena.
struct ParsedNode {
	data: NodeData,
	children: Vec<ParsedNode>,
}

/// A cursor over the token sequence with a checkpoint stack for
/// backtracking.
struct TokenCursor<'t> {
	tokens: &'t [Token],
	offset: usize,
	marks: Vec<usize>,
}

impl<'t> TokenCursor<'t> {
	fn new(tokens: &'t [Token]) -> Self {
		Self {
			tokens,
			offset: 0,
			marks: vec![],
		}
	}

	fn peek(&self) -> Option<&'t Token> {
		self.tokens.get(self.offset)
	}

	fn advance(&mut self) {
		if self.offset < self.tokens.len() {
			self.offset += 1;
		}
	}

	fn mark(&mut self) {
		self.marks.push(self.offset);
	}

	/// Keep everything consumed since the last mark.
	fn commit(&mut self) {
		self.marks.pop();
	}

	/// Restore the cursor to the last mark.
	fn rollback(&mut self) {
		if let Some(offset) = self.marks.pop() {
			self.offset = offset;
		}
	}
}

struct Parser<'g, 't> {
	grammar: &'g Grammar,
	cursor: TokenCursor<'t>,
}

impl<'t> Parser<'_, 't> {
	fn document(&mut self) -> SoilResult<Vec<ParsedNode>> {
		let mut nodes = vec![];

		loop {
			let description = self.trivia();
			let Some(token) = self.cursor.peek() else {
				break;
			};

			match token.kind {
				TokenKind::BlockClose => {
					return Err(SoilError::UnexpectedClose {
						line: token.position.start.line,
						column: token.position.start.column,
					});
				}
				TokenKind::BlockOpen => {
					return Err(SoilError::UnexpectedOpen {
						line: token.position.start.line,
						column: token.position.start.column,
					});
				}
				_ => {}
			}

			let grammar = self.grammar;
			match self.first_match(grammar.root_candidates(), description)? {
				Some(node) => nodes.push(node),
				None => return Err(self.unmatched_root(token)),
			}
		}

		Ok(nodes)
	}

	fn unmatched_root(&self, token: &Token) -> SoilError {
		let (first, rest) = split_word(&token.body);
		let (second, _) = split_word(rest);
		let second = (!second.is_empty()).then_some(second);

		let known = self
			.grammar
			.root_candidates()
			.find_map(|directive| directive.match_head(first, second).map(|_| directive));

		match known {
			Some(directive) => {
				SoilError::InvalidDeclaration {
					directive: directive.name().to_string(),
					attributes: token.body.clone(),
					line: token.position.start.line,
					column: token.position.start.column,
				}
			}
			None => {
				SoilError::UnknownDirective {
					word: first.to_string(),
					line: token.position.start.line,
					column: token.position.start.column,
				}
			}
		}
	}

	/// Skip separators and comments, collecting `///` descriptions.
	fn trivia(&mut self) -> Option<String> {
		let mut lines: Vec<&str> = vec![];

		while let Some(token) = self.cursor.peek() {
			match token.kind {
				TokenKind::Separator | TokenKind::Comment => {}
				TokenKind::Description => lines.extend(token.description_text()),
				_ => break,
			}
			self.cursor.advance();
		}

		(!lines.is_empty()).then(|| lines.join("\n"))
	}

	/// Try each candidate at the current position. The cursor only moves when
	/// a candidate matches.
	fn first_match<'d>(
		&mut self,
		candidates: impl Iterator<Item = &'d Directive>,
		description: Option<String>,
	) -> SoilResult<Option<ParsedNode>> {
		for directive in candidates {
			self.cursor.mark();

			if let Some(mut node) = self.directive(directive)? {
				self.cursor.commit();
				node.data.description = description;
				return Ok(Some(node));
			}

			self.cursor.rollback();
		}

		Ok(None)
	}

	fn directive(&mut self, directive: &Directive) -> SoilResult<Option<ParsedNode>> {
		let Some(token) = self.cursor.peek() else {
			return Ok(None);
		};

		if token.kind != TokenKind::Declaration {
			return Ok(None);
		}

		let (first, rest) = split_word(&token.body);
		let (second, after_second) = split_word(rest);
		let Some((annotation, consumed)) =
			directive.match_head(first, (!second.is_empty()).then_some(second))
		else {
			return Ok(None);
		};

		let mut text = if consumed == 1 { rest } else { after_second }.to_string();
		let mut position = token.position;
		self.cursor.advance();

		while let Some(next) = self.cursor.peek() {
			match next.kind {
				TokenKind::Separator if !next.is_terminator() => text.push_str(&next.body),
				TokenKind::Declaration | TokenKind::StringLiteral => {
					text.push_str(&next.body);
					position = position.to(next.position);
				}
				_ => break,
			}
			self.cursor.advance();
		}

		let Some(attributes) = directive.match_attributes(text.trim()) else {
			return Ok(None);
		};

		let mut children = vec![];
		if let Some(open) = self.cursor.peek().filter(|next| next.is(TokenKind::BlockOpen)) {
			let (block, close) = self.block(directive, open)?;
			children = block;
			position = position.to(close);
		}

		let mut data = NodeData::new(directive.name(), annotation.map(ToString::to_string), attributes);
		data.position = position;

		Ok(Some(ParsedNode { data, children }))
	}

	/// Parse a `{ ... }` block. Returns the children and the position of the
	/// closing brace.
	fn block(&mut self, directive: &Directive, open: &'t Token) -> SoilResult<(Vec<ParsedNode>, Position)> {
		self.cursor.advance();
		let mut children = vec![];

		loop {
			let description = self.trivia();
			let Some(token) = self.cursor.peek() else {
				return Err(unterminated(directive.name(), open));
			};

			match token.kind {
				TokenKind::BlockClose => {
					self.cursor.advance();
					return Ok((children, token.position));
				}
				TokenKind::BlockOpen => {
					tracing::warn!(
						parent = directive.name(),
						line = token.position.start.line,
						"skipping block without declaration"
					);
					self.skip_block(directive.name(), token)?;
				}
				_ => {
					let grammar = self.grammar;
					let candidates = grammar.candidates(directive.child_names());

					if let Some(node) = self.first_match(candidates, description)? {
						children.push(node);
					} else {
						tracing::warn!(
							parent = directive.name(),
							declaration = token.body.as_str(),
							line = token.position.start.line,
							"skipping unrecognised declaration"
						);
						self.cursor.advance();
					}
				}
			}
		}
	}

	/// Skip a balanced block starting at the current `{`.
	fn skip_block(&mut self, directive: &str, open: &Token) -> SoilResult<()> {
		let mut depth = 0usize;

		while let Some(token) = self.cursor.peek() {
			self.cursor.advance();
			match token.kind {
				TokenKind::BlockOpen => depth += 1,
				TokenKind::BlockClose => {
					depth -= 1;
					if depth == 0 {
						return Ok(());
					}
				}
				_ => {}
			}
		}

		Err(unterminated(directive, open))
	}
}

fn unterminated(directive: &str, open: &Token) -> SoilError {
	SoilError::UnterminatedBlock {
		directive: directive.to_string(),
		line: open.position.start.line,
		column: open.position.start.column,
	}
}

/// Split off the first whitespace separated word.
fn split_word(text: &str) -> (&str, &str) {
	let text = text.trim_start();
	match text.find(char::is_whitespace) {
		Some(index) => (&text[..index], &text[index..]),
		None => (text, ""),
	}
}
