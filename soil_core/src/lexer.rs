use std::ops::Range;

use logos::Logos;

use crate::Point;
use crate::Position;
use crate::SoilError;
use crate::SoilResult;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// Raw tokens produced by logos. The walker below assembles them into the
/// context dependent [`TokenKind`]s.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
	#[token("///")]
	TripleSlash,
	#[token("//")]
	DoubleSlash,
	#[token("/")]
	Slash,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token(";")]
	Semicolon,
	#[token("\n")]
	Newline,
	#[regex(r"[^\S\n]+")]
	Whitespace,
	#[regex(r#""[^"\n]*"?"#)]
	DoubleQuoted,
	#[regex(r"'[^'\n]*'?")]
	SingleQuoted,
	#[regex(r#"[^\s;{}/"']+"#)]
	Text,
}

/// Walks the logos token stream and emits contiguous [`Token`]s.
struct TokenWalker<'a> {
	/// The schema source.
	source: &'a str,
	/// The collected raw tokens and their byte spans. Unrecognised bytes are
	/// kept as errors and treated like declaration text.
	raw_tokens: Vec<(Result<RawToken, ()>, Range<usize>)>,
	/// Current index into `raw_tokens`.
	cursor: usize,
	/// Start of the next token to emit.
	point: Point,
	/// Collected tokens.
	tokens: Vec<Token>,
}

impl<'a> TokenWalker<'a> {
	fn new(source: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
			point: Point::default(),
			tokens: vec![],
		}
	}

	fn raw(&self, index: usize) -> (Result<RawToken, ()>, Range<usize>) {
		let (result, span) = &self.raw_tokens[index];
		(*result, span.clone())
	}

	/// Emit a token from the current point up to `end`. Consecutive
	/// separators are merged into a single token.
	fn emit(&mut self, kind: TokenKind, end: usize) -> SoilResult<()> {
		let start = self.point.offset;
		let Some(body) = self.source.get(start..end) else {
			return Err(SoilError::Lex { offset: start });
		};

		if body.is_empty() {
			return Err(SoilError::Lex { offset: start });
		}

		let position = Position::spanning(self.point, body);
		self.point = position.end;

		if kind == TokenKind::Separator {
			if let Some(last) = self.tokens.last_mut() {
				if last.kind == TokenKind::Separator {
					last.body.push_str(body);
					last.position = last.position.to(position);
					return Ok(());
				}
			}
		}

		self.tokens.push(Token::new(kind, body, position));
		Ok(())
	}

	/// Consume everything up to, but excluding, the next line break.
	fn line(&mut self, kind: TokenKind) -> SoilResult<()> {
		let mut end = self.source.len();

		while self.cursor < self.raw_tokens.len() {
			let (result, span) = self.raw(self.cursor);
			if result == Ok(RawToken::Newline) {
				end = span.start;
				break;
			}
			self.cursor += 1;
		}

		self.emit(kind, end)
	}

	/// Consume a declaration: everything up to the next line break, `;`, `{`
	/// or `}`, without trailing whitespace. A comment marker separated from
	/// the text by whitespace ends the declaration.
	fn declaration(&mut self) -> SoilResult<()> {
		let mut last = self.cursor;
		let mut spaced = false;
		let mut index = self.cursor + 1;

		while index < self.raw_tokens.len() {
			let (result, _) = self.raw(index);
			match result {
				Ok(RawToken::Whitespace) => spaced = true,
				Ok(RawToken::Newline | RawToken::Semicolon | RawToken::BraceOpen | RawToken::BraceClose) => {
					break;
				}
				Ok(RawToken::DoubleSlash | RawToken::TripleSlash) if spaced => break,
				_ => {
					last = index;
					spaced = false;
				}
			}
			index += 1;
		}

		let (_, span) = self.raw(last);
		self.cursor = last + 1;
		self.emit(TokenKind::Declaration, span.end)
	}

	/// Main processing loop.
	fn process(&mut self) -> SoilResult<()> {
		while self.cursor < self.raw_tokens.len() {
			let (result, span) = self.raw(self.cursor);

			match result {
				Ok(RawToken::Whitespace | RawToken::Newline | RawToken::Semicolon) => {
					self.cursor += 1;
					self.emit(TokenKind::Separator, span.end)?;
				}
				Ok(RawToken::BraceOpen) => {
					self.cursor += 1;
					self.emit(TokenKind::BlockOpen, span.end)?;
				}
				Ok(RawToken::BraceClose) => {
					self.cursor += 1;
					self.emit(TokenKind::BlockClose, span.end)?;
				}
				Ok(RawToken::TripleSlash) => self.line(TokenKind::Description)?,
				Ok(RawToken::DoubleSlash) => self.line(TokenKind::Comment)?,
				Ok(RawToken::DoubleQuoted | RawToken::SingleQuoted) => {
					self.cursor += 1;
					self.emit(TokenKind::StringLiteral, span.end)?;
				}
				Ok(RawToken::Slash | RawToken::Text) | Err(()) => self.declaration()?,
			}
		}

		if self.point.offset == self.source.len() {
			Ok(())
		} else {
			Err(SoilError::Lex {
				offset: self.point.offset,
			})
		}
	}
}

/// Split schema source into tokens. Concatenating the token bodies always
/// reproduces `source` exactly.
pub fn tokenize(source: &str) -> SoilResult<Vec<Token>> {
	let mut walker = TokenWalker::new(source);
	walker.process()?;

	Ok(walker.tokens)
}
