use std::collections::HashMap;
use std::hash::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

/// Options for [`pretty_print`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrettyOptions {
	/// Opening and closing characters which change the indent depth.
	pub blocks: Vec<(char, char)>,
	/// Markers which start a comment running to the end of the line.
	pub line_comments: Vec<String>,
	/// Delimiters of comments which may span several lines. Their content is
	/// never re-indented.
	pub block_comments: Vec<(String, String)>,
	/// Drop line comments from the output.
	pub strip_comments: bool,
	/// One level of indentation.
	pub indent: String,
	/// Line prefixes which receive one extra level of indentation, e.g. `.`
	/// for method chains.
	pub continuations: Vec<String>,
}

impl Default for PrettyOptions {
	fn default() -> Self {
		Self {
			blocks: vec![('{', '}'), ('(', ')'), ('[', ']')],
			line_comments: vec!["//".into()],
			block_comments: vec![("/*".into(), "*/".into())],
			strip_comments: false,
			indent: "  ".into(),
			continuations: vec![],
		}
	}
}

impl PrettyOptions {
	#[must_use]
	pub fn indent(mut self, indent: impl Into<String>) -> Self {
		self.indent = indent.into();
		self
	}

	#[must_use]
	pub fn strip_comments(mut self, strip: bool) -> Self {
		self.strip_comments = strip;
		self
	}

	#[must_use]
	pub fn continuation(mut self, prefix: impl Into<String>) -> Self {
		self.continuations.push(prefix.into());
		self
	}
}

const PLACEHOLDER_PREFIX: &str = "__soil_comment_";

/// Re-indent `text` from its block punctuation. Running it on its own output
/// returns the output unchanged.
///
/// ```rust
/// use soil_core::PrettyOptions;
/// use soil_core::pretty_print;
///
/// let text = "struct A {\nlet a: Int\n}";
/// assert_eq!(
/// 	pretty_print(text, &PrettyOptions::default()),
/// 	"struct A {\n  let a: Int\n}"
/// );
/// ```
pub fn pretty_print(text: &str, options: &PrettyOptions) -> String {
	let (text, comments) = hide_block_comments(text, options);
	let mut depth = 0usize;
	let mut lines = vec![];

	for line in text.lines() {
		let trimmed = line.trim();
		let mut body = trimmed;
		let starts_closed = options.blocks.iter().any(|(_, close)| body.starts_with(*close));
		let mut indent = if starts_closed { depth.saturating_sub(1) } else { depth };

		if options.continuations.iter().any(|prefix| body.starts_with(prefix.as_str())) {
			indent += 1;
		}

		let code = match find_line_comment(body, &options.line_comments) {
			Some(index) => {
				if options.strip_comments {
					body = body[..index].trim_end();
				}
				&trimmed[..index]
			}
			None => body,
		};

		let mut quoted = false;
		for ch in code.chars() {
			if ch == '"' {
				quoted = !quoted;
			} else if !quoted && options.blocks.iter().any(|(open, _)| *open == ch) {
				depth += 1;
			} else if !quoted && options.blocks.iter().any(|(_, close)| *close == ch) {
				depth = depth.saturating_sub(1);
			}
		}

		if body.is_empty() {
			lines.push(String::new());
		} else {
			lines.push(format!("{}{body}", options.indent.repeat(indent)));
		}
	}

	let mut output = collapse_blank_lines(&lines);

	for (placeholder, original) in &comments {
		output = output.replace(placeholder.as_str(), original);
	}

	output
}

/// Join lines, keeping at most one blank line in a row and none at either
/// end.
fn collapse_blank_lines(lines: &[String]) -> String {
	let mut kept: Vec<&str> = vec![];

	for line in lines {
		if line.is_empty() && kept.last().is_none_or(|last| last.is_empty()) {
			continue;
		}
		kept.push(line);
	}

	while kept.last().is_some_and(|last| last.is_empty()) {
		kept.pop();
	}

	kept.join("\n")
}

/// Byte index of the first line comment marker outside a double quoted
/// string.
fn find_line_comment(line: &str, markers: &[String]) -> Option<usize> {
	let mut quoted = false;

	for (index, ch) in line.char_indices() {
		if ch == '"' {
			quoted = !quoted;
			continue;
		}

		if !quoted && markers.iter().any(|marker| line[index..].starts_with(marker.as_str())) {
			return Some(index);
		}
	}

	None
}

/// Replace every block comment with a content addressed placeholder.
fn hide_block_comments(text: &str, options: &PrettyOptions) -> (String, HashMap<String, String>) {
	let mut output = String::with_capacity(text.len());
	let mut comments = HashMap::new();
	let mut rest = text;
	let mut quoted = false;
	let mut line_comment = false;

	while let Some(ch) = rest.chars().next() {
		if ch == '\n' {
			quoted = false;
			line_comment = false;
		} else if !line_comment && ch == '"' {
			quoted = !quoted;
		} else if !line_comment && !quoted {
			if options
				.line_comments
				.iter()
				.any(|marker| rest.starts_with(marker.as_str()))
				&& !options
					.block_comments
					.iter()
					.any(|(open, _)| rest.starts_with(open.as_str()))
			{
				line_comment = true;
			} else if let Some((open, close)) = options
				.block_comments
				.iter()
				.find(|(open, _)| rest.starts_with(open.as_str()))
			{
				if let Some(end) = rest[open.len()..].find(close.as_str()) {
					let length = open.len() + end + close.len();
					let comment = &rest[..length];
					let placeholder = placeholder(comment);

					output.push_str(&placeholder);
					comments.insert(placeholder, comment.to_string());
					rest = &rest[length..];
					continue;
				}
			}
		}

		output.push(ch);
		rest = &rest[ch.len_utf8()..];
	}

	(output, comments)
}

fn placeholder(comment: &str) -> String {
	let mut hasher = DefaultHasher::new();
	comment.hash(&mut hasher);
	format!("{PLACEHOLDER_PREFIX}{:016x}__", hasher.finish())
}
