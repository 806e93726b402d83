//! Naming helpers for language modules.

/// Capitalize every word and join them with `separator`. Words are split on
/// whitespace, `-`, `_` and `:`.
///
/// ```rust
/// use soil_core::util::capitalize;
///
/// assert_eq!(capitalize("GET users", ""), "GetUsers");
/// assert_eq!(capitalize("user-status", " "), "User Status");
/// ```
pub fn capitalize(subject: &str, separator: &str) -> String {
	subject
		.to_lowercase()
		.split(|ch: char| ch.is_whitespace() || matches!(ch, '-' | '_' | ':'))
		.filter(|word| !word.is_empty())
		.map(upper_first)
		.collect::<Vec<_>>()
		.join(separator)
}

/// Convert `snake_case`, `kebab-case` or spaced words to `camelCase`. Existing
/// inner capitals are kept.
pub fn camelize(subject: &str) -> String {
	let mut words = subject
		.split(|ch: char| ch.is_whitespace() || matches!(ch, '-' | '_'))
		.filter(|word| !word.is_empty());

	let Some(first) = words.next() else {
		return String::new();
	};

	let mut output = lower_first(first);
	for word in words {
		output.push_str(&upper_first(word));
	}
	output
}

/// Turn a url path into words: `/users/:id/posts` becomes `users :id posts`.
pub fn sentence(path: &str) -> String {
	path.split('/')
		.filter(|segment| !segment.is_empty())
		.collect::<Vec<_>>()
		.join(" ")
}

/// A naive english singular: `Categories` to `Category`, `Tags` to `Tag`.
pub fn singular(word: &str) -> String {
	if let Some(stem) = word.strip_suffix("ies") {
		return format!("{stem}y");
	}

	if word.ends_with("ss") {
		return word.to_string();
	}

	word.strip_suffix('s').unwrap_or(word).to_string()
}

fn upper_first(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

fn lower_first(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first.to_lowercase().chain(chars).collect(),
		None => String::new(),
	}
}
