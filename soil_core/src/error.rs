use miette::Diagnostic;
use thiserror::Error;

/// Coarse classification of a [`SoilError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The tokenizer failed to cover the source.
	Lex,
	/// The token stream does not follow the grammar.
	Syntax,
	/// A blueprint required an attribute the focused node lacks.
	Attribute,
	/// Grammar or blueprint registration is inconsistent.
	Configuration,
	/// Reading or writing files failed.
	Io,
	/// Project level failures (config files, languages, export paths).
	Project,
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SoilError {
	#[error(transparent)]
	#[diagnostic(code(soil::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to tokenize source at offset {offset}")]
	#[diagnostic(code(soil::lex))]
	Lex { offset: usize },

	#[error("unknown directive `{word}` at {line}:{column}")]
	#[diagnostic(
		code(soil::unknown_directive),
		help("check the spelling or register the directive in the grammar")
	)]
	UnknownDirective {
		word: String,
		line: usize,
		column: usize,
	},

	#[error("invalid `{directive}` declaration `{attributes}` at {line}:{column}")]
	#[diagnostic(code(soil::invalid_declaration))]
	InvalidDeclaration {
		directive: String,
		attributes: String,
		line: usize,
		column: usize,
	},

	#[error("unterminated block for `{directive}` opened at {line}:{column}")]
	#[diagnostic(code(soil::unterminated_block), help("insert `}}` to complete the block"))]
	UnterminatedBlock {
		directive: String,
		line: usize,
		column: usize,
	},

	#[error("unexpected `}}` at {line}:{column}")]
	#[diagnostic(code(soil::unexpected_close))]
	UnexpectedClose { line: usize, column: usize },

	#[error("unexpected `{{` at {line}:{column}")]
	#[diagnostic(code(soil::unexpected_open), help("a block must follow a declaration"))]
	UnexpectedOpen { line: usize, column: usize },

	#[error("required attribute is not found: `{key}` on `{directive}`")]
	#[diagnostic(code(soil::missing_attribute))]
	MissingAttribute { key: String, directive: String },

	#[error("invalid directive declaration: `{0}`")]
	#[diagnostic(
		code(soil::invalid_directive),
		help("use `name` or `annotation|annotation name` with lowercase hyphenated words")
	)]
	InvalidDirective(String),

	#[error("invalid attribute pattern for `{directive}`: {reason}")]
	#[diagnostic(code(soil::invalid_pattern))]
	InvalidPattern { directive: String, reason: String },

	#[error("`{parent}` permits unknown child directive `{child}`")]
	#[diagnostic(code(soil::unknown_child_directive))]
	UnknownChildDirective { parent: String, child: String },

	#[error("unknown root directive `{0}`")]
	#[diagnostic(code(soil::unknown_root_directive))]
	UnknownRootDirective(String),

	#[error("invalid blueprint key: `{0}`")]
	#[diagnostic(
		code(soil::invalid_blueprint_key),
		help("keys look like `language:phase`, `language:phase:directive` or `language:phase:directive:annotation`")
	)]
	InvalidBlueprintKey(String),

	#[error("duplicate blueprint `{0}`")]
	#[diagnostic(
		code(soil::duplicate_blueprint),
		help("each language, phase, directive and annotation combination can only be registered once; use a hook to extend it")
	)]
	DuplicateBlueprint(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(soil::config_parse),
		help("check that soil.toml is valid TOML with `root_dir`, `export_dir` and `[generate]` entries")
	)]
	ConfigParse(String),

	#[error("unsupported language: `{0}`")]
	#[diagnostic(code(soil::unsupported_language), help("supported languages: swift, kotlin"))]
	UnsupportedLanguage(String),

	#[error("`{key}` must be set in `[generate.{language}]`")]
	#[diagnostic(code(soil::missing_option))]
	MissingOption { language: String, key: String },

	#[error("invalid `{key}` option: {reason}")]
	#[diagnostic(code(soil::invalid_option))]
	InvalidOption { key: String, reason: String },

	#[error("no export directory configured for `{0}`")]
	#[diagnostic(
		code(soil::missing_export_dir),
		help("set `export_dir` in soil.toml, either as a path or as a table keyed by language")
	)]
	MissingExportDir(String),

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(soil::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

impl SoilError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) => ErrorKind::Io,
			Self::Lex { .. } => ErrorKind::Lex,
			Self::UnknownDirective { .. }
			| Self::InvalidDeclaration { .. }
			| Self::UnterminatedBlock { .. }
			| Self::UnexpectedClose { .. }
			| Self::UnexpectedOpen { .. } => ErrorKind::Syntax,
			Self::MissingAttribute { .. } => ErrorKind::Attribute,
			Self::InvalidDirective(_)
			| Self::InvalidPattern { .. }
			| Self::UnknownChildDirective { .. }
			| Self::UnknownRootDirective(_)
			| Self::InvalidBlueprintKey(_)
			| Self::DuplicateBlueprint(_) => ErrorKind::Configuration,
			Self::ConfigParse(_)
			| Self::UnsupportedLanguage(_)
			| Self::MissingExportDir(_)
			| Self::MissingOption { .. }
			| Self::InvalidOption { .. }
			| Self::SymlinkCycle { .. } => ErrorKind::Project,
		}
	}

	pub fn is_syntax_error(&self) -> bool {
		self.kind() == ErrorKind::Syntax
	}
}

pub type SoilResult<T> = Result<T, SoilError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
