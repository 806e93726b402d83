use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compile soil API schemas into client source files.",
	long_about = "soil reads `*.soil` schema files describing API entities and endpoints and \
	              generates source files for each configured language.\n\nQuick start:\n  soil \
	              generate          Write generated files to the export directory\n  soil generate \
	              --check  Verify generated files are up to date\n  soil tree FILE         \
	              Print the parsed schema outline"
)]
pub struct SoilCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Generate source files from the project's schema files.
	///
	/// Loads `soil.toml`, parses every `*.soil` file below the schema
	/// directory and renders each entity for every requested language. A file
	/// which fails to parse is reported and skipped; the remaining files are
	/// still generated and the command exits with a non-zero status.
	Generate {
		/// Target language. Repeat for several languages. Defaults to the
		/// `languages` listed in `soil.toml`.
		#[arg(long, short)]
		language: Vec<String>,

		/// Print which files would be written without touching the disk.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Compare generated output with the files on disk and exit with a
		/// non-zero status when any of them are stale. Prints a unified diff
		/// for every stale file.
		#[arg(long, default_value_t = false, conflicts_with = "dry_run")]
		check: bool,
	},
	/// Print the tokens of a schema file.
	Tokenize {
		/// The schema file to tokenize.
		file: PathBuf,

		/// Output format. Use `text` for one token per line or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = TokenFormat::Text)]
		format: TokenFormat,
	},
	/// Parse a schema file and print its outline.
	Tree {
		/// The schema file to parse.
		file: PathBuf,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TokenFormat {
	/// Position, kind and quoted body of every token.
	Text,
	/// The token list as JSON.
	Json,
}
