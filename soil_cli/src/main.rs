use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use miette::Diagnostic;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use soil_cli::Commands;
use soil_cli::SoilCli;
use soil_cli::TokenFormat;
use soil_core::GeneratedFile;
use soil_core::SoilError;
use soil_core::generate;
use soil_core::languages;
use soil_core::parse_source;
use soil_core::project::ProjectContext;
use soil_core::project::scan_project;
use soil_core::schema;
use soil_core::stale_files;
use soil_core::tokenize;
use soil_core::write_generated;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = SoilCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let default_level = if args.verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.try_init()
		.ok();

	let result = match &args.command {
		Some(Commands::Generate {
			language,
			dry_run,
			check,
		}) => run_generate(&args, language, *dry_run, *check),
		Some(Commands::Tokenize { file, format }) => run_tokenize(&args, file, *format),
		Some(Commands::Tree { file }) => run_tree(&args, file),
		None => {
			eprintln!("No subcommand specified. Run `soil --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			match e.downcast::<SoilError>() {
				Ok(soil_err) => {
					let report: miette::Report = (*soil_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

fn resolve_root(args: &SoilCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Scan the project and report every schema file which failed to parse.
/// Returns the context and whether every file parsed.
fn scan_and_report(args: &SoilCli, root: &Path) -> CliResult<(ProjectContext, bool)> {
	let ctx = scan_project(root)?;

	if args.verbose {
		println!(
			"Scanned project: {} schema file(s), {} declaration(s)",
			ctx.files.len(),
			ctx.document.root().children().len()
		);
		for file in &ctx.files {
			println!("  {}", make_relative(file, root));
		}
	}

	for failure in &ctx.failures {
		let report = failure_report(&failure.error, &make_relative(&failure.file, root));
		eprintln!("{report:?}");
	}

	let ok = ctx.is_ok();
	Ok((ctx, ok))
}

/// Returns `Ok(false)` when the run should end with a failing status.
fn run_generate(args: &SoilCli, requested: &[String], dry_run: bool, check: bool) -> CliResult<bool> {
	let root = resolve_root(args);
	let (ctx, parsed) = scan_and_report(args, &root)?;
	let languages = ctx.languages(requested);

	if languages.is_empty() {
		return Err(
			"no languages to generate: pass `--language` or set `languages` in soil.toml".into(),
		);
	}

	let blueprints = languages::blueprints(&languages)?;
	let result = generate(&ctx, &blueprints, &languages)?;

	for failure in &result.failures {
		let location = format!("{} {}", failure.language, failure.node);
		let report = failure_report(&failure.error, &location);
		eprintln!("{report:?}");
	}

	let mut ok = parsed && result.is_ok();

	if check {
		let stale = stale_files(&result.files);
		if stale.is_empty() {
			println!("All {} generated file(s) are up to date.", result.files.len());
		} else {
			eprintln!(
				"{} {} generated file(s) are out of date:",
				colored!("stale:", yellow),
				stale.len()
			);
			for file in stale {
				print_stale(file, &root);
			}
			eprintln!("\nRun `soil generate` to update them.");
			ok = false;
		}
	} else if dry_run {
		println!("Dry run: would write {} file(s):", result.files.len());
		for file in &result.files {
			println!("  {} ({})", make_relative(&file.path, &root), file.language);
		}
	} else {
		write_generated(&result.files)?;
		println!(
			"{} {} file(s).",
			colored!("Generated", green),
			result.files.len()
		);

		if args.verbose {
			for file in &result.files {
				println!("  {}", make_relative(&file.path, &root));
			}
		}
	}

	Ok(ok)
}

fn run_tokenize(args: &SoilCli, file: &Path, format: TokenFormat) -> CliResult<bool> {
	let path = resolve_root(args).join(file);
	let source = std::fs::read_to_string(&path)?;
	let tokens = tokenize(&source)?;

	match format {
		TokenFormat::Text => {
			for token in &tokens {
				let location = format!("{}", token.position.start);
				println!(
					"{:<8} {:<12} {:?}",
					colored!(location, dimmed),
					token.kind.label(),
					token.body
				);
			}
		}
		TokenFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&tokens)?);
		}
	}

	Ok(true)
}

fn run_tree(args: &SoilCli, file: &Path) -> CliResult<bool> {
	let path = resolve_root(args).join(file);
	let source = std::fs::read_to_string(&path)?;
	let ast = parse_source(&source, &schema::grammar()?)?;

	print!("{}", ast.outline());

	Ok(true)
}

fn print_stale(file: &GeneratedFile, root: &Path) {
	eprintln!("\n  {}", make_relative(&file.path, root));
	let current = std::fs::read_to_string(&file.path).unwrap_or_default();
	print_diff(&current, &file.body);
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

/// Describe an error which did not abort the run, prefixed by where it
/// happened.
fn failure_report(error: &SoilError, location: &str) -> miette::Report {
	let mut diagnostic = miette::MietteDiagnostic::new(format!("[{location}] {error}"));

	if let Some(code) = error.code() {
		diagnostic = diagnostic.with_code(code.to_string());
	}

	if let Some(help) = error.help() {
		diagnostic = diagnostic.with_help(help.to_string());
	}

	miette::Report::new(diagnostic)
}
