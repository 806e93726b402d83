//! `soil_core` is the compiler behind [soil](https://github.com/soil-schema/soil). It reads a small declarative schema language describing API entities and endpoints, parses it into a node tree and renders that tree into source files for target languages.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Schema source (*.soil)
//!   → Lexer (splits the source into declaration, separator, block and comment tokens)
//!   → Parser (matches tokens against a Grammar of directives, with backtracking)
//!   → Ast (an arena of nodes with attributes, descriptions and name resolution)
//!   → Blueprints (hook-wrapped render procedures keyed by language, phase and directive)
//!   → Pretty printer (re-indents the generated text)
//!   → Artifacts (file name and body, written by the project layer)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `soil.toml`: schema directory, export directories, languages and per-language options.
//! - [`project`]: Schema file discovery, multi-file parsing with per-file failures and generation of output files.
//! - [`schema`]: The standard soil schema grammar.
//! - [`languages`]: Target language modules installed through the blueprint registration API.
//! - [`util`]: Naming helpers for language modules.
//!
//! ## Key Types
//!
//! - [`Grammar`] and [`Directive`]: The grammar rules driving the parser.
//! - [`Ast`] and [`Node`]: The parsed document and borrowed node handles.
//! - [`Blueprints`]: The immutable registry of render procedures, hooks and derived attributes.
//! - [`RenderContext`]: The state of one render job: focus, environment flags, buffers and the current file.
//! - [`Matcher`]: Node filters such as `!write-only field` used by `dig` and `exists`.
//!
//! ## Quick Start
//!
//! ```rust
//! use soil_core::languages;
//! use soil_core::parse_source;
//! use soil_core::schema;
//!
//! let grammar = schema::grammar()?;
//! let ast = parse_source("entity Account {\n  field id: Integer\n  field name: String\n}\n", &grammar)?;
//! let blueprints = languages::blueprints(&["swift"])?;
//!
//! let config = serde_json::json!({});
//! let artifacts = blueprints.render("swift", ast.root().children().next().unwrap(), &config)?;
//!
//! assert_eq!(artifacts[0].filename, "Account.swift");
//! assert!(artifacts[0].body.contains("let name: String"));
//! # Ok::<(), soil_core::SoilError>(())
//! ```

pub use config::*;
pub use context::*;
pub use engine::*;
pub use error::*;
pub use grammar::*;
pub use lexer::tokenize;
pub use matcher::*;
pub use node::*;
pub use parser::*;
pub use position::*;
pub use pretty::*;
pub use project::*;
pub use tokens::Token;
pub use tokens::TokenKind;

pub mod config;
mod context;
mod engine;
#[allow(unused_assignments)]
mod error;
mod grammar;
pub mod languages;
pub(crate) mod lexer;
mod matcher;
mod node;
mod parser;
mod position;
mod pretty;
pub mod project;
pub mod schema;
pub mod tokens;
pub mod util;

#[cfg(test)]
mod __fixtures;
