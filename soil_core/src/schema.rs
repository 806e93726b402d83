//! The grammar of the soil schema language.
//!
//! ```text
//! entity Account {
//!   field id: Integer
//!   mutable field name: String
//!   write-only field password: String
//!   field status: Enum {
//!     case active
//!     case banned
//!   }
//!
//!   endpoint GET /accounts/:id {
//!     success {
//!       field account: Account
//!     }
//!   }
//! }
//! ```

use crate::Directive;
use crate::Grammar;
use crate::SoilResult;

pub const SCENARIO: &str = r"^(?<name>[A-Za-z0-9_\-\s]+)$";
pub const ENTITY: &str = r"^(?<name>[A-Z][A-Za-z0-9]*)$";
pub const FIELD: &str = r"^(?<name>[a-z][a-z0-9_]*)\s*:\s*(?<type>[A-Za-z*][A-Za-z0-9:\s<>(),._\-]*\??)$";
pub const CASE: &str = r"^(?<value>[A-Za-z][A-Za-z0-9_\-]*)$";
pub const VALUES: &str = r"^(?:[a-z_0-9]+\s*,\s*)*[a-z_0-9]+$";
pub const ENDPOINT: &str = r"^(?<method>[A-Z]+)\s+(?<path>(?:/[:$]?[A-Za-z0-9_\-]+)+/?|/)\s*$";
pub const PARAMETER: &str = r"^(?<name>[a-z][a-z0-9_]*)\s*:\s*(?<type>[A-Za-z][A-Za-z0-9:\s<>(),._\-]*)$";
pub const ACTION_NAME: &str = r"^(?<value>.+)$";

/// Build the standard schema grammar.
pub fn grammar() -> SoilResult<Grammar> {
	Grammar::builder()
		.directive(Directive::new("scenario")?.pattern(SCENARIO)?)
		.directive(Directive::new("entity")?.pattern(ENTITY)?)
		.directive(Directive::new("endpoint")?.pattern(ENDPOINT)?)
		.directive(Directive::declare("mutable|write-only field")?.pattern(FIELD)?)
		.directive(Directive::new("case")?.pattern(CASE)?)
		.directive(Directive::new("values")?.pattern(VALUES)?)
		.directive(Directive::declare("required query")?.pattern(PARAMETER)?)
		.directive(Directive::new("parameter")?.pattern(PARAMETER)?)
		.directive(Directive::new("request")?)
		.directive(Directive::new("success")?)
		.directive(Directive::new("action-name")?.pattern(ACTION_NAME)?)
		.structure("entity", ["field", "endpoint"])
		.structure("field", ["case", "field", "values"])
		.structure(
			"endpoint",
			["query", "parameter", "request", "success", "action-name"],
		)
		.structure("request", ["field"])
		.structure("success", ["field"])
		.root("scenario")
		.root("entity")
		.build()
}
