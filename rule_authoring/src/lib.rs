//! Rule Authoring library crate.
//!
//! This crate holds the data model and editing operations behind the
//! admin rule builder: conditional tariff and dispensation rules, the
//! closed catalogs they draw from, and a catalog of reusable templates.
//! External applications may depend on the `rule_authoring` crate and
//! call the pure functions in `editor` directly, drive a
//! `session::RuleEditor`, or embed the API via `api::build_router`.

pub mod api;
pub mod catalog;
pub mod config;
pub mod editor;
pub mod labels;
pub mod models;
pub mod render;
pub mod session;
pub mod sink;
pub mod templates;

pub use catalog::{ActionType, Fact, Logic, Operator, RuleKind};
pub use models::{Action, ActionParameter, Condition, ConditionGroup, Rule, Template};
pub use session::RuleEditor;
pub use templates::TemplateCatalog;
