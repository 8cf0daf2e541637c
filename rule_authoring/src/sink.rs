//! Where finished rules go.
//!
//! The rule builder hands a completed [`Rule`] to a [`RuleSink`].  There
//! is no persistence behind the admin screens yet, so the sink shipped
//! here validates the rule and logs it.

use crate::editor::validate_for_save;
use crate::models::Rule;
use anyhow::Result;
use tracing::info;

/// Receives rules from the editor once the author saves them.
///
/// Sinks must be thread-safe (`Send + Sync`) because the HTTP layer
/// shares one sink across requests.
pub trait RuleSink: Send + Sync {
    /// Accept `rule` and return it as stored.  A sink that assigns ids
    /// fills in `rule.id` here.
    fn save(&self, rule: Rule) -> Result<Rule>;
}

/// Validates and logs saved rules as JSON without storing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl RuleSink for LoggingSink {
    fn save(&self, rule: Rule) -> Result<Rule> {
        validate_for_save(&rule)?;
        let body = serde_json::to_string(&rule)?;
        info!(name = %rule.name, rule = %body, "rule saved");
        Ok(rule)
    }
}
