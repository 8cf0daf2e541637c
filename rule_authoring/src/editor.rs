//! Rule editing operations.
//!
//! Every operation takes the current [`Rule`] by reference and returns
//! the next value, leaving the input untouched.  Ids that do not
//! resolve are silent no-ops: the rule comes back unchanged and the
//! miss is logged at debug level.

use crate::catalog::{ActionType, Logic, RuleKind};
use crate::models::{
    Action, ActionParameter, Condition, ConditionField, ConditionGroup, ConditionId, GroupId,
    ParameterError, Rule, Template,
};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Reasons a rule cannot be handed to a save callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rule name is required")]
    EmptyName,
    #[error("rule has no condition groups")]
    NoConditionGroups,
    #[error("condition group {0} has no conditions")]
    EmptyGroup(GroupId),
    #[error("condition group id {0} is used more than once")]
    DuplicateGroupId(GroupId),
    #[error("condition id {condition_id} is used more than once in group {group_id}")]
    DuplicateConditionId {
        group_id: GroupId,
        condition_id: ConditionId,
    },
}

/// A fresh rule: unnamed, one `AND` group with one empty condition, and
/// no action type.
pub fn create_draft(kind: RuleKind) -> Rule {
    debug!(%kind, "creating draft rule");
    Rule {
        id: None,
        name: String::new(),
        condition_groups: vec![ConditionGroup::new(GroupId(1))],
        action: Action::default(),
    }
}

/// An independent copy of the template's rule.
pub fn load_from_template(template: &Template) -> Rule {
    debug!(template = %template.id, "loading rule from template");
    template.rule.clone()
}

pub fn rename(rule: &Rule, name: &str) -> Rule {
    let mut next = rule.clone();
    next.name = name.to_string();
    next
}

/// Append a new `AND` group holding one empty condition.
pub fn add_condition_group(rule: &Rule) -> Rule {
    let mut next = rule.clone();
    let id = next.next_group_id();
    next.condition_groups.push(ConditionGroup::new(id));
    next
}

/// Append an empty condition to `group_id` and set the group's logic.
///
/// The logic is group-wide, so this also changes how the existing
/// conditions of the group are joined.
pub fn add_condition(rule: &Rule, group_id: GroupId, logic: Logic) -> Rule {
    let mut next = rule.clone();
    match next.group_mut(group_id) {
        Some(group) => {
            group.logic = logic;
            let id = group.next_condition_id();
            group.conditions.push(Condition::empty(id));
        }
        None => debug!(%group_id, "add_condition: no such group"),
    }
    next
}

/// Set one field of a condition.
pub fn update_condition(
    rule: &Rule,
    group_id: GroupId,
    condition_id: ConditionId,
    field: ConditionField,
) -> Rule {
    let mut next = rule.clone();
    match next
        .group_mut(group_id)
        .and_then(|group| group.condition_mut(condition_id))
    {
        Some(condition) => condition.set(field),
        None => debug!(%group_id, %condition_id, "update_condition: no such condition"),
    }
    next
}

/// Remove a condition, dropping its group if that leaves it empty.
///
/// Removing the last condition of the last group yields a rule with no
/// groups; that is a legal editing state but fails [`validate_for_save`].
pub fn remove_condition(rule: &Rule, group_id: GroupId, condition_id: ConditionId) -> Rule {
    let mut next = rule.clone();
    let Some(index) = next.condition_groups.iter().position(|g| g.id == group_id) else {
        debug!(%group_id, "remove_condition: no such group");
        return next;
    };
    let group = &mut next.condition_groups[index];
    let before = group.conditions.len();
    group.conditions.retain(|c| c.id != condition_id);
    if group.conditions.len() == before {
        debug!(%group_id, %condition_id, "remove_condition: no such condition");
    }
    if group.conditions.is_empty() {
        next.condition_groups.remove(index);
    }
    next
}

/// Switch the action type.  Parameters entered for the previous type
/// are discarded.
pub fn set_action_type(rule: &Rule, action_type: ActionType) -> Rule {
    let mut next = rule.clone();
    next.action = Action::of_type(action_type);
    next
}

/// Merge one parameter into the action, keeping the others.  A
/// parameter the current action type does not accept is ignored.
pub fn set_action_parameter(rule: &Rule, parameter: ActionParameter) -> Rule {
    let mut next = rule.clone();
    let key = parameter.key();
    if !next.action.apply(parameter) {
        debug!(key, "set_action_parameter: not a parameter of the current action");
    }
    next
}

/// String-keyed form of [`set_action_parameter`], parsing `value`
/// against the current action's parameter schema.
pub fn set_action_parameter_value(
    rule: &Rule,
    key: &str,
    value: &Value,
) -> Result<Rule, ParameterError> {
    let action_type = rule.action.action_type().ok_or(ParameterError::NoActionType)?;
    let parameter = ActionParameter::parse(action_type, key, value)?;
    Ok(set_action_parameter(rule, parameter))
}

/// Group ids repeated within the rule and condition ids repeated within
/// a group.  Edits address groups and conditions by id, so a rule with
/// duplicates cannot be edited reliably.
pub fn duplicate_id_errors(rule: &Rule) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut group_ids = HashSet::new();
    for group in &rule.condition_groups {
        if !group_ids.insert(group.id) {
            errors.push(ValidationError::DuplicateGroupId(group.id));
        }
        let mut condition_ids = HashSet::new();
        for condition in &group.conditions {
            if !condition_ids.insert(condition.id) {
                errors.push(ValidationError::DuplicateConditionId {
                    group_id: group.id,
                    condition_id: condition.id,
                });
            }
        }
    }
    errors
}

/// Every reason `rule` cannot be saved, in rule order.
pub fn validation_errors(rule: &Rule) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if rule.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    if rule.condition_groups.is_empty() {
        errors.push(ValidationError::NoConditionGroups);
    }
    errors.extend(
        rule.condition_groups
            .iter()
            .filter(|g| g.conditions.is_empty())
            .map(|g| ValidationError::EmptyGroup(g.id)),
    );
    errors.extend(duplicate_id_errors(rule));
    errors
}

/// Check a rule before it is handed to a save callback.
pub fn validate_for_save(rule: &Rule) -> Result<(), ValidationError> {
    match validation_errors(rule).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
