//! An editing session over one rule.
//!
//! [`RuleEditor`] owns the rule under edit together with the rule kind
//! it was opened for, and replaces its rule with the result of each
//! [`crate::editor`] operation.  The kind is what restricts the action
//! types on offer; the rule value itself does not carry it.

use crate::catalog::{ActionType, Logic, RuleKind};
use crate::editor;
use crate::models::{ActionParameter, ConditionField, ConditionId, GroupId, ParameterError, Rule, Template};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// A single edit, as posted by the rule builder form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RuleEdit {
    Rename {
        name: String,
    },
    AddConditionGroup,
    AddCondition {
        group_id: GroupId,
        logic: Logic,
    },
    UpdateCondition {
        group_id: GroupId,
        condition_id: ConditionId,
        field: ConditionField,
    },
    RemoveCondition {
        group_id: GroupId,
        condition_id: ConditionId,
    },
    SetActionType {
        action_type: ActionType,
    },
    SetActionParameter {
        key: String,
        value: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("{action_type} is not available for {kind} rules")]
    ActionNotAllowed { kind: RuleKind, action_type: ActionType },
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

#[derive(Debug, Clone)]
pub struct RuleEditor {
    kind: RuleKind,
    rule: Rule,
}

impl RuleEditor {
    /// Open a fresh draft.
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            rule: editor::create_draft(kind),
        }
    }

    /// Continue editing an existing rule.
    pub fn resume(kind: RuleKind, rule: Rule) -> Self {
        Self { kind, rule }
    }

    pub fn from_template(template: &Template) -> Self {
        Self {
            kind: template.kind,
            rule: editor::load_from_template(template),
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Switch the editor to a template's rule.  Templates of another
    /// kind are not offered by the builder and are ignored here.
    pub fn load_template(&mut self, template: &Template) {
        if template.kind != self.kind {
            warn!(template = %template.id, kind = %self.kind, "ignoring template of another kind");
            return;
        }
        self.rule = editor::load_from_template(template);
    }

    pub fn rename(&mut self, name: &str) {
        self.rule = editor::rename(&self.rule, name);
    }

    pub fn add_condition_group(&mut self) {
        self.rule = editor::add_condition_group(&self.rule);
    }

    pub fn add_condition(&mut self, group_id: GroupId, logic: Logic) {
        self.rule = editor::add_condition(&self.rule, group_id, logic);
    }

    pub fn update_condition(&mut self, group_id: GroupId, condition_id: ConditionId, field: ConditionField) {
        self.rule = editor::update_condition(&self.rule, group_id, condition_id, field);
    }

    pub fn remove_condition(&mut self, group_id: GroupId, condition_id: ConditionId) {
        self.rule = editor::remove_condition(&self.rule, group_id, condition_id);
    }

    /// Only action types of the editor's kind are accepted.
    pub fn set_action_type(&mut self, action_type: ActionType) -> Result<(), EditError> {
        if !self.kind.allows(action_type) {
            return Err(EditError::ActionNotAllowed {
                kind: self.kind,
                action_type,
            });
        }
        self.rule = editor::set_action_type(&self.rule, action_type);
        Ok(())
    }

    pub fn set_action_parameter(&mut self, parameter: ActionParameter) {
        self.rule = editor::set_action_parameter(&self.rule, parameter);
    }

    pub fn apply(&mut self, edit: RuleEdit) -> Result<(), EditError> {
        match edit {
            RuleEdit::Rename { name } => self.rename(&name),
            RuleEdit::AddConditionGroup => self.add_condition_group(),
            RuleEdit::AddCondition { group_id, logic } => self.add_condition(group_id, logic),
            RuleEdit::UpdateCondition {
                group_id,
                condition_id,
                field,
            } => self.update_condition(group_id, condition_id, field),
            RuleEdit::RemoveCondition {
                group_id,
                condition_id,
            } => self.remove_condition(group_id, condition_id),
            RuleEdit::SetActionType { action_type } => self.set_action_type(action_type)?,
            RuleEdit::SetActionParameter { key, value } => {
                self.rule = editor::set_action_parameter_value(&self.rule, &key, &value)?;
            }
        }
        Ok(())
    }

    /// Start over with a fresh draft of the same kind.
    pub fn reset(&mut self) {
        self.rule = editor::create_draft(self.kind);
    }

    /// Hand the rule out and reset the editor.
    pub fn take(&mut self) -> Rule {
        std::mem::replace(&mut self.rule, editor::create_draft(self.kind))
    }

    pub fn into_rule(self) -> Rule {
        self.rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Fact;
    use serde_json::json;

    #[test]
    fn test_action_types_are_scoped_to_kind() {
        let mut editor = RuleEditor::new(RuleKind::Dispensation);
        assert_eq!(
            editor.set_action_type(ActionType::CreateUktBill),
            Err(EditError::ActionNotAllowed {
                kind: RuleKind::Dispensation,
                action_type: ActionType::CreateUktBill
            })
        );
        assert_eq!(editor.rule().action.action_type(), None);
        editor.set_action_type(ActionType::WaiveBill).unwrap();
        assert_eq!(editor.rule().action.action_type(), Some(ActionType::WaiveBill));
    }

    #[test]
    fn test_reset_returns_to_fresh_draft() {
        let mut editor = RuleEditor::new(RuleKind::Dispensation);
        editor.rename("Cicilan");
        editor.add_condition(GroupId(1), Logic::Or);
        editor.set_action_type(ActionType::ConvertToInstallment).unwrap();
        editor.set_action_parameter(ActionParameter::InstallmentCount(3));
        editor.reset();
        assert_eq!(editor.rule(), &editor::create_draft(RuleKind::Dispensation));
        assert_eq!(editor.kind(), RuleKind::Dispensation);
    }

    #[test]
    fn test_take_hands_out_rule_and_resets() {
        let mut editor = RuleEditor::new(RuleKind::Tariff);
        editor.rename("SKS 2024");
        editor.add_condition_group();
        let rule = editor.take();
        assert_eq!(rule.name, "SKS 2024");
        assert_eq!(rule.condition_groups.len(), 2);
        assert_eq!(editor.rule(), &editor::create_draft(RuleKind::Tariff));
    }

    #[test]
    fn test_apply_edits_from_json() {
        let edits = json!([
            {"op": "rename", "name": "Waive for scholarship"},
            {"op": "update_condition", "groupId": 1, "conditionId": 1,
             "field": {"name": "fact", "value": "student.status"}},
            {"op": "add_condition", "groupId": 1, "logic": "OR"},
            {"op": "set_action_type", "actionType": "waive_bill"},
            {"op": "set_action_parameter", "key": "reason", "value": "beasiswa"}
        ]);
        let edits: Vec<RuleEdit> = serde_json::from_value(edits).unwrap();
        let mut editor = RuleEditor::new(RuleKind::Dispensation);
        for edit in edits {
            editor.apply(edit).unwrap();
        }
        let rule = editor.into_rule();
        assert_eq!(rule.name, "Waive for scholarship");
        assert_eq!(rule.condition_groups[0].logic, Logic::Or);
        assert_eq!(rule.condition_groups[0].conditions.len(), 2);
        assert_eq!(rule.condition_groups[0].conditions[0].fact, Some(Fact::StudentStatus));
        assert_eq!(rule.action.parameters().get("reason"), Some(&json!("beasiswa")));
    }

    #[test]
    fn test_load_template_of_other_kind_is_ignored() {
        let template = Template {
            id: "t".into(),
            name: "tariff".into(),
            kind: RuleKind::Tariff,
            rule: editor::rename(&editor::create_draft(RuleKind::Tariff), "from template"),
        };
        let mut editor = RuleEditor::new(RuleKind::Dispensation);
        editor.load_template(&template);
        assert_eq!(editor.rule().name, "");

        let mut editor = RuleEditor::new(RuleKind::Tariff);
        editor.load_template(&template);
        assert_eq!(editor.rule().name, "from template");
        assert_eq!(RuleEditor::from_template(&template).kind(), RuleKind::Tariff);
    }
}
