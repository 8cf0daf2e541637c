//! One-line previews of a rule, as shown under the rule builder.

use crate::catalog::Logic;
use crate::models::{Action, Condition, ConditionGroup, Rule};
use serde_json::Value;

/// Render `rule` as `IF (...) OR (...) THEN action(key=value, ...)`.
///
/// Unset facts and operators print as `?`.
pub fn describe(rule: &Rule) -> String {
    let conditions = if rule.condition_groups.is_empty() {
        "(no conditions)".to_string()
    } else {
        rule.condition_groups
            .iter()
            .map(describe_group)
            .collect::<Vec<_>>()
            .join(" OR ")
    };
    format!("IF {} THEN {}", conditions, describe_action(&rule.action))
}

fn describe_group(group: &ConditionGroup) -> String {
    let joiner = match group.logic {
        Logic::And => " AND ",
        Logic::Or => " OR ",
    };
    let body = group
        .conditions
        .iter()
        .map(describe_condition)
        .collect::<Vec<_>>()
        .join(joiner);
    format!("({body})")
}

fn describe_condition(condition: &Condition) -> String {
    let fact = condition.fact.map_or("?", |f| f.as_str());
    let operator = condition.operator.map_or("?", |o| o.as_str());
    format!("{fact} {operator} {}", condition.value)
        .trim_end()
        .to_string()
}

fn describe_action(action: &Action) -> String {
    let Some(action_type) = action.action_type() else {
        return "(no action)".to_string();
    };
    let parameters = action.parameters();
    let args = action_type
        .parameter_keys()
        .iter()
        .filter_map(|key| {
            parameters.get(*key).map(|value| match value {
                Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            })
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{action_type}({args})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionType, DurationUnit, Fact, Operator, RuleKind};
    use crate::editor::{
        add_condition, add_condition_group, create_draft, remove_condition, set_action_parameter,
        set_action_type, update_condition,
    };
    use crate::models::{ActionParameter, ConditionField, ConditionId, GroupId};

    #[test]
    fn test_describe_draft() {
        let rule = create_draft(RuleKind::Tariff);
        assert_eq!(describe(&rule), "IF (? ?) THEN (no action)");
        let empty = remove_condition(&rule, GroupId(1), ConditionId(1));
        assert_eq!(describe(&empty), "IF (no conditions) THEN (no action)");
    }

    #[test]
    fn test_describe_full_rule() {
        let set = |rule: Rule, g: u32, c: u32, field: ConditionField| {
            update_condition(&rule, GroupId(g), ConditionId(c), field)
        };
        let rule = create_draft(RuleKind::Dispensation);
        let rule = add_condition(&rule, GroupId(1), Logic::And);
        let rule = set(rule, 1, 1, ConditionField::Fact(Some(Fact::StudentStatus)));
        let rule = set(rule, 1, 1, ConditionField::Operator(Some(Operator::Eq)));
        let rule = set(rule, 1, 1, ConditionField::Value("active".into()));
        let rule = set(rule, 1, 2, ConditionField::Fact(Some(Fact::BillDaysOverdue)));
        let rule = set(rule, 1, 2, ConditionField::Operator(Some(Operator::Gt)));
        let rule = set(rule, 1, 2, ConditionField::Value("30".into()));
        let rule = add_condition_group(&rule);
        let rule = set(rule, 2, 1, ConditionField::Fact(Some(Fact::StudentGpa)));
        let rule = set(rule, 2, 1, ConditionField::Operator(Some(Operator::Ge)));
        let rule = set(rule, 2, 1, ConditionField::Value("3.5".into()));
        let rule = set_action_type(&rule, ActionType::ExtendDueDate);
        let rule = set_action_parameter(&rule, ActionParameter::ExtensionUnit(DurationUnit::Weeks));
        let rule = set_action_parameter(&rule, ActionParameter::ExtensionDuration(2));

        assert_eq!(
            describe(&rule),
            "IF (student.status = active AND bill.days_overdue > 30) OR (student.gpa >= 3.5) \
             THEN extend_due_date(extensionDuration=2, extensionUnit=weeks)"
        );
    }
}
