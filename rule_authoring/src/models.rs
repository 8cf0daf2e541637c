//! Data models for the rule builder.
//!
//! A [`Rule`] is a named "IF conditions THEN action" directive.  Its
//! conditions are organised in [`ConditionGroup`]s: conditions inside
//! a group share one [`Logic`] operator, and the groups themselves are
//! OR'd together.  The [`Action`] is a tagged union keyed by action
//! type so each type carries only the parameters it understands.
//!
//! Everything here derives `Serialize` and `Deserialize`; the JSON
//! shape matches what the admin front-end posts
//! (`conditionGroups`, `"AND"`, `{"type": ..., "parameters": {...}}`).

use crate::catalog::{ActionType, DiscountType, DurationUnit, Fact, Logic, Operator, RuleKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Handle for a group within one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

/// Handle for a condition within one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named conditional billing or dispensation directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Assigned by whoever persists the rule; drafts have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    /// OR'd together when the rule is read.
    #[serde(default)]
    pub condition_groups: Vec<ConditionGroup>,
    #[serde(default)]
    pub action: Action,
}

impl Rule {
    pub fn group(&self, id: GroupId) -> Option<&ConditionGroup> {
        self.condition_groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut ConditionGroup> {
        self.condition_groups.iter_mut().find(|g| g.id == id)
    }

    /// One past the largest group id in use, or the smallest unused id
    /// once the largest is `u32::MAX`.
    pub fn next_group_id(&self) -> GroupId {
        GroupId(next_free_id(self.condition_groups.iter().map(|g| g.id.0)))
    }
}

/// Conditions joined by a single shared boolean operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub id: GroupId,
    #[serde(default)]
    pub logic: Logic,
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    /// A fresh `AND` group holding one empty condition.
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            logic: Logic::And,
            conditions: vec![Condition::empty(ConditionId(1))],
        }
    }

    pub fn condition_mut(&mut self, id: ConditionId) -> Option<&mut Condition> {
        self.conditions.iter_mut().find(|c| c.id == id)
    }

    pub fn next_condition_id(&self) -> ConditionId {
        ConditionId(next_free_id(self.conditions.iter().map(|c| c.id.0)))
    }
}

/// Ids come from clients, so the largest one may not be incrementable.
fn next_free_id(ids: impl Iterator<Item = u32>) -> u32 {
    let used: BTreeSet<u32> = ids.collect();
    match used.last() {
        None => 1,
        Some(&max) => max
            .checked_add(1)
            .or_else(|| (1..=u32::MAX).find(|id| !used.contains(id)))
            .unwrap_or(0),
    }
}

/// One comparison between a fact and a free-text value.
///
/// `fact` and `operator` may be unset while a rule is being drafted;
/// on the wire the unset state is the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    #[serde(default, with = "unset_as_empty")]
    pub fact: Option<Fact>,
    #[serde(default, with = "unset_as_empty")]
    pub operator: Option<Operator>,
    /// Not type-checked; numeric or textual depending on the fact.
    #[serde(default)]
    pub value: String,
}

impl Condition {
    pub fn empty(id: ConditionId) -> Self {
        Self {
            id,
            fact: None,
            operator: None,
            value: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fact.is_none() && self.operator.is_none() && self.value.is_empty()
    }

    pub fn set(&mut self, field: ConditionField) {
        match field {
            ConditionField::Fact(fact) => self.fact = fact,
            ConditionField::Operator(operator) => self.operator = operator,
            ConditionField::Value(value) => self.value = value,
        }
    }
}

/// A single field assignment on a [`Condition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "lowercase")]
pub enum ConditionField {
    #[serde(with = "unset_as_empty")]
    Fact(Option<Fact>),
    #[serde(with = "unset_as_empty")]
    Operator(Option<Operator>),
    Value(String),
}

/// Serialises `None` as `""` and parses `""` back to `None`; any other
/// string goes through the catalog's `FromStr`.
mod unset_as_empty {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

/// The effect of a rule, with parameters typed per action type.
///
/// `Unset` is the draft state (`type: ""`).  Switching type always
/// starts from that type's empty parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters")]
pub enum Action {
    #[serde(rename = "")]
    Unset(NoParameters),
    #[serde(rename = "create_ukt_bill")]
    CreateUktBill(BillParameters),
    #[serde(rename = "create_sks_bill")]
    CreateSksBill(SksBillParameters),
    #[serde(rename = "create_registration_bill")]
    CreateRegistrationBill(BillParameters),
    #[serde(rename = "apply_fixed_discount")]
    ApplyFixedDiscount(FixedDiscountParameters),
    #[serde(rename = "apply_percentage_discount")]
    ApplyPercentageDiscount(PercentageDiscountParameters),
    #[serde(rename = "extend_due_date")]
    ExtendDueDate(ExtendDueDateParameters),
    #[serde(rename = "apply_discount")]
    ApplyDiscount(DiscountParameters),
    #[serde(rename = "convert_to_installment")]
    ConvertToInstallment(InstallmentParameters),
    #[serde(rename = "waive_bill")]
    WaiveBill(WaiveParameters),
}

impl Default for Action {
    fn default() -> Self {
        Action::Unset(NoParameters {})
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoParameters {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillParameters {
    /// Bill amount in rupiah.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    /// Days after issue before the bill is due.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_days: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SksBillParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_sks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_days: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixedDiscountParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PercentageDiscountParameters {
    /// 0 to 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtendDueDateParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_unit: Option<DurationUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscountParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallmentParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_interval: Option<DurationUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WaiveParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One typed action parameter, as entered in the action form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionParameter {
    Amount(u64),
    PricePerSks(u64),
    DueDays(u32),
    Percentage(u8),
    ExtensionDuration(u32),
    ExtensionUnit(DurationUnit),
    DiscountType(DiscountType),
    DiscountValue(u64),
    InstallmentCount(u32),
    InstallmentInterval(DurationUnit),
    Reason(String),
}

/// Failures when turning a `(key, value)` pair from the form into an
/// [`ActionParameter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("no action type selected")]
    NoActionType,
    #[error("{action_type} has no parameter named {key}")]
    UnknownKey { action_type: ActionType, key: String },
    #[error("invalid value for {key}: expected {expected}")]
    InvalidValue { key: String, expected: &'static str },
    #[error("{key} must be between {min} and {max}")]
    OutOfRange { key: String, min: u64, max: u64 },
}

impl ActionParameter {
    /// The wire key this parameter is stored under.
    pub fn key(&self) -> &'static str {
        match self {
            ActionParameter::Amount(_) => "amount",
            ActionParameter::PricePerSks(_) => "pricePerSks",
            ActionParameter::DueDays(_) => "dueDays",
            ActionParameter::Percentage(_) => "percentage",
            ActionParameter::ExtensionDuration(_) => "extensionDuration",
            ActionParameter::ExtensionUnit(_) => "extensionUnit",
            ActionParameter::DiscountType(_) => "discountType",
            ActionParameter::DiscountValue(_) => "discountValue",
            ActionParameter::InstallmentCount(_) => "installmentCount",
            ActionParameter::InstallmentInterval(_) => "installmentInterval",
            ActionParameter::Reason(_) => "reason",
        }
    }

    /// Parse a form value against the schema of `action_type`.
    ///
    /// Integers may arrive as JSON numbers or numeric strings since
    /// HTML inputs post text.
    pub fn parse(action_type: ActionType, key: &str, value: &Value) -> Result<Self, ParameterError> {
        if !action_type.parameter_keys().contains(&key) {
            return Err(ParameterError::UnknownKey {
                action_type,
                key: key.to_string(),
            });
        }
        let parameter = match key {
            "amount" => ActionParameter::Amount(integer(key, value, 0, u64::MAX)?),
            "pricePerSks" => ActionParameter::PricePerSks(integer(key, value, 0, u64::MAX)?),
            "dueDays" => ActionParameter::DueDays(small_integer(key, value, 0)?),
            "percentage" => ActionParameter::Percentage(integer(key, value, 0, 100)? as u8),
            "extensionDuration" => ActionParameter::ExtensionDuration(small_integer(key, value, 1)?),
            "extensionUnit" => ActionParameter::ExtensionUnit(choice(key, value, "days, weeks or months")?),
            "discountType" => ActionParameter::DiscountType(choice(key, value, "fixed or percentage")?),
            "discountValue" => ActionParameter::DiscountValue(integer(key, value, 0, u64::MAX)?),
            "installmentCount" => ActionParameter::InstallmentCount(small_integer(key, value, 1)?),
            "installmentInterval" => {
                ActionParameter::InstallmentInterval(choice(key, value, "days, weeks or months")?)
            }
            "reason" => match value {
                Value::String(s) => ActionParameter::Reason(s.clone()),
                _ => {
                    return Err(ParameterError::InvalidValue {
                        key: key.to_string(),
                        expected: "text",
                    })
                }
            },
            _ => {
                return Err(ParameterError::UnknownKey {
                    action_type,
                    key: key.to_string(),
                })
            }
        };
        Ok(parameter)
    }
}

fn integer(key: &str, value: &Value, min: u64, max: u64) -> Result<u64, ParameterError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ParameterError::InvalidValue {
        key: key.to_string(),
        expected: "a non-negative integer",
    })?;
    if parsed < min || parsed > max {
        return Err(ParameterError::OutOfRange {
            key: key.to_string(),
            min,
            max,
        });
    }
    Ok(parsed)
}

fn small_integer(key: &str, value: &Value, min: u32) -> Result<u32, ParameterError> {
    integer(key, value, u64::from(min), u64::from(u32::MAX)).map(|n| n as u32)
}

fn choice<T>(key: &str, value: &Value, expected: &'static str) -> Result<T, ParameterError>
where
    T: std::str::FromStr,
{
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParameterError::InvalidValue {
            key: key.to_string(),
            expected,
        })
}

impl Action {
    /// An action of the given type with no parameters filled in.
    pub fn of_type(action_type: ActionType) -> Self {
        match action_type {
            ActionType::CreateUktBill => Action::CreateUktBill(Default::default()),
            ActionType::CreateSksBill => Action::CreateSksBill(Default::default()),
            ActionType::CreateRegistrationBill => Action::CreateRegistrationBill(Default::default()),
            ActionType::ApplyFixedDiscount => Action::ApplyFixedDiscount(Default::default()),
            ActionType::ApplyPercentageDiscount => Action::ApplyPercentageDiscount(Default::default()),
            ActionType::ExtendDueDate => Action::ExtendDueDate(Default::default()),
            ActionType::ApplyDiscount => Action::ApplyDiscount(Default::default()),
            ActionType::ConvertToInstallment => Action::ConvertToInstallment(Default::default()),
            ActionType::WaiveBill => Action::WaiveBill(Default::default()),
        }
    }

    /// `None` while no type has been chosen.
    pub fn action_type(&self) -> Option<ActionType> {
        match self {
            Action::Unset(_) => None,
            Action::CreateUktBill(_) => Some(ActionType::CreateUktBill),
            Action::CreateSksBill(_) => Some(ActionType::CreateSksBill),
            Action::CreateRegistrationBill(_) => Some(ActionType::CreateRegistrationBill),
            Action::ApplyFixedDiscount(_) => Some(ActionType::ApplyFixedDiscount),
            Action::ApplyPercentageDiscount(_) => Some(ActionType::ApplyPercentageDiscount),
            Action::ExtendDueDate(_) => Some(ActionType::ExtendDueDate),
            Action::ApplyDiscount(_) => Some(ActionType::ApplyDiscount),
            Action::ConvertToInstallment(_) => Some(ActionType::ConvertToInstallment),
            Action::WaiveBill(_) => Some(ActionType::WaiveBill),
        }
    }

    /// Store `parameter` if the current action type has a slot for it.
    /// Returns `false` (leaving the action untouched) otherwise.
    pub fn apply(&mut self, parameter: ActionParameter) -> bool {
        use ActionParameter as P;
        match (self, parameter) {
            (Action::CreateUktBill(p) | Action::CreateRegistrationBill(p), P::Amount(v)) => {
                p.amount = Some(v)
            }
            (Action::CreateUktBill(p) | Action::CreateRegistrationBill(p), P::DueDays(v)) => {
                p.due_days = Some(v)
            }
            (Action::CreateSksBill(p), P::PricePerSks(v)) => p.price_per_sks = Some(v),
            (Action::CreateSksBill(p), P::DueDays(v)) => p.due_days = Some(v),
            (Action::ApplyFixedDiscount(p), P::Amount(v)) => p.amount = Some(v),
            (Action::ApplyPercentageDiscount(p), P::Percentage(v)) => p.percentage = Some(v),
            (Action::ExtendDueDate(p), P::ExtensionDuration(v)) => p.extension_duration = Some(v),
            (Action::ExtendDueDate(p), P::ExtensionUnit(v)) => p.extension_unit = Some(v),
            (Action::ApplyDiscount(p), P::DiscountType(v)) => p.discount_type = Some(v),
            (Action::ApplyDiscount(p), P::DiscountValue(v)) => p.discount_value = Some(v),
            (Action::ConvertToInstallment(p), P::InstallmentCount(v)) => {
                p.installment_count = Some(v)
            }
            (Action::ConvertToInstallment(p), P::InstallmentInterval(v)) => {
                p.installment_interval = Some(v)
            }
            (Action::WaiveBill(p), P::Reason(v)) => p.reason = Some(v),
            _ => return false,
        }
        true
    }

    /// The parameters that have been filled in, keyed by wire name.
    pub fn parameters(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut object)) => match object.remove("parameters") {
                Some(Value::Object(parameters)) => parameters,
                _ => Map::new(),
            },
            _ => Map::new(),
        }
    }
}

/// A saved, reusable rule snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub rule: Rule,
}
