//! Closed catalogs consumed by the rule builder.
//!
//! Facts, operators, action types and the small enumerations used by
//! action parameters are all fixed sets.  Each enum serialises to the
//! wire string used by the admin front-end (`"student.gpa"`, `">="`,
//! `"create_ukt_bill"`) and parses back from it via [`FromStr`].
//! UI-facing labels live in [`crate::labels`], not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a wire string does not name a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown rule kind: {0}")]
    UnknownRuleKind(String),
    #[error("unknown fact: {0}")]
    UnknownFact(String),
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
    #[error("unknown logic operator: {0}")]
    UnknownLogic(String),
    #[error("unknown action type: {0}")]
    UnknownActionType(String),
    #[error("unknown duration unit: {0}")]
    UnknownDurationUnit(String),
    #[error("unknown discount type: {0}")]
    UnknownDiscountType(String),
}

/// Implements `as_str`, `Display` and `FromStr` for a catalog enum from
/// its `ALL` table and wire-name mapping.
macro_rules! wire_enum {
    ($ty:ident, $err:ident, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// The wire string for this entry.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|entry| entry.as_str() == s)
                    .ok_or_else(|| CatalogError::$err(s.to_string()))
            }
        }
    };
}

/// Which family of payment rule is being authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Billing rules that create bills or apply standing discounts.
    Tariff,
    /// Waiver rules that relax an existing bill.
    Dispensation,
}

wire_enum!(RuleKind, UnknownRuleKind, {
    Tariff => "tariff",
    Dispensation => "dispensation",
});

impl RuleKind {
    /// The action types a rule of this kind may use.
    pub fn action_types(&self) -> &'static [ActionType] {
        match self {
            RuleKind::Tariff => &[
                ActionType::CreateUktBill,
                ActionType::CreateSksBill,
                ActionType::CreateRegistrationBill,
                ActionType::ApplyFixedDiscount,
                ActionType::ApplyPercentageDiscount,
            ],
            RuleKind::Dispensation => &[
                ActionType::ExtendDueDate,
                ActionType::ApplyDiscount,
                ActionType::ConvertToInstallment,
                ActionType::WaiveBill,
            ],
        }
    }

    pub fn allows(&self, action_type: ActionType) -> bool {
        action_type.kind() == *self
    }
}

/// How a fact's operand should be read.  Condition values are stored as
/// free text either way; this is metadata for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactValueKind {
    Number,
    Text,
}

/// A field on student or bill data that a condition can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fact {
    #[serde(rename = "student.gpa")]
    StudentGpa,
    #[serde(rename = "student.batch")]
    StudentBatch,
    #[serde(rename = "student.semester")]
    StudentSemester,
    #[serde(rename = "student.program")]
    StudentProgram,
    #[serde(rename = "student.faculty")]
    StudentFaculty,
    #[serde(rename = "student.status")]
    StudentStatus,
    #[serde(rename = "bill.amount")]
    BillAmount,
    #[serde(rename = "bill.type")]
    BillType,
    #[serde(rename = "bill.days_overdue")]
    BillDaysOverdue,
}

wire_enum!(Fact, UnknownFact, {
    StudentGpa => "student.gpa",
    StudentBatch => "student.batch",
    StudentSemester => "student.semester",
    StudentProgram => "student.program",
    StudentFaculty => "student.faculty",
    StudentStatus => "student.status",
    BillAmount => "bill.amount",
    BillType => "bill.type",
    BillDaysOverdue => "bill.days_overdue",
});

impl Fact {
    pub fn value_kind(&self) -> FactValueKind {
        match self {
            Fact::StudentGpa
            | Fact::StudentBatch
            | Fact::StudentSemester
            | Fact::BillAmount
            | Fact::BillDaysOverdue => FactValueKind::Number,
            Fact::StudentProgram | Fact::StudentFaculty | Fact::StudentStatus | Fact::BillType => {
                FactValueKind::Text
            }
        }
    }
}

/// Comparison applied between a fact and a condition's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "in")]
    In,
}

wire_enum!(Operator, UnknownOperator, {
    Eq => "=",
    Ne => "!=",
    Gt => ">",
    Lt => "<",
    Ge => ">=",
    Le => "<=",
    Contains => "contains",
    In => "in",
});

/// Boolean operator shared by every condition of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    #[default]
    And,
    Or,
}

wire_enum!(Logic, UnknownLogic, {
    And => "AND",
    Or => "OR",
});

/// Every action a rule can trigger, across both rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CreateUktBill,
    CreateSksBill,
    CreateRegistrationBill,
    ApplyFixedDiscount,
    ApplyPercentageDiscount,
    ExtendDueDate,
    ApplyDiscount,
    ConvertToInstallment,
    WaiveBill,
}

wire_enum!(ActionType, UnknownActionType, {
    CreateUktBill => "create_ukt_bill",
    CreateSksBill => "create_sks_bill",
    CreateRegistrationBill => "create_registration_bill",
    ApplyFixedDiscount => "apply_fixed_discount",
    ApplyPercentageDiscount => "apply_percentage_discount",
    ExtendDueDate => "extend_due_date",
    ApplyDiscount => "apply_discount",
    ConvertToInstallment => "convert_to_installment",
    WaiveBill => "waive_bill",
});

impl ActionType {
    /// The rule kind this action type belongs to.
    pub fn kind(&self) -> RuleKind {
        match self {
            ActionType::CreateUktBill
            | ActionType::CreateSksBill
            | ActionType::CreateRegistrationBill
            | ActionType::ApplyFixedDiscount
            | ActionType::ApplyPercentageDiscount => RuleKind::Tariff,
            ActionType::ExtendDueDate
            | ActionType::ApplyDiscount
            | ActionType::ConvertToInstallment
            | ActionType::WaiveBill => RuleKind::Dispensation,
        }
    }

    /// Parameter keys accepted by this action type, in form order.
    pub fn parameter_keys(&self) -> &'static [&'static str] {
        match self {
            ActionType::CreateUktBill | ActionType::CreateRegistrationBill => &["amount", "dueDays"],
            ActionType::CreateSksBill => &["pricePerSks", "dueDays"],
            ActionType::ApplyFixedDiscount => &["amount"],
            ActionType::ApplyPercentageDiscount => &["percentage"],
            ActionType::ExtendDueDate => &["extensionDuration", "extensionUnit"],
            ActionType::ApplyDiscount => &["discountType", "discountValue"],
            ActionType::ConvertToInstallment => &["installmentCount", "installmentInterval"],
            ActionType::WaiveBill => &["reason"],
        }
    }
}

/// Unit for due-date extensions and installment intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Days,
    Weeks,
    Months,
}

wire_enum!(DurationUnit, UnknownDurationUnit, {
    Days => "days",
    Weeks => "weeks",
    Months => "months",
});

/// Whether a dispensation discount is a fixed amount or a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Fixed,
    Percentage,
}

wire_enum!(DiscountType, UnknownDiscountType, {
    Fixed => "fixed",
    Percentage => "percentage",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_types_partition_by_kind() {
        for kind in RuleKind::ALL {
            for action_type in kind.action_types() {
                assert_eq!(action_type.kind(), *kind);
            }
        }
        let total: usize = RuleKind::ALL.iter().map(|k| k.action_types().len()).sum();
        assert_eq!(total, ActionType::ALL.len());
        assert!(RuleKind::Tariff.allows(ActionType::CreateUktBill));
        assert!(!RuleKind::Tariff.allows(ActionType::WaiveBill));
    }

    #[test]
    fn test_wire_strings_parse_back() {
        assert_eq!("student.gpa".parse::<Fact>(), Ok(Fact::StudentGpa));
        assert_eq!(">=".parse::<Operator>(), Ok(Operator::Ge));
        assert_eq!("OR".parse::<Logic>(), Ok(Logic::Or));
        assert_eq!(
            "extend_due_date".parse::<ActionType>(),
            Ok(ActionType::ExtendDueDate)
        );
        assert_eq!(
            "student.height".parse::<Fact>(),
            Err(CatalogError::UnknownFact("student.height".into()))
        );
        assert!("".parse::<Operator>().is_err());
    }

    #[test]
    fn test_serde_names_match_wire_strings() {
        for fact in Fact::ALL {
            let json = serde_json::to_string(fact).unwrap();
            assert_eq!(json, format!("\"{}\"", fact.as_str()));
        }
        for op in Operator::ALL {
            let json = serde_json::to_string(op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
        for action_type in ActionType::ALL {
            let json = serde_json::to_string(action_type).unwrap();
            assert_eq!(json, format!("\"{}\"", action_type.as_str()));
        }
    }

    #[test]
    fn test_fact_value_kinds() {
        assert_eq!(Fact::StudentGpa.value_kind(), FactValueKind::Number);
        assert_eq!(Fact::StudentProgram.value_kind(), FactValueKind::Text);
        assert_eq!(Fact::ALL.len(), 9);
    }
}
