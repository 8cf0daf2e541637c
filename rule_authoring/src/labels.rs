//! Display labels for the admin rule builder.
//!
//! The catalogs in [`crate::catalog`] only know their wire names; the
//! (Indonesian) strings shown in dropdowns are kept in this lookup
//! table so the two can change independently.

use crate::catalog::{ActionType, DiscountType, DurationUnit, Fact, Logic, Operator, RuleKind};

/// A human readable label for a catalog entry.
pub trait Label {
    fn label(&self) -> &'static str;
}

impl Label for RuleKind {
    fn label(&self) -> &'static str {
        match self {
            RuleKind::Tariff => "Tarif",
            RuleKind::Dispensation => "Dispensasi",
        }
    }
}

impl Label for Fact {
    fn label(&self) -> &'static str {
        match self {
            Fact::StudentGpa => "IPK Mahasiswa",
            Fact::StudentBatch => "Angkatan",
            Fact::StudentSemester => "Semester",
            Fact::StudentProgram => "Program Studi",
            Fact::StudentFaculty => "Fakultas",
            Fact::StudentStatus => "Status Mahasiswa",
            Fact::BillAmount => "Jumlah Tagihan",
            Fact::BillType => "Jenis Tagihan",
            Fact::BillDaysOverdue => "Hari Keterlambatan",
        }
    }
}

impl Label for Operator {
    fn label(&self) -> &'static str {
        match self {
            Operator::Eq => "sama dengan",
            Operator::Ne => "tidak sama dengan",
            Operator::Gt => "lebih dari",
            Operator::Lt => "kurang dari",
            Operator::Ge => "lebih dari atau sama dengan",
            Operator::Le => "kurang dari atau sama dengan",
            Operator::Contains => "mengandung",
            Operator::In => "termasuk dalam",
        }
    }
}

impl Label for Logic {
    fn label(&self) -> &'static str {
        match self {
            Logic::And => "DAN",
            Logic::Or => "ATAU",
        }
    }
}

impl Label for ActionType {
    fn label(&self) -> &'static str {
        match self {
            ActionType::CreateUktBill => "Buat Tagihan UKT",
            ActionType::CreateSksBill => "Buat Tagihan SKS",
            ActionType::CreateRegistrationBill => "Buat Tagihan Registrasi",
            ActionType::ApplyFixedDiscount => "Potongan Nominal Tetap",
            ActionType::ApplyPercentageDiscount => "Potongan Persentase",
            ActionType::ExtendDueDate => "Perpanjang Jatuh Tempo",
            ActionType::ApplyDiscount => "Berikan Potongan",
            ActionType::ConvertToInstallment => "Ubah ke Cicilan",
            ActionType::WaiveBill => "Bebaskan Tagihan",
        }
    }
}

impl Label for DurationUnit {
    fn label(&self) -> &'static str {
        match self {
            DurationUnit::Days => "Hari",
            DurationUnit::Weeks => "Minggu",
            DurationUnit::Months => "Bulan",
        }
    }
}

impl Label for DiscountType {
    fn label(&self) -> &'static str {
        match self {
            DiscountType::Fixed => "Nominal",
            DiscountType::Percentage => "Persentase",
        }
    }
}

/// Label for an action parameter key, falling back to the key itself.
pub fn parameter_label(key: &str) -> &str {
    match key {
        "amount" => "Nominal (Rp)",
        "dueDays" => "Jatuh Tempo (hari)",
        "pricePerSks" => "Harga per SKS (Rp)",
        "percentage" => "Persentase (%)",
        "extensionDuration" => "Durasi Perpanjangan",
        "extensionUnit" => "Satuan Durasi",
        "discountType" => "Jenis Potongan",
        "discountValue" => "Nilai Potongan",
        "installmentCount" => "Jumlah Cicilan",
        "installmentInterval" => "Interval Cicilan",
        "reason" => "Alasan",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_labels() {
        assert_eq!(RuleKind::Dispensation.label(), "Dispensasi");
        assert_eq!(Fact::BillDaysOverdue.label(), "Hari Keterlambatan");
        assert_eq!(Operator::In.label(), "termasuk dalam");
        assert_eq!(Logic::Or.label(), "ATAU");
        assert_eq!(ActionType::ConvertToInstallment.label(), "Ubah ke Cicilan");
        assert_eq!(DurationUnit::Weeks.label(), "Minggu");
        assert_eq!(DiscountType::Percentage.label(), "Persentase");
    }

    #[test]
    fn test_every_parameter_key_has_a_label() {
        for action_type in ActionType::ALL {
            for key in action_type.parameter_keys() {
                assert_ne!(parameter_label(key), *key, "missing label for {key}");
            }
        }
        assert_eq!(parameter_label("unknown"), "unknown");
    }
}
