//! Member period ledger.
//!
//! A read-side aggregation over one member's charges in one period. The
//! ledger is never stored; it is recomputed from the charge set whenever it
//! is needed, so `total_outstanding = total_due - total_paid` holds by
//! construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gymbook_shared::{Charge, ChargeStatus, Period};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberPeriodLedger {
    pub member_id: Uuid,
    pub period: Period,
    pub total_due_cents: i64,
    pub total_paid_cents: i64,
    pub total_outstanding_cents: i64,
}

impl MemberPeriodLedger {
    /// Aggregate the given charges, considering only those belonging to
    /// the member and period.
    pub fn from_charges(member_id: Uuid, period: Period, charges: &[Charge]) -> Self {
        let mut total_due_cents = 0;
        let mut total_paid_cents = 0;

        for charge in charges
            .iter()
            .filter(|c| c.member_id == member_id && c.period == period)
        {
            total_due_cents += charge.amount_cents;
            if charge.status == ChargeStatus::Paid {
                total_paid_cents += charge.amount_cents;
            }
        }

        Self {
            member_id,
            period,
            total_due_cents,
            total_paid_cents,
            total_outstanding_cents: total_due_cents - total_paid_cents,
        }
    }
}

/// Sum of pending charge amounts, the quantity the member debt counter
/// must track across all periods.
pub fn pending_total_cents(charges: &[Charge]) -> i64 {
    charges
        .iter()
        .filter(|c| c.is_pending())
        .map(|c| c.amount_cents)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymbook_shared::PaymentMethod;
    use time::macros::date;
    use time::OffsetDateTime;

    fn charge(
        member_id: Uuid,
        period: Period,
        amount_cents: i64,
        status: ChargeStatus,
    ) -> Charge {
        Charge {
            id: Uuid::new_v4(),
            gym_id: Uuid::new_v4(),
            period,
            member_id,
            membership_id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            activity_name: "CrossFit".to_string(),
            amount_cents,
            due_date: period.due_date(15),
            status,
            paid_date: (status == ChargeStatus::Paid).then(|| date!(2026 - 08 - 20)),
            payment_method: (status == ChargeStatus::Paid).then_some(PaymentMethod::Cash),
            created_by: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn outstanding_is_due_minus_paid() {
        let member_id = Uuid::new_v4();
        let period = Period::new(2026, 8).unwrap();
        let charges = vec![
            charge(member_id, period, 10_000, ChargeStatus::Pending),
            charge(member_id, period, 4_500, ChargeStatus::Paid),
            charge(member_id, period, 3_000, ChargeStatus::Pending),
        ];

        let ledger = MemberPeriodLedger::from_charges(member_id, period, &charges);
        assert_eq!(ledger.total_due_cents, 17_500);
        assert_eq!(ledger.total_paid_cents, 4_500);
        assert_eq!(ledger.total_outstanding_cents, 13_000);
    }

    #[test]
    fn ignores_other_members_and_periods() {
        let member_id = Uuid::new_v4();
        let period = Period::new(2026, 8).unwrap();
        let charges = vec![
            charge(member_id, period, 10_000, ChargeStatus::Pending),
            charge(Uuid::new_v4(), period, 7_000, ChargeStatus::Pending),
            charge(member_id, period.previous(), 6_000, ChargeStatus::Pending),
        ];

        let ledger = MemberPeriodLedger::from_charges(member_id, period, &charges);
        assert_eq!(ledger.total_due_cents, 10_000);
        assert_eq!(ledger.total_outstanding_cents, 10_000);
    }

    #[test]
    fn pending_total_spans_periods() {
        let member_id = Uuid::new_v4();
        let august = Period::new(2026, 8).unwrap();
        let charges = vec![
            charge(member_id, august, 10_000, ChargeStatus::Pending),
            charge(member_id, august.previous(), 6_000, ChargeStatus::Pending),
            charge(member_id, august, 4_500, ChargeStatus::Paid),
        ];

        assert_eq!(pending_total_cents(&charges), 16_000);
    }

    #[test]
    fn empty_charge_set_yields_zero_ledger() {
        let ledger =
            MemberPeriodLedger::from_charges(Uuid::new_v4(), Period::new(2026, 8).unwrap(), &[]);
        assert_eq!(ledger.total_due_cents, 0);
        assert_eq!(ledger.total_paid_cents, 0);
        assert_eq!(ledger.total_outstanding_cents, 0);
    }
}
