//! Charge settlement.
//!
//! Settlement is the only legal charge transition: Pending to Paid, once.
//! The store performs the flip as a compare-and-set, so two sessions
//! settling the same charge resolve to exactly one winner. The member
//! debt counter is decremented by the same amount the creation path
//! added, keeping debt equal to the sum of pending charges.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use gymbook_shared::{
    Charge, ChargeKey, GymStore, PaidTransition, PaymentMethod, Period,
};

use crate::error::{BillingError, BillingResult};
use crate::events::BillingEventLogger;
use crate::ledger;

/// Which of the member's charges to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleTarget {
    /// The charge of one membership.
    Membership(Uuid),
    /// Every pending charge of the member in the period.
    AllOutstanding,
}

/// Receipt returned after a successful settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub gym_id: Uuid,
    pub member_id: Uuid,
    pub period: Period,
    pub settled_count: u32,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub charges: Vec<Charge>,
    /// Pending total still owed for the period after this settlement.
    pub outstanding_after_cents: i64,
    /// Member debt counter after this settlement, across all periods.
    pub member_debt_after_cents: i64,
}

#[derive(Clone)]
pub struct SettlementService {
    store: Arc<dyn GymStore>,
    events: BillingEventLogger,
}

impl SettlementService {
    pub fn new(store: Arc<dyn GymStore>, events: BillingEventLogger) -> Self {
        Self { store, events }
    }

    /// Settle charges of a member for a period.
    ///
    /// Settling a charge that is already Paid fails with
    /// [`BillingError::AlreadyPaid`]; nothing is written. In the
    /// all-outstanding form a charge that flips Paid under our feet is
    /// skipped, since the winning session already recorded it.
    pub async fn settle(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        period: Period,
        target: SettleTarget,
        payment_method: PaymentMethod,
        operator_id: Option<&str>,
    ) -> BillingResult<SettlementReceipt> {
        let member = self
            .store
            .get_member(gym_id, member_id)
            .await?
            .ok_or_else(|| BillingError::not_found("member", member_id))?;

        let targets = self
            .resolve_targets(gym_id, member_id, period, target)
            .await?;

        let mut settled = Vec::new();
        let mut amount_cents = 0i64;
        let mut debt_after = member.total_debt_cents;
        for charge in &targets {
            match self
                .mark_paid(charge.key(), payment_method, operator_id)
                .await?
            {
                Some(paid) => {
                    debt_after = self
                        .store
                        .adjust_member_debt(gym_id, member_id, -paid.amount_cents)
                        .await?;
                    amount_cents += paid.amount_cents;
                    settled.push(paid);
                }
                None => match target {
                    SettleTarget::Membership(_) => {
                        return Err(BillingError::AlreadyPaid {
                            charge_id: charge.id,
                        });
                    }
                    SettleTarget::AllOutstanding => {
                        warn!(
                            gym_id = %gym_id,
                            charge_id = %charge.id,
                            "Charge settled by another session mid-batch; skipping"
                        );
                    }
                },
            }
        }

        if settled.is_empty() {
            // Every target flipped Paid between listing and settling.
            return Err(BillingError::AlreadyPaid {
                charge_id: targets.first().map(|c| c.id).unwrap_or_default(),
            });
        }

        let remaining = self
            .store
            .list_member_period_charges(gym_id, period, member_id)
            .await?;
        let outstanding_after_cents = ledger::pending_total_cents(&remaining);

        info!(
            gym_id = %gym_id,
            member_id = %member_id,
            period = %period,
            settled_count = settled.len(),
            amount_cents,
            payment_method = %payment_method,
            "Charges settled"
        );

        Ok(SettlementReceipt {
            gym_id,
            member_id,
            period,
            settled_count: settled.len() as u32,
            amount_cents,
            payment_method,
            charges: settled,
            outstanding_after_cents,
            member_debt_after_cents: debt_after,
        })
    }

    /// Resolve the target selector into concrete pending charges.
    async fn resolve_targets(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        period: Period,
        target: SettleTarget,
    ) -> BillingResult<Vec<Charge>> {
        match target {
            SettleTarget::Membership(membership_id) => {
                let key = ChargeKey {
                    gym_id,
                    period,
                    member_id,
                    membership_id,
                };
                let charge = self
                    .store
                    .get_charge(&key)
                    .await?
                    .ok_or_else(|| BillingError::not_found("charge", membership_id))?;
                if !charge.is_pending() {
                    return Err(BillingError::AlreadyPaid {
                        charge_id: charge.id,
                    });
                }
                Ok(vec![charge])
            }
            SettleTarget::AllOutstanding => {
                let charges = self
                    .store
                    .list_member_period_charges(gym_id, period, member_id)
                    .await?;
                if charges.is_empty() {
                    return Err(BillingError::NotFound {
                        what: "charge",
                        id: format!("{member_id} in {period}"),
                    });
                }
                let pending: Vec<Charge> =
                    charges.iter().filter(|c| c.is_pending()).cloned().collect();
                if pending.is_empty() {
                    return Err(BillingError::AlreadyPaid {
                        charge_id: charges.first().map(|c| c.id).unwrap_or_default(),
                    });
                }
                Ok(pending)
            }
        }
    }

    /// Flip one charge Pending to Paid. `None` means another session won
    /// the compare-and-set.
    async fn mark_paid(
        &self,
        key: ChargeKey,
        payment_method: PaymentMethod,
        operator_id: Option<&str>,
    ) -> BillingResult<Option<Charge>> {
        let paid_date = OffsetDateTime::now_utc().date();
        match self
            .store
            .mark_charge_paid(&key, paid_date, payment_method)
            .await?
        {
            PaidTransition::Updated(charge) => {
                self.events.log_charge_settled(&charge, operator_id).await;
                Ok(Some(charge))
            }
            PaidTransition::AlreadyPaid(_) => Ok(None),
            PaidTransition::Missing => Err(BillingError::ConcurrencyConflict(format!(
                "charge for membership {} vanished during settlement",
                key.membership_id
            ))),
        }
    }
}
