//! Read-side projections over charges.
//!
//! Nothing here mutates. The pending list drives collection follow-up
//! and the period summary backs the dashboard header. Both are computed
//! from the charge records on every read; there is no cached aggregate
//! to drift.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use gymbook_shared::{
    days_overdue, Charge, GymStore, MemberStatus, Period, PeriodProcessingRecord,
};

use crate::error::{BillingError, BillingResult};
use crate::ledger::MemberPeriodLedger;

/// One member owing money for the queried period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMemberRow {
    pub member_id: Uuid,
    pub member_name: String,
    pub member_status: MemberStatus,
    pub pending_charges: Vec<Charge>,
    pub total_outstanding_cents: i64,
    /// Days past the due date, zero while still inside the grace window.
    pub days_overdue: i64,
    pub is_overdue: bool,
}

/// Aggregate totals for one period of one gym.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub gym_id: Uuid,
    pub period: Period,
    pub charge_count: u32,
    pub pending_count: u32,
    pub paid_count: u32,
    pub total_due_cents: i64,
    pub total_paid_cents: i64,
    pub total_outstanding_cents: i64,
    pub activities: Vec<ActivityBreakdown>,
    pub processing_record: Option<PeriodProcessingRecord>,
}

/// Charge totals grouped by activity, largest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityBreakdown {
    pub activity_id: Uuid,
    pub activity_name: String,
    pub charge_count: u32,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
}

#[derive(Clone)]
pub struct OutstandingService {
    store: Arc<dyn GymStore>,
}

impl OutstandingService {
    pub fn new(store: Arc<dyn GymStore>) -> Self {
        Self { store }
    }

    /// Members with pending charges in the period, most overdue first.
    pub async fn list_pending(
        &self,
        gym_id: Uuid,
        period: Period,
    ) -> BillingResult<Vec<PendingMemberRow>> {
        self.list_pending_on(gym_id, period, OffsetDateTime::now_utc().date())
            .await
    }

    /// Same as [`list_pending`](Self::list_pending) with an explicit
    /// reference date.
    pub async fn list_pending_on(
        &self,
        gym_id: Uuid,
        period: Period,
        today: Date,
    ) -> BillingResult<Vec<PendingMemberRow>> {
        let charges = self.store.list_period_charges(gym_id, period).await?;
        let members = self.store.list_members(gym_id).await?;

        let mut by_member: BTreeMap<Uuid, Vec<Charge>> = BTreeMap::new();
        for charge in charges {
            if charge.is_pending() {
                by_member.entry(charge.member_id).or_default().push(charge);
            }
        }

        let mut rows = Vec::with_capacity(by_member.len());
        for member in members {
            let Some(pending) = by_member.remove(&member.id) else {
                continue;
            };
            let ledger = MemberPeriodLedger::from_charges(member.id, period, &pending);
            let days = pending
                .iter()
                .map(|c| days_overdue(c.due_date, today))
                .max()
                .unwrap_or(0);
            rows.push(PendingMemberRow {
                member_id: member.id,
                member_name: member.name,
                member_status: member.status,
                pending_charges: pending,
                total_outstanding_cents: ledger.total_outstanding_cents,
                days_overdue: days,
                is_overdue: days > 0,
            });
        }

        // A pending charge without a member row is a store inconsistency,
        // not something to hide from the caller.
        if let Some((member_id, _)) = by_member.into_iter().next() {
            return Err(BillingError::not_found("member", member_id));
        }

        rows.sort_by(|a, b| {
            b.days_overdue
                .cmp(&a.days_overdue)
                .then(b.total_outstanding_cents.cmp(&a.total_outstanding_cents))
                .then(a.member_name.cmp(&b.member_name))
        });
        Ok(rows)
    }

    /// Aggregate totals plus a per-activity breakdown for one period.
    pub async fn period_summary(
        &self,
        gym_id: Uuid,
        period: Period,
    ) -> BillingResult<PeriodSummary> {
        let charges = self.store.list_period_charges(gym_id, period).await?;
        let processing_record = self.store.processing_record(gym_id, period).await?;

        let mut pending_count = 0u32;
        let mut total_due_cents = 0i64;
        let mut total_paid_cents = 0i64;
        let mut by_activity: BTreeMap<(String, Uuid), ActivityBreakdown> = BTreeMap::new();

        for charge in &charges {
            total_due_cents += charge.amount_cents;
            if charge.is_pending() {
                pending_count += 1;
            } else {
                total_paid_cents += charge.amount_cents;
            }

            let entry = by_activity
                .entry((charge.activity_name.clone(), charge.activity_id))
                .or_insert_with(|| ActivityBreakdown {
                    activity_id: charge.activity_id,
                    activity_name: charge.activity_name.clone(),
                    charge_count: 0,
                    total_cents: 0,
                    paid_cents: 0,
                    outstanding_cents: 0,
                });
            entry.charge_count += 1;
            entry.total_cents += charge.amount_cents;
            if charge.is_pending() {
                entry.outstanding_cents += charge.amount_cents;
            } else {
                entry.paid_cents += charge.amount_cents;
            }
        }

        let mut activities: Vec<ActivityBreakdown> = by_activity.into_values().collect();
        activities.sort_by(|a, b| {
            b.total_cents
                .cmp(&a.total_cents)
                .then(a.activity_name.cmp(&b.activity_name))
        });

        let charge_count = charges.len() as u32;
        Ok(PeriodSummary {
            gym_id,
            period,
            charge_count,
            pending_count,
            paid_count: charge_count - pending_count,
            total_due_cents,
            total_paid_cents,
            total_outstanding_cents: total_due_cents - total_paid_cents,
            activities,
            processing_record,
        })
    }
}
