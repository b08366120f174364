//! Billing consistency checks.
//!
//! Runnable invariant checks over one gym's billing data, intended for
//! the weekly audit job and for operator-triggered inspection after a
//! suspicious run. Checks only read; the one write path is the explicit
//! debt repair, which realigns the member debt counter with the pending
//! charges that define it.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use gymbook_shared::{Charge, GymStore};

use crate::error::BillingResult;
use crate::events::BillingEventLogger;
use crate::ledger;

/// Result of running a single consistency check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyViolation {
    /// Which check was violated
    pub check: String,
    /// Member(s) affected, when attributable
    pub member_ids: Vec<Uuid>,
    /// Human-readable description of the violation
    pub description: String,
    /// Additional context for debugging
    pub context: serde_json::Value,
    /// Severity level
    pub severity: ViolationSeverity,
}

/// Severity of a consistency violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationSeverity {
    /// Critical - members may be charged or dunned incorrectly
    Critical,
    /// High - data inconsistency that needs attention
    High,
    /// Medium - potential issue, should investigate
    Medium,
    /// Low - minor inconsistency, informational
    Low,
}

impl std::fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationSeverity::Critical => write!(f, "CRITICAL"),
            ViolationSeverity::High => write!(f, "HIGH"),
            ViolationSeverity::Medium => write!(f, "MEDIUM"),
            ViolationSeverity::Low => write!(f, "LOW"),
        }
    }
}

/// Summary of all consistency checks for one gym
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub gym_id: Uuid,
    /// When the check was run
    #[serde(with = "time::serde::rfc3339")]
    pub checked_at: OffsetDateTime,
    /// Total number of checks run
    pub checks_run: usize,
    /// Number of checks that passed
    pub checks_passed: usize,
    /// Number of checks that failed
    pub checks_failed: usize,
    /// List of all violations found
    pub violations: Vec<ConsistencyViolation>,
    /// Overall health status
    pub healthy: bool,
}

/// One member whose debt counter drifted from the pending-charge sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtRepair {
    pub member_id: Uuid,
    pub recorded_cents: i64,
    pub expected_cents: i64,
    pub delta_cents: i64,
}

/// Outcome of an applied debt repair run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub gym_id: Uuid,
    pub repaired: Vec<DebtRepair>,
}

/// Service for running billing consistency checks
#[derive(Clone)]
pub struct ConsistencyChecker {
    store: Arc<dyn GymStore>,
    events: BillingEventLogger,
}

impl ConsistencyChecker {
    pub fn new(store: Arc<dyn GymStore>, events: BillingEventLogger) -> Self {
        Self { store, events }
    }

    /// Run all consistency checks for one gym and return the summary
    pub async fn run_all_checks(&self, gym_id: Uuid) -> BillingResult<ConsistencyReport> {
        let now = OffsetDateTime::now_utc();
        let mut violations = Vec::new();

        violations.extend(self.check_debt_matches_pending_charges(gym_id).await?);
        violations.extend(self.check_paid_state_consistent(gym_id).await?);
        violations.extend(self.check_charge_amounts_positive(gym_id).await?);
        violations.extend(self.check_membership_references_valid(gym_id).await?);

        let checks_run = 4;
        let checks_failed = violations
            .iter()
            .map(|v| &v.check)
            .collect::<HashSet<_>>()
            .len();
        let checks_passed = checks_run - checks_failed;

        if !violations.is_empty() {
            warn!(
                gym_id = %gym_id,
                violation_count = violations.len(),
                "Consistency check found violations"
            );
        }

        Ok(ConsistencyReport {
            gym_id,
            checked_at: now,
            checks_run,
            checks_passed,
            checks_failed,
            healthy: violations.is_empty(),
            violations,
        })
    }

    /// Check 1: member debt equals the sum of pending charges
    ///
    /// The debt counter is maintained by increments at creation and
    /// decrements at settlement; any drift means one side was lost.
    async fn check_debt_matches_pending_charges(
        &self,
        gym_id: Uuid,
    ) -> BillingResult<Vec<ConsistencyViolation>> {
        Ok(self
            .plan_debt_repair(gym_id)
            .await?
            .into_iter()
            .map(|drift| ConsistencyViolation {
                check: "debt_matches_pending_charges".to_string(),
                member_ids: vec![drift.member_id],
                description: format!(
                    "Member debt counter is {} cents but pending charges sum to {} cents",
                    drift.recorded_cents, drift.expected_cents
                ),
                context: serde_json::json!({
                    "recorded_cents": drift.recorded_cents,
                    "expected_cents": drift.expected_cents,
                    "delta_cents": drift.delta_cents,
                }),
                severity: ViolationSeverity::Critical,
            })
            .collect())
    }

    /// Check 2: paid fields agree with charge status
    ///
    /// A Paid charge must carry a paid date and payment method; a
    /// Pending charge must carry neither.
    async fn check_paid_state_consistent(
        &self,
        gym_id: Uuid,
    ) -> BillingResult<Vec<ConsistencyViolation>> {
        let charges = self.store.list_charges(gym_id).await?;

        Ok(charges
            .iter()
            .filter(|charge| {
                if charge.is_pending() {
                    charge.paid_date.is_some() || charge.payment_method.is_some()
                } else {
                    charge.paid_date.is_none() || charge.payment_method.is_none()
                }
            })
            .map(|charge| ConsistencyViolation {
                check: "paid_state_consistent".to_string(),
                member_ids: vec![charge.member_id],
                description: format!(
                    "Charge {} is {} but its paid fields disagree",
                    charge.id, charge.status
                ),
                context: charge_context(charge),
                severity: ViolationSeverity::High,
            })
            .collect())
    }

    /// Check 3: every charge carries a positive amount
    async fn check_charge_amounts_positive(
        &self,
        gym_id: Uuid,
    ) -> BillingResult<Vec<ConsistencyViolation>> {
        let charges = self.store.list_charges(gym_id).await?;

        Ok(charges
            .iter()
            .filter(|charge| charge.amount_cents <= 0)
            .map(|charge| ConsistencyViolation {
                check: "charge_amounts_positive".to_string(),
                member_ids: vec![charge.member_id],
                description: format!(
                    "Charge {} has non-positive amount {} cents",
                    charge.id, charge.amount_cents
                ),
                context: charge_context(charge),
                severity: ViolationSeverity::Medium,
            })
            .collect())
    }

    /// Check 4: charges reference an existing member and membership
    async fn check_membership_references_valid(
        &self,
        gym_id: Uuid,
    ) -> BillingResult<Vec<ConsistencyViolation>> {
        let charges = self.store.list_charges(gym_id).await?;
        let members: HashSet<Uuid> = self
            .store
            .list_members(gym_id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let mut violations = Vec::new();
        for charge in &charges {
            if !members.contains(&charge.member_id) {
                violations.push(ConsistencyViolation {
                    check: "membership_references_valid".to_string(),
                    member_ids: vec![charge.member_id],
                    description: format!(
                        "Charge {} references missing member {}",
                        charge.id, charge.member_id
                    ),
                    context: charge_context(charge),
                    severity: ViolationSeverity::Medium,
                });
                continue;
            }
            let membership = self
                .store
                .get_membership(gym_id, charge.member_id, charge.membership_id)
                .await?;
            if membership.is_none() {
                violations.push(ConsistencyViolation {
                    check: "membership_references_valid".to_string(),
                    member_ids: vec![charge.member_id],
                    description: format!(
                        "Charge {} references missing membership {}",
                        charge.id, charge.membership_id
                    ),
                    context: charge_context(charge),
                    severity: ViolationSeverity::Medium,
                });
            }
        }
        Ok(violations)
    }

    /// Members whose debt counter disagrees with their pending charges.
    /// Read-only; pair with [`apply_debt_repair`](Self::apply_debt_repair).
    pub async fn plan_debt_repair(&self, gym_id: Uuid) -> BillingResult<Vec<DebtRepair>> {
        let members = self.store.list_members(gym_id).await?;

        let mut drifts = Vec::new();
        for member in members {
            let charges = self.store.list_member_charges(gym_id, member.id).await?;
            let expected_cents = ledger::pending_total_cents(&charges);
            if expected_cents != member.total_debt_cents {
                drifts.push(DebtRepair {
                    member_id: member.id,
                    recorded_cents: member.total_debt_cents,
                    expected_cents,
                    delta_cents: expected_cents - member.total_debt_cents,
                });
            }
        }
        Ok(drifts)
    }

    /// Realign drifted debt counters with their pending-charge sums.
    ///
    /// The correction is applied as an atomic delta adjustment, the same
    /// primitive generation and settlement use, so it composes with
    /// billing activity running at the same time.
    pub async fn apply_debt_repair(
        &self,
        gym_id: Uuid,
        operator_id: Option<&str>,
    ) -> BillingResult<RepairOutcome> {
        let drifts = self.plan_debt_repair(gym_id).await?;

        for drift in &drifts {
            self.store
                .adjust_member_debt(gym_id, drift.member_id, drift.delta_cents)
                .await?;
            self.events
                .log_debt_repaired(
                    gym_id,
                    drift.member_id,
                    drift.recorded_cents,
                    drift.expected_cents,
                    operator_id,
                )
                .await;
            info!(
                gym_id = %gym_id,
                member_id = %drift.member_id,
                recorded_cents = drift.recorded_cents,
                expected_cents = drift.expected_cents,
                "Repaired drifted debt counter"
            );
        }

        Ok(RepairOutcome {
            gym_id,
            repaired: drifts,
        })
    }

    /// Run a single consistency check by name
    pub async fn run_check(
        &self,
        gym_id: Uuid,
        name: &str,
    ) -> BillingResult<Vec<ConsistencyViolation>> {
        match name {
            "debt_matches_pending_charges" => {
                self.check_debt_matches_pending_charges(gym_id).await
            }
            "paid_state_consistent" => self.check_paid_state_consistent(gym_id).await,
            "charge_amounts_positive" => self.check_charge_amounts_positive(gym_id).await,
            "membership_references_valid" => {
                self.check_membership_references_valid(gym_id).await
            }
            _ => Ok(vec![]),
        }
    }

    /// Get list of all available consistency checks
    pub fn available_checks() -> Vec<&'static str> {
        vec![
            "debt_matches_pending_charges",
            "paid_state_consistent",
            "charge_amounts_positive",
            "membership_references_valid",
        ]
    }
}

fn charge_context(charge: &Charge) -> serde_json::Value {
    serde_json::json!({
        "charge_id": charge.id,
        "period": charge.period.to_string(),
        "membership_id": charge.membership_id,
        "amount_cents": charge.amount_cents,
        "status": charge.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_severity_display() {
        assert_eq!(ViolationSeverity::Critical.to_string(), "CRITICAL");
        assert_eq!(ViolationSeverity::High.to_string(), "HIGH");
        assert_eq!(ViolationSeverity::Medium.to_string(), "MEDIUM");
        assert_eq!(ViolationSeverity::Low.to_string(), "LOW");
    }

    #[test]
    fn available_checks_are_stable() {
        let checks = ConsistencyChecker::available_checks();
        assert_eq!(checks.len(), 4);
        assert!(checks.contains(&"debt_matches_pending_charges"));
        assert!(checks.contains(&"paid_state_consistent"));
    }
}
