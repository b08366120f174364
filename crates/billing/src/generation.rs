//! Charge generation.
//!
//! Two entry points share one creation path:
//!
//! - `generate` sweeps every member of a gym for the target period,
//!   tolerating per-member failure, and seals the run with a
//!   [`PeriodProcessingRecord`].
//! - `generate_for_member` is the on-demand variant for one member. It
//!   bypasses the period guard and relies on charge-level duplicate
//!   detection, reporting a duplicate as a no-op rather than an error.
//!
//! Both paths create charges with the store's create-if-absent primitive
//! and adjust the member debt counter atomically per created charge, so
//! concurrent sessions cannot double-charge or lose debt updates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use gymbook_shared::{
    Charge, ChargeKey, ChargeStatus, GymStore, Member, Membership, Period,
    PeriodProcessingRecord,
};

use crate::eligibility;
use crate::error::{BillingError, BillingResult};
use crate::events::BillingEventLogger;
use crate::BillingConfig;

/// Reason reported when the charge identity key already exists.
pub const REASON_ALREADY_EXISTS: &str = "already-exists";
/// Reason reported when no membership of the member is eligible.
pub const REASON_NO_ELIGIBLE_MEMBERSHIP: &str = "no-eligible-membership";

/// Outcome of one period generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodGenerationReport {
    pub gym_id: Uuid,
    pub period: Period,
    /// Members examined.
    pub member_count: u32,
    /// Charges created.
    pub created_count: u32,
    /// Members skipped because their charges for the period already exist.
    pub skipped_count: u32,
    pub total_amount_cents: i64,
    pub errors: Vec<MemberGenerationError>,
}

impl PeriodGenerationReport {
    /// Job-level error wrapper for callers that must escalate per-member
    /// failures.
    pub fn as_partial_failure(&self) -> Option<BillingError> {
        (!self.errors.is_empty()).then(|| BillingError::PartialBatchFailure {
            period: self.period,
            member_count: self.member_count,
            error_count: self.errors.len() as u32,
        })
    }
}

/// One member that failed during a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberGenerationError {
    pub member_id: Uuid,
    pub message: String,
}

/// Outcome of a manual, single-member generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualGenerationOutcome {
    pub created: bool,
    pub reason: Option<String>,
    pub charges_created: u32,
    pub amount_cents: i64,
    pub period: Period,
}

enum MemberOutcome {
    Created { charges: u32, amount_cents: i64 },
    AlreadyCharged,
    NothingEligible,
}

#[derive(Clone)]
pub struct GenerationService {
    store: Arc<dyn GymStore>,
    events: BillingEventLogger,
    due_day: u8,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn GymStore>,
        config: &BillingConfig,
        events: BillingEventLogger,
    ) -> Self {
        Self {
            store,
            events,
            due_day: config.due_day,
        }
    }

    /// Generate charges for the current period.
    pub async fn generate(&self, gym_id: Uuid) -> BillingResult<PeriodGenerationReport> {
        self.generate_for_period(gym_id, Period::current()).await
    }

    /// Generate charges for an explicit period.
    ///
    /// Per-member failures are accumulated in the report and never abort
    /// the sweep. The run always completes and seals a processing record;
    /// when a record already exists the original is kept.
    pub async fn generate_for_period(
        &self,
        gym_id: Uuid,
        period: Period,
    ) -> BillingResult<PeriodGenerationReport> {
        self.store
            .get_gym(gym_id)
            .await?
            .ok_or_else(|| BillingError::not_found("gym", gym_id))?;

        info!(gym_id = %gym_id, period = %period, "Starting charge generation");

        let members = self.store.list_members(gym_id).await?;
        let member_count = members.len() as u32;

        let mut created_count = 0u32;
        let mut skipped_count = 0u32;
        let mut total_amount_cents = 0i64;
        let mut errors = Vec::new();

        for member in &members {
            match self.generate_member(gym_id, period, member).await {
                Ok(MemberOutcome::Created {
                    charges,
                    amount_cents,
                }) => {
                    created_count += charges;
                    total_amount_cents += amount_cents;
                }
                Ok(MemberOutcome::AlreadyCharged) => skipped_count += 1,
                Ok(MemberOutcome::NothingEligible) => {}
                Err(e) => {
                    error!(
                        gym_id = %gym_id,
                        member_id = %member.id,
                        error = %e,
                        "Member failed during charge generation"
                    );
                    errors.push(MemberGenerationError {
                        member_id: member.id,
                        message: e.to_string(),
                    });
                }
            }
        }

        let error_count = errors.len() as u32;
        let record = PeriodProcessingRecord {
            gym_id,
            period,
            processed_at: OffsetDateTime::now_utc(),
            member_count,
            created_count,
            total_amount_cents,
            error_count,
        };
        if !self.store.insert_processing_record_if_absent(record).await? {
            info!(
                gym_id = %gym_id,
                period = %period,
                "Processing record already present; keeping the original"
            );
        }

        self.events
            .log_generation_completed(
                gym_id,
                period,
                member_count,
                created_count,
                total_amount_cents,
                error_count,
            )
            .await;

        info!(
            gym_id = %gym_id,
            period = %period,
            member_count,
            created_count,
            skipped_count,
            error_count,
            "Charge generation complete"
        );

        Ok(PeriodGenerationReport {
            gym_id,
            period,
            member_count,
            created_count,
            skipped_count,
            total_amount_cents,
            errors,
        })
    }

    /// Manually generate the current period's charges for one member.
    pub async fn generate_for_member(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        operator_id: Option<&str>,
    ) -> BillingResult<ManualGenerationOutcome> {
        self.generate_for_member_in_period(gym_id, member_id, Period::current(), operator_id)
            .await
    }

    pub async fn generate_for_member_in_period(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        period: Period,
        operator_id: Option<&str>,
    ) -> BillingResult<ManualGenerationOutcome> {
        let member = self
            .store
            .get_member(gym_id, member_id)
            .await?
            .ok_or_else(|| BillingError::not_found("member", member_id))?;

        let memberships = self.store.list_memberships(gym_id, member_id).await?;
        let eligible = eligibility::eligible_memberships(&member, &memberships);
        if eligible.is_empty() {
            return Ok(ManualGenerationOutcome {
                created: false,
                reason: Some(REASON_NO_ELIGIBLE_MEMBERSHIP.to_string()),
                charges_created: 0,
                amount_cents: 0,
                period,
            });
        }

        match self
            .create_charges(gym_id, period, member_id, &eligible, operator_id)
            .await
        {
            Ok((charges_created, amount_cents)) => {
                info!(
                    gym_id = %gym_id,
                    member_id = %member_id,
                    period = %period,
                    charges_created,
                    "Manual charge generation complete"
                );
                Ok(ManualGenerationOutcome {
                    created: charges_created > 0,
                    reason: (charges_created == 0).then(|| REASON_ALREADY_EXISTS.to_string()),
                    charges_created,
                    amount_cents,
                    period,
                })
            }
            // Duplicate identity keys are a no-op for the caller.
            Err(BillingError::AlreadyExists { .. }) => Ok(ManualGenerationOutcome {
                created: false,
                reason: Some(REASON_ALREADY_EXISTS.to_string()),
                charges_created: 0,
                amount_cents: 0,
                period,
            }),
            Err(e) => Err(e),
        }
    }

    async fn generate_member(
        &self,
        gym_id: Uuid,
        period: Period,
        member: &Member,
    ) -> BillingResult<MemberOutcome> {
        let existing = self
            .store
            .list_member_period_charges(gym_id, period, member.id)
            .await?;
        if !existing.is_empty() {
            return Ok(MemberOutcome::AlreadyCharged);
        }

        let memberships = self.store.list_memberships(gym_id, member.id).await?;
        let eligible = eligibility::eligible_memberships(member, &memberships);
        if eligible.is_empty() {
            return Ok(MemberOutcome::NothingEligible);
        }

        let mut charges = 0u32;
        let mut amount_cents = 0i64;
        for membership in eligible {
            let charge = self.build_charge(gym_id, period, member.id, membership, None)?;
            if self.store.insert_charge_if_absent(charge.clone()).await? {
                self.store
                    .adjust_member_debt(gym_id, member.id, charge.amount_cents)
                    .await?;
                self.events.log_charge_created(&charge, None).await;
                charges += 1;
                amount_cents += charge.amount_cents;
            }
            // A lost create-if-absent race means another session charged
            // this membership first; nothing to count.
        }

        Ok(MemberOutcome::Created {
            charges,
            amount_cents,
        })
    }

    async fn create_charges(
        &self,
        gym_id: Uuid,
        period: Period,
        member_id: Uuid,
        eligible: &[&Membership],
        operator_id: Option<&str>,
    ) -> BillingResult<(u32, i64)> {
        // Duplicate detection on the identity key before any write.
        for membership in eligible {
            let key = ChargeKey {
                gym_id,
                period,
                member_id,
                membership_id: membership.id,
            };
            if self.store.get_charge(&key).await?.is_some() {
                return Err(BillingError::AlreadyExists {
                    period,
                    member_id,
                    membership_id: membership.id,
                });
            }
        }

        let mut charges_created = 0u32;
        let mut amount_cents = 0i64;
        for membership in eligible {
            let charge = self.build_charge(gym_id, period, member_id, membership, operator_id)?;
            if self.store.insert_charge_if_absent(charge.clone()).await? {
                self.store
                    .adjust_member_debt(gym_id, member_id, charge.amount_cents)
                    .await?;
                self.events.log_charge_created(&charge, operator_id).await;
                charges_created += 1;
                amount_cents += charge.amount_cents;
            }
        }
        Ok((charges_created, amount_cents))
    }

    fn build_charge(
        &self,
        gym_id: Uuid,
        period: Period,
        member_id: Uuid,
        membership: &Membership,
        operator_id: Option<&str>,
    ) -> BillingResult<Charge> {
        if membership.price_snapshot_cents <= 0 {
            return Err(BillingError::validation(format!(
                "membership {} has no price snapshot",
                membership.id
            )));
        }

        Ok(Charge {
            id: Uuid::new_v4(),
            gym_id,
            period,
            member_id,
            membership_id: membership.id,
            activity_id: membership.activity_id,
            activity_name: membership.activity_name.clone(),
            amount_cents: membership.price_snapshot_cents,
            due_date: period.due_date(self.due_day),
            status: ChargeStatus::Pending,
            paid_date: None,
            payment_method: None,
            created_by: operator_id.map(str::to_string),
            created_at: OffsetDateTime::now_utc(),
        })
    }
}
