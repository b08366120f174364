// Billing crate clippy configuration
// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Gymbook Billing Module
//!
//! The monthly billing engine: decides which memberships owe a charge,
//! creates each charge exactly once per (member, period), and tracks
//! payment and outstanding state per gym.
//!
//! ## Features
//!
//! - **Charge Generation**: batch per-gym runs and manual per-member charges
//! - **Idempotency Guard**: durable per-period processing record gate
//! - **Settlement**: Pending to Paid transitions with symmetric debt updates
//! - **Pending Queries**: overdue listing and period summaries for dashboards
//! - **Membership Assignment**: price-snapshotted activity subscriptions
//! - **Consistency Checks**: runnable invariants plus debt repair
//! - **Event Log**: append-only audit trail of billing activity

pub mod assignment;
pub mod consistency;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod generation;
pub mod guard;
pub mod ledger;
pub mod outstanding;
pub mod schedule;
pub mod settlement;


// Assignment
pub use assignment::{AssignMembershipParams, AssignmentService};

// Consistency
pub use consistency::{
    ConsistencyChecker, ConsistencyReport, ConsistencyViolation, DebtRepair, RepairOutcome,
    ViolationSeverity,
};

// Eligibility
pub use eligibility::{eligible_memberships, evaluate, EligibilityVerdict, SkipReason};

// Error
pub use error::{BillingError, BillingResult};

// Events
pub use events::{BillingEventBuilder, BillingEventLogger};

// Generation
pub use generation::{
    GenerationService, ManualGenerationOutcome, MemberGenerationError, PeriodGenerationReport,
    REASON_ALREADY_EXISTS, REASON_NO_ELIGIBLE_MEMBERSHIP,
};

// Guard
pub use guard::{GuardVerdict, PeriodGuard};

// Ledger
pub use ledger::{pending_total_cents, MemberPeriodLedger};

// Outstanding
pub use outstanding::{ActivityBreakdown, OutstandingService, PendingMemberRow, PeriodSummary};

// Schedule
pub use schedule::{
    GenerationPrompt, SchedulingTrigger, SUPPRESS_ALREADY_OFFERED, SUPPRESS_ALREADY_PROCESSED,
    SUPPRESS_NOT_FIRST_DAY,
};

// Settlement
pub use settlement::{SettleTarget, SettlementReceipt, SettlementService};

use std::sync::Arc;

use time::Date;

use gymbook_shared::{GymStore, DEFAULT_DUE_DAY};

/// Billing engine tuning.
#[derive(Debug, Clone, Copy)]
pub struct BillingConfig {
    /// Day of the month charges fall due, clamped to the month length.
    pub due_day: u8,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            due_day: DEFAULT_DUE_DAY,
        }
    }
}

impl BillingConfig {
    /// Read the config from `BILLING_DUE_DAY`, defaulting when unset.
    pub fn from_env() -> BillingResult<Self> {
        match std::env::var("BILLING_DUE_DAY") {
            Ok(raw) => {
                let due_day: u8 = raw.trim().parse().map_err(|_| {
                    BillingError::validation(format!(
                        "BILLING_DUE_DAY must be a number, got '{raw}'"
                    ))
                })?;
                if !(1..=31).contains(&due_day) {
                    return Err(BillingError::validation(format!(
                        "BILLING_DUE_DAY must be between 1 and 31, got {due_day}"
                    )));
                }
                Ok(Self { due_day })
            }
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Main billing service that combines all billing functionality
pub struct BillingService {
    pub generation: GenerationService,
    pub settlement: SettlementService,
    pub outstanding: OutstandingService,
    pub assignment: AssignmentService,
    pub guard: PeriodGuard,
    pub consistency: ConsistencyChecker,
    pub events: BillingEventLogger,
}

impl BillingService {
    /// Create a new billing service from environment variables
    pub fn from_env(store: Arc<dyn GymStore>) -> BillingResult<Self> {
        Ok(Self::new(BillingConfig::from_env()?, store))
    }

    /// Create a new billing service with explicit config
    pub fn new(config: BillingConfig, store: Arc<dyn GymStore>) -> Self {
        let events = BillingEventLogger::new(store.clone());

        Self {
            generation: GenerationService::new(store.clone(), &config, events.clone()),
            settlement: SettlementService::new(store.clone(), events.clone()),
            outstanding: OutstandingService::new(store.clone()),
            assignment: AssignmentService::new(store.clone(), events.clone()),
            guard: PeriodGuard::new(store.clone()),
            consistency: ConsistencyChecker::new(store, events.clone()),
            events,
        }
    }

    /// Build a per-session scheduling trigger around this engine's guard.
    pub fn scheduling_trigger(&self, last_offered_on: Option<Date>) -> SchedulingTrigger {
        SchedulingTrigger::new(self.guard.clone(), last_offered_on)
    }
}
