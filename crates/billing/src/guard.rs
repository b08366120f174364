//! Idempotency guard for automatic generation.
//!
//! Advisory read-then-decide check: automatic generation should run only on
//! the first day of the billing cycle, and only while no processing record
//! exists for the current period. The hard exactly-once guarantee lives in
//! the store's conditional writes, not here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use gymbook_shared::{GymStore, Period};

use crate::error::BillingResult;

/// What the guard decided and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardVerdict {
    pub period: Period,
    /// Today is the first day of the billing cycle.
    pub first_day_of_cycle: bool,
    /// A processing record already exists for the period.
    pub already_processed: bool,
    pub should_run: bool,
}

#[derive(Clone)]
pub struct PeriodGuard {
    store: Arc<dyn GymStore>,
}

impl PeriodGuard {
    pub fn new(store: Arc<dyn GymStore>) -> Self {
        Self { store }
    }

    pub async fn verdict(&self, gym_id: Uuid) -> BillingResult<GuardVerdict> {
        self.verdict_on(gym_id, OffsetDateTime::now_utc().date())
            .await
    }

    pub async fn verdict_on(&self, gym_id: Uuid, today: Date) -> BillingResult<GuardVerdict> {
        let period = Period::containing(today);
        let first_day_of_cycle = today.day() == 1;
        let already_processed = self
            .store
            .processing_record(gym_id, period)
            .await?
            .is_some();

        Ok(GuardVerdict {
            period,
            first_day_of_cycle,
            already_processed,
            should_run: first_day_of_cycle && !already_processed,
        })
    }

    /// True iff automatic generation should run for the gym today.
    pub async fn should_run(&self, gym_id: Uuid) -> BillingResult<bool> {
        Ok(self.verdict(gym_id).await?.should_run)
    }

    pub async fn should_run_on(&self, gym_id: Uuid, today: Date) -> BillingResult<bool> {
        Ok(self.verdict_on(gym_id, today).await?.should_run)
    }
}
