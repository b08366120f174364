//! Session-side generation prompt.
//!
//! Decides whether an operator session should be offered the "generate
//! this period now" prompt. The last-offered marker is handed in by the
//! session that owns it and only suppresses repeat prompts within one
//! day. It carries no correctness weight: the period guard's verdict is
//! embedded in every prompt and the generation paths re-check duplicates
//! on write regardless of what the prompt said.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::BillingResult;
use crate::guard::{GuardVerdict, PeriodGuard};

/// Prompt suppressed because this session already offered it today.
pub const SUPPRESS_ALREADY_OFFERED: &str = "already-offered-today";
/// Prompt suppressed because today is not the first day of the cycle.
pub const SUPPRESS_NOT_FIRST_DAY: &str = "not-first-day";
/// Prompt suppressed because the period was already generated.
pub const SUPPRESS_ALREADY_PROCESSED: &str = "already-processed";

/// What the session should do with the generation prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPrompt {
    pub gym_id: Uuid,
    /// Show the prompt to the operator.
    pub offer: bool,
    pub suppressed_reason: Option<String>,
    /// The authoritative guard decision the prompt defers to.
    pub verdict: GuardVerdict,
}

/// Per-session trigger. Construct one per evaluation with the marker the
/// session last recorded; the engine never stores it.
pub struct SchedulingTrigger {
    guard: PeriodGuard,
    last_offered_on: Option<Date>,
}

impl SchedulingTrigger {
    pub fn new(guard: PeriodGuard, last_offered_on: Option<Date>) -> Self {
        Self {
            guard,
            last_offered_on,
        }
    }

    pub async fn evaluate(&self, gym_id: Uuid) -> BillingResult<GenerationPrompt> {
        self.evaluate_on(gym_id, OffsetDateTime::now_utc().date())
            .await
    }

    pub async fn evaluate_on(
        &self,
        gym_id: Uuid,
        today: Date,
    ) -> BillingResult<GenerationPrompt> {
        let verdict = self.guard.verdict_on(gym_id, today).await?;

        let suppressed_reason = if self.last_offered_on == Some(today) {
            Some(SUPPRESS_ALREADY_OFFERED)
        } else if verdict.already_processed {
            Some(SUPPRESS_ALREADY_PROCESSED)
        } else if !verdict.first_day_of_cycle {
            Some(SUPPRESS_NOT_FIRST_DAY)
        } else {
            None
        };

        Ok(GenerationPrompt {
            gym_id,
            offer: suppressed_reason.is_none(),
            suppressed_reason: suppressed_reason.map(str::to_string),
            verdict,
        })
    }
}
