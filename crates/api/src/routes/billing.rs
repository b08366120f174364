//! Billing endpoints: generation, settlement, balances, and advisories.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use gymbook_billing::{
    BillingError, GenerationPrompt, GuardVerdict, ManualGenerationOutcome, PendingMemberRow,
    PeriodGenerationReport, PeriodSummary, SettleTarget, SettlementReceipt,
};
use gymbook_shared::{BillingEvent, PaymentMethod, Period};

use crate::error::{ApiError, ApiResult};
use crate::operator::OperatorContext;
use crate::state::AppState;

const DEFAULT_EVENT_LIMIT: usize = 50;
const MAX_EVENT_LIMIT: usize = 500;

/// Optional explicit period selector. Both parts must be given together;
/// absent means the current period.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
}

impl PeriodQuery {
    pub fn resolve(&self) -> Result<Period, ApiError> {
        match (self.year, self.month) {
            (None, None) => Ok(Period::current()),
            (Some(year), Some(month)) => {
                Period::new(year, month).map_err(|e| ApiError::BadRequest(e.to_string()))
            }
            _ => Err(ApiError::BadRequest(
                "year and month must be provided together".to_string(),
            )),
        }
    }
}

/// Run the monthly generation job for one gym.
///
/// Guarded: a period that already has a processing record returns 409.
/// The per-member manual route stays available for late joiners.
pub async fn generate(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<PeriodGenerationReport>> {
    let period = query.resolve()?;
    let record = state
        .store
        .processing_record(gym_id, period)
        .await
        .map_err(BillingError::from)?;
    if record.is_some() {
        return Err(BillingError::AlreadyProcessed { gym_id, period }.into());
    }

    let report = state
        .billing
        .generation
        .generate_for_period(gym_id, period)
        .await?;
    Ok(Json(report))
}

/// Generate charges for a single member, bypassing the period guard.
/// A duplicate is a 200 with `created=false`, not an error.
pub async fn generate_for_member(
    State(state): State<AppState>,
    Path((gym_id, member_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<PeriodQuery>,
    operator: OperatorContext,
) -> ApiResult<Json<ManualGenerationOutcome>> {
    let period = query.resolve()?;
    let outcome = state
        .billing
        .generation
        .generate_for_member_in_period(gym_id, member_id, period, operator.as_deref())
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub member_id: Uuid,
    pub year: i32,
    pub month: u8,
    /// Settle one membership's charge; absent settles everything pending.
    pub membership_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
}

pub async fn settle(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
    operator: OperatorContext,
    Json(request): Json<SettleRequest>,
) -> ApiResult<Json<SettlementReceipt>> {
    let period = Period::new(request.year, request.month)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let target = match request.membership_id {
        Some(membership_id) => SettleTarget::Membership(membership_id),
        None => SettleTarget::AllOutstanding,
    };

    let receipt = state
        .billing
        .settlement
        .settle(
            gym_id,
            request.member_id,
            period,
            target,
            request.payment_method,
            operator.as_deref(),
        )
        .await?;
    Ok(Json(receipt))
}

/// Members still owing for the period, most overdue first.
pub async fn list_pending(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<Vec<PendingMemberRow>>> {
    let period = query.resolve()?;
    let rows = state.billing.outstanding.list_pending(gym_id, period).await?;
    Ok(Json(rows))
}

pub async fn period_summary(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<PeriodSummary>> {
    let period = query.resolve()?;
    let summary = state
        .billing
        .outstanding
        .period_summary(gym_id, period)
        .await?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct ShouldRunResponse {
    pub should_run: bool,
    pub verdict: GuardVerdict,
}

/// Advisory: would an automatic run fire for this gym right now?
pub async fn should_run(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
) -> ApiResult<Json<ShouldRunResponse>> {
    let verdict = state.billing.guard.verdict(gym_id).await?;
    Ok(Json(ShouldRunResponse {
        should_run: verdict.should_run,
        verdict,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptQuery {
    /// Day the client last offered the generation prompt, if any.
    #[serde(default, with = "gymbook_shared::period::serde_date::option")]
    pub last_offered_on: Option<Date>,
}

/// Should the client surface its "generate now?" prompt for this gym?
pub async fn generation_prompt(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
    Query(query): Query<PromptQuery>,
) -> ApiResult<Json<GenerationPrompt>> {
    let trigger = state.billing.scheduling_trigger(query.last_offered_on);
    let prompt = trigger.evaluate(gym_id).await?;
    Ok(Json(prompt))
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// Audit trail, most recent first.
pub async fn list_events(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<Vec<BillingEvent>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(MAX_EVENT_LIMIT);
    let events = state.billing.events.recent(gym_id, limit).await?;
    Ok(Json(events))
}
