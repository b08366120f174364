//! Operational endpoints: consistency checks and debt repair.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use gymbook_billing::{ConsistencyReport, RepairOutcome};

use crate::error::ApiResult;
use crate::operator::OperatorContext;
use crate::state::AppState;

/// Run every consistency check for the gym. Read-only.
pub async fn check_consistency(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
) -> ApiResult<Json<ConsistencyReport>> {
    let report = state.billing.consistency.run_all_checks(gym_id).await?;
    Ok(Json(report))
}

/// Realign drifted debt counters with their pending-charge sums.
pub async fn repair_debt(
    State(state): State<AppState>,
    Path(gym_id): Path<Uuid>,
    operator: OperatorContext,
) -> ApiResult<Json<RepairOutcome>> {
    let outcome = state
        .billing
        .consistency
        .apply_debt_repair(gym_id, operator.as_deref())
        .await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    use time::OffsetDateTime;

    use gymbook_shared::{
        ActorType, BillingEventType, Config, Gym, GymStore, Member, MemberStatus,
    };

    fn test_config() -> Config {
        Config {
            bind_address: "127.0.0.1:0".to_string(),
            due_day: 15,
        }
    }

    /// One member whose debt counter shows an amount no pending charge
    /// backs.
    async fn drifted_state() -> (AppState, Uuid, Uuid) {
        let state = AppState::in_memory(test_config());
        let gym_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();
        state
            .store
            .put_gym(Gym {
                id: gym_id,
                name: "Test Gym".to_string(),
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .unwrap();
        state
            .store
            .put_member(Member {
                id: member_id,
                gym_id,
                name: "Ana".to_string(),
                status: MemberStatus::Active,
                total_debt_cents: 3_000,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .unwrap();
        (state, gym_id, member_id)
    }

    #[tokio::test]
    async fn test_check_consistency_reports_debt_drift() {
        let (state, gym_id, member_id) = drifted_state().await;

        let Json(report) = check_consistency(State(state), Path(gym_id))
            .await
            .unwrap();
        assert!(!report.healthy);
        assert_eq!(report.checks_failed, 1);
        assert!(report
            .violations
            .iter()
            .any(|v| v.member_ids.contains(&member_id)));
    }

    #[tokio::test]
    async fn test_repair_debt_realigns_counter_and_stamps_operator() {
        let (state, gym_id, member_id) = drifted_state().await;

        let Json(outcome) = repair_debt(
            State(state.clone()),
            Path(gym_id),
            OperatorContext {
                operator_id: Some("op-11".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.repaired.len(), 1);
        assert_eq!(outcome.repaired[0].delta_cents, -3_000);

        let member = state
            .store
            .get_member(gym_id, member_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.total_debt_cents, 0);

        let events = state.billing.events.recent(gym_id, 10).await.unwrap();
        let event = events
            .iter()
            .find(|e| e.event_type == BillingEventType::DebtRepaired)
            .unwrap();
        assert_eq!(event.actor_type, ActorType::Operator);
        assert_eq!(event.actor_id.as_deref(), Some("op-11"));
        assert_eq!(event.member_id, Some(member_id));
    }
}
