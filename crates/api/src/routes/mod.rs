//! Route tree for the billing API.

pub mod admin;
pub mod billing;
pub mod memberships;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Build the full application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/gyms/{gym_id}/billing/generate", post(billing::generate))
        .route(
            "/gyms/{gym_id}/members/{member_id}/billing/generate",
            post(billing::generate_for_member),
        )
        .route("/gyms/{gym_id}/billing/settle", post(billing::settle))
        .route("/gyms/{gym_id}/billing/pending", get(billing::list_pending))
        .route("/gyms/{gym_id}/billing/summary", get(billing::period_summary))
        .route("/gyms/{gym_id}/billing/should-run", get(billing::should_run))
        .route("/gyms/{gym_id}/billing/prompt", get(billing::generation_prompt))
        .route("/gyms/{gym_id}/billing/events", get(billing::list_events))
        .route(
            "/gyms/{gym_id}/billing/consistency",
            get(admin::check_consistency),
        )
        .route(
            "/gyms/{gym_id}/billing/consistency/repair",
            post(admin::repair_debt),
        )
        .route(
            "/gyms/{gym_id}/members/{member_id}/memberships",
            post(memberships::assign),
        )
        .route(
            "/gyms/{gym_id}/members/{member_id}/memberships/{membership_id}/status",
            post(memberships::change_status),
        )
        .with_state(state)
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use time::OffsetDateTime;
    use tower::ServiceExt;
    use uuid::Uuid;

    use gymbook_shared::{Config, Gym, GymStore, Member, MemberStatus};

    use crate::operator::OPERATOR_HEADER;

    fn test_state() -> AppState {
        AppState::in_memory(Config {
            bind_address: "127.0.0.1:0".to_string(),
            due_day: 15,
        })
    }

    #[tokio::test]
    async fn test_health_route_responds() {
        let response = create_router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_gym_maps_to_not_found() {
        let uri = format!("/gyms/{}/billing/pending", Uuid::new_v4());
        let response = create_router(test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_repair_route_stamps_the_operator() {
        let state = test_state();
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
        // Debt counter showing an amount no pending charge backs.
        state
            .store
            .put_member(Member {
                id: member_id,
                gym_id,
                name: "Ana".to_string(),
                status: MemberStatus::Active,
                total_debt_cents: 2_500,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .unwrap();

        let response = create_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/gyms/{gym_id}/billing/consistency/repair"))
                    .header(OPERATOR_HEADER, "op-7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let member = state
            .store
            .get_member(gym_id, member_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.total_debt_cents, 0);

        let events = state.billing.events.recent(gym_id, 5).await.unwrap();
        assert_eq!(events[0].actor_id.as_deref(), Some("op-7"));
    }
}
