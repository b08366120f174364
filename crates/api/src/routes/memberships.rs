//! Membership management endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use gymbook_billing::AssignMembershipParams;
use gymbook_shared::{Membership, MembershipStatus};

use crate::error::ApiResult;
use crate::operator::OperatorContext;
use crate::state::AppState;

/// Enroll a member into an activity, snapshotting its current price.
pub async fn assign(
    State(state): State<AppState>,
    Path((gym_id, member_id)): Path<(Uuid, Uuid)>,
    operator: OperatorContext,
    Json(params): Json<AssignMembershipParams>,
) -> ApiResult<Json<Membership>> {
    let membership = state
        .billing
        .assignment
        .assign(gym_id, member_id, params, operator.as_deref())
        .await?;
    Ok(Json(membership))
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: MembershipStatus,
}

/// Move a membership between active, paused, and cancelled.
pub async fn change_status(
    State(state): State<AppState>,
    Path((gym_id, member_id, membership_id)): Path<(Uuid, Uuid, Uuid)>,
    operator: OperatorContext,
    Json(request): Json<ChangeStatusRequest>,
) -> ApiResult<Json<Membership>> {
    let membership = state
        .billing
        .assignment
        .change_status(gym_id, member_id, membership_id, request.status, operator.as_deref())
        .await?;
    Ok(Json(membership))
}
