//! Membership assignment and status changes.
//!
//! Assignment is where the price snapshot is taken: the activity's
//! catalog price at assignment time is copied onto the membership and
//! every later charge uses the copy. Catalog edits therefore affect new
//! assignments only, never existing memberships or charges.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use gymbook_shared::{GymStore, MemberStatus, Membership, MembershipStatus};

use crate::error::{BillingError, BillingResult};
use crate::events::BillingEventLogger;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssignMembershipParams {
    pub activity_id: Uuid,
    pub auto_renewal: bool,
    /// Defaults to today.
    #[serde(default, with = "gymbook_shared::period::serde_date::option")]
    pub start_date: Option<Date>,
}

#[derive(Clone)]
pub struct AssignmentService {
    store: Arc<dyn GymStore>,
    events: BillingEventLogger,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn GymStore>, events: BillingEventLogger) -> Self {
        Self { store, events }
    }

    /// Assign an activity to a member, snapshotting the catalog price.
    pub async fn assign(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        params: AssignMembershipParams,
        operator_id: Option<&str>,
    ) -> BillingResult<Membership> {
        let member = self
            .store
            .get_member(gym_id, member_id)
            .await?
            .ok_or_else(|| BillingError::not_found("member", member_id))?;
        match member.status {
            MemberStatus::Active => {}
            MemberStatus::Inactive | MemberStatus::Suspended => {
                return Err(BillingError::validation(format!(
                    "member {member_id} is {} and cannot receive a membership",
                    member.status
                )));
            }
        }

        let activity = self
            .store
            .get_activity(gym_id, params.activity_id)
            .await?
            .ok_or_else(|| BillingError::not_found("activity", params.activity_id))?;
        if activity.monthly_price_cents <= 0 {
            return Err(BillingError::validation(format!(
                "activity {} has no monthly price",
                activity.id
            )));
        }

        let memberships = self.store.list_memberships(gym_id, member_id).await?;
        let duplicate = memberships.iter().any(|m| {
            m.activity_id == params.activity_id && m.status != MembershipStatus::Cancelled
        });
        if duplicate {
            return Err(BillingError::validation(format!(
                "member {member_id} already holds a membership for activity {}",
                params.activity_id
            )));
        }

        let membership = Membership {
            id: Uuid::new_v4(),
            member_id,
            activity_id: activity.id,
            activity_name: activity.name.clone(),
            price_snapshot_cents: activity.monthly_price_cents,
            status: MembershipStatus::Active,
            auto_renewal: params.auto_renewal,
            start_date: params
                .start_date
                .unwrap_or_else(|| OffsetDateTime::now_utc().date()),
            end_date: None,
        };
        self.store
            .insert_membership(gym_id, membership.clone())
            .await?;

        self.events
            .log_membership_assigned(gym_id, &membership, operator_id)
            .await;
        info!(
            gym_id = %gym_id,
            member_id = %member_id,
            membership_id = %membership.id,
            activity = %membership.activity_name,
            price_cents = membership.price_snapshot_cents,
            "Membership assigned"
        );
        Ok(membership)
    }

    /// Move a membership to a new status.
    ///
    /// Cancelled is terminal; cancelling stamps the end date. Requesting
    /// the current status is a no-op.
    pub async fn change_status(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        membership_id: Uuid,
        status: MembershipStatus,
        operator_id: Option<&str>,
    ) -> BillingResult<Membership> {
        let current = self
            .store
            .get_membership(gym_id, member_id, membership_id)
            .await?
            .ok_or_else(|| BillingError::not_found("membership", membership_id))?;

        if current.status == status {
            return Ok(current);
        }
        match current.status {
            MembershipStatus::Cancelled => {
                return Err(BillingError::validation(format!(
                    "membership {membership_id} is cancelled and cannot change status"
                )));
            }
            MembershipStatus::Active | MembershipStatus::Paused => {}
        }

        let previous = current.status;
        let mut updated = current;
        updated.status = status;
        if status == MembershipStatus::Cancelled {
            updated.end_date = Some(OffsetDateTime::now_utc().date());
        }
        self.store
            .update_membership(gym_id, updated.clone())
            .await?;

        self.events
            .log_membership_status_changed(gym_id, &updated, previous, operator_id)
            .await;
        info!(
            gym_id = %gym_id,
            membership_id = %membership_id,
            from = %previous,
            to = %status,
            "Membership status changed"
        );
        Ok(updated)
    }
}
