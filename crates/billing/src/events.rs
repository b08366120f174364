//! Billing event audit log.
//!
//! Append-only trail of everything the engine does to money: charge
//! creation, settlement, generation runs, membership lifecycle, and debt
//! repairs. Logging never fails the operation that produced the event;
//! store errors are traced and swallowed.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use gymbook_shared::{
    ActorType, BillingEvent, BillingEventType, Charge, GymStore, Membership, MembershipStatus,
    Period,
};

use crate::error::BillingResult;

/// Fluent constructor for [`BillingEvent`] records.
pub struct BillingEventBuilder {
    gym_id: Uuid,
    event_type: BillingEventType,
    actor_type: ActorType,
    actor_id: Option<String>,
    member_id: Option<Uuid>,
    membership_id: Option<Uuid>,
    period: Option<Period>,
    amount_cents: Option<i64>,
    description: String,
    metadata: serde_json::Value,
}

impl BillingEventBuilder {
    pub fn new(gym_id: Uuid, event_type: BillingEventType) -> Self {
        Self {
            gym_id,
            event_type,
            actor_type: ActorType::System,
            actor_id: None,
            member_id: None,
            membership_id: None,
            period: None,
            amount_cents: None,
            description: String::new(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn actor(mut self, actor_type: ActorType, actor_id: Option<String>) -> Self {
        self.actor_type = actor_type;
        self.actor_id = actor_id;
        self
    }

    /// Operator actor when an id is present, system actor otherwise.
    pub fn operator(self, operator_id: Option<&str>) -> Self {
        match operator_id {
            Some(id) => self.actor(ActorType::Operator, Some(id.to_string())),
            None => self.actor(ActorType::System, None),
        }
    }

    pub fn member(mut self, member_id: Uuid) -> Self {
        self.member_id = Some(member_id);
        self
    }

    pub fn membership(mut self, membership_id: Uuid) -> Self {
        self.membership_id = Some(membership_id);
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn amount_cents(mut self, amount_cents: i64) -> Self {
        self.amount_cents = Some(amount_cents);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> BillingEvent {
        BillingEvent {
            id: Uuid::new_v4(),
            gym_id: self.gym_id,
            event_type: self.event_type,
            actor_type: self.actor_type,
            actor_id: self.actor_id,
            member_id: self.member_id,
            membership_id: self.membership_id,
            period: self.period,
            amount_cents: self.amount_cents,
            description: self.description,
            metadata: self.metadata,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Writes audit events to the store.
#[derive(Clone)]
pub struct BillingEventLogger {
    store: Arc<dyn GymStore>,
}

impl BillingEventLogger {
    pub fn new(store: Arc<dyn GymStore>) -> Self {
        Self { store }
    }

    /// Append one event. Failures are traced, never propagated.
    pub async fn log(&self, event: BillingEvent) {
        if let Err(e) = self.store.append_event(event).await {
            warn!(error = %e, "Failed to record billing event");
        }
    }

    pub async fn log_charge_created(&self, charge: &Charge, operator_id: Option<&str>) {
        let event = BillingEventBuilder::new(charge.gym_id, BillingEventType::ChargeCreated)
            .operator(operator_id)
            .member(charge.member_id)
            .membership(charge.membership_id)
            .period(charge.period)
            .amount_cents(charge.amount_cents)
            .description(format!(
                "Charge created for {} ({})",
                charge.activity_name, charge.period
            ))
            .build();
        self.log(event).await;
    }

    pub async fn log_charge_settled(&self, charge: &Charge, operator_id: Option<&str>) {
        let method = charge
            .payment_method
            .map(|m| m.as_str())
            .unwrap_or("unknown");
        let event = BillingEventBuilder::new(charge.gym_id, BillingEventType::ChargeSettled)
            .operator(operator_id)
            .member(charge.member_id)
            .membership(charge.membership_id)
            .period(charge.period)
            .amount_cents(charge.amount_cents)
            .description(format!(
                "Charge for {} settled via {method}",
                charge.activity_name
            ))
            .metadata(serde_json::json!({ "payment_method": method }))
            .build();
        self.log(event).await;
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn log_generation_completed(
        &self,
        gym_id: Uuid,
        period: Period,
        member_count: u32,
        created_count: u32,
        total_amount_cents: i64,
        error_count: u32,
    ) {
        let event = BillingEventBuilder::new(gym_id, BillingEventType::GenerationCompleted)
            .period(period)
            .amount_cents(total_amount_cents)
            .description(format!(
                "Generated {created_count} charges across {member_count} members for {period}"
            ))
            .metadata(serde_json::json!({
                "member_count": member_count,
                "created_count": created_count,
                "error_count": error_count,
            }))
            .build();
        self.log(event).await;
    }

    pub async fn log_membership_assigned(
        &self,
        gym_id: Uuid,
        membership: &Membership,
        operator_id: Option<&str>,
    ) {
        let event = BillingEventBuilder::new(gym_id, BillingEventType::MembershipAssigned)
            .operator(operator_id)
            .member(membership.member_id)
            .membership(membership.id)
            .amount_cents(membership.price_snapshot_cents)
            .description(format!("Membership assigned: {}", membership.activity_name))
            .build();
        self.log(event).await;
    }

    pub async fn log_membership_status_changed(
        &self,
        gym_id: Uuid,
        membership: &Membership,
        previous: MembershipStatus,
        operator_id: Option<&str>,
    ) {
        let event = BillingEventBuilder::new(gym_id, BillingEventType::MembershipStatusChanged)
            .operator(operator_id)
            .member(membership.member_id)
            .membership(membership.id)
            .description(format!(
                "Membership {} moved {previous} -> {}",
                membership.activity_name, membership.status
            ))
            .metadata(serde_json::json!({
                "from": previous.as_str(),
                "to": membership.status.as_str(),
            }))
            .build();
        self.log(event).await;
    }

    pub async fn log_debt_repaired(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        recorded_cents: i64,
        expected_cents: i64,
        operator_id: Option<&str>,
    ) {
        let event = BillingEventBuilder::new(gym_id, BillingEventType::DebtRepaired)
            .operator(operator_id)
            .member(member_id)
            .amount_cents(expected_cents - recorded_cents)
            .description(format!(
                "Debt counter corrected from {recorded_cents} to {expected_cents}"
            ))
            .metadata(serde_json::json!({
                "recorded_cents": recorded_cents,
                "expected_cents": expected_cents,
            }))
            .build();
        self.log(event).await;
    }

    /// Most recent events for the gym.
    pub async fn recent(&self, gym_id: Uuid, limit: usize) -> BillingResult<Vec<BillingEvent>> {
        Ok(self.store.list_events(gym_id, limit).await?)
    }
}
