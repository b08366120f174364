//! Tenant document model.
//!
//! Every entity is scoped to one gym. Monetary values are integer minor
//! units (`*_cents`). Status fields are closed enums with a lowercase wire
//! form; billing event types use SCREAMING_SNAKE_CASE to match the audit
//! log convention.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::period::{serde_date, Period};

/// One tenant. All other documents hang off a gym id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gym {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub gym_id: Uuid,
    pub name: String,
    pub status: MemberStatus,
    /// Sum of this member's pending charge amounts across all periods.
    /// Maintained through the store's atomic debt adjustment only.
    pub total_debt_cents: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Paused,
    Cancelled,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's subscription to one activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub member_id: Uuid,
    pub activity_id: Uuid,
    pub activity_name: String,
    /// Monthly price captured when the membership was assigned. Catalog
    /// price changes never rewrite this.
    pub price_snapshot_cents: i64,
    pub status: MembershipStatus,
    pub auto_renewal: bool,
    #[serde(with = "serde_date")]
    pub start_date: Date,
    #[serde(default, with = "serde_date::option")]
    pub end_date: Option<Date>,
}

/// Price catalog entry, consumed read-only by the billing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub monthly_price_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Pending,
    Paid,
}

impl ChargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a charge. At most one charge exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChargeKey {
    pub gym_id: Uuid,
    pub period: Period,
    pub member_id: Uuid,
    pub membership_id: Uuid,
}

/// One monetary obligation for one membership in one period.
///
/// The amount is fixed at creation; the only permitted mutation is the
/// Pending to Paid transition performed by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub id: Uuid,
    pub gym_id: Uuid,
    pub period: Period,
    pub member_id: Uuid,
    pub membership_id: Uuid,
    pub activity_id: Uuid,
    pub activity_name: String,
    pub amount_cents: i64,
    #[serde(with = "serde_date")]
    pub due_date: Date,
    pub status: ChargeStatus,
    #[serde(default, with = "serde_date::option")]
    pub paid_date: Option<Date>,
    pub payment_method: Option<PaymentMethod>,
    /// Operator who triggered a manual creation, when known.
    pub created_by: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Charge {
    pub fn key(&self) -> ChargeKey {
        ChargeKey {
            gym_id: self.gym_id,
            period: self.period,
            member_id: self.member_id,
            membership_id: self.membership_id,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChargeStatus::Pending
    }
}

/// Durable witness that automatic generation ran for a (gym, period).
/// Created once, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodProcessingRecord {
    pub gym_id: Uuid,
    pub period: Period,
    #[serde(with = "time::serde::rfc3339")]
    pub processed_at: OffsetDateTime,
    pub member_count: u32,
    pub created_count: u32,
    pub total_amount_cents: i64,
    pub error_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingEventType {
    ChargeCreated,
    ChargeSettled,
    GenerationCompleted,
    MembershipAssigned,
    MembershipStatusChanged,
    DebtRepaired,
}

impl BillingEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChargeCreated => "CHARGE_CREATED",
            Self::ChargeSettled => "CHARGE_SETTLED",
            Self::GenerationCompleted => "GENERATION_COMPLETED",
            Self::MembershipAssigned => "MEMBERSHIP_ASSIGNED",
            Self::MembershipStatusChanged => "MEMBERSHIP_STATUS_CHANGED",
            Self::DebtRepaired => "DEBT_REPAIRED",
        }
    }
}

impl fmt::Display for BillingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who caused a billing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    /// A gym operator acting through the API; `actor_id` carries the
    /// operator id provided by the session layer.
    Operator,
    /// A scheduled or batch process.
    System,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit record for billing activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingEvent {
    pub id: Uuid,
    pub gym_id: Uuid,
    pub event_type: BillingEventType,
    pub actor_type: ActorType,
    pub actor_id: Option<String>,
    pub member_id: Option<Uuid>,
    pub membership_id: Option<Uuid>,
    pub period: Option<Period>,
    pub amount_cents: Option<i64>,
    pub description: String,
    pub metadata: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_forms_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&MemberStatus::Suspended).unwrap(),
            r#""suspended""#
        );
        assert_eq!(
            serde_json::to_string(&MembershipStatus::Paused).unwrap(),
            r#""paused""#
        );
        assert_eq!(
            serde_json::to_string(&ChargeStatus::Pending).unwrap(),
            r#""pending""#
        );
        let parsed: MembershipStatus = serde_json::from_str(r#""cancelled""#).unwrap();
        assert_eq!(parsed, MembershipStatus::Cancelled);
    }

    #[test]
    fn event_types_use_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&BillingEventType::ChargeCreated).unwrap(),
            r#""CHARGE_CREATED""#
        );
        assert_eq!(BillingEventType::DebtRepaired.to_string(), "DEBT_REPAIRED");
    }

    #[test]
    fn charge_key_is_derived_from_identity_fields() {
        let gym_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();
        let membership_id = Uuid::new_v4();
        let period = Period::new(2026, 8).unwrap();
        let charge = Charge {
            id: Uuid::new_v4(),
            gym_id,
            period,
            member_id,
            membership_id,
            activity_id: Uuid::new_v4(),
            activity_name: "CrossFit".to_string(),
            amount_cents: 10_000,
            due_date: period.due_date(15),
            status: ChargeStatus::Pending,
            paid_date: None,
            payment_method: None,
            created_by: None,
            created_at: OffsetDateTime::now_utc(),
        };

        assert_eq!(
            charge.key(),
            ChargeKey {
                gym_id,
                period,
                member_id,
                membership_id,
            }
        );
        assert!(charge.is_pending());
    }

    #[test]
    fn membership_dates_serialize_as_plain_strings() {
        let membership = Membership {
            id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            activity_name: "Yoga".to_string(),
            price_snapshot_cents: 4_500,
            status: MembershipStatus::Active,
            auto_renewal: true,
            start_date: time::macros::date!(2026 - 01 - 10),
            end_date: None,
        };

        let json = serde_json::to_value(&membership).unwrap();
        assert_eq!(json["start_date"], "2026-01-10");
        assert_eq!(json["end_date"], serde_json::Value::Null);

        let back: Membership = serde_json::from_value(json).unwrap();
        assert_eq!(back, membership);
    }
}
