//! Tenant store abstraction.
//!
//! The billing engine talks to a hierarchical, per-gym document store
//! through [`GymStore`]. Contended writes are expressed as conditional
//! primitives rather than blind overwrites:
//!
//! - `insert_charge_if_absent` / `insert_processing_record_if_absent`
//!   create-if-absent on the document key
//! - `adjust_member_debt` applies a delta atomically and returns the new
//!   total
//! - `mark_charge_paid` is a compare-and-set on the Pending state
//!
//! [`InMemoryGymStore`] is the bundled implementation used by tests and
//! local development; deployments back the same trait with a remote store
//! adapter.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::Date;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{
    Activity, BillingEvent, Charge, ChargeKey, ChargeStatus, Gym, Member, Membership,
    PaymentMethod, PeriodProcessingRecord,
};
use crate::period::Period;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown gym: {0}")]
    UnknownGym(Uuid),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("document conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of the Pending to Paid compare-and-set.
#[derive(Debug, Clone, PartialEq)]
pub enum PaidTransition {
    /// The charge moved from Pending to Paid.
    Updated(Charge),
    /// The charge was already Paid; nothing changed.
    AlreadyPaid(Charge),
    /// No charge exists for the key.
    Missing,
}

#[async_trait]
pub trait GymStore: Send + Sync {
    // Gyms
    async fn put_gym(&self, gym: Gym) -> StoreResult<()>;
    async fn get_gym(&self, gym_id: Uuid) -> StoreResult<Option<Gym>>;
    async fn list_gyms(&self) -> StoreResult<Vec<Gym>>;

    // Members. Member records are owned by the member-management
    // subsystem; the engine only reads them and adjusts the debt counter.
    async fn put_member(&self, member: Member) -> StoreResult<()>;
    async fn get_member(&self, gym_id: Uuid, member_id: Uuid) -> StoreResult<Option<Member>>;
    async fn list_members(&self, gym_id: Uuid) -> StoreResult<Vec<Member>>;

    /// Apply `delta_cents` to the member's debt counter atomically and
    /// return the new total.
    async fn adjust_member_debt(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        delta_cents: i64,
    ) -> StoreResult<i64>;

    // Memberships
    async fn insert_membership(&self, gym_id: Uuid, membership: Membership) -> StoreResult<()>;
    async fn update_membership(&self, gym_id: Uuid, membership: Membership) -> StoreResult<()>;
    async fn get_membership(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        membership_id: Uuid,
    ) -> StoreResult<Option<Membership>>;
    async fn list_memberships(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Vec<Membership>>;

    // Activity catalog
    async fn put_activity(&self, gym_id: Uuid, activity: Activity) -> StoreResult<()>;
    async fn get_activity(&self, gym_id: Uuid, activity_id: Uuid)
        -> StoreResult<Option<Activity>>;
    async fn list_activities(&self, gym_id: Uuid) -> StoreResult<Vec<Activity>>;

    // Charges
    /// Create the charge unless one already exists for its identity key.
    /// Returns `true` when this call created the charge.
    async fn insert_charge_if_absent(&self, charge: Charge) -> StoreResult<bool>;
    async fn get_charge(&self, key: &ChargeKey) -> StoreResult<Option<Charge>>;
    /// Every charge of the gym across all periods.
    async fn list_charges(&self, gym_id: Uuid) -> StoreResult<Vec<Charge>>;
    async fn list_period_charges(&self, gym_id: Uuid, period: Period)
        -> StoreResult<Vec<Charge>>;
    async fn list_member_period_charges(
        &self,
        gym_id: Uuid,
        period: Period,
        member_id: Uuid,
    ) -> StoreResult<Vec<Charge>>;
    async fn list_member_charges(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Vec<Charge>>;
    async fn mark_charge_paid(
        &self,
        key: &ChargeKey,
        paid_date: Date,
        method: PaymentMethod,
    ) -> StoreResult<PaidTransition>;

    // Processing records
    /// Returns `true` when this call created the record.
    async fn insert_processing_record_if_absent(
        &self,
        record: PeriodProcessingRecord,
    ) -> StoreResult<bool>;
    async fn processing_record(
        &self,
        gym_id: Uuid,
        period: Period,
    ) -> StoreResult<Option<PeriodProcessingRecord>>;

    // Billing events
    async fn append_event(&self, event: BillingEvent) -> StoreResult<()>;
    /// Most recent first.
    async fn list_events(&self, gym_id: Uuid, limit: usize) -> StoreResult<Vec<BillingEvent>>;
}

struct TenantData {
    gym: Gym,
    members: HashMap<Uuid, Member>,
    memberships: HashMap<Uuid, Membership>,
    activities: HashMap<Uuid, Activity>,
    charges: HashMap<ChargeKey, Charge>,
    processing: HashMap<Period, PeriodProcessingRecord>,
    events: Vec<BillingEvent>,
}

impl TenantData {
    fn new(gym: Gym) -> Self {
        Self {
            gym,
            members: HashMap::new(),
            memberships: HashMap::new(),
            activities: HashMap::new(),
            charges: HashMap::new(),
            processing: HashMap::new(),
            events: Vec::new(),
        }
    }
}

/// In-memory [`GymStore`] holding all tenants behind one async lock.
///
/// Every conditional primitive runs under the write lock, which gives the
/// same effective guarantees a remote store provides through conditional
/// requests.
#[derive(Clone, Default)]
pub struct InMemoryGymStore {
    inner: Arc<RwLock<HashMap<Uuid, TenantData>>>,
}

impl InMemoryGymStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn tenant<'a>(
    guard: &'a HashMap<Uuid, TenantData>,
    gym_id: Uuid,
) -> StoreResult<&'a TenantData> {
    guard.get(&gym_id).ok_or(StoreError::UnknownGym(gym_id))
}

fn tenant_mut<'a>(
    guard: &'a mut HashMap<Uuid, TenantData>,
    gym_id: Uuid,
) -> StoreResult<&'a mut TenantData> {
    guard.get_mut(&gym_id).ok_or(StoreError::UnknownGym(gym_id))
}

#[async_trait]
impl GymStore for InMemoryGymStore {
    async fn put_gym(&self, gym: Gym) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        match guard.entry(gym.id) {
            Entry::Occupied(mut existing) => existing.get_mut().gym = gym,
            Entry::Vacant(slot) => {
                slot.insert(TenantData::new(gym));
            }
        }
        Ok(())
    }

    async fn get_gym(&self, gym_id: Uuid) -> StoreResult<Option<Gym>> {
        let guard = self.inner.read().await;
        Ok(guard.get(&gym_id).map(|t| t.gym.clone()))
    }

    async fn list_gyms(&self) -> StoreResult<Vec<Gym>> {
        let guard = self.inner.read().await;
        let mut gyms: Vec<Gym> = guard.values().map(|t| t.gym.clone()).collect();
        gyms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(gyms)
    }

    async fn put_member(&self, member: Member) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, member.gym_id)?;
        tenant.members.insert(member.id, member);
        Ok(())
    }

    async fn get_member(&self, gym_id: Uuid, member_id: Uuid) -> StoreResult<Option<Member>> {
        let guard = self.inner.read().await;
        Ok(tenant(&guard, gym_id)?.members.get(&member_id).cloned())
    }

    async fn list_members(&self, gym_id: Uuid) -> StoreResult<Vec<Member>> {
        let guard = self.inner.read().await;
        let mut members: Vec<Member> =
            tenant(&guard, gym_id)?.members.values().cloned().collect();
        members.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(members)
    }

    async fn adjust_member_debt(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        delta_cents: i64,
    ) -> StoreResult<i64> {
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, gym_id)?;
        let member = tenant
            .members
            .get_mut(&member_id)
            .ok_or_else(|| StoreError::NotFound(format!("member {member_id}")))?;
        member.total_debt_cents += delta_cents;
        Ok(member.total_debt_cents)
    }

    async fn insert_membership(&self, gym_id: Uuid, membership: Membership) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, gym_id)?;
        if !tenant.members.contains_key(&membership.member_id) {
            return Err(StoreError::NotFound(format!(
                "member {}",
                membership.member_id
            )));
        }
        if tenant.memberships.contains_key(&membership.id) {
            return Err(StoreError::Conflict(format!(
                "membership {} already exists",
                membership.id
            )));
        }
        tenant.memberships.insert(membership.id, membership);
        Ok(())
    }

    async fn update_membership(&self, gym_id: Uuid, membership: Membership) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, gym_id)?;
        match tenant.memberships.entry(membership.id) {
            Entry::Occupied(mut existing) => {
                existing.insert(membership);
                Ok(())
            }
            Entry::Vacant(_) => Err(StoreError::NotFound(format!(
                "membership {}",
                membership.id
            ))),
        }
    }

    async fn get_membership(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
        membership_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        let guard = self.inner.read().await;
        Ok(tenant(&guard, gym_id)?
            .memberships
            .get(&membership_id)
            .filter(|m| m.member_id == member_id)
            .cloned())
    }

    async fn list_memberships(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Vec<Membership>> {
        let guard = self.inner.read().await;
        let mut memberships: Vec<Membership> = tenant(&guard, gym_id)?
            .memberships
            .values()
            .filter(|m| m.member_id == member_id)
            .cloned()
            .collect();
        memberships.sort_by(|a, b| a.activity_name.cmp(&b.activity_name).then(a.id.cmp(&b.id)));
        Ok(memberships)
    }

    async fn put_activity(&self, gym_id: Uuid, activity: Activity) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, gym_id)?;
        tenant.activities.insert(activity.id, activity);
        Ok(())
    }

    async fn get_activity(
        &self,
        gym_id: Uuid,
        activity_id: Uuid,
    ) -> StoreResult<Option<Activity>> {
        let guard = self.inner.read().await;
        Ok(tenant(&guard, gym_id)?.activities.get(&activity_id).cloned())
    }

    async fn list_activities(&self, gym_id: Uuid) -> StoreResult<Vec<Activity>> {
        let guard = self.inner.read().await;
        let mut activities: Vec<Activity> =
            tenant(&guard, gym_id)?.activities.values().cloned().collect();
        activities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(activities)
    }

    async fn insert_charge_if_absent(&self, charge: Charge) -> StoreResult<bool> {
        let key = charge.key();
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, key.gym_id)?;
        match tenant.charges.entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(charge);
                Ok(true)
            }
        }
    }

    async fn get_charge(&self, key: &ChargeKey) -> StoreResult<Option<Charge>> {
        let guard = self.inner.read().await;
        Ok(tenant(&guard, key.gym_id)?.charges.get(key).cloned())
    }

    async fn list_charges(&self, gym_id: Uuid) -> StoreResult<Vec<Charge>> {
        let guard = self.inner.read().await;
        let mut charges: Vec<Charge> = tenant(&guard, gym_id)?.charges.values().cloned().collect();
        charges.sort_by(|a, b| {
            a.period
                .cmp(&b.period)
                .then(a.member_id.cmp(&b.member_id))
                .then(a.id.cmp(&b.id))
        });
        Ok(charges)
    }

    async fn list_period_charges(
        &self,
        gym_id: Uuid,
        period: Period,
    ) -> StoreResult<Vec<Charge>> {
        let guard = self.inner.read().await;
        let mut charges: Vec<Charge> = tenant(&guard, gym_id)?
            .charges
            .values()
            .filter(|c| c.period == period)
            .cloned()
            .collect();
        charges.sort_by(|a, b| a.member_id.cmp(&b.member_id).then(a.id.cmp(&b.id)));
        Ok(charges)
    }

    async fn list_member_period_charges(
        &self,
        gym_id: Uuid,
        period: Period,
        member_id: Uuid,
    ) -> StoreResult<Vec<Charge>> {
        let guard = self.inner.read().await;
        let mut charges: Vec<Charge> = tenant(&guard, gym_id)?
            .charges
            .values()
            .filter(|c| c.period == period && c.member_id == member_id)
            .cloned()
            .collect();
        charges.sort_by(|a, b| a.activity_name.cmp(&b.activity_name).then(a.id.cmp(&b.id)));
        Ok(charges)
    }

    async fn list_member_charges(
        &self,
        gym_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Vec<Charge>> {
        let guard = self.inner.read().await;
        let mut charges: Vec<Charge> = tenant(&guard, gym_id)?
            .charges
            .values()
            .filter(|c| c.member_id == member_id)
            .cloned()
            .collect();
        charges.sort_by(|a, b| a.period.cmp(&b.period).then(a.id.cmp(&b.id)));
        Ok(charges)
    }

    async fn mark_charge_paid(
        &self,
        key: &ChargeKey,
        paid_date: Date,
        method: PaymentMethod,
    ) -> StoreResult<PaidTransition> {
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, key.gym_id)?;
        let Some(charge) = tenant.charges.get_mut(key) else {
            return Ok(PaidTransition::Missing);
        };
        match charge.status {
            ChargeStatus::Paid => Ok(PaidTransition::AlreadyPaid(charge.clone())),
            ChargeStatus::Pending => {
                charge.status = ChargeStatus::Paid;
                charge.paid_date = Some(paid_date);
                charge.payment_method = Some(method);
                Ok(PaidTransition::Updated(charge.clone()))
            }
        }
    }

    async fn insert_processing_record_if_absent(
        &self,
        record: PeriodProcessingRecord,
    ) -> StoreResult<bool> {
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, record.gym_id)?;
        match tenant.processing.entry(record.period) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn processing_record(
        &self,
        gym_id: Uuid,
        period: Period,
    ) -> StoreResult<Option<PeriodProcessingRecord>> {
        let guard = self.inner.read().await;
        Ok(tenant(&guard, gym_id)?.processing.get(&period).cloned())
    }

    async fn append_event(&self, event: BillingEvent) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let tenant = tenant_mut(&mut guard, event.gym_id)?;
        tenant.events.push(event);
        Ok(())
    }

    async fn list_events(&self, gym_id: Uuid, limit: usize) -> StoreResult<Vec<BillingEvent>> {
        let guard = self.inner.read().await;
        Ok(tenant(&guard, gym_id)?
            .events
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActorType, BillingEventType, MemberStatus, MembershipStatus};
    use time::macros::date;
    use time::OffsetDateTime;

    fn gym() -> Gym {
        Gym {
            id: Uuid::new_v4(),
            name: "Iron Temple".to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn member(gym_id: Uuid, name: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            gym_id,
            name: name.to_string(),
            status: MemberStatus::Active,
            total_debt_cents: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn charge(gym_id: Uuid, period: Period, member_id: Uuid, amount_cents: i64) -> Charge {
        Charge {
            id: Uuid::new_v4(),
            gym_id,
            period,
            member_id,
            membership_id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            activity_name: "CrossFit".to_string(),
            amount_cents,
            due_date: period.due_date(15),
            status: ChargeStatus::Pending,
            paid_date: None,
            payment_method: None,
            created_by: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn event(gym_id: Uuid, description: &str) -> BillingEvent {
        BillingEvent {
            id: Uuid::new_v4(),
            gym_id,
            event_type: BillingEventType::ChargeCreated,
            actor_type: ActorType::System,
            actor_id: None,
            member_id: None,
            membership_id: None,
            period: None,
            amount_cents: None,
            description: description.to_string(),
            metadata: serde_json::Value::Null,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn charge_insert_is_create_if_absent() {
        let store = InMemoryGymStore::new();
        let g = gym();
        let gym_id = g.id;
        store.put_gym(g).await.unwrap();
        let m = member(gym_id, "Ana");
        let member_id = m.id;
        store.put_member(m).await.unwrap();

        let period = Period::new(2026, 8).unwrap();
        let first = charge(gym_id, period, member_id, 10_000);
        let mut duplicate = first.clone();
        duplicate.id = Uuid::new_v4();
        duplicate.amount_cents = 99_999;

        assert!(store.insert_charge_if_absent(first.clone()).await.unwrap());
        assert!(!store.insert_charge_if_absent(duplicate).await.unwrap());

        // The losing write must not clobber the original.
        let stored = store.get_charge(&first.key()).await.unwrap().unwrap();
        assert_eq!(stored.amount_cents, 10_000);
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn mark_paid_transitions_once() {
        let store = InMemoryGymStore::new();
        let g = gym();
        let gym_id = g.id;
        store.put_gym(g).await.unwrap();
        let m = member(gym_id, "Ana");
        let member_id = m.id;
        store.put_member(m).await.unwrap();

        let period = Period::new(2026, 8).unwrap();
        let c = charge(gym_id, period, member_id, 10_000);
        let key = c.key();
        store.insert_charge_if_absent(c).await.unwrap();

        let paid_on = date!(2026 - 08 - 20);
        match store
            .mark_charge_paid(&key, paid_on, PaymentMethod::Cash)
            .await
            .unwrap()
        {
            PaidTransition::Updated(updated) => {
                assert_eq!(updated.status, ChargeStatus::Paid);
                assert_eq!(updated.paid_date, Some(paid_on));
                assert_eq!(updated.payment_method, Some(PaymentMethod::Cash));
            }
            other => panic!("expected Updated, got {other:?}"),
        }

        match store
            .mark_charge_paid(&key, paid_on, PaymentMethod::Card)
            .await
            .unwrap()
        {
            PaidTransition::AlreadyPaid(existing) => {
                // Second settlement attempt must not rewrite the method.
                assert_eq!(existing.payment_method, Some(PaymentMethod::Cash));
            }
            other => panic!("expected AlreadyPaid, got {other:?}"),
        }

        let missing = ChargeKey {
            gym_id,
            period,
            member_id,
            membership_id: Uuid::new_v4(),
        };
        assert_eq!(
            store
                .mark_charge_paid(&missing, paid_on, PaymentMethod::Cash)
                .await
                .unwrap(),
            PaidTransition::Missing
        );
    }

    #[tokio::test]
    async fn debt_adjustments_accumulate() {
        let store = InMemoryGymStore::new();
        let g = gym();
        let gym_id = g.id;
        store.put_gym(g).await.unwrap();
        let m = member(gym_id, "Ana");
        let member_id = m.id;
        store.put_member(m).await.unwrap();

        assert_eq!(
            store
                .adjust_member_debt(gym_id, member_id, 10_000)
                .await
                .unwrap(),
            10_000
        );
        assert_eq!(
            store
                .adjust_member_debt(gym_id, member_id, -4_000)
                .await
                .unwrap(),
            6_000
        );

        let unknown = store.adjust_member_debt(gym_id, Uuid::new_v4(), 100).await;
        assert!(matches!(unknown, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn concurrent_debt_adjustments_do_not_lose_updates() {
        let store = InMemoryGymStore::new();
        let g = gym();
        let gym_id = g.id;
        store.put_gym(g).await.unwrap();
        let m = member(gym_id, "Ana");
        let member_id = m.id;
        store.put_member(m).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.adjust_member_debt(gym_id, member_id, 100).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let member = store.get_member(gym_id, member_id).await.unwrap().unwrap();
        assert_eq!(member.total_debt_cents, 1_000);
    }

    #[tokio::test]
    async fn processing_record_is_created_once() {
        let store = InMemoryGymStore::new();
        let g = gym();
        let gym_id = g.id;
        store.put_gym(g).await.unwrap();

        let period = Period::new(2026, 8).unwrap();
        let record = PeriodProcessingRecord {
            gym_id,
            period,
            processed_at: OffsetDateTime::now_utc(),
            member_count: 12,
            created_count: 10,
            total_amount_cents: 120_000,
            error_count: 0,
        };

        assert!(store
            .insert_processing_record_if_absent(record.clone())
            .await
            .unwrap());
        assert!(!store
            .insert_processing_record_if_absent(record.clone())
            .await
            .unwrap());
        assert_eq!(
            store.processing_record(gym_id, period).await.unwrap(),
            Some(record)
        );
        assert_eq!(
            store
                .processing_record(gym_id, period.next())
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn unknown_gym_is_an_error() {
        let store = InMemoryGymStore::new();
        let result = store.list_members(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::UnknownGym(_))));
    }

    #[tokio::test]
    async fn events_list_most_recent_first() {
        let store = InMemoryGymStore::new();
        let g = gym();
        let gym_id = g.id;
        store.put_gym(g).await.unwrap();

        for i in 0..5 {
            store.append_event(event(gym_id, &format!("event-{i}"))).await.unwrap();
        }

        let events = store.list_events(gym_id, 3).await.unwrap();
        let descriptions: Vec<&str> =
            events.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["event-4", "event-3", "event-2"]);
    }

    #[tokio::test]
    async fn membership_lookup_requires_matching_member() {
        let store = InMemoryGymStore::new();
        let g = gym();
        let gym_id = g.id;
        store.put_gym(g).await.unwrap();
        let owner = member(gym_id, "Ana");
        let owner_id = owner.id;
        store.put_member(owner).await.unwrap();
        let other = member(gym_id, "Borja");
        let other_id = other.id;
        store.put_member(other).await.unwrap();

        let membership = Membership {
            id: Uuid::new_v4(),
            member_id: owner_id,
            activity_id: Uuid::new_v4(),
            activity_name: "Yoga".to_string(),
            price_snapshot_cents: 4_500,
            status: MembershipStatus::Active,
            auto_renewal: true,
            start_date: date!(2026 - 01 - 10),
            end_date: None,
        };
        let membership_id = membership.id;
        store
            .insert_membership(gym_id, membership.clone())
            .await
            .unwrap();

        assert_eq!(
            store
                .get_membership(gym_id, owner_id, membership_id)
                .await
                .unwrap(),
            Some(membership.clone())
        );
        assert_eq!(
            store
                .get_membership(gym_id, other_id, membership_id)
                .await
                .unwrap(),
            None
        );

        let duplicate = store.insert_membership(gym_id, membership).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

        let ghost = Membership {
            id: Uuid::new_v4(),
            member_id: owner_id,
            activity_id: Uuid::new_v4(),
            activity_name: "Spin".to_string(),
            price_snapshot_cents: 3_000,
            status: MembershipStatus::Active,
            auto_renewal: true,
            start_date: date!(2026 - 01 - 10),
            end_date: None,
        };
        let update_missing = store.update_membership(gym_id, ghost).await;
        assert!(matches!(update_missing, Err(StoreError::NotFound(_))));
    }
}
