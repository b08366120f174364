// Shared crate clippy configuration
// Test code patterns:
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Gymbook Shared Types
//!
//! Common building blocks used by the billing engine, the API server, and
//! the background worker:
//!
//! - **Configuration**: environment-backed `Config`
//! - **Calendar**: the `Period` billing-cycle key and due-date math
//! - **Document model**: gyms, members, memberships, activities, charges,
//!   processing records, and billing events
//! - **Storage**: the `GymStore` abstraction plus the bundled in-memory
//!   implementation used for development and tests

pub mod config;
pub mod model;
pub mod period;
pub mod store;

pub use config::{Config, DEFAULT_DUE_DAY};
pub use model::{
    Activity, ActorType, BillingEvent, BillingEventType, Charge, ChargeKey, ChargeStatus, Gym,
    Member, MemberStatus, Membership, MembershipStatus, PaymentMethod, PeriodProcessingRecord,
};
pub use period::{days_overdue, Period};
pub use store::{GymStore, InMemoryGymStore, PaidTransition, StoreError, StoreResult};
