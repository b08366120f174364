//! Billing error taxonomy.

use gymbook_shared::{Period, StoreError};
use uuid::Uuid;

pub type BillingResult<T> = Result<T, BillingError>;

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// Malformed input or a document that cannot be billed (for example a
    /// membership without a price).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// Automatic generation was attempted for a period that already has a
    /// processing record.
    #[error("period {period} already processed for gym {gym_id}")]
    AlreadyProcessed { gym_id: Uuid, period: Period },

    /// A charge already exists for the identity key. Non-fatal on the
    /// manual generation path, where it is reported as a no-op.
    #[error("charge already exists for member {member_id} membership {membership_id} in {period}")]
    AlreadyExists {
        period: Period,
        member_id: Uuid,
        membership_id: Uuid,
    },

    #[error("charge {charge_id} is already paid")]
    AlreadyPaid { charge_id: Uuid },

    /// Job-level wrapper for callers that must escalate a batch with
    /// per-member failures. The generation report remains the primary
    /// channel for the individual errors.
    #[error("{error_count} of {member_count} members failed while generating {period}")]
    PartialBatchFailure {
        period: Period,
        member_count: u32,
        error_count: u32,
    },

    #[error("concurrent update conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }
}
