//! HTTP error mapping.
//!
//! Converts the billing error taxonomy into status codes and JSON bodies.
//! Client mistakes keep their message; storage failures are logged and
//! replaced with a safe one.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use gymbook_billing::BillingError;
use gymbook_shared::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request parameters, before the engine is even consulted.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Billing(#[from] BillingError),
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Billing(err) => match err {
                BillingError::Validation(_) => StatusCode::BAD_REQUEST,
                BillingError::NotFound { .. } => StatusCode::NOT_FOUND,
                BillingError::AlreadyProcessed { .. }
                | BillingError::AlreadyExists { .. }
                | BillingError::AlreadyPaid { .. }
                | BillingError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
                BillingError::PartialBatchFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                BillingError::Store(store) => match store {
                    StoreError::UnknownGym(_) | StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    StoreError::Conflict(_) => StatusCode::CONFLICT,
                    StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                },
            },
        }
    }

    /// Message exposed to the client. Server-side failures never leak
    /// their internal detail.
    pub fn safe_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "internal error".to_string(),
            StatusCode::SERVICE_UNAVAILABLE => "storage temporarily unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        }
        let body = Json(ErrorBody {
            error: self.safe_message(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymbook_shared::Period;
    use uuid::Uuid;

    fn period() -> Period {
        Period::new(2026, 8).unwrap()
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = ApiError::Billing(BillingError::validation("month out of range"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.safe_message(), "validation failed: month out of range");

        let err = ApiError::Billing(BillingError::not_found("member", "m-1"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.safe_message(), "member not found: m-1");
    }

    #[test]
    fn duplicate_states_map_to_conflict() {
        let processed = ApiError::Billing(BillingError::AlreadyProcessed {
            gym_id: Uuid::nil(),
            period: period(),
        });
        assert_eq!(processed.status_code(), StatusCode::CONFLICT);

        let paid = ApiError::Billing(BillingError::AlreadyPaid {
            charge_id: Uuid::nil(),
        });
        assert_eq!(paid.status_code(), StatusCode::CONFLICT);

        let exists = ApiError::Billing(BillingError::AlreadyExists {
            period: period(),
            member_id: Uuid::nil(),
            membership_id: Uuid::nil(),
        });
        assert_eq!(exists.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_outage_hides_detail() {
        let err = ApiError::Billing(BillingError::Store(StoreError::Unavailable(
            "connection reset by peer at 10.0.0.3".to_string(),
        )));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.safe_message(), "storage temporarily unavailable");
    }

    #[test]
    fn unknown_gym_is_not_found() {
        let err = ApiError::Billing(BillingError::Store(StoreError::UnknownGym(Uuid::nil())));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
