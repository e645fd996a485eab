use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Every failure a marketplace command can return.
///
/// Commands recover these at their own boundary: a returned error means the
/// command left no partial mutation behind (cart checkout fan-out excepted).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarketError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} {id} is {from}, cannot {action}")]
    InvalidTransition {
        kind: &'static str,
        id: String,
        from: String,
        action: &'static str,
    },
    #[error("Subscription for store {store_id} expired on {end_date}")]
    SubscriptionExpired {
        store_id: String,
        end_date: DateTime<Utc>,
    },
    #[error("Subscription for store {store_id} is awaiting payment")]
    SubscriptionPendingPayment { store_id: String },
    #[error("Store {store_id} is suspended")]
    StoreSuspended { store_id: String },
    #[error("Invalid quantity {requested}: {reason}")]
    InvalidQuantity { requested: u32, reason: String },
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: u32,
        requested: u32,
    },
    #[error("Quantity {requested} for {product_id} is below the minimum wholesale order of {minimum}")]
    BelowMinimumOrder {
        product_id: String,
        minimum: u32,
        requested: u32,
    },
    #[error("Invalid {field}: {reason}")]
    InvalidPrice { field: &'static str, reason: String },
    #[error("Order {order_id} already has a shipping request")]
    DuplicateShippingRequest { order_id: String },
    #[error("Shipping request {request_id} was already accepted by {transport_store_id}")]
    AlreadyAccepted {
        request_id: String,
        transport_store_id: String,
    },
    #[error("Cart for store {buyer_store_id} is empty")]
    EmptyCart { buyer_store_id: String },
    #[error("Store {store_id} is not permitted to {action}")]
    PermissionDenied { store_id: String, action: &'static str },
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
    #[error("User {user_id} already owns the maximum of {max} stores")]
    StoreLimitReached { user_id: String, max: usize },
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl MarketError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn denied(store_id: impl Into<String>, action: &'static str) -> Self {
        Self::PermissionDenied {
            store_id: store_id.into(),
            action,
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "is required".to_string(),
        }
    }

    /// True for the denials the entitlement gate produces.
    pub fn is_entitlement_denial(&self) -> bool {
        matches!(
            self,
            Self::SubscriptionExpired { .. }
                | Self::SubscriptionPendingPayment { .. }
                | Self::StoreSuspended { .. }
        )
    }
}

impl From<FrameworkError> for MarketError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound { kind, id } => Self::NotFound { kind, id },
            FrameworkError::Conflict { kind, existing } => Self::Duplicate {
                field: kind.to_string(),
                value: existing,
            },
            FrameworkError::LimitReached { kind, limit } => Self::Validation {
                field: kind,
                reason: format!("limit of {limit} reached"),
            },
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                Self::ActorCommunication(err.to_string())
            }
        }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
