use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Money;

/// The transporter and price fixed when a request is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub transport_store_id: String,
    pub delivery_price: Money,
}

/// ```text
/// Waiting --accept--> Accepted --start_transit--> OnWay --mark_delivered--> Delivered
/// Waiting --reject--> Rejected
/// ```
///
/// Only the variants past acceptance carry an [`Assignment`], so a waiting
/// request with a transporter cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ShippingStatus {
    Waiting,
    Accepted(Assignment),
    OnWay(Assignment),
    Delivered(Assignment),
    Rejected,
}

impl ShippingStatus {
    pub const fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Accepted(a) | Self::OnWay(a) | Self::Delivered(a) => Some(a),
            Self::Waiting | Self::Rejected => None,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered(_) | Self::Rejected)
    }

    /// Waiting, accepted or on the way.
    pub const fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Accepted(_) => "Accepted",
            Self::OnWay(_) => "OnWay",
            Self::Delivered(_) => "Delivered",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The delivery need for exactly one confirmed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRequest {
    pub id: String,
    pub order_id: String,
    pub pickup_address: String,
    pub delivery_address: String,
    pub status: ShippingStatus,
    pub created_at: DateTime<Utc>,
}

impl ShippingRequest {
    pub fn transport_store_id(&self) -> Option<&str> {
        self.status.assignment().map(|a| a.transport_store_id.as_str())
    }

    pub fn delivery_price(&self) -> Option<Money> {
        self.status.assignment().map(|a| a.delivery_price)
    }
}

#[derive(Debug, Clone)]
pub struct ShippingCreate {
    pub order_id: String,
    pub pickup_address: String,
    pub delivery_address: String,
    pub created_at: DateTime<Utc>,
}
