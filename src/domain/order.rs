use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Wholesale,
    Retail,
}

/// ```text
/// Pending --confirm--> Confirmed --complete--> Completed
/// Pending --cancel---> Cancelled
/// Confirmed --cancel--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    BaridiMob,
    Ccp,
}

/// Delivery contact captured at checkout and shared by every order it creates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FulfilmentDetails {
    pub customer_name: String,
    pub customer_phone: String,
    pub wilaya: String,
    pub address: String,
    pub payment_method: PaymentMethod,
}

/// One buyer-to-seller transaction for one product.
///
/// `unit_price` and `total_price` are frozen at creation; later product price
/// edits never reach an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub product_id: String,
    pub buyer_store_id: String,
    pub seller_store_id: String,
    pub order_type: OrderType,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
    pub status: OrderStatus,
    /// Shared by every order created by the same cart checkout.
    pub batch_id: Option<String>,
    pub fulfilment: FulfilmentDetails,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// A buyer's request to order a product directly.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub buyer_store_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub fulfilment: FulfilmentDetails,
    pub notes: String,
}

impl PlaceOrder {
    pub fn new(buyer_store_id: impl Into<String>, product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            buyer_store_id: buyer_store_id.into(),
            product_id: product_id.into(),
            quantity,
            fulfilment: FulfilmentDetails::default(),
            notes: String::new(),
        }
    }

    pub fn with_fulfilment(mut self, fulfilment: FulfilmentDetails) -> Self {
        self.fulfilment = fulfilment;
        self
    }
}

/// Payload for creating a new order, prices already resolved.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub product_id: String,
    pub buyer_store_id: String,
    pub seller_store_id: String,
    pub order_type: OrderType,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
    pub batch_id: Option<String>,
    pub fulfilment: FulfilmentDetails,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}
