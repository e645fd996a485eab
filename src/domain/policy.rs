//! Role policy table: what each store type may do, in one place.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{OrderType, StoreType};

/// Capabilities granted to a store by its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePolicy {
    pub can_sell: bool,
    pub can_buy: bool,
    pub can_transport: bool,
    /// Never gated by the subscription check.
    pub entitlement_exempt: bool,
    /// Pricing applied when this store places an order.
    pub order_type: OrderType,
}

impl RolePolicy {
    pub const fn for_store_type(store_type: StoreType) -> Self {
        match store_type {
            StoreType::Farmer => Self {
                can_sell: true,
                can_buy: false,
                can_transport: false,
                entitlement_exempt: false,
                order_type: OrderType::Retail,
            },
            StoreType::Wholesaler => Self {
                can_sell: false,
                can_buy: true,
                can_transport: false,
                entitlement_exempt: false,
                order_type: OrderType::Wholesale,
            },
            StoreType::Retailer => Self {
                can_sell: true,
                can_buy: true,
                can_transport: false,
                entitlement_exempt: false,
                order_type: OrderType::Retail,
            },
            StoreType::Transport => Self {
                can_sell: false,
                can_buy: false,
                can_transport: true,
                entitlement_exempt: false,
                order_type: OrderType::Retail,
            },
            StoreType::Admin => Self {
                can_sell: false,
                can_buy: false,
                can_transport: false,
                entitlement_exempt: true,
                order_type: OrderType::Retail,
            },
        }
    }
}

/// Mutating operations that pass through the entitlement gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AddProduct,
    UpdateProduct,
    SetStock,
    DecrementStock,
    DeleteProduct,
    Checkout,
    CreateOrder,
    ConfirmOrder,
    CancelOrder,
    CompleteOrder,
    CreateShippingRequest,
    AcceptShippingRequest,
    RejectShippingRequest,
    StartTransit,
    MarkDelivered,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddProduct => "add_product",
            Self::UpdateProduct => "update_product",
            Self::SetStock => "set_stock",
            Self::DecrementStock => "decrement_stock",
            Self::DeleteProduct => "delete_product",
            Self::Checkout => "checkout",
            Self::CreateOrder => "create_order",
            Self::ConfirmOrder => "confirm_order",
            Self::CancelOrder => "cancel_order",
            Self::CompleteOrder => "complete_order",
            Self::CreateShippingRequest => "create_shipping_request",
            Self::AcceptShippingRequest => "accept_shipping_request",
            Self::RejectShippingRequest => "reject_shipping_request",
            Self::StartTransit => "start_transit",
            Self::MarkDelivered => "mark_delivered",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
