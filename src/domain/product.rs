use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Money, OrderType};

/// A sellable catalog line, owned by exactly one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub wholesale_price: Money,
    pub retail_price: Money,
    /// Applies to wholesale orders only.
    pub minimum_order_quantity: u32,
    /// Kilograms on hand.
    pub stock_quantity: u32,
    pub photos: Vec<String>,
    pub date_added: DateTime<Utc>,
}

impl Product {
    pub const fn unit_price(&self, order_type: OrderType) -> Money {
        match order_type {
            OrderType::Wholesale => self.wholesale_price,
            OrderType::Retail => self.retail_price,
        }
    }

    /// Unit and total price for `quantity`; `None` when the total overflows.
    pub fn quote(&self, order_type: OrderType, quantity: u32) -> Option<(Money, Money)> {
        let unit = self.unit_price(order_type);
        unit.checked_times(quantity).map(|total| (unit, total))
    }
}

/// What a seller supplies to list produce.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub wholesale_price: Money,
    pub retail_price: Money,
    pub minimum_order_quantity: u32,
    pub stock_quantity: u32,
    pub photos: Vec<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, wholesale_price: Money, retail_price: Money) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: String::new(),
            location: String::new(),
            wholesale_price,
            retail_price,
            minimum_order_quantity: 1,
            stock_quantity: 0,
            photos: Vec::new(),
        }
    }

    pub fn with_stock(mut self, stock_quantity: u32) -> Self {
        self.stock_quantity = stock_quantity;
        self
    }

    pub fn with_minimum_order(mut self, minimum_order_quantity: u32) -> Self {
        self.minimum_order_quantity = minimum_order_quantity;
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub store_id: String,
    pub product: NewProduct,
    pub date_added: DateTime<Utc>,
}

/// Price and description edits. Stock has its own absolute-set action.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub wholesale_price: Option<Money>,
    pub retail_price: Option<Money>,
    pub minimum_order_quantity: Option<u32>,
    pub photos: Option<Vec<String>>,
}
