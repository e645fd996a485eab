//! Transient buyer cart. Never persisted; one per buyer store session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
}

/// Product/quantity selection prior to checkout.
///
/// Invariants:
/// - at most one line per product
/// - every line has `quantity > 0`
/// - a line never exceeds the stock known when it was last written
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.position(product_id)
            .map_or(0, |i| self.lines[i].quantity)
    }

    /// Adds to any existing line, capped at `stock`. Returns the line's
    /// resulting quantity; zero means the product is not in the cart.
    pub fn add(&mut self, product_id: &str, requested: u32, stock: u32) -> u32 {
        let combined = self.quantity_of(product_id).saturating_add(requested);
        self.set_quantity(product_id, combined, stock)
    }

    /// Replaces the line's quantity, capped at `stock`. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: &str, requested: u32, stock: u32) -> u32 {
        let quantity = requested.min(stock);
        match (self.position(product_id), quantity) {
            (Some(i), 0) => {
                self.lines.remove(i);
            }
            (Some(i), q) => self.lines[i].quantity = q,
            (None, 0) => {}
            (None, q) => self.lines.push(CartLine {
                product_id: product_id.to_string(),
                quantity: q,
            }),
        }
        quantity
    }

    pub fn remove(&mut self, product_id: &str) -> Option<CartLine> {
        self.position(product_id).map(|i| self.lines.remove(i))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id == product_id)
    }
}
