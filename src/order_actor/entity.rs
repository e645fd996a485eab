use crate::actor_framework::Entity;
use crate::domain::{Order, OrderCreate, OrderStatus};
use crate::error::MarketError;

use super::actions::OrderAction;

impl Entity for Order {
    type Id = String;
    type CreatePayload = OrderCreate;
    type Patch = (); // Orders are immutable apart from status
    type Action = OrderAction;
    type ActionResult = Order;
    type Error = MarketError;

    const KIND: &'static str = "Order";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order from creation parameters.
    ///
    /// # Notes
    /// The order is initialized with status `Pending`. Prices arrive already
    /// resolved and are never recomputed.
    fn from_create(id: String, params: OrderCreate) -> Result<Self, MarketError> {
        Ok(Self {
            id,
            product_id: params.product_id,
            buyer_store_id: params.buyer_store_id,
            seller_store_id: params.seller_store_id,
            order_type: params.order_type,
            quantity: params.quantity,
            unit_price: params.unit_price,
            total_price: params.total_price,
            status: OrderStatus::Pending,
            batch_id: params.batch_id,
            fulfilment: params.fulfilment,
            notes: params.notes,
            created_at: params.created_at,
        })
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), MarketError> {
        Ok(())
    }

    /// # Errors
    /// `InvalidTransition` for any move the state machine does not allow,
    /// including every move out of `Completed` or `Cancelled`.
    fn handle_action(&mut self, action: OrderAction) -> Result<Order, MarketError> {
        let next = match (self.status, action) {
            (OrderStatus::Pending, OrderAction::Confirm) => OrderStatus::Confirmed,
            (OrderStatus::Pending | OrderStatus::Confirmed, OrderAction::Cancel) => OrderStatus::Cancelled,
            (OrderStatus::Confirmed, OrderAction::Complete) => OrderStatus::Completed,
            (from, action) => {
                return Err(MarketError::InvalidTransition {
                    kind: Self::KIND,
                    id: self.id.clone(),
                    from: from.to_string(),
                    action: action.verb(),
                })
            }
        };
        self.status = next;
        Ok(self.clone())
    }
}
