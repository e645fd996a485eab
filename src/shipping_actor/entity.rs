use crate::actor_framework::Entity;
use crate::domain::{Assignment, ShippingCreate, ShippingRequest, ShippingStatus};
use crate::error::MarketError;

use super::actions::ShippingAction;

impl Entity for ShippingRequest {
    type Id = String;
    type CreatePayload = ShippingCreate;
    type Patch = ();
    type Action = ShippingAction;
    type ActionResult = ShippingRequest;
    type Error = MarketError;

    const KIND: &'static str = "ShippingRequest";

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create(id: String, params: ShippingCreate) -> Result<Self, MarketError> {
        if params.pickup_address.trim().is_empty() {
            return Err(MarketError::required("pickup_address"));
        }
        if params.delivery_address.trim().is_empty() {
            return Err(MarketError::required("delivery_address"));
        }
        Ok(Self {
            id,
            order_id: params.order_id,
            pickup_address: params.pickup_address,
            delivery_address: params.delivery_address,
            status: ShippingStatus::Waiting,
            created_at: params.created_at,
        })
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), MarketError> {
        Ok(())
    }

    /// Handles shipping transitions.
    ///
    /// # Errors
    /// - `AlreadyAccepted` when accepting a request another transporter holds
    /// - `PermissionDenied` when someone other than the assigned transporter
    ///   moves an accepted request
    /// - `InvalidPrice` for a non-positive delivery price
    /// - `InvalidTransition` for everything else outside the state machine
    fn handle_action(&mut self, action: ShippingAction) -> Result<ShippingRequest, MarketError> {
        let next = match (&self.status, action) {
            (ShippingStatus::Waiting, ShippingAction::Accept(assignment)) => {
                if !assignment.delivery_price.is_positive() {
                    return Err(MarketError::InvalidPrice {
                        field: "delivery_price",
                        reason: format!("must be greater than zero, got {}", assignment.delivery_price),
                    });
                }
                ShippingStatus::Accepted(assignment)
            }
            (ShippingStatus::Accepted(held) | ShippingStatus::OnWay(held), ShippingAction::Accept(_)) => {
                return Err(MarketError::AlreadyAccepted {
                    request_id: self.id.clone(),
                    transport_store_id: held.transport_store_id.clone(),
                });
            }
            (ShippingStatus::Waiting, ShippingAction::Reject) => ShippingStatus::Rejected,
            (ShippingStatus::Accepted(held), ShippingAction::StartTransit { by }) => {
                ShippingStatus::OnWay(self.assigned_to(held, &by, "start transit")?)
            }
            (ShippingStatus::OnWay(held), ShippingAction::MarkDelivered { by }) => {
                ShippingStatus::Delivered(self.assigned_to(held, &by, "mark delivered")?)
            }
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

impl ShippingRequest {
    fn assigned_to(&self, held: &Assignment, by: &str, action: &'static str) -> Result<Assignment, MarketError> {
        if held.transport_store_id == by {
            Ok(held.clone())
        } else {
            Err(MarketError::denied(by, action))
        }
    }
}
