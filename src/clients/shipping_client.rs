use tracing::{info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{EntitlementClient, OrderClient, Repositories};
use crate::domain::{
    Assignment, Money, Operation, OrderStatus, ShippingCreate, ShippingRequest, ShippingStatus, StoreType,
};
use crate::error::{MarketError, MarketResult};
use crate::shipping_actor::ShippingAction;

/// Client for the ShippingRequest actor.
///
/// Exclusivity of acceptance comes from the actor: concurrent `accept`
/// calls are applied one after the other and only the first finds the
/// request waiting.
#[derive(Clone)]
pub struct ShippingClient {
    inner: ResourceClient<ShippingRequest>,
    orders: OrderClient,
    entitlement: EntitlementClient,
}

impl ShippingClient {
    pub fn new(repositories: &Repositories, orders: OrderClient, entitlement: EntitlementClient) -> Self {
        Self {
            inner: repositories.shipping.clone(),
            orders,
            entitlement,
        }
    }

    /// Opens the shipping request for a confirmed order. Only the order's
    /// buyer may do this, once per order.
    #[instrument(skip(self, pickup_address, delivery_address))]
    pub async fn create_shipping_request(
        &self,
        order_id: &str,
        buyer_store_id: &str,
        pickup_address: impl Into<String>,
        delivery_address: impl Into<String>,
    ) -> MarketResult<ShippingRequest> {
        self.entitlement
            .guard(buyer_store_id, Operation::CreateShippingRequest)
            .await?;
        let order = self.orders.get_order(order_id).await?;
        if order.buyer_store_id != buyer_store_id {
            warn!(buyer = %order.buyer_store_id, "Order belongs to another buyer");
            return Err(MarketError::denied(
                buyer_store_id,
                Operation::CreateShippingRequest.as_str(),
            ));
        }
        if order.status != OrderStatus::Confirmed {
            return Err(MarketError::InvalidTransition {
                kind: "Order",
                id: order.id,
                from: order.status.to_string(),
                action: "request shipping",
            });
        }

        let payload = ShippingCreate {
            order_id: order.id.clone(),
            pickup_address: pickup_address.into(),
            delivery_address: delivery_address.into(),
            created_at: self.entitlement.now(),
        };
        let wanted = order.id.clone();
        match self
            .inner
            .create_unique(payload, move |r: &ShippingRequest| r.order_id == wanted)
            .await
        {
            Ok(request) => {
                info!(request_id = %request.id, "Shipping request opened");
                Ok(request)
            }
            Err(MarketError::Duplicate { .. }) => {
                warn!("Order already has a shipping request");
                Err(MarketError::DuplicateShippingRequest { order_id: order.id })
            }
            Err(e) => Err(e),
        }
    }

    /// Claims a waiting request for a transport store at `delivery_price`.
    #[instrument(skip(self))]
    pub async fn accept_shipping_request(
        &self,
        request_id: &str,
        transport_store_id: &str,
        delivery_price: Money,
    ) -> MarketResult<ShippingRequest> {
        let store = self
            .entitlement
            .guard(transport_store_id, Operation::AcceptShippingRequest)
            .await?;
        if !store.policy().can_transport {
            warn!(store_type = %store.store_type, "Store cannot transport");
            return Err(MarketError::denied(
                store.id,
                Operation::AcceptShippingRequest.as_str(),
            ));
        }
        let assignment = Assignment {
            transport_store_id: store.id,
            delivery_price,
        };
        let accepted = self
            .inner
            .perform_action(request_id.to_string(), ShippingAction::Accept(assignment))
            .await
            .map_err(|e| {
                warn!(error = %e, "Acceptance refused");
                e
            })?;
        info!("Shipping request accepted");
        Ok(accepted)
    }

    /// Declines a waiting request. Allowed for the order's buyer and for
    /// admin stores.
    #[instrument(skip(self))]
    pub async fn reject_shipping_request(&self, request_id: &str, store_id: &str) -> MarketResult<ShippingRequest> {
        let store = self
            .entitlement
            .guard(store_id, Operation::RejectShippingRequest)
            .await?;
        let request = self.get_shipping_request(request_id).await?;
        if store.store_type != StoreType::Admin {
            let order = self.orders.get_order(&request.order_id).await?;
            if order.buyer_store_id != store.id {
                return Err(MarketError::denied(
                    store.id,
                    Operation::RejectShippingRequest.as_str(),
                ));
            }
        }
        let rejected = self
            .inner
            .perform_action(request.id, ShippingAction::Reject)
            .await?;
        info!("Shipping request rejected");
        Ok(rejected)
    }

    #[instrument(skip(self))]
    pub async fn start_transit(&self, request_id: &str, transport_store_id: &str) -> MarketResult<ShippingRequest> {
        self.entitlement
            .guard(transport_store_id, Operation::StartTransit)
            .await?;
        let request = self
            .inner
            .perform_action(
                request_id.to_string(),
                ShippingAction::StartTransit {
                    by: transport_store_id.to_string(),
                },
            )
            .await?;
        info!("Shipment on the way");
        Ok(request)
    }

    /// Marks the shipment delivered and completes its order.
    ///
    /// The delivery stands even if the order cannot be completed; that
    /// failure is logged.
    #[instrument(skip(self))]
    pub async fn mark_delivered(&self, request_id: &str, transport_store_id: &str) -> MarketResult<ShippingRequest> {
        self.entitlement
            .guard(transport_store_id, Operation::MarkDelivered)
            .await?;
        let request = self
            .inner
            .perform_action(
                request_id.to_string(),
                ShippingAction::MarkDelivered {
                    by: transport_store_id.to_string(),
                },
            )
            .await?;
        info!("Shipment delivered");

        match self.orders.complete_after_delivery(&request.order_id).await {
            Ok(order) => info!(order_id = %order.id, "Order completed on delivery"),
            Err(e) => warn!(order_id = %request.order_id, error = %e, "Order not completed after delivery"),
        }
        Ok(request)
    }

    /// Requests no transporter has claimed yet.
    #[instrument(skip(self))]
    pub async fn list_waiting_requests(&self) -> MarketResult<Vec<ShippingRequest>> {
        self.inner
            .list(|r: &ShippingRequest| r.status == ShippingStatus::Waiting)
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_requests_for_transporter(
        &self,
        transport_store_id: &str,
    ) -> MarketResult<Vec<ShippingRequest>> {
        let id = transport_store_id.to_string();
        self.inner
            .list(move |r: &ShippingRequest| r.transport_store_id() == Some(id.as_str()))
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_request_for_order(&self, order_id: &str) -> MarketResult<Option<ShippingRequest>> {
        let id = order_id.to_string();
        let mut found = self
            .inner
            .list(move |r: &ShippingRequest| r.order_id == id)
            .await?;
        Ok(found.pop())
    }
}

impl_client_methods!(ShippingClient, ShippingRequest, shipping_request);
