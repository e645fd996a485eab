use tracing::{error, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{EntitlementClient, ProductClient, Repositories};
use crate::domain::{
    Operation, Order, OrderCreate, OrderStatus, OrderType, PlaceOrder, ShippingRequest,
};
use crate::error::{MarketError, MarketResult};
use crate::order_actor::OrderAction;

/// Context shared by the orders of one cart checkout.
#[derive(Debug, Clone)]
pub(crate) struct Batch {
    pub id: String,
    pub order_type: OrderType,
}

/// Client for interacting with the Order actor.
///
/// This client handles the orchestration: entitlement, role and stock checks
/// against the current product before an order is written.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    shipping: ResourceClient<ShippingRequest>,
    products: ProductClient,
    entitlement: EntitlementClient,
}

impl OrderClient {
    pub fn new(repositories: &Repositories, products: ProductClient, entitlement: EntitlementClient) -> Self {
        Self {
            inner: repositories.orders.clone(),
            shipping: repositories.shipping.clone(),
            products,
            entitlement,
        }
    }

    /// Places a single order at the current product price.
    #[instrument(
        skip(self, request),
        fields(buyer = %request.buyer_store_id, product_id = %request.product_id, quantity = request.quantity)
    )]
    pub async fn create_order(&self, request: PlaceOrder) -> MarketResult<Order> {
        self.place(request, None).await
    }

    pub(crate) async fn place(&self, request: PlaceOrder, batch: Option<Batch>) -> MarketResult<Order> {
        info!("Processing create_order request");

        // Step 1: Entitlement and role
        let buyer = self.entitlement.guard(&request.buyer_store_id, Operation::CreateOrder).await?;
        let policy = buyer.policy();
        if !policy.can_buy {
            warn!(store_type = %buyer.store_type, "Store cannot buy");
            return Err(MarketError::denied(buyer.id, Operation::CreateOrder.as_str()));
        }
        if request.quantity == 0 {
            return Err(MarketError::InvalidQuantity {
                requested: 0,
                reason: "must be positive".to_string(),
            });
        }

        // Step 2: Validate product
        let product = self.products.get_product(&request.product_id).await.map_err(|e| {
            error!(error = %e, "Product validation failed");
            e
        })?;
        if product.store_id == buyer.id {
            return Err(MarketError::denied(buyer.id, "order its own product"));
        }

        // Step 3: Quantity rules, re-checked against current stock
        let order_type = batch.as_ref().map_or(policy.order_type, |b| b.order_type);
        if order_type == OrderType::Wholesale && request.quantity < product.minimum_order_quantity {
            return Err(MarketError::BelowMinimumOrder {
                product_id: product.id,
                minimum: product.minimum_order_quantity,
                requested: request.quantity,
            });
        }
        if request.quantity > product.stock_quantity {
            return Err(MarketError::InsufficientStock {
                product_id: product.id,
                available: product.stock_quantity,
                requested: request.quantity,
            });
        }
        let (unit_price, total_price) =
            product
                .quote(order_type, request.quantity)
                .ok_or_else(|| MarketError::InvalidQuantity {
                    requested: request.quantity,
                    reason: "total price out of range".to_string(),
                })?;

        // Step 4: Create order in ResourceActor
        let payload = OrderCreate {
            product_id: product.id,
            buyer_store_id: buyer.id,
            seller_store_id: product.store_id,
            order_type,
            quantity: request.quantity,
            unit_price,
            total_price,
            batch_id: batch.map(|b| b.id),
            fulfilment: request.fulfilment,
            notes: request.notes,
            created_at: self.entitlement.now(),
        };
        let order = self.inner.create(payload).await?;
        info!(order_id = %order.id, total = %order.total_price, "Order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn confirm_order(&self, order_id: &str, seller_store_id: &str) -> MarketResult<Order> {
        self.transition(order_id, seller_store_id, OrderAction::Confirm, Operation::ConfirmOrder)
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &str, seller_store_id: &str) -> MarketResult<Order> {
        self.transition(order_id, seller_store_id, OrderAction::Cancel, Operation::CancelOrder)
            .await
    }

    /// Completes a confirmed order by hand. Refused while a shipping request
    /// for it is still moving; delivery completes those orders itself.
    #[instrument(skip(self))]
    pub async fn complete_order(&self, order_id: &str, seller_store_id: &str) -> MarketResult<Order> {
        self.transition(order_id, seller_store_id, OrderAction::Complete, Operation::CompleteOrder)
            .await
    }

    /// Completion triggered by a delivered shipment. The transporter has
    /// already passed the gate, so the seller's entitlement is not checked.
    pub(crate) async fn complete_after_delivery(&self, order_id: &str) -> MarketResult<Order> {
        self.inner
            .perform_action(order_id.to_string(), OrderAction::Complete)
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_orders_for_buyer(&self, buyer_store_id: &str) -> MarketResult<Vec<Order>> {
        let id = buyer_store_id.to_string();
        self.inner.list(move |o: &Order| o.buyer_store_id == id).await
    }

    #[instrument(skip(self))]
    pub async fn list_orders_for_seller(&self, seller_store_id: &str) -> MarketResult<Vec<Order>> {
        let id = seller_store_id.to_string();
        self.inner.list(move |o: &Order| o.seller_store_id == id).await
    }

    #[instrument(skip(self))]
    pub async fn list_orders_by_status(&self, status: OrderStatus) -> MarketResult<Vec<Order>> {
        self.inner.list(move |o: &Order| o.status == status).await
    }

    /// Orders created by one checkout.
    #[instrument(skip(self))]
    pub async fn list_orders_by_batch(&self, batch_id: &str) -> MarketResult<Vec<Order>> {
        let id = batch_id.to_string();
        self.inner
            .list(move |o: &Order| o.batch_id.as_deref() == Some(id.as_str()))
            .await
    }

    async fn transition(
        &self,
        order_id: &str,
        seller_store_id: &str,
        action: OrderAction,
        operation: Operation,
    ) -> MarketResult<Order> {
        self.entitlement.guard(seller_store_id, operation).await?;
        let order = self.inner.require(order_id.to_string()).await?;
        if order.seller_store_id != seller_store_id {
            warn!(seller = %order.seller_store_id, "Order belongs to another seller");
            return Err(MarketError::denied(seller_store_id, operation.as_str()));
        }

        // A shipment in flight still needs its order open and uncompleted.
        if matches!(action, OrderAction::Complete | OrderAction::Cancel) {
            let id = order.id.clone();
            let in_flight = self
                .shipping
                .list(move |r: &ShippingRequest| r.order_id == id && r.status.is_in_flight())
                .await?;
            if let Some(request) = in_flight.first() {
                warn!(shipping_status = %request.status, "Shipment still in flight");
                return Err(MarketError::InvalidTransition {
                    kind: "Order",
                    id: order.id,
                    from: order.status.to_string(),
                    action: match action {
                        OrderAction::Cancel => "cancel while its shipment is in flight",
                        _ => "complete while its shipment is in flight",
                    },
                });
            }
        }

        let updated = self
            .inner
            .perform_action(order.id, action)
            .await
            .map_err(|e| {
                warn!(error = %e, "Order transition rejected");
                e
            })?;
        info!(status = %updated.status, "Order transitioned");
        Ok(updated)
    }
}

impl_client_methods!(OrderClient, Order, order);
