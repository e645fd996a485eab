use futures::future::join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::clients::order_client::Batch;
use crate::clients::{EntitlementClient, OrderClient, ProductClient};
use crate::domain::{Cart, CartLine, FulfilmentDetails, Money, Operation, Order, PlaceOrder};
use crate::error::{MarketError, MarketResult};

/// A cart line that did not become an order. It stays in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedLine {
    pub line: CartLine,
    pub error: MarketError,
}

/// Outcome of a checkout. Lines succeed or fail independently.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub batch_id: String,
    pub orders: Vec<Order>,
    pub failures: Vec<FailedLine>,
}

impl CheckoutReceipt {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sum of the frozen totals of every order created, `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        self.orders
            .iter()
            .try_fold(Money::default(), |sum, order| sum.checked_add(order.total_price))
    }
}

/// One buyer store's cart plus the clients needed to check it out.
///
/// The cart lives only as long as the session.
pub struct CartSession {
    buyer_store_id: String,
    cart: Cart,
    products: ProductClient,
    orders: OrderClient,
    entitlement: EntitlementClient,
}

impl CartSession {
    pub fn new(
        buyer_store_id: impl Into<String>,
        products: ProductClient,
        orders: OrderClient,
        entitlement: EntitlementClient,
    ) -> Self {
        Self {
            buyer_store_id: buyer_store_id.into(),
            cart: Cart::new(),
            products,
            orders,
            entitlement,
        }
    }

    pub fn buyer_store_id(&self) -> &str {
        &self.buyer_store_id
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Adds to the product's line, clamped to current stock. Returns the
    /// line's quantity afterwards.
    #[instrument(skip(self), fields(buyer = %self.buyer_store_id))]
    pub async fn add(&mut self, product_id: &str, quantity: u32) -> MarketResult<u32> {
        if quantity == 0 {
            return Err(MarketError::InvalidQuantity {
                requested: 0,
                reason: "must be positive".to_string(),
            });
        }
        let product = self.products.get_product(product_id).await?;
        let wanted = self.cart.quantity_of(product_id).saturating_add(quantity);
        let held = self.cart.add(product_id, quantity, product.stock_quantity);
        if held < wanted {
            debug!(wanted, held, "Clamped to stock");
        }
        Ok(held)
    }

    /// Replaces the product's line, clamped to current stock. Zero removes it.
    #[instrument(skip(self), fields(buyer = %self.buyer_store_id))]
    pub async fn set_quantity(&mut self, product_id: &str, quantity: u32) -> MarketResult<u32> {
        if quantity == 0 {
            self.cart.remove(product_id);
            return Ok(0);
        }
        let product = self.products.get_product(product_id).await?;
        Ok(self.cart.set_quantity(product_id, quantity, product.stock_quantity))
    }

    pub fn remove(&mut self, product_id: &str) -> Option<CartLine> {
        self.cart.remove(product_id)
    }

    pub fn clear(&mut self) {
        self.cart.clear();
    }

    /// Turns every line into an order sharing one batch id.
    ///
    /// Lines are placed concurrently and independently: each is re-checked
    /// against current stock, and one failing does not undo the others.
    /// Successful lines leave the cart, failed ones remain for a retry.
    #[instrument(skip(self, fulfilment), fields(buyer = %self.buyer_store_id))]
    pub async fn checkout(&mut self, fulfilment: FulfilmentDetails) -> MarketResult<CheckoutReceipt> {
        if self.cart.is_empty() {
            return Err(MarketError::EmptyCart {
                buyer_store_id: self.buyer_store_id.clone(),
            });
        }
        let buyer = self
            .entitlement
            .guard(&self.buyer_store_id, Operation::Checkout)
            .await?;
        if !buyer.policy().can_buy {
            return Err(MarketError::denied(buyer.id, Operation::Checkout.as_str()));
        }

        let batch = Batch {
            id: Uuid::new_v4().to_string(),
            order_type: buyer.policy().order_type,
        };
        let lines = self.cart.lines().to_vec();
        info!(batch_id = %batch.id, lines = lines.len(), "Checking out");

        let attempts = lines.iter().map(|line| {
            let request = PlaceOrder {
                buyer_store_id: self.buyer_store_id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                fulfilment: fulfilment.clone(),
                notes: String::new(),
            };
            self.orders.place(request, Some(batch.clone()))
        });
        let results = join_all(attempts).await;

        let mut receipt = CheckoutReceipt {
            batch_id: batch.id,
            orders: Vec::new(),
            failures: Vec::new(),
        };
        for (line, result) in lines.into_iter().zip(results) {
            match result {
                Ok(order) => {
                    self.cart.remove(&line.product_id);
                    receipt.orders.push(order);
                }
                Err(error) => {
                    warn!(product_id = %line.product_id, error = %error, "Cart line failed");
                    receipt.failures.push(FailedLine { line, error });
                }
            }
        }

        if receipt.is_complete() {
            info!(orders = receipt.orders.len(), "Checkout complete");
        } else {
            warn!(
                orders = receipt.orders.len(),
                failures = receipt.failures.len(),
                "Checkout partially failed"
            );
        }
        Ok(receipt)
    }
}
