use tracing::{info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{cascade, EntitlementClient, Repositories};
use crate::domain::{NewProduct, Operation, Order, Product, ProductCreate, ProductPatch, ShippingRequest};
use crate::error::{MarketError, MarketResult};
use crate::product_actor::ProductAction;

/// Client for the Product actor.
///
/// Every mutation is gated on the acting store's entitlement and on that
/// store owning the product.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
    orders: ResourceClient<Order>,
    shipping: ResourceClient<ShippingRequest>,
    entitlement: EntitlementClient,
}

impl ProductClient {
    pub fn new(repositories: &Repositories, entitlement: EntitlementClient) -> Self {
        Self {
            inner: repositories.products.clone(),
            orders: repositories.orders.clone(),
            shipping: repositories.shipping.clone(),
            entitlement,
        }
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn add_product(&self, store_id: &str, product: NewProduct) -> MarketResult<Product> {
        let store = self.entitlement.guard(store_id, Operation::AddProduct).await?;
        if !store.policy().can_sell {
            warn!(store_type = %store.store_type, "Store cannot sell");
            return Err(MarketError::denied(store.id, Operation::AddProduct.as_str()));
        }
        let created = self
            .inner
            .create(ProductCreate {
                store_id: store.id,
                product,
                date_added: self.entitlement.now(),
            })
            .await?;
        info!(product_id = %created.id, "Product listed");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_products_by_store(&self, store_id: &str) -> MarketResult<Vec<Product>> {
        let id = store_id.to_string();
        self.inner.list(move |p: &Product| p.store_id == id).await
    }

    /// Products with stock on hand in a category, across every seller.
    #[instrument(skip(self))]
    pub async fn list_products_in_category(&self, category: &str) -> MarketResult<Vec<Product>> {
        let category = category.to_string();
        self.inner
            .list(move |p: &Product| p.stock_quantity > 0 && p.category.eq_ignore_ascii_case(&category))
            .await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        product_id: &str,
        store_id: &str,
        patch: ProductPatch,
    ) -> MarketResult<Product> {
        self.owned(product_id, store_id, Operation::UpdateProduct).await?;
        self.inner.update(product_id.to_string(), patch).await
    }

    /// Sets stock to an absolute quantity.
    #[instrument(skip(self))]
    pub async fn set_stock(&self, product_id: &str, store_id: &str, quantity: u32) -> MarketResult<Product> {
        self.owned(product_id, store_id, Operation::SetStock).await?;
        self.inner
            .perform_action(product_id.to_string(), ProductAction::SetStock(quantity))
            .await
    }

    /// Removes `quantity` from stock. Sellers call this when goods leave;
    /// order placement never does.
    #[instrument(skip(self))]
    pub async fn decrement_stock(&self, product_id: &str, store_id: &str, quantity: u32) -> MarketResult<Product> {
        self.owned(product_id, store_id, Operation::DecrementStock).await?;
        self.inner
            .perform_action(product_id.to_string(), ProductAction::DecrementStock(quantity))
            .await
    }

    /// Deletes a product along with its orders and their shipping requests.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: &str, store_id: &str) -> MarketResult<Product> {
        self.owned(product_id, store_id, Operation::DeleteProduct).await?;
        let id = product_id.to_string();
        let orders = cascade::purge_orders(&self.orders, &self.shipping, move |o: &Order| o.product_id == id).await?;
        let removed = self.inner.delete(product_id.to_string()).await?;
        info!(orders_removed = orders.len(), "Product deleted");
        Ok(removed)
    }

    async fn owned(&self, product_id: &str, store_id: &str, operation: Operation) -> MarketResult<Product> {
        self.entitlement.guard(store_id, operation).await?;
        let product = self.inner.require(product_id.to_string()).await?;
        if product.store_id != store_id {
            warn!(owner = %product.store_id, "Product belongs to another store");
            return Err(MarketError::denied(store_id, operation.as_str()));
        }
        Ok(product)
    }
}

impl_client_methods!(ProductClient, Product, product);
