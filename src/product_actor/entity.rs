use crate::actor_framework::Entity;
use crate::domain::{Money, Product, ProductCreate, ProductPatch};
use crate::error::MarketError;

use super::actions::ProductAction;

impl Entity for Product {
    type Id = String;
    type CreatePayload = ProductCreate;
    type Patch = ProductPatch;
    type Action = ProductAction;
    type ActionResult = Product;
    type Error = MarketError;

    const KIND: &'static str = "Product";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Product from creation parameters.
    ///
    /// # Arguments
    /// * `id` - Unique identifier for the product
    /// * `params` - Owning store, listing details and the time it was added
    ///
    /// # Errors
    /// Blank names, non-positive prices and a zero minimum order are rejected.
    fn from_create(id: String, params: ProductCreate) -> Result<Self, MarketError> {
        let product = params.product;
        let name = product.name.trim().to_string();
        if name.is_empty() {
            return Err(MarketError::required("name"));
        }
        ensure_positive("wholesale_price", product.wholesale_price)?;
        ensure_positive("retail_price", product.retail_price)?;
        ensure_minimum_order(product.minimum_order_quantity)?;

        Ok(Self {
            id,
            store_id: params.store_id,
            name,
            description: product.description,
            category: product.category,
            location: product.location,
            wholesale_price: product.wholesale_price,
            retail_price: product.retail_price,
            minimum_order_quantity: product.minimum_order_quantity,
            stock_quantity: product.stock_quantity,
            photos: product.photos,
            date_added: params.date_added,
        })
    }

    /// Applies listing edits. Existing orders keep the prices they were
    /// created with.
    fn on_update(&mut self, patch: ProductPatch) -> Result<(), MarketError> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(MarketError::required("name"));
            }
            self.name = name;
        }
        if let Some(price) = patch.wholesale_price {
            ensure_positive("wholesale_price", price)?;
            self.wholesale_price = price;
        }
        if let Some(price) = patch.retail_price {
            ensure_positive("retail_price", price)?;
            self.retail_price = price;
        }
        if let Some(minimum) = patch.minimum_order_quantity {
            ensure_minimum_order(minimum)?;
            self.minimum_order_quantity = minimum;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(photos) = patch.photos {
            self.photos = photos;
        }
        Ok(())
    }

    /// Handles product-specific actions.
    ///
    /// # Actions
    /// - `SetStock(quantity)`: Replaces the stock level
    /// - `DecrementStock(amount)`: Decrements stock by the specified amount
    fn handle_action(&mut self, action: ProductAction) -> Result<Product, MarketError> {
        match action {
            ProductAction::SetStock(quantity) => {
                self.stock_quantity = quantity;
            }
            ProductAction::DecrementStock(0) => {
                return Err(MarketError::InvalidQuantity {
                    requested: 0,
                    reason: "must be positive".to_string(),
                });
            }
            ProductAction::DecrementStock(amount) => {
                self.stock_quantity = self.stock_quantity.checked_sub(amount).ok_or_else(|| {
                    MarketError::InsufficientStock {
                        product_id: self.id.clone(),
                        available: self.stock_quantity,
                        requested: amount,
                    }
                })?;
            }
        }
        Ok(self.clone())
    }
}

fn ensure_positive(field: &'static str, price: Money) -> Result<(), MarketError> {
    if price.is_positive() {
        Ok(())
    } else {
        Err(MarketError::InvalidPrice {
            field,
            reason: format!("must be greater than zero, got {price}"),
        })
    }
}

fn ensure_minimum_order(minimum: u32) -> Result<(), MarketError> {
    if minimum == 0 {
        return Err(MarketError::InvalidQuantity {
            requested: 0,
            reason: "minimum order quantity must be at least 1".to_string(),
        });
    }
    Ok(())
}
