/// Stock changes for Product entities.
///
/// Stock is only ever changed by the owning seller. Orders never touch it.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Replace the stock level with an absolute quantity.
    SetStock(u32),
    /// Remove a quantity from stock.
    ///
    /// # Errors
    /// Will fail if the requested amount exceeds available stock.
    DecrementStock(u32),
}
