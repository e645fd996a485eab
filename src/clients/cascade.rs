use std::collections::HashSet;

use tracing::debug;

use crate::actor_framework::ResourceClient;
use crate::domain::{Order, ShippingRequest};
use crate::error::MarketResult;

/// Deletes the matching orders together with their shipping requests.
pub(crate) async fn purge_orders(
    orders: &ResourceClient<Order>,
    shipping: &ResourceClient<ShippingRequest>,
    filter: impl Fn(&Order) -> bool + Send + 'static,
) -> MarketResult<Vec<Order>> {
    let removed = orders.delete_where(filter).await?;
    if removed.is_empty() {
        return Ok(removed);
    }
    let ids: HashSet<String> = removed.iter().map(|o| o.id.clone()).collect();
    let dropped = shipping
        .delete_where(move |r: &ShippingRequest| ids.contains(&r.order_id))
        .await?;
    debug!(orders = removed.len(), shipping_requests = dropped.len(), "Cascade delete");
    Ok(removed)
}
