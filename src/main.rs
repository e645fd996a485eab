use mockable::DefaultEnv;
use tracing::{error, info, Instrument};

use souk_market::app_system::{setup_tracing, MarketConfig, MarketSystem};
use souk_market::domain::{
    FulfilmentDetails, Money, NewProduct, NewStore, PaymentMethod, PlanId, StoreType, UserRegistration,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = MarketConfig::from_env(&DefaultEnv::new())?;

    // Setup tracing once for the entire application
    setup_tracing(&config.log_filter);

    info!("Starting marketplace demo");
    let system = MarketSystem::new(&config);

    let span = tracing::info_span!("onboarding");
    let (farm, wholesaler, trucks) = async {
        let farmer = system
            .users
            .register_user(UserRegistration::new("Rachid Benali", "rachid@souk.dz").with_country("DZ"))
            .await?;
        let buyer = system
            .users
            .register_user(UserRegistration::new("Samia Oukaci", "samia@souk.dz").with_country("DZ"))
            .await?;
        let driver = system
            .users
            .register_user(UserRegistration::new("Hakim Zerrouki", "hakim@souk.dz").with_country("DZ"))
            .await?;

        let farm = system
            .stores
            .create_store(
                &farmer.id,
                NewStore::new("Ferme Benali", StoreType::Farmer).located("Douar Ouled Aissa", "Boumerdes"),
            )
            .await?;
        let wholesaler = system
            .stores
            .create_store(
                &buyer.id,
                NewStore::new("Oukaci Gros", StoreType::Wholesaler).located("Marché de gros", "Alger"),
            )
            .await?;
        let trucks = system
            .stores
            .create_store(&driver.id, NewStore::new("Zerrouki Transport", StoreType::Transport))
            .await?;
        Ok::<_, souk_market::error::MarketError>((farm, wholesaler, trucks))
    }
    .instrument(span)
    .await?;

    for plan in system.subscriptions.list_plans() {
        info!(plan = %plan.id, price = %plan.price, days = plan.duration_days, "Plan available");
    }
    system.subscriptions.select_plan(&farm.id, PlanId::Plan6M).await?;

    let tomatoes = system
        .products
        .add_product(
            &farm.id,
            NewProduct::new("Tomatoes", Money::from_dinars(70), Money::from_dinars(110))
                .with_minimum_order(100)
                .with_stock(2_000)
                .in_category("vegetables"),
        )
        .await?;

    let span = tracing::info_span!("checkout");
    let receipt = async {
        let mut cart = system.open_cart(&wholesaler.id);
        cart.add(&tomatoes.id, 500).await?;
        cart.checkout(FulfilmentDetails {
            customer_name: "Samia Oukaci".into(),
            customer_phone: "0661 00 00 00".into(),
            wilaya: "Alger".into(),
            address: "Marché de gros, Eucalyptus".into(),
            payment_method: PaymentMethod::BaridiMob,
        })
        .await
    }
    .instrument(span)
    .await?;

    match receipt.total() {
        Some(total) => info!(batch_id = %receipt.batch_id, total = %total, "Checkout complete"),
        None => error!(batch_id = %receipt.batch_id, "Checkout total overflowed"),
    }
    for order in &receipt.orders {
        info!(order_id = %order.id, total = %order.total_price, "Order placed");
        system.orders.confirm_order(&order.id, &farm.id).await?;

        let request = system
            .shipping
            .create_shipping_request(&order.id, &wholesaler.id, &farm.address, &order.fulfilment.address)
            .await?;
        system
            .shipping
            .accept_shipping_request(&request.id, &trucks.id, Money::from_dinars(2_500))
            .await?;
        system.shipping.start_transit(&request.id, &trucks.id).await?;
        system.shipping.mark_delivered(&request.id, &trucks.id).await?;

        let order = system.orders.get_order(&order.id).await?;
        info!(order_id = %order.id, status = %order.status, "Order settled");
    }
    for failure in &receipt.failures {
        error!(product_id = %failure.line.product_id, error = %failure.error, "Cart line failed");
    }

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
