#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use futures::future::join_all;
    use mockable::Clock;

    use crate::app_system::{MarketConfig, MarketSystem};
    use crate::clients::{EntitlementClient, OrderClient, ProductClient, Repositories};
    use crate::domain::{
        FulfilmentDetails, Money, NewProduct, NewStore, Order, OrderStatus, OrderType, PaymentMethod, PlaceOrder,
        PlanId, Product, ShippingStatus, Store, StorePatch, StoreStatus, StoreType, Subscription,
        SubscriptionPatch, SubscriptionStatus, UserRegistration,
    };
    use crate::error::MarketError;
    use crate::mock_framework::{
        answer_list, create_mock_client, expect_action, expect_create, expect_get, expect_list,
    };
    use crate::order_actor::OrderAction;
    use crate::test_support::{fixed_clock, market_open, MutableClock};

    struct Harness {
        system: MarketSystem,
        clock: Arc<MutableClock>,
    }

    fn harness() -> Harness {
        let clock = Arc::new(MutableClock::new(market_open()));
        let system = MarketSystem::with_clock(&MarketConfig::default(), clock.clone());
        Harness { system, clock }
    }

    impl Harness {
        /// Registers a fresh owner and opens one store for them.
        async fn open_store(&self, name: &str, store_type: StoreType) -> Store {
            let email = format!("{}@souk.dz", name.to_lowercase().replace(' ', "."));
            let owner = self
                .system
                .users
                .register_user(UserRegistration::new(name, email))
                .await
                .unwrap();
            self.system
                .stores
                .create_store(&owner.id, NewStore::new(name, store_type).located("Route de Blida", "Blida"))
                .await
                .unwrap()
        }

        async fn list_potatoes(&self, farm: &Store) -> Product {
            let product = NewProduct::new("Potatoes", Money::from_dinars(40), Money::from_dinars(60))
                .with_minimum_order(50)
                .with_stock(1_000)
                .in_category("vegetables");
            self.system.products.add_product(&farm.id, product).await.unwrap()
        }

        async fn confirmed_order(&self, farm: &Store, buyer: &Store, product: &Product, quantity: u32) -> Order {
            let order = self
                .system
                .orders
                .create_order(PlaceOrder::new(&buyer.id, &product.id, quantity))
                .await
                .unwrap();
            self.system.orders.confirm_order(&order.id, &farm.id).await.unwrap()
        }
    }

    fn fulfilment() -> FulfilmentDetails {
        FulfilmentDetails {
            customer_name: "Karim Haddad".into(),
            customer_phone: "0550 12 34 56".into(),
            wilaya: "Alger".into(),
            address: "12 rue Didouche Mourad".into(),
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[tokio::test]
    async fn wholesaler_checkout_uses_wholesale_pricing() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let wholesaler = h.open_store("Grossiste Blida", StoreType::Wholesaler).await;
        let potatoes = h.list_potatoes(&farm).await;

        let mut cart = h.system.open_cart(&wholesaler.id);
        assert_eq!(cart.add(&potatoes.id, 100).await.unwrap(), 100);
        let receipt = cart.checkout(fulfilment()).await.unwrap();

        assert!(receipt.is_complete());
        assert_eq!(receipt.total(), Some(Money::from_dinars(4_000)));
        assert!(cart.cart().is_empty());
        let order = &receipt.orders[0];
        assert_eq!(order.order_type, OrderType::Wholesale);
        assert_eq!(order.unit_price, Money::from_dinars(40));
        assert_eq!(order.total_price, Money::from_dinars(4_000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.seller_store_id, farm.id);
        assert_eq!(order.batch_id.as_deref(), Some(receipt.batch_id.as_str()));
        assert_eq!(order.fulfilment.wilaya, "Alger");

        let confirmed = h.system.orders.confirm_order(&order.id, &farm.id).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        // Stock is the seller's to manage; orders never move it.
        assert_eq!(h.system.products.get_product(&potatoes.id).await.unwrap().stock_quantity, 1_000);

        let batch = h.system.orders.list_orders_by_batch(&receipt.batch_id).await.unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn retailer_pays_retail_price_without_minimum() {
        let h = harness();
        let farm = h.open_store("Ferme Mitidja", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let potatoes = h.list_potatoes(&farm).await;

        let order = h
            .system
            .orders
            .create_order(PlaceOrder::new(&shop.id, &potatoes.id, 3))
            .await
            .unwrap();
        assert_eq!(order.order_type, OrderType::Retail);
        assert_eq!(order.total_price, Money::from_dinars(180));
    }

    #[tokio::test]
    async fn wholesale_order_below_minimum_is_rejected() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let wholesaler = h.open_store("Grossiste Blida", StoreType::Wholesaler).await;
        let potatoes = h.list_potatoes(&farm).await;

        let err = h
            .system
            .orders
            .create_order(PlaceOrder::new(&wholesaler.id, &potatoes.id, 10))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MarketError::BelowMinimumOrder {
                product_id: potatoes.id.clone(),
                minimum: 50,
                requested: 10,
            }
        );
        assert!(h.system.orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivery_completes_the_order() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let wholesaler = h.open_store("Grossiste Blida", StoreType::Wholesaler).await;
        let trucks = h.open_store("Transports Atlas", StoreType::Transport).await;
        let potatoes = h.list_potatoes(&farm).await;
        let order = h.confirmed_order(&farm, &wholesaler, &potatoes, 200).await;

        let shipping = &h.system.shipping;
        let request = shipping
            .create_shipping_request(&order.id, &wholesaler.id, "Ferme Tizi", "Marché de gros, Blida")
            .await
            .unwrap();
        assert_eq!(request.status, ShippingStatus::Waiting);
        assert_eq!(shipping.list_waiting_requests().await.unwrap().len(), 1);

        let duplicate = shipping
            .create_shipping_request(&order.id, &wholesaler.id, "Ferme Tizi", "Ailleurs")
            .await
            .unwrap_err();
        assert_eq!(
            duplicate,
            MarketError::DuplicateShippingRequest {
                order_id: order.id.clone()
            }
        );

        let accepted = shipping
            .accept_shipping_request(&request.id, &trucks.id, Money::from_dinars(1_500))
            .await
            .unwrap();
        assert_eq!(accepted.transport_store_id(), Some(trucks.id.as_str()));
        assert_eq!(accepted.delivery_price(), Some(Money::from_dinars(1_500)));
        assert!(shipping.list_waiting_requests().await.unwrap().is_empty());

        // Seller cannot close the order while the goods are still moving.
        let early = h.system.orders.complete_order(&order.id, &farm.id).await.unwrap_err();
        assert!(matches!(early, MarketError::InvalidTransition { kind: "Order", .. }));

        shipping.start_transit(&request.id, &trucks.id).await.unwrap();
        let delivered = shipping.mark_delivered(&request.id, &trucks.id).await.unwrap();
        assert!(matches!(delivered.status, ShippingStatus::Delivered(_)));

        let order = h.system.orders.get_order(&order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(
            shipping.list_requests_for_transporter(&trucks.id).await.unwrap().len(),
            1
        );

        let again = shipping.mark_delivered(&request.id, &trucks.id).await.unwrap_err();
        assert_eq!(
            again,
            MarketError::InvalidTransition {
                kind: "ShippingRequest",
                id: request.id.clone(),
                from: "Delivered".into(),
                action: "mark delivered",
            }
        );
        let err = shipping.start_transit(&request.id, &trucks.id).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidTransition { action: "start transit", .. }));
        let err = shipping
            .accept_shipping_request(&request.id, &trucks.id, Money::from_dinars(900))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidTransition { action: "accept", .. }));
        assert_eq!(
            shipping.get_shipping_request(&request.id).await.unwrap().delivery_price(),
            Some(Money::from_dinars(1_500))
        );
    }

    #[tokio::test]
    async fn shipping_requires_a_confirmed_order_from_its_buyer() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let wholesaler = h.open_store("Grossiste Blida", StoreType::Wholesaler).await;
        let other = h.open_store("Grossiste Oran", StoreType::Wholesaler).await;
        let potatoes = h.list_potatoes(&farm).await;

        let pending = h
            .system
            .orders
            .create_order(PlaceOrder::new(&wholesaler.id, &potatoes.id, 60))
            .await
            .unwrap();
        let err = h
            .system
            .shipping
            .create_shipping_request(&pending.id, &wholesaler.id, "A", "B")
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidTransition { .. }));

        h.system.orders.confirm_order(&pending.id, &farm.id).await.unwrap();
        let err = h
            .system
            .shipping
            .create_shipping_request(&pending.id, &other.id, "A", "B")
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn concurrent_acceptance_has_exactly_one_winner() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let wholesaler = h.open_store("Grossiste Blida", StoreType::Wholesaler).await;
        let potatoes = h.list_potatoes(&farm).await;
        let order = h.confirmed_order(&farm, &wholesaler, &potatoes, 100).await;
        let request = h
            .system
            .shipping
            .create_shipping_request(&order.id, &wholesaler.id, "Ferme Tizi", "Blida")
            .await
            .unwrap();

        let mut transporters = Vec::new();
        for i in 0..5 {
            transporters.push(h.open_store(&format!("Camion {i}"), StoreType::Transport).await);
        }

        let attempts = transporters.iter().enumerate().map(|(i, t)| {
            let price = Money::from_dinars(1_000 + i as i64 * 100);
            h.system.shipping.accept_shipping_request(&request.id, &t.id, price)
        });
        let results = join_all(attempts).await;

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        let winner = winners[0].transport_store_id().unwrap().to_string();

        for result in &results {
            if let Err(err) = result {
                assert_eq!(
                    err,
                    &MarketError::AlreadyAccepted {
                        request_id: request.id.clone(),
                        transport_store_id: winner.clone(),
                    }
                );
            }
        }
        let stored = h.system.shipping.get_shipping_request(&request.id).await.unwrap();
        assert_eq!(stored.transport_store_id(), Some(winner.as_str()));
    }

    #[tokio::test]
    async fn lapsed_trial_blocks_until_renewed() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let trial = h.system.subscriptions.get_subscription(&farm.id).await.unwrap();
        assert_eq!(trial.plan_id, PlanId::Free30);
        assert_eq!(trial.end_date, market_open() + Duration::days(30));

        h.clock.advance(Duration::days(31));
        let onions = NewProduct::new("Onions", Money::from_dinars(30), Money::from_dinars(45)).with_stock(10);
        let err = h
            .system
            .products
            .add_product(&farm.id, onions.clone())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MarketError::SubscriptionExpired {
                store_id: farm.id.clone(),
                end_date: trial.end_date,
            }
        );
        assert!(h.system.products.list_products_by_store(&farm.id).await.unwrap().is_empty());
        assert_eq!(h.system.stores.get_store(&farm.id).await.unwrap().status, StoreStatus::Expired);
        assert!(h.system.entitlement.is_gated(&farm.id).await.unwrap());

        let renewed = h.system.subscriptions.select_plan(&farm.id, PlanId::Plan6M).await.unwrap();
        assert_eq!(renewed.id, trial.id);
        assert_eq!(renewed.start_date, h.clock.utc());
        assert_eq!(renewed.end_date, h.clock.utc() + Duration::days(180));
        assert_eq!(h.system.stores.get_store(&farm.id).await.unwrap().status, StoreStatus::Active);
        assert_eq!(
            h.system.subscriptions.days_remaining(&farm.id).await.unwrap(),
            180
        );

        h.system.products.add_product(&farm.id, onions).await.unwrap();
    }

    #[tokio::test]
    async fn plan_change_replaces_rather_than_stacks() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        h.system.subscriptions.select_plan(&farm.id, PlanId::Plan12M).await.unwrap();
        h.clock.advance(Duration::days(10));
        let replaced = h.system.subscriptions.select_plan(&farm.id, PlanId::Plan6M).await.unwrap();

        assert_eq!(replaced.end_date, market_open() + Duration::days(10 + 180));
        assert_eq!(h.system.subscriptions.list_subscriptions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pending_payment_is_gated_and_admin_is_exempt() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let admin = h.open_store("Souk Admin", StoreType::Admin).await;

        h.system
            .subscriptions
            .update_subscription(
                &farm.id,
                SubscriptionPatch {
                    status: Some(SubscriptionStatus::PendingPayment),
                    ..SubscriptionPatch::default()
                },
            )
            .await
            .unwrap();
        let err = h.system.products.add_product(&farm.id, NewProduct::new("Figs", Money::from_dinars(1), Money::from_dinars(2))).await.unwrap_err();
        assert_eq!(
            err,
            MarketError::SubscriptionPendingPayment {
                store_id: farm.id.clone()
            }
        );

        h.clock.advance(Duration::days(400));
        assert!(!h.system.entitlement.is_gated(&admin.id).await.unwrap());
        assert!(h.system.entitlement.is_gated(&farm.id).await.unwrap());
    }

    #[tokio::test]
    async fn suspension_survives_renewal_until_reinstated() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let admin = h.open_store("Souk Admin", StoreType::Admin).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;

        let err = h.system.stores.suspend_store(&farm.id, &shop.id).await.unwrap_err();
        assert!(matches!(err, MarketError::PermissionDenied { .. }));

        h.system.stores.suspend_store(&farm.id, &admin.id).await.unwrap();
        let err = h.system.products.add_product(&farm.id, NewProduct::new("Figs", Money::from_dinars(1), Money::from_dinars(2))).await.unwrap_err();
        assert_eq!(err, MarketError::StoreSuspended { store_id: farm.id.clone() });

        h.system.subscriptions.select_plan(&farm.id, PlanId::Plan12M).await.unwrap();
        assert_eq!(h.system.stores.get_store(&farm.id).await.unwrap().status, StoreStatus::Suspended);

        let reinstated = h.system.stores.reinstate_store(&farm.id, &admin.id).await.unwrap();
        assert_eq!(reinstated.status, StoreStatus::Active);
        assert!(!h.system.entitlement.is_gated(&farm.id).await.unwrap());
    }

    #[tokio::test]
    async fn price_edits_never_reach_existing_orders() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let potatoes = h.list_potatoes(&farm).await;
        let order = h
            .system
            .orders
            .create_order(PlaceOrder::new(&shop.id, &potatoes.id, 5))
            .await
            .unwrap();

        let patch = crate::domain::ProductPatch {
            retail_price: Some(Money::from_dinars(95)),
            ..Default::default()
        };
        h.system.products.update_product(&potatoes.id, &farm.id, patch).await.unwrap();

        let stored = h.system.orders.get_order(&order.id).await.unwrap();
        assert_eq!(stored.unit_price, Money::from_dinars(60));
        assert_eq!(stored.total_price, Money::from_dinars(300));
    }

    #[tokio::test]
    async fn checkout_keeps_failed_lines_in_the_cart() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let potatoes = h.list_potatoes(&farm).await;
        let dates = h
            .system
            .products
            .add_product(
                &farm.id,
                NewProduct::new("Deglet Nour", Money::from_dinars(500), Money::from_dinars(700)).with_stock(20),
            )
            .await
            .unwrap();

        let mut cart = h.system.open_cart(&shop.id);
        cart.add(&potatoes.id, 10).await.unwrap();
        assert_eq!(cart.add(&dates.id, 50).await.unwrap(), 20);

        // Stock drops between add and checkout.
        h.system.products.set_stock(&dates.id, &farm.id, 5).await.unwrap();

        let receipt = cart.checkout(fulfilment()).await.unwrap();
        assert_eq!(receipt.orders.len(), 1);
        assert_eq!(receipt.orders[0].product_id, potatoes.id);
        assert_eq!(receipt.failures.len(), 1);
        assert_eq!(
            receipt.failures[0].error,
            MarketError::InsufficientStock {
                product_id: dates.id.clone(),
                available: 5,
                requested: 20,
            }
        );

        assert_eq!(cart.cart().quantity_of(&potatoes.id), 0);
        assert_eq!(cart.cart().quantity_of(&dates.id), 20);
        assert_eq!(
            h.system.orders.list_orders_by_batch(&receipt.batch_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn checkout_reports_products_deleted_after_adding() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let potatoes = h.list_potatoes(&farm).await;
        let figs = h
            .system
            .products
            .add_product(
                &farm.id,
                NewProduct::new("Figues", Money::from_dinars(300), Money::from_dinars(450)).with_stock(40),
            )
            .await
            .unwrap();

        let mut cart = h.system.open_cart(&shop.id);
        cart.add(&potatoes.id, 10).await.unwrap();
        cart.add(&figs.id, 5).await.unwrap();

        h.system.products.delete_product(&figs.id, &farm.id).await.unwrap();

        let receipt = cart.checkout(fulfilment()).await.unwrap();
        assert!(!receipt.is_complete());
        assert_eq!(receipt.orders.len(), 1);
        assert_eq!(receipt.orders[0].product_id, potatoes.id);
        assert_eq!(receipt.failures.len(), 1);
        assert_eq!(receipt.failures[0].line.product_id, figs.id);
        assert_eq!(receipt.failures[0].error, MarketError::not_found("Product", figs.id.clone()));

        assert_eq!(cart.cart().quantity_of(&potatoes.id), 0);
        assert_eq!(cart.cart().quantity_of(&figs.id), 5);
    }

    #[tokio::test]
    async fn empty_cart_and_non_buyers_cannot_check_out() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let other_farm = h.open_store("Ferme Setif", StoreType::Farmer).await;
        let potatoes = h.list_potatoes(&farm).await;

        let mut cart = h.system.open_cart(&other_farm.id);
        assert_eq!(
            cart.checkout(fulfilment()).await.unwrap_err(),
            MarketError::EmptyCart {
                buyer_store_id: other_farm.id.clone()
            }
        );

        cart.add(&potatoes.id, 60).await.unwrap();
        let err = cart.checkout(fulfilment()).await.unwrap_err();
        assert!(matches!(err, MarketError::PermissionDenied { .. }));
        assert_eq!(cart.cart().quantity_of(&potatoes.id), 60);
    }

    #[tokio::test]
    async fn terminal_orders_stay_terminal() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let potatoes = h.list_potatoes(&farm).await;
        let order = h
            .system
            .orders
            .create_order(PlaceOrder::new(&shop.id, &potatoes.id, 2))
            .await
            .unwrap();

        let err = h.system.orders.confirm_order(&order.id, &shop.id).await.unwrap_err();
        assert!(matches!(err, MarketError::PermissionDenied { .. }));

        let cancelled = h.system.orders.cancel_order(&order.id, &farm.id).await.unwrap();
        assert!(cancelled.status.is_terminal());
        let err = h.system.orders.confirm_order(&order.id, &farm.id).await.unwrap_err();
        assert_eq!(
            err,
            MarketError::InvalidTransition {
                kind: "Order",
                id: order.id.clone(),
                from: "Cancelled".into(),
                action: "confirm",
            }
        );
    }

    #[tokio::test]
    async fn sellers_cannot_cancel_while_a_shipment_is_in_flight() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let trucks = h.open_store("Transports Atlas", StoreType::Transport).await;
        let potatoes = h.list_potatoes(&farm).await;
        let orders = &h.system.orders;
        let shipping = &h.system.shipping;

        let order = h.confirmed_order(&farm, &shop, &potatoes, 8).await;
        let request = shipping
            .create_shipping_request(&order.id, &shop.id, "Ferme Tizi", "Kouba")
            .await
            .unwrap();
        shipping
            .accept_shipping_request(&request.id, &trucks.id, Money::from_dinars(700))
            .await
            .unwrap();

        let err = orders.cancel_order(&order.id, &farm.id).await.unwrap_err();
        assert_eq!(
            err,
            MarketError::InvalidTransition {
                kind: "Order",
                id: order.id.clone(),
                from: "Confirmed".into(),
                action: "cancel while its shipment is in flight",
            }
        );
        assert_eq!(orders.get_order(&order.id).await.unwrap().status, OrderStatus::Confirmed);

        // Once the buyer rejects a waiting request the seller may cancel.
        let other = h.confirmed_order(&farm, &shop, &potatoes, 3).await;
        let waiting = shipping
            .create_shipping_request(&other.id, &shop.id, "Ferme Tizi", "Kouba")
            .await
            .unwrap();
        assert!(orders.cancel_order(&other.id, &farm.id).await.is_err());
        let rejected = shipping.reject_shipping_request(&waiting.id, &shop.id).await.unwrap();
        assert!(rejected.status.is_terminal());
        let cancelled = orders.cancel_order(&other.id, &farm.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn only_transport_stores_accept_and_buyers_may_reject() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let potatoes = h.list_potatoes(&farm).await;
        let order = h.confirmed_order(&farm, &shop, &potatoes, 4).await;
        let request = h
            .system
            .shipping
            .create_shipping_request(&order.id, &shop.id, "Ferme Tizi", "Kouba")
            .await
            .unwrap();

        let err = h
            .system
            .shipping
            .accept_shipping_request(&request.id, &shop.id, Money::from_dinars(800))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::PermissionDenied { .. }));

        let err = h
            .system
            .shipping
            .reject_shipping_request(&request.id, &farm.id)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::PermissionDenied { .. }));

        let rejected = h
            .system
            .shipping
            .reject_shipping_request(&request.id, &shop.id)
            .await
            .unwrap();
        assert_eq!(rejected.status, ShippingStatus::Rejected);

        // With the shipment abandoned the seller may close the order by hand.
        let completed = h.system.orders.complete_order(&order.id, &farm.id).await.unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn deleting_a_product_cascades_to_orders_and_shipping() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let potatoes = h.list_potatoes(&farm).await;
        let order = h.confirmed_order(&farm, &shop, &potatoes, 4).await;
        h.system
            .shipping
            .create_shipping_request(&order.id, &shop.id, "Ferme Tizi", "Kouba")
            .await
            .unwrap();

        let err = h.system.products.delete_product(&potatoes.id, &shop.id).await.unwrap_err();
        assert!(matches!(err, MarketError::PermissionDenied { .. }));

        h.system.products.delete_product(&potatoes.id, &farm.id).await.unwrap();
        assert!(h.system.orders.list_orders().await.unwrap().is_empty());
        assert!(h.system.shipping.list_shipping_requests().await.unwrap().is_empty());
        assert_eq!(
            h.system.products.get_product(&potatoes.id).await.unwrap_err(),
            MarketError::not_found("Product", potatoes.id.clone())
        );
    }

    #[tokio::test]
    async fn deleting_a_store_removes_everything_it_touches() {
        let h = harness();
        let farm = h.open_store("Ferme Tizi", StoreType::Farmer).await;
        let shop = h.open_store("Epicerie Kouba", StoreType::Retailer).await;
        let potatoes = h.list_potatoes(&farm).await;
        h.confirmed_order(&farm, &shop, &potatoes, 4).await;

        h.system.stores.delete_store(&shop.id).await.unwrap();
        assert!(h.system.orders.list_orders().await.unwrap().is_empty());
        assert_eq!(h.system.subscriptions.list_subscriptions().await.unwrap().len(), 1);
        assert_eq!(h.system.products.list_products().await.unwrap().len(), 1);

        h.system.stores.delete_store(&farm.id).await.unwrap();
        assert!(h.system.products.list_products().await.unwrap().is_empty());
        assert!(h.system.stores.list_stores().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_ownership_rules() {
        let h = harness();
        let owner = h
            .system
            .users
            .register_user(UserRegistration::new("Yacine Merabet", "yacine@souk.dz"))
            .await
            .unwrap();
        let stores = &h.system.stores;

        let err = stores
            .create_store("user_404", NewStore::new("Ghost", StoreType::Farmer))
            .await
            .unwrap_err();
        assert_eq!(err, MarketError::not_found("User", "user_404"));

        for store_type in [StoreType::Farmer, StoreType::Wholesaler, StoreType::Retailer, StoreType::Transport] {
            stores
                .create_store(&owner.id, NewStore::new(format!("Yacine {store_type}"), store_type))
                .await
                .unwrap();
        }
        let err = stores
            .create_store(&owner.id, NewStore::new("Yacine Admin", StoreType::Admin))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MarketError::StoreLimitReached {
                user_id: owner.id.clone(),
                max: 4,
            }
        );
        assert_eq!(stores.list_stores_by_owner(&owner.id).await.unwrap().len(), 4);

        let second = h
            .system
            .users
            .register_user(UserRegistration::new("Nadia Saadi", "nadia@souk.dz"))
            .await
            .unwrap();
        stores
            .create_store(&second.id, NewStore::new("Nadia Farm", StoreType::Farmer))
            .await
            .unwrap();
        let err = stores
            .create_store(&second.id, NewStore::new("Nadia Farm 2", StoreType::Farmer))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Duplicate { .. }));

        let renamed = stores
            .update_store(
                &stores.list_stores_by_owner(&second.id).await.unwrap()[0].id,
                StorePatch {
                    name: Some("Nadia Bio".into()),
                    ..StorePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Nadia Bio");
    }

    #[tokio::test]
    async fn concurrent_store_creation_respects_the_owner_cap() {
        let config = MarketConfig {
            max_stores_per_user: 2,
            ..MarketConfig::default()
        };
        let system = MarketSystem::with_clock(&config, fixed_clock());
        let owner = system
            .users
            .register_user(UserRegistration::new("Karim Hadj", "karim@souk.dz"))
            .await
            .unwrap();

        let attempts = [StoreType::Farmer, StoreType::Wholesaler, StoreType::Retailer, StoreType::Transport]
            .into_iter()
            .map(|store_type| {
                let stores = system.stores.clone();
                let owner_id = owner.id.clone();
                async move {
                    stores
                        .create_store(&owner_id, NewStore::new(format!("Karim {store_type}"), store_type))
                        .await
                }
            });
        let results = join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(
                *err,
                MarketError::StoreLimitReached {
                    user_id: owner.id.clone(),
                    max: 2,
                }
            );
        }
        assert_eq!(system.stores.list_stores_by_owner(&owner.id).await.unwrap().len(), 2);
        assert_eq!(system.subscriptions.list_subscriptions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn public_directory_hides_admin_stores() {
        let h = harness();
        h.open_store("Ferme Tizi", StoreType::Farmer).await;
        h.open_store("Souk Admin", StoreType::Admin).await;

        let public = h.system.stores.list_public_stores().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].store_type, StoreType::Farmer);
        assert_eq!(h.system.stores.list_stores().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn emails_are_unique_ignoring_case() {
        let h = harness();
        let users = &h.system.users;
        users
            .register_user(UserRegistration::new("Amina", "amina@souk.dz"))
            .await
            .unwrap();
        let err = users
            .register_user(UserRegistration::new("Amina B", "AMINA@souk.dz"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MarketError::Duplicate {
                field: "email".into(),
                value: "amina@souk.dz".into(),
            }
        );
        assert!(users.find_user_by_email("Amina@Souk.dz").await.unwrap().is_some());
        assert_eq!(users.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_every_actor() {
        let h = harness();
        h.open_store("Ferme Tizi", StoreType::Farmer).await;
        h.system.shutdown().await.unwrap();
    }

    // --- Interaction tests against mocked repositories ---

    struct Mocked {
        repositories: Repositories,
        stores_rx: crate::mock_framework::MockReceiver<Store>,
        subscriptions_rx: crate::mock_framework::MockReceiver<Subscription>,
        orders_rx: crate::mock_framework::MockReceiver<Order>,
        products_rx: crate::mock_framework::MockReceiver<Product>,
    }

    fn mocked() -> Mocked {
        let (users, _) = create_mock_client(10);
        let (stores, stores_rx) = create_mock_client(10);
        let (products, products_rx) = create_mock_client(10);
        let (orders, orders_rx) = create_mock_client(10);
        let (shipping, _) = create_mock_client(10);
        let (subscriptions, subscriptions_rx) = create_mock_client(10);
        Mocked {
            repositories: Repositories {
                users,
                stores,
                products,
                orders,
                shipping,
                subscriptions,
            },
            stores_rx,
            subscriptions_rx,
            orders_rx,
            products_rx,
        }
    }

    fn order_client(repositories: &Repositories) -> OrderClient {
        let entitlement = EntitlementClient::new(repositories, fixed_clock());
        let products = ProductClient::new(repositories, entitlement.clone());
        OrderClient::new(repositories, products, entitlement)
    }

    fn farm_store() -> Store {
        Store {
            id: "store_1".into(),
            owner_user_id: "user_1".into(),
            name: "Ferme Tizi".into(),
            store_type: StoreType::Farmer,
            status: StoreStatus::Active,
            address: String::new(),
            wilaya: "Tizi Ouzou".into(),
            phone: String::new(),
            created_at: market_open(),
        }
    }

    fn pending_order() -> Order {
        Order {
            id: "order_1".into(),
            product_id: "product_1".into(),
            buyer_store_id: "store_2".into(),
            seller_store_id: "store_1".into(),
            order_type: OrderType::Retail,
            quantity: 2,
            unit_price: Money::from_dinars(60),
            total_price: Money::from_dinars(120),
            status: OrderStatus::Pending,
            batch_id: None,
            fulfilment: FulfilmentDetails::default(),
            notes: String::new(),
            created_at: market_open(),
        }
    }

    #[tokio::test]
    async fn test_confirm_flow_checks_entitlement_first() {
        let mut mocks = mocked();
        let client = order_client(&mocks.repositories);
        let task = tokio::spawn(async move { client.confirm_order("order_1", "store_1").await });

        // Expect Store Get
        let (store_id, responder) = expect_get(&mut mocks.stores_rx).await.expect("Expected Store Get");
        assert_eq!(store_id, "store_1");
        responder.send(Ok(Some(farm_store()))).unwrap();

        // Expect Subscription List
        let (filter, responder) = expect_list(&mut mocks.subscriptions_rx)
            .await
            .expect("Expected Subscription List");
        let active = Subscription::starting("subscription_1".into(), "store_1".into(), PlanId::Free30, market_open());
        answer_list(filter, responder, vec![active]);

        // Expect Order Get
        let (order_id, responder) = expect_get(&mut mocks.orders_rx).await.expect("Expected Order Get");
        assert_eq!(order_id, "order_1");
        responder.send(Ok(Some(pending_order()))).unwrap();

        // Expect Confirm Action
        let (order_id, action, responder) = expect_action(&mut mocks.orders_rx)
            .await
            .expect("Expected Order Action");
        assert_eq!(order_id, "order_1");
        assert_eq!(action, OrderAction::Confirm);
        let confirmed = Order {
            status: OrderStatus::Confirmed,
            ..pending_order()
        };
        responder.send(Ok(confirmed.clone())).unwrap();

        let result = task.await.unwrap();
        assert_eq!(result, Ok(confirmed));
    }

    #[tokio::test]
    async fn test_denied_command_never_reaches_the_order_actor() {
        let mut mocks = mocked();
        let client = order_client(&mocks.repositories);
        let task = tokio::spawn(async move { client.confirm_order("order_1", "store_1").await });

        let (_, responder) = expect_get(&mut mocks.stores_rx).await.expect("Expected Store Get");
        responder.send(Ok(Some(farm_store()))).unwrap();

        let (filter, responder) = expect_list(&mut mocks.subscriptions_rx)
            .await
            .expect("Expected Subscription List");
        let lapsed = Subscription::starting(
            "subscription_1".into(),
            "store_1".into(),
            PlanId::Free30,
            market_open() - Duration::days(60),
        );
        let end_date = lapsed.end_date;
        answer_list(filter, responder, vec![lapsed]);

        let result = task.await.unwrap();
        assert_eq!(
            result,
            Err(MarketError::SubscriptionExpired {
                store_id: "store_1".into(),
                end_date,
            })
        );
        assert!(mocks.orders_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_add_product_stamps_owner_and_clock() {
        let mut mocks = mocked();
        let entitlement = EntitlementClient::new(&mocks.repositories, fixed_clock());
        let products = ProductClient::new(&mocks.repositories, entitlement);
        let task = tokio::spawn(async move {
            let figs = NewProduct::new("Figs", Money::from_dinars(300), Money::from_dinars(450)).with_stock(80);
            products.add_product("store_1", figs).await
        });

        let (_, responder) = expect_get(&mut mocks.stores_rx).await.expect("Expected Store Get");
        responder.send(Ok(Some(farm_store()))).unwrap();
        let (filter, responder) = expect_list(&mut mocks.subscriptions_rx)
            .await
            .expect("Expected Subscription List");
        let active = Subscription::starting("subscription_1".into(), "store_1".into(), PlanId::Free30, market_open());
        answer_list(filter, responder, vec![active]);

        // Expect Product Create
        let (payload, responder) = expect_create(&mut mocks.products_rx)
            .await
            .expect("Expected Product Create");
        assert_eq!(payload.store_id, "store_1");
        assert_eq!(payload.date_added, market_open());
        assert_eq!(payload.product.stock_quantity, 80);
        responder
            .send(Err(MarketError::ActorCommunication("Actor dropped".into())))
            .unwrap();

        let result = task.await.unwrap();
        assert_eq!(result, Err(MarketError::ActorCommunication("Actor dropped".into())));
    }
}
