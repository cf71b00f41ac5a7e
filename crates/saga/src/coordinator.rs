//! Order coordinator: order lifecycle and the outbound saga edges.

use std::sync::Arc;
use std::time::Duration;

use common::{CorrelationId, OrderId};
use domain::{Order, OrderItem, PaymentOutcome, RestaurantId, UserId};
use serde::Serialize;
use store::{OrderStatusUpdate, OrderStore};

use crate::error::{Result, SagaError};
use crate::services::gateway::{InitiatePayment, PaymentGateway};
use crate::services::restaurant::RestaurantDirectory;

/// Combined order/delivery status, the shape of the status read endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
    pub order_id: OrderId,
    pub status: domain::OrderStatus,
    pub delivery_status: domain::DeliveryStatus,
}

/// Drives an order from creation to a terminal status.
///
/// The order store is the coordinator's exclusively-owned state. The
/// restaurant directory and the payment gateway are the saga's outbound
/// edges; both calls are bounded by the configured timeout.
pub struct OrderCoordinator<S: OrderStore> {
    orders: S,
    directory: Arc<dyn RestaurantDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    call_timeout: Duration,
}

impl<S: OrderStore> OrderCoordinator<S> {
    /// Creates a new order coordinator.
    pub fn new(
        orders: S,
        directory: Arc<dyn RestaurantDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            orders,
            directory,
            gateway,
            call_timeout,
        }
    }

    /// Validates and persists a new order, then hands the payment off.
    ///
    /// The directory check fails closed: an unreachable directory rejects
    /// the order exactly like an unknown restaurant. The payment handoff
    /// is best-effort; if it cannot be dispatched the order stays
    /// `pending` with no retry and no rollback. The returned order is the
    /// snapshot as persisted, before any settlement outcome arrives;
    /// callers poll the status endpoint to observe the terminal state.
    #[tracing::instrument(skip(self, items), fields(user_id = %user_id, restaurant_id = %restaurant_id))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        restaurant_id: RestaurantId,
        items: Vec<OrderItem>,
        correlation_id: &CorrelationId,
    ) -> Result<Order> {
        let order = Order::new(user_id, restaurant_id, items)?;

        if !self.restaurant_exists(&order.restaurant_id, correlation_id).await {
            return Err(SagaError::RestaurantNotFound(order.restaurant_id));
        }

        let order = self.orders.insert(order).await?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            total_price = %order.total_price,
            "order created"
        );

        let request = InitiatePayment {
            order_id: order.id,
            user_id: order.user_id.clone(),
            amount: order.total_price,
            status: None,
        };
        self.dispatch_payment(request, correlation_id).await;

        Ok(order)
    }

    /// Applies a settlement outcome to the order. Idempotent: the status
    /// is overwritten unconditionally, so re-delivery of the same outcome
    /// is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn apply_payment_outcome(
        &self,
        order_id: OrderId,
        outcome: PaymentOutcome,
    ) -> Result<Order> {
        self.orders
            .update_status(order_id, OrderStatusUpdate::status(outcome.order_status()))
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    /// Applies a partial status update (order status and/or delivery
    /// status). The overwrite is unconditional; this is also the inbound
    /// edge of the status callback channel.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        update: OrderStatusUpdate,
    ) -> Result<Order> {
        if update.is_empty() {
            return Err(SagaError::EmptyUpdate);
        }
        self.orders
            .update_status(order_id, update)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    /// Cancels an order by removing it entirely, returning the removed
    /// record.
    ///
    /// A completed payment linked to the order is left untouched; there is
    /// no refund compensation step.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let order = self
            .orders
            .remove(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))?;
        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");
        Ok(order)
    }

    /// Returns the order and delivery status. Pure read.
    pub async fn get_status(&self, order_id: OrderId) -> Result<OrderStatusView> {
        let order = self.get_order(order_id).await?;
        Ok(OrderStatusView {
            order_id: order.id,
            status: order.status,
            delivery_status: order.delivery_status,
        })
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    /// Lists all orders.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.orders.list().await?)
    }

    /// Lists all orders placed by the given user.
    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        Ok(self.orders.list_by_user(user_id).await?)
    }

    /// Sets the free-text note on an order.
    pub async fn set_note(&self, order_id: OrderId, note: String) -> Result<Order> {
        self.orders
            .set_note(order_id, Some(note))
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    /// Removes the free-text note from an order.
    pub async fn clear_note(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .set_note(order_id, None)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    /// Resolves restaurant existence. Directory errors, timeouts, and
    /// plain misses all resolve to "not found".
    async fn restaurant_exists(
        &self,
        restaurant_id: &RestaurantId,
        correlation_id: &CorrelationId,
    ) -> bool {
        let lookup = tokio::time::timeout(
            self.call_timeout,
            self.directory.exists(restaurant_id, correlation_id),
        )
        .await;

        match lookup {
            Ok(Ok(found)) => found,
            Ok(Err(error)) => {
                tracing::warn!(
                    %restaurant_id,
                    correlation_id = %correlation_id,
                    %error,
                    "restaurant lookup failed; treating as not found"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    %restaurant_id,
                    correlation_id = %correlation_id,
                    "restaurant lookup timed out; treating as not found"
                );
                false
            }
        }
    }

    /// Hands the settlement request to the payment side, bounded by the
    /// call timeout. Failure is logged and counted, never propagated.
    async fn dispatch_payment(&self, request: InitiatePayment, correlation_id: &CorrelationId) {
        let order_id = request.order_id;
        let dispatch =
            tokio::time::timeout(self.call_timeout, self.gateway.initiate(request, correlation_id))
                .await;

        let error = match dispatch {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(_) => SagaError::unavailable("payment service", "initiation timed out"),
        };

        metrics::counter!("payment_dispatch_failures_total").increment(1);
        tracing::warn!(
            %order_id,
            correlation_id = %correlation_id,
            %error,
            "payment initiation failed; order left pending"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::PaymentProcessor;
    use crate::services::callback::LocalStatusCallback;
    use crate::services::gateway::{InMemoryPaymentGateway, LocalPaymentGateway};
    use crate::services::restaurant::InMemoryRestaurantDirectory;
    use crate::settlement::FixedSettlement;
    use domain::{DeliveryStatus, DomainError, Money, OrderStatus, PaymentStatus};
    use store::{InMemoryOrderStore, InMemoryPaymentStore, PaymentStore};

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn setup() -> (
        OrderCoordinator<InMemoryOrderStore>,
        InMemoryOrderStore,
        InMemoryRestaurantDirectory,
        InMemoryPaymentGateway,
    ) {
        let orders = InMemoryOrderStore::new();
        let directory = InMemoryRestaurantDirectory::new();
        directory.add_restaurant("r1");
        let gateway = InMemoryPaymentGateway::new();

        let coordinator = OrderCoordinator::new(
            orders.clone(),
            Arc::new(directory.clone()),
            Arc::new(gateway.clone()),
            TIMEOUT,
        );
        (coordinator, orders, directory, gateway)
    }

    fn sample_items() -> Vec<OrderItem> {
        vec![OrderItem::new("i1", "Pizza", 2, Money::from_cents(1000))]
    }

    #[tokio::test]
    async fn test_create_order_happy_path() {
        let (coordinator, orders, _, gateway) = setup();

        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        assert_eq!(order.total_price.cents(), 2000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(orders.count().await, 1);

        // Payment handed off with the order's total, not re-derived.
        let initiated = gateway.initiated();
        assert_eq!(initiated.len(), 1);
        assert_eq!(initiated[0].order_id, order.id);
        assert_eq!(initiated[0].amount, order.total_price);
    }

    #[tokio::test]
    async fn test_create_order_validation_failure() {
        let (coordinator, orders, _, gateway) = setup();

        let result = coordinator
            .create_order("u1".into(), "r1".into(), vec![], &CorrelationId::new())
            .await;

        assert!(matches!(
            result,
            Err(SagaError::Validation(DomainError::NoItems))
        ));
        assert_eq!(orders.count().await, 0);
        assert_eq!(gateway.initiated_count(), 0);
    }

    #[tokio::test]
    async fn test_create_order_unknown_restaurant() {
        let (coordinator, orders, _, gateway) = setup();

        let result = coordinator
            .create_order("u1".into(), "r9".into(), sample_items(), &CorrelationId::new())
            .await;

        assert!(matches!(result, Err(SagaError::RestaurantNotFound(_))));
        assert_eq!(orders.count().await, 0);
        assert_eq!(gateway.initiated_count(), 0);
    }

    #[tokio::test]
    async fn test_directory_outage_fails_closed() {
        let (coordinator, orders, directory, _) = setup();
        directory.set_unavailable(true);

        // Existing restaurant, unreachable directory: indistinguishable
        // from a miss.
        let result = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await;

        assert!(matches!(result, Err(SagaError::RestaurantNotFound(_))));
        assert_eq!(orders.count().await, 0);
    }

    #[tokio::test]
    async fn test_directory_timeout_fails_closed() {
        struct SlowDirectory;

        #[async_trait::async_trait]
        impl crate::services::restaurant::RestaurantDirectory for SlowDirectory {
            async fn exists(
                &self,
                _id: &RestaurantId,
                _correlation_id: &CorrelationId,
            ) -> crate::error::Result<bool> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(true)
            }
        }

        let orders = InMemoryOrderStore::new();
        let coordinator = OrderCoordinator::new(
            orders.clone(),
            Arc::new(SlowDirectory),
            Arc::new(InMemoryPaymentGateway::new()),
            Duration::from_millis(20),
        );

        let result = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await;

        assert!(matches!(result, Err(SagaError::RestaurantNotFound(_))));
        assert_eq!(orders.count().await, 0);
    }

    #[tokio::test]
    async fn test_gateway_outage_leaves_order_pending() {
        let (coordinator, orders, _, gateway) = setup();
        gateway.set_unavailable(true);

        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        // Create still succeeds; the order sits in pending forever.
        assert_eq!(order.status, OrderStatus::Pending);
        let stored = orders.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert_eq!(gateway.initiated_count(), 0);
    }

    #[tokio::test]
    async fn test_apply_payment_outcome_is_idempotent() {
        let (coordinator, _, _, _) = setup();
        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        let once = coordinator
            .apply_payment_outcome(order.id, PaymentOutcome::Confirmed)
            .await
            .unwrap();
        let twice = coordinator
            .apply_payment_outcome(order.id, PaymentOutcome::Confirmed)
            .await
            .unwrap();

        assert_eq!(once.status, OrderStatus::Confirmed);
        assert_eq!(once, twice);
        // The total is never recomputed on status changes.
        assert_eq!(twice.total_price, order.total_price);
    }

    #[tokio::test]
    async fn test_apply_payment_outcome_missing_order() {
        let (coordinator, _, _, _) = setup();
        let result = coordinator
            .apply_payment_outcome(OrderId::new(), PaymentOutcome::Confirmed)
            .await;
        assert!(matches!(result, Err(SagaError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_status_requires_a_field() {
        let (coordinator, _, _, _) = setup();
        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        let result = coordinator
            .update_status(order.id, OrderStatusUpdate::default())
            .await;
        assert!(matches!(result, Err(SagaError::EmptyUpdate)));

        let updated = coordinator
            .update_status(
                order.id,
                OrderStatusUpdate {
                    status: None,
                    delivery_status: Some(DeliveryStatus::OnTheWay),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.delivery_status, DeliveryStatus::OnTheWay);
        assert_eq!(updated.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_order_removes_it() {
        let (coordinator, orders, _, _) = setup();
        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        let removed = coordinator.cancel_order(order.id).await.unwrap();
        assert_eq!(removed.id, order.id);
        assert_eq!(orders.count().await, 0);

        let result = coordinator.get_order(order.id).await;
        assert!(matches!(result, Err(SagaError::OrderNotFound(_))));

        let result = coordinator.cancel_order(order.id).await;
        assert!(matches!(result, Err(SagaError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_note_lifecycle() {
        let (coordinator, _, _, _) = setup();
        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        let updated = coordinator
            .set_note(order.id, "ring the bell".to_string())
            .await
            .unwrap();
        assert_eq!(updated.note.as_deref(), Some("ring the bell"));

        let updated = coordinator
            .set_note(order.id, "leave at the door".to_string())
            .await
            .unwrap();
        assert_eq!(updated.note.as_deref(), Some("leave at the door"));

        let updated = coordinator.clear_note(order.id).await.unwrap();
        assert!(updated.note.is_none());

        let result = coordinator.set_note(OrderId::new(), "x".to_string()).await;
        assert!(matches!(result, Err(SagaError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_status_view() {
        let (coordinator, _, _, _) = setup();
        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        let view = coordinator.get_status(order.id).await.unwrap();
        assert_eq!(view.order_id, order.id);
        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.delivery_status, DeliveryStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_and_filter_orders() {
        let (coordinator, _, _, _) = setup();
        for user in ["u1", "u1", "u2"] {
            coordinator
                .create_order(user.into(), "r1".into(), sample_items(), &CorrelationId::new())
                .await
                .unwrap();
        }

        assert_eq!(coordinator.list_orders().await.unwrap().len(), 3);
        assert_eq!(
            coordinator.orders_for_user(&"u1".into()).await.unwrap().len(),
            2
        );
    }

    /// Full in-process saga: coordinator → gateway → processor →
    /// settlement → callback → order store.
    fn full_saga(
        settlement: FixedSettlement,
    ) -> (
        OrderCoordinator<InMemoryOrderStore>,
        InMemoryOrderStore,
        InMemoryPaymentStore,
    ) {
        let orders = InMemoryOrderStore::new();
        let payments = InMemoryPaymentStore::new();
        let directory = InMemoryRestaurantDirectory::new();
        directory.add_restaurant("r1");

        let processor = Arc::new(PaymentProcessor::new(
            payments.clone(),
            Arc::new(settlement),
            Arc::new(LocalStatusCallback::new(orders.clone())),
            TIMEOUT,
        ));
        let coordinator = OrderCoordinator::new(
            orders.clone(),
            Arc::new(directory),
            Arc::new(LocalPaymentGateway::new(processor)),
            TIMEOUT,
        );
        (coordinator, orders, payments)
    }

    #[tokio::test]
    async fn test_end_to_end_settlement_success() {
        let (coordinator, orders, payments) = full_saga(FixedSettlement::always_approve());

        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        // The returned snapshot predates settlement.
        assert_eq!(order.status, OrderStatus::Pending);

        let stored = orders.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
        assert_eq!(stored.total_price.cents(), 2000);

        let payment_list = payments.list().await.unwrap();
        assert_eq!(payment_list.len(), 1);
        assert_eq!(payment_list[0].order_id, order.id);
        assert_eq!(payment_list[0].amount.cents(), 2000);
        assert_eq!(payment_list[0].status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_end_to_end_settlement_failure() {
        let (coordinator, orders, payments) = full_saga(FixedSettlement::always_decline());

        let order = coordinator
            .create_order("u1".into(), "r1".into(), sample_items(), &CorrelationId::new())
            .await
            .unwrap();

        let stored = orders.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::PaymentFailed);
        // The failed settlement never touches the order's total.
        assert_eq!(stored.total_price, order.total_price);

        let payment_list = payments.list().await.unwrap();
        assert_eq!(payment_list.len(), 1);
        assert_eq!(payment_list[0].status, PaymentStatus::Failed);
    }
}
