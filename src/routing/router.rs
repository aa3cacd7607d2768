use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::planner::{self, Transition};
use crate::config::AppConfig;
use crate::domain::{OrderIntent, PositionState};
use crate::error::Result;
use crate::exchange::{ExchangeGateway, OrderResult};

/// Router behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Send market orders instead of limits
    pub market_orders: bool,
    /// Place an order for `Hold` transitions
    pub place_on_hold: bool,
}

impl From<&AppConfig> for RouterOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            market_orders: config.execution.market_orders,
            place_on_hold: config.routing.place_on_hold,
        }
    }
}

/// Why no order was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Close requested but the venue reports no position
    AlreadyFlat,
    /// Signal keeps the current position
    Hold,
}

/// What the router did for one signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOutcome {
    pub transition: Transition,
    pub canceled_orders: Vec<String>,
    pub live_position: Option<PositionState>,
    pub size_multiplier: u32,
    pub order: Option<OrderResult>,
    pub skipped: Option<SkipReason>,
}

impl RouteOutcome {
    fn new(transition: Transition) -> Self {
        Self {
            transition,
            canceled_orders: Vec::new(),
            live_position: None,
            size_multiplier: 1,
            order: None,
            skipped: None,
        }
    }

    fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }

    /// A skipped signal counts as handled; a placed one succeeds unless the
    /// venue rejected it.
    pub fn is_success(&self) -> bool {
        match &self.order {
            Some(order) => order.is_success(),
            None => self.skipped.is_some(),
        }
    }
}

/// Sequences cancel / query / place calls for one signal at a time.
///
/// Holds no state between signals: the venue is the source of truth for
/// live positions.
#[derive(Clone)]
pub struct OrderRouter {
    gateway: Arc<dyn ExchangeGateway>,
    options: RouterOptions,
}

impl OrderRouter {
    pub fn new(gateway: Arc<dyn ExchangeGateway>, options: RouterOptions) -> Self {
        Self { gateway, options }
    }

    pub fn gateway(&self) -> &Arc<dyn ExchangeGateway> {
        &self.gateway
    }

    /// Route one signal. Gateway errors from placement propagate; a failed
    /// cancel on close is logged and does not stop the close.
    #[instrument(skip(self, intent), fields(id = %intent.id(), ticker = %intent.ticker()))]
    pub async fn route(&self, intent: OrderIntent) -> Result<RouteOutcome> {
        let transition = planner::classify(intent.previous_position(), intent.position());
        let mut outcome = RouteOutcome::new(transition);
        debug!(
            "{} -> {} classified as {}",
            intent.previous_position(),
            intent.position(),
            transition
        );

        match transition {
            Transition::Close => {
                outcome.canceled_orders =
                    match self.gateway.cancel_existing_orders(intent.ticker()).await {
                        Ok(canceled) => canceled,
                        Err(e) => {
                            warn!("Failed to cancel resting orders for {}: {}", intent.ticker(), e);
                            Vec::new()
                        }
                    };

                let live = self.gateway.has_open_position(intent.ticker()).await?;
                outcome.live_position = Some(live);
                if live.is_flat() {
                    info!("No open {} position on the venue, nothing to close", intent.ticker());
                    return Ok(outcome.skip(SkipReason::AlreadyFlat));
                }
            }
            Transition::Reverse => {
                let live = self.gateway.has_open_position(intent.ticker()).await?;
                info!("In position for {} - Exchange: {}", intent.ticker(), live);
                outcome.live_position = Some(live);
            }
            Transition::Hold if !self.options.place_on_hold => {
                info!(
                    "Position unchanged ({}), not placing an order",
                    intent.position()
                );
                return Ok(outcome.skip(SkipReason::Hold));
            }
            Transition::Open | Transition::Hold => {}
        }

        let plan = planner::plan(&intent, outcome.live_position)?;
        outcome.size_multiplier = plan.size_multiplier;
        if plan.size_multiplier > 1 {
            info!(
                "Moving to {}. Scaling size x{} to reverse position.",
                intent.position(),
                plan.size_multiplier
            );
        }

        let order = intent.with_contracts(plan.size);
        let stop_loss = order.stop_loss_price()?;
        info!(
            "Placing order: {} reduce={} market={} stop_loss={}",
            order, plan.reduce_only, self.options.market_orders, stop_loss
        );

        let result = self
            .gateway
            .place_order(&order, plan.reduce_only, self.options.market_orders)
            .await?;
        info!("Order response: {:?}", result);

        outcome.order = Some(result);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;
    use crate::exchange::ExchangeKind;
    use async_trait::async_trait;
    use mockall::{mock, Sequence};
    use rust_decimal_macros::dec;
    use serde_json::json;

    mock! {
        pub Gateway {}

        #[async_trait]
        impl ExchangeGateway for Gateway {
            fn kind(&self) -> ExchangeKind;
            async fn place_order(
                &self,
                intent: &OrderIntent,
                reduce_only: bool,
                market: bool,
            ) -> Result<OrderResult>;
            async fn cancel_existing_orders(&self, asset: &str) -> Result<Vec<String>>;
            async fn has_open_position(&self, asset: &str) -> Result<PositionState>;
            async fn close_positions(&self, asset: &str) -> Result<bool>;
        }
    }

    fn intent(previous: &str, position: &str, contracts: f64) -> OrderIntent {
        let action = match position {
            "long" => "buy",
            _ => "sell",
        };
        OrderIntent::from_value(json!({
            "id": "tv-1",
            "action": action,
            "contracts": contracts,
            "ticker": "NEARUSDT",
            "position": position,
            "previous_position": previous,
            "position_size": 0,
            "price": 6.89
        }))
        .unwrap()
    }

    fn router(gateway: MockGateway, options: RouterOptions) -> OrderRouter {
        OrderRouter::new(Arc::new(gateway), options)
    }

    #[tokio::test]
    async fn close_on_flat_venue_cancels_then_stops() {
        let mut gateway = MockGateway::new();
        let mut seq = Sequence::new();
        gateway
            .expect_cancel_existing_orders()
            .withf(|asset| asset == "NEAR")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["101".to_string()]));
        gateway
            .expect_has_open_position()
            .withf(|asset| asset == "NEAR")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(PositionState::Flat));
        gateway.expect_place_order().never();

        let outcome = router(gateway, RouterOptions::default())
            .route(intent("long", "flat", 10.0))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.skipped, Some(SkipReason::AlreadyFlat));
        assert_eq!(outcome.canceled_orders, vec!["101".to_string()]);
        assert!(outcome.order.is_none());
    }

    #[tokio::test]
    async fn close_with_open_position_places_reduce_only() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_cancel_existing_orders()
            .returning(|_| Ok(Vec::new()));
        gateway
            .expect_has_open_position()
            .returning(|_| Ok(PositionState::Long));
        gateway
            .expect_place_order()
            .withf(|order, reduce_only, market| {
                order.contracts() == dec!(10) && *reduce_only && !*market
            })
            .times(1)
            .returning(|_, _, _| Ok(OrderResult::resting("7")));

        let outcome = router(gateway, RouterOptions::default())
            .route(intent("long", "flat", 10.0))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.transition, Transition::Close);
    }

    #[tokio::test]
    async fn close_continues_when_cancel_fails() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_cancel_existing_orders()
            .returning(|_| Err(RouterError::Gateway("open_orders timed out".to_string())));
        gateway
            .expect_has_open_position()
            .times(1)
            .returning(|_| Ok(PositionState::Short));
        gateway
            .expect_place_order()
            .times(1)
            .returning(|_, _, _| Ok(OrderResult::resting("8")));

        let outcome = router(gateway, RouterOptions::default())
            .route(intent("short", "flat", 3.0))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert!(outcome.canceled_orders.is_empty());
    }

    #[tokio::test]
    async fn reverse_against_live_opposite_doubles_size() {
        let mut gateway = MockGateway::new();
        gateway.expect_cancel_existing_orders().never();
        gateway
            .expect_has_open_position()
            .returning(|_| Ok(PositionState::Short));
        gateway
            .expect_place_order()
            .withf(|order, reduce_only, _| order.contracts() == dec!(2) && !*reduce_only)
            .times(1)
            .returning(|order, _, _| {
                Ok(OrderResult::filled("9", order.contracts(), order.price()))
            });

        let outcome = router(gateway, RouterOptions::default())
            .route(intent("short", "long", 1.0))
            .await
            .unwrap();

        assert_eq!(outcome.size_multiplier, 2);
        assert_eq!(outcome.live_position, Some(PositionState::Short));
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn reverse_when_venue_already_matches_keeps_size() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_has_open_position()
            .returning(|_| Ok(PositionState::Long));
        gateway
            .expect_place_order()
            .withf(|order, _, _| order.contracts() == dec!(1))
            .times(1)
            .returning(|_, _, _| Ok(OrderResult::resting("10")));

        let outcome = router(gateway, RouterOptions::default())
            .route(intent("short", "long", 1.0))
            .await
            .unwrap();

        assert_eq!(outcome.size_multiplier, 1);
    }

    #[tokio::test]
    async fn open_places_without_querying_venue() {
        let mut gateway = MockGateway::new();
        gateway.expect_has_open_position().never();
        gateway.expect_cancel_existing_orders().never();
        gateway
            .expect_place_order()
            .withf(|_, reduce_only, market| !*reduce_only && *market)
            .times(1)
            .returning(|_, _, _| Ok(OrderResult::rejected("Insufficient margin")));

        let options = RouterOptions {
            market_orders: true,
            ..RouterOptions::default()
        };
        let outcome = router(gateway, options)
            .route(intent("flat", "long", 1.0))
            .await
            .unwrap();

        assert_eq!(outcome.transition, Transition::Open);
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn hold_is_skipped_unless_enabled() {
        let mut gateway = MockGateway::new();
        gateway.expect_place_order().never();
        let outcome = router(gateway, RouterOptions::default())
            .route(intent("long", "long", 1.0))
            .await
            .unwrap();
        assert_eq!(outcome.skipped, Some(SkipReason::Hold));
        assert!(outcome.is_success());

        let mut gateway = MockGateway::new();
        gateway
            .expect_place_order()
            .times(1)
            .returning(|_, _, _| Ok(OrderResult::resting("11")));
        let options = RouterOptions {
            place_on_hold: true,
            ..RouterOptions::default()
        };
        let outcome = router(gateway, options)
            .route(intent("long", "long", 1.0))
            .await
            .unwrap();
        assert!(outcome.order.is_some());
    }

    #[tokio::test]
    async fn placement_failure_propagates() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_place_order()
            .returning(|_, _, _| Err(RouterError::Gateway("connection reset".to_string())));

        let err = router(gateway, RouterOptions::default())
            .route(intent("flat", "short", 1.0))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::GatewayCommunication);
    }
}
