//! Order placement orchestrator.

use domain::{
    DiscountPolicy, Money, NewOrder, Order, OrderLineRequest, PricedLine, Role, StockOperation,
};
use order_store::{OrderStore, StoreError};

use crate::error::{PlacementError, Severity};
use crate::services::{AuthToken, CatalogError, CatalogGateway};
use crate::state::PlacementState;

/// Tracks the state of one placement and rejects illegal transitions.
#[derive(Debug, Default)]
struct Placement {
    state: PlacementState,
}

impl Placement {
    /// Moves to `next`. An illegal transition is logged and ignored.
    fn advance(&mut self, next: PlacementState) {
        if !self.state.can_transition_to(next) {
            tracing::error!(from = %self.state, to = %next, "illegal placement transition");
            return;
        }
        tracing::debug!(from = %self.state, to = %next, "placement state changed");
        self.state = next;
    }
}

/// Places orders against the catalog and persists them.
///
/// A placement runs validate, price, deduct and persist strictly in that
/// order. Once stock has been deducted, a failed save triggers exactly one
/// `restore_stock` call with the same items. The orchestrator holds no
/// mutable state of its own, so one instance can serve concurrent requests.
pub struct OrderOrchestrator<S, C>
where
    S: OrderStore,
    C: CatalogGateway,
{
    store: S,
    catalog: C,
}

impl<S, C> OrderOrchestrator<S, C>
where
    S: OrderStore,
    C: CatalogGateway,
{
    /// Creates a new orchestrator.
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Places an order for `username`.
    ///
    /// Prices come from the catalog only; the discount is chosen from
    /// `role`. The token is forwarded unchanged on every catalog call.
    #[tracing::instrument(
        skip(self, token, lines),
        fields(lines = lines.len(), order_id = tracing::field::Empty)
    )]
    pub async fn place_order(
        &self,
        username: &str,
        role: &Role,
        token: &AuthToken,
        lines: &[OrderLineRequest],
    ) -> Result<Order, PlacementError> {
        metrics::counter!("order_placements_total").increment(1);
        let start = std::time::Instant::now();

        let mut placement = Placement::default();
        let result = self
            .run(&mut placement, username, role, token, lines)
            .await;

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("order_placement_duration_seconds").record(duration);

        match &result {
            Ok(order) => {
                placement.advance(PlacementState::Committed);
                tracing::Span::current().record("order_id", tracing::field::display(order.id()));
                metrics::counter!("order_placements_committed_total").increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    total = %order.order_total(),
                    duration,
                    "order placed"
                );
            }
            Err(err) => {
                placement.advance(err.terminal_state());
                metrics::counter!(
                    "order_placements_failed_total",
                    "stage" => err.stage().as_str(),
                    "kind" => err.kind()
                )
                .increment(1);
                match err.severity() {
                    Severity::ClientCorrectable => {
                        tracing::info!(kind = err.kind(), error = %err, "order placement rejected")
                    }
                    Severity::Server => {
                        tracing::warn!(kind = err.kind(), error = %err, "order placement failed")
                    }
                    // Already logged with reconciliation details.
                    Severity::Critical => {}
                }
            }
        }

        result
    }

    async fn run(
        &self,
        placement: &mut Placement,
        username: &str,
        role: &Role,
        token: &AuthToken,
        lines: &[OrderLineRequest],
    ) -> Result<Order, PlacementError> {
        OrderLineRequest::validate_all(lines)?;

        // The same set goes to validate, deduct and restore
        let items = StockOperation::for_lines(lines);

        // 1. Validate stock
        self.catalog
            .validate_stock(&items, token)
            .await
            .map_err(PlacementError::StockValidationFailed)?;
        placement.advance(PlacementState::Pricing);

        // 2. Look up current prices and apply the discount policy
        let priced = self.price_lines(lines, token).await?;
        let subtotal: Money = PricedLine::subtotal(&priced)?;
        let pricing = DiscountPolicy::price(role, subtotal);
        tracing::debug!(
            %subtotal,
            total = %pricing.final_total,
            steps = pricing.applied.len(),
            "order priced"
        );
        placement.advance(PlacementState::Deducting);

        // 3. Deduct stock. Failures past this point must be compensated.
        self.catalog
            .deduct_stock(&items, token)
            .await
            .map_err(PlacementError::StockDeductionFailed)?;
        placement.advance(PlacementState::Persisting);

        // 4. Persist
        let order = NewOrder::new(username, &pricing, priced);
        match self.store.save(order).await {
            Ok(order) => Ok(order),
            Err(save_error) => {
                placement.advance(PlacementState::Compensating);
                Err(self.compensate(&items, token, save_error).await)
            }
        }
    }

    /// Fetches each product in request order and prices its line.
    async fn price_lines(
        &self,
        lines: &[OrderLineRequest],
        token: &AuthToken,
    ) -> Result<Vec<PricedLine>, PlacementError> {
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self
                .catalog
                .get_product(line.product_id, token)
                .await
                .map_err(|e| match e {
                    CatalogError::ProductNotFound(id) => PlacementError::ProductNotFound(id),
                    source => PlacementError::ProductLookupFailed {
                        product_id: line.product_id,
                        source,
                    },
                })?;
            priced.push(PricedLine::from_catalog(line, &product)?);
        }
        Ok(priced)
    }

    /// Gives deducted stock back after a failed save. Attempted once.
    #[tracing::instrument(skip(self, items, token, save_error), fields(items = items.len()))]
    async fn compensate(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
        save_error: StoreError,
    ) -> PlacementError {
        tracing::warn!(error = %save_error, "order save failed, restoring stock");

        match self.catalog.restore_stock(items, token).await {
            Ok(()) => {
                metrics::counter!("order_compensations_total", "outcome" => "completed")
                    .increment(1);
                tracing::info!("stock restored");
                PlacementError::OrderProcessingFailed(save_error)
            }
            Err(restore_error) => {
                metrics::counter!("order_compensations_total", "outcome" => "failed")
                    .increment(1);
                metrics::counter!("order_compensation_failures_total").increment(1);
                tracing::error!(
                    reconciliation_required = true,
                    save_error = %save_error,
                    restore_error = %restore_error,
                    unrestored = ?items,
                    "stock restoration failed after order save failure"
                );
                PlacementError::CompensationFailed {
                    save_error,
                    restore_error,
                    unrestored: items.to_vec(),
                }
            }
        }
    }
}
