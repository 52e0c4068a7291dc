use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, Page, PageRequest, Sort, SortDirection, SortField};
use domain::{NewOrder, Order};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{OrderStore, validate_order_for_save},
};

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: Vec<Order>,
    fail_on_save: bool,
    save_attempts: usize,
}

/// In-memory order store implementation for testing.
///
/// This implementation keeps all orders in memory and provides the same
/// interface as the PostgreSQL implementation. Saves can be made to fail
/// on demand to exercise compensation paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail every save until reset.
    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns how many times `save` has been called, successful or not.
    pub async fn save_attempts(&self) -> usize {
        self.state.read().await.save_attempts
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.state.write().await.orders.clear();
    }

    async fn page_where(
        &self,
        request: &PageRequest,
        filter: impl Fn(&Order) -> bool,
    ) -> Page<Order> {
        let state = self.state.read().await;
        let mut matching: Vec<&Order> = state.orders.iter().filter(|o| filter(o)).collect();
        matching.sort_by(|a, b| compare_orders(a, b, request.sort));

        let total = matching.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content = matching
            .into_iter()
            .skip(offset)
            .take(request.size as usize)
            .cloned()
            .collect();

        Page::new(content, request, total)
    }
}

/// Orders by the requested field, breaking ties by ID so pages are stable.
fn compare_orders(a: &Order, b: &Order, sort: Sort) -> Ordering {
    let ordering = match sort.field {
        SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        SortField::OrderTotal => a.order_total().cmp(&b.order_total()),
        SortField::Username => a.username().cmp(b.username()),
        SortField::Id => a.id().cmp(&b.id()),
    };
    let ordering = match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };
    ordering.then_with(|| a.id().cmp(&b.id()))
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        state.save_attempts += 1;

        if state.fail_on_save {
            return Err(StoreError::Unavailable(
                "Simulated persistence failure".to_string(),
            ));
        }

        validate_order_for_save(&order)?;

        let order = order.into_order(OrderId::new(), Utc::now());
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id() == id).cloned())
    }

    async fn find_by_username(&self, username: &str, page: &PageRequest) -> Result<Page<Order>> {
        Ok(self.page_where(page, |o| o.username() == username).await)
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Order>> {
        Ok(self.page_where(page, |_| true).await)
    }
}
