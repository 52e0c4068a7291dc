//! Paged order listing.

use common::{Page, PageRequest};
use domain::Order;
use order_store::OrderStore;

use crate::error::QueryError;

/// Read-through listing of stored orders.
pub struct OrderQueryService<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> OrderQueryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists one page of orders: every order when `username` is `None`,
    /// otherwise only that user's.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(
        &self,
        username: Option<&str>,
        request: &PageRequest,
    ) -> Result<Page<Order>, QueryError> {
        let page = match username {
            Some(username) => self.store.find_by_username(username, request).await?,
            None => self.store.find_all(request).await?,
        };
        Ok(page)
    }

    /// Like [`list_orders`](Self::list_orders), parsing raw paging
    /// parameters first.
    pub async fn list_orders_with(
        &self,
        username: Option<&str>,
        page: u32,
        size: u32,
        sort_by: &str,
        sort_dir: &str,
    ) -> Result<Page<Order>, QueryError> {
        let request = PageRequest::parse(page, size, sort_by, sort_dir)?;
        self.list_orders(username, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{PageRequestError, ProductId};
    use domain::{DiscountPolicy, Money, NewOrder, PricedLine, Role};
    use order_store::InMemoryOrderStore;

    async fn seeded() -> OrderQueryService<InMemoryOrderStore> {
        let store = InMemoryOrderStore::new();
        for (user, cents) in [("alice", 100), ("bob", 200), ("alice", 300)] {
            let lines =
                vec![PricedLine::new(ProductId::new(), 1, Money::from_cents(cents)).unwrap()];
            let pricing = DiscountPolicy::price(&Role::User, Money::from_cents(cents));
            store.save(NewOrder::new(user, &pricing, lines)).await.unwrap();
        }
        OrderQueryService::new(store)
    }

    #[tokio::test]
    async fn test_list_all_orders() {
        let service = seeded().await;
        let page = service
            .list_orders(None, &PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 3);
    }

    #[tokio::test]
    async fn test_list_scoped_to_user() {
        let service = seeded().await;
        let page = service
            .list_orders_with(Some("alice"), 0, 10, "orderTotal", "desc")
            .await
            .unwrap();

        let totals: Vec<i64> = page.content.iter().map(|o| o.order_total().cents()).collect();
        assert_eq!(totals, vec![300, 100]);
    }

    #[tokio::test]
    async fn test_unknown_sort_field_is_rejected() {
        let service = seeded().await;
        let err = service
            .list_orders_with(None, 0, 10, "name", "asc")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::InvalidPageRequest(PageRequestError::UnknownSortField(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_size_is_rejected() {
        let service = seeded().await;
        let result = service.list_orders_with(None, 0, 0, "createdAt", "asc").await;
        assert!(matches!(result, Err(QueryError::InvalidPageRequest(_))));
    }
}
