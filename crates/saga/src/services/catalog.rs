//! Catalog gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{CatalogProduct, ProductId, StockOperation};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors reported by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog refused the operation, e.g. insufficient stock.
    #[error("Catalog rejected the request: {0}")]
    Rejected(String),

    /// No product exists with the given ID.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The catalog could not be reached or answered with a server error.
    #[error("Catalog transport error: {0}")]
    Transport(String),

    /// The catalog answered with a body that could not be understood.
    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),
}

/// The caller's bearer token, forwarded unchanged to the catalog.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Remote stock and product operations.
///
/// Every call carries the caller's token; implementations must not inspect
/// or re-sign it.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Checks that every item is in stock without changing stock levels.
    async fn validate_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError>;

    /// Fetches the current catalog entry for a product.
    async fn get_product(
        &self,
        product_id: ProductId,
        token: &AuthToken,
    ) -> Result<CatalogProduct, CatalogError>;

    /// Decrements stock for every item.
    async fn deduct_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError>;

    /// Compensating call: adds the items back to stock.
    async fn restore_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError>;
}

#[async_trait]
impl<T: CatalogGateway + ?Sized> CatalogGateway for Arc<T> {
    async fn validate_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        (**self).validate_stock(items, token).await
    }

    async fn get_product(
        &self,
        product_id: ProductId,
        token: &AuthToken,
    ) -> Result<CatalogProduct, CatalogError> {
        (**self).get_product(product_id, token).await
    }

    async fn deduct_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        (**self).deduct_stock(items, token).await
    }

    async fn restore_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        (**self).restore_stock(items, token).await
    }
}

/// A call received by [`InMemoryCatalogGateway`], recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    Validate(Vec<StockOperation>),
    GetProduct(ProductId),
    Deduct(Vec<StockOperation>),
    Restore(Vec<StockOperation>),
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, CatalogProduct>,
    stock: HashMap<ProductId, u32>,
    calls: Vec<CatalogCall>,
    tokens: Vec<String>,
    fail_on_validate: bool,
    fail_on_lookup: bool,
    fail_on_deduct: bool,
    fail_on_restore: bool,
}

impl InMemoryCatalogState {
    /// Sums requested quantities per product and checks each total against
    /// its stock level. Returns the remaining level for every product.
    fn check_stock(
        &self,
        items: &[StockOperation],
    ) -> Result<HashMap<ProductId, u32>, CatalogError> {
        let mut requested: HashMap<ProductId, u64> = HashMap::new();
        for item in items {
            *requested.entry(item.product_id).or_insert(0) += u64::from(item.quantity);
        }

        requested
            .into_iter()
            .map(|(product_id, quantity)| {
                let available = self.stock.get(&product_id).copied().unwrap_or(0);
                u64::from(available)
                    .checked_sub(quantity)
                    .and_then(|left| u32::try_from(left).ok())
                    .map(|left| (product_id, left))
                    .ok_or_else(|| {
                        CatalogError::Rejected(format!(
                            "Insufficient stock for product {}: requested {}, available {}",
                            product_id, quantity, available
                        ))
                    })
            })
            .collect()
    }

    fn record(&mut self, call: CatalogCall, token: &AuthToken) {
        self.calls.push(call);
        self.tokens.push(token.as_str().to_string());
    }
}

/// In-memory catalog for tests and local runs.
///
/// Stock and product entries are kept separately so a product can pass
/// stock validation and still be missing at lookup time.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogGateway {
    state: Arc<Mutex<InMemoryCatalogState>>,
}

impl InMemoryCatalogGateway {
    /// Creates an empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product with the given stock level.
    pub async fn add_product(&self, product: CatalogProduct, stock: u32) {
        let mut state = self.state.lock().await;
        state.stock.insert(product.id, stock);
        state.products.insert(product.id, product);
    }

    /// Removes a product's catalog entry but keeps its stock level.
    pub async fn remove_product(&self, product_id: ProductId) {
        self.state.lock().await.products.remove(&product_id);
    }

    /// Sets the stock level of a product.
    pub async fn set_stock(&self, product_id: ProductId, quantity: u32) {
        self.state.lock().await.stock.insert(product_id, quantity);
    }

    /// Returns the current stock level of a product.
    pub async fn stock(&self, product_id: ProductId) -> u32 {
        self.state
            .lock()
            .await
            .stock
            .get(&product_id)
            .copied()
            .unwrap_or(0)
    }

    /// Configures stock validation to fail.
    pub async fn set_fail_on_validate(&self, fail: bool) {
        self.state.lock().await.fail_on_validate = fail;
    }

    /// Configures product lookups to fail with a transport error.
    pub async fn set_fail_on_lookup(&self, fail: bool) {
        self.state.lock().await.fail_on_lookup = fail;
    }

    /// Configures stock deduction to fail.
    pub async fn set_fail_on_deduct(&self, fail: bool) {
        self.state.lock().await.fail_on_deduct = fail;
    }

    /// Configures stock restoration to fail.
    pub async fn set_fail_on_restore(&self, fail: bool) {
        self.state.lock().await.fail_on_restore = fail;
    }

    /// Returns every call received so far, in order.
    pub async fn calls(&self) -> Vec<CatalogCall> {
        self.state.lock().await.calls.clone()
    }

    /// Returns the tokens received so far, one per call.
    pub async fn tokens(&self) -> Vec<String> {
        self.state.lock().await.tokens.clone()
    }

    /// Returns the item sets passed to `deduct_stock`.
    pub async fn deductions(&self) -> Vec<Vec<StockOperation>> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::Deduct(items) => Some(items),
                _ => None,
            })
            .collect()
    }

    /// Returns the item sets passed to `restore_stock`.
    pub async fn restorations(&self) -> Vec<Vec<StockOperation>> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::Restore(items) => Some(items),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalogGateway {
    async fn validate_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        state.record(CatalogCall::Validate(items.to_vec()), token);

        if state.fail_on_validate {
            return Err(CatalogError::Rejected("Stock unavailable".to_string()));
        }
        state.check_stock(items).map(|_| ())
    }

    async fn get_product(
        &self,
        product_id: ProductId,
        token: &AuthToken,
    ) -> Result<CatalogProduct, CatalogError> {
        let mut state = self.state.lock().await;
        state.record(CatalogCall::GetProduct(product_id), token);

        if state.fail_on_lookup {
            return Err(CatalogError::Transport(
                "Simulated catalog outage".to_string(),
            ));
        }
        state
            .products
            .get(&product_id)
            .cloned()
            .ok_or(CatalogError::ProductNotFound(product_id))
    }

    async fn deduct_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        state.record(CatalogCall::Deduct(items.to_vec()), token);

        if state.fail_on_deduct {
            return Err(CatalogError::Rejected(
                "Stock deduction refused".to_string(),
            ));
        }

        // All or nothing
        let remaining = state.check_stock(items)?;
        state.stock.extend(remaining);
        Ok(())
    }

    async fn restore_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        state.record(CatalogCall::Restore(items.to_vec()), token);

        if state.fail_on_restore {
            return Err(CatalogError::Transport(
                "Simulated restore failure".to_string(),
            ));
        }

        for item in items {
            let level = state.stock.entry(item.product_id).or_insert(0);
            *level = level.saturating_add(item.quantity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;

    fn token() -> AuthToken {
        AuthToken::new("secret-token")
    }

    async fn catalog_with(stock: u32) -> (InMemoryCatalogGateway, ProductId) {
        let catalog = InMemoryCatalogGateway::new();
        let id = ProductId::new();
        let product = CatalogProduct::new(id, Money::from_dollars(10), true).unwrap();
        catalog.add_product(product, stock).await;
        (catalog, id)
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let rendered = format!("{:?}", token());
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn test_validate_checks_levels_without_changing_them() {
        let (catalog, id) = catalog_with(3).await;

        assert!(catalog
            .validate_stock(&[StockOperation::new(id, 3)], &token())
            .await
            .is_ok());
        let result = catalog
            .validate_stock(&[StockOperation::new(id, 4)], &token())
            .await;
        assert!(matches!(result, Err(CatalogError::Rejected(_))));
        assert_eq!(catalog.stock(id).await, 3);
    }

    #[tokio::test]
    async fn test_deduct_and_restore() {
        let (catalog, id) = catalog_with(5).await;
        let items = [StockOperation::new(id, 2)];

        catalog.deduct_stock(&items, &token()).await.unwrap();
        assert_eq!(catalog.stock(id).await, 3);

        catalog.restore_stock(&items, &token()).await.unwrap();
        assert_eq!(catalog.stock(id).await, 5);
        assert_eq!(catalog.deductions().await, vec![items.to_vec()]);
        assert_eq!(catalog.restorations().await, vec![items.to_vec()]);
    }

    #[tokio::test]
    async fn test_repeated_product_is_checked_against_its_total() {
        let (catalog, id) = catalog_with(5).await;
        let items = [StockOperation::new(id, 3), StockOperation::new(id, 3)];

        let validated = catalog.validate_stock(&items, &token()).await;
        assert!(matches!(validated, Err(CatalogError::Rejected(_))));

        let deducted = catalog.deduct_stock(&items, &token()).await;
        assert!(matches!(deducted, Err(CatalogError::Rejected(_))));
        assert_eq!(catalog.stock(id).await, 5);
    }

    #[tokio::test]
    async fn test_repeated_product_within_stock_deducts_the_sum() {
        let (catalog, id) = catalog_with(5).await;
        let items = [StockOperation::new(id, 2), StockOperation::new(id, 3)];

        catalog.validate_stock(&items, &token()).await.unwrap();
        catalog.deduct_stock(&items, &token()).await.unwrap();
        assert_eq!(catalog.stock(id).await, 0);

        catalog.restore_stock(&items, &token()).await.unwrap();
        assert_eq!(catalog.stock(id).await, 5);
    }

    #[tokio::test]
    async fn test_deduct_is_all_or_nothing() {
        let (catalog, a) = catalog_with(5).await;
        let b = ProductId::new();
        catalog.set_stock(b, 1).await;

        let result = catalog
            .deduct_stock(
                &[StockOperation::new(a, 2), StockOperation::new(b, 2)],
                &token(),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(catalog.stock(a).await, 5);
        assert_eq!(catalog.stock(b).await, 1);
    }

    #[tokio::test]
    async fn test_removed_product_is_not_found_but_keeps_stock() {
        let (catalog, id) = catalog_with(5).await;
        catalog.remove_product(id).await;

        assert!(catalog
            .validate_stock(&[StockOperation::new(id, 1)], &token())
            .await
            .is_ok());
        assert_eq!(
            catalog.get_product(id, &token()).await,
            Err(CatalogError::ProductNotFound(id))
        );
    }

    #[tokio::test]
    async fn test_token_forwarded_on_every_call() {
        let (catalog, id) = catalog_with(5).await;
        let items = [StockOperation::new(id, 1)];

        catalog.validate_stock(&items, &token()).await.unwrap();
        catalog.get_product(id, &token()).await.unwrap();
        catalog.deduct_stock(&items, &token()).await.unwrap();

        let tokens = catalog.tokens().await;
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t == "secret-token"));
    }

    #[tokio::test]
    async fn test_failure_flags() {
        let (catalog, id) = catalog_with(5).await;
        let items = [StockOperation::new(id, 1)];

        catalog.set_fail_on_restore(true).await;
        assert!(matches!(
            catalog.restore_stock(&items, &token()).await,
            Err(CatalogError::Transport(_))
        ));
        assert_eq!(catalog.stock(id).await, 5);

        catalog.set_fail_on_lookup(true).await;
        assert!(matches!(
            catalog.get_product(id, &token()).await,
            Err(CatalogError::Transport(_))
        ));
    }
}
