use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, Page, PageRequest, ProductId, SortDirection, SortField};
use domain::{DiscountStep, Money, NewOrder, Order, PricedLine};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{OrderStore, validate_order_for_save},
};

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn sort_column(field: SortField) -> &'static str {
        match field {
            SortField::CreatedAt => "created_at",
            SortField::OrderTotal => "order_total_cents",
            SortField::Username => "username",
            SortField::Id => "id",
        }
    }

    fn row_to_line(order_id: OrderId, row: &PgRow) -> Result<PricedLine> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::CorruptRow {
            order_id,
            reason: format!("quantity {quantity} out of range"),
        })?;

        Ok(PricedLine {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            line_total: Money::from_cents(row.try_get("line_total_cents")?),
        })
    }

    fn row_to_order(row: &PgRow, lines: Vec<PricedLine>) -> Result<Order> {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let applied: serde_json::Value = row.try_get("applied_discounts")?;
        let applied_discounts: Vec<DiscountStep> = serde_json::from_value(applied)?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        let new_order = NewOrder {
            username: row.try_get("username")?,
            order_total: Money::from_cents(row.try_get("order_total_cents")?),
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
            applied_discounts,
            lines,
        };
        Ok(new_order.into_order(id, created_at))
    }

    /// Loads the lines of several orders at once, grouped by order.
    async fn load_lines(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<PricedLine>>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents, line_total_cents
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<Uuid, Vec<PricedLine>> = HashMap::new();
        for row in rows {
            let order_id: Uuid = row.try_get("order_id")?;
            let line = Self::row_to_line(OrderId::from_uuid(order_id), &row)?;
            lines.entry(order_id).or_default().push(line);
        }
        Ok(lines)
    }

    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;
        let mut lines = self.load_lines(&ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_order(row, lines.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn find_page(&self, username: Option<&str>, request: &PageRequest) -> Result<Page<Order>> {
        let mut where_clause = String::new();
        let mut param_count = 0;

        if username.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" WHERE username = ${param_count}"));
        }

        let direction = match request.sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        let sql = format!(
            "SELECT id, username, order_total_cents, subtotal_cents, applied_discounts, created_at \
             FROM orders{where_clause} ORDER BY {} {direction}, id ASC LIMIT ${} OFFSET ${}",
            Self::sort_column(request.sort.field),
            param_count + 1,
            param_count + 2,
        );
        let count_sql = format!("SELECT COUNT(*) FROM orders{where_clause}");

        let mut query = sqlx::query(&sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(username) = username {
            query = query.bind(username);
            count_query = count_query.bind(username);
        }

        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
        let rows = query
            .bind(i64::from(request.size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total = count_query.fetch_one(&self.pool).await?;

        let orders = self.hydrate(rows).await?;
        Ok(Page::new(orders, request, u64::try_from(total).unwrap_or(0)))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(username = %order.username, lines = order.lines.len()))]
    async fn save(&self, order: NewOrder) -> Result<Order> {
        validate_order_for_save(&order)?;

        let applied = serde_json::to_value(&order.applied_discounts)?;

        // Start a transaction
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (username, order_total_cents, subtotal_cents, applied_discounts)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(&order.username)
        .bind(order.order_total.cents())
        .bind(order.subtotal.cents())
        .bind(applied)
        .fetch_one(&mut *tx)
        .await?;

        let id: Uuid = row.try_get("id")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, position, product_id, quantity, unit_price_cents, line_total_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(position as i32)
            .bind(line.product_id.as_uuid())
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.cents())
            .bind(line.line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(order_id = %id, "order stored");

        Ok(order.into_order(OrderId::from_uuid(id), created_at))
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, order_total_cents, subtotal_cents, applied_discounts, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_username(&self, username: &str, page: &PageRequest) -> Result<Page<Order>> {
        self.find_page(Some(username), page).await
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Order>> {
        self.find_page(None, page).await
    }
}
