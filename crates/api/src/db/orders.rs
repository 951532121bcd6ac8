//! Order repository for database operations.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use atelier_core::{OrderId, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderLine};

const ORDER_COLUMNS: &str = "id, user_id, user_email, user_name, total_amount, status, \
                             payment_intent_id, payment_status, shipping_address, shipping_city, \
                             shipping_postal_code, shipping_country, shipping_phone, notes, \
                             created_at, updated_at";

const LINE_COLUMNS: &str =
    "product_id, product_name, unit_price, quantity, size, color, image";

/// Everything needed to persist a validated order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub user_email: String,
    pub user_name: Option<String>,
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub payment_intent_id: Option<String>,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub shipping_phone: Option<String>,
    pub notes: Option<String>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its line snapshots.
    ///
    /// Takes a connection so the insert shares a transaction with the stock
    /// decrements; if anything downstream fails, the whole order (and the
    /// decrements) roll back together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails.
    pub async fn insert(
        conn: &mut PgConnection,
        new_order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let mut order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders
                 (user_id, user_email, user_name, total_amount, status, payment_intent_id,
                  shipping_address, shipping_city, shipping_postal_code, shipping_country,
                  shipping_phone, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new_order.user_id)
        .bind(&new_order.user_email)
        .bind(&new_order.user_name)
        .bind(new_order.total_amount)
        .bind(OrderStatus::Pending)
        .bind(&new_order.payment_intent_id)
        .bind(&new_order.shipping_address)
        .bind(&new_order.shipping_city)
        .bind(&new_order.shipping_postal_code)
        .bind(&new_order.shipping_country)
        .bind(&new_order.shipping_phone)
        .bind(&new_order.notes)
        .fetch_one(&mut *conn)
        .await?;

        for (position, line) in new_order.lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_lines
                     (order_id, position, product_id, product_name, unit_price, quantity,
                      size, color, image)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(order.id)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(&line.size)
            .bind(&line.color)
            .bind(&line.image)
            .execute(&mut *conn)
            .await?;
        }

        order.lines.clone_from(&new_order.lines);
        Ok(order)
    }

    /// Get an order by ID, with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match order {
            Some(order) => Ok(Some(self.attach_lines(vec![order]).await?.swap_remove(0))),
            None => Ok(None),
        }
    }

    /// Get the order linked to a payment intent, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent_id = $1"
        ))
        .bind(payment_intent_id)
        .fetch_optional(self.pool)
        .await?;

        match order {
            Some(order) => Ok(Some(self.attach_lines(vec![order]).await?.swap_remove(0))),
            None => Ok(None),
        }
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_lines(orders).await
    }

    /// List every order, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.attach_lines(orders).await
    }

    /// Set an order's lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(self.attach_lines(vec![order]).await?.swap_remove(0))
    }

    /// Record a confirmed payment for the order linked to this intent.
    ///
    /// The guarded WHERE clause makes at-least-once webhook delivery safe:
    /// a replayed event matches zero rows and changes nothing. The status
    /// only advances from `pending`; later fulfilment states are preserved.
    ///
    /// Returns `true` if an order transitioned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_payment_success(
        &self,
        payment_intent_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET payment_status = 'succeeded',
                 status = CASE WHEN status = 'pending' THEN 'processing'::order_status
                               ELSE status END,
                 updated_at = now()
             WHERE payment_intent_id = $1
               AND payment_status IS DISTINCT FROM 'succeeded'",
        )
        .bind(payment_intent_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a failed payment for the order linked to this intent.
    ///
    /// A payment that already succeeded is never regressed to failed (the
    /// provider can deliver events out of order). Order status and stock are
    /// left untouched.
    ///
    /// Returns `true` if an order was updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_payment_failure(
        &self,
        payment_intent_id: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET payment_status = 'failed', updated_at = now()
             WHERE payment_intent_id = $1
               AND payment_status IS DISTINCT FROM 'succeeded'",
        )
        .bind(payment_intent_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Load line snapshots for a batch of orders in one query.
    async fn attach_lines(&self, mut orders: Vec<Order>) -> Result<Vec<Order>, RepositoryError> {
        if orders.is_empty() {
            return Ok(orders);
        }

        #[derive(sqlx::FromRow)]
        struct LineRow {
            order_id: OrderId,
            #[sqlx(flatten)]
            line: OrderLine,
        }

        let ids: Vec<uuid::Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();

        let rows = sqlx::query_as::<_, LineRow>(&format!(
            "SELECT order_id, {LINE_COLUMNS} FROM order_lines
             WHERE order_id = ANY($1)
             ORDER BY order_id, position"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            by_order.entry(row.order_id).or_default().push(row.line);
        }

        for order in &mut orders {
            order.lines = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }
}
