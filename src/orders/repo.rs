use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;

use crate::orders::repo_types::{InsertedOrder, NewOrder, OrderRow, OrderStatus};

/// Storage of persisted orders. Every status mutation is a single guarded
/// update; the returned affected-row count is the only signal that the
/// guard held.
#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn insert(&self, order: &NewOrder) -> anyhow::Result<InsertedOrder>;
    async fn find(&self, id: i64) -> anyhow::Result<Option<OrderRow>>;
    /// All orders, optionally filtered by status, by delivery date and time.
    async fn list(&self, status: Option<OrderStatus>) -> anyhow::Result<Vec<OrderRow>>;
    /// Orders placed from `phone_number`, newest first.
    async fn list_by_phone(&self, phone_number: &str) -> anyhow::Result<Vec<OrderRow>>;
    /// `pending -> cancelled` for orders created at most `window_secs` ago,
    /// measured on the store's own clock (the one that stamped `created_at`).
    async fn cancel(&self, id: i64, window_secs: i64) -> anyhow::Result<u64>;
    /// `pending -> delivered`.
    async fn mark_delivered(&self, id: i64) -> anyhow::Result<u64>;
    /// `cancelled -> refunded` for Google Pay orders.
    async fn refund(&self, id: i64) -> anyhow::Result<u64>;
}

const ORDER_COLUMNS: &str = r#"
    id, request_id, user_name, phone_number, address, description, order_type,
    delivery_date, delivery_time, total_items, total_price, payment_method,
    transaction_id, cart_items, status, created_at
"#;

#[derive(Clone)]
pub struct PgOrderRepo {
    db: PgPool,
}

impl PgOrderRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepo for PgOrderRepo {
    async fn insert(&self, order: &NewOrder) -> anyhow::Result<InsertedOrder> {
        let inserted = sqlx::query_as::<_, (i64, OffsetDateTime)>(
            r#"
            INSERT INTO orders (request_id, user_name, phone_number, address, description,
                                order_type, delivery_date, delivery_time, total_items,
                                total_price, payment_method, transaction_id, cart_items)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (request_id) DO NOTHING
            RETURNING id, created_at
            "#,
        )
        .bind(order.request_id)
        .bind(&order.user_name)
        .bind(&order.phone_number)
        .bind(&order.address)
        .bind(&order.description)
        .bind(order.order_type.as_str())
        .bind(order.delivery_date)
        .bind(order.delivery_time)
        .bind(order.total_items)
        .bind(order.total_price)
        .bind(order.payment_method.as_str())
        .bind(order.transaction_id.as_deref())
        .bind(Json(&order.cart_items))
        .fetch_optional(&self.db)
        .await
        .context("insert order")?;

        if let Some((id, created_at)) = inserted {
            return Ok(InsertedOrder {
                id,
                created_at,
                duplicate: false,
            });
        }

        // Only a request id conflict suppresses the insert.
        let (id, created_at) = sqlx::query_as::<_, (i64, OffsetDateTime)>(
            r#"SELECT id, created_at FROM orders WHERE request_id = $1"#,
        )
        .bind(order.request_id)
        .fetch_one(&self.db)
        .await
        .context("load order for duplicate request id")?;

        Ok(InsertedOrder {
            id,
            created_at,
            duplicate: true,
        })
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<OrderRow>> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find order")?;
        Ok(row)
    }

    async fn list(&self, status: Option<OrderStatus>) -> anyhow::Result<Vec<OrderRow>> {
        let sql = format!(
            r#"
            SELECT {}
              FROM orders
             WHERE ($1::text IS NULL OR LOWER(status) = $1)
             ORDER BY delivery_date ASC, delivery_time ASC, id ASC
            "#,
            ORDER_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(status.map(OrderStatus::as_str))
            .fetch_all(&self.db)
            .await
            .context("list orders")?;
        Ok(rows)
    }

    async fn list_by_phone(&self, phone_number: &str) -> anyhow::Result<Vec<OrderRow>> {
        let sql = format!(
            r#"
            SELECT {}
              FROM orders
             WHERE phone_number = $1
             ORDER BY created_at DESC, id DESC
            "#,
            ORDER_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(phone_number)
            .fetch_all(&self.db)
            .await
            .context("list orders by phone")?;
        Ok(rows)
    }

    async fn cancel(&self, id: i64, window_secs: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE orders SET status = 'cancelled'
             WHERE id = $1 AND LOWER(status) = 'pending'
               AND created_at >= now() - make_interval(secs => $2)
            "#,
        )
        .bind(id)
        .bind(window_secs as f64)
        .execute(&self.db)
        .await
        .context("cancel order")?;
        Ok(res.rows_affected())
    }

    async fn mark_delivered(&self, id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE orders SET status = 'delivered'
             WHERE id = $1 AND LOWER(status) = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("mark order delivered")?;
        Ok(res.rows_affected())
    }

    async fn refund(&self, id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE orders SET status = 'refunded'
             WHERE id = $1 AND LOWER(status) = 'cancelled' AND payment_method = 'Google Pay'
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("refund order")?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use super::*;
    use crate::orders::repo_types::PaymentMethod;

    /// Mutex-guarded vector with the same guard semantics as the SQL
    /// statements above. `now` stands in for the database clock.
    pub struct InMemoryOrderRepo {
        rows: Mutex<Vec<OrderRow>>,
        now: Mutex<OffsetDateTime>,
    }

    impl InMemoryOrderRepo {
        pub fn new(now: OffsetDateTime) -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                now: Mutex::new(now),
            }
        }

        pub fn set_now(&self, now: OffsetDateTime) {
            *self.now.lock().unwrap() = now;
        }

        pub fn set_status(&self, id: i64, status: &str) {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
                row.status = status.to_string();
            }
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn update_where<F>(&self, id: i64, to: OrderStatus, guard: F) -> u64
        where
            F: Fn(&OrderRow) -> bool,
        {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|r| r.id == id && guard(r)) {
                Some(row) => {
                    row.status = to.as_str().to_string();
                    1
                }
                None => 0,
            }
        }
    }

    #[async_trait]
    impl OrderRepo for InMemoryOrderRepo {
        async fn insert(&self, order: &NewOrder) -> anyhow::Result<InsertedOrder> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(existing) = order
                .request_id
                .and_then(|rid| rows.iter().find(|r| r.request_id == Some(rid)))
            {
                return Ok(InsertedOrder {
                    id: existing.id,
                    created_at: existing.created_at,
                    duplicate: true,
                });
            }
            let id = rows.len() as i64 + 1;
            let created_at = *self.now.lock().unwrap();
            rows.push(OrderRow {
                id,
                request_id: order.request_id,
                user_name: order.user_name.clone(),
                phone_number: order.phone_number.clone(),
                address: order.address.clone(),
                description: order.description.clone(),
                order_type: order.order_type.as_str().to_string(),
                delivery_date: order.delivery_date,
                delivery_time: order.delivery_time,
                total_items: order.total_items,
                total_price: order.total_price,
                payment_method: order.payment_method.as_str().to_string(),
                transaction_id: order.transaction_id.clone(),
                cart_items: Json(order.cart_items.clone()),
                status: OrderStatus::Pending.as_str().to_string(),
                created_at,
            });
            Ok(InsertedOrder {
                id,
                created_at,
                duplicate: false,
            })
        }

        async fn find(&self, id: i64) -> anyhow::Result<Option<OrderRow>> {
            Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn list(&self, status: Option<OrderStatus>) -> anyhow::Result<Vec<OrderRow>> {
            let mut rows: Vec<OrderRow> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| status.map_or(true, |s| r.status.eq_ignore_ascii_case(s.as_str())))
                .cloned()
                .collect();
            // NULL dates sort last, as in Postgres ascending order.
            rows.sort_by_key(|r| {
                (
                    r.delivery_date.is_none(),
                    r.delivery_date,
                    r.delivery_time.is_none(),
                    r.delivery_time,
                    r.id,
                )
            });
            Ok(rows)
        }

        async fn list_by_phone(&self, phone_number: &str) -> anyhow::Result<Vec<OrderRow>> {
            let mut rows: Vec<OrderRow> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.phone_number == phone_number)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(rows)
        }

        async fn cancel(&self, id: i64, window_secs: i64) -> anyhow::Result<u64> {
            let created_since = *self.now.lock().unwrap() - time::Duration::seconds(window_secs);
            Ok(self.update_where(id, OrderStatus::Cancelled, |r| {
                r.status.eq_ignore_ascii_case("pending") && r.created_at >= created_since
            }))
        }

        async fn mark_delivered(&self, id: i64) -> anyhow::Result<u64> {
            Ok(self.update_where(id, OrderStatus::Delivered, |r| {
                r.status.eq_ignore_ascii_case("pending")
            }))
        }

        async fn refund(&self, id: i64) -> anyhow::Result<u64> {
            Ok(self.update_where(id, OrderStatus::Refunded, |r| {
                r.status.eq_ignore_ascii_case("cancelled")
                    && r.payment_method == PaymentMethod::GooglePay.as_str()
            }))
        }
    }
}
