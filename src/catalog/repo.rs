use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

/// Side writes against the menu. Each call is one independent update and is
/// not coordinated with order creation.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn reduce_stock(&self, item_name: &str, quantity: i32) -> anyhow::Result<u64>;
    async fn bump_popularity(&self, food_id: i64) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgCatalogRepo {
    db: PgPool,
}

impl PgCatalogRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogRepo for PgCatalogRepo {
    async fn reduce_stock(&self, item_name: &str, quantity: i32) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"UPDATE food_items SET stock_level = stock_level - $1 WHERE name = $2"#,
        )
        .bind(quantity)
        .bind(item_name)
        .execute(&self.db)
        .await
        .context("reduce stock")?;
        Ok(res.rows_affected())
    }

    async fn bump_popularity(&self, food_id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(r#"UPDATE food_items SET popularity = popularity + 1 WHERE id = $1"#)
            .bind(food_id)
            .execute(&self.db)
            .await
            .context("bump popularity")?;
        Ok(res.rows_affected())
    }
}
