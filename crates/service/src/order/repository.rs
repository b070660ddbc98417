use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use models::{order, order_item, product, OrderStatus};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::storage::memory::MemoryTable;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Decrement stock for every item (only where enough is left) and store
    /// the order with its items, all or nothing.
    async fn place(&self, order: &order::Model, items: &[order_item::Model]) -> Result<(), ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<order::Model>, ServiceError>;
    async fn items(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError>;
    /// Newest first.
    async fn list_for_seller(&self, subscriber_id: Uuid, page: Pagination) -> Result<Vec<order::Model>, ServiceError>;
    /// Move the order from `from` to `to`; with `restock` the item quantities
    /// go back to stock in the same write. `Conflict` when the stored status
    /// is no longer `from`.
    async fn set_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus, restock: bool) -> Result<(), ServiceError>;
}

pub struct SeaOrmOrderRepository {
    pub db: DatabaseConnection,
}

fn out_of_stock(product_id: Uuid) -> ServiceError {
    ServiceError::Conflict(format!("insufficient stock for product {product_id}"))
}

fn status_changed(id: Uuid, from: OrderStatus) -> ServiceError {
    ServiceError::Conflict(format!("order {id} is no longer {from}"))
}

#[async_trait]
impl OrderRepository for SeaOrmOrderRepository {
    async fn place(&self, o: &order::Model, items: &[order_item::Model]) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        for item in items {
            let res = product::Entity::update_many()
                .col_expr(product::Column::Stock, Expr::col(product::Column::Stock).sub(item.quantity))
                .col_expr(product::Column::UpdatedAt, Expr::value(o.created_at))
                .filter(product::Column::Id.eq(item.product_id))
                .filter(product::Column::IsActive.eq(true))
                .filter(product::Column::Stock.gte(item.quantity))
                .exec(&txn)
                .await?;
            if res.rows_affected == 0 {
                txn.rollback().await?;
                return Err(out_of_stock(item.product_id));
            }
        }
        order::Entity::insert(order::active_model(o)).exec_without_returning(&txn).await?;
        if !items.is_empty() {
            order_item::Entity::insert_many(items.iter().map(order_item::active_model))
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<order::Model>, ServiceError> {
        Ok(order::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn items(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&self.db)
            .await?)
    }

    async fn list_for_seller(&self, subscriber_id: Uuid, page: Pagination) -> Result<Vec<order::Model>, ServiceError> {
        let (idx, per) = page.normalize();
        Ok(order::Entity::find()
            .filter(order::Column::SubscriberId.eq(subscriber_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&self.db, per)
            .fetch_page(idx)
            .await?)
    }

    async fn set_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus, restock: bool) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let res = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(to.as_str()))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Status.eq(from.as_str()))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            txn.rollback().await?;
            return Err(status_changed(id, from));
        }
        if restock {
            let lines = order_item::Entity::find()
                .filter(order_item::Column::OrderId.eq(id))
                .all(&txn)
                .await?;
            for line in lines {
                product::Entity::update_many()
                    .col_expr(product::Column::Stock, Expr::col(product::Column::Stock).add(line.quantity))
                    .filter(product::Column::Id.eq(line.product_id))
                    .exec(&txn)
                    .await?;
            }
        }
        txn.commit().await?;
        Ok(())
    }
}

/// Shares the product table with the product repository so stock moves
/// are visible to both.
pub struct MemoryOrderRepository {
    products: Arc<MemoryTable<product::Model>>,
    orders: MemoryTable<order::Model>,
    lines: MemoryTable<order_item::Model>,
}

impl MemoryOrderRepository {
    pub fn new(products: Arc<MemoryTable<product::Model>>) -> Self {
        Self { products, orders: MemoryTable::new("orders"), lines: MemoryTable::new("order_items") }
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn place(&self, o: &order::Model, items: &[order_item::Model]) -> Result<(), ServiceError> {
        // the products lock is held until stock is committed
        self.products
            .with_rows(|rows| {
                for item in items {
                    let ok = rows
                        .iter()
                        .any(|p| p.id == item.product_id && p.is_active && p.stock >= item.quantity);
                    if !ok {
                        return Err(out_of_stock(item.product_id));
                    }
                }
                for item in items {
                    if let Some(p) = rows.iter_mut().find(|p| p.id == item.product_id) {
                        p.stock -= item.quantity;
                        p.updated_at = o.created_at;
                    }
                }
                Ok(())
            })
            .await?;
        self.orders.insert(o.clone()).await?;
        for item in items {
            self.lines.insert(item.clone()).await?;
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<order::Model>, ServiceError> {
        Ok(self.orders.by_id(id).await)
    }

    async fn items(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError> {
        self.lines.filter(|l| l.order_id == order_id).await
    }

    async fn list_for_seller(&self, subscriber_id: Uuid, page: Pagination) -> Result<Vec<order::Model>, ServiceError> {
        let mut rows = self.orders.filter(|o| o.subscriber_id == subscriber_id).await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.slice(rows))
    }

    async fn set_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus, restock: bool) -> Result<(), ServiceError> {
        let now = Utc::now().into();
        let moved = self
            .orders
            .modify_if(
                id,
                |o| o.status == from.as_str(),
                |o| {
                    o.status = to.as_str().to_string();
                    o.updated_at = now;
                },
            )
            .await
            .ok_or_else(|| ServiceError::not_found("order"))?;
        if !moved {
            return Err(status_changed(id, from));
        }
        if restock {
            let lines = self.lines.filter(|l| l.order_id == id).await?;
            self.products
                .with_rows(|rows| {
                    for line in &lines {
                        if let Some(p) = rows.iter_mut().find(|p| p.id == line.product_id) {
                            p.stock += line.quantity;
                        }
                    }
                })
                .await;
        }
        Ok(())
    }
}
