//! # Order Repository
//!
//! Persistence for the Sale and Cart aggregates. Both kinds share one
//! generic repository; [`OrderTables`] supplies the table names.
//!
//! ## Save Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         save() for one Update                           │
//! │                                                                         │
//! │  UPDATE sales SET ..., version = version + 1                           │
//! │   WHERE id = ? AND version = ?                                          │
//! │       │                                                                 │
//! │       ├── 0 rows, id exists   → DbError::Conflict  (rollback)          │
//! │       ├── 0 rows, id missing  → DbError::NotFound  (rollback)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DELETE FROM sale_items WHERE order_id = ?                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO sale_items ... (one row per item, position = index)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use storefront_core::{
    CartKind, CustomerId, DiscountRate, Order, OrderItem, OrderKind, PageRequest, ProductId,
    SaleKind,
};

use super::{format_timestamp, parse_decimal, parse_timestamp, parse_uuid, Change};
use crate::error::{DbError, DbResult};

// =============================================================================
// Table Mapping
// =============================================================================

/// Where an order kind lives in the schema.
pub trait OrderTables: OrderKind {
    const TABLE: &'static str;
    const ITEMS_TABLE: &'static str;
}

impl OrderTables for SaleKind {
    const TABLE: &'static str = "sales";
    const ITEMS_TABLE: &'static str = "sale_items";
}

impl OrderTables for CartKind {
    const TABLE: &'static str = "carts";
    const ITEMS_TABLE: &'static str = "cart_items";
}

pub type SaleRepository = OrderRepository<SaleKind>;
pub type CartRepository = OrderRepository<CartKind>;

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    number: String,
    date: String,
    customer_id: String,
    branch: String,
    is_cancelled: bool,
    version: i64,
}

impl OrderRow {
    fn into_order<K: OrderKind>(self, items: Vec<OrderItem>) -> DbResult<Order<K>> {
        Ok(Order::from_storage(
            parse_uuid("id", &self.id)?,
            self.number,
            parse_timestamp("date", &self.date)?,
            CustomerId::new(parse_uuid("customer_id", &self.customer_id)?),
            self.branch,
            self.is_cancelled,
            items,
            self.version,
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    order_id: String,
    id: String,
    product_id: String,
    quantity: i32,
    unit_price: String,
    discount_rate: String,
    is_cancelled: bool,
}

impl ItemRow {
    fn into_item(self) -> DbResult<OrderItem> {
        let rate = parse_decimal("discount_rate", &self.discount_rate)?;
        let discount_rate = DiscountRate::from_decimal(rate)
            .map_err(|_| DbError::corrupt("discount_rate", &self.discount_rate))?;

        Ok(OrderItem::from_storage(
            parse_uuid("id", &self.id)?,
            ProductId::new(parse_uuid("product_id", &self.product_id)?),
            self.quantity,
            parse_decimal("unit_price", &self.unit_price)?,
            discount_rate,
            self.is_cancelled,
        ))
    }
}

const ORDER_COLUMNS: &str = "id, number, date, customer_id, branch, is_cancelled, version";
const ITEM_COLUMNS: &str =
    "order_id, id, product_id, quantity, unit_price, discount_rate, is_cancelled";

// =============================================================================
// Repository
// =============================================================================

/// Unit of work over one order kind.
///
/// Each read runs in its own read transaction. Writes are staged with [`add`],
/// [`update`] and [`delete`] and applied together by [`save`].
///
/// [`add`]: OrderRepository::add
/// [`update`]: OrderRepository::update
/// [`delete`]: OrderRepository::delete
/// [`save`]: OrderRepository::save
#[derive(Debug)]
pub struct OrderRepository<K: OrderTables> {
    pool: SqlitePool,
    pending: Vec<Change<Order<K>>>,
}

impl<K: OrderTables> OrderRepository<K> {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository {
            pool,
            pending: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Loads an order with its items, cancelled or not.
    ///
    /// Header and items are read in one transaction, so a concurrent save
    /// cannot pair a header with another version's items.
    pub async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Order<K>>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let Some(row) = fetch_order_row::<K>(&mut *tx, id).await? else {
            return Ok(None);
        };
        let items = fetch_items::<K>(&mut *tx, &row.id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        row.into_order(items).map(Some)
    }

    pub async fn exists(&self, id: Uuid) -> DbResult<bool> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?1", K::TABLE);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// One page of orders, oldest first (ties broken by id).
    pub async fn list(&self, page: PageRequest) -> DbResult<Vec<Order<K>>> {
        debug!(
            entity = K::NAME,
            page = page.page(),
            size = page.size(),
            "Listing orders"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let rows = fetch_page_rows::<K>(&mut *tx, page).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let item_rows = fetch_page_items::<K>(&mut *tx, page).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut items_by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for item in item_rows {
            let order_id = item.order_id.clone();
            items_by_order
                .entry(order_id)
                .or_default()
                .push(item.into_item()?);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    pub async fn count(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", K::TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Staged writes
    // -------------------------------------------------------------------------

    /// Stages an insert of `order` and its items.
    pub fn add(&mut self, order: &Order<K>) {
        debug!(entity = K::NAME, id = %order.id(), "Staging add");
        self.pending.push(Change::Add(order.clone()));
    }

    /// Stages a versioned update with wholesale item replacement.
    pub fn update(&mut self, order: &Order<K>) {
        debug!(entity = K::NAME, id = %order.id(), version = order.version(), "Staging update");
        self.pending.push(Change::Update(order.clone()));
    }

    /// Stages removal of `order` and its items.
    pub fn delete(&mut self, order: &Order<K>) {
        debug!(entity = K::NAME, id = %order.id(), "Staging delete");
        self.pending.push(Change::Delete(order.clone()));
    }

    /// Number of staged changes not yet saved.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Applies every staged change in one transaction.
    ///
    /// Returns the number of changes written. The staged list is consumed
    /// either way; after an error nothing from the batch is in the database.
    pub async fn save(&mut self) -> DbResult<usize> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for change in &pending {
            match change {
                Change::Add(order) => insert_order(&mut *tx, order).await?,
                Change::Update(order) => update_order(&mut *tx, order).await?,
                Change::Delete(order) => delete_order(&mut *tx, order).await?,
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(entity = K::NAME, changes = pending.len(), "Saved unit of work");
        Ok(pending.len())
    }
}

// =============================================================================
// Statements
// =============================================================================

async fn fetch_order_row<K: OrderTables>(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> DbResult<Option<OrderRow>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", ORDER_COLUMNS, K::TABLE);
    let row = sqlx::query_as(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn fetch_items<K: OrderTables>(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderItem>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE order_id = ?1 ORDER BY position",
        ITEM_COLUMNS,
        K::ITEMS_TABLE
    );
    sqlx::query_as::<_, ItemRow>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(ItemRow::into_item)
        .collect()
}

async fn fetch_page_rows<K: OrderTables>(
    conn: &mut SqliteConnection,
    page: PageRequest,
) -> DbResult<Vec<OrderRow>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY date, id LIMIT ?1 OFFSET ?2",
        ORDER_COLUMNS,
        K::TABLE
    );
    let rows = sqlx::query_as(&sql)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Items for every order on `page`, in one query.
async fn fetch_page_items<K: OrderTables>(
    conn: &mut SqliteConnection,
    page: PageRequest,
) -> DbResult<Vec<ItemRow>> {
    let sql = format!(
        "SELECT {items} FROM {items_table}
         WHERE order_id IN (SELECT id FROM {table} ORDER BY date, id LIMIT ?1 OFFSET ?2)
         ORDER BY order_id, position",
        items = ITEM_COLUMNS,
        items_table = K::ITEMS_TABLE,
        table = K::TABLE
    );
    let rows = sqlx::query_as(&sql)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

async fn insert_order<K: OrderTables>(conn: &mut SqliteConnection, order: &Order<K>) -> DbResult<()> {
    let now = format_timestamp(Utc::now());
    let sql = format!(
        "INSERT INTO {} (
            id, number, date, customer_id, branch, is_cancelled, version,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        K::TABLE
    );

    sqlx::query(&sql)
        .bind(order.id().to_string())
        .bind(order.number())
        .bind(format_timestamp(order.date()))
        .bind(order.customer_id().to_string())
        .bind(order.branch())
        .bind(order.is_cancelled())
        .bind(order.version())
        .bind(&now)
        .execute(&mut *conn)
        .await?;

    insert_items(conn, order).await
}

async fn update_order<K: OrderTables>(conn: &mut SqliteConnection, order: &Order<K>) -> DbResult<()> {
    let id = order.id().to_string();
    let sql = format!(
        "UPDATE {} SET
            number = ?1,
            date = ?2,
            customer_id = ?3,
            branch = ?4,
            is_cancelled = ?5,
            version = version + 1,
            updated_at = ?6
        WHERE id = ?7 AND version = ?8",
        K::TABLE
    );

    let result = sqlx::query(&sql)
        .bind(order.number())
        .bind(format_timestamp(order.date()))
        .bind(order.customer_id().to_string())
        .bind(order.branch())
        .bind(order.is_cancelled())
        .bind(format_timestamp(Utc::now()))
        .bind(&id)
        .bind(order.version())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?1", K::TABLE);
        let existing: i64 = sqlx::query_scalar(&sql)
            .bind(&id)
            .fetch_one(&mut *conn)
            .await?;

        return Err(if existing == 0 {
            DbError::not_found(K::NAME, id)
        } else {
            DbError::conflict(K::NAME, id, order.version())
        });
    }

    let sql = format!("DELETE FROM {} WHERE order_id = ?1", K::ITEMS_TABLE);
    sqlx::query(&sql).bind(&id).execute(&mut *conn).await?;

    insert_items(conn, order).await
}

async fn delete_order<K: OrderTables>(conn: &mut SqliteConnection, order: &Order<K>) -> DbResult<()> {
    let id = order.id().to_string();

    let sql = format!("DELETE FROM {} WHERE order_id = ?1", K::ITEMS_TABLE);
    sqlx::query(&sql).bind(&id).execute(&mut *conn).await?;

    let sql = format!("DELETE FROM {} WHERE id = ?1", K::TABLE);
    let result = sqlx::query(&sql).bind(&id).execute(&mut *conn).await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(K::NAME, id));
    }
    Ok(())
}

async fn insert_items<K: OrderTables>(conn: &mut SqliteConnection, order: &Order<K>) -> DbResult<()> {
    let sql = format!(
        "INSERT INTO {} (
            id, order_id, position, product_id, quantity,
            unit_price, discount_rate, is_cancelled
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        K::ITEMS_TABLE
    );
    let order_id = order.id().to_string();

    for (position, item) in order.items().iter().enumerate() {
        sqlx::query(&sql)
            .bind(item.id().to_string())
            .bind(&order_id)
            .bind(position as i64)
            .bind(item.product_id().to_string())
            .bind(item.quantity())
            .bind(item.unit_price().to_string())
            .bind(item.discount_rate().value().to_string())
            .bind(item.is_cancelled())
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{DateTime, Duration, TimeZone};
    use rust_decimal::Decimal;
    use storefront_core::{Cart, Sale};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sale_at(number: &str, date: DateTime<Utc>) -> Sale {
        Sale::new(
            Uuid::new_v4(),
            number,
            date,
            CustomerId::new(Uuid::new_v4()),
            "Downtown",
        )
        .unwrap()
    }

    fn product() -> ProductId {
        ProductId::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_add_and_get_round_trip() {
        let db = test_db().await;
        let mut sale = sale_at("S-1", Utc::now());
        sale.add_item(product(), 3, Decimal::new(1000, 2)).unwrap();
        sale.add_item(product(), 5, Decimal::new(1000, 2)).unwrap();
        sale.add_item(product(), 12, Decimal::new(250, 2)).unwrap();

        let mut repo = db.sales();
        repo.add(&sale);
        assert_eq!(repo.pending(), 1);
        assert_eq!(repo.save().await.unwrap(), 1);
        assert_eq!(repo.pending(), 0);

        let loaded = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        assert_eq!(loaded, sale);
        assert_eq!(loaded.items()[1].discount_rate(), DiscountRate::TEN_PERCENT);
        assert_eq!(loaded.items()[2].discount_rate(), DiscountRate::TWENTY_PERCENT);
        assert_eq!(loaded.total_amount().amount(), Decimal::new(99, 0));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = test_db().await;
        assert!(db.sales().get_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(!db.sales().exists(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_staged_changes_are_not_visible_before_save() {
        let db = test_db().await;
        let sale = sale_at("S-1", Utc::now());

        let mut repo = db.sales();
        repo.add(&sale);
        assert!(!db.sales().exists(sale.id()).await.unwrap());

        repo.save().await.unwrap();
        assert!(db.sales().exists(sale.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_replaces_items() {
        let db = test_db().await;
        let mut sale = sale_at("S-1", Utc::now());
        sale.add_item(product(), 1, Decimal::new(5, 0)).unwrap();
        sale.add_item(product(), 2, Decimal::new(5, 0)).unwrap();

        let mut repo = db.sales();
        repo.add(&sale);
        repo.save().await.unwrap();

        let mut loaded = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        let replacement =
            OrderItem::new(Uuid::new_v4(), product(), 4, Decimal::new(3, 0), DiscountRate::TEN_PERCENT)
                .unwrap();
        let replacement_id = replacement.id();
        loaded.replace_items(vec![replacement]).unwrap();
        loaded.update_number("S-1b").unwrap();

        let mut repo = db.sales();
        repo.update(&loaded);
        repo.save().await.unwrap();

        let reloaded = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.version(), 1);
        assert_eq!(reloaded.number(), "S-1b");
        assert_eq!(reloaded.items().len(), 1);
        assert_eq!(reloaded.items()[0].id(), replacement_id);

        let item_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(item_rows, 1);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let db = test_db().await;
        let sale = sale_at("S-1", Utc::now());
        let mut repo = db.sales();
        repo.add(&sale);
        repo.save().await.unwrap();

        let mut first = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        let mut second = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();

        first.update_branch("North");
        let mut repo = db.sales();
        repo.update(&first);
        repo.save().await.unwrap();

        second.cancel().unwrap();
        let mut repo = db.sales();
        repo.update(&second);
        let err = repo.save().await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { expected: 0, .. }));

        let stored = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        assert_eq!(stored.branch(), "North");
        assert!(!stored.is_cancelled());
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let db = test_db().await;
        let mut repo = db.carts();
        let cart = Cart::new(
            Uuid::new_v4(),
            "C-1",
            Utc::now(),
            CustomerId::new(Uuid::new_v4()),
            "B",
        )
        .unwrap();
        repo.update(&cart);
        assert!(matches!(
            repo.save().await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        let db = test_db().await;
        let good = sale_at("S-1", Utc::now());
        let ghost = sale_at("S-2", Utc::now());

        let mut repo = db.sales();
        repo.add(&good);
        repo.update(&ghost);
        assert!(repo.save().await.is_err());

        assert!(!db.sales().exists(good.id()).await.unwrap());
        assert_eq!(repo.pending(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_order_and_items() {
        let db = test_db().await;
        let mut sale = sale_at("S-1", Utc::now());
        sale.add_item(product(), 1, Decimal::new(5, 0)).unwrap();

        let mut repo = db.sales();
        repo.add(&sale);
        repo.save().await.unwrap();

        let mut repo = db.sales();
        repo.delete(&sale);
        repo.save().await.unwrap();

        assert!(db.sales().get_by_id(sale.id()).await.unwrap().is_none());
        let item_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(item_rows, 0);

        let mut repo = db.sales();
        repo.delete(&sale);
        assert!(matches!(
            repo.save().await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_orders_by_date_then_id_and_pages() {
        let db = test_db().await;
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let late = sale_at("late", base + Duration::hours(2));
        let early = sale_at("early", base);
        let mut tie_a = sale_at("tie-a", base + Duration::hours(1));
        let mut tie_b = sale_at("tie-b", base + Duration::hours(1));
        tie_a.add_item(product(), 4, Decimal::new(1, 0)).unwrap();
        tie_b.add_item(product(), 1, Decimal::new(1, 0)).unwrap();

        let mut repo = db.sales();
        for sale in [&late, &early, &tie_a, &tie_b] {
            repo.add(sale);
        }
        repo.save().await.unwrap();

        let (first_tie, second_tie) = if tie_a.id().to_string() < tie_b.id().to_string() {
            ("tie-a", "tie-b")
        } else {
            ("tie-b", "tie-a")
        };

        let page1 = db.sales().list(PageRequest::new(1, 3).unwrap()).await.unwrap();
        let numbers: Vec<&str> = page1.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, vec!["early", first_tie, second_tie]);
        assert!(page1.iter().skip(1).all(|s| s.items().len() == 1));

        let page2 = db.sales().list(PageRequest::new(2, 3).unwrap()).await.unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].number(), "late");

        let page3 = db.sales().list(PageRequest::new(3, 3).unwrap()).await.unwrap();
        assert!(page3.is_empty());

        assert_eq!(db.sales().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_sales_and_carts_use_separate_tables() {
        let db = test_db().await;
        let sale = sale_at("S-1", Utc::now());
        let mut repo = db.sales();
        repo.add(&sale);
        repo.save().await.unwrap();

        assert_eq!(db.sales().count().await.unwrap(), 1);
        assert_eq!(db.carts().count().await.unwrap(), 0);
        assert!(db.carts().get_by_id(sale.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_order_round_trips() {
        let db = test_db().await;
        let mut sale = sale_at("S-1", Utc::now());
        sale.add_item(product(), 2, Decimal::new(5, 0)).unwrap();

        let mut repo = db.sales();
        repo.add(&sale);
        repo.save().await.unwrap();

        let mut loaded = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        loaded.cancel().unwrap();
        let mut repo = db.sales();
        repo.update(&loaded);
        repo.save().await.unwrap();

        let reloaded = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        assert!(reloaded.is_cancelled());
        assert!(reloaded.items().iter().all(OrderItem::is_cancelled));
    }

    #[tokio::test]
    async fn test_header_and_items_come_from_one_snapshot() {
        let path = std::env::temp_dir().join(format!("storefront-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(2))
            .await
            .unwrap();

        let mut sale = sale_at("S-1", Utc::now());
        sale.add_item(product(), 1, Decimal::new(5, 0)).unwrap();
        let mut repo = db.sales();
        repo.add(&sale);
        repo.save().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let row = fetch_order_row::<SaleKind>(&mut *tx, sale.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.version, 0);

        // Another connection saves between the header and item reads
        let mut changed = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        let items = (0..3).map(|_| {
            OrderItem::new(Uuid::new_v4(), product(), 2, Decimal::new(5, 0), DiscountRate::NONE)
                .unwrap()
        });
        changed.replace_items(items).unwrap();
        let mut repo = db.sales();
        repo.update(&changed);
        repo.save().await.unwrap();

        let items = fetch_items::<SaleKind>(&mut *tx, &row.id).await.unwrap();
        assert_eq!(items.len(), 1);
        tx.commit().await.unwrap();

        let reloaded = db.sales().get_by_id(sale.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.version(), 1);
        assert_eq!(reloaded.items().len(), 3);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_save_with_nothing_staged() {
        let db = test_db().await;
        assert_eq!(db.sales().save().await.unwrap(), 0);
    }
}
