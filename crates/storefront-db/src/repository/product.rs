//! # Product Repository
//!
//! Database operations for the product catalogue.
//!
//! ## Key Operations
//! - Paged listing with caller-chosen ordering
//! - Category filter and category listing
//! - Staged add / update / delete with a transactional save
//!
//! ## Ordering
//! ```text
//! ProductSort [(Price, Desc), (Title, Asc)]
//!       │
//!       ▼
//! ORDER BY CAST(price AS REAL) DESC, title ASC, id ASC
//!                                               └── always last, keeps pages stable
//! ```
//! Prices and rating averages are stored as decimal text, so they are cast
//! for numeric ordering.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use storefront_core::{PageRequest, Product, ProductId, ProductSort, ProductSortField, Rating};

use super::{format_timestamp, parse_decimal, parse_uuid, Change};
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    title: String,
    price: String,
    description: String,
    category: String,
    image: String,
    rating_rate: String,
    rating_count: i32,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            id: ProductId::new(parse_uuid("id", &row.id)?),
            title: row.title,
            price: parse_decimal("price", &row.price)?,
            description: row.description,
            category: row.category,
            image: row.image,
            rating: Rating::new(
                parse_decimal("rating_rate", &row.rating_rate)?,
                row.rating_count,
            ),
        })
    }
}

const PRODUCT_COLUMNS: &str =
    "id, title, price, description, category, image, rating_rate, rating_count";

fn sort_expression(field: ProductSortField) -> &'static str {
    match field {
        ProductSortField::Id => "id",
        ProductSortField::Title => "title",
        ProductSortField::Price => "CAST(price AS REAL)",
        ProductSortField::Description => "description",
        ProductSortField::Category => "category",
        ProductSortField::Image => "image",
        ProductSortField::Rating => "CAST(rating_rate AS REAL)",
    }
}

/// Builds the ORDER BY list from whitelisted expressions only.
fn order_by_clause(sort: &ProductSort) -> String {
    let mut parts: Vec<String> = sort
        .keys()
        .iter()
        .map(|(field, direction)| format!("{} {}", sort_expression(*field), direction.as_sql()))
        .collect();

    if !sort.keys().iter().any(|(field, _)| *field == ProductSortField::Id) {
        parts.push("id ASC".to_string());
    }

    parts.join(", ")
}

/// Unit of work over the product catalogue.
///
/// ## Usage
/// ```rust,ignore
/// let mut repo = db.products();
/// repo.add(&product);
/// repo.save().await?;
///
/// let page = PageRequest::new(1, 10)?;
/// let sort = ProductSort::parse(Some("price desc"))?;
/// let cheapest_last = repo.list(page, &sort, None).await?;
/// ```
#[derive(Debug)]
pub struct ProductRepository {
    pool: SqlitePool,
    pending: Vec<Change<Product>>,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository {
            pool,
            pending: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    pub async fn exists(&self, id: ProductId) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ?1")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// One page of products, optionally restricted to one category.
    pub async fn list(
        &self,
        page: PageRequest,
        sort: &ProductSort,
        category: Option<&str>,
    ) -> DbResult<Vec<Product>> {
        let order_by = order_by_clause(sort);
        debug!(
            page = page.page(),
            size = page.size(),
            order_by = %order_by,
            category = ?category,
            "Listing products"
        );

        let filter = if category.is_some() {
            "WHERE category = ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM products {} ORDER BY {} LIMIT ? OFFSET ?",
            PRODUCT_COLUMNS, filter, order_by
        );

        let mut query = sqlx::query_as::<sqlx::Sqlite, ProductRow>(&sql);
        if let Some(category) = category {
            query = query.bind(category);
        }
        let rows = query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Number of products, optionally within one category.
    pub async fn count(&self, category: Option<&str>) -> DbResult<i64> {
        let count: i64 = match category {
            Some(category) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category = ?1")
                    .bind(category)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    /// Distinct category names, sorted.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    // -------------------------------------------------------------------------
    // Staged writes
    // -------------------------------------------------------------------------

    pub fn add(&mut self, product: &Product) {
        debug!(id = %product.id, title = %product.title, "Staging product add");
        self.pending.push(Change::Add(product.clone()));
    }

    pub fn update(&mut self, product: &Product) {
        debug!(id = %product.id, "Staging product update");
        self.pending.push(Change::Update(product.clone()));
    }

    pub fn delete(&mut self, product: &Product) {
        debug!(id = %product.id, "Staging product delete");
        self.pending.push(Change::Delete(product.clone()));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Applies every staged change in one transaction.
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
                Change::Add(product) => insert_product(&mut *tx, product).await?,
                Change::Update(product) => update_product(&mut *tx, product).await?,
                Change::Delete(product) => delete_product(&mut *tx, product).await?,
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(changes = pending.len(), "Saved product changes");
        Ok(pending.len())
    }
}

async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    let now = format_timestamp(Utc::now());

    sqlx::query(
        r#"
        INSERT INTO products (
            id, title, price, description, category, image,
            rating_rate, rating_count, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
    )
    .bind(product.id.to_string())
    .bind(&product.title)
    .bind(product.price.to_string())
    .bind(&product.description)
    .bind(&product.category)
    .bind(&product.image)
    .bind(product.rating.rate.to_string())
    .bind(product.rating.count)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn update_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products SET
            title = ?2,
            price = ?3,
            description = ?4,
            category = ?5,
            image = ?6,
            rating_rate = ?7,
            rating_count = ?8,
            updated_at = ?9
        WHERE id = ?1
        "#,
    )
    .bind(product.id.to_string())
    .bind(&product.title)
    .bind(product.price.to_string())
    .bind(&product.description)
    .bind(&product.category)
    .bind(&product.image)
    .bind(product.rating.rate.to_string())
    .bind(product.rating.count)
    .bind(format_timestamp(Utc::now()))
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product.id.to_string()));
    }
    Ok(())
}

async fn delete_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(product.id.to_string())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product.id.to_string()));
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
    use rust_decimal::Decimal;
    use storefront_core::SortDirection;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(title: &str, price: Decimal, category: &str, rate: Decimal) -> Product {
        Product::new(
            title,
            price,
            format!("{} description", title),
            category,
            "https://img.example/p.jpg",
            Rating::new(rate, 10),
        )
    }

    async fn seed(db: &Database) -> Vec<Product> {
        let products = vec![
            product("Mug", Decimal::new(900, 2), "kitchen", Decimal::new(41, 1)),
            product("Kettle", Decimal::new(2999, 2), "kitchen", Decimal::new(38, 1)),
            product("Lamp", Decimal::new(10000, 2), "lighting", Decimal::new(45, 1)),
            product("Bulb", Decimal::new(250, 2), "lighting", Decimal::new(30, 1)),
        ];
        let mut repo = db.products();
        for p in &products {
            repo.add(p);
        }
        repo.save().await.unwrap();
        products
    }

    fn titles(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let db = test_db().await;
        let products = seed(&db).await;

        let loaded = db.products().get_by_id(products[0].id).await.unwrap().unwrap();
        assert_eq!(loaded, products[0]);
        assert!(db.products().exists(products[0].id).await.unwrap());
        assert!(db
            .products()
            .get_by_id(ProductId::new(uuid::Uuid::new_v4()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_sorts_price_numerically() {
        let db = test_db().await;
        seed(&db).await;

        let page = PageRequest::new(1, 10).unwrap();
        let sort = ProductSort::parse(Some("price desc")).unwrap();
        let listed = db.products().list(page, &sort, None).await.unwrap();

        // As text "9.00" would sort above "100.00"
        assert_eq!(titles(&listed), vec!["Lamp", "Kettle", "Mug", "Bulb"]);
    }

    #[tokio::test]
    async fn test_list_by_rating_and_title() {
        let db = test_db().await;
        seed(&db).await;

        let page = PageRequest::new(1, 10).unwrap();
        let sort = ProductSort::parse(Some("rating")).unwrap();
        let listed = db.products().list(page, &sort, None).await.unwrap();
        assert_eq!(titles(&listed), vec!["Bulb", "Kettle", "Mug", "Lamp"]);

        let sort = ProductSort::parse(Some("title")).unwrap();
        assert_eq!(sort.keys()[0].1, SortDirection::Asc);
        let listed = db.products().list(page, &sort, None).await.unwrap();
        assert_eq!(titles(&listed), vec!["Bulb", "Kettle", "Lamp", "Mug"]);
    }

    #[tokio::test]
    async fn test_list_pages_and_category_filter() {
        let db = test_db().await;
        seed(&db).await;
        let sort = ProductSort::parse(Some("price")).unwrap();

        let second = db
            .products()
            .list(PageRequest::new(2, 3).unwrap(), &sort, None)
            .await
            .unwrap();
        assert_eq!(titles(&second), vec!["Lamp"]);

        let kitchen = db
            .products()
            .list(PageRequest::new(1, 10).unwrap(), &sort, Some("kitchen"))
            .await
            .unwrap();
        assert_eq!(titles(&kitchen), vec!["Mug", "Kettle"]);

        assert_eq!(db.products().count(None).await.unwrap(), 4);
        assert_eq!(db.products().count(Some("lighting")).await.unwrap(), 2);
        assert_eq!(db.products().count(Some("garden")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_categories_are_distinct_and_sorted() {
        let db = test_db().await;
        seed(&db).await;
        assert_eq!(
            db.products().categories().await.unwrap(),
            vec!["kitchen".to_string(), "lighting".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let mut products = seed(&db).await;

        let mug = &mut products[0];
        mug.update(
            "Big Mug",
            Decimal::new(1100, 2),
            "Holds more",
            "kitchen",
            "https://img.example/mug.jpg",
            Rating::new(Decimal::new(42, 1), 11),
        );
        let mut repo = db.products();
        repo.update(mug);
        repo.save().await.unwrap();

        let loaded = db.products().get_by_id(mug.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Big Mug");
        assert_eq!(loaded.price, Decimal::new(1100, 2));

        let mut repo = db.products();
        repo.delete(mug);
        repo.save().await.unwrap();
        assert!(!db.products().exists(mug.id).await.unwrap());

        let mut repo = db.products();
        repo.update(mug);
        assert!(matches!(
            repo.save().await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[test]
    fn test_order_by_clause_appends_id() {
        let sort = ProductSort::parse(Some("price desc, title")).unwrap();
        assert_eq!(
            order_by_clause(&sort),
            "CAST(price AS REAL) DESC, title ASC, id ASC"
        );

        let sort = ProductSort::parse(Some("id desc")).unwrap();
        assert_eq!(order_by_clause(&sort), "id DESC");
    }
}
