//! # Product Handlers
//!
//! Catalogue CRUD plus paged, sorted and category-filtered listings.
//!
//! ## List Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ListProductsQuery { page: 2, size: 10, order: "price desc, title" }   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PageRequest::new + ProductSort::parse ──► ValidationErrors (all)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  repo.list(page, sort, category)   ORDER BY price DESC, title, id      │
//! │  repo.count(category)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductPage { data, current_page, total_pages, total_items }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use storefront_core::validation::{
    validate_product, validate_required, validate_required_id, Validator,
};
use storefront_core::{PageRequest, Product, ProductId, ProductSort, Rating, ValidationErrors};
use storefront_db::{Database, ProductRepository};

use crate::error::{AppError, AppResult};
use crate::orders::SuccessResult;

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductCommand {
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

impl CreateProductCommand {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_product(
            &self.title,
            self.price,
            &self.description,
            &self.category,
            &self.image,
            self.rating.rate,
            self.rating.count,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductCommand {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

impl UpdateProductCommand {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check(validate_required_id("id", self.id));
        if let Err(errors) = validate_product(
            &self.title,
            self.price,
            &self.description,
            &self.category,
            &self.image,
            self.rating.rate,
            self.rating.count,
        ) {
            v.extend(errors);
        }
        v.finish()
    }
}

/// Paging and sorting for product listings.
///
/// `order` is a comma separated list such as `"price desc, title"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub order: Option<String>,
}

// =============================================================================
// Results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

impl From<Product> for ProductDetails {
    fn from(p: Product) -> Self {
        ProductDetails {
            id: p.id.value(),
            title: p.title,
            price: p.price,
            description: p.description,
            category: p.category,
            image: p.image,
            rating: p.rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub data: Vec<ProductDetails>,
    pub current_page: u32,
    pub total_pages: i64,
    pub total_items: i64,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct ProductService {
    db: Database,
    default_page_size: u32,
}

impl ProductService {
    pub fn new(db: Database, default_page_size: u32) -> Self {
        ProductService {
            db,
            default_page_size,
        }
    }

    fn repository(&self) -> ProductRepository {
        self.db.products()
    }

    pub async fn create(&self, cmd: CreateProductCommand) -> AppResult<ProductDetails> {
        debug!(title = %cmd.title, "create product");
        cmd.validate()?;

        let product = Product::new(
            cmd.title,
            cmd.price,
            cmd.description,
            cmd.category,
            cmd.image,
            cmd.rating,
        );

        let mut repo = self.repository();
        repo.add(&product);
        repo.save().await?;

        info!(id = %product.id, category = %product.category, "Product created");
        Ok(ProductDetails::from(product))
    }

    pub async fn update(&self, cmd: UpdateProductCommand) -> AppResult<ProductDetails> {
        debug!(id = %cmd.id, "update product");
        cmd.validate()?;

        let mut repo = self.repository();
        let mut product = self.load(&repo, cmd.id).await?;
        product.update(
            cmd.title,
            cmd.price,
            cmd.description,
            cmd.category,
            cmd.image,
            cmd.rating,
        );

        repo.update(&product);
        repo.save().await?;

        info!(id = %product.id, "Product updated");
        Ok(ProductDetails::from(product))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<SuccessResult> {
        debug!(id = %id, "delete product");

        let mut repo = self.repository();
        let product = self.load(&repo, id).await?;
        repo.delete(&product);
        repo.save().await?;

        info!(id = %id, "Product deleted");
        Ok(SuccessResult::OK)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ProductDetails> {
        let repo = self.repository();
        let product = self.load(&repo, id).await?;
        Ok(ProductDetails::from(product))
    }

    pub async fn list(&self, query: ListProductsQuery) -> AppResult<ProductPage> {
        self.page(query, None).await
    }

    pub async fn list_by_category(
        &self,
        category: &str,
        query: ListProductsQuery,
    ) -> AppResult<ProductPage> {
        validate_required("category", category)
            .map_err(ValidationErrors::from)?;
        self.page(query, Some(category)).await
    }

    /// Distinct category names, sorted.
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        Ok(self.repository().categories().await?)
    }

    async fn page(&self, query: ListProductsQuery, category: Option<&str>) -> AppResult<ProductPage> {
        let page = PageRequest::new(
            query.page.unwrap_or(1),
            query.size.unwrap_or_else(|| i64::from(self.default_page_size)),
        );
        let sort = ProductSort::parse(query.order.as_deref());

        let (page, sort) = match (page, sort) {
            (Ok(page), Ok(sort)) => (page, sort),
            (page, sort) => {
                let mut v = Validator::new();
                if let Err(errors) = page {
                    v.extend(errors);
                }
                if let Err(err) = sort {
                    v.check(Err(err));
                }
                return Err(v.finish().err().unwrap_or_default().into());
            }
        };

        let repo = self.repository();
        let products = repo.list(page, &sort, category).await?;
        let total_items = repo.count(category).await?;

        debug!(
            page = page.page(),
            returned = products.len(),
            total_items,
            "Listed products"
        );

        Ok(ProductPage {
            data: products.into_iter().map(ProductDetails::from).collect(),
            current_page: page.page(),
            total_pages: page.total_pages(total_items),
            total_items,
        })
    }

    async fn load(&self, repo: &ProductRepository, id: Uuid) -> AppResult<Product> {
        repo.get_by_id(ProductId::new(id))
            .await?
            .ok_or_else(|| AppError::not_found("Product", id))
    }
}
