//! # Order Handlers
//!
//! One generic service drives both sales and carts.
//!
//! ## Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      update_sale / update_cart                          │
//! │                                                                         │
//! │  UpdateOrderCommand                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate() ───────────────► ValidationErrors (every failing rule)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  repo.get_by_id(id) ───────► None ──► AppError::NotFound               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  carts only: every product exists? ──► no ──► AppError::NotFound       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  update header, build items with calculate_discount(qty)               │
//! │  replace_items(new set) ───► OrderError (cancelled, bad line)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  repo.update(&order); repo.save()                                      │
//! │       (old item rows deleted, new set inserted, version bumped)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod results;

use std::collections::BTreeSet;
use std::marker::PhantomData;

use tracing::{debug, info};
use uuid::Uuid;

use storefront_core::validation::validate_quantity;
use storefront_core::{
    calculate_discount, CartKind, CustomerId, Order, OrderItem, PageRequest, ProductId, SaleKind,
    ValidationErrors,
};
use storefront_db::{Database, OrderRepository, OrderTables};

use crate::error::{AppError, AppResult};

pub use commands::{CreateOrderCommand, ListOrdersQuery, OrderLineInput, UpdateOrderCommand};
pub use results::{
    CreateOrderResult, DiscountPreview, OrderDetails, OrderItemDetails, OrderList, OrderSummary,
    SuccessResult,
};

/// Per-kind handler rules on top of the storage mapping.
pub trait OrderWorkflow: OrderTables {
    /// Whether every product on a create/update must exist in the catalogue.
    const CHECK_PRODUCTS: bool;
}

impl OrderWorkflow for SaleKind {
    const CHECK_PRODUCTS: bool = false;
}

impl OrderWorkflow for CartKind {
    const CHECK_PRODUCTS: bool = true;
}

pub type SaleService = OrderService<SaleKind>;
pub type CartService = OrderService<CartKind>;

/// Create, update, cancel, get and list for one order kind.
#[derive(Debug, Clone)]
pub struct OrderService<K: OrderWorkflow> {
    db: Database,
    default_page_size: u32,
    kind: PhantomData<K>,
}

impl<K: OrderWorkflow> OrderService<K> {
    pub fn new(db: Database, default_page_size: u32) -> Self {
        OrderService {
            db,
            default_page_size,
            kind: PhantomData,
        }
    }

    /// A fresh unit of work.
    fn repository(&self) -> OrderRepository<K> {
        OrderRepository::new(self.db.pool().clone())
    }

    pub async fn create(&self, cmd: CreateOrderCommand) -> AppResult<CreateOrderResult> {
        debug!(kind = K::LABEL, number = %cmd.number, "create order");
        cmd.validate()?;

        if K::CHECK_PRODUCTS {
            self.ensure_products_exist(&cmd.items).await?;
        }

        let mut order = Order::<K>::new(
            Uuid::new_v4(),
            cmd.number,
            cmd.date,
            CustomerId::new(cmd.customer_id),
            cmd.branch,
        )?;
        for line in &cmd.items {
            order.add_item(ProductId::new(line.product_id), line.quantity, line.unit_price)?;
        }

        let mut repo = self.repository();
        repo.add(&order);
        repo.save().await?;

        info!(
            kind = K::LABEL,
            id = %order.id(),
            items = order.items().len(),
            total = %order.total_amount(),
            "Order created"
        );
        Ok(CreateOrderResult { id: order.id() })
    }

    /// Replaces the header and the full item set; discounts are recomputed
    /// from each line's quantity.
    pub async fn update(&self, cmd: UpdateOrderCommand) -> AppResult<SuccessResult> {
        debug!(kind = K::LABEL, id = %cmd.id, "update order");
        cmd.validate()?;

        let mut repo = self.repository();
        let mut order = self.load(&repo, cmd.id).await?;

        if K::CHECK_PRODUCTS {
            self.ensure_products_exist(&cmd.items).await?;
        }

        order.update_number(cmd.number)?;
        order.update_date(cmd.date)?;
        order.update_customer(CustomerId::new(cmd.customer_id))?;
        order.update_branch(cmd.branch);

        let items = cmd
            .items
            .iter()
            .map(|line| {
                let rate = calculate_discount(line.quantity)?;
                OrderItem::new(
                    Uuid::new_v4(),
                    ProductId::new(line.product_id),
                    line.quantity,
                    line.unit_price,
                    rate,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        order.replace_items(items)?;

        repo.update(&order);
        repo.save().await?;

        info!(
            kind = K::LABEL,
            id = %order.id(),
            items = order.items().len(),
            "Order updated"
        );
        Ok(SuccessResult::OK)
    }

    /// Cancels the order and every item on it.
    pub async fn cancel(&self, id: Uuid) -> AppResult<SuccessResult> {
        debug!(kind = K::LABEL, id = %id, "cancel order");

        let mut repo = self.repository();
        let mut order = self.load(&repo, id).await?;
        order.cancel()?;

        repo.update(&order);
        repo.save().await?;

        info!(kind = K::LABEL, id = %id, "Order cancelled");
        Ok(SuccessResult::OK)
    }

    /// Returns the order, cancelled or not.
    pub async fn get(&self, id: Uuid) -> AppResult<OrderDetails> {
        debug!(kind = K::LABEL, id = %id, "get order");
        let repo = self.repository();
        let order = self.load(&repo, id).await?;
        Ok(OrderDetails::from(&order))
    }

    /// One page of orders, oldest date first.
    pub async fn list(&self, query: ListOrdersQuery) -> AppResult<OrderList> {
        let page = PageRequest::new(
            query.page.unwrap_or(1),
            query.size.unwrap_or_else(|| i64::from(self.default_page_size)),
        )?;
        debug!(kind = K::LABEL, page = page.page(), size = page.size(), "list orders");

        let repo = self.repository();
        let orders = repo.list(page).await?;
        let total_items = repo.count().await?;

        Ok(OrderList {
            page: page.page(),
            size: page.size(),
            total_items,
            items: orders.iter().map(OrderSummary::from).collect(),
        })
    }

    async fn load(&self, repo: &OrderRepository<K>, id: Uuid) -> AppResult<Order<K>> {
        repo.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(K::NAME, id))
    }

    async fn ensure_products_exist(&self, items: &[OrderLineInput]) -> AppResult<()> {
        let products = self.db.products();
        let ids: BTreeSet<Uuid> = items.iter().map(|line| line.product_id).collect();

        for id in ids {
            if !products.exists(ProductId::new(id)).await? {
                return Err(AppError::not_found("Product", id));
            }
        }
        Ok(())
    }
}

/// The discount tier a line of `quantity` items would get.
pub fn preview_discount(quantity: i32) -> AppResult<DiscountPreview> {
    validate_quantity("quantity", quantity).map_err(ValidationErrors::from)?;
    let rate = calculate_discount(quantity)?;
    Ok(DiscountPreview {
        quantity,
        discount_rate: rate.value(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use storefront_core::{Product, Rating};

    use crate::error::ErrorCode;
    use crate::test_support::storefront;

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn create_command(items: Vec<OrderLineInput>) -> CreateOrderCommand {
        CreateOrderCommand {
            number: "S-100".to_string(),
            date: Utc::now(),
            customer_id: Uuid::new_v4(),
            branch: "Downtown".to_string(),
            items,
        }
    }

    fn update_command(id: Uuid, items: Vec<OrderLineInput>) -> UpdateOrderCommand {
        UpdateOrderCommand {
            id,
            number: "S-100-B".to_string(),
            date: Utc::now(),
            customer_id: Uuid::new_v4(),
            branch: "Airport".to_string(),
            items,
        }
    }

    async fn seed_product(store: &crate::Storefront) -> Uuid {
        let product = Product::new(
            "Mug",
            price(899),
            "Stoneware mug",
            "kitchen",
            "https://img.example.com/mug.png",
            Rating::new(Decimal::new(45, 1), 12),
        );
        let mut repo = store.database().products();
        repo.add(&product);
        repo.save().await.unwrap();
        product.id.value()
    }

    #[tokio::test]
    async fn test_create_then_get_applies_tiers() {
        let store = storefront().await;
        let sales = store.sales();

        let created = sales
            .create(create_command(vec![
                OrderLineInput::new(Uuid::new_v4(), 3, price(1000)),
                OrderLineInput::new(Uuid::new_v4(), 5, price(1000)),
            ]))
            .await
            .unwrap();

        let details = sales.get(created.id).await.unwrap();
        assert_eq!(details.number, "S-100");
        assert_eq!(details.items.len(), 2);
        assert_eq!(details.items[0].discount_rate, Decimal::ZERO);
        assert_eq!(details.items[1].discount_rate, Decimal::new(10, 2));
        assert_eq!(details.total_amount, Decimal::new(75, 0));
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let store = storefront().await;
        let sales = store.sales();
        let missing = Uuid::new_v4();

        let err = sales.get(missing).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err = sales.cancel(missing).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref entity, .. } if entity == "Sale"));

        let cmd = update_command(missing, vec![OrderLineInput::new(Uuid::new_v4(), 1, price(100))]);
        let err = sales.update(cmd).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_command_writes_nothing() {
        let store = storefront().await;
        let sales = store.sales();

        let err = sales
            .create(create_command(vec![OrderLineInput::new(
                Uuid::new_v4(),
                21,
                price(100),
            )]))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.errors()[0].field(), "items[0].quantity");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(sales.list(ListOrdersQuery::default()).await.unwrap().total_items, 0);
    }

    #[tokio::test]
    async fn test_cart_requires_known_products() {
        let store = storefront().await;
        let carts = store.carts();
        let unknown = Uuid::new_v4();

        let err = carts
            .create(create_command(vec![OrderLineInput::new(unknown, 2, price(500))]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref entity, ref id } if entity == "Product" && *id == unknown.to_string()));

        let known = seed_product(&store).await;
        let created = carts
            .create(create_command(vec![OrderLineInput::new(known, 2, price(899))]))
            .await
            .unwrap();
        assert_eq!(carts.get(created.id).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_sale_accepts_unknown_products() {
        let store = storefront().await;
        let created = store
            .sales()
            .create(create_command(vec![OrderLineInput::new(
                Uuid::new_v4(),
                1,
                price(100),
            )]))
            .await;
        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn test_update_replaces_items_and_header() {
        let store = storefront().await;
        let sales = store.sales();
        let created = sales
            .create(create_command(vec![
                OrderLineInput::new(Uuid::new_v4(), 3, price(1000)),
                OrderLineInput::new(Uuid::new_v4(), 5, price(1000)),
            ]))
            .await
            .unwrap();

        let product = Uuid::new_v4();
        let result = sales
            .update(update_command(
                created.id,
                vec![OrderLineInput::new(product, 20, price(200))],
            ))
            .await
            .unwrap();
        assert!(result.success);

        let details = sales.get(created.id).await.unwrap();
        assert_eq!(details.number, "S-100-B");
        assert_eq!(details.branch, "Airport");
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].product_id, product);
        assert_eq!(details.items[0].discount_rate, Decimal::new(20, 2));
        assert_eq!(details.total_amount, Decimal::new(32, 0));
    }

    #[tokio::test]
    async fn test_update_rejects_far_future_date() {
        let store = storefront().await;
        let sales = store.sales();
        let created = sales
            .create(create_command(vec![OrderLineInput::new(
                Uuid::new_v4(),
                1,
                price(100),
            )]))
            .await
            .unwrap();

        let mut cmd = update_command(created.id, vec![OrderLineInput::new(Uuid::new_v4(), 1, price(100))]);
        cmd.date = Utc::now() + Duration::minutes(10);
        let err = sales.update(cmd).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        // nothing was written
        assert_eq!(sales.get(created.id).await.unwrap().number, "S-100");
    }

    #[tokio::test]
    async fn test_cancel_cascades_and_is_not_repeatable() {
        let store = storefront().await;
        let carts = store.carts();
        let product = seed_product(&store).await;
        let created = carts
            .create(create_command(vec![
                OrderLineInput::new(product, 1, price(899)),
                OrderLineInput::new(product, 4, price(899)),
            ]))
            .await
            .unwrap();

        assert!(carts.cancel(created.id).await.unwrap().success);

        let details = carts.get(created.id).await.unwrap();
        assert!(details.is_cancelled);
        assert!(details.items.iter().all(|item| item.is_cancelled));

        let err = carts.cancel(created.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyCancelled);

        let err = carts
            .update(update_command(
                created.id,
                vec![OrderLineInput::new(product, 1, price(899))],
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyCancelled);
    }

    #[tokio::test]
    async fn test_list_pages_by_date() {
        let store = storefront().await;
        let sales = store.sales();
        let now = Utc::now();

        for (number, days_ago) in [("S-3", 1), ("S-1", 3), ("S-2", 2)] {
            let mut cmd = create_command(vec![OrderLineInput::new(Uuid::new_v4(), 1, price(100))]);
            cmd.number = number.to_string();
            cmd.date = now - Duration::days(days_ago);
            sales.create(cmd).await.unwrap();
        }

        let first = sales.list(ListOrdersQuery::page(1, 2)).await.unwrap();
        assert_eq!(first.total_items, 3);
        assert_eq!(first.size, 2);
        let numbers: Vec<&str> = first.items.iter().map(|s| s.number.as_str()).collect();
        assert_eq!(numbers, vec!["S-1", "S-2"]);

        let second = sales.list(ListOrdersQuery::page(2, 2)).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].number, "S-3");
    }

    #[tokio::test]
    async fn test_list_rejects_bad_paging() {
        let store = storefront().await;
        let err = store
            .carts()
            .list(ListOrdersQuery::page(0, 0))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }

        let max = i64::from(u32::MAX);
        let err = store
            .sales()
            .list(ListOrdersQuery::page(max, max))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors.errors()[0].field(), "size");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let last = store
            .sales()
            .list(ListOrdersQuery::page(max, 1_000))
            .await
            .unwrap();
        assert!(last.items.is_empty());
    }

    #[test]
    fn test_preview_discount() {
        assert_eq!(preview_discount(3).unwrap().discount_rate, Decimal::ZERO);
        assert_eq!(preview_discount(4).unwrap().discount_rate, Decimal::new(10, 2));
        assert_eq!(preview_discount(10).unwrap().discount_rate, Decimal::new(20, 2));
        assert!(matches!(preview_discount(21), Err(AppError::Validation(_))));
        assert!(matches!(preview_discount(0), Err(AppError::Validation(_))));
    }
}
