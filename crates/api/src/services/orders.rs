//! Order placement and queries.
//!
//! `create_order` is the only write path for orders and the only caller of
//! the conditional stock decrement. Validation is a pure function over
//! pre-fetched products so every rejection rule is unit-testable without a
//! database; the commit phase wraps decrements and inserts in a single
//! transaction so a failure leaves both stock and orders untouched.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use atelier_core::{OrderStatus, ProductId};

use crate::db::orders::{NewOrder, OrderRepository};
use crate::db::products::ProductRepository;
use crate::error::AppError;
use crate::models::{Order, OrderLine, Product, User};

/// One line of a submitted cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Image chosen on the storefront; the product's first image is used
    /// when absent.
    #[serde(default)]
    pub image: Option<String>,
}

/// Shipping details submitted with an order.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A validated cart, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCart {
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
}

/// Validate cart lines against their products and snapshot them.
///
/// Rules, applied per line in submission order:
/// - the product must exist,
/// - stored stock must not be negative (a corrupt record aborts the order),
/// - the requested quantity must not exceed stock,
/// - the quantity must be a positive integer.
///
/// An empty cart, or one whose lines all reference missing products, is
/// rejected outright.
///
/// # Errors
///
/// Returns the first rule violation encountered, or `AppError::EmptyCart`.
pub fn validate_cart(
    lines: &[CartLine],
    products: &HashMap<ProductId, Product>,
) -> Result<ValidatedCart, AppError> {
    let mut snapshots = Vec::with_capacity(lines.len());
    let mut total_amount = Decimal::ZERO;

    for line in lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| AppError::NotFound(format!("Product {}", line.product_id)))?;

        if product.stock < 0 {
            return Err(AppError::InvalidState(format!(
                "Product {} has negative stock",
                product.id
            )));
        }
        if line.quantity > product.stock {
            return Err(AppError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: line.quantity,
            });
        }
        if line.quantity <= 0 {
            return Err(AppError::InvalidQuantity {
                product: product.name.clone(),
                quantity: line.quantity,
            });
        }

        let snapshot = OrderLine {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
            image: line
                .image
                .clone()
                .or_else(|| product.primary_image().map(str::to_owned)),
        };
        total_amount += snapshot.subtotal();
        snapshots.push(snapshot);
    }

    if snapshots.is_empty() {
        return Err(AppError::EmptyCart);
    }

    Ok(ValidatedCart {
        lines: snapshots,
        total_amount,
    })
}

/// Order placement and query service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for `user`.
    ///
    /// Runs validation and commit in one transaction. The commit phase
    /// re-checks availability via the conditional decrement, so a concurrent
    /// order that consumed the stock between validation and commit surfaces
    /// as `InsufficientStock` and rolls everything back.
    ///
    /// # Errors
    ///
    /// Returns any cart validation error, or `AppError::Database` if a
    /// query fails.
    pub async fn create_order(
        &self,
        user: &User,
        lines: &[CartLine],
        shipping: ShippingInfo,
        notes: Option<String>,
        payment_intent_id: Option<String>,
    ) -> Result<Order, AppError> {
        let products = self.fetch_products(lines).await?;
        let cart = validate_cart(lines, &products)?;

        let mut tx = self.pool.begin().await.map_err(crate::db::RepositoryError::from)?;

        for line in &cart.lines {
            let decremented =
                ProductRepository::decrement_stock(&mut tx, line.product_id, line.quantity)
                    .await?;
            if !decremented {
                // A racer won between validation and here. Rolling back via
                // drop undoes any decrements already applied in this loop.
                return Err(AppError::InsufficientStock {
                    product: line.product_name.clone(),
                    available: products
                        .get(&line.product_id)
                        .map_or(0, |p| p.stock),
                    requested: line.quantity,
                });
            }
        }

        let new_order = NewOrder {
            user_id: user.id,
            user_email: user.email.to_string(),
            user_name: user.name.clone(),
            lines: cart.lines,
            total_amount: cart.total_amount,
            payment_intent_id,
            shipping_address: shipping.address,
            shipping_city: shipping.city,
            shipping_postal_code: shipping.postal_code,
            shipping_country: shipping.country,
            shipping_phone: shipping.phone,
            notes,
        };

        let order = OrderRepository::insert(&mut tx, &new_order).await?;
        tx.commit().await.map_err(crate::db::RepositoryError::from)?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user.id,
            total = %order.total_amount,
            lines = order.lines.len(),
            "order placed"
        );

        Ok(order)
    }

    /// Get an order, enforcing that non-admins only see their own.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for a missing order and
    /// `AppError::Forbidden` for another user's order.
    pub async fn get_for_user(
        &self,
        user: &User,
        id: atelier_core::OrderId,
    ) -> Result<Order, AppError> {
        let order = OrderRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;

        if order.user_id != user.id && !user.role.is_admin() {
            return Err(AppError::Forbidden("Not your order".to_owned()));
        }
        Ok(order)
    }

    /// List the caller's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_for_user(&self, user: &User) -> Result<Vec<Order>, AppError> {
        Ok(OrderRepository::new(self.pool).list_for_user(user.id).await?)
    }

    /// List every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, AppError> {
        Ok(OrderRepository::new(self.pool).list_all().await?)
    }

    /// Set an order's lifecycle status (admin operation).
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: atelier_core::OrderId,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        OrderRepository::new(self.pool)
            .update_status(id, status)
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::NotFound => {
                    AppError::NotFound(format!("Order {id}"))
                }
                other => AppError::Database(other),
            })
    }

    /// Fetch every distinct product referenced by the cart.
    async fn fetch_products(
        &self,
        lines: &[CartLine],
    ) -> Result<HashMap<ProductId, Product>, AppError> {
        let repo = ProductRepository::new(self.pool);
        let mut products = HashMap::new();
        for line in lines {
            if products.contains_key(&line.product_id) {
                continue;
            }
            if let Some(product) = repo.get(line.product_id).await? {
                products.insert(product.id, product);
            }
        }
        Ok(products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(name: &str, price: Decimal, stock: i32, images: &[&str]) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::generate(),
            name: name.to_owned(),
            description: None,
            price,
            stock,
            category: None,
            gender: None,
            sizes: vec![],
            colors: vec![],
            images: images.iter().map(|s| (*s).to_owned()).collect(),
            visible_images: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<ProductId, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn line(product: &Product, quantity: i32) -> CartLine {
        CartLine {
            product_id: product.id,
            quantity,
            size: None,
            color: None,
            image: None,
        }
    }

    #[test]
    fn test_total_is_sum_of_line_subtotals() {
        let shirt = product("Shirt", Decimal::new(2550, 2), 10, &[]);
        let jeans = product("Jeans", Decimal::new(8000, 2), 10, &[]);
        let lines = vec![line(&shirt, 2), line(&jeans, 1)];
        let products = catalog(vec![shirt, jeans]);

        let cart = validate_cart(&lines, &products).unwrap();
        assert_eq!(cart.total_amount, Decimal::new(13100, 2));
        assert_eq!(cart.lines.len(), 2);
    }

    #[test]
    fn test_snapshot_captures_price_and_name_at_purchase_time() {
        let shirt = product("Shirt", Decimal::new(2550, 2), 5, &[]);
        let lines = vec![line(&shirt, 1)];
        let products = catalog(vec![shirt]);

        let cart = validate_cart(&lines, &products).unwrap();
        assert_eq!(cart.lines[0].product_name, "Shirt");
        assert_eq!(cart.lines[0].unit_price, Decimal::new(2550, 2));
    }

    #[test]
    fn test_image_falls_back_to_first_product_image() {
        let shirt = product("Shirt", Decimal::ONE, 5, &["first.jpg", "second.jpg"]);
        let lines = vec![line(&shirt, 1)];
        let products = catalog(vec![shirt]);

        let cart = validate_cart(&lines, &products).unwrap();
        assert_eq!(cart.lines[0].image.as_deref(), Some("first.jpg"));
    }

    #[test]
    fn test_explicit_image_wins_over_fallback() {
        let shirt = product("Shirt", Decimal::ONE, 5, &["first.jpg"]);
        let mut cart_line = line(&shirt, 1);
        cart_line.image = Some("chosen.jpg".to_owned());
        let products = catalog(vec![shirt]);

        let cart = validate_cart(&[cart_line], &products).unwrap();
        assert_eq!(cart.lines[0].image.as_deref(), Some("chosen.jpg"));
    }

    #[test]
    fn test_image_none_when_product_has_no_images() {
        let shirt = product("Shirt", Decimal::ONE, 5, &[]);
        let lines = vec![line(&shirt, 1)];
        let products = catalog(vec![shirt]);

        let cart = validate_cart(&lines, &products).unwrap();
        assert_eq!(cart.lines[0].image, None);
    }

    #[test]
    fn test_unknown_product_rejected() {
        let shirt = product("Shirt", Decimal::ONE, 5, &[]);
        let mut cart_line = line(&shirt, 1);
        cart_line.product_id = ProductId::generate();
        let products = catalog(vec![shirt]);

        let err = validate_cart(&[cart_line], &products).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_negative_stored_stock_rejected_as_invalid_state() {
        let shirt = product("Shirt", Decimal::ONE, -1, &[]);
        let lines = vec![line(&shirt, 1)];
        let products = catalog(vec![shirt]);

        let err = validate_cart(&lines, &products).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn test_overdraw_rejected_with_counts() {
        let shirt = product("Shirt", Decimal::ONE, 2, &[]);
        let lines = vec![line(&shirt, 3)];
        let products = catalog(vec![shirt]);

        let err = validate_cart(&lines, &products).unwrap_err();
        match err {
            AppError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "Shirt");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_quantity_exactly_stock_is_allowed() {
        let shirt = product("Shirt", Decimal::ONE, 2, &[]);
        let lines = vec![line(&shirt, 2)];
        let products = catalog(vec![shirt]);

        assert!(validate_cart(&lines, &products).is_ok());
    }

    #[test]
    fn test_zero_and_negative_quantity_rejected() {
        let shirt = product("Shirt", Decimal::ONE, 5, &[]);
        let products = catalog(vec![shirt.clone()]);

        for quantity in [0, -1] {
            let err = validate_cart(&[line(&shirt, quantity)], &products).unwrap_err();
            assert!(
                matches!(err, AppError::InvalidQuantity { quantity: q, .. } if q == quantity),
                "quantity {quantity} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = validate_cart(&[], &HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::EmptyCart));
    }

    #[test]
    fn test_first_failing_line_wins() {
        // The unknown product in line 1 is reported before the overdraw in
        // line 2.
        let shirt = product("Shirt", Decimal::ONE, 1, &[]);
        let mut ghost = line(&shirt, 1);
        ghost.product_id = ProductId::generate();
        let overdraw = line(&shirt, 5);
        let products = catalog(vec![shirt]);

        let err = validate_cart(&[ghost, overdraw], &products).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_repeated_product_lines_each_validated_against_stock() {
        // Per-line validation checks each line against the stored stock
        // independently. Two lines of 2 against stock 3 both pass here and
        // are caught by the conditional decrement at commit time.
        let shirt = product("Shirt", Decimal::ONE, 3, &[]);
        let lines = vec![line(&shirt, 2), line(&shirt, 2)];
        let products = catalog(vec![shirt]);

        let cart = validate_cart(&lines, &products).unwrap();
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.total_amount, Decimal::from(4));
    }
}
