//! Catalog seed command for local development.

use rust_decimal::Decimal;

use atelier_api::db::products::{ProductInput, ProductRepository};
use atelier_api::models::Gender;

use super::{CliError, connect};

/// Insert a handful of sample products.
///
/// Safe to run repeatedly; each run inserts fresh rows rather than
/// upserting, which is fine for a development database.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    for input in sample_products() {
        let product = repo.create(&input).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "seeded product");
    }

    tracing::info!("Seed complete");
    Ok(())
}

fn sample_products() -> Vec<ProductInput> {
    vec![
        ProductInput {
            name: "Linen Shirt".to_owned(),
            description: Some("Relaxed-fit shirt in washed linen.".to_owned()),
            price: Decimal::new(4499, 2),
            stock: 25,
            category: Some("shirts".to_owned()),
            gender: Some(Gender::Male),
            sizes: vec!["S".to_owned(), "M".to_owned(), "L".to_owned()],
            colors: vec!["white".to_owned(), "sand".to_owned()],
            images: vec![],
            visible_images: vec![],
        },
        ProductInput {
            name: "Wide-Leg Trousers".to_owned(),
            description: Some("High-waisted trousers in organic cotton twill.".to_owned()),
            price: Decimal::new(7900, 2),
            stock: 18,
            category: Some("trousers".to_owned()),
            gender: Some(Gender::Female),
            sizes: vec!["36".to_owned(), "38".to_owned(), "40".to_owned()],
            colors: vec!["black".to_owned(), "ecru".to_owned()],
            images: vec![],
            visible_images: vec![],
        },
        ProductInput {
            name: "Wool Beanie".to_owned(),
            description: None,
            price: Decimal::new(1950, 2),
            stock: 40,
            category: Some("accessories".to_owned()),
            gender: Some(Gender::Unisex),
            sizes: vec!["one-size".to_owned()],
            colors: vec!["navy".to_owned(), "grey".to_owned(), "rust".to_owned()],
            images: vec![],
            visible_images: vec![],
        },
    ]
}
