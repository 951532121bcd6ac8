//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use atelier_core::ProductId;

use crate::db::products::{ProductInput, ProductRepository};
use crate::error::AppError;
use crate::middleware::auth::RequireAdmin;
use crate::models::{Gender, Product};
use crate::state::AppState;

/// Catalog fields accepted on create and update.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub visible_images: Vec<String>,
}

impl ProductRequest {
    fn into_input(self) -> Result<ProductInput, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Product name is required".to_owned()));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::BadRequest(
                "Price must not be negative".to_owned(),
            ));
        }
        if self.stock < 0 {
            return Err(AppError::BadRequest(
                "Stock must not be negative".to_owned(),
            ));
        }

        Ok(ProductInput {
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            gender: self.gender,
            sizes: self.sizes,
            colors: self.colors,
            images: self.images,
            visible_images: self.visible_images,
        })
    }
}

/// List the catalog, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// Get one product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, AppError> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;
    Ok(Json(product))
}

/// Create a product (admin).
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let input = req.into_input()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;

    tracing::info!(product_id = %product.id, admin_id = %admin.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product (admin).
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    let input = req.into_input()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound(format!("Product {id}")),
            other => AppError::Database(other),
        })?;
    Ok(Json(product))
}

/// Delete a product (admin).
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, AppError> {
    let deleted = ProductRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Product {id}")));
    }

    tracing::info!(product_id = %id, admin_id = %admin.id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
