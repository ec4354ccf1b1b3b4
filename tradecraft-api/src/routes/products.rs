/// Product and service catalog handlers
///
/// Anyone authenticated can browse the catalog; writes are limited to
/// the seller. The seller's `cost` field is stripped from responses for
/// everyone else.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use tradecraft_shared::auth::middleware::CurrentUser;
use tradecraft_shared::auth::policy::{self, Actor};
use tradecraft_shared::models::product::{CreateProduct, Product, UpdateProduct};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub units_available: i32,
    pub price: Decimal,
    #[serde(default)]
    pub cost: Decimal,
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub product_code: String,
    #[serde(default)]
    pub is_service: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub units_available: Option<i32>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub is_available: Option<bool>,
}

/// Zeroes the seller-private `cost` when the viewer is not the seller.
fn product_view(mut product: Product, actor: &Actor) -> Product {
    let owns = product
        .seller_id
        .map(|s| policy::is_owner(actor, s))
        .unwrap_or(actor.is_superuser);
    if !owns {
        product.cost = Decimal::ZERO;
    }
    product
}

pub async fn list_products(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let actor = Actor::from(&current.0);
    let products = Product::list_available(&state.db)
        .await?
        .into_iter()
        .map(|p| product_view(p, &actor))
        .collect();
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    if !policy::is_business_actor(&actor) {
        return Err(ApiError::forbidden());
    }

    let product = Product::create(
        &state.db,
        CreateProduct {
            name: body.name,
            description: body.description,
            category: body.category,
            units_available: body.units_available,
            price: body.price,
            cost: body.cost,
            product_code: body.product_code,
            is_service: body.is_service,
            created_by: actor.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let actor = Actor::from(&current.0);
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found.".to_string()))?;
    Ok(Json(product_view(product, &actor)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found.".to_string()))?;

    let owns = product
        .seller_id
        .map(|s| policy::is_owner(&actor, s))
        .unwrap_or(actor.is_superuser);
    if !owns {
        return Err(ApiError::forbidden());
    }

    let updated = Product::update(
        &state.db,
        id,
        UpdateProduct {
            name: body.name,
            description: body.description,
            category: body.category,
            units_available: body.units_available,
            price: body.price,
            cost: body.cost,
            is_available: body.is_available,
            updated_by: Some(actor.id),
        },
    )
    .await?;

    Ok(Json(updated))
}

/// Soft delete, returning the final record state.
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let actor = Actor::from(&current.0);
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found.".to_string()))?;

    let owns = product
        .seller_id
        .map(|s| policy::is_owner(&actor, s))
        .unwrap_or(actor.is_superuser);
    if !owns {
        return Err(ApiError::forbidden());
    }

    let deleted = Product::soft_delete(&state.db, id, actor.id).await?;
    Ok(Json(deleted))
}
