/// Order handlers
///
/// Orders belong to whoever created them; every lookup is scoped by
/// `created_by`, so cross-account access simply comes back 404.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use tradecraft_shared::auth::middleware::CurrentUser;
use tradecraft_shared::auth::policy::{self, Actor};
use tradecraft_shared::models::order::{
    CreateOrder, CreateOrderItem, Order, OrderItem, UpdateOrder,
};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub delivery_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub order_status: String,
    pub comments: Option<String>,
    #[serde(default = "default_true")]
    pub is_one_time_delivery: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub total_amount: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub delivery_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub order_status: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderItemRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub item_type: String,
    pub item_price: Decimal,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub status: String,
    pub delivery_date: DateTime<Utc>,
    pub comments: Option<String>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let actor = Actor::from(&current.0);
    let orders = Order::list_owned(&state.db, actor.id).await?;
    Ok(Json(orders))
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    if !policy::is_business_actor(&actor) {
        return Err(ApiError::forbidden());
    }

    let order = Order::create(
        &state.db,
        CreateOrder {
            customer_id: body.customer_id,
            total_amount: body.total_amount,
            discount: body.discount,
            delivery_date: body.delivery_date,
            order_status: body.order_status,
            comments: body.comments,
            is_one_time_delivery: body.is_one_time_delivery,
            created_by: actor.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let actor = Actor::from(&current.0);
    let order = Order::find_owned(&state.db, id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found.".to_string()))?;
    Ok(Json(order))
}

pub async fn update_order(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    Order::find_owned(&state.db, id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found.".to_string()))?;

    let updated = Order::update(
        &state.db,
        id,
        UpdateOrder {
            total_amount: body.total_amount,
            discount: body.discount,
            delivery_date: body.delivery_date,
            order_status: body.order_status,
            comments: body.comments,
            updated_by: Some(actor.id),
        },
    )
    .await?;

    Ok(Json(updated))
}

/// Soft delete, returning the final record state.
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let actor = Actor::from(&current.0);
    Order::find_owned(&state.db, id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found.".to_string()))?;

    let deleted = Order::soft_delete(&state.db, id, actor.id).await?;
    Ok(Json(deleted))
}

pub async fn list_order_items(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OrderItem>>, ApiError> {
    let actor = Actor::from(&current.0);
    let order = Order::find_owned(&state.db, id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found.".to_string()))?;

    let items = OrderItem::list_for_order(&state.db, order.id).await?;
    Ok(Json(items))
}

pub async fn create_order_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateOrderItemRequest>,
) -> Result<(StatusCode, Json<OrderItem>), ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    let order = Order::find_owned(&state.db, id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found.".to_string()))?;

    let item = OrderItem::create(
        &state.db,
        CreateOrderItem {
            order_id: order.id,
            item_type: body.item_type,
            item_price: body.item_price,
            quantity: body.quantity,
            status: body.status,
            delivery_date: body.delivery_date,
            comments: body.comments,
            created_by: actor.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}
