/// Payment handlers
///
/// Recording a payment also moves the order's `paid_amount`, and deleting
/// one backs it out again; both run in the model's transaction.
use axum::{
    extract::{Path, Query, State},
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
use tradecraft_shared::models::order::Order;
use tradecraft_shared::models::payment::{CreatePayment, Payment, UpdatePayment};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub paid_amount: Decimal,
    pub payment_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub mode_of_payment: String,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    pub payment_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub mode_of_payment: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    pub order_id: Option<Uuid>,
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let actor = Actor::from(&current.0);

    let payments = match query.order_id {
        Some(order_id) => {
            // Scope through the order; a foreign order is a 404.
            Order::find_owned(&state.db, order_id, actor.id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Order not found.".to_string()))?;
            Payment::list_for_order(&state.db, order_id).await?
        }
        None => Payment::list_owned(&state.db, actor.id).await?,
    };

    Ok(Json(payments))
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    if !policy::is_business_actor(&actor) {
        return Err(ApiError::forbidden());
    }

    if body.paid_amount <= Decimal::ZERO {
        return Err(ApiError::BadRequest(
            "Payment amount must be positive.".to_string(),
        ));
    }

    Order::find_owned(&state.db, body.order_id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found.".to_string()))?;

    let payment = Payment::create(
        &state.db,
        CreatePayment {
            order_id: body.order_id,
            paid_amount: body.paid_amount,
            payment_date: body.payment_date,
            mode_of_payment: body.mode_of_payment,
            comments: body.comments,
            created_by: actor.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
    let actor = Actor::from(&current.0);
    let payment = Payment::find_owned(&state.db, id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found.".to_string()))?;
    Ok(Json(payment))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>, ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    Payment::find_owned(&state.db, id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found.".to_string()))?;

    let updated = Payment::update(
        &state.db,
        id,
        UpdatePayment {
            payment_date: body.payment_date,
            mode_of_payment: body.mode_of_payment,
            comments: body.comments,
            updated_by: Some(actor.id),
        },
    )
    .await?;

    Ok(Json(updated))
}

/// Soft delete, returning the final record state.
pub async fn delete_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
    let actor = Actor::from(&current.0);
    Payment::find_owned(&state.db, id, actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found.".to_string()))?;

    let deleted = Payment::soft_delete(&state.db, id, actor.id).await?;
    Ok(Json(deleted))
}
