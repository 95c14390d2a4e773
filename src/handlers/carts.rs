use crate::handlers::common::{created_response, success_response};
use crate::{
    entities::cart_item, errors::ServiceError, services::carts::AddCartLineInput,
    services::carts::CartLineDetail, AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cart",
            post(add_cart_line)
                .put(update_cart_line)
                .delete(remove_cart_line),
        )
        .route("/cart/:user_id", get(get_cart))
}

/// Add a line to a user's cart
#[utoipa::path(
    post,
    path = "/cart",
    request_body = AddCartLineRequest,
    responses(
        (status = 201, description = "Cart line created"),
        (status = 400, description = "Invalid input or unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn add_cart_line(
    State(state): State<AppState>,
    Json(payload): Json<AddCartLineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let line = state
        .services
        .carts
        .add_line(AddCartLineInput {
            user_id: payload.user_id,
            product_id: payload.product_id,
            quantity: payload.quantity,
        })
        .await?;

    Ok(created_response(json!({
        "message": "Item added to cart",
        "line": CartLineResponse::from(line),
    })))
}

/// Fetch a user's cart with product details
#[utoipa::path(
    get,
    path = "/cart/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Cart contents", body = CartResponse),
        (status = 400, description = "Cart references an unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.get_cart(user_id).await?;

    Ok(success_response(CartResponse { cart }))
}

/// Update the quantity of an existing cart line
#[utoipa::path(
    put,
    path = "/cart",
    request_body = UpdateCartLineRequest,
    responses(
        (status = 200, description = "Cart line updated"),
        (status = 404, description = "Cart line not found", body = crate::errors::ErrorResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn update_cart_line(
    State(state): State<AppState>,
    Json(payload): Json<UpdateCartLineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let line = state
        .services
        .carts
        .update_line(payload.user_id, payload.product_id, payload.quantity)
        .await?;

    Ok(success_response(json!({
        "message": "Cart updated",
        "line": CartLineResponse::from(line),
    })))
}

/// Remove a line from a user's cart
#[utoipa::path(
    delete,
    path = "/cart",
    request_body = RemoveCartLineRequest,
    responses(
        (status = 200, description = "Cart line removed"),
        (status = 404, description = "Cart line not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn remove_cart_line(
    State(state): State<AppState>,
    Json(payload): Json<RemoveCartLineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .carts
        .remove_line(payload.user_id, payload.product_id)
        .await?;

    Ok(success_response(json!({
        "message": "Item removed from cart",
    })))
}

// Request/response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartLineRequest {
    pub user_id: i64,
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLineRequest {
    pub user_id: i64,
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartLineRequest {
    pub user_id: i64,
    pub product_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

impl From<cart_item::Model> for CartLineResponse {
    fn from(model: cart_item::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            product_id: model.product_id,
            quantity: model.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub cart: Vec<CartLineDetail>,
}
